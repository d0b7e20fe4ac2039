//! User roles.

use serde::{Deserialize, Serialize};

/// Role attached to a user profile by the backend.
///
/// The storefront only distinguishes customers from staff; fine-grained
/// admin permissions live in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_display_parse_roundtrip() {
        for role in [Role::Customer, Role::Admin] {
            assert_eq!(Role::from_str(&role.to_string()), Ok(role));
        }
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::Customer).expect("serialize");
        assert_eq!(json, "\"customer\"");
    }

    #[test]
    fn test_invalid_role() {
        assert!(Role::from_str("root").is_err());
    }
}
