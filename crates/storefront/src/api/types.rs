//! Wire types for the Marigold REST backend.
//!
//! These mirror the backend's JSON contract exactly; domain typing (IDs,
//! prices, emails) comes from `marigold-core`.

use marigold_core::{AddressId, Email, Price, ProductId, Role, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Token pair returned by `POST /auth/login` and `POST /auth/register`.
///
/// Tokens are opaque to the client and wrapped in [`SecretString`] so they
/// cannot leak through `Debug` or error messages. The vault is the only
/// place they are persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

/// User profile returned by `GET /users/me`.
///
/// The session store replaces its `user` wholesale with this record on every
/// successful fetch; it is never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// A saved delivery address on the user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub label: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
}

/// Product variant selection on a cart line.
///
/// Two lines with the same product but different variants are distinct;
/// the pair `(product_id, variant)` is the line identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    #[serde(default)]
    pub image: Option<String>,
    /// Always >= 1; a quantity that would reach 0 removes the line instead.
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<Variant>,
}

impl CartItem {
    /// Whether this line matches the given identity key.
    ///
    /// A `None` variant filter matches only variant-less lines; use
    /// [`Self::is_product`] to match every line of a product.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, variant: Option<&Variant>) -> bool {
        self.product_id == product_id && self.variant.as_ref() == variant
    }

    /// Whether this line belongs to the given product, any variant.
    #[must_use]
    pub fn is_product(&self, product_id: ProductId) -> bool {
        self.product_id == product_id
    }

    /// Price of the whole line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Cart snapshot returned by every cart endpoint and persisted under the
/// `cart-storage` vault key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CartSnapshot {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Price,
}

impl CartSnapshot {
    /// An empty cart with a zero subtotal.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Body of `POST /cart/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

/// Body of `PUT /cart/items/{productId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use marigold_core::CurrencyCode;
    use rust_decimal::Decimal;

    fn item(product_id: i64, quantity: u32, variant: Option<Variant>) -> CartItem {
        CartItem {
            product_id: ProductId::new(product_id),
            name: "Block print panjabi".to_string(),
            unit_price: Price::new(Decimal::new(1999, 2), CurrencyCode::BDT),
            image: None,
            quantity,
            variant,
        }
    }

    fn size(s: &str) -> Variant {
        Variant {
            size: Some(s.to_string()),
            color: None,
        }
    }

    #[test]
    fn test_line_identity_distinguishes_variants() {
        let m = item(1, 1, Some(size("M")));
        assert!(m.matches(ProductId::new(1), Some(&size("M"))));
        assert!(!m.matches(ProductId::new(1), Some(&size("L"))));
        assert!(!m.matches(ProductId::new(1), None));
        assert!(!m.matches(ProductId::new(2), Some(&size("M"))));
    }

    #[test]
    fn test_is_product_ignores_variant() {
        let m = item(1, 1, Some(size("M")));
        assert!(m.is_product(ProductId::new(1)));
        assert!(!m.is_product(ProductId::new(2)));
    }

    #[test]
    fn test_line_total() {
        let line = item(1, 3, None);
        assert_eq!(line.line_total().amount, Decimal::new(5997, 2));
    }

    #[test]
    fn test_cart_snapshot_deserializes_missing_fields() {
        let snapshot: CartSnapshot = serde_json::from_str("{}").expect("deserialize");
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.subtotal.amount, Decimal::ZERO);
    }

    #[test]
    fn test_empty_snapshot_is_default() {
        let empty = CartSnapshot::empty();
        assert_eq!(empty, CartSnapshot::default());
        assert_eq!(empty.subtotal, Price::default());
    }

    #[test]
    fn test_auth_tokens_debug_redacts() {
        let tokens: AuthTokens = serde_json::from_str(
            r#"{"access_token":"top-secret-access","refresh_token":"top-secret-refresh"}"#,
        )
        .expect("deserialize");
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("top-secret-access"));
        assert!(!debug.contains("top-secret-refresh"));
    }

    #[test]
    fn test_variant_none_fields_not_serialized() {
        let v = size("XL");
        let json = serde_json::to_string(&v).expect("serialize");
        assert_eq!(json, r#"{"size":"XL"}"#);
    }
}
