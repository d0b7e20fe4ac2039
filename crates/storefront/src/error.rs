//! Normalized store errors with Sentry capture.
//!
//! The stores never let a transport failure escape raw: every asynchronous
//! store method resolves to a success value or a [`StoreError`], and the
//! only place that inspects [`ApiError`] internals (including the backend's
//! `detail` payload convention) is [`StoreError::from_api`].

use thiserror::Error;

use crate::api::ApiError;

/// Error taxonomy visible to callers of the stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caught client-side before any network call (bad email, short password,
    /// zero quantity).
    Validation,
    /// The backend rejected the credentials or token.
    Auth,
    /// The request never produced a usable response (connect, timeout).
    Network,
    /// The backend answered with a non-auth failure.
    Api,
}

/// A normalized `{kind, message}` error. The message is human-readable and
/// safe to surface directly in a toast.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StoreError {
    /// A client-side validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    /// Normalize a transport error into a `{kind, message}` value.
    ///
    /// The backend's `detail` field becomes the message when present;
    /// `fallback` is the per-operation generic message used otherwise.
    /// Transport-level failures are captured to Sentry (a no-op unless the
    /// embedding process initialized a client).
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Status { status, detail } => {
                let kind = if *status == 401 || *status == 403 {
                    ErrorKind::Auth
                } else {
                    ErrorKind::Api
                };
                Self {
                    kind,
                    message: detail.clone().unwrap_or_else(|| fallback.to_owned()),
                }
            }
            ApiError::Http(_) => {
                capture(err);
                Self {
                    kind: ErrorKind::Network,
                    message: fallback.to_owned(),
                }
            }
            ApiError::Parse(_) => {
                capture(err);
                Self {
                    kind: ErrorKind::Api,
                    message: fallback.to_owned(),
                }
            }
        }
    }
}

/// Capture an unexpected transport error to Sentry and the log.
fn capture(err: &ApiError) {
    let event_id = sentry::capture_error(err);
    tracing::error!(error = %err, sentry_event_id = %event_id, "backend request failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_preferred_over_fallback() {
        let err = ApiError::status(422, "Quantity exceeds available stock");
        let store_err = StoreError::from_api(&err, "Could not add item to cart");
        assert_eq!(store_err.kind, ErrorKind::Api);
        assert_eq!(store_err.message, "Quantity exceeds available stock");
    }

    #[test]
    fn test_missing_detail_falls_back() {
        let err = ApiError::Status {
            status: 500,
            detail: None,
        };
        let store_err = StoreError::from_api(&err, "Could not add item to cart");
        assert_eq!(store_err.message, "Could not add item to cart");
    }

    #[test]
    fn test_unauthorized_maps_to_auth_kind() {
        let err = ApiError::status(401, "Could not validate credentials");
        let store_err = StoreError::from_api(&err, "Login failed");
        assert_eq!(store_err.kind, ErrorKind::Auth);
    }

    #[test]
    fn test_parse_error_maps_to_api_kind() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        let store_err = StoreError::from_api(&ApiError::Parse(parse_err), "Something went wrong");
        assert_eq!(store_err.kind, ErrorKind::Api);
        assert_eq!(store_err.message, "Something went wrong");
    }

    #[test]
    fn test_display_is_message() {
        let err = StoreError::validation("Passwords do not match");
        assert_eq!(err.to_string(), "Passwords do not match");
    }
}
