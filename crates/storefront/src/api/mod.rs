//! Marigold REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for users, products, and the cart -
//!   NO local sync, direct API calls.
//! - [`StorefrontApi`] is the seam between the stores and the transport:
//!   production wires [`RestClient`], tests wire an in-memory fake.
//! - Error bodies carry a `detail` field used as the user-facing message;
//!   its extraction is confined to this module so the stores only ever see
//!   a normalized error.
//!
//! # Endpoints
//!
//! - `POST /auth/login`, `POST /auth/register` → `{access_token, refresh_token}`
//! - `GET /users/me` → user profile
//! - `GET /cart`, `POST /cart/items`, `PUT /cart/items/{productId}`,
//!   `DELETE /cart/items/{productId}` (one line, or `?all_variants=true` for
//!   every line of the product), `DELETE /cart` → `{items, subtotal}`

mod rest;
pub mod types;

pub use rest::RestClient;
pub use types::*;

use marigold_core::ProductId;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the request with a non-success status.
    #[error("API error ({status}): {}", detail.as_deref().unwrap_or("no detail provided"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// The `detail` field of the error body, if the backend sent one.
        detail: Option<String>,
    },
}

impl ApiError {
    /// Shorthand for a status error with a detail message.
    #[must_use]
    pub fn status(status: u16, detail: impl Into<String>) -> Self {
        Self::Status {
            status,
            detail: Some(detail.into()),
        }
    }
}

/// The REST contract consumed by the stores.
///
/// Cart endpoints return the full post-mutation snapshot; the stores replace
/// their local state wholesale with it and never apply mutations locally.
// Returned futures are not required to be Send; the engine is single-threaded.
#[allow(async_fn_in_trait)]
pub trait StorefrontApi {
    /// `POST /auth/login`.
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError>;

    /// `POST /auth/register`. Registering also authenticates; there is no
    /// separate verification step.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ApiError>;

    /// `GET /users/me` with an explicit bearer token.
    async fn current_user(&self, access_token: &str) -> Result<User, ApiError>;

    /// `GET /cart`.
    async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError>;

    /// `POST /cart/items`.
    async fn add_cart_item(&self, request: &AddItemRequest) -> Result<CartSnapshot, ApiError>;

    /// `PUT /cart/items/{productId}`.
    async fn update_cart_item(
        &self,
        product_id: ProductId,
        request: &UpdateItemRequest,
    ) -> Result<CartSnapshot, ApiError>;

    /// `DELETE /cart/items/{productId}`, targeting the single line whose
    /// identity is `(product_id, variant)` - a `None` variant targets the
    /// variant-less line only. Removing a line that does not exist is not
    /// an error.
    async fn remove_cart_item(
        &self,
        product_id: ProductId,
        variant: Option<&Variant>,
    ) -> Result<CartSnapshot, ApiError>;

    /// `DELETE /cart/items/{productId}?all_variants=true`: every line of the
    /// product, regardless of variant.
    async fn remove_cart_product(&self, product_id: ProductId) -> Result<CartSnapshot, ApiError>;

    /// `DELETE /cart`.
    async fn clear_cart(&self) -> Result<CartSnapshot, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_detail() {
        let err = ApiError::status(404, "Product not found");
        assert_eq!(err.to_string(), "API error (404): Product not found");
    }

    #[test]
    fn test_api_error_display_without_detail() {
        let err = ApiError::Status {
            status: 502,
            detail: None,
        };
        assert_eq!(err.to_string(), "API error (502): no detail provided");
    }
}
