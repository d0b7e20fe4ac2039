//! `reqwest`-based implementation of the [`StorefrontApi`] contract.

use std::time::Duration;

use marigold_core::ProductId;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::StorefrontConfig;
use crate::vault::{self, Vault};

use super::{
    AddItemRequest, ApiError, AuthTokens, CartSnapshot, StorefrontApi, UpdateItemRequest, User,
    Variant,
};

/// Shape of backend error bodies. Only `detail` is contractual.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP client for the Marigold REST backend.
///
/// Holds a vault handle so cart requests can attach the current access token
/// as a bearer credential when one is claimed. Requests run to completion or
/// failure under the client's timeout; nothing is retried or cancelled here.
pub struct RestClient<V> {
    http: reqwest::Client,
    base: String,
    vault: V,
}

impl<V: Vault> RestClient<V> {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &StorefrontConfig, vault: V) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
            vault,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Attach the vaulted access token, if any. Anonymous carts are allowed;
    /// the backend keys them off its own session cookie.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.vault.get(vault::keys::ACCESS_TOKEN) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode a success body, or extract the `detail`
    /// field from an error body.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail);
            Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

impl<V: Vault> StorefrontApi for RestClient<V> {
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let builder = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.execute(builder).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ApiError> {
        let builder = self
            .http
            .post(self.url("/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }));
        self.execute(builder).await
    }

    async fn current_user(&self, access_token: &str) -> Result<User, ApiError> {
        let builder = self.http.get(self.url("/users/me")).bearer_auth(access_token);
        self.execute(builder).await
    }

    async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError> {
        let builder = self.authorize(self.http.get(self.url("/cart")));
        self.execute(builder).await
    }

    async fn add_cart_item(&self, request: &AddItemRequest) -> Result<CartSnapshot, ApiError> {
        let builder = self.authorize(self.http.post(self.url("/cart/items")).json(request));
        self.execute(builder).await
    }

    async fn update_cart_item(
        &self,
        product_id: ProductId,
        request: &UpdateItemRequest,
    ) -> Result<CartSnapshot, ApiError> {
        let builder = self.authorize(
            self.http
                .put(self.url(&format!("/cart/items/{product_id}")))
                .json(request),
        );
        self.execute(builder).await
    }

    async fn remove_cart_item(
        &self,
        product_id: ProductId,
        variant: Option<&Variant>,
    ) -> Result<CartSnapshot, ApiError> {
        // The variant half of the line key travels as query parameters;
        // DELETE bodies are dropped by some proxies. No parameters targets
        // the variant-less line, never the whole product.
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(v) = variant {
            if let Some(size) = v.size.as_deref() {
                query.push(("size", size));
            }
            if let Some(color) = v.color.as_deref() {
                query.push(("color", color));
            }
        }
        let builder = self.authorize(
            self.http
                .delete(self.url(&format!("/cart/items/{product_id}")))
                .query(&query),
        );
        self.execute(builder).await
    }

    async fn remove_cart_product(&self, product_id: ProductId) -> Result<CartSnapshot, ApiError> {
        let builder = self.authorize(
            self.http
                .delete(self.url(&format!("/cart/items/{product_id}")))
                .query(&[("all_variants", "true")]),
        );
        self.execute(builder).await
    }

    async fn clear_cart(&self) -> Result<CartSnapshot, ApiError> {
        let builder = self.authorize(self.http.delete(self.url("/cart")));
        self.execute(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemoryVault;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = StorefrontConfig::for_backend("https://api.example.com/api/v1/")
            .expect("valid config");
        let client = RestClient::new(&config, MemoryVault::default()).expect("client");
        assert_eq!(
            client.url("/cart/items/7"),
            "https://api.example.com/api/v1/cart/items/7"
        );
    }

    #[test]
    fn test_error_body_detail_extraction() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"Invalid credentials"}"#).expect("deserialize");
        assert_eq!(body.detail.as_deref(), Some("Invalid credentials"));

        let empty: ErrorBody = serde_json::from_str("{}").expect("deserialize");
        assert!(empty.detail.is_none());
    }
}
