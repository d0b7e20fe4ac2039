//! Cart store - authoritative-for-the-session cart lines and subtotal.
//!
//! The backend owns the cart: every mutation is a request to the REST API,
//! and on success the local `{items, subtotal}` is replaced wholesale with
//! the server's post-mutation snapshot. Local state is never trusted until
//! confirmed. A failed mutation leaves the previously-known state unchanged,
//! reports through the [`Notifier`], and is not retried.
//!
//! # Synchronization state
//!
//! The persisted snapshot rehydrated at construction is an optimistic cache,
//! tracked explicitly:
//!
//! ```text
//! StaleFromCache --(request in flight)--> Reconciling --(snapshot applied)--> Confirmed
//! ```
//!
//! Views can key a "syncing" affordance off [`CartStore::sync_state`]
//! instead of implicitly trusting stale data.

use marigold_core::{CurrencyCode, Price, ProductId};

use crate::api::{AddItemRequest, CartItem, CartSnapshot, StorefrontApi, UpdateItemRequest, Variant};
use crate::error::StoreError;
use crate::notify::Notifier;
use crate::vault::{self, Vault};

/// Where the local cart stands relative to the remote cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Rehydrated from the vault; not yet confirmed by the backend.
    StaleFromCache,
    /// A request that will replace local state is in flight.
    Reconciling,
    /// Local state equals the last server snapshot.
    Confirmed,
}

/// Cart store over an API client, a vault, and a notification sink.
pub struct CartStore<A, V, N> {
    api: A,
    vault: V,
    notifier: N,
    items: Vec<CartItem>,
    subtotal: Price,
    sync: SyncState,
}

impl<A: StorefrontApi, V: Vault, N: Notifier> CartStore<A, V, N> {
    /// Create a store, rehydrating the persisted snapshot if one exists.
    ///
    /// Starts in [`SyncState::StaleFromCache`] either way - an empty local
    /// cart is just as unconfirmed as a stale one until the first snapshot
    /// arrives from the backend.
    pub fn new(api: A, vault: V, notifier: N) -> Self {
        let snapshot = vault
            .get(vault::keys::CART_SNAPSHOT)
            .and_then(|raw| match serde_json::from_str::<CartSnapshot>(&raw) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable cart snapshot");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            api,
            vault,
            notifier,
            items: snapshot.items,
            subtotal: snapshot.subtotal,
            sync: SyncState::StaleFromCache,
        }
    }

    // =========================================================================
    // Derived values (never touch the network)
    // =========================================================================

    /// Current cart lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// The subtotal as last reported by the backend (or rehydrated).
    #[must_use]
    pub const fn subtotal(&self) -> Price {
        self.subtotal
    }

    /// Locally derived subtotal: sum over lines of `unit_price * quantity`.
    ///
    /// The backend's figure is authoritative; this exists for display while
    /// stale and as a cross-check in tests.
    #[must_use]
    pub fn derived_subtotal(&self) -> Price {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Price::zero(CurrencyCode::default()), |acc, p| Price {
                amount: acc.amount + p.amount,
                currency_code: p.currency_code,
            })
    }

    /// Synchronization state relative to the remote cart.
    #[must_use]
    pub const fn sync_state(&self) -> SyncState {
        self.sync
    }

    // =========================================================================
    // Remote operations
    // =========================================================================

    /// Fetch-and-replace from `GET /cart`.
    ///
    /// This is the reconciliation path for the rehydrated snapshot. It is a
    /// background read: failures are logged and local state is left alone,
    /// with no user-visible notification.
    ///
    /// # Errors
    ///
    /// Returns the normalized error so callers *may* react, but no state
    /// changed if they don't.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let previous = self.sync;
        self.sync = SyncState::Reconciling;
        match self.api.fetch_cart().await {
            Ok(snapshot) => {
                self.replace(snapshot);
                Ok(())
            }
            Err(e) => {
                self.sync = previous;
                let err = StoreError::from_api(&e, "Could not load your cart");
                tracing::warn!(error = %err, "cart refresh failed");
                Err(err)
            }
        }
    }

    /// Add `quantity` of a product (line identity `(product_id, variant)`).
    ///
    /// The backend merges additively into an existing line or appends a new
    /// one preserving insertion order, and returns the full snapshot.
    ///
    /// # Errors
    ///
    /// `Validation` for a zero quantity (no network call); otherwise the
    /// normalized backend error, with local state untouched.
    pub async fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        variant: Option<Variant>,
    ) -> Result<(), StoreError> {
        if quantity == 0 {
            return Err(self.reject_zero_quantity());
        }

        let request = AddItemRequest {
            product_id,
            quantity,
            variant,
        };
        let previous = self.sync;
        self.sync = SyncState::Reconciling;
        match self.api.add_cart_item(&request).await {
            Ok(snapshot) => {
                self.replace(snapshot);
                self.notifier.success("Added to cart");
                Ok(())
            }
            Err(e) => Err(self.fail_mutation(&e, previous, "Could not add item to cart")),
        }
    }

    /// Set the quantity of the matching line.
    ///
    /// Callers are responsible for never requesting a non-positive quantity
    /// (the UI disables decrement at 1); a direct call with 0 is rejected
    /// here so no zero-quantity line can ever be retained.
    ///
    /// # Errors
    ///
    /// `Validation` for a zero quantity (no network call); otherwise the
    /// normalized backend error, with local state untouched.
    pub async fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        variant: Option<&Variant>,
    ) -> Result<(), StoreError> {
        if quantity == 0 {
            return Err(self.reject_zero_quantity());
        }

        let request = UpdateItemRequest {
            quantity,
            variant: variant.cloned(),
        };
        let previous = self.sync;
        self.sync = SyncState::Reconciling;
        match self.api.update_cart_item(product_id, &request).await {
            Ok(snapshot) => {
                self.replace(snapshot);
                self.notifier.success("Cart updated");
                Ok(())
            }
            Err(e) => Err(self.fail_mutation(&e, previous, "Could not update cart")),
        }
    }

    /// Remove the line matching `(product_id, variant)`. A `None` variant
    /// targets the variant-less line only; sized or colored lines of the
    /// same product are left alone. Removing a line that does not exist is
    /// a no-op, not an error.
    ///
    /// # Errors
    ///
    /// The normalized backend error, with local state untouched.
    pub async fn remove_item(
        &mut self,
        product_id: ProductId,
        variant: Option<&Variant>,
    ) -> Result<(), StoreError> {
        let previous = self.sync;
        self.sync = SyncState::Reconciling;
        match self.api.remove_cart_item(product_id, variant).await {
            Ok(snapshot) => {
                self.replace(snapshot);
                self.notifier.success("Removed from cart");
                Ok(())
            }
            Err(e) => Err(self.fail_mutation(&e, previous, "Could not remove item from cart")),
        }
    }

    /// Remove every line of a product, regardless of variant.
    ///
    /// # Errors
    ///
    /// The normalized backend error, with local state untouched.
    pub async fn remove_product(&mut self, product_id: ProductId) -> Result<(), StoreError> {
        let previous = self.sync;
        self.sync = SyncState::Reconciling;
        match self.api.remove_cart_product(product_id).await {
            Ok(snapshot) => {
                self.replace(snapshot);
                self.notifier.success("Removed from cart");
                Ok(())
            }
            Err(e) => Err(self.fail_mutation(&e, previous, "Could not remove item from cart")),
        }
    }

    /// Empty the cart. Used after a successful checkout.
    ///
    /// # Errors
    ///
    /// The normalized backend error, with local state untouched.
    pub async fn clear(&mut self) -> Result<(), StoreError> {
        let previous = self.sync;
        self.sync = SyncState::Reconciling;
        match self.api.clear_cart().await {
            Ok(snapshot) => {
                self.replace(snapshot);
                self.notifier.success("Cart cleared");
                Ok(())
            }
            Err(e) => Err(self.fail_mutation(&e, previous, "Could not clear cart")),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Replace local state wholesale with a server snapshot and persist it.
    fn replace(&mut self, snapshot: CartSnapshot) {
        self.items = snapshot.items;
        self.subtotal = snapshot.subtotal;
        self.sync = SyncState::Confirmed;
        self.persist();
    }

    fn fail_mutation(
        &mut self,
        err: &crate::api::ApiError,
        previous: SyncState,
        fallback: &str,
    ) -> StoreError {
        self.sync = previous;
        let err = StoreError::from_api(err, fallback);
        self.notifier.error(&err.message);
        err
    }

    fn reject_zero_quantity(&self) -> StoreError {
        let err = StoreError::validation("Quantity must be at least 1");
        self.notifier.error(&err.message);
        err
    }

    fn persist(&self) {
        let snapshot = CartSnapshot {
            items: self.items.clone(),
            subtotal: self.subtotal,
        };
        match serde_json::to_string(&snapshot) {
            Ok(raw) => self.vault.set(vault::keys::CART_SNAPSHOT, &raw),
            Err(e) => tracing::warn!(error = %e, "failed to serialize cart snapshot"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use rust_decimal::Decimal;

    use crate::api::{ApiError, AuthTokens, User};
    use crate::notify::{MemoryNotifier, Severity};
    use crate::vault::MemoryVault;

    fn bdt(amount: i64, scale: u32) -> Price {
        Price::new(Decimal::new(amount, scale), CurrencyCode::BDT)
    }

    fn line(product_id: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(product_id),
            name: format!("Product {product_id}"),
            unit_price: bdt(50000, 2),
            image: None,
            quantity,
            variant: None,
        }
    }

    fn snapshot(items: Vec<CartItem>) -> CartSnapshot {
        let subtotal = items
            .iter()
            .map(CartItem::line_total)
            .fold(Price::zero(CurrencyCode::BDT), |a, p| a + p);
        CartSnapshot { items, subtotal }
    }

    /// Cart-only stub: returns a fixed snapshot, or fails with 503.
    #[derive(Clone)]
    struct StubApi {
        response: Option<CartSnapshot>,
        cart_calls: Arc<AtomicU32>,
    }

    impl StubApi {
        fn responding(response: CartSnapshot) -> Self {
            Self {
                response: Some(response),
                cart_calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                cart_calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn respond(&self) -> Result<CartSnapshot, ApiError> {
            self.cart_calls.fetch_add(1, Ordering::Relaxed);
            self.response
                .clone()
                .ok_or_else(|| ApiError::status(503, "Cart service unavailable"))
        }
    }

    impl StorefrontApi for StubApi {
        async fn login(&self, _email: &str, _password: &str) -> Result<AuthTokens, ApiError> {
            Err(ApiError::Status {
                status: 500,
                detail: None,
            })
        }

        async fn register(
            &self,
            _name: &str,
            _email: &str,
            _password: &str,
        ) -> Result<AuthTokens, ApiError> {
            Err(ApiError::Status {
                status: 500,
                detail: None,
            })
        }

        async fn current_user(&self, _access_token: &str) -> Result<User, ApiError> {
            Err(ApiError::Status {
                status: 500,
                detail: None,
            })
        }

        async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError> {
            self.respond()
        }

        async fn add_cart_item(&self, _request: &AddItemRequest) -> Result<CartSnapshot, ApiError> {
            self.respond()
        }

        async fn update_cart_item(
            &self,
            _product_id: ProductId,
            _request: &UpdateItemRequest,
        ) -> Result<CartSnapshot, ApiError> {
            self.respond()
        }

        async fn remove_cart_item(
            &self,
            _product_id: ProductId,
            _variant: Option<&Variant>,
        ) -> Result<CartSnapshot, ApiError> {
            self.respond()
        }

        async fn remove_cart_product(&self, _product_id: ProductId) -> Result<CartSnapshot, ApiError> {
            self.respond()
        }

        async fn clear_cart(&self) -> Result<CartSnapshot, ApiError> {
            self.respond()
        }
    }

    #[test]
    fn test_fresh_store_is_stale_from_cache() {
        let store = CartStore::new(StubApi::failing(), MemoryVault::new(), MemoryNotifier::new());
        assert_eq!(store.sync_state(), SyncState::StaleFromCache);
        assert!(store.items().is_empty());
        assert_eq!(store.item_count(), 0);
    }

    #[test]
    fn test_rehydrates_persisted_snapshot_as_stale() {
        let vault = MemoryVault::new();
        let persisted = snapshot(vec![line(1, 2), line(2, 1)]);
        vault.set(
            vault::keys::CART_SNAPSHOT,
            &serde_json::to_string(&persisted).unwrap(),
        );

        let store = CartStore::new(StubApi::failing(), vault, MemoryNotifier::new());
        assert_eq!(store.item_count(), 3);
        assert_eq!(store.subtotal(), persisted.subtotal);
        assert_eq!(store.sync_state(), SyncState::StaleFromCache);
    }

    #[test]
    fn test_unreadable_snapshot_discarded() {
        let vault = MemoryVault::new();
        vault.set(vault::keys::CART_SNAPSHOT, "not json");
        let store = CartStore::new(StubApi::failing(), vault, MemoryNotifier::new());
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_confirms_server_snapshot() {
        let server = snapshot(vec![line(1, 2)]);
        let vault = MemoryVault::new();
        let mut store = CartStore::new(
            StubApi::responding(server.clone()),
            vault.clone(),
            MemoryNotifier::new(),
        );

        store.refresh().await.expect("refresh succeeds");

        assert_eq!(store.items(), server.items.as_slice());
        assert_eq!(store.sync_state(), SyncState::Confirmed);
        // persisted for the next reload
        let raw = vault.get(vault::keys::CART_SNAPSHOT).expect("persisted");
        let persisted: CartSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, server);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_stale_state_silently() {
        let vault = MemoryVault::new();
        let persisted = snapshot(vec![line(1, 1)]);
        vault.set(
            vault::keys::CART_SNAPSHOT,
            &serde_json::to_string(&persisted).unwrap(),
        );
        let notifier = MemoryNotifier::new();
        let mut store = CartStore::new(StubApi::failing(), vault, notifier.clone());

        store.refresh().await.expect_err("refresh fails");

        assert_eq!(store.item_count(), 1);
        assert_eq!(store.sync_state(), SyncState::StaleFromCache);
        assert!(notifier.notices().is_empty(), "background reads are silent");
    }

    #[tokio::test]
    async fn test_add_zero_quantity_rejected_without_network() {
        let api = StubApi::responding(snapshot(vec![]));
        let calls = Arc::clone(&api.cart_calls);
        let notifier = MemoryNotifier::new();
        let mut store = CartStore::new(api, MemoryVault::new(), notifier.clone());

        let err = store
            .add_item(ProductId::new(1), 0, None)
            .await
            .expect_err("rejected");

        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert_eq!(notifier.take().len(), 1);
    }

    #[tokio::test]
    async fn test_update_quantity_zero_rejected_without_network() {
        let api = StubApi::responding(snapshot(vec![line(1, 1)]));
        let calls = Arc::clone(&api.cart_calls);
        let mut store = CartStore::new(api, MemoryVault::new(), MemoryNotifier::new());
        store.refresh().await.expect("seed");
        let before = store.items().to_vec();

        let err = store
            .update_quantity(ProductId::new(1), 0, None)
            .await
            .expect_err("rejected");

        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert_eq!(store.items(), before.as_slice());
        assert_eq!(calls.load(Ordering::Relaxed), 1, "only the seeding refresh");
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_state_and_notifies() {
        let vault = MemoryVault::new();
        let persisted = snapshot(vec![line(1, 2)]);
        vault.set(
            vault::keys::CART_SNAPSHOT,
            &serde_json::to_string(&persisted).unwrap(),
        );
        let notifier = MemoryNotifier::new();
        let mut store = CartStore::new(StubApi::failing(), vault, notifier.clone());

        let err = store
            .add_item(ProductId::new(9), 1, None)
            .await
            .expect_err("backend down");

        assert_eq!(err.message, "Cart service unavailable");
        assert_eq!(store.item_count(), 2, "no partial application");
        assert_eq!(store.sync_state(), SyncState::StaleFromCache);
        let notices = notifier.take();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices.first().map(|n| n.severity), Some(Severity::Error));
    }

    #[tokio::test]
    async fn test_mutation_success_notifies_and_confirms() {
        let server = snapshot(vec![line(1, 1)]);
        let notifier = MemoryNotifier::new();
        let mut store = CartStore::new(
            StubApi::responding(server),
            MemoryVault::new(),
            notifier.clone(),
        );

        store
            .add_item(ProductId::new(1), 1, None)
            .await
            .expect("add succeeds");

        assert_eq!(store.sync_state(), SyncState::Confirmed);
        let notices = notifier.take();
        assert_eq!(notices.first().map(|n| n.severity), Some(Severity::Success));
    }

    #[test]
    fn test_derived_subtotal_matches_line_math() {
        let vault = MemoryVault::new();
        let mut items = vec![line(1, 2), line(2, 3)];
        items.get_mut(1).unwrap().unit_price = bdt(19900, 2);
        vault.set(
            vault::keys::CART_SNAPSHOT,
            &serde_json::to_string(&snapshot(items)).unwrap(),
        );
        let store = CartStore::new(StubApi::failing(), vault, MemoryNotifier::new());

        // 2 * 500.00 + 3 * 199.00
        assert_eq!(store.derived_subtotal().amount, Decimal::new(159700, 2));
        assert_eq!(store.derived_subtotal(), store.subtotal());
    }
}
