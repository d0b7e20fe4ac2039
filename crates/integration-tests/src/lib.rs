//! Integration tests for Marigold.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marigold-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - Login, register, reload, revalidation flows
//! - `cart_operations` - Cart merging, failure recovery, persistence
//!
//! The tests run against [`FakeBackend`], an in-memory implementation of the
//! `StorefrontApi` contract with the same observable semantics as the REST
//! backend: token issuance on login/register, profile lookup by token, and a
//! server-authoritative cart that merges additively by `(product, variant)`
//! and recomputes the subtotal on every mutation.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use secrecy::SecretString;

use marigold_core::{CurrencyCode, Email, Price, ProductId, Role, UserId};
use marigold_storefront::StorefrontApi;
use marigold_storefront::api::{
    AddItemRequest, ApiError, AuthTokens, CartItem, CartSnapshot, UpdateItemRequest, User, Variant,
};

/// A product the fake backend knows how to sell.
#[derive(Debug, Clone)]
struct CatalogEntry {
    id: ProductId,
    name: String,
    unit_price: Price,
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    next_user_id: i64,
    next_token: u32,
    accounts: Vec<Account>,
    /// Access token -> user. Refresh tokens are issued but never redeemed
    /// here; the engine only ever presents the access token.
    sessions: HashMap<String, UserId>,
    catalog: Vec<CatalogEntry>,
    cart: Vec<CartItem>,
    fail_next: Option<(u16, String)>,
    requests: u32,
}

/// In-memory stand-in for the Marigold REST backend.
///
/// Cloning shares the state, so a test can hold one handle for assertions
/// and failure injection while the stores own another.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

#[allow(clippy::unwrap_used)] // literal prices in test fixtures
fn bdt(amount: &str) -> Price {
    Price::new(amount.parse::<Decimal>().unwrap(), CurrencyCode::BDT)
}

impl FakeBackend {
    /// A backend seeded with a small catalog and one registered customer
    /// (`ayesha@example.com` / `correct-horse`).
    #[must_use]
    pub fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut state = backend.lock();
            state.next_user_id = 1;
            state.catalog = vec![
                CatalogEntry {
                    id: ProductId::new(1),
                    name: "Jamdani Scarf".to_string(),
                    unit_price: bdt("1200.00"),
                },
                CatalogEntry {
                    id: ProductId::new(2),
                    name: "Terracotta Mug".to_string(),
                    unit_price: bdt("450.00"),
                },
                CatalogEntry {
                    id: ProductId::new(3),
                    name: "Katan Saree".to_string(),
                    unit_price: bdt("8500.00"),
                },
            ];
        }
        backend.seed_account("Ayesha Rahman", "ayesha@example.com", "correct-horse");
        backend
    }

    /// Register an account directly, bypassing the API surface.
    ///
    /// # Panics
    ///
    /// Panics on a malformed email; fixture data is expected to be valid.
    #[allow(clippy::unwrap_used)]
    pub fn seed_account(&self, name: &str, email: &str, password: &str) {
        let mut state = self.lock();
        let id = UserId::new(state.next_user_id);
        state.next_user_id += 1;
        state.accounts.push(Account {
            user: User {
                id,
                name: name.to_string(),
                email: Email::parse(email).unwrap(),
                phone: None,
                role: Role::Customer,
                addresses: Vec::new(),
            },
            password: password.to_string(),
        });
    }

    /// Make the next API call fail with the given status and `detail`.
    pub fn fail_next(&self, status: u16, detail: &str) {
        self.lock().fail_next = Some((status, detail.to_string()));
    }

    /// Invalidate every issued token, as a backend-side revocation would.
    pub fn revoke_sessions(&self) {
        self.lock().sessions.clear();
    }

    /// Number of API calls handled so far (including injected failures).
    #[must_use]
    pub fn requests(&self) -> u32 {
        self.lock().requests
    }

    /// The server's current view of the cart.
    #[must_use]
    pub fn cart(&self) -> CartSnapshot {
        snapshot(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Count the request and consume any injected failure.
    fn begin(&self) -> Result<MutexGuard<'_, State>, ApiError> {
        let mut state = self.lock();
        state.requests += 1;
        if let Some((status, detail)) = state.fail_next.take() {
            return Err(ApiError::status(status, detail));
        }
        Ok(state)
    }
}

fn snapshot(state: &State) -> CartSnapshot {
    let subtotal = state
        .cart
        .iter()
        .map(CartItem::line_total)
        .fold(Price::zero(CurrencyCode::BDT), |a, p| a + p);
    CartSnapshot {
        items: state.cart.clone(),
        subtotal,
    }
}

fn issue_tokens(state: &mut State, user: UserId) -> AuthTokens {
    state.next_token += 1;
    let n = state.next_token;
    let access = format!("access-{n}");
    state.sessions.insert(access.clone(), user);
    AuthTokens {
        access_token: SecretString::from(access),
        refresh_token: SecretString::from(format!("refresh-{n}")),
    }
}

impl StorefrontApi for FakeBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let mut state = self.begin()?;
        let id = state
            .accounts
            .iter()
            .find(|a| a.user.email.as_str() == email && a.password == password)
            .map(|a| a.user.id)
            .ok_or_else(|| ApiError::status(401, "Invalid email or password"))?;
        Ok(issue_tokens(&mut state, id))
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ApiError> {
        let mut state = self.begin()?;
        if state.accounts.iter().any(|a| a.user.email.as_str() == email) {
            return Err(ApiError::status(
                409,
                "An account with this email already exists",
            ));
        }
        let parsed = Email::parse(email)
            .map_err(|e| ApiError::status(422, e.to_string()))?;
        let id = UserId::new(state.next_user_id);
        state.next_user_id += 1;
        state.accounts.push(Account {
            user: User {
                id,
                name: name.to_string(),
                email: parsed,
                phone: None,
                role: Role::Customer,
                addresses: Vec::new(),
            },
            password: password.to_string(),
        });
        Ok(issue_tokens(&mut state, id))
    }

    async fn current_user(&self, access_token: &str) -> Result<User, ApiError> {
        let state = self.begin()?;
        let id = state
            .sessions
            .get(access_token)
            .copied()
            .ok_or_else(|| ApiError::status(401, "Could not validate credentials"))?;
        state
            .accounts
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
            .ok_or_else(|| ApiError::status(401, "Could not validate credentials"))
    }

    async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError> {
        let state = self.begin()?;
        Ok(snapshot(&state))
    }

    async fn add_cart_item(&self, request: &AddItemRequest) -> Result<CartSnapshot, ApiError> {
        let mut state = self.begin()?;
        let entry = state
            .catalog
            .iter()
            .find(|e| e.id == request.product_id)
            .cloned()
            .ok_or_else(|| ApiError::status(404, "Product not found"))?;

        // Merge additively into an existing line, or append preserving order.
        if let Some(line) = state
            .cart
            .iter_mut()
            .find(|l| l.matches(request.product_id, request.variant.as_ref()))
        {
            line.quantity += request.quantity;
        } else {
            state.cart.push(CartItem {
                product_id: entry.id,
                name: entry.name,
                unit_price: entry.unit_price,
                image: None,
                quantity: request.quantity,
                variant: request.variant.clone(),
            });
        }
        Ok(snapshot(&state))
    }

    async fn update_cart_item(
        &self,
        product_id: ProductId,
        request: &UpdateItemRequest,
    ) -> Result<CartSnapshot, ApiError> {
        let mut state = self.begin()?;
        let line = state
            .cart
            .iter_mut()
            .find(|l| l.matches(product_id, request.variant.as_ref()))
            .ok_or_else(|| ApiError::status(404, "Item not in cart"))?;
        line.quantity = request.quantity;
        Ok(snapshot(&state))
    }

    async fn remove_cart_item(
        &self,
        product_id: ProductId,
        variant: Option<&Variant>,
    ) -> Result<CartSnapshot, ApiError> {
        let mut state = self.begin()?;
        // Exact line identity: a `None` variant is the variant-less line,
        // not a wildcard. Removing an absent line is a no-op.
        state.cart.retain(|l| !l.matches(product_id, variant));
        Ok(snapshot(&state))
    }

    async fn remove_cart_product(&self, product_id: ProductId) -> Result<CartSnapshot, ApiError> {
        let mut state = self.begin()?;
        state.cart.retain(|l| !l.is_product(product_id));
        Ok(snapshot(&state))
    }

    async fn clear_cart(&self) -> Result<CartSnapshot, ApiError> {
        let mut state = self.begin()?;
        state.cart.clear();
        Ok(snapshot(&state))
    }
}
