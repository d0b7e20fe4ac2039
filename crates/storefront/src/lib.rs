//! Marigold Storefront - client-side store engine.
//!
//! # Architecture
//!
//! Two stores form the entirety of the engine:
//!
//! - [`session::SessionStore`] - owns the authenticated-user identity, token
//!   lifecycle, and the one-shot initialization gate for protected views.
//! - [`cart::CartStore`] - owns the cart line items, persists them, and
//!   synchronizes with the remote cart. The backend is authoritative: every
//!   mutation round-trips through the REST API and local state is replaced
//!   wholesale from the server response.
//!
//! Neither store is a global. Both are constructed over three injected seams:
//!
//! - [`api::StorefrontApi`] - the REST backend contract (`api::RestClient`
//!   in production, an in-memory fake in tests).
//! - [`vault::Vault`] - durable key/value storage standing in for browser
//!   local storage (`vault::FileVault` in production).
//! - [`notify::Notifier`] - toast-style success/failure reporting for
//!   mutating cart actions.
//!
//! # Concurrency
//!
//! Single logical thread, cooperative async. Store methods take `&mut self`;
//! no locks, no request cancellation, and no ordering guarantees across
//! overlapping invocations of the same operation - the server's last response
//! wins when local state is replaced.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod notify;
pub mod session;
pub mod vault;

pub use api::{RestClient, StorefrontApi};
pub use cart::{CartStore, SyncState};
pub use config::StorefrontConfig;
pub use error::{ErrorKind, StoreError};
pub use notify::{MemoryNotifier, Notifier, TracingNotifier};
pub use session::{SessionState, SessionStore};
pub use vault::{FileVault, MemoryVault, Vault};
