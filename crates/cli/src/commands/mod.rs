//! Command implementations.
//!
//! Each command builds the stores fresh from the persisted state directory,
//! so every invocation behaves like a page load: rehydrate, revalidate, act.

pub mod auth;
pub mod cart;

use marigold_storefront::{FileVault, RestClient, StorefrontConfig};

/// Open the persistent vault and an API client sharing it.
pub fn connect(
    config: &StorefrontConfig,
) -> Result<(RestClient<FileVault>, FileVault), Box<dyn std::error::Error>> {
    let vault = FileVault::open(&config.state_dir)?;
    let client = RestClient::new(config, vault.clone())?;
    Ok((client, vault))
}
