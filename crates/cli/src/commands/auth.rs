//! Session commands: login, register, logout, status.

#![allow(clippy::print_stdout)]

use marigold_storefront::{SessionStore, StorefrontConfig};

use super::connect;

/// Log in and persist the session.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened or the credentials are
/// rejected.
pub async fn login(
    config: &StorefrontConfig,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (client, vault) = connect(config)?;
    let mut session = SessionStore::new(client, vault);

    session.login(email, password).await?;

    if let Some(user) = &session.state().user {
        println!("Logged in as {} <{}>", user.name, user.email);
    }
    Ok(())
}

/// Create an account and log in.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened or registration fails.
pub async fn register(
    config: &StorefrontConfig,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (client, vault) = connect(config)?;
    let mut session = SessionStore::new(client, vault);

    session.register(name, email, password).await?;

    if let Some(user) = &session.state().user {
        println!("Registered and logged in as {} <{}>", user.name, user.email);
    }
    Ok(())
}

/// Drop the local session. Works offline.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened.
pub fn logout(config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (client, vault) = connect(config)?;
    let mut session = SessionStore::new(client, vault);
    session.logout();
    println!("Logged out");
    Ok(())
}

/// Revalidate the persisted session and print who is logged in.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened.
pub async fn status(config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (client, vault) = connect(config)?;
    let mut session = SessionStore::new(client, vault);

    session.initialize().await;

    match &session.state().user {
        Some(user) => println!("Logged in as {} <{}> ({})", user.name, user.email, user.role),
        None => println!("Not logged in"),
    }
    Ok(())
}
