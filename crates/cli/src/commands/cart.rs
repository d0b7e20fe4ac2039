//! Cart commands: show, add, update, remove, clear.

#![allow(clippy::print_stdout)]

use marigold_core::ProductId;
use marigold_storefront::api::{CartItem, Variant};
use marigold_storefront::{CartStore, FileVault, RestClient, StorefrontConfig, TracingNotifier};

use super::connect;

/// Fold `--size`/`--color` flags into a variant, if either was given.
fn variant(size: Option<String>, color: Option<String>) -> Option<Variant> {
    if size.is_none() && color.is_none() {
        None
    } else {
        Some(Variant { size, color })
    }
}

fn open_cart(
    config: &StorefrontConfig,
) -> Result<CartStore<RestClient<FileVault>, FileVault, TracingNotifier>, Box<dyn std::error::Error>>
{
    let (client, vault) = connect(config)?;
    Ok(CartStore::new(client, vault, TracingNotifier))
}

fn print_line(item: &CartItem) {
    let variant = item.variant.as_ref().map_or_else(String::new, |v| {
        let parts: Vec<&str> = [v.size.as_deref(), v.color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        format!(" [{}]", parts.join("/"))
    });
    println!(
        "  {:>4} x {}{} @ {} = {}",
        item.quantity,
        item.name,
        variant,
        item.unit_price.display(),
        item.line_total().display()
    );
}

fn print_cart(store: &CartStore<RestClient<FileVault>, FileVault, TracingNotifier>) {
    if store.items().is_empty() {
        println!("Cart is empty");
        return;
    }
    for item in store.items() {
        print_line(item);
    }
    println!(
        "Subtotal: {} ({} items)",
        store.subtotal().display(),
        store.item_count()
    );
}

/// Fetch and print the cart.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened or the fetch fails.
pub async fn show(config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_cart(config)?;
    store.refresh().await?;
    print_cart(&store);
    Ok(())
}

/// Add a product and print the resulting cart.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened or the mutation fails.
pub async fn add(
    config: &StorefrontConfig,
    product_id: i64,
    quantity: u32,
    size: Option<String>,
    color: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_cart(config)?;
    store
        .add_item(ProductId::new(product_id), quantity, variant(size, color))
        .await?;
    print_cart(&store);
    Ok(())
}

/// Set a line's quantity and print the resulting cart.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened or the mutation fails.
pub async fn update(
    config: &StorefrontConfig,
    product_id: i64,
    quantity: u32,
    size: Option<String>,
    color: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_cart(config)?;
    store
        .update_quantity(
            ProductId::new(product_id),
            quantity,
            variant(size, color).as_ref(),
        )
        .await?;
    print_cart(&store);
    Ok(())
}

/// Remove one line (by exact `(product, variant)` identity), or with `all`
/// every line of the product, and print the cart.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened or the mutation fails.
pub async fn remove(
    config: &StorefrontConfig,
    product_id: i64,
    size: Option<String>,
    color: Option<String>,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_cart(config)?;
    if all {
        store.remove_product(ProductId::new(product_id)).await?;
    } else {
        store
            .remove_item(ProductId::new(product_id), variant(size, color).as_ref())
            .await?;
    }
    print_cart(&store);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the vault cannot be opened or the mutation fails.
pub async fn clear(config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_cart(config)?;
    store.clear().await?;
    println!("Cart cleared");
    Ok(())
}
