//! Marigold CLI - drive the storefront engine from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Authenticate
//! marigold auth login -e customer@example.com -p secret
//! marigold auth status
//! marigold auth logout
//!
//! # Cart operations
//! marigold cart show
//! marigold cart add 42 -q 2 --size M
//! marigold cart update 42 -q 3 --size M
//! marigold cart remove 42 --size M
//! marigold cart clear
//! ```
//!
//! # Commands
//!
//! - `auth` - Login, register, logout, and session status
//! - `cart` - Inspect and mutate the cart
//!
//! Tokens and store snapshots persist under `MARIGOLD_STATE_DIR` (default
//! `.marigold`), so consecutive invocations share a session the way page
//! loads in a browser share local storage.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use marigold_storefront::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "marigold")]
#[command(author, version, about = "Marigold storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Inspect and mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
    /// Discard the local session
    Logout,
    /// Show who is logged in, revalidating against the backend
    Status,
}

#[derive(Subcommand)]
enum CartAction {
    /// Fetch and print the cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        product_id: i64,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Variant size
        #[arg(long)]
        size: Option<String>,

        /// Variant color
        #[arg(long)]
        color: Option<String>,
    },
    /// Set the quantity of a cart line
    Update {
        /// Product id
        product_id: i64,

        /// New quantity (must be at least 1)
        #[arg(short, long)]
        quantity: u32,

        /// Variant size
        #[arg(long)]
        size: Option<String>,

        /// Variant color
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a cart line (the variant-less line when no variant given)
    Remove {
        /// Product id
        product_id: i64,

        /// Variant size
        #[arg(long)]
        size: Option<String>,

        /// Variant color
        #[arg(long)]
        color: Option<String>,

        /// Remove every line of the product, regardless of variant
        #[arg(long, conflicts_with_all = ["size", "color"])]
        all: bool,
    },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to warn level if RUST_LOG is not set, so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marigold_storefront=warn,marigold_cli=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(config, &email, &password).await?;
            }
            AuthAction::Register {
                name,
                email,
                password,
            } => {
                commands::auth::register(config, &name, &email, &password).await?;
            }
            AuthAction::Logout => commands::auth::logout(config)?,
            AuthAction::Status => commands::auth::status(config).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(config).await?,
            CartAction::Add {
                product_id,
                quantity,
                size,
                color,
            } => {
                commands::cart::add(config, product_id, quantity, size, color).await?;
            }
            CartAction::Update {
                product_id,
                quantity,
                size,
                color,
            } => {
                commands::cart::update(config, product_id, quantity, size, color).await?;
            }
            CartAction::Remove {
                product_id,
                size,
                color,
                all,
            } => {
                commands::cart::remove(config, product_id, size, color, all).await?;
            }
            CartAction::Clear => commands::cart::clear(config).await?,
        },
    }
    Ok(())
}
