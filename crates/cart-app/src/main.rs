//! # lucy-cart
//!
//! Command-line client for the Lucy Mundo de Pijamas storefront cart.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STOREFRONT_BACKEND_URL=http://localhost:8080
//! export WOMPI_PUBLIC_KEY=pub_test_...
//! export WOMPI_INTEGRITY_SECRET=test_integrity_...
//!
//! lucy-cart cart add 7 --variant 3
//! lucy-cart refresh
//! lucy-cart checkout
//! ```

use cart_app::commands;
use cart_app::{AppConfig, AppState};
use cart_core::{ProductId, VariantId};
use cart_wompi::WompiConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lucy-cart")]
#[command(author, version, about = "Lucy storefront cart and checkout")]
struct Cli {
    /// Configuration file (defaults to ./lucy-cart.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Re-price the cart from the live catalog
    Refresh,
    /// Print the signed widget input for the cart
    Session,
    /// Pay for the cart through Wompi and place the order
    Checkout,
    /// List a customer's orders
    Orders {
        /// Customer id
        #[arg(long)]
        customer: i64,
    },
    /// Save the bearer token used for orders
    Login {
        /// Token issued by the storefront
        token: String,
    },
    /// Forget the saved bearer token
    Logout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and total
    Show,
    /// Add one unit of a product
    Add {
        product: ProductId,
        /// Variant (size) id
        #[arg(short, long)]
        variant: Option<VariantId>,
    },
    /// Remove a product, or only one variant of it
    Remove {
        product: ProductId,
        #[arg(short, long)]
        variant: Option<VariantId>,
    },
    /// Set a quantity (0 removes)
    SetQty {
        product: ProductId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
        #[arg(short, long)]
        variant: Option<VariantId>,
    },
    /// Remove everything
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    info!("Backend: {}", config.backend_url);
    let state = AppState::new(config)?;

    let mut out = std::io::stdout();
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state, &mut out)?,
            CartAction::Add { product, variant } => {
                commands::cart::add(&state, product, variant, &mut out).await?;
            }
            CartAction::Remove { product, variant } => {
                commands::cart::remove(&state, product, variant, &mut out)?;
            }
            CartAction::SetQty {
                product,
                quantity,
                variant,
            } => commands::cart::set_quantity(&state, product, variant, quantity, &mut out)?,
            CartAction::Clear => commands::cart::clear(&state, &mut out)?,
        },
        Commands::Refresh => commands::refresh::run(&state, &mut out).await?,
        Commands::Session => {
            let wompi = WompiConfig::from_env()?;
            commands::checkout::session(&state, wompi, &mut out)?;
        }
        Commands::Checkout => {
            let wompi = WompiConfig::from_env()?;
            info!("Wompi sandbox: {}", wompi.is_test_mode());
            commands::checkout::pay(&state, wompi, commands::checkout::StdinPresenter, &mut out)
                .await?;
        }
        Commands::Orders { customer } => commands::orders::list(&state, customer, &mut out).await?,
        Commands::Login { token } => commands::auth::login(&state, &token, &mut out)?,
        Commands::Logout => commands::auth::logout(&state, &mut out)?,
    }

    Ok(())
}
