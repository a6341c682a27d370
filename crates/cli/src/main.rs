//! Catalog Desk CLI - operator tools for the admin panel.
//!
//! # Usage
//!
//! ```bash
//! # Produce a value for ADMIN_PASSWORD_HASH
//! catalog-cli admin hash-password 'correct horse battery staple'
//!
//! # List the products currently in the spreadsheet
//! catalog-cli catalog products
//!
//! # Store the image host API key without opening the settings tab
//! catalog-cli settings set-image-key <key>
//! ```
//!
//! # Commands
//!
//! - `admin hash-password` - Hash an administrator password
//! - `catalog products` - List the remote catalog
//! - `settings set-image-key` - Persist the image host API key

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(author, version, about = "Catalog Desk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrator credentials
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Read the remote catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Hash a password for `ADMIN_PASSWORD_HASH`
    HashPassword {
        /// Plain-text password
        password: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products from the spreadsheet
    Products,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Store the image host API key
    SetImageKey {
        /// API key issued by the image host
        key: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => {
                commands::admin::hash_password(&password)?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Products => commands::catalog::list_products().await?,
        },
        Commands::Settings { action } => match action {
            SettingsAction::SetImageKey { key } => {
                commands::settings::set_image_key(&key).await?;
            }
        },
    }
    Ok(())
}
