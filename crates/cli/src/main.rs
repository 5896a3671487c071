//! Shopfront CLI - storefront client from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in; the token is printed on stdout
//! export SHOPFRONT_TOKEN=$(shopfront login -e customer@shop.test -p secret)
//!
//! # Work with the current cart
//! shopfront cart create
//! shopfront cart add --product 64f1c2 --quantity 2
//! shopfront cart items
//! shopfront cart close
//!
//! # Reference data
//! shopfront cities
//! shopfront categories
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` - Session management
//! - `cart` - Show, create, close, list, add, remove, empty
//! - `cities` / `categories` - Reference data
//!
//! Configuration comes from the environment (see `shopfront_client::config`).
//! With `SHOPFRONT_CACHE_DIR` set, cart state is mirrored to disk between runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::convert::Infallible;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use shopfront_client::flows::RegistrationForm;
use shopfront_client::{ClientConfig, Shopfront};
use shopfront_core::{CartItemId, ProductId};

mod commands;
mod telemetry;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront storefront client")]
struct Cli {
    /// Session token from `shopfront login`
    #[arg(long, global = true, env = "SHOPFRONT_TOKEN", hide_env_values = true, value_parser = parse_secret)]
    token: Option<SecretString>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the session token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SHOPFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and print its session token
    Register(RegisterArgs),
    /// Clear the session and the cached cart
    Logout,
    /// Work with the current cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// List the cities offered at registration
    Cities,
    /// List product categories
    Categories,
}

#[derive(clap::Args)]
struct RegisterArgs {
    /// National ID number
    #[arg(long)]
    id_num: String,

    #[arg(short, long)]
    email: String,

    #[arg(short, long)]
    password: String,

    #[arg(long)]
    confirm_password: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    street: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,
}

impl From<RegisterArgs> for RegistrationForm {
    fn from(args: RegisterArgs) -> Self {
        Self {
            id_num: args.id_num,
            email: args.email,
            password: args.password,
            confirm_password: args.confirm_password,
            city: args.city,
            street: args.street,
            first_name: args.first_name,
            last_name: args.last_name,
        }
    }
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart
    Show,
    /// Open a new cart
    Create,
    /// Close (check out) the current cart
    Close,
    /// List the items of the current cart
    Items,
    /// Add a product to the current cart
    Add {
        /// Product ID
        #[arg(long)]
        product: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove one item
    Remove {
        /// Cart item ID
        item_id: String,
    },
    /// Remove every item of the current cart
    Empty,
}

fn parse_secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::from(value))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            telemetry::init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing();

    let shopfront = Shopfront::new(&config);

    if let Err(e) = run(cli, &shopfront).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, shopfront: &Shopfront) -> Result<(), CliError> {
    let token = cli.token.as_ref();

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(shopfront, email, password).await
        }
        Commands::Register(args) => commands::session::register(shopfront, args.into()).await,
        Commands::Logout => commands::session::logout(shopfront).await,
        Commands::Cities => commands::catalog::cities(shopfront).await,
        Commands::Categories => {
            let token = commands::require_token(token)?;
            commands::catalog::categories(shopfront, &token).await
        }
        Commands::Cart { action } => {
            let token = commands::require_token(token)?;
            match action {
                CartAction::Show => commands::cart::show(shopfront, &token).await,
                CartAction::Create => commands::cart::create(shopfront, &token).await,
                CartAction::Close => commands::cart::close(shopfront, &token).await,
                CartAction::Items => commands::cart::items(shopfront, &token).await,
                CartAction::Add { product, quantity } => {
                    commands::cart::add(shopfront, &token, &ProductId::new(product), quantity)
                        .await
                }
                CartAction::Remove { item_id } => {
                    commands::cart::remove(shopfront, &token, &CartItemId::new(item_id)).await
                }
                CartAction::Empty => commands::cart::empty(shopfront, &token).await,
            }
        }
    }
}
