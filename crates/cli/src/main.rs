//! Payment voucher CLI - session and navigation tools for the voucher console.
//!
//! # Usage
//!
//! ```bash
//! # Log in (prompts on stdin unless -p or PV_PASSWORD is given)
//! pv-cli login -u clerk
//!
//! # Show who is logged in and what they can open
//! pv-cli whoami
//! pv-cli menu
//!
//! # Check what navigating to a location would do
//! pv-cli open /pending-approvals
//!
//! # Password recovery
//! pv-cli request-password-change -e clerk@example.com
//! pv-cli reset-password --token abc123 --password s3cret --confirm s3cret
//!
//! # Forget the stored credential
//! pv-cli logout
//! ```
//!
//! # Environment Variables
//!
//! - `PV_API_URL`, `PV_REQUEST_TIMEOUT_SECS`, `PV_CREDENTIAL_PATH` - see
//!   `payment_voucher_console::config`
//! - `PV_PASSWORD` - Password for `login` when `-p` is omitted
//! - `PV_LOG_JSON` - Emit logs as JSON
//! - `RUST_LOG` - Log filter (default: `payment_voucher_console=info,pv_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "payment_voucher_console=info,pv_cli=info";

#[derive(Parser)]
#[command(name = "pv-cli")]
#[command(author, version, about = "Payment voucher console CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the credential
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password (falls back to `PV_PASSWORD`, then a line on stdin)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored credential
    Logout,
    /// Show the logged-in identity
    Whoami,
    /// Show the navigation menu for the logged-in role
    Menu,
    /// Show what navigating to a location would do
    Open {
        /// Location, e.g. `/user-management`
        path: String,
    },
    /// List registered views and their access rules
    Routes,
    /// Email a password reset link
    RequestPasswordChange {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password from a reset link token
    ResetPassword {
        /// Token from the reset link
        #[arg(long)]
        token: String,

        /// New password
        #[arg(long)]
        password: String,

        /// New password again
        #[arg(long)]
        confirm: String,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    // Logs go to stderr so command output stays clean on stdout
    let json = std::env::var_os("PV_LOG_JSON").is_some();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), commands::CliError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&username, password).await?;
        }
        Commands::Logout => commands::auth::logout()?,
        Commands::Whoami => commands::auth::whoami().await?,
        Commands::Menu => commands::auth::menu().await?,
        Commands::Open { path } => commands::navigate::open(&path).await?,
        Commands::Routes => commands::navigate::routes(),
        Commands::RequestPasswordChange { email } => {
            commands::account::request_password_change(&email).await?;
        }
        Commands::ResetPassword {
            token,
            password,
            confirm,
        } => {
            commands::account::reset_password(&token, password, confirm).await?;
        }
    }
    Ok(())
}
