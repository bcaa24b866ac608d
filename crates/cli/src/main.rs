//! Quillpost CLI - Database migrations and bootstrap tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! qp-cli migrate
//!
//! # Create the first superadmin
//! qp-cli superadmin create -e admin@example.com -f Ada -l Lovelace --dob 1990-12-10
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `superadmin create` - Create a superadmin account

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "qp-cli")]
#[command(author, version, about = "Quillpost CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage superadmin accounts
    Superadmin {
        #[command(subcommand)]
        action: SuperadminAction,
    },
}

#[derive(Subcommand)]
enum SuperadminAction {
    /// Create a new superadmin
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: NaiveDate,

        /// Password (6-16 characters)
        #[arg(long, env = "SUPERADMIN_PASSWORD", hide_env_values = true)]
        password: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Superadmin { action } => match action {
            SuperadminAction::Create {
                email,
                first_name,
                last_name,
                dob,
                password,
            } => {
                commands::superadmin::create(commands::superadmin::NewSuperadmin {
                    email,
                    first_name,
                    last_name,
                    dob,
                    password,
                })
                .await?;
            }
        },
    }
    Ok(())
}
