//! Modvault CLI - migrations, admin bootstrap and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply every pending migration in migrations/
//! mv-cli migrate
//!
//! # Give an existing account full admin access
//! mv-cli admin grant --email owner@modvault.gg
//!
//! # Create a custom role
//! mv-cli admin create-role -n "Support" -p view_tickets,manage_tickets
//!
//! # Load mods and subscription tiers from YAML
//! mv-cli seed catalog catalog.yaml
//! ```
//!
//! Every command reads `DATABASE_URL` (or `ADMIN_DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mv-cli")]
#[command(author, version, about = "Modvault CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage back-office access
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Set the admin flag on an existing account
    Grant {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Create a custom role
    CreateRole {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Permission IDs, comma separated
        #[arg(short, long, value_delimiter = ',')]
        permissions: Vec<String>,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Mods and subscription tiers from a YAML file
    Catalog {
        /// Path to the YAML file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::grant(&email).await?,
            AdminAction::CreateRole {
                name,
                description,
                permissions,
            } => {
                commands::admin::create_role(name, description, permissions).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_permissions_split_on_commas() {
        let cli = Cli::try_parse_from([
            "mv-cli",
            "admin",
            "create-role",
            "--name",
            "Support",
            "-p",
            "view_tickets,manage_tickets",
        ]);
        let Ok(Cli {
            command:
                Commands::Admin {
                    action: AdminAction::CreateRole { permissions, .. },
                },
        }) = cli
        else {
            panic!("create-role did not parse");
        };
        assert_eq!(permissions, vec!["view_tickets", "manage_tickets"]);
    }
}
