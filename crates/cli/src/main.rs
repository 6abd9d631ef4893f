//! Rinkside CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! rinkside-cli migrate
//!
//! # Create the site preference row if missing
//! rinkside-cli preferences init
//!
//! # Create a marketplace user
//! rinkside-cli user create -e wayne@example.com -p hunter99 -f Wayne -l Gretzky
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rinkside-cli")]
#[command(author, version, about = "Rinkside CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage site preferences
    Preferences {
        #[command(subcommand)]
        action: PreferencesAction,
    },
    /// Manage marketplace users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum PreferencesAction {
    /// Create the preference row with defaults if it does not exist
    Init,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,
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
        Commands::Preferences { action } => match action {
            PreferencesAction::Init => commands::preferences::init().await?,
        },
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                password,
                first_name,
                last_name,
            } => {
                commands::user::create(&email, &password, &first_name, &last_name).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "rinkside-cli",
            "user",
            "create",
            "-e",
            "wayne@example.com",
            "-p",
            "hunter99",
            "-f",
            "Wayne",
            "-l",
            "Gretzky",
        ]);
        assert!(matches!(
            cli,
            Ok(Cli {
                command: Commands::User {
                    action: UserAction::Create { .. }
                }
            })
        ));
    }
}
