pub mod commands;
pub mod config;
pub mod context;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "doula")]
#[command(about = "Papo de Doula CLI - practice management from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Write the CLI configuration (API and identity endpoints)")]
    Init(commands::init::InitArgs),

    #[command(about = "Sign in, sign out and password management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Staff and account administration")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UsersCommands,
    },

    #[command(about = "Client records")]
    Clients {
        #[command(subcommand)]
        cmd: commands::clients::ClientsCommands,
    },

    #[command(about = "Practice overview for staff")]
    Dashboard {
        #[arg(long, help = "Reference date, YYYY-MM-DD or DD/MM/YYYY (default: today)")]
        date: Option<String>,
    },

    #[command(about = "Client portal")]
    Portal {
        #[command(subcommand)]
        cmd: commands::portal::PortalCommands,
    },

    #[command(about = "Look up an address by CEP")]
    Cep {
        #[arg(help = "Postal code, with or without the dash")]
        code: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Init(args) => commands::init::handle(args, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, output_format).await,
        Commands::Clients { cmd } => commands::clients::handle(cmd, output_format).await,
        Commands::Dashboard { date } => commands::dashboard::handle(date, output_format).await,
        Commands::Portal { cmd } => commands::portal::handle(cmd, output_format).await,
        Commands::Cep { code } => commands::cep::handle(code, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from(["doula", "--json", "clients", "delete", "7c1f0d1e-8f4a-4c55-9d8e-0a0b0c0d0e0f"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Clients { .. }));
    }

    #[test]
    fn dashboard_takes_an_optional_date() {
        let cli = Cli::try_parse_from(["doula", "dashboard", "--date", "15/07/2025"]).unwrap();
        assert!(matches!(cli.command, Commands::Dashboard { date: Some(ref d) } if d == "15/07/2025"));
        let cli = Cli::try_parse_from(["doula", "dashboard"]).unwrap();
        assert!(matches!(cli.command, Commands::Dashboard { date: None }));
    }

    #[test]
    fn user_ids_must_be_uuids() {
        assert!(Cli::try_parse_from(["doula", "users", "update", "not-a-uuid"]).is_err());
    }
}
