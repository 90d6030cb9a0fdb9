pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Catalog API administration: migrations, demo data, password hashes")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending SQL migrations")]
    Migrate,

    #[command(about = "Insert demo users, categories and products")]
    Seed(commands::seed::SeedArgs),

    #[command(about = "Print a bcrypt hash for a password")]
    HashPassword(commands::password::HashPasswordArgs),

    #[command(about = "Print a random hex secret for JWT_SECRET")]
    GenerateSecret(commands::password::GenerateSecretArgs),

    #[command(about = "Sign a JWT for a user with the configured secret")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::Seed(args) => commands::seed::handle(args, config, output_format).await,
        Commands::HashPassword(args) => commands::password::handle(args, output_format).await,
        Commands::GenerateSecret(args) => commands::password::handle_generate_secret(args, output_format),
        Commands::Token(args) => commands::token::handle(args, config, output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["catalog", "--json", "seed", "--products", "5"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        match cli.command {
            Commands::Seed(args) => assert_eq!(args.products, 5),
            _ => panic!("expected seed"),
        }

        let cli = Cli::parse_from(["catalog", "hash-password", "secret", "--cost", "4"]);
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Text);
        assert!(matches!(cli.command, Commands::HashPassword(_)));

        let cli = Cli::parse_from(["catalog", "hash-password"]);
        match cli.command {
            Commands::HashPassword(args) => assert!(args.password.is_none()),
            _ => panic!("expected hash-password"),
        }

        let cli = Cli::parse_from(["catalog", "token", "00000000-0000-0000-0000-000000000000", "a@b.co", "--refresh"]);
        match cli.command {
            Commands::Token(args) => {
                assert!(args.refresh);
                assert_eq!(args.user_id, uuid::Uuid::nil());
            }
            _ => panic!("expected token"),
        }
        assert!(Cli::try_parse_from(["catalog", "token", "not-a-uuid", "a@b.co"]).is_err());
    }
}
