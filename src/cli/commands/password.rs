use clap::Args;
use serde_json::json;

use crate::auth::{generate_random_password, generate_token, hash_password, validate_password_strength};
use crate::cli::{utils::output_success, OutputFormat};

const GENERATED_PASSWORD_LENGTH: usize = 16;

#[derive(Args)]
pub struct HashPasswordArgs {
    #[arg(help = "Plain-text password to hash; a random one is generated when omitted")]
    pub password: Option<String>,

    #[arg(long, help = "bcrypt cost (defaults to the library default)")]
    pub cost: Option<u32>,
}

#[derive(Args)]
pub struct GenerateSecretArgs {
    #[arg(long, help = "Number of random bytes", default_value = "32")]
    pub bytes: usize,
}

pub async fn handle(args: HashPasswordArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let generated = args.password.is_none();
    let password = args
        .password
        .unwrap_or_else(|| generate_random_password(GENERATED_PASSWORD_LENGTH));

    let strength = validate_password_strength(&password);
    if !strength.valid {
        tracing::warn!(score = strength.score, "password would be rejected at registration");
    }

    let hash = hash_password(&password, args.cost).await?;
    match output_format {
        OutputFormat::Text => {
            if generated {
                println!("password: {}", password);
            }
            println!("{}", hash);
            Ok(())
        }
        OutputFormat::Json => {
            let mut data = json!({ "hash": hash, "strength": strength });
            if generated {
                data["password"] = json!(password);
            }
            output_success(output_format, "Password hashed", Some(data))
        }
    }
}

/// Print a random hex secret, suitable for `JWT_SECRET`.
pub fn handle_generate_secret(args: GenerateSecretArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    if args.bytes == 0 {
        anyhow::bail!("--bytes must be at least 1");
    }
    let secret = generate_token(args.bytes);
    match output_format {
        OutputFormat::Text => {
            println!("{}", secret);
            Ok(())
        }
        OutputFormat::Json => output_success(output_format, "Secret generated", Some(json!({ "secret": secret }))),
    }
}
