use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{decode_unverified, expiration, is_expired, JwtManager};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(help = "User id to place in the token")]
    pub user_id: Uuid,

    #[arg(help = "Email to place in the token")]
    pub email: String,

    #[arg(long, help = "Issue a refresh token instead of an access token")]
    pub refresh: bool,
}

/// Sign a token with the configured secret, for manual API calls.
pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let jwt = JwtManager::from_config(&config.jwt)?;
    let token = issue(&jwt, &args)?;

    if is_expired(&token) {
        tracing::warn!("issued token is already expired; check JWT_EXPIRES_IN");
    }

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({
                "token": token,
                "claims": decode_unverified(&token),
                "expiresAt": expiration(&token),
            })),
        ),
    }
}

fn issue(jwt: &JwtManager, args: &TokenArgs) -> anyhow::Result<String> {
    let token = if args.refresh {
        jwt.create_refresh_token(args.user_id, &args.email)?
    } else {
        jwt.create_access_token(args.user_id, &args.email)?
    };
    Ok(token)
}
