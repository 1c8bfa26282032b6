use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{clear_session, load_session, save_session, CliSession};
use crate::cli::utils::{output_record, output_success};
use crate::cli::{CliContext, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to server and save the token")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, env = "BSC_PASSWORD", hide_env_values = true, help = "Password")]
        password: String,
    },

    #[command(about = "Forget the saved token")]
    Logout,

    #[command(about = "Show the saved session")]
    Status,

    #[command(about = "Show the account behind the current token")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, ctx: &CliContext) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let response = ctx.client.login(&email, &password).await?;
            save_session(&CliSession::new(ctx.server.clone(), response.token.clone(), response.user.email.clone()))?;
            output_success(
                &ctx.format,
                &format!("Logged in to {} as {}", ctx.server, response.user.email),
                Some(json!({ "user": response.user, "expires_in": response.expires_in })),
            )
        }
        AuthCommands::Logout => {
            clear_session()?;
            output_success(&ctx.format, "Logged out", None)
        }
        AuthCommands::Status => {
            let session = load_session()?;
            match ctx.format {
                OutputFormat::Text if !session.is_logged_in() => {
                    println!("Not logged in");
                    Ok(())
                }
                _ => output_record(
                    &ctx.format,
                    &json!({
                        "server": session.server,
                        "email": session.email,
                        "logged_in": session.is_logged_in(),
                        "logged_in_at": session.logged_in_at,
                    }),
                ),
            }
        }
        AuthCommands::Whoami => {
            let principal = ctx.client.whoami().await?;
            output_record(&ctx.format, &principal)
        }
    }
}
