use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_record, output_success, show_collection, show_entity};
use crate::cli::CliContext;
use crate::client::hooks::{use_user, use_users};
use crate::database::models::UserInput;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List user accounts")]
    List,

    #[command(about = "Show one user")]
    Show { id: Uuid },

    #[command(about = "Create a user account")]
    Create {
        name: String,
        email: String,
        #[arg(long, env = "BSC_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long = "permission", help = "Permission to grant (repeatable)")]
        permissions: Vec<String>,
        #[arg(long, help = "Create the account deactivated")]
        inactive: bool,
    },

    #[command(about = "Delete a user account")]
    Delete { id: Uuid },
}

pub async fn handle(cmd: UserCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let cache = ctx.client.cache();
    match cmd {
        UserCommands::List => {
            show_collection(&ctx.format, use_users(cache), "users", |user| {
                format!("{}  {:<30} {} [{}]", user.id, user.email, user.name, user.permissions.join(","))
            })
            .await
        }
        UserCommands::Show { id } => show_entity(&ctx.format, use_user(cache, Some(id))).await,
        UserCommands::Create {
            name,
            email,
            password,
            permissions,
            inactive,
        } => {
            let user = ctx
                .client
                .create_user(&UserInput {
                    name,
                    email,
                    password,
                    permissions,
                    is_active: !inactive,
                })
                .await?;
            output_record(&ctx.format, &user)
        }
        UserCommands::Delete { id } => {
            let user = ctx.client.delete_user(id).await?;
            output_success(&ctx.format, &format!("Deleted user {}", user.email), Some(json!({ "id": user.id })))
        }
    }
}
