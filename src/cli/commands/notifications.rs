use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_record, output_success, show_collection};
use crate::cli::CliContext;
use crate::client::hooks::use_notifications;
use crate::database::models::NotificationInput;

#[derive(Subcommand)]
pub enum NotificationCommands {
    #[command(about = "List sent notifications")]
    List,

    #[command(about = "Send a push notification")]
    Send {
        title: String,
        body: String,
        #[arg(long, default_value = "all")]
        topic: String,
    },

    #[command(about = "Delete a notification record")]
    Delete { id: Uuid },
}

pub async fn handle(cmd: NotificationCommands, ctx: &CliContext) -> anyhow::Result<()> {
    match cmd {
        NotificationCommands::List => {
            show_collection(&ctx.format, use_notifications(ctx.client.cache()), "notifications", |n| {
                let sent = n.sent_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "pending".to_string());
                format!("{}  [{}] {} ({})", n.id, n.topic, n.title, sent)
            })
            .await
        }
        NotificationCommands::Send { title, body, topic } => {
            let notification = ctx
                .client
                .send_notification(&NotificationInput { title, body, topic })
                .await?;
            output_record(&ctx.format, &notification)
        }
        NotificationCommands::Delete { id } => {
            ctx.client.delete_notification(id).await?;
            output_success(&ctx.format, &format!("Deleted notification {}", id), Some(json!({ "id": id })))
        }
    }
}
