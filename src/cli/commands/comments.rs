use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_record, output_success, show_collection};
use crate::cli::CliContext;
use crate::client::hooks::{use_comment_replies, use_comments};
use crate::database::models::{Comment, CommentInput};
use crate::types::Page;

#[derive(Subcommand)]
pub enum CommentCommands {
    #[command(about = "List top-level comments of a story")]
    List {
        story_id: Uuid,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        skip: u32,
    },

    #[command(about = "List replies to a comment")]
    Replies {
        comment_id: Uuid,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        skip: u32,
    },

    #[command(about = "Comment on a story as the logged-in user")]
    Create {
        story_id: Uuid,
        body: String,
        #[arg(long, help = "Reply to this top-level comment")]
        reply_to: Option<Uuid>,
    },

    #[command(about = "Delete a comment and its replies")]
    Delete { id: Uuid },
}

fn comment_line(comment: &Comment) -> String {
    format!("{}  {}: {}", comment.id, comment.author_name, comment.body)
}

pub async fn handle(cmd: CommentCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let cache = ctx.client.cache();
    match cmd {
        CommentCommands::List { story_id, limit, skip } => {
            let hook = use_comments(cache, Some(story_id), Page::new(limit, skip));
            show_collection(&ctx.format, hook, "comments", comment_line).await
        }
        CommentCommands::Replies { comment_id, limit, skip } => {
            let hook = use_comment_replies(cache, Some(comment_id), Page::new(limit, skip));
            show_collection(&ctx.format, hook, "replies", comment_line).await
        }
        CommentCommands::Create {
            story_id,
            body,
            reply_to,
        } => {
            let comment = ctx
                .client
                .create_comment(&CommentInput {
                    story_id,
                    parent_id: reply_to,
                    body,
                })
                .await?;
            output_record(&ctx.format, &comment)
        }
        CommentCommands::Delete { id } => {
            ctx.client.delete_comment(id).await?;
            output_success(&ctx.format, &format!("Deleted comment {}", id), Some(json!({ "id": id })))
        }
    }
}
