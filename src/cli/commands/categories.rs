use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_record, output_success, show_collection, show_entity};
use crate::cli::CliContext;
use crate::client::hooks::{use_categories, use_category};
use crate::database::models::CategoryInput;

#[derive(Subcommand)]
pub enum CategoryCommands {
    #[command(about = "List categories")]
    List,

    #[command(about = "Show one category")]
    Show { id: Uuid },

    #[command(about = "Create a category")]
    Create {
        name: String,
        #[arg(long)]
        language: Uuid,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        inactive: bool,
    },

    #[command(about = "Delete a category without stories")]
    Delete { id: Uuid },
}

pub async fn handle(cmd: CategoryCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let cache = ctx.client.cache();
    match cmd {
        CategoryCommands::List => {
            show_collection(&ctx.format, use_categories(cache), "categories", |category| {
                format!("{}  {}", category.id, category.name)
            })
            .await
        }
        CategoryCommands::Show { id } => show_entity(&ctx.format, use_category(cache, Some(id))).await,
        CategoryCommands::Create {
            name,
            language,
            description,
            image_url,
            inactive,
        } => {
            let category = ctx
                .client
                .create_category(&CategoryInput {
                    name,
                    description,
                    language_id: language,
                    image_url,
                    is_active: !inactive,
                })
                .await?;
            output_record(&ctx.format, &category)
        }
        CategoryCommands::Delete { id } => {
            let category = ctx.client.delete_category(id).await?;
            output_success(
                &ctx.format,
                &format!("Deleted category {}", category.name),
                Some(json!({ "id": category.id })),
            )
        }
    }
}
