use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_record, output_success, show_collection, show_entity};
use crate::cli::CliContext;
use crate::client::hooks::{use_stories, use_stories_in_category, use_story};
use crate::database::models::{Story, StoryInput};

#[derive(Subcommand)]
pub enum StoryCommands {
    #[command(about = "List stories in display order")]
    List {
        #[arg(long, help = "Only stories of this category")]
        category: Option<Uuid>,
    },

    #[command(about = "Show one story, published or not")]
    Show { id: Uuid },

    #[command(about = "Create a story")]
    Create {
        title: String,
        #[arg(long)]
        category: Uuid,
        #[arg(long)]
        language: Uuid,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        audio_url: Option<String>,
        #[arg(long)]
        publish: bool,
        #[arg(long, default_value_t = 0)]
        sort_order: i32,
    },

    #[command(about = "Delete a story with its questions and comments")]
    Delete { id: Uuid },
}

fn story_line(story: &Story) -> String {
    let status = if story.is_published { "published" } else { "draft" };
    format!("{}  {:>4}  {:<9} {}", story.id, story.sort_order, status, story.title)
}

pub async fn handle(cmd: StoryCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let cache = ctx.client.cache();
    match cmd {
        StoryCommands::List { category: None } => {
            show_collection(&ctx.format, use_stories(cache), "stories", story_line).await
        }
        StoryCommands::List { category } => {
            show_collection(&ctx.format, use_stories_in_category(cache, category), "stories", story_line).await
        }
        StoryCommands::Show { id } => show_entity(&ctx.format, use_story(cache, Some(id))).await,
        StoryCommands::Create {
            title,
            category,
            language,
            body,
            summary,
            image_url,
            audio_url,
            publish,
            sort_order,
        } => {
            let story = ctx
                .client
                .create_story(&StoryInput {
                    title,
                    summary,
                    body,
                    category_id: category,
                    language_id: language,
                    image_url,
                    audio_url,
                    is_published: publish,
                    sort_order,
                })
                .await?;
            output_record(&ctx.format, &story)
        }
        StoryCommands::Delete { id } => {
            let story = ctx.client.delete_story(id).await?;
            output_success(
                &ctx.format,
                &format!("Deleted story {}", story.title),
                Some(json!({ "id": story.id })),
            )
        }
    }
}
