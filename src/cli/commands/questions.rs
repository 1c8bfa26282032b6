use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_record, output_success, show_collection, show_entity};
use crate::cli::CliContext;
use crate::client::hooks::{use_question, use_questions, use_story_question, use_story_questions};
use crate::database::models::{QuestionInput, StoryQuestionInput};

/// Questions are general unless `--story` is given.
#[derive(Subcommand)]
pub enum QuestionCommands {
    #[command(about = "List general questions, or the questions of one story")]
    List {
        #[arg(long)]
        story: Option<Uuid>,
    },

    #[command(about = "Show one question")]
    Show {
        id: Uuid,
        #[arg(long, help = "The id names a story question")]
        story_question: bool,
    },

    #[command(about = "Create a question")]
    Create {
        question: String,
        #[arg(long = "option", required = true, help = "Answer option (repeatable)")]
        options: Vec<String>,
        #[arg(long, help = "Zero-based index of the correct option")]
        answer: usize,
        #[arg(long, help = "Attach the question to this story")]
        story: Option<Uuid>,
        #[arg(long, conflicts_with = "story")]
        language: Option<Uuid>,
    },

    #[command(about = "Delete a question")]
    Delete {
        id: Uuid,
        #[arg(long, help = "The id names a story question")]
        story_question: bool,
    },
}

fn question_line(id: Uuid, question: &str, options: &[String]) -> String {
    format!("{}  {} ({} options)", id, question, options.len())
}

pub async fn handle(cmd: QuestionCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let cache = ctx.client.cache();
    match cmd {
        QuestionCommands::List { story: Some(story_id) } => {
            show_collection(&ctx.format, use_story_questions(cache, Some(story_id)), "questions", |q| {
                question_line(q.id, &q.question, &q.options)
            })
            .await
        }
        QuestionCommands::List { story: None } => {
            show_collection(&ctx.format, use_questions(cache), "questions", |q| {
                question_line(q.id, &q.question, &q.options)
            })
            .await
        }
        QuestionCommands::Show { id, story_question: true } => {
            show_entity(&ctx.format, use_story_question(cache, Some(id))).await
        }
        QuestionCommands::Show { id, story_question: false } => {
            show_entity(&ctx.format, use_question(cache, Some(id))).await
        }
        QuestionCommands::Create {
            question,
            options,
            answer,
            story: Some(story_id),
            ..
        } => {
            let created = ctx
                .client
                .create_story_question(&StoryQuestionInput {
                    story_id,
                    question,
                    options,
                    answer_index: answer,
                })
                .await?;
            output_record(&ctx.format, &created)
        }
        QuestionCommands::Create {
            question,
            options,
            answer,
            story: None,
            language,
        } => {
            let created = ctx
                .client
                .create_question(&QuestionInput {
                    question,
                    options,
                    answer_index: answer,
                    language_id: language,
                })
                .await?;
            output_record(&ctx.format, &created)
        }
        QuestionCommands::Delete { id, story_question } => {
            if story_question {
                ctx.client.delete_story_question(id).await?;
            } else {
                ctx.client.delete_question(id).await?;
            }
            output_success(&ctx.format, &format!("Deleted question {}", id), Some(json!({ "id": id })))
        }
    }
}
