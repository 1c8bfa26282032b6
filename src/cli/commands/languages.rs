use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_record, output_success, show_collection, show_entity};
use crate::cli::CliContext;
use crate::client::hooks::{use_language, use_languages};
use crate::database::models::LanguageInput;

#[derive(Subcommand)]
pub enum LanguageCommands {
    #[command(about = "List languages")]
    List,

    #[command(about = "Show one language")]
    Show { id: Uuid },

    #[command(about = "Create a language")]
    Create {
        name: String,
        #[arg(help = "ISO 639-1 code, e.g. en")]
        code: String,
        #[arg(long)]
        inactive: bool,
    },

    #[command(about = "Delete an unused language")]
    Delete { id: Uuid },
}

pub async fn handle(cmd: LanguageCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let cache = ctx.client.cache();
    match cmd {
        LanguageCommands::List => {
            show_collection(&ctx.format, use_languages(cache), "languages", |language| {
                let status = if language.is_active { "" } else { " (inactive)" };
                format!("{}  {:<4} {}{}", language.id, language.code, language.name, status)
            })
            .await
        }
        LanguageCommands::Show { id } => show_entity(&ctx.format, use_language(cache, Some(id))).await,
        LanguageCommands::Create { name, code, inactive } => {
            let language = ctx
                .client
                .create_language(&LanguageInput {
                    name,
                    code,
                    is_active: !inactive,
                })
                .await?;
            output_record(&ctx.format, &language)
        }
        LanguageCommands::Delete { id } => {
            let language = ctx.client.delete_language(id).await?;
            output_success(
                &ctx.format,
                &format!("Deleted language {}", language.name),
                Some(json!({ "id": language.id })),
            )
        }
    }
}
