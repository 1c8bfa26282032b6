pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::AdminClient;

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "bsc")]
#[command(about = "Bible Stories CLI - admin dashboard for the Bible Stories API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Output in YAML format")]
    pub yaml: bool,

    #[arg(long, global = true, env = "BSC_SERVER", help = "API base URL (defaults to the saved session)")]
    pub server: Option<String>,

    #[arg(long, global = true, env = "BSC_TOKEN", hide_env_values = true, help = "Bearer token (defaults to the saved session)")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, logout and session information")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Manage user accounts")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Manage languages")]
    Languages {
        #[command(subcommand)]
        cmd: commands::languages::LanguageCommands,
    },

    #[command(about = "Manage categories")]
    Categories {
        #[command(subcommand)]
        cmd: commands::categories::CategoryCommands,
    },

    #[command(about = "Manage stories")]
    Stories {
        #[command(subcommand)]
        cmd: commands::stories::StoryCommands,
    },

    #[command(about = "Manage story questions and general questions")]
    Questions {
        #[command(subcommand)]
        cmd: commands::questions::QuestionCommands,
    },

    #[command(about = "Read and moderate story comments")]
    Comments {
        #[command(subcommand)]
        cmd: commands::comments::CommentCommands,
    },

    #[command(about = "Send and review push notifications")]
    Notifications {
        #[command(subcommand)]
        cmd: commands::notifications::NotificationCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else if cli.yaml {
            OutputFormat::Yaml
        } else {
            OutputFormat::Text
        }
    }
}

/// Everything a command needs: the API client and how to print results.
pub struct CliContext {
    pub client: AdminClient,
    pub format: OutputFormat,
    pub server: String,
}

impl CliContext {
    /// Flags and environment win over the saved session.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let session = config::load_session()?;
        let server = cli
            .server
            .clone()
            .or_else(|| session.server.clone())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let token = cli.token.clone().or(session.token);

        Ok(Self {
            client: AdminClient::new(server.clone(), token)?,
            format: OutputFormat::from_cli(cli),
            server,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext::from_cli(&cli)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &ctx).await,
        Commands::Languages { cmd } => commands::languages::handle(cmd, &ctx).await,
        Commands::Categories { cmd } => commands::categories::handle(cmd, &ctx).await,
        Commands::Stories { cmd } => commands::stories::handle(cmd, &ctx).await,
        Commands::Questions { cmd } => commands::questions::handle(cmd, &ctx).await,
        Commands::Comments { cmd } => commands::comments::handle(cmd, &ctx).await,
        Commands::Notifications { cmd } => commands::notifications::handle(cmd, &ctx).await,
    }
}
