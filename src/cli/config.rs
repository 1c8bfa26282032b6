use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Saved login: which server the CLI talks to and the token it holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliSession {
    pub server: Option<String>,
    pub token: Option<String>,
    pub email: Option<String>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl CliSession {
    pub fn new(server: String, token: String, email: String) -> Self {
        Self {
            server: Some(server),
            token: Some(token),
            email: Some(email),
            logged_in_at: Some(Utc::now()),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("BSC_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("bible-stories").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn session_file() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("session.json"))
}

pub fn load_session() -> anyhow::Result<CliSession> {
    let file = session_file()?;

    if !file.exists() {
        return Ok(CliSession::default());
    }

    let content = fs::read_to_string(file)?;
    let session: CliSession = serde_json::from_str(&content)?;
    Ok(session)
}

pub fn save_session(session: &CliSession) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_file()?, content)?;
    Ok(())
}

/// Forget the token but keep the server for the next login.
pub fn clear_session() -> anyhow::Result<()> {
    let session = load_session()?;
    save_session(&CliSession {
        server: session.server,
        ..CliSession::default()
    })
}
