use std::sync::Arc;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::database::models::{
    Category, Comment, Language, PushNotification, Question, Story, StoryQuestion, User,
};
use crate::database::{
    DatabaseError, DatabaseManager, MemoryRepository, PgRepository, Record, Repository,
};

/// One repository per record type, shared by every handler
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn Repository<User>>,
    pub languages: Arc<dyn Repository<Language>>,
    pub categories: Arc<dyn Repository<Category>>,
    pub stories: Arc<dyn Repository<Story>>,
    pub story_questions: Arc<dyn Repository<StoryQuestion>>,
    pub questions: Arc<dyn Repository<Question>>,
    pub comments: Arc<dyn Repository<Comment>>,
    pub notifications: Arc<dyn Repository<PushNotification>>,
    database: Option<DatabaseManager>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryRepository::new()),
            languages: Arc::new(MemoryRepository::new()),
            categories: Arc::new(MemoryRepository::new()),
            stories: Arc::new(MemoryRepository::new()),
            story_questions: Arc::new(MemoryRepository::new()),
            questions: Arc::new(MemoryRepository::new()),
            comments: Arc::new(MemoryRepository::new()),
            notifications: Arc::new(MemoryRepository::new()),
            database: None,
        }
    }

    /// Connect and create any missing document tables
    pub async fn postgres(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let manager = DatabaseManager::connect(config).await?;
        for table in [
            User::TABLE,
            Language::TABLE,
            Category::TABLE,
            Story::TABLE,
            StoryQuestion::TABLE,
            Question::TABLE,
            Comment::TABLE,
            PushNotification::TABLE,
        ] {
            manager.ensure_table(table).await?;
        }

        let pool = manager.pool().clone();
        Ok(Self {
            users: Arc::new(PgRepository::new(pool.clone())),
            languages: Arc::new(PgRepository::new(pool.clone())),
            categories: Arc::new(PgRepository::new(pool.clone())),
            stories: Arc::new(PgRepository::new(pool.clone())),
            story_questions: Arc::new(PgRepository::new(pool.clone())),
            questions: Arc::new(PgRepository::new(pool.clone())),
            comments: Arc::new(PgRepository::new(pool.clone())),
            notifications: Arc::new(PgRepository::new(pool)),
            database: Some(manager),
        })
    }

    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config.backend {
            StorageBackend::Memory => Ok(Self::memory()),
            StorageBackend::Postgres => Self::postgres(config).await,
        }
    }

    pub fn backend(&self) -> StorageBackend {
        if self.database.is_some() {
            StorageBackend::Postgres
        } else {
            StorageBackend::Memory
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.database {
            Some(manager) => manager.health_check().await,
            None => Ok(()),
        }
    }
}
