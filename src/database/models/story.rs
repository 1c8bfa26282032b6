use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use crate::database::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub category_id: Uuid,
    pub language_id: Uuid,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub is_published: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryInput {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub category_id: Uuid,
    pub language_id: Uuid,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl Record for Story {
    const TABLE: &'static str = "stories";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl StoryInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("title", &self.title);
        errors.require_text("body", &self.body);
        if self.sort_order < 0 {
            errors.add("sort_order", "Sort order must not be negative");
        }
        errors.into_result()
    }
}

impl Story {
    pub fn create(input: StoryInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            summary: input.summary,
            body: input.body,
            category_id: input.category_id,
            language_id: input.language_id,
            image_url: input.image_url,
            audio_url: input.audio_url,
            is_published: input.is_published,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: StoryInput) {
        self.title = input.title.trim().to_string();
        self.summary = input.summary;
        self.body = input.body;
        self.category_id = input.category_id;
        self.language_id = input.language_id;
        self.image_url = input.image_url;
        self.audio_url = input.audio_url;
        self.is_published = input.is_published;
        self.sort_order = input.sort_order;
        self.updated_at = Utc::now();
    }
}
