use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use crate::database::record::Record;

/// Reader comment on a story. Replies carry the id of the comment they
/// answer in `parent_id`; top-level comments have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentInput {
    pub story_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
}

impl Record for Comment {
    const TABLE: &'static str = "comments";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl CommentInput {
    pub const MAX_BODY_LEN: usize = 2000;

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("body", &self.body);
        if self.body.chars().count() > Self::MAX_BODY_LEN {
            errors.add("body", format!("Comment exceeds {} characters", Self::MAX_BODY_LEN));
        }
        errors.into_result()
    }
}

impl Comment {
    pub fn create(input: CommentInput, user_id: Uuid, author_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            story_id: input.story_id,
            user_id,
            author_name,
            parent_id: input.parent_id,
            body: input.body.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
