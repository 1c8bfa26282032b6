use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use crate::database::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: Uuid,
    pub name: String,
    /// ISO 639-1 code, e.g. "en"
    pub code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInput {
    pub name: String,
    pub code: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Record for Language {
    const TABLE: &'static str = "languages";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl LanguageInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name);
        errors.require_text("code", &self.code);
        if self.code.len() > 8 {
            errors.add("code", "Language code is too long");
        }
        errors.into_result()
    }
}

impl Language {
    pub fn create(input: LanguageInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            code: input.code.trim().to_lowercase(),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: LanguageInput) {
        self.name = input.name.trim().to_string();
        self.code = input.code.trim().to_lowercase();
        self.is_active = input.is_active;
        self.updated_at = Utc::now();
    }
}
