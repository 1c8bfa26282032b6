use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{validate_choices, FieldErrors};
use crate::database::record::Record;

/// Multiple-choice question attached to a single story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryQuestion {
    pub id: Uuid,
    pub story_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryQuestionInput {
    pub story_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

/// General quiz question, not tied to a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    pub language_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionInput {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    pub language_id: Option<Uuid>,
}

impl Record for StoryQuestion {
    const TABLE: &'static str = "story_questions";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Question {
    const TABLE: &'static str = "questions";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl StoryQuestionInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("question", &self.question);
        validate_choices(&mut errors, &self.options, self.answer_index);
        errors.into_result()
    }
}

impl QuestionInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("question", &self.question);
        validate_choices(&mut errors, &self.options, self.answer_index);
        errors.into_result()
    }
}

impl StoryQuestion {
    pub fn create(input: StoryQuestionInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            story_id: input.story_id,
            question: input.question.trim().to_string(),
            options: input.options,
            answer_index: input.answer_index,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: StoryQuestionInput) {
        self.story_id = input.story_id;
        self.question = input.question.trim().to_string();
        self.options = input.options;
        self.answer_index = input.answer_index;
        self.updated_at = Utc::now();
    }
}

impl Question {
    pub fn create(input: QuestionInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            question: input.question.trim().to_string(),
            options: input.options,
            answer_index: input.answer_index,
            language_id: input.language_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: QuestionInput) {
        self.question = input.question.trim().to_string();
        self.options = input.options;
        self.answer_index = input.answer_index;
        self.language_id = input.language_id;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(options: &[&str], answer_index: usize) -> QuestionInput {
        QuestionInput {
            question: "Who built the ark?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            answer_index,
            language_id: None,
        }
    }

    #[test]
    fn test_answer_must_point_at_an_option() {
        assert!(input(&["Noah", "Moses"], 0).validate().is_ok());
        let errors = input(&["Noah", "Moses"], 2).validate().unwrap_err().into_inner();
        assert!(errors.contains_key("answer_index"));
    }

    #[test]
    fn test_needs_two_options() {
        let errors = input(&["Noah"], 0).validate().unwrap_err().into_inner();
        assert!(errors.contains_key("options"));
    }
}
