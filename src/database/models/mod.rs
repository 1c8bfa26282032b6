pub mod category;
pub mod comment;
pub mod language;
pub mod notification;
pub mod question;
pub mod story;
pub mod user;

use std::collections::HashMap;

pub use category::{Category, CategoryInput};
pub use comment::{Comment, CommentInput};
pub use language::{Language, LanguageInput};
pub use notification::{NotificationInput, PushNotification};
pub use question::{Question, QuestionInput, StoryQuestion, StoryQuestionInput};
pub use story::{Story, StoryInput};
pub use user::{LoginRequest, RegisterRequest, User, UserInput, UserUpdate, UserView};

/// Per-field validation messages collected from an input payload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    /// Record an error when `value` is blank.
    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

/// Options/answer pair shared by story questions and general questions.
pub(crate) fn validate_choices(errors: &mut FieldErrors, options: &[String], answer_index: usize) {
    if options.len() < 2 {
        errors.add("options", "At least two options are required");
    } else if options.iter().any(|o| o.trim().is_empty()) {
        errors.add("options", "Options must not be blank");
    }
    if answer_index >= options.len() {
        errors.add("answer_index", "Answer index is out of range");
    }
}
