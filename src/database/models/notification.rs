use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use crate::database::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushNotification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// Subscriber topic the message is broadcast to
    pub topic: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationInput {
    pub title: String,
    pub body: String,
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_topic() -> String {
    "all".to_string()
}

impl Record for PushNotification {
    const TABLE: &'static str = "push_notifications";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl NotificationInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("title", &self.title);
        errors.require_text("body", &self.body);
        errors.require_text("topic", &self.topic);
        errors.into_result()
    }
}

impl PushNotification {
    pub fn create(input: NotificationInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            body: input.body,
            topic: input.topic.trim().to_string(),
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
