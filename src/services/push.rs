use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::PushNotification;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Push provider rejected the message: {0}")]
    Rejected(String),

    #[error("Push provider unavailable: {0}")]
    Unavailable(String),
}

/// Delivers a stored notification to subscribed devices
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, notification: &PushNotification) -> Result<(), PushError>;
}

/// Records dispatches in the log instead of calling a provider.
#[derive(Debug, Default)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(&self, notification: &PushNotification) -> Result<(), PushError> {
        tracing::info!(
            notification_id = %notification.id,
            topic = %notification.topic,
            "Dispatching push notification: {}",
            notification.title
        );
        Ok(())
    }
}
