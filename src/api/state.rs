use std::sync::Arc;

use crate::auth::{AuthError, JwtKeys};
use crate::config::AppConfig;
use crate::middleware::{JwtPrincipalResolver, PrincipalResolver};
use crate::services::{LogPushSender, PushSender, Stores};

/// Shared, read-only application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: Stores,
    pub keys: JwtKeys,
    pub resolver: Arc<dyn PrincipalResolver>,
    pub push: Arc<dyn PushSender>,
}

impl AppState {
    /// Build state with the JWT resolver and the logging push sender
    pub fn new(config: AppConfig, stores: Stores) -> Result<Self, AuthError> {
        let keys = JwtKeys::from_config(&config.security)?;
        let resolver = Arc::new(JwtPrincipalResolver::new(keys.clone(), stores.users.clone()));
        Ok(Self {
            config: Arc::new(config),
            stores,
            keys,
            resolver,
            push: Arc::new(LogPushSender),
        })
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PrincipalResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_push(mut self, push: Arc<dyn PushSender>) -> Self {
        self.push = push;
        self
    }
}
