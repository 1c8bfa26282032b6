use thiserror::Error;

use crate::auth::password::hash_password;
use crate::auth::{permissions, AuthError};
use crate::config::BootstrapConfig;
use crate::database::models::{user::normalize_email, User};
use crate::database::{DatabaseError, ListQuery};
use crate::services::Stores;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create the configured admin account with every permission unless a
/// user with that email already exists. Returns the created user.
pub async fn ensure_admin(stores: &Stores, config: &BootstrapConfig) -> Result<Option<User>, BootstrapError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(None);
    };

    let email = normalize_email(email);
    let existing = stores
        .users
        .find_one(&ListQuery::new().filter("email", email.clone()))
        .await?;
    if existing.is_some() {
        tracing::debug!("Bootstrap admin {} already exists", email);
        return Ok(None);
    }

    let admin = User::create(
        "Administrator",
        &email,
        hash_password(password)?,
        permissions::owned(permissions::ALL),
        true,
    );
    let admin = stores.users.insert(admin).await?;
    tracing::info!("Created bootstrap admin account {}", admin.email);
    Ok(Some(admin))
}
