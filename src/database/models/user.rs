use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FieldErrors;
use crate::database::record::Record;

/// Stored user account. The password hash is persisted with the record but
/// never leaves the API; responses use [`UserView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub permissions: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin-side account creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Admin-side account update; a missing password keeps the current one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub permissions: Vec<String>,
    pub is_active: bool,
}

/// Public self-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn default_true() -> bool {
    true
}

pub const MIN_PASSWORD_LEN: usize = 8;

fn validate_account(errors: &mut FieldErrors, name: &str, email: &str) {
    errors.require_text("name", name);
    if !email.contains('@') || email.trim().len() < 3 {
        errors.add("email", "A valid email address is required");
    }
}

fn validate_password(errors: &mut FieldErrors, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
    }
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Record for User {
    const TABLE: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl UserInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        validate_account(&mut errors, &self.name, &self.email);
        validate_password(&mut errors, &self.password);
        errors.into_result()
    }
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        validate_account(&mut errors, &self.name, &self.email);
        if let Some(password) = &self.password {
            validate_password(&mut errors, password);
        }
        errors.into_result()
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        validate_account(&mut errors, &self.name, &self.email);
        validate_password(&mut errors, &self.password);
        errors.into_result()
    }
}

impl User {
    pub fn create(
        name: &str,
        email: &str,
        password_hash: String,
        permissions: Vec<String>,
        is_active: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            permissions: dedup_permissions(permissions),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update. `password_hash` is the already-hashed replacement,
    /// if the update carried a new password.
    pub fn apply(&mut self, update: UserUpdate, password_hash: Option<String>) {
        self.name = update.name.trim().to_string();
        self.email = normalize_email(&update.email);
        self.permissions = dedup_permissions(update.permissions);
        self.is_active = update.is_active;
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        self.updated_at = Utc::now();
    }

    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

fn dedup_permissions(mut permissions: Vec<String>) -> Vec<String> {
    permissions.iter_mut().for_each(|p| *p = p.trim().to_string());
    permissions.retain(|p| !p.is_empty());
    permissions.sort();
    permissions.dedup();
    permissions
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            permissions: user.permissions.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
