use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, JwtKeys};
use crate::database::models::User;
use crate::database::{DatabaseError, Repository};

/// Authenticated caller for the lifetime of one request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub permissions: Vec<String>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            permissions: user.permissions.clone(),
        }
    }
}

/// Resolves the caller of a request. Only consulted by the permission gate
/// when a route actually requires permissions.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Principal, ResolveError>;
}

/// Why a principal could not be produced
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Verifies the bearer JWT and loads the current account so that revoked
/// permissions and deactivated users take effect immediately.
pub struct JwtPrincipalResolver {
    keys: JwtKeys,
    users: Arc<dyn Repository<User>>,
}

impl JwtPrincipalResolver {
    pub fn new(keys: JwtKeys, users: Arc<dyn Repository<User>>) -> Self {
        Self { keys, users }
    }
}

#[async_trait]
impl PrincipalResolver for JwtPrincipalResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Principal, ResolveError> {
        let token = extract_bearer_token(headers)?;
        let claims = self.keys.verify(&token)?;

        let user = match self.users.get(claims.sub).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => return Err(AuthError::InactiveUser.into()),
            Err(e) => return Err(e.into()),
        };

        if !user.is_active {
            tracing::warn!("Rejected token for inactive user {}", user.id);
            return Err(AuthError::InactiveUser.into());
        }

        Ok(Principal::from(&user))
    }
}

/// Extract JWT token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MalformedHeader)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(AuthError::InvalidToken("empty token".to_string())),
        None => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::database::MemoryRepository;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer_token(&HeaderMap::new()), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer_token(&headers("Basic abc")), Err(AuthError::MalformedHeader));
        assert!(matches!(
            extract_bearer_token(&headers("Bearer  ")),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_resolver_loads_current_permissions() {
        let users = Arc::new(MemoryRepository::<User>::new());
        let keys = JwtKeys::new("secret", 1).unwrap();
        let mut user = User::create(
            "Deborah",
            "deborah@example.com",
            hash_password("password123").unwrap(),
            vec!["view-story".into()],
            true,
        );
        users.insert(user.clone()).await.unwrap();
        let token = keys.issue(&user).unwrap();

        let resolver = JwtPrincipalResolver::new(keys, users.clone());
        let principal = resolver.resolve(&headers(&format!("Bearer {}", token))).await.unwrap();
        assert_eq!(principal.permissions, vec!["view-story"]);

        // Deactivation applies to tokens already issued
        user.is_active = false;
        users.update(user).await.unwrap();
        let result = resolver.resolve(&headers(&format!("Bearer {}", token))).await;
        assert!(matches!(result, Err(ResolveError::Auth(AuthError::InactiveUser))));
    }
}
