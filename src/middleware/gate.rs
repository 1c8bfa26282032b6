use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::PrincipalResolver;
use crate::error::ApiError;

/// Permissions a route requires, fixed when the route is registered.
///
/// A declaration with an empty permission list is normalized to "not
/// required": such a route is public and never resolves the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionDeclaration {
    required: bool,
    permissions: Vec<String>,
}

/// Outcome of checking a caller against a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Rejected,
}

impl PermissionDeclaration {
    pub fn public() -> Self {
        Self::default()
    }

    /// Require at least one of `permissions`.
    pub fn any_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_parts(true, permissions)
    }

    pub fn from_parts<I, S>(required: bool, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions: Vec<String> = permissions.into_iter().map(Into::into).collect();
        Self {
            required: required && !permissions.is_empty(),
            permissions,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Allowed when the declaration is not required, or when the granted
    /// set shares at least one permission with the required set.
    pub fn evaluate(&self, granted: &[String]) -> Decision {
        if !self.required || intersects(&self.permissions, granted) {
            Decision::Allowed
        } else {
            Decision::Rejected
        }
    }
}

fn intersects(required: &[String], granted: &[String]) -> bool {
    let granted: HashSet<&str> = granted.iter().map(String::as_str).collect();
    required.iter().any(|p| granted.contains(p.as_str()))
}

/// Per-route state for [`permission_gate`]
#[derive(Clone)]
pub struct RouteGate {
    declaration: Option<Arc<PermissionDeclaration>>,
    resolver: Arc<dyn PrincipalResolver>,
}

impl RouteGate {
    pub fn new(declaration: Option<PermissionDeclaration>, resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self {
            declaration: declaration.map(Arc::new),
            resolver,
        }
    }
}

/// Route middleware that checks the caller's permissions before the handler
/// runs. Undeclared and non-required routes pass straight through; handler
/// responses and errors are returned unchanged.
pub async fn permission_gate(
    State(gate): State<RouteGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let declaration = match gate.declaration.as_deref() {
        Some(declaration) if declaration.is_required() => declaration,
        _ => return Ok(next.run(request).await),
    };

    let principal = gate.resolver.resolve(request.headers()).await.map_err(|e| {
        tracing::warn!("Authentication failed for {}: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    match declaration.evaluate(&principal.permissions) {
        Decision::Allowed => {
            tracing::debug!("Permission gate allowed {} for user {}", request.uri().path(), principal.user_id);
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Decision::Rejected => {
            tracing::warn!(
                user_id = %principal.user_id,
                path = %request.uri().path(),
                required = ?declaration.permissions(),
                "Permission gate rejected request: no required permission granted"
            );
            Err(ApiError::invalid_access())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_not_required_always_allows() {
        let declaration = PermissionDeclaration::from_parts(false, ["delete-story"]);
        assert!(!declaration.is_required());
        assert_eq!(declaration.evaluate(&[]), Decision::Allowed);
        assert_eq!(declaration.evaluate(&perms(&["x"])), Decision::Allowed);
        assert_eq!(PermissionDeclaration::public().evaluate(&[]), Decision::Allowed);
    }

    #[test]
    fn test_overlap_allows() {
        let declaration = PermissionDeclaration::any_of(["edit-story"]);
        assert_eq!(declaration.evaluate(&perms(&["edit-story", "view-story"])), Decision::Allowed);

        let declaration = PermissionDeclaration::any_of(["edit-story", "delete-story"]);
        assert_eq!(declaration.evaluate(&perms(&["delete-story"])), Decision::Allowed);
    }

    #[test]
    fn test_disjoint_rejects() {
        let declaration = PermissionDeclaration::any_of(["delete-story"]);
        assert_eq!(declaration.evaluate(&perms(&["edit-story"])), Decision::Rejected);
        assert_eq!(declaration.evaluate(&[]), Decision::Rejected);

        let declaration = PermissionDeclaration::any_of(["a", "b"]);
        assert_eq!(declaration.evaluate(&perms(&["c", "d"])), Decision::Rejected);
    }

    #[test]
    fn test_empty_required_set_is_public() {
        let declaration = PermissionDeclaration::from_parts(true, Vec::<String>::new());
        assert!(!declaration.is_required());
        assert_eq!(declaration.evaluate(&perms(&["a"])), Decision::Allowed);
        assert_eq!(declaration.evaluate(&[]), Decision::Allowed);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let declaration = PermissionDeclaration::any_of(["view-user"]);
        let granted = perms(&["view-user"]);
        let first = declaration.evaluate(&granted);
        for _ in 0..3 {
            assert_eq!(declaration.evaluate(&granted), first);
        }
        assert_eq!(declaration.permissions(), &perms(&["view-user"])[..]);
    }
}
