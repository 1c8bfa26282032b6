mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::{Extension, Router};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use bible_stories_api::api::{HttpMethod::Get, RouteRegistry};
use bible_stories_api::auth::AuthError;
use bible_stories_api::database::Repository;
use bible_stories_api::error::ApiError;
use bible_stories_api::middleware::{PermissionDeclaration, Principal, PrincipalResolver, ResolveError};
use common::TestApp;

const PERMISSIONS_HEADER: &str = "x-test-permissions";

/// Grants whatever the request lists in a header and counts resolutions
#[derive(Default)]
struct HeaderResolver {
    calls: AtomicUsize,
}

impl HeaderResolver {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrincipalResolver for HeaderResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Principal, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let raw = headers
            .get(PERMISSIONS_HEADER)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::MalformedHeader)?;

        Ok(Principal {
            user_id: Uuid::nil(),
            email: "caller@example.com".to_string(),
            name: "Caller".to_string(),
            permissions: raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

async fn ok() -> &'static str {
    "ok"
}

async fn echo_permissions(Extension(principal): Extension<Principal>) -> String {
    principal.permissions.join(",")
}

async fn conflict() -> Result<&'static str, ApiError> {
    Err(ApiError::conflict("story already exists"))
}

fn gated_router(app: &TestApp, resolver: Arc<HeaderResolver>) -> Router {
    let (router, _) = RouteRegistry::new(resolver)
        .route(Get, "/undeclared", None, ok)
        .public(Get, "/public", ok)
        .route(
            Get,
            "/not-required",
            Some(PermissionDeclaration::from_parts(false, ["delete-story"])),
            ok,
        )
        .route(
            Get,
            "/empty",
            Some(PermissionDeclaration::from_parts(true, Vec::<String>::new())),
            ok,
        )
        .require(Get, "/any", &["edit-story", "delete-story"], echo_permissions)
        .require(Get, "/conflict", &["edit-story"], conflict)
        .into_parts();
    router.with_state(app.state.clone())
}

async fn call(router: &Router, path: &str, permissions: Option<&str>) -> Result<(StatusCode, String)> {
    let mut builder = Request::builder().uri(path);
    if let Some(permissions) = permissions {
        builder = builder.header(PERMISSIONS_HEADER, permissions);
    }
    let response = router.clone().oneshot(builder.body(Body::empty())?).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, String::from_utf8(bytes.to_vec())?))
}

#[tokio::test]
async fn open_routes_never_resolve_the_caller() -> Result<()> {
    let app = TestApp::new()?;
    let resolver = Arc::new(HeaderResolver::default());
    let router = gated_router(&app, resolver.clone());

    for path in ["/undeclared", "/public", "/not-required", "/empty"] {
        let (status, body) = call(&router, path, None).await?;
        assert_eq!(status, StatusCode::OK, "{} should be open", path);
        assert_eq!(body, "ok");
    }
    assert_eq!(resolver.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn any_overlapping_permission_runs_the_handler() -> Result<()> {
    let app = TestApp::new()?;
    let router = gated_router(&app, Arc::new(HeaderResolver::default()));

    let (status, body) = call(&router, "/any", Some("view-story,delete-story")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "view-story,delete-story");
    Ok(())
}

#[tokio::test]
async fn disjoint_permissions_are_rejected_with_invalid_access() -> Result<()> {
    let app = TestApp::new()?;
    let router = gated_router(&app, Arc::new(HeaderResolver::default()));

    for granted in ["view-story", ""] {
        let (status, body) = call(&router, "/any", Some(granted)).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let body: Value = serde_json::from_str(&body)?;
        assert_eq!(body["message"], "INVALID ACCESS");
        assert_eq!(body["code"], "FORBIDDEN");
    }
    Ok(())
}

#[tokio::test]
async fn failed_resolution_is_unauthorized() -> Result<()> {
    let app = TestApp::new()?;
    let router = gated_router(&app, Arc::new(HeaderResolver::default()));

    let (status, _) = call(&router, "/any", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn handler_errors_pass_through_unchanged() -> Result<()> {
    let app = TestApp::new()?;
    let router = gated_router(&app, Arc::new(HeaderResolver::default()));

    let (status, body) = call(&router, "/conflict", Some("edit-story")).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body)?;
    assert_eq!(body["message"], "story already exists");
    Ok(())
}

#[tokio::test]
async fn repeated_requests_get_the_same_decision() -> Result<()> {
    let app = TestApp::new()?;
    let router = gated_router(&app, Arc::new(HeaderResolver::default()));

    for _ in 0..3 {
        assert_eq!(call(&router, "/any", Some("edit-story")).await?.0, StatusCode::OK);
        assert_eq!(call(&router, "/any", Some("view-user")).await?.0, StatusCode::FORBIDDEN);
    }
    Ok(())
}

#[tokio::test]
async fn jwt_gate_on_the_real_router() -> Result<()> {
    let app = TestApp::new()?;
    let (_, viewer) = app.user_with("viewer@example.com", &["view-user"]).await?;
    let (_, editor) = app.user_with("editor@example.com", &["edit-story"]).await?;

    let (status, body) = app.get("/users", Some(&viewer)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = app.get("/users", Some(&editor)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "INVALID ACCESS");

    let (status, _) = app.get("/users", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/users", Some("not-a-jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn deactivated_users_lose_access_immediately() -> Result<()> {
    let app = TestApp::new()?;
    let (mut user, token) = app.user_with("jonah@example.com", &["view-profile"]).await?;

    let (status, body) = app.get("/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "jonah@example.com");

    user.is_active = false;
    app.state.stores.users.update(user).await?;

    let (status, _) = app.get("/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
