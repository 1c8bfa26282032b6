use axum::{extract::DefaultBodyLimit, http::HeaderValue, Extension, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::registry::{HttpMethod::*, RouteRegistry};
use super::state::AppState;
use crate::auth::permissions::*;
use crate::config::SecurityConfig;
use crate::handlers::{auth, categories, comments, languages, notifications, questions, stories, system, users};

/// Build the complete application router
pub fn app(state: AppState) -> Router {
    let registry = RouteRegistry::new(state.resolver.clone());
    let registry = system_routes(registry);
    let registry = auth_routes(registry);
    let registry = user_routes(registry);
    let registry = language_routes(registry);
    let registry = category_routes(registry);
    let registry = story_routes(registry);
    let registry = question_routes(registry);
    let registry = comment_routes(registry);
    let registry = notification_routes(registry);

    let (router, endpoints) = registry.into_parts();
    tracing::debug!("Registered {} routes", endpoints.len());

    let mut router = router
        .layer(Extension(Arc::new(endpoints)))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));
    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn system_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .public(Get, "/", system::root)
        .public(Get, "/health", system::health)
        .public(Get, "/routes", system::routes)
}

fn auth_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .public(Post, "/auth/login", auth::login)
        .public(Post, "/auth/register", auth::register)
        .require(Get, "/auth/me", &[VIEW_PROFILE], auth::me)
}

fn user_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .require(Get, "/users", &[VIEW_USER], users::list)
        .require(Post, "/users", &[CREATE_USER], users::create)
        .require(Get, "/users/:id", &[VIEW_USER], users::show)
        .require(Put, "/users/:id", &[EDIT_USER], users::update)
        .require(Delete, "/users/:id", &[DELETE_USER], users::delete)
}

fn language_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .public(Get, "/fetch-languages", languages::list)
        .public(Get, "/fetch-languages/:id", languages::show)
        .require(Post, "/languages", &[CREATE_LANGUAGE], languages::create)
        .require(Put, "/languages/:id", &[EDIT_LANGUAGE], languages::update)
        .require(Delete, "/languages/:id", &[DELETE_LANGUAGE], languages::delete)
}

fn category_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .public(Get, "/categories", categories::list)
        .require(Post, "/categories", &[CREATE_CATEGORY], categories::create)
        .public(Get, "/categories/:id", categories::show)
        .require(Put, "/categories/:id", &[EDIT_CATEGORY], categories::update)
        .require(Delete, "/categories/:id", &[DELETE_CATEGORY], categories::delete)
}

fn story_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .public(Get, "/story-list", stories::list)
        .require(Get, "/story-by-id-admin/:id", &[VIEW_STORY], stories::show_admin)
        .require(Post, "/stories", &[CREATE_STORY], stories::create)
        .require(Put, "/stories/:id", &[EDIT_STORY], stories::update)
        .require(Delete, "/stories/:id", &[DELETE_STORY], stories::delete)
}

fn question_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .public(Get, "/story-question-list/:story_id", questions::list_for_story)
        .require(Get, "/story-question-by-id-admin/:id", &[VIEW_QUESTION], questions::show_story_question)
        .require(Post, "/story-questions", &[CREATE_QUESTION], questions::create_story_question)
        .require(Put, "/story-questions/:id", &[EDIT_QUESTION], questions::update_story_question)
        .require(Delete, "/story-questions/:id", &[DELETE_QUESTION], questions::delete_story_question)
        .public(Get, "/question-list", questions::list)
        .require(Get, "/question-by-id-admin/:id", &[VIEW_QUESTION], questions::show)
        .require(Post, "/questions", &[CREATE_QUESTION], questions::create)
        .require(Put, "/questions/:id", &[EDIT_QUESTION], questions::update)
        .require(Delete, "/questions/:id", &[DELETE_QUESTION], questions::delete)
}

fn comment_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .public(Get, "/comments/:story_id", comments::list_for_story)
        .public(Get, "/comment-replies/:comment_id", comments::replies)
        .require(Post, "/comments", &[CREATE_COMMENT], comments::create)
        .require(Delete, "/comment/:id", &[DELETE_COMMENT], comments::delete)
}

fn notification_routes(registry: RouteRegistry) -> RouteRegistry {
    registry
        .require(Get, "/notifications", &[VIEW_NOTIFICATION], notifications::list)
        .require(Post, "/notifications", &[SEND_NOTIFICATION], notifications::create)
        .require(Delete, "/notifications/:id", &[DELETE_NOTIFICATION], notifications::delete)
}
