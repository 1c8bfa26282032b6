#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use bible_stories_api::api::{app, AppState};
use bible_stories_api::auth::password::hash_password;
use bible_stories_api::config::AppConfig;
use bible_stories_api::database::models::{
    Category, CategoryInput, Language, LanguageInput, Story, StoryInput, User,
};
use bible_stories_api::services::Stores;

pub const PASSWORD: &str = "correct-horse-battery";

/// In-process application over in-memory storage
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        config.security.enable_cors = false;

        let state = AppState::new(config, Stores::memory()).context("failed to build app state")?;
        let router = app(state.clone());
        Ok(Self { state, router })
    }

    /// Insert an active user holding `permissions` and return it with a token
    pub async fn user_with(&self, email: &str, permissions: &[&str]) -> Result<(User, String)> {
        let user = User::create(
            "Test User",
            email,
            hash_password(PASSWORD)?,
            permissions.iter().map(|p| p.to_string()).collect(),
            true,
        );
        let user = self.state.stores.users.insert(user).await?;
        let token = self.state.keys.issue(&user)?;
        Ok((user, token))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, token, None).await
    }

    /// Serve the router on a free local port and return its base URL
    pub async fn spawn(&self) -> Result<String> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let router = self.router.clone();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(format!("http://127.0.0.1:{}", port))
    }

    pub async fn seed_language(&self, code: &str) -> Result<Language> {
        let language = Language::create(LanguageInput {
            name: format!("Language {}", code),
            code: code.to_string(),
            is_active: true,
        });
        Ok(self.state.stores.languages.insert(language).await?)
    }

    pub async fn seed_category(&self, language_id: Uuid) -> Result<Category> {
        let category = Category::create(CategoryInput {
            name: "Old Testament".to_string(),
            description: None,
            language_id,
            image_url: None,
            is_active: true,
        });
        Ok(self.state.stores.categories.insert(category).await?)
    }

    pub async fn seed_story(&self, title: &str) -> Result<Story> {
        let language = match self.state.stores.languages.list(&Default::default()).await?.into_iter().next() {
            Some(language) => language,
            None => self.seed_language("en").await?,
        };
        let category = self.seed_category(language.id).await?;
        let story = Story::create(story_input(title, category.id, language.id));
        Ok(self.state.stores.stories.insert(story).await?)
    }
}

pub fn story_input(title: &str, category_id: Uuid, language_id: Uuid) -> StoryInput {
    StoryInput {
        title: title.to_string(),
        summary: None,
        body: format!("The story of {}", title),
        category_id,
        language_id,
        image_url: None,
        audio_url: None,
        is_published: true,
        sort_order: 0,
    }
}
