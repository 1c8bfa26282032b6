use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::cache::{EntrySnapshot, ResourceCache};
use super::keys::{self, ResourceKey};
use super::transport::{Fetcher, HttpTransport, TransportError};
use crate::database::models::{
    Category, CategoryInput, Comment, CommentInput, Language, LanguageInput, LoginRequest, NotificationInput,
    PushNotification, Question, QuestionInput, Story, StoryInput, StoryQuestion, StoryQuestionInput, UserInput,
    UserUpdate, UserView,
};
use crate::handlers::auth::TokenResponse;
use crate::middleware::Principal;

/// What a write changes, and therefore which cached reads go stale.
enum Affected {
    Key(ResourceKey),
    Path(String),
    /// Cached lists picked by the filter that currently hold record `id`.
    Holding(fn(&ResourceKey) -> bool, Uuid),
}

/// Admin dashboard client: reads go through the shared [`ResourceCache`],
/// writes go straight to the API and then invalidate what they touched.
#[derive(Clone)]
pub struct AdminClient {
    transport: Arc<HttpTransport>,
    cache: ResourceCache,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(base_url)?.with_token(token));
        Ok(Self::from_transport(transport))
    }

    pub fn from_transport(transport: Arc<HttpTransport>) -> Self {
        let fetcher: Arc<dyn Fetcher> = transport.clone();
        Self {
            cache: ResourceCache::new(fetcher),
            transport,
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    fn invalidate(&self, affected: &[Affected]) {
        for item in affected {
            match item {
                Affected::Key(key) => {
                    self.cache.invalidate(key);
                }
                Affected::Path(path) => {
                    self.cache.invalidate_path(path);
                }
                Affected::Holding(is_list, id) => {
                    self.cache
                        .invalidate_where(|key, snapshot| is_list(key) && holds_record(snapshot, *id));
                }
            }
        }
    }

    async fn create<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        affected: impl FnOnce(&T) -> Vec<Affected>,
    ) -> Result<T, TransportError> {
        let created: T = self.transport.post(path, body).await?;
        self.invalidate(&affected(&created));
        Ok(created)
    }

    async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        affected: impl FnOnce(&T) -> Vec<Affected>,
    ) -> Result<T, TransportError> {
        let updated: T = self.transport.put(path, body).await?;
        self.invalidate(&affected(&updated));
        Ok(updated)
    }

    async fn remove<T: DeserializeOwned>(
        &self,
        path: &str,
        affected: impl FnOnce(&T) -> Vec<Affected>,
    ) -> Result<T, TransportError> {
        let deleted: T = self.transport.delete(path).await?;
        self.invalidate(&affected(&deleted));
        Ok(deleted)
    }

    // Session

    /// Exchange credentials for a token and use it for every later request.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, TransportError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: TokenResponse = self.transport.post("/auth/login", &request).await?;
        self.transport.set_token(Some(response.token.clone()));
        Ok(response)
    }

    pub async fn whoami(&self) -> Result<Principal, TransportError> {
        self.transport.get("/auth/me").await
    }

    // Users

    pub async fn create_user(&self, input: &UserInput) -> Result<UserView, TransportError> {
        self.create("/users", input, |_: &UserView| vec![Affected::Key(keys::users())])
            .await
    }

    pub async fn update_user(&self, id: Uuid, input: &UserUpdate) -> Result<UserView, TransportError> {
        self.update(&format!("/users/{}", id), input, |user: &UserView| {
            user_keys(user.id)
        })
        .await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<UserView, TransportError> {
        self.remove(&format!("/users/{}", id), |user: &UserView| user_keys(user.id))
            .await
    }

    // Languages

    pub async fn create_language(&self, input: &LanguageInput) -> Result<Language, TransportError> {
        self.create("/languages", input, |_: &Language| vec![Affected::Key(keys::languages())])
            .await
    }

    pub async fn update_language(&self, id: Uuid, input: &LanguageInput) -> Result<Language, TransportError> {
        self.update(&format!("/languages/{}", id), input, |language: &Language| {
            language_keys(language.id)
        })
        .await
    }

    pub async fn delete_language(&self, id: Uuid) -> Result<Language, TransportError> {
        self.remove(&format!("/languages/{}", id), |language: &Language| {
            language_keys(language.id)
        })
        .await
    }

    // Categories

    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, TransportError> {
        self.create("/categories", input, |_: &Category| {
            vec![Affected::Key(keys::categories())]
        })
        .await
    }

    pub async fn update_category(&self, id: Uuid, input: &CategoryInput) -> Result<Category, TransportError> {
        self.update(&format!("/categories/{}", id), input, |category: &Category| {
            category_keys(category.id)
        })
        .await
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<Category, TransportError> {
        self.remove(&format!("/categories/{}", id), |category: &Category| {
            category_keys(category.id)
        })
        .await
    }

    // Stories

    pub async fn create_story(&self, input: &StoryInput) -> Result<Story, TransportError> {
        self.create("/stories", input, |_: &Story| {
            vec![Affected::Path(keys::stories().path().to_string())]
        })
        .await
    }

    pub async fn update_story(&self, id: Uuid, input: &StoryInput) -> Result<Story, TransportError> {
        self.update(&format!("/stories/{}", id), input, |story: &Story| story_keys(story.id))
            .await
    }

    /// Deleting a story also removes its questions and comments.
    pub async fn delete_story(&self, id: Uuid) -> Result<Story, TransportError> {
        self.remove(&format!("/stories/{}", id), |story: &Story| {
            let mut affected = story_keys(story.id);
            affected.extend(keys::story_questions(Some(story.id)).map(Affected::Key));
            affected.push(Affected::Path(keys::comments_path(story.id)));
            affected
        })
        .await
    }

    // Story questions

    pub async fn create_story_question(&self, input: &StoryQuestionInput) -> Result<StoryQuestion, TransportError> {
        self.create("/story-questions", input, |question: &StoryQuestion| {
            keys::story_questions(Some(question.story_id))
                .map(Affected::Key)
                .into_iter()
                .collect()
        })
        .await
    }

    /// The question may move to another story; the list it left is
    /// refreshed too when it is cached.
    pub async fn update_story_question(
        &self,
        id: Uuid,
        input: &StoryQuestionInput,
    ) -> Result<StoryQuestion, TransportError> {
        self.update(&format!("/story-questions/{}", id), input, |question: &StoryQuestion| {
            let mut affected = story_question_keys(question);
            affected.push(Affected::Holding(keys::is_story_questions, question.id));
            affected
        })
        .await
    }

    pub async fn delete_story_question(&self, id: Uuid) -> Result<StoryQuestion, TransportError> {
        self.remove(&format!("/story-questions/{}", id), story_question_keys)
            .await
    }

    // General questions

    pub async fn create_question(&self, input: &QuestionInput) -> Result<Question, TransportError> {
        self.create("/questions", input, |_: &Question| {
            vec![Affected::Path(keys::questions().path().to_string())]
        })
        .await
    }

    pub async fn update_question(&self, id: Uuid, input: &QuestionInput) -> Result<Question, TransportError> {
        self.update(&format!("/questions/{}", id), input, |question: &Question| {
            question_keys(question.id)
        })
        .await
    }

    pub async fn delete_question(&self, id: Uuid) -> Result<Question, TransportError> {
        self.remove(&format!("/questions/{}", id), |question: &Question| {
            question_keys(question.id)
        })
        .await
    }

    // Comments

    pub async fn create_comment(&self, input: &CommentInput) -> Result<Comment, TransportError> {
        self.create("/comments", input, comment_keys).await
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<Comment, TransportError> {
        self.remove(&format!("/comment/{}", id), |comment: &Comment| {
            let mut affected = comment_keys(comment);
            affected.push(Affected::Path(keys::comment_replies_path(comment.id)));
            affected
        })
        .await
    }

    // Notifications

    pub async fn send_notification(&self, input: &NotificationInput) -> Result<PushNotification, TransportError> {
        self.create("/notifications", input, |_: &PushNotification| {
            vec![Affected::Key(keys::notifications())]
        })
        .await
    }

    pub async fn delete_notification(&self, id: Uuid) -> Result<PushNotification, TransportError> {
        self.remove(&format!("/notifications/{}", id), |_: &PushNotification| {
            vec![Affected::Key(keys::notifications())]
        })
        .await
    }
}

fn with_entity(list: ResourceKey, entity: Option<ResourceKey>) -> Vec<Affected> {
    let mut affected = vec![Affected::Key(list)];
    affected.extend(entity.map(Affected::Key));
    affected
}

fn user_keys(id: Uuid) -> Vec<Affected> {
    with_entity(keys::users(), keys::user(Some(id)))
}

fn language_keys(id: Uuid) -> Vec<Affected> {
    with_entity(keys::languages(), keys::language(Some(id)))
}

fn category_keys(id: Uuid) -> Vec<Affected> {
    with_entity(keys::categories(), keys::category(Some(id)))
}

fn story_keys(id: Uuid) -> Vec<Affected> {
    let mut affected = vec![Affected::Path(keys::stories().path().to_string())];
    affected.extend(keys::story(Some(id)).map(Affected::Key));
    affected
}

fn story_question_keys(question: &StoryQuestion) -> Vec<Affected> {
    let mut affected: Vec<Affected> = keys::story_questions(Some(question.story_id))
        .map(Affected::Key)
        .into_iter()
        .collect();
    affected.extend(keys::story_question(Some(question.id)).map(Affected::Key));
    affected
}

fn holds_record(snapshot: &EntrySnapshot, id: Uuid) -> bool {
    let id = serde_json::json!(id);
    snapshot
        .data
        .as_ref()
        .and_then(|data| data.as_array())
        .is_some_and(|records| records.iter().any(|record| record.get("id") == Some(&id)))
}

fn question_keys(id: Uuid) -> Vec<Affected> {
    let mut affected = vec![Affected::Path(keys::questions().path().to_string())];
    affected.extend(keys::question(Some(id)).map(Affected::Key));
    affected
}

/// Every page of the list the comment appears in.
fn comment_keys(comment: &Comment) -> Vec<Affected> {
    match comment.parent_id {
        Some(parent_id) => vec![Affected::Path(keys::comment_replies_path(parent_id))],
        None => vec![Affected::Path(keys::comments_path(comment.story_id))],
    }
}
