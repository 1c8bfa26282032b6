//! Typed views over cache entries, one per API resource.
//!
//! A hook decodes its entry's JSON into domain records and memoizes the
//! result against the entry version, so repeated `state()` calls between
//! transitions hand back the same `Arc`.

use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::cache::{EntrySnapshot, ResourceCache, ResourceHandle};
use super::keys::{self, ResourceKey};
use super::transport::TransportError;
use crate::database::models::{Category, Comment, Language, PushNotification, Question, Story, StoryQuestion, UserView};
use crate::types::Page;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<T> {
    pub data: Vec<T>,
    pub is_loading: bool,
    pub is_validating: bool,
    pub error: Option<TransportError>,
    /// Loaded and holds no records.
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_validating: bool,
    pub error: Option<TransportError>,
}

/// Turns a raw snapshot into a hook's derived state.
trait Derive: Sized {
    fn derive(snapshot: &EntrySnapshot) -> Self;
}

fn decode<T: DeserializeOwned>(snapshot: &EntrySnapshot) -> (Option<T>, Option<TransportError>) {
    let decoded = snapshot
        .data
        .as_ref()
        .map(|value| serde_json::from_value::<T>(value.clone()).map_err(|e| TransportError::Decode(e.to_string())))
        .transpose();

    match decoded {
        Ok(data) => (data, snapshot.error.clone()),
        // A fetch error describes the latest attempt and takes precedence
        Err(decode_error) => (None, snapshot.error.clone().or(Some(decode_error))),
    }
}

impl<T: DeserializeOwned> Derive for CollectionState<T> {
    fn derive(snapshot: &EntrySnapshot) -> Self {
        let (data, error) = decode::<Vec<T>>(snapshot);
        let data = data.unwrap_or_default();
        Self {
            is_empty: !snapshot.is_loading && data.is_empty(),
            data,
            is_loading: snapshot.is_loading,
            is_validating: snapshot.is_validating,
            error,
        }
    }
}

impl<T: DeserializeOwned> Derive for EntityState<T> {
    fn derive(snapshot: &EntrySnapshot) -> Self {
        let (data, error) = decode::<T>(snapshot);
        Self {
            data,
            is_loading: snapshot.is_loading,
            is_validating: snapshot.is_validating,
            error,
        }
    }
}

/// Shared machinery of [`CollectionHook`] and [`EntityHook`].
struct Hook<S> {
    handle: ResourceHandle,
    memo: Mutex<Option<(u64, Arc<S>)>>,
}

impl<S: Derive> Hook<S> {
    fn new(cache: &ResourceCache, key: Option<ResourceKey>) -> Self {
        Self {
            handle: cache.use_resource(key),
            memo: Mutex::new(None),
        }
    }

    fn state(&self) -> Arc<S> {
        let snapshot = self.handle.snapshot();
        let mut memo = self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((version, state)) = memo.as_ref() {
            if *version == snapshot.version {
                return state.clone();
            }
        }

        let state = Arc::new(S::derive(&snapshot));
        *memo = Some((snapshot.version, state.clone()));
        state
    }
}

macro_rules! hook_type {
    ($(#[$meta:meta])* $name:ident, $state:ident) => {
        $(#[$meta])*
        pub struct $name<T> {
            hook: Hook<$state<T>>,
        }

        impl<T: DeserializeOwned> $name<T> {
            pub fn new(cache: &ResourceCache, key: Option<ResourceKey>) -> Self {
                Self {
                    hook: Hook::new(cache, key),
                }
            }

            /// Derived state, recomputed only after the entry changed.
            pub fn state(&self) -> Arc<$state<T>> {
                self.hook.state()
            }

            /// Revalidate this hook's key in the background.
            pub fn mutate(&self) {
                self.hook.handle.mutate()
            }

            /// Wait for the next transition; `false` if none can follow.
            pub async fn changed(&mut self) -> bool {
                self.hook.handle.changed().await
            }

            /// Wait until no fetch is running, then return the state.
            pub async fn settled(&mut self) -> Arc<$state<T>> {
                self.hook.handle.settled().await;
                self.state()
            }

            pub fn key(&self) -> Option<&ResourceKey> {
                self.hook.handle.key()
            }
        }
    };
}

hook_type!(
    /// Subscription to a list endpoint.
    CollectionHook,
    CollectionState
);

hook_type!(
    /// Subscription to a single record; inactive when built without an id.
    EntityHook,
    EntityState
);

pub fn use_users(cache: &ResourceCache) -> CollectionHook<UserView> {
    CollectionHook::new(cache, Some(keys::users()))
}

pub fn use_user(cache: &ResourceCache, id: Option<Uuid>) -> EntityHook<UserView> {
    EntityHook::new(cache, keys::user(id))
}

pub fn use_languages(cache: &ResourceCache) -> CollectionHook<Language> {
    CollectionHook::new(cache, Some(keys::languages()))
}

pub fn use_language(cache: &ResourceCache, id: Option<Uuid>) -> EntityHook<Language> {
    EntityHook::new(cache, keys::language(id))
}

pub fn use_categories(cache: &ResourceCache) -> CollectionHook<Category> {
    CollectionHook::new(cache, Some(keys::categories()))
}

pub fn use_category(cache: &ResourceCache, id: Option<Uuid>) -> EntityHook<Category> {
    EntityHook::new(cache, keys::category(id))
}

pub fn use_stories(cache: &ResourceCache) -> CollectionHook<Story> {
    CollectionHook::new(cache, Some(keys::stories()))
}

pub fn use_stories_in_category(cache: &ResourceCache, category_id: Option<Uuid>) -> CollectionHook<Story> {
    CollectionHook::new(cache, keys::stories_in_category(category_id))
}

pub fn use_story(cache: &ResourceCache, id: Option<Uuid>) -> EntityHook<Story> {
    EntityHook::new(cache, keys::story(id))
}

pub fn use_story_questions(cache: &ResourceCache, story_id: Option<Uuid>) -> CollectionHook<StoryQuestion> {
    CollectionHook::new(cache, keys::story_questions(story_id))
}

pub fn use_story_question(cache: &ResourceCache, id: Option<Uuid>) -> EntityHook<StoryQuestion> {
    EntityHook::new(cache, keys::story_question(id))
}

pub fn use_questions(cache: &ResourceCache) -> CollectionHook<Question> {
    CollectionHook::new(cache, Some(keys::questions()))
}

pub fn use_question(cache: &ResourceCache, id: Option<Uuid>) -> EntityHook<Question> {
    EntityHook::new(cache, keys::question(id))
}

pub fn use_comments(cache: &ResourceCache, story_id: Option<Uuid>, page: Page) -> CollectionHook<Comment> {
    CollectionHook::new(cache, keys::comments(story_id, page))
}

pub fn use_comment_replies(cache: &ResourceCache, comment_id: Option<Uuid>, page: Page) -> CollectionHook<Comment> {
    CollectionHook::new(cache, keys::comment_replies(comment_id, page))
}

pub fn use_notifications(cache: &ResourceCache) -> CollectionHook<PushNotification> {
    CollectionHook::new(cache, Some(keys::notifications()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::cache::FetchResult;
    use crate::client::transport::Fetcher;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Serves a fixed body for every key.
    struct StaticFetcher(Value);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _key: &ResourceKey) -> FetchResult {
            Ok(self.0.clone())
        }
    }

    fn cache(body: Value) -> ResourceCache {
        ResourceCache::new(Arc::new(StaticFetcher(body)))
    }

    fn snapshot(data: Option<Value>, is_loading: bool) -> EntrySnapshot {
        EntrySnapshot {
            data,
            is_loading,
            is_validating: is_loading,
            ..EntrySnapshot::default()
        }
    }

    #[test]
    fn test_is_empty_waits_for_load() {
        let loading = CollectionState::<String>::derive(&snapshot(None, true));
        assert!(loading.is_loading);
        assert!(!loading.is_empty);

        let loaded = CollectionState::<String>::derive(&snapshot(Some(json!([])), false));
        assert!(loaded.is_empty);

        let populated = CollectionState::<String>::derive(&snapshot(Some(json!(["a"])), false));
        assert!(!populated.is_empty);
        assert_eq!(populated.data, vec!["a".to_string()]);
    }

    #[test]
    fn test_undecodable_data_becomes_error() {
        let state = EntityState::<Story>::derive(&snapshot(Some(json!({"title": 5})), false));
        assert!(state.data.is_none());
        assert!(matches!(state.error, Some(TransportError::Decode(_))));
    }

    #[tokio::test]
    async fn test_state_is_memoized_per_version() {
        let cache = cache(json!(["genesis", "exodus"]));
        let mut hook: CollectionHook<String> = CollectionHook::new(&cache, Some(ResourceKey::new("/books")));

        let settled = hook.settled().await;
        let again = hook.state();
        assert!(Arc::ptr_eq(&settled, &again));
        assert_eq!(again.data.len(), 2);

        hook.mutate();
        let validating = hook.state();
        assert!(!Arc::ptr_eq(&again, &validating));
        assert!(validating.is_validating);
        assert_eq!(validating.data, again.data);
    }

    #[tokio::test]
    async fn test_missing_id_hook_is_idle() {
        let cache = cache(json!({}));
        let mut hook = use_story(&cache, None);
        assert!(hook.key().is_none());

        let state = hook.state();
        assert!(state.data.is_none());
        assert!(!state.is_loading);
        assert!(!hook.changed().await);
        assert!(cache.is_empty());
    }
}
