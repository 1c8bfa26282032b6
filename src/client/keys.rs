//! Cache keys for every resource the admin client reads.
//!
//! Reads and invalidation both build their keys here so that a write always
//! targets exactly the entry a hook subscribed to. Builders that need an id
//! take an `Option` and return `None` when it is absent: the inactive key,
//! which the cache never fetches.

use std::fmt;

use uuid::Uuid;

use crate::types::Page;

/// Canonical address of a cached resource: request path plus query
/// parameters sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    path: String,
    query: Vec<(String, String)>,
}

impl ResourceKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Add a query parameter, replacing any previous value for `name`.
    pub fn with_query(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.query.retain(|(existing, _)| existing != name);
        self.query.push((name.to_string(), value.to_string()));
        self.query.sort();
        self
    }

    pub fn with_page(self, page: Page) -> Self {
        self.with_query("limit", page.limit).with_query("skip", page.skip)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            return f.write_str(&self.path);
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        write!(f, "{}?{}", self.path, query)
    }
}

fn by_id(prefix: &str, id: Option<Uuid>) -> Option<ResourceKey> {
    id.map(|id| ResourceKey::new(format!("{}/{}", prefix, id)))
}

pub fn users() -> ResourceKey {
    ResourceKey::new("/users")
}

pub fn user(id: Option<Uuid>) -> Option<ResourceKey> {
    by_id("/users", id)
}

pub fn languages() -> ResourceKey {
    ResourceKey::new("/fetch-languages")
}

pub fn language(id: Option<Uuid>) -> Option<ResourceKey> {
    by_id("/fetch-languages", id)
}

pub fn categories() -> ResourceKey {
    ResourceKey::new("/categories")
}

pub fn category(id: Option<Uuid>) -> Option<ResourceKey> {
    by_id("/categories", id)
}

pub fn stories() -> ResourceKey {
    ResourceKey::new("/story-list")
}

/// Stories of one category, ordered like the full list.
pub fn stories_in_category(category_id: Option<Uuid>) -> Option<ResourceKey> {
    category_id.map(|id| stories().with_query("category_id", id))
}

pub fn story(id: Option<Uuid>) -> Option<ResourceKey> {
    by_id("/story-by-id-admin", id)
}

const STORY_QUESTION_LIST: &str = "/story-question-list";

pub fn story_questions(story_id: Option<Uuid>) -> Option<ResourceKey> {
    by_id(STORY_QUESTION_LIST, story_id)
}

/// True for the question list of any story.
pub fn is_story_questions(key: &ResourceKey) -> bool {
    key.path()
        .strip_prefix(STORY_QUESTION_LIST)
        .is_some_and(|rest| rest.starts_with('/'))
}

pub fn story_question(id: Option<Uuid>) -> Option<ResourceKey> {
    by_id("/story-question-by-id-admin", id)
}

pub fn questions() -> ResourceKey {
    ResourceKey::new("/question-list")
}

pub fn question(id: Option<Uuid>) -> Option<ResourceKey> {
    by_id("/question-by-id-admin", id)
}

/// Path shared by every page of a story's comments.
pub fn comments_path(story_id: Uuid) -> String {
    format!("/comments/{}", story_id)
}

pub fn comments(story_id: Option<Uuid>, page: Page) -> Option<ResourceKey> {
    story_id.map(|id| ResourceKey::new(comments_path(id)).with_page(page))
}

/// Path shared by every page of a comment's replies.
pub fn comment_replies_path(comment_id: Uuid) -> String {
    format!("/comment-replies/{}", comment_id)
}

pub fn comment_replies(comment_id: Option<Uuid>, page: Page) -> Option<ResourceKey> {
    comment_id.map(|id| ResourceKey::new(comment_replies_path(id)).with_page(page))
}

pub fn notifications() -> ResourceKey {
    ResourceKey::new("/notifications")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_sorted_and_encoded() {
        let key = ResourceKey::new("/story-list")
            .with_query("skip", 0)
            .with_query("category_id", "a b")
            .with_query("limit", 10);
        assert_eq!(key.to_string(), "/story-list?category_id=a+b&limit=10&skip=0");

        let same = ResourceKey::new("/story-list")
            .with_query("limit", 10)
            .with_query("category_id", "a b")
            .with_query("skip", 0);
        assert_eq!(key, same);
    }

    #[test]
    fn test_with_query_replaces_value() {
        let key = ResourceKey::new("/x").with_query("limit", 5).with_query("limit", 7);
        assert_eq!(key.query(), &[("limit".to_string(), "7".to_string())]);
    }

    #[test]
    fn test_absent_id_is_inactive() {
        assert_eq!(story(None), None);
        assert_eq!(comments(None, Page::default()), None);
        assert_eq!(stories_in_category(None), None);
    }

    #[test]
    fn test_keys_are_pure() {
        let id = Uuid::new_v4();
        assert_eq!(story(Some(id)), story(Some(id)));
        assert_eq!(
            comments(Some(id), Page::new(5, 10)).map(|k| k.to_string()),
            Some(format!("/comments/{}?limit=5&skip=10", id))
        );
        assert_eq!(languages().to_string(), "/fetch-languages");
    }

    #[test]
    fn test_story_question_lists_are_recognised() {
        let id = Uuid::new_v4();
        assert!(story_questions(Some(id)).is_some_and(|k| is_story_questions(&k)));
        assert!(!is_story_questions(&questions()));
        assert!(!story_question(Some(id)).is_some_and(|k| is_story_questions(&k)));
    }

    #[test]
    fn test_paged_keys_share_their_path() {
        let id = Uuid::new_v4();
        for page in [Page::default(), Page::new(5, 10)] {
            assert_eq!(comments(Some(id), page).map(|k| k.path().to_string()), Some(comments_path(id)));
            assert_eq!(
                comment_replies(Some(id), page).map(|k| k.path().to_string()),
                Some(comment_replies_path(id))
            );
        }
    }
}
