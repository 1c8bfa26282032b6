//! Shared types used by both the API handlers and the admin client

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// A resolved window over a collection: `limit` records after skipping `skip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub skip: u32,
}

impl Page {
    pub fn new(limit: u32, skip: u32) -> Self {
        Self { limit, skip }
    }

    /// The page following this one.
    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            skip: self.skip.saturating_add(self.limit),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 20, skip: 0 }
    }
}

/// Raw `?limit=&skip=` query parameters as they arrive on the wire.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl PageQuery {
    /// Apply configured defaults and clamp the limit to `[1, max_limit]`.
    pub fn resolve(&self, config: &PaginationConfig) -> Page {
        let limit = self
            .limit
            .unwrap_or(config.default_limit)
            .clamp(1, config.max_limit.max(1));
        Page {
            limit,
            skip: self.skip.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination() -> PaginationConfig {
        PaginationConfig {
            default_limit: 20,
            max_limit: 100,
        }
    }

    #[test]
    fn test_defaults_applied() {
        let page = PageQuery::default().resolve(&pagination());
        assert_eq!(page, Page::new(20, 0));
    }

    #[test]
    fn test_limit_clamped() {
        let query = PageQuery { limit: Some(5000), skip: Some(40) };
        assert_eq!(query.resolve(&pagination()), Page::new(100, 40));

        let query = PageQuery { limit: Some(0), skip: None };
        assert_eq!(query.resolve(&pagination()).limit, 1);
    }

    #[test]
    fn test_next_page() {
        assert_eq!(Page::new(10, 20).next(), Page::new(10, 30));
    }
}
