//! Listing filters and paged results

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Filter for listing a user's webhooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookFilter {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive substring match on the name
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl Default for WebhookFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            search: None,
            is_active: None,
        }
    }
}

impl WebhookFilter {
    /// Build a filter, clamping out-of-range values
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        search: Option<String>,
        is_active: Option<bool>,
    ) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            search: search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            is_active,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Webhook totals for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookCounts {
    pub total: i64,
    pub active: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_clamps() {
        let filter = WebhookFilter::new(Some(0), Some(500), Some("  ".into()), None);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_LIMIT);
        assert!(filter.search.is_none());
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let filter = WebhookFilter::new(Some(3), Some(20), None, Some(true));
        assert_eq!(filter.offset(), 40);
    }
}
