//! Limit/offset pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default number of items returned by list endpoints.
const DEFAULT_LIMIT: i64 = 20;
/// Upper bound on a single page.
const MAX_LIMIT: i64 = 100;

/// Limit/offset window for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ListWindow {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: i64,
}

impl ListWindow {
    /// Create a window, clamping limit into `1..=100` and offset to `>= 0`.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: if limit <= 0 {
                DEFAULT_LIMIT
            } else {
                limit.min(MAX_LIMIT)
            },
            offset: offset.max(0),
        }
    }

    /// Return a clamped copy of this window.
    pub fn clamped(self) -> Self {
        Self::new(self.limit, self.offset)
    }
}

impl Default for ListWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Pagination echo returned alongside list payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// The limit that was applied.
    pub limit: i64,
    /// The offset that was applied.
    pub offset: i64,
    /// Number of items in this page.
    pub count: usize,
}

impl PageInfo {
    /// Build page info from the applied window and the returned items.
    pub fn from_window(window: &ListWindow, count: usize) -> Self {
        Self {
            limit: window.limit,
            offset: window.offset,
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_clamps_limit() {
        assert_eq!(ListWindow::new(0, 0).limit, DEFAULT_LIMIT);
        assert_eq!(ListWindow::new(-5, 0).limit, DEFAULT_LIMIT);
        assert_eq!(ListWindow::new(500, 0).limit, MAX_LIMIT);
        assert_eq!(ListWindow::new(50, -3).offset, 0);
    }
}
