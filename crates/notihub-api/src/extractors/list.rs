//! Limit/offset query parameter extractor.

use serde::{Deserialize, Serialize};

use notihub_core::types::pagination::ListWindow;

/// Query parameters for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Maximum number of items (default 20, max 100).
    #[serde(default)]
    pub limit: Option<i64>,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: Option<i64>,
}

impl ListParams {
    /// Convert to a clamped [`ListWindow`].
    pub fn window(&self) -> ListWindow {
        ListWindow::new(self.limit.unwrap_or(0), self.offset.unwrap_or(0))
    }
}
