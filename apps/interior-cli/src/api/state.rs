//! Shared state for the HTTP API.

use std::time::Duration;

use interior_core::catalog::CatalogReader;
use interior_core::config::SearchSettings;
use interior_core::Error;
use interior_search::ImageSearchEngine;

/// State shared across all API handlers.
pub struct ApiState {
    pub engine: ImageSearchEngine,
    pub catalog: CatalogReader,
    pub default_limit: usize,
    pub max_limit: usize,
    pub request_timeout: Duration,
}

impl ApiState {
    pub fn new(engine: ImageSearchEngine, catalog: CatalogReader, search: &SearchSettings, request_timeout: Duration) -> Self {
        Self {
            engine,
            catalog,
            default_limit: search.default_limit,
            max_limit: search.max_limit,
            request_timeout,
        }
    }

    /// Absent → default; non-positive → `InvalidLimit`; above the maximum → clamped.
    pub fn resolve_limit(&self, limit: Option<i64>) -> Result<usize, Error> {
        match limit {
            None => Ok(self.default_limit),
            Some(n) if n <= 0 => Err(Error::InvalidLimit(n)),
            Some(n) => Ok(usize::try_from(n).map_or(self.max_limit, |n| n.min(self.max_limit))),
        }
    }
}
