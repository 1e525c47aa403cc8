use crate::cache::Cache;
use crate::services::{AliasAllocator, ReputationGuard};
use crate::store::RecordStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Wrapped in `Arc` and handed to the router; every dependency a handler
/// needs is reachable from here.
#[derive(Clone)]
pub struct AppState {
    /// Maps targets to aliases and resolves aliases back
    pub allocator: AliasAllocator,

    /// Reputation checks for registration and preview
    pub reputation: ReputationGuard,

    /// Backing record store
    pub store: Arc<dyn RecordStore>,

    /// Redis cache for alias lookups, `None` when disabled
    pub cache: Option<Cache>,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,
}

impl AppState {
    pub fn new(
        allocator: AliasAllocator,
        reputation: ReputationGuard,
        store: Arc<dyn RecordStore>,
        cache: Option<Cache>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            allocator,
            reputation,
            store,
            cache,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn short_url(&self, alias: &str) -> String {
        format!("{}/{}", self.base_url, alias)
    }

    pub fn preview_url(&self, alias: &str) -> String {
        format!("{}/preview/{}", self.base_url, alias)
    }
}
