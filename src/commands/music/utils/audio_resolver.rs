//! Resolves playlist references to stream URLs, remembering every successful
//! resolution for the lifetime of the process.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::music_manager::{MusicError, MusicResult};
use crate::commands::music::audio_sources::{ExtractionService, SearchResult};

/// Cache mapping a reference, exactly as the user supplied it, to its stream URL.
/// Only successful resolutions are ever inserted.
pub type ResolvedStreamCache = DashMap<String, String>;

/// Cheap to clone; clones share the cache and the extraction service.
#[derive(Clone)]
pub struct AudioResolver {
    service: Arc<dyn ExtractionService>,
    cache: Arc<ResolvedStreamCache>,
    timeout: Duration,
}

impl AudioResolver {
    pub fn new(service: Arc<dyn ExtractionService>, timeout: Duration) -> Self {
        Self {
            service,
            cache: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Resolve `reference` to a stream URL.
    ///
    /// A cache hit returns immediately. On a miss the extraction service is asked
    /// exactly once; a success is cached, a failure or timeout is not, so the next
    /// attempt asks the service again.
    pub async fn resolve_one(&self, reference: &str) -> MusicResult<String> {
        if let Some(url) = self.cache.get(reference) {
            debug!("Cache hit for '{}'", reference);
            return Ok(url.value().clone());
        }
        debug!("Cache miss for '{}'", reference);

        let url = tokio::time::timeout(self.timeout, self.service.resolve(reference))
            .await
            .map_err(|_| {
                warn!("Resolving '{}' timed out after {:?}", reference, self.timeout);
                MusicError::ResolutionFailed(format!("timed out after {:?}", self.timeout))
            })??;

        info!("Caching stream URL for '{}'", reference);
        self.cache.insert(reference.to_string(), url.clone());
        Ok(url)
    }

    /// Search the extraction service. An empty list means "no matches"; a
    /// service failure is `ResolutionFailed`.
    pub async fn search(&self, keyword: &str, max_results: usize) -> MusicResult<Vec<SearchResult>> {
        tokio::time::timeout(self.timeout, self.service.search(keyword, max_results))
            .await
            .map_err(|_| MusicError::ResolutionFailed(format!("search timed out after {:?}", self.timeout)))?
    }

    #[cfg(test)]
    fn is_cached(&self, reference: &str) -> bool {
        self.cache.contains_key(reference)
    }

    #[cfg(test)]
    fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
