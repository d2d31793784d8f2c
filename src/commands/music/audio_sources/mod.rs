//! The boundary to whatever turns a user reference into a playable stream.
//! The playback core only ever sees the `ExtractionService` trait; the
//! `youtube` submodule provides the `yt-dlp` backed implementation.

/// `yt-dlp` implementation of `ExtractionService`.
pub(crate) mod youtube;

use crate::commands::music::utils::music_manager::MusicResult;
use serde::{Deserialize, Serialize};
use serenity::async_trait;
use url::Url;

pub use youtube::YtDlp;

/// One hit of a keyword search, in the order the service ranked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Human readable title shown in the selection menu.
    pub title: String,
    /// Reference to append to the playlist when this result is chosen.
    pub reference: String,
}

/// External service able to resolve references and search for tracks.
///
/// Both calls may take seconds; callers run them off the session's control path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Resolve a reference (URL or search term) to a direct stream URL.
    ///
    /// Fails with `MusicError::ResolutionFailed` when no usable stream exists.
    async fn resolve(&self, reference: &str) -> MusicResult<String>;

    /// Search for up to `limit` tracks matching `keyword`.
    async fn search(&self, keyword: &str, limit: usize) -> MusicResult<Vec<SearchResult>>;
}

/// Helpers shared by audio source implementations.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    /// Anything else is treated as a search term.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}
