//! Implements `ExtractionService` on top of the `yt-dlp` command-line tool.
//! Each call spawns `yt-dlp` as an async child process and parses the JSON
//! lines it prints.

use serenity::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{AudioSource, ExtractionService, SearchResult};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// `yt-dlp` backed extraction service.
#[derive(Debug, Clone)]
pub struct YtDlp {
    /// Path or name of the `yt-dlp` executable.
    program: String,
    /// Format selector passed with `-f`.
    format: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            format: format.into(),
        }
    }

    /// Search terms go through the first YouTube search hit; URLs are used as is.
    fn target_for(reference: &str) -> String {
        if AudioSource::is_url(reference) {
            reference.to_string()
        } else {
            format!("ytsearch1:{}", reference)
        }
    }

    async fn run(&self, args: &[&str]) -> MusicResult<String> {
        debug!("Running {} {:?}", self.program, args);
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                MusicError::ResolutionFailed(format!("Failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} exited with {}: {}", self.program, output.status, stderr.trim());
            return Err(MusicError::ResolutionFailed(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ExtractionService for YtDlp {
    async fn resolve(&self, reference: &str) -> MusicResult<String> {
        info!("Resolving stream URL for '{}'", reference);
        let target = Self::target_for(reference);
        let stdout = self
            .run(&["-j", "--no-playlist", "-f", &self.format, &target])
            .await?;
        parse_stream_url(&stdout)
    }

    async fn search(&self, keyword: &str, limit: usize) -> MusicResult<Vec<SearchResult>> {
        info!("Searching for '{}' (limit {})", keyword, limit);
        let query = format!("ytsearch{}:{}", limit, keyword);
        let stdout = self.run(&["-j", "--flat-playlist", &query]).await?;
        Ok(parse_search_results(&stdout, limit))
    }
}

/// Take the `url` field of the first JSON document `yt-dlp -j` printed.
fn parse_stream_url(stdout: &str) -> MusicResult<String> {
    let line = stdout
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| MusicError::ResolutionFailed("yt-dlp returned no results".to_string()))?;

    let info: serde_json::Value = serde_json::from_str(line).map_err(|e| {
        MusicError::ResolutionFailed(format!("Failed to parse video metadata: {}", e))
    })?;

    info["url"]
        .as_str()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| MusicError::ResolutionFailed("No playable stream in metadata".to_string()))
}

/// Turn the JSON lines of a flat search into ranked results. Lines that fail
/// to parse or carry no link are skipped.
fn parse_search_results(stdout: &str, limit: usize) -> Vec<SearchResult> {
    stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|entry| {
            let reference = entry["webpage_url"]
                .as_str()
                .or_else(|| entry["url"].as_str())?
                .to_string();
            let title = entry["title"]
                .as_str()
                .unwrap_or("Unknown Title")
                .to_string();
            Some(SearchResult { title, reference })
        })
        .take(limit)
        .collect()
}
