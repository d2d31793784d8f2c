//! Fakes for the controller's three seams: voice transport, extraction
//! service and panel renderer. Each one records what it was asked to do.

use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude::{ChannelId, GuildId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{Notify, oneshot, watch};

use rusty_tunes::commands::music::audio_sources::{ExtractionService, SearchResult};
use rusty_tunes::commands::music::utils::control_panel::PanelView;
use rusty_tunes::commands::music::utils::music_manager::{MusicError, MusicResult, PanelRenderer};
use rusty_tunes::commands::music::utils::voice_transport::{StreamCompletion, VoiceTransport};

const WAIT: Duration = Duration::from_secs(5);

/// Voice transport whose streams last until the test ends them or `stop` is
/// called. Like songbird, pause, resume and volume changes fail when no stream
/// is registered.
#[derive(Default)]
pub struct FakeTransport {
    connected: AtomicBool,
    calls: Mutex<Vec<String>>,
    active: Mutex<Option<oneshot::Sender<MusicResult<()>>>>,
    started: Notify,
}

impl FakeTransport {
    pub fn connected() -> Self {
        let transport = Self::default();
        transport.connected.store(true, Ordering::SeqCst);
        transport
    }

    pub fn is_connected_now(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(prefix)).count()
    }

    pub async fn wait_for_stream(&self) {
        tokio::time::timeout(WAIT, self.started.notified())
            .await
            .expect("no stream started");
    }

    /// Complete the running stream with `outcome`.
    pub fn end_stream(&self, outcome: MusicResult<()>) {
        if let Some(sender) = self.active.lock().unwrap().take() {
            let _ = sender.send(outcome);
        }
    }

    pub fn has_stream(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn require_stream(&self) -> MusicResult<()> {
        if self.has_stream() {
            Ok(())
        } else {
            Err(MusicError::TransportError("No stream is playing".to_string()))
        }
    }
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        self.record(format!("connect {} {}", guild_id, channel_id));
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.is_connected_now()
    }

    async fn play(&self, stream_url: &str, volume: f32) -> MusicResult<StreamCompletion> {
        self.record(format!("play {} {}", stream_url, volume));
        let (sender, receiver) = oneshot::channel();
        *self.active.lock().unwrap() = Some(sender);
        self.started.notify_one();
        Ok(receiver)
    }

    async fn pause(&self) -> MusicResult<()> {
        self.record("pause");
        self.require_stream()
    }

    async fn resume(&self) -> MusicResult<()> {
        self.record("resume");
        self.require_stream()
    }

    async fn stop(&self) -> MusicResult<()> {
        self.record("stop");
        self.end_stream(Ok(()));
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> MusicResult<()> {
        self.record(format!("volume {}", volume));
        self.require_stream()
    }

    async fn disconnect(&self) -> MusicResult<()> {
        self.record("disconnect");
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        false
    }
}

/// Extraction service that resolves every reference to `stream://<reference>`
/// except those starting with `bad`. Resolutions can be held back to keep the
/// controller in Loading.
#[derive(Default)]
pub struct FakeExtractor {
    resolutions: DashMap<String, usize>,
    search_results: Mutex<Vec<SearchResult>>,
    held: AtomicBool,
    release: Notify,
}

impl FakeExtractor {
    pub fn resolutions_of(&self, reference: &str) -> usize {
        self.resolutions.get(reference).map(|count| *count).unwrap_or(0)
    }

    pub fn with_search_results(self, results: Vec<SearchResult>) -> Self {
        *self.search_results.lock().unwrap() = results;
        self
    }

    /// Make every following resolution wait for `release_one`.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_one(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ExtractionService for FakeExtractor {
    async fn resolve(&self, reference: &str) -> MusicResult<String> {
        *self.resolutions.entry(reference.to_string()).or_insert(0) += 1;
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if reference.starts_with("bad") {
            Err(MusicError::ResolutionFailed(format!("no stream for {}", reference)))
        } else {
            Ok(format!("stream://{}", reference))
        }
    }

    async fn search(&self, keyword: &str, limit: usize) -> MusicResult<Vec<SearchResult>> {
        if keyword == "broken" {
            return Err(MusicError::ResolutionFailed("search service down".into()));
        }
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Renderer that keeps every view it was given.
pub struct RecordingRenderer {
    history: watch::Sender<Vec<PanelView>>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            history: watch::Sender::new(Vec::new()),
        }
    }
}

impl RecordingRenderer {
    pub fn latest(&self) -> Option<PanelView> {
        self.history.borrow().last().cloned()
    }

    pub fn history(&self) -> Vec<PanelView> {
        self.history.borrow().clone()
    }

    /// Wait until the latest rendered view satisfies `predicate` and return it.
    pub async fn wait_for(&self, predicate: impl Fn(&PanelView) -> bool) -> PanelView {
        self.wait_until(|history| history.last().is_some_and(&predicate))
            .await
            .last()
            .cloned()
            .expect("checked above")
    }

    /// Wait until `count` rendered views have satisfied `predicate`.
    pub async fn wait_for_count(&self, count: usize, predicate: impl Fn(&PanelView) -> bool) {
        self.wait_until(|history| history.iter().filter(|view| predicate(view)).count() >= count)
            .await;
    }

    async fn wait_until(&self, condition: impl Fn(&[PanelView]) -> bool) -> Vec<PanelView> {
        let mut receiver = self.history.subscribe();
        let history = tokio::time::timeout(WAIT, receiver.wait_for(|history| condition(history)))
            .await
            .expect("timed out waiting for panel view")
            .expect("renderer dropped");
        history.clone()
    }
}

#[async_trait]
impl PanelRenderer for RecordingRenderer {
    async fn render(&self, view: PanelView) {
        self.history.send_modify(|history| history.push(view));
    }
}

/// Renderer whose renders never complete, like a panel edit stuck behind a
/// Discord rate limit.
#[derive(Default)]
pub struct StalledRenderer {
    started: AtomicUsize,
}

impl StalledRenderer {
    pub fn renders_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PanelRenderer for StalledRenderer {
    async fn render(&self, _view: PanelView) {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
    }
}
