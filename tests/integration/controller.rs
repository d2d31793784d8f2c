use std::sync::Arc;
use std::time::Duration;

use rusty_tunes::commands::music::utils::audio_resolver::AudioResolver;
use rusty_tunes::commands::music::utils::music_manager::{MusicError, MusicManager};
use rusty_tunes::commands::music::utils::playback_session::PlaybackState;

use crate::common::fixtures::{
    BROKEN, Controller, FIRST, SECOND, THIRD, channel_id, guild_id, sample_search_results,
};
use crate::common::init_tracing;
use crate::common::mocks::{FakeExtractor, FakeTransport, StalledRenderer};
use crate::{assert_eq, assert_matches};

#[tokio::test]
async fn playlist_plays_through_and_finishes() {
    init_tracing();
    let controller = Controller::playing(&[FIRST, SECOND]).await;
    assert_eq!(controller.transport.count(&format!("play stream://{}", FIRST)), 1);

    controller.transport.end_stream(Ok(()));
    controller.wait_until_playing(SECOND).await;

    controller.transport.end_stream(Ok(()));
    let view = controller
        .renderer
        .wait_for(|view| view.content == "Playlist finished.")
        .await;
    assert_eq!(view.state, PlaybackState::Idle);
    assert!(!view.controls.next_enabled);
    assert!(view.controls.previous_enabled);

    let snapshot = controller.handle.playlist().await.unwrap();
    assert!(snapshot.is_empty());
}

/// Connect, queue `entries` and start the first one with its resolution held.
async fn loading(entries: &[&str]) -> Controller {
    let extractor = FakeExtractor::default();
    extractor.hold();
    let controller = Controller::spawn_with(extractor, 1.0);
    controller.connect().await;
    for entry in entries {
        controller.handle.enqueue(*entry).await.unwrap();
    }
    controller.handle.start().await.unwrap();
    controller
}

/// Release the held resolution once requests sent alongside have queued up.
async fn release_shortly(controller: &Controller) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.extractor.release_one();
}

#[tokio::test]
async fn loading_is_rendered_before_playing() {
    let controller = loading(&[FIRST]).await;
    controller
        .renderer
        .wait_for(|view| view.state == PlaybackState::Loading)
        .await;
    controller.extractor.release_one();
    controller.wait_until_playing(FIRST).await;

    let contents: Vec<_> = controller
        .renderer
        .history()
        .into_iter()
        .map(|view| view.content)
        .collect();

    let loading = contents
        .iter()
        .position(|c| *c == format!("Loading audio: {}", FIRST))
        .expect("loading view");
    let playing = contents
        .iter()
        .position(|c| *c == format!("Now playing: {}", FIRST))
        .expect("playing view");
    assert!(loading < playing);
}

#[tokio::test]
async fn start_on_empty_playlist_is_rejected() {
    let controller = Controller::spawn();
    controller.connect().await;

    assert_matches!(
        controller.handle.start().await,
        Err(MusicError::InvalidTransition(_))
    );
    let view = controller.handle.panel().await.unwrap();
    assert_eq!(view.state, PlaybackState::Idle);
    assert_eq!(view.content, "Playlist is empty.");
}

#[tokio::test]
async fn controls_wait_while_audio_is_loading() {
    let controller = loading(&[FIRST]).await;

    let handle = controller.handle.clone();
    let pause = tokio::spawn(async move { handle.pause().await });

    // Queries are still answered while the pause waits its turn
    tokio::time::sleep(Duration::from_millis(50)).await;
    let view = controller.handle.panel().await.unwrap();
    assert_eq!(view.state, PlaybackState::Loading);
    controller
        .renderer
        .wait_for(|view| view.state == PlaybackState::Loading)
        .await;
    assert!(!pause.is_finished());

    controller.extractor.release_one();
    let paused = pause.await.unwrap().unwrap();
    assert_eq!(paused.state, PlaybackState::Paused);
    assert_eq!(paused.current.as_deref(), Some(FIRST));
}

#[tokio::test]
async fn deferred_pause_and_clear_act_on_the_stream_that_just_started() {
    let controller = loading(&[FIRST, SECOND]).await;

    let (paused, cleared, ()) = tokio::join!(
        controller.handle.pause(),
        controller.handle.clear(),
        release_shortly(&controller),
    );
    assert_eq!(paused.unwrap().state, PlaybackState::Paused);
    let cleared = cleared.unwrap();
    assert_eq!(cleared.state, PlaybackState::Idle);
    assert_eq!(cleared.content, "Playlist is empty.");

    assert!(!controller.transport.has_stream());
    assert_eq!(
        controller.transport.calls()[1..],
        [format!("play stream://{} 1", FIRST), "pause".to_string(), "stop".to_string()]
    );
}

#[tokio::test]
async fn deferred_stop_interrupts_the_stream_that_just_started() {
    let controller = loading(&[FIRST, SECOND]).await;

    let (stopped, ()) = tokio::join!(controller.handle.stop(), release_shortly(&controller));
    let stopped = stopped.unwrap();
    assert_eq!(stopped.state, PlaybackState::Stopped);
    assert_eq!(stopped.content, format!("Stopped. Next up: {}", FIRST));

    assert!(!controller.transport.has_stream());
    assert_eq!(
        controller.transport.calls()[1..],
        [
            format!("play stream://{} 1", FIRST),
            "stop".to_string(),
            "disconnect".to_string()
        ]
    );
}

#[tokio::test]
async fn enqueue_after_a_deferred_clear_is_kept() {
    let controller = loading(&[FIRST]).await;

    let (cleared, receipt, ()) = tokio::join!(
        controller.handle.clear(),
        controller.handle.enqueue(SECOND),
        release_shortly(&controller),
    );
    assert_eq!(cleared.unwrap().state, PlaybackState::Idle);
    let receipt = receipt.unwrap();
    assert_eq!(receipt.position, 1);
    assert_eq!(receipt.now_playing, None);

    let snapshot = controller.handle.playlist().await.unwrap();
    assert_eq!(snapshot.current.as_deref(), Some(SECOND));
    assert!(snapshot.upcoming.is_empty());
}

#[tokio::test]
async fn stalled_panel_rendering_does_not_hold_up_requests() {
    let renderer = Arc::new(StalledRenderer::default());
    let resolver = AudioResolver::new(Arc::new(FakeExtractor::default()), Duration::from_secs(5));
    let handle = MusicManager::spawn(resolver, Arc::new(FakeTransport::default()), renderer.clone(), 1.0);

    let view = tokio::time::timeout(Duration::from_secs(2), async {
        handle.connect(guild_id(), channel_id()).await.unwrap();
        handle.enqueue(FIRST).await.unwrap();
        for _ in 0..5 {
            handle.adjust_volume(-0.2).await.unwrap();
        }
        assert_eq!(handle.playlist().await.unwrap().current.as_deref(), Some(FIRST));
        handle.panel().await.unwrap()
    })
    .await
    .expect("controller stalled behind the renderer");

    assert_eq!(view.volume, 0.0);
    assert_eq!(renderer.renders_started(), 1);
}

#[tokio::test]
async fn pause_and_skip_back_to_back_end_consistently() {
    let controller = Controller::playing(&[FIRST, SECOND]).await;

    let (paused, skipped) = tokio::join!(controller.handle.pause(), controller.handle.skip_next());
    assert_eq!(paused.unwrap().state, PlaybackState::Paused);
    let skipped = skipped.unwrap();
    assert_eq!(skipped.current.as_deref(), Some(SECOND));

    controller.wait_until_playing(SECOND).await;
    let view = controller.handle.panel().await.unwrap();
    assert_eq!(view.state, PlaybackState::Playing);
    assert_eq!(view.current.as_deref(), Some(SECOND));
    assert!(
        !controller
            .renderer
            .history()
            .iter()
            .any(|v| v.state == PlaybackState::Paused && v.current.as_deref() == Some(SECOND))
    );
}

#[tokio::test]
async fn skip_next_stops_the_stream_and_loads_the_next_entry() {
    let controller = Controller::playing(&[FIRST, SECOND, THIRD]).await;

    let view = controller.handle.skip_next().await.unwrap();
    assert_eq!(view.state, PlaybackState::Loading);
    assert_eq!(view.current.as_deref(), Some(SECOND));
    assert_eq!(controller.transport.count("stop"), 1);

    controller.wait_until_playing(SECOND).await;
    let snapshot = controller.handle.playlist().await.unwrap();
    assert_eq!(snapshot.current.as_deref(), Some(SECOND));
    assert_eq!(snapshot.upcoming, vec![THIRD.to_string()]);
}

#[tokio::test]
async fn previous_replays_from_the_cache() {
    let controller = Controller::playing(&[FIRST, SECOND]).await;
    controller.transport.end_stream(Ok(()));
    controller.wait_until_playing(SECOND).await;

    controller.handle.skip_previous().await.unwrap();
    controller.wait_until_playing(FIRST).await;

    assert_eq!(controller.extractor.resolutions_of(FIRST), 1);
    assert_eq!(controller.transport.count(&format!("play stream://{}", FIRST)), 2);
}

#[tokio::test]
async fn failed_resolution_is_reported_and_retried() {
    let controller = Controller::spawn();
    controller.connect().await;
    controller.handle.enqueue(BROKEN).await.unwrap();
    controller.handle.start().await.unwrap();

    let view = controller
        .renderer
        .wait_for(|view| view.content.starts_with("Could not load audio"))
        .await;
    assert_eq!(
        view.content,
        format!("Could not load audio, please check the input: {}", BROKEN)
    );
    assert_eq!(view.state, PlaybackState::Idle);

    controller.handle.start().await.unwrap();
    controller
        .renderer
        .wait_for_count(2, |view| view.content.starts_with("Could not load audio"))
        .await;
    assert_eq!(controller.extractor.resolutions_of(BROKEN), 2);
}

#[tokio::test]
async fn transport_failure_keeps_the_position() {
    let controller = Controller::playing(&[FIRST, SECOND]).await;
    controller
        .transport
        .end_stream(Err(MusicError::TransportError("voice gateway closed".into())));

    let view = controller
        .renderer
        .wait_for(|view| view.content.starts_with("Playback failed"))
        .await;
    assert_eq!(view.state, PlaybackState::Idle);

    let snapshot = controller.handle.playlist().await.unwrap();
    assert_eq!(snapshot.current.as_deref(), Some(FIRST));
}

#[tokio::test]
async fn disconnect_then_connect_resumes_the_same_entry() {
    let controller = Controller::playing(&[FIRST, SECOND]).await;

    let view = controller.handle.stop().await.unwrap();
    assert_eq!(view.state, PlaybackState::Stopped);
    assert_eq!(view.content, format!("Stopped. Next up: {}", FIRST));
    assert!(!controller.transport.is_connected_now());

    assert_matches!(controller.handle.pause().await, Err(MusicError::NotConnected));
    assert_matches!(controller.handle.stop().await, Err(MusicError::NotConnected));

    controller.handle.connect(guild_id(), channel_id()).await.unwrap();
    assert!(controller.handle.has_pending_entry().await.unwrap());
    controller.handle.start().await.unwrap();
    controller.wait_until_playing(FIRST).await;
}

#[tokio::test]
async fn clear_empties_the_playlist_but_stays_connected() {
    let controller = Controller::playing(&[FIRST, SECOND]).await;

    let view = controller.handle.clear().await.unwrap();
    assert_eq!(view.content, "Playlist is empty.");
    assert_eq!(view.state, PlaybackState::Idle);
    assert!(controller.transport.is_connected_now());
    assert!(controller.handle.playlist().await.unwrap().is_empty());
    assert!(!controller.handle.is_active().await.unwrap());
}

#[tokio::test]
async fn enqueue_while_playing_reports_what_is_playing() {
    let controller = Controller::playing(&[FIRST]).await;

    let receipt = controller.handle.enqueue(SECOND).await.unwrap();
    assert_eq!(receipt.position, 2);
    assert_eq!(receipt.now_playing.as_deref(), Some(FIRST));

    let view = controller.renderer.wait_for(|view| view.controls.next_enabled).await;
    assert_eq!(view.state, PlaybackState::Playing);
}

#[tokio::test]
async fn volume_buttons_saturate_at_the_bounds() {
    let controller = Controller::playing(&[FIRST]).await;

    let mut view = controller.handle.adjust_volume(0.2).await.unwrap();
    for _ in 0..10 {
        view = controller.handle.adjust_volume(0.2).await.unwrap();
    }
    assert_eq!(view.volume, 2.0);
    assert!(!view.controls.volume_up_enabled);
    assert!(view.controls.volume_down_enabled);
    assert_eq!(controller.transport.count("volume 1.2"), 1);

    for _ in 0..15 {
        view = controller.handle.adjust_volume(-0.2).await.unwrap();
    }
    assert_eq!(view.volume, 0.0);
    assert!(!view.controls.volume_down_enabled);
}

#[tokio::test]
async fn search_separates_no_matches_from_failures() {
    let extractor = FakeExtractor::default().with_search_results(sample_search_results());
    let controller = Controller::spawn_with(extractor, 1.0);

    let results = controller.handle.search("lofi", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Result 1");

    assert_matches!(
        controller.handle.search("broken", 5).await,
        Err(MusicError::ResolutionFailed(_))
    );
    let view = controller.handle.panel().await.unwrap();
    assert_eq!(view.state, PlaybackState::Idle);
}
