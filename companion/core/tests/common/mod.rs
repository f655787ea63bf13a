//! Shared mock collaborators for surface integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use companion_core::{
    AssetPicker, AudioPlayer, AuthorSource, BubbleFrame, CharacterFrame, Collaborators,
    CompanionConfig, ContentFetcher, ContentItem, FetchError, HostError, KeyValueStore,
    LinkOpener, MemoryStore, Notice, PlaybackError, Presenter, ScreenPoint, ScreenRect,
    ScreenSize, SpeechSynthesizer, SurfaceContext, SurfaceFrame, SurfaceId, SynthesisError,
    WeatherFrame, WeatherProvider, WeatherReading, WindowHost,
};

/// Every window is this size
pub const WINDOW_SIZE: ScreenSize = ScreenSize::new(200, 100);

/// The single screen
pub const SCREEN: ScreenRect = ScreenRect::new(0, 0, 1920, 1080);

/// How long a test waits for a frame before failing
const FRAME_WAIT: Duration = Duration::from_secs(2 * 60 * 60);

pub fn items(n: usize) -> Vec<ContentItem> {
    (0..n)
        .map(|i| {
            ContentItem::new(format!("item {i}"), format!("body {i}"))
                .with_link(format!("https://example.org/{i}"))
        })
        .collect()
}

// =============================================================================
// Mock collaborators
// =============================================================================

#[derive(Default)]
pub struct MockFetcher {
    pub feed: Mutex<Vec<ContentItem>>,
    pub fail: Mutex<bool>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<ContentItem>, FetchError> {
        self.calls.lock().push(format!("feed:{url}"));
        if *self.fail.lock() {
            return Err(FetchError::Unreachable(url.to_string()));
        }
        Ok(self.feed.lock().clone())
    }

    async fn fetch_author(
        &self,
        source: AuthorSource,
        handle: &str,
    ) -> Result<Vec<ContentItem>, FetchError> {
        self.calls.lock().push(format!("{source}:{handle}"));
        Ok(items(2))
    }
}

#[derive(Default)]
pub struct MockSynthesizer {
    pub fail: Mutex<bool>,
    pub delay: Mutex<Duration>,
    pub calls: Mutex<Vec<(String, u32)>>,
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: u32) -> Result<Vec<u8>, SynthesisError> {
        self.calls.lock().push((text.to_string(), voice_id));
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.fail.lock() {
            return Err(SynthesisError::new("engine offline"));
        }
        Ok(vec![0x52, 0x49, 0x46, 0x46])
    }
}

/// Plays for `length` unless stopped first
pub struct MockPlayer {
    pub length: Duration,
    pub stops: Mutex<usize>,
    stop: Notify,
}

impl MockPlayer {
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            stops: Mutex::new(0),
            stop: Notify::new(),
        }
    }
}

#[async_trait]
impl AudioPlayer for MockPlayer {
    async fn play(&self, _audio: Vec<u8>) -> Result<(), PlaybackError> {
        tokio::select! {
            _ = tokio::time::sleep(self.length) => {}
            _ = self.stop.notified() => {}
        }
        Ok(())
    }

    fn stop(&self) {
        *self.stops.lock() += 1;
        self.stop.notify_one();
    }
}

#[derive(Default)]
pub struct MockWeather {
    pub reading: Mutex<Option<WeatherReading>>,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn fetch_current(&self) -> Result<WeatherReading, FetchError> {
        *self.calls.lock() += 1;
        self.reading
            .lock()
            .ok_or_else(|| FetchError::Unreachable("weather".to_string()))
    }
}

#[derive(Default)]
pub struct MockHost {
    pub positions: Mutex<HashMap<SurfaceId, ScreenPoint>>,
    pub closed: Mutex<Vec<SurfaceId>>,
    pub raised: Mutex<Vec<SurfaceId>>,
}

#[async_trait]
impl WindowHost for MockHost {
    async fn position(&self, surface: SurfaceId) -> Result<ScreenPoint, HostError> {
        Ok(self
            .positions
            .lock()
            .get(&surface)
            .copied()
            .unwrap_or_default())
    }

    async fn set_position(&self, surface: SurfaceId, origin: ScreenPoint) -> Result<(), HostError> {
        self.positions.lock().insert(surface, origin);
        Ok(())
    }

    async fn size(&self, _surface: SurfaceId) -> Result<ScreenSize, HostError> {
        Ok(WINDOW_SIZE)
    }

    async fn screen_bounds(&self, _surface: SurfaceId) -> Result<ScreenRect, HostError> {
        Ok(SCREEN)
    }

    async fn bring_to_front(&self, surface: SurfaceId) -> Result<(), HostError> {
        self.raised.lock().push(surface);
        Ok(())
    }

    async fn close(&self, surface: SurfaceId) -> Result<(), HostError> {
        let mut closed = self.closed.lock();
        if closed.contains(&surface) {
            return Err(HostError(format!("{surface} already closed")));
        }
        closed.push(surface);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockLinks {
    pub opened: Mutex<Vec<String>>,
}

#[async_trait]
impl LinkOpener for MockLinks {
    async fn open_external(&self, url: &str) -> Result<(), HostError> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPicker {
    pub next: Mutex<Option<PathBuf>>,
}

#[async_trait]
impl AssetPicker for MockPicker {
    async fn pick_sprite(&self) -> Option<PathBuf> {
        self.next.lock().take()
    }
}

/// Forwards every frame and notice to the test
pub struct RecordingPresenter {
    frames: mpsc::UnboundedSender<SurfaceFrame>,
    alerts: mpsc::UnboundedSender<(SurfaceId, Notice)>,
}

impl Presenter for RecordingPresenter {
    fn present(&self, frame: SurfaceFrame) {
        let _ = self.frames.send(frame);
    }

    fn alert(&self, surface: SurfaceId, notice: Notice) {
        let _ = self.alerts.send((surface, notice));
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub ctx: SurfaceContext,
    pub store: Arc<MemoryStore>,
    pub fetcher: Arc<MockFetcher>,
    pub synthesizer: Arc<MockSynthesizer>,
    pub player: Arc<MockPlayer>,
    pub weather: Arc<MockWeather>,
    pub host: Arc<MockHost>,
    pub links: Arc<MockLinks>,
    pub picker: Arc<MockPicker>,
    pub frames: mpsc::UnboundedReceiver<SurfaceFrame>,
    pub alerts: mpsc::UnboundedReceiver<(SurfaceId, Notice)>,
}

pub struct HarnessBuilder {
    config: CompanionConfig,
    store: Arc<MemoryStore>,
    feed: Vec<ContentItem>,
    playback: Duration,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let mut config = CompanionConfig::new();
        config.state_path = None;
        Self {
            config,
            store: Arc::new(MemoryStore::new()),
            feed: Vec::new(),
            playback: Duration::from_secs(3),
        }
    }

    pub fn feed(mut self, feed: Vec<ContentItem>) -> Self {
        self.feed = feed;
        self
    }

    pub fn transition(mut self, path: &str) -> Self {
        self.config.transition_asset = Some(PathBuf::from(path));
        self
    }

    pub fn playback(mut self, length: Duration) -> Self {
        self.playback = length;
        self
    }

    pub fn stored(self, key: &str, value: &str) -> Self {
        self.store.set(key, value.to_string()).unwrap();
        self
    }

    pub fn build(self) -> Harness {
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (alerts_tx, alerts) = mpsc::unbounded_channel();
        let fetcher = Arc::new(MockFetcher::default());
        *fetcher.feed.lock() = self.feed;
        let synthesizer = Arc::new(MockSynthesizer::default());
        let player = Arc::new(MockPlayer::new(self.playback));
        let weather = Arc::new(MockWeather::default());
        let host = Arc::new(MockHost::default());
        let links = Arc::new(MockLinks::default());
        let picker = Arc::new(MockPicker::default());

        let collaborators = Collaborators {
            fetcher: fetcher.clone(),
            synthesizer: synthesizer.clone(),
            player: player.clone(),
            weather: weather.clone(),
            host: host.clone(),
            links: links.clone(),
            picker: picker.clone(),
            presenter: Arc::new(RecordingPresenter {
                frames: frames_tx,
                alerts: alerts_tx,
            }),
        };
        let ctx = SurfaceContext::new(self.config, self.store.clone(), collaborators);

        Harness {
            ctx,
            store: self.store,
            fetcher,
            synthesizer,
            player,
            weather,
            host,
            links,
            picker,
            frames,
            alerts,
        }
    }
}

impl Harness {
    /// Wait for the next bubble frame matching `pred`
    pub async fn bubble_until(&mut self, pred: impl Fn(&BubbleFrame) -> bool) -> BubbleFrame {
        self.until(|frame| match frame {
            SurfaceFrame::Bubble(b) if pred(&b) => Some(b),
            _ => None,
        })
        .await
    }

    /// Wait for the next character frame matching `pred`
    pub async fn character_until(
        &mut self,
        pred: impl Fn(&CharacterFrame) -> bool,
    ) -> CharacterFrame {
        self.until(|frame| match frame {
            SurfaceFrame::Character(c) if pred(&c) => Some(c),
            _ => None,
        })
        .await
    }

    /// Wait for the next weather frame matching `pred`
    pub async fn weather_until(&mut self, pred: impl Fn(&WeatherFrame) -> bool) -> WeatherFrame {
        self.until(|frame| match frame {
            SurfaceFrame::Weather(w) if pred(&w) => Some(w),
            _ => None,
        })
        .await
    }

    /// Wait for the next notice
    pub async fn alert(&mut self) -> (SurfaceId, Notice) {
        tokio::time::timeout(FRAME_WAIT, self.alerts.recv())
            .await
            .expect("timed out waiting for a notice")
            .expect("presenter dropped")
    }

    async fn until<T>(&mut self, mut pick: impl FnMut(SurfaceFrame) -> Option<T>) -> T {
        let wait = async {
            loop {
                let frame = self.frames.recv().await.expect("presenter dropped");
                if let Some(found) = pick(frame) {
                    return found;
                }
            }
        };
        tokio::time::timeout(FRAME_WAIT, wait)
            .await
            .expect("timed out waiting for a frame")
    }
}
