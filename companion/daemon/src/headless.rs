//! Headless Collaborators
//!
//! Stand-ins for the desktop pieces the daemon does not have: content comes
//! from a JSON fixture, windows are tracked in memory and frames are logged.
//! Speech and weather report that no backend is configured.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use companion_core::{
    AssetPicker, AudioPlayer, AuthorSource, Collaborators, ContentFetcher, ContentItem,
    FetchError, HostError, LinkOpener, Notice, PlaybackError, Presenter, ScreenPoint, ScreenRect,
    ScreenSize, SpeechSynthesizer, SurfaceFrame, SurfaceId, SynthesisError, WeatherProvider,
    WeatherReading, WindowHost,
};

/// Virtual screen every window lives on
const SCREEN: ScreenRect = ScreenRect::new(0, 0, 1920, 1080);

// =============================================================================
// Content
// =============================================================================

/// Serves the same fixture items for every feed and author
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    items: Option<Vec<ContentItem>>,
}

impl FixtureFetcher {
    /// Load items from a JSON array of content items
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content fixture: {path:?}"))?;
        let items: Vec<ContentItem> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid content fixture: {path:?}"))?;
        info!(path = ?path, items = items.len(), "Loaded content fixture");
        Ok(Self { items: Some(items) })
    }

    /// A fetcher with nothing to serve; every fetch fails
    pub fn empty() -> Self {
        Self::default()
    }

    fn serve(&self, what: &str) -> Result<Vec<ContentItem>, FetchError> {
        self.items
            .clone()
            .ok_or_else(|| FetchError::Unreachable(format!("{what} (no content fixture loaded)")))
    }
}

#[async_trait]
impl ContentFetcher for FixtureFetcher {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<ContentItem>, FetchError> {
        debug!(url = %url, "Fixture feed fetch");
        self.serve(url)
    }

    async fn fetch_author(
        &self,
        source: AuthorSource,
        handle: &str,
    ) -> Result<Vec<ContentItem>, FetchError> {
        debug!(source = %source, handle = %handle, "Fixture author fetch");
        let items = self.serve(handle)?;
        Ok(items
            .into_iter()
            .map(|item| item.with_source(format!("{source}/{handle}")))
            .collect())
    }
}

// =============================================================================
// Speech & weather
// =============================================================================

/// Synthesizer that always fails
#[derive(Debug, Default)]
pub struct NoSpeech;

#[async_trait]
impl SpeechSynthesizer for NoSpeech {
    async fn synthesize(&self, _text: &str, _voice_id: u32) -> Result<Vec<u8>, SynthesisError> {
        Err(SynthesisError::new("no speech backend configured"))
    }
}

#[async_trait]
impl AudioPlayer for NoSpeech {
    async fn play(&self, audio: Vec<u8>) -> Result<(), PlaybackError> {
        debug!(bytes = audio.len(), "Discarding audio");
        Ok(())
    }

    fn stop(&self) {}
}

/// Weather provider that always fails
#[derive(Debug, Default)]
pub struct NoWeather;

#[async_trait]
impl WeatherProvider for NoWeather {
    async fn fetch_current(&self) -> Result<WeatherReading, FetchError> {
        Err(FetchError::Unreachable(
            "no weather backend configured".to_string(),
        ))
    }
}

// =============================================================================
// Windows
// =============================================================================

/// Window positions kept in memory
#[derive(Debug, Default)]
pub struct VirtualHost {
    positions: Mutex<HashMap<SurfaceId, ScreenPoint>>,
    closed: Mutex<Vec<SurfaceId>>,
}

impl VirtualHost {
    fn ensure_open(&self, surface: SurfaceId) -> Result<(), HostError> {
        if self.closed.lock().contains(&surface) {
            return Err(HostError(format!("{surface} window is closed")));
        }
        Ok(())
    }
}

#[async_trait]
impl WindowHost for VirtualHost {
    async fn position(&self, surface: SurfaceId) -> Result<ScreenPoint, HostError> {
        self.ensure_open(surface)?;
        Ok(self
            .positions
            .lock()
            .get(&surface)
            .copied()
            .unwrap_or_default())
    }

    async fn set_position(&self, surface: SurfaceId, origin: ScreenPoint) -> Result<(), HostError> {
        self.ensure_open(surface)?;
        debug!(surface = %surface, x = origin.x, y = origin.y, "Window moved");
        self.positions.lock().insert(surface, origin);
        Ok(())
    }

    async fn size(&self, surface: SurfaceId) -> Result<ScreenSize, HostError> {
        self.ensure_open(surface)?;
        Ok(match surface {
            SurfaceId::Character => ScreenSize::new(300, 400),
            SurfaceId::Bubble => ScreenSize::new(360, 220),
            SurfaceId::Weather => ScreenSize::new(180, 80),
        })
    }

    async fn screen_bounds(&self, _surface: SurfaceId) -> Result<ScreenRect, HostError> {
        Ok(SCREEN)
    }

    async fn bring_to_front(&self, surface: SurfaceId) -> Result<(), HostError> {
        self.ensure_open(surface)?;
        debug!(surface = %surface, "Window raised");
        Ok(())
    }

    async fn close(&self, surface: SurfaceId) -> Result<(), HostError> {
        self.ensure_open(surface)?;
        info!(surface = %surface, "Window closed");
        self.closed.lock().push(surface);
        Ok(())
    }
}

/// Logs links instead of opening a browser
#[derive(Debug, Default)]
pub struct LoggedLinks;

#[async_trait]
impl LinkOpener for LoggedLinks {
    async fn open_external(&self, url: &str) -> Result<(), HostError> {
        info!(url = %url, "Open link");
        Ok(())
    }
}

/// Returns whatever path the `sprite` command queued
#[derive(Debug, Default)]
pub struct QueuedPicker {
    next: Mutex<Option<PathBuf>>,
}

impl QueuedPicker {
    /// Queue the answer for the next pick
    pub fn queue(&self, path: PathBuf) {
        *self.next.lock() = Some(path);
    }
}

#[async_trait]
impl AssetPicker for QueuedPicker {
    async fn pick_sprite(&self) -> Option<PathBuf> {
        self.next.lock().take()
    }
}

// =============================================================================
// Presenter
// =============================================================================

/// Writes frames and notices to the log
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&self, frame: SurfaceFrame) {
        match frame {
            SurfaceFrame::Character(c) => debug!(
                sprite = ?c.sprite.sprite,
                blink = c.sprite.blink_overlay.is_some(),
                mouth = ?c.sprite.mouth_overlay,
                transition = c.sprite.transition_overlay.is_some(),
                hop = c.sprite.hop.offset_px,
                dialog = c.settings_dialog.is_some(),
                "character"
            ),
            SurfaceFrame::Bubble(b) => {
                let headline = b.text.lines().next().unwrap_or_default();
                info!(
                    item = b.index + 1,
                    of = b.count,
                    speak = b.speak.label(),
                    "bubble: {headline}"
                );
            }
            SurfaceFrame::Weather(w) => info!("weather: {} {}", w.temperature, w.description),
        }
    }

    fn alert(&self, surface: SurfaceId, notice: Notice) {
        warn!(surface = %surface, message = %notice.message, "{}", notice.title);
    }
}

/// Build the headless collaborator set
pub fn collaborators(fetcher: FixtureFetcher, picker: Arc<QueuedPicker>) -> Collaborators {
    Collaborators {
        fetcher: Arc::new(fetcher),
        synthesizer: Arc::new(NoSpeech),
        player: Arc::new(NoSpeech),
        weather: Arc::new(NoWeather),
        host: Arc::new(VirtualHost::default()),
        links: Arc::new(LoggedLinks),
        picker,
        presenter: Arc::new(LogPresenter),
    }
}
