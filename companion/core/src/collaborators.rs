//! External Collaborator Traits
//!
//! The engine talks to everything outside itself (content sources, speech,
//! audio, weather, the window host and the renderer) through these traits.
//! Implementations handle protocol details; the engine only sees the shape
//! of each call.
//!
//! | Collaborator | Call | Failure |
//! |---|---|---|
//! | [`ContentFetcher`] | feed URL / author handle → items | [`FetchError`] |
//! | [`SpeechSynthesizer`] | text + voice → audio bytes | [`SynthesisError`] |
//! | [`AudioPlayer`] | audio bytes → plays until done | [`PlaybackError`] |
//! | [`WeatherProvider`] | () → temperature + condition code | [`FetchError`] |
//! | [`WindowHost`] | surface → position / front / close | [`HostError`] |
//! | [`LinkOpener`] | URL → opened | ignored |

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::ContentItem;
use crate::error::{FetchError, HostError, PlaybackError, SynthesisError};
use crate::frame::{Notice, SurfaceFrame};
use crate::position::{ScreenPoint, ScreenRect, ScreenSize};
use crate::surface::SurfaceId;

/// Which of the two author feeds to query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorSource {
    /// The first author feed
    A,
    /// The second author feed
    B,
}

impl fmt::Display for AuthorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("author-a"),
            Self::B => f.write_str("author-b"),
        }
    }
}

/// Turns a feed URL or author handle into content items
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch an RSS feed
    async fn fetch_feed(&self, url: &str) -> Result<Vec<ContentItem>, FetchError>;

    /// Fetch an author's recent articles
    async fn fetch_author(
        &self,
        source: AuthorSource,
        handle: &str,
    ) -> Result<Vec<ContentItem>, FetchError>;
}

/// Text-to-speech backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with the given voice, returning encoded audio
    async fn synthesize(&self, text: &str, voice_id: u32) -> Result<Vec<u8>, SynthesisError>;
}

/// Audio output
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play audio, resolving when playback ends or is stopped
    async fn play(&self, audio: Vec<u8>) -> Result<(), PlaybackError>;

    /// Stop whatever is playing
    ///
    /// A pending [`play`](Self::play) resolves soon after.
    fn stop(&self);
}

/// A current weather observation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Temperature in degrees Celsius
    pub temperature_c: f64,
    /// WMO weather interpretation code
    pub code: u16,
}

/// Weather backend for a fixed location
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions
    async fn fetch_current(&self) -> Result<WeatherReading, FetchError>;
}

/// Host windowing system
#[async_trait]
pub trait WindowHost: Send + Sync {
    /// Current window origin
    async fn position(&self, surface: SurfaceId) -> Result<ScreenPoint, HostError>;

    /// Move a window
    async fn set_position(&self, surface: SurfaceId, origin: ScreenPoint) -> Result<(), HostError>;

    /// Window size
    async fn size(&self, surface: SurfaceId) -> Result<ScreenSize, HostError>;

    /// Bounds of the screen the window is on
    async fn screen_bounds(&self, surface: SurfaceId) -> Result<ScreenRect, HostError>;

    /// Raise a window above the others
    async fn bring_to_front(&self, surface: SurfaceId) -> Result<(), HostError>;

    /// Close a window
    async fn close(&self, surface: SurfaceId) -> Result<(), HostError>;
}

/// Opens URLs in the user's browser
#[async_trait]
pub trait LinkOpener: Send + Sync {
    /// Open a URL
    async fn open_external(&self, url: &str) -> Result<(), HostError>;
}

/// Lets the user choose a sprite image
#[async_trait]
pub trait AssetPicker: Send + Sync {
    /// Ask for an image; `None` when the user cancels
    async fn pick_sprite(&self) -> Option<PathBuf>;
}

/// Renders surface frames and user-facing notices
pub trait Presenter: Send + Sync {
    /// Show a new frame for a surface
    fn present(&self, frame: SurfaceFrame);

    /// Show a blocking notice on a surface
    fn alert(&self, surface: SurfaceId, notice: Notice);
}

/// Every collaborator a surface may need
#[derive(Clone)]
pub struct Collaborators {
    /// Content fetcher
    pub fetcher: Arc<dyn ContentFetcher>,
    /// Speech synthesizer
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Audio player
    pub player: Arc<dyn AudioPlayer>,
    /// Weather backend
    pub weather: Arc<dyn WeatherProvider>,
    /// Window host
    pub host: Arc<dyn WindowHost>,
    /// Link opener
    pub links: Arc<dyn LinkOpener>,
    /// Sprite picker
    pub picker: Arc<dyn AssetPicker>,
    /// Renderer
    pub presenter: Arc<dyn Presenter>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
