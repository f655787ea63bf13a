//! Render Frames
//!
//! Pure projections of surface state handed to the [`Presenter`]. Building a
//! frame never changes state.
//!
//! [`Presenter`]: crate::collaborators::Presenter

use serde::{Deserialize, Serialize};

use crate::animation::SpriteView;
use crate::position::RegionOrigin;
use crate::settings::Settings;
use crate::surface::SurfaceId;

/// State of the bubble's speak button
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeakAffordance {
    /// Ready to speak
    #[default]
    Idle,
    /// Waiting for the synthesizer; presses are ignored
    Synthesizing,
    /// Audio is playing; a press interrupts and starts over
    Playing,
}

impl SpeakAffordance {
    /// Button label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Speak",
            Self::Synthesizing => "Synthesizing...",
            Self::Playing => "Playing...",
        }
    }

    /// Whether a press does anything
    #[must_use]
    pub fn enabled(self) -> bool {
        self != Self::Synthesizing
    }
}

/// What the character surface shows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterFrame {
    /// Sprite and overlays
    pub sprite: SpriteView,
    /// Settings dialog, when open
    pub settings_dialog: Option<SettingsDialogFrame>,
}

/// The settings dialog region
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDialogFrame {
    /// Values in the editable fields
    pub draft: Settings,
    /// Where the dialog sits inside the surface
    pub origin: RegionOrigin,
    /// Fields and buttons are locked while a save runs
    pub saving: bool,
}

/// What the bubble surface shows
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleFrame {
    /// Title, description and source label
    pub text: String,
    /// Thumbnail image, if the item has one
    pub thumbnail: Option<String>,
    /// Speak button state
    pub speak: SpeakAffordance,
    /// Whether the open-link button has a target
    pub has_link: bool,
    /// Cursor position (0-based)
    pub index: usize,
    /// Number of items in the carousel
    pub count: usize,
}

/// What the weather surface shows
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherFrame {
    /// Temperature readout, e.g. `"21°C"`
    pub temperature: String,
    /// Location and condition, e.g. `"Tokyo: mainly clear"`
    pub description: String,
}

/// A frame for any surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SurfaceFrame {
    /// Character surface frame
    Character(CharacterFrame),
    /// Bubble surface frame
    Bubble(BubbleFrame),
    /// Weather surface frame
    Weather(WeatherFrame),
}

impl SurfaceFrame {
    /// Surface this frame belongs to
    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        match self {
            Self::Character(_) => SurfaceId::Character,
            Self::Bubble(_) => SurfaceId::Bubble,
            Self::Weather(_) => SurfaceId::Weather,
        }
    }
}

/// A blocking message for the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Short headline
    pub title: String,
    /// Details
    pub message: String,
}

impl Notice {
    /// Create a notice
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}
