//! Animation System
//!
//! Timer-driven animation channels for the character surface. Each channel is
//! a two-state machine (`Idle` ⇄ `Active`) owned by the
//! [`Choreographer`]; the surface only forwards timer notifications and bus
//! signals to it and renders the resulting [`SpriteView`].
//!
//! # Channels
//!
//! ```text
//! Blink       idle ──random 2-5s──► show blink 200ms ──► idle (repeats)
//! Hop         idle ──random 10-20s─► rise 300ms ──► land (repeats)
//! TalkCycle   speech-begins ──► mouth1 → mouth2 → mouth3 every 150ms ──► speech-ends
//! Transition  content-navigated ──► flourish 1000ms ──► restore sprite
//! ```

mod assets;
mod choreographer;

pub use assets::{derived_blink_frame, derived_mouth_frames, SpriteAssets, MOUTH_FRAME_COUNT};
pub use choreographer::{Choreographer, ChoreographyTiming, TransitionStart};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The four independent animation channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationChannel {
    /// Idle blink loop
    Blink,
    /// Lip motion while speech plays
    TalkCycle,
    /// Idle hop loop
    Hop,
    /// One-shot flourish before the bubble changes content
    Transition,
}

/// Phase of a single channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing scheduled
    #[default]
    Idle,
    /// Timer running or visual showing
    Active,
}

/// Easing curves the renderer applies to positional changes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// No easing (constant speed)
    #[default]
    Linear,
    /// Slow start, fast end
    EaseIn,
    /// Fast start, slow end
    EaseOut,
    /// Slow start and end
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(2),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Vertical offset of the character and how to get there
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopPose {
    /// Target offset in pixels (negative is up)
    pub offset_px: i32,
    /// Time the renderer should take to reach the target
    pub duration: Duration,
    /// Curve used to reach the target
    pub easing: Easing,
}

impl HopPose {
    /// Resting pose
    #[must_use]
    pub const fn rest(duration: Duration) -> Self {
        Self {
            offset_px: 0,
            duration,
            easing: Easing::EaseOut,
        }
    }

    /// Interpolated offset between `from` and this pose's target
    #[must_use]
    pub fn offset_at(&self, from: i32, progress: f32) -> f32 {
        let eased = self.easing.apply(progress);
        from as f32 + (self.offset_px - from) as f32 * eased
    }
}

/// Which base images are visible when no transition is playing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseVisibility {
    /// The user-selected sprite image
    pub sprite: bool,
    /// The built-in placeholder shown when no sprite was ever chosen
    pub placeholder: bool,
}

impl Default for BaseVisibility {
    fn default() -> Self {
        Self {
            sprite: false,
            placeholder: true,
        }
    }
}

/// Render projection of the character sprite
///
/// Overlay paths are derived without checking they exist; the renderer shows
/// nothing for a path it cannot load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteView {
    /// Configured sprite image
    pub sprite: Option<PathBuf>,
    /// Base image visibility
    pub visibility: BaseVisibility,
    /// Blink frame currently shown
    pub blink_overlay: Option<PathBuf>,
    /// Mouth frame currently shown
    pub mouth_overlay: Option<PathBuf>,
    /// Transition visual currently shown
    pub transition_overlay: Option<PathBuf>,
    /// Current hop pose
    pub hop: HopPose,
}

impl Default for SpriteView {
    fn default() -> Self {
        Self {
            sprite: None,
            visibility: BaseVisibility::default(),
            blink_overlay: None,
            mouth_overlay: None,
            transition_overlay: None,
            hop: HopPose::rest(Duration::from_millis(300)),
        }
    }
}
