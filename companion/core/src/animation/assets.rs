//! Derived sprite assets
//!
//! Blink and mouth frames live next to the configured sprite:
//! `cat.png` → `cat_blink.png`, `cat_mouth1.png` … `cat_mouth3.png`.

use std::path::{Path, PathBuf};

/// Number of mouth frames in the talk-cycle
pub const MOUTH_FRAME_COUNT: usize = 3;

fn sibling_with_suffix(sprite: &Path, suffix: &str) -> PathBuf {
    let stem = sprite
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match sprite.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    sprite.with_file_name(name)
}

/// Blink frame path for a sprite
#[must_use]
pub fn derived_blink_frame(sprite: &Path) -> PathBuf {
    sibling_with_suffix(sprite, "blink")
}

/// Mouth frame paths for a sprite, in cycle order
#[must_use]
pub fn derived_mouth_frames(sprite: &Path) -> Vec<PathBuf> {
    (1..=MOUTH_FRAME_COUNT)
        .map(|n| sibling_with_suffix(sprite, &format!("mouth{n}")))
        .collect()
}

/// Every asset the choreographer may show
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpriteAssets {
    /// User-selected sprite
    pub sprite: Option<PathBuf>,
    /// Blink frame derived from the sprite
    pub blink: Option<PathBuf>,
    /// Mouth frames derived from the sprite
    pub mouth: Vec<PathBuf>,
    /// Transition visual (independent of the sprite)
    pub transition: Option<PathBuf>,
}

impl SpriteAssets {
    /// Assets with only a transition visual configured
    #[must_use]
    pub fn with_transition(transition: Option<PathBuf>) -> Self {
        Self {
            transition,
            ..Default::default()
        }
    }

    /// Replace the sprite and re-derive its blink and mouth frames
    pub fn set_sprite(&mut self, sprite: PathBuf) {
        self.blink = Some(derived_blink_frame(&sprite));
        self.mouth = derived_mouth_frames(&sprite);
        self.sprite = Some(sprite);
    }
}
