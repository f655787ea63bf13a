//! Surface Positions
//!
//! Screen coordinates for each surface window and for draggable regions
//! inside a surface, persisted in the [`KeyValueStore`] and clamped on
//! restore so something is always left on screen to grab.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{self, keys, KeyValueStore};
use crate::surface::SurfaceId;

/// Pixels of a surface that must stay inside the screen on every edge
pub const MIN_VISIBLE_MARGIN: i32 = 50;

/// A window origin in screen coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal coordinate
    pub x: i32,
    /// Vertical coordinate
    pub y: i32,
}

impl ScreenPoint {
    /// Create a point
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Origin of a region inside a surface
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOrigin {
    /// Offset from the surface's left edge
    pub left: i32,
    /// Offset from the surface's top edge
    pub top: i32,
}

impl From<RegionOrigin> for ScreenPoint {
    fn from(origin: RegionOrigin) -> Self {
        Self::new(origin.left, origin.top)
    }
}

impl From<ScreenPoint> for RegionOrigin {
    fn from(point: ScreenPoint) -> Self {
        Self {
            left: point.x,
            top: point.y,
        }
    }
}

/// Width and height in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl ScreenSize {
    /// Create a size
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// A rectangle on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    /// Top-left corner
    pub origin: ScreenPoint,
    /// Extent
    pub size: ScreenSize,
}

impl ScreenRect {
    /// Create a rectangle
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: ScreenPoint::new(x, y),
            size: ScreenSize::new(width, height),
        }
    }
}

fn clamp_axis(value: i32, extent: i32, screen_start: i32, screen_extent: i32) -> i32 {
    let margin = MIN_VISIBLE_MARGIN.min(extent.max(0));
    let lowest = screen_start - extent + margin;
    let highest = screen_start + screen_extent - margin;
    value.max(lowest).min(highest)
}

/// Shift an origin just far enough that at least [`MIN_VISIBLE_MARGIN`]
/// pixels of the element overlap the screen on both axes
///
/// Elements smaller than the margin must be fully on screen. Positions
/// already satisfying the margin are returned unchanged.
#[must_use]
pub fn clamp_to_screen(origin: ScreenPoint, size: ScreenSize, screen: ScreenRect) -> ScreenPoint {
    ScreenPoint {
        x: clamp_axis(origin.x, size.width, screen.origin.x, screen.size.width),
        y: clamp_axis(origin.y, size.height, screen.origin.y, screen.size.height),
    }
}

/// An in-progress drag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragSession {
    start_origin: ScreenPoint,
    pointer_start: ScreenPoint,
}

impl DragSession {
    /// Capture the element origin and pointer position at drag start
    #[must_use]
    pub const fn begin(start_origin: ScreenPoint, pointer_start: ScreenPoint) -> Self {
        Self {
            start_origin,
            pointer_start,
        }
    }

    /// Origin for the current pointer position
    #[must_use]
    pub fn origin_at(&self, pointer: ScreenPoint) -> ScreenPoint {
        ScreenPoint {
            x: self.start_origin.x + (pointer.x - self.pointer_start.x),
            y: self.start_origin.y + (pointer.y - self.pointer_start.y),
        }
    }
}

/// Saved positions in the persisted store
#[derive(Clone, Debug)]
pub struct PositionStore {
    store: Arc<dyn KeyValueStore>,
}

impl PositionStore {
    /// Wrap a store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved window origin of a surface
    ///
    /// An undecodable value is logged and treated as absent.
    #[must_use]
    pub fn surface(&self, surface: SurfaceId) -> Option<ScreenPoint> {
        self.load(&keys::position(surface.name()))
    }

    /// Persist a surface's window origin
    pub async fn save_surface(&self, surface: SurfaceId, origin: ScreenPoint) {
        self.save(keys::position(surface.name()), &origin).await;
    }

    /// Saved window origin, clamped to the given screen
    #[must_use]
    pub fn restore_surface(
        &self,
        surface: SurfaceId,
        size: ScreenSize,
        screen: ScreenRect,
    ) -> Option<ScreenPoint> {
        self.surface(surface)
            .map(|origin| clamp_to_screen(origin, size, screen))
    }

    /// Saved origin of a region inside a surface
    #[must_use]
    pub fn region(&self, region: &str) -> Option<RegionOrigin> {
        self.load(&keys::region(region))
    }

    /// Persist a region's origin
    pub async fn save_region(&self, region: &str, origin: RegionOrigin) {
        self.save(keys::region(region), &origin).await;
    }

    /// Saved region origin, clamped to the surface it lives in
    #[must_use]
    pub fn restore_region(
        &self,
        region: &str,
        size: ScreenSize,
        bounds: ScreenRect,
    ) -> Option<RegionOrigin> {
        self.region(region)
            .map(|origin| clamp_to_screen(origin.into(), size, bounds).into())
    }

    fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable saved position");
                None
            }
        }
    }

    async fn save<T: Serialize>(&self, key: String, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Could not encode position");
                return;
            }
        };
        if let Err(e) = store::persist(self.store.clone(), vec![(key.clone(), encoded)]).await {
            tracing::warn!(key = %key, error = %e, "Could not persist position");
        }
    }
}
