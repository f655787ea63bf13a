//! Surfaces
//!
//! The three on-screen surfaces each run as their own tokio task that owns
//! all of its state. Nothing is shared between surfaces except the
//! [`EventBus`] and the persisted store.
//!
//! ```text
//!  ┌────────────┐  speech-begins / speech-ends  ┌─────────────┐
//!  │ character  │◄──────────────────────────────│   bubble    │
//!  │ (choreo,   │◄──── content-navigated ───────│ (carousel,  │
//!  │  settings) │                               │  speech)    │
//!  └─────┬──────┘                               └──────▲──────┘
//!        │ save settings → orchestrator → content-replaced
//!        └──────────────────────────────────────────────┘
//!  ┌────────────┐
//!  │  weather   │  (independent: fetch + refresh timer)
//!  └────────────┘
//! ```
//!
//! Each loop selects over its command channel, its bus subscription, its
//! timer inbox and an inbox for slow collaborator calls that were spawned
//! off the loop. Every handler finishes with a render.

mod bubble;
mod character;
mod weather;

pub use bubble::{BubbleCommand, BubbleSurface};
pub use character::{CharacterCommand, CharacterSurface, SETTINGS_DIALOG_REGION};
pub use weather::{WeatherCommand, WeatherSurface};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::bus::EventBus;
use crate::collaborators::{Collaborators, WindowHost};
use crate::config::CompanionConfig;
use crate::orchestrator::Orchestrator;
use crate::position::{DragSession, PositionStore, ScreenPoint};
use crate::store::KeyValueStore;

/// Command queue depth per surface
const COMMAND_BUFFER: usize = 32;

/// The three surfaces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceId {
    /// Character sprite
    Character,
    /// Speech bubble
    Bubble,
    /// Weather readout
    Weather,
}

impl SurfaceId {
    /// Every surface
    pub const ALL: [SurfaceId; 3] = [Self::Character, Self::Bubble, Self::Weather];

    /// Stable name used for window labels and store keys
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Bubble => "bubble",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pointer drag input shared by every surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragCommand {
    /// Button pressed at this screen position
    Start(ScreenPoint),
    /// Pointer moved to this screen position
    Move(ScreenPoint),
    /// Button released
    End,
}

/// Everything a surface needs from the outside world
#[derive(Clone)]
pub struct SurfaceContext {
    /// Cross-surface bus
    pub bus: EventBus,
    /// External collaborators
    pub collaborators: Collaborators,
    /// Persisted store
    pub store: Arc<dyn KeyValueStore>,
    /// Saved positions
    pub positions: PositionStore,
    /// Settings and fetch
    pub orchestrator: Orchestrator,
    /// Engine configuration
    pub config: Arc<CompanionConfig>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SurfaceContext {
    /// Build the shared context for one running instance
    pub fn new(
        config: CompanionConfig,
        store: Arc<dyn KeyValueStore>,
        collaborators: Collaborators,
    ) -> Self {
        let bus = EventBus::with_capacity(config.bus_capacity);
        let orchestrator = Orchestrator::new(
            store.clone(),
            collaborators.fetcher.clone(),
            bus.clone(),
            config.default_feed_url.clone(),
        );
        let (shutdown, _) = watch::channel(false);
        Self {
            bus,
            positions: PositionStore::new(store.clone()),
            store,
            collaborators,
            orchestrator,
            config: Arc::new(config),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Ask every surface loop to stop
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether shutdown was requested
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Receiver that changes when shutdown is requested
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

impl fmt::Debug for SurfaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A running surface loop
pub struct SurfaceHandle<C> {
    id: SurfaceId,
    commands: mpsc::Sender<C>,
    task: JoinHandle<()>,
}

impl<C: Send + 'static> SurfaceHandle<C> {
    /// Which surface this is
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Queue a command; `false` if the surface has stopped
    pub async fn send(&self, command: C) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Whether the loop has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(surface = %self.id, error = %e, "Surface task failed");
        }
    }
}

fn command_channel<C>() -> (mpsc::Sender<C>, mpsc::Receiver<C>) {
    mpsc::channel(COMMAND_BUFFER)
}

/// Restore a surface window to its saved (clamped) position
pub(crate) async fn restore_window(surface: SurfaceId, host: &dyn WindowHost, positions: &PositionStore) {
    if positions.surface(surface).is_none() {
        return;
    }
    let size = match host.size(surface).await {
        Ok(size) => size,
        Err(e) => {
            tracing::warn!(surface = %surface, error = %e, "Could not read window size");
            return;
        }
    };
    let screen = match host.screen_bounds(surface).await {
        Ok(screen) => screen,
        Err(e) => {
            tracing::warn!(surface = %surface, error = %e, "Could not read screen bounds");
            return;
        }
    };
    let Some(origin) = positions.restore_surface(surface, size, screen) else {
        return;
    };
    match host.set_position(surface, origin).await {
        Ok(()) => tracing::debug!(surface = %surface, x = origin.x, y = origin.y, "Restored window position"),
        Err(e) => tracing::warn!(surface = %surface, error = %e, "Could not restore window position"),
    }
}

/// Window drag state for one surface
#[derive(Debug)]
pub(crate) struct WindowDrag {
    surface: SurfaceId,
    session: Option<DragSession>,
    last_origin: Option<ScreenPoint>,
}

impl WindowDrag {
    pub(crate) fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            session: None,
            last_origin: None,
        }
    }

    pub(crate) async fn handle(
        &mut self,
        command: DragCommand,
        host: &dyn WindowHost,
        positions: &PositionStore,
    ) {
        match command {
            DragCommand::Start(pointer) => match host.position(self.surface).await {
                Ok(origin) => {
                    self.session = Some(DragSession::begin(origin, pointer));
                    self.last_origin = Some(origin);
                }
                Err(e) => {
                    tracing::warn!(surface = %self.surface, error = %e, "Could not start drag");
                    self.session = None;
                }
            },
            DragCommand::Move(pointer) => {
                let Some(session) = self.session else {
                    return;
                };
                let origin = session.origin_at(pointer);
                if let Err(e) = host.set_position(self.surface, origin).await {
                    tracing::warn!(surface = %self.surface, error = %e, "Could not move window");
                    return;
                }
                self.last_origin = Some(origin);
            }
            DragCommand::End => {
                if self.session.take().is_none() {
                    return;
                }
                let origin = match host.position(self.surface).await {
                    Ok(origin) => Some(origin),
                    Err(e) => {
                        tracing::warn!(surface = %self.surface, error = %e, "Could not read final position");
                        self.last_origin
                    }
                };
                if let Some(origin) = origin {
                    positions.save_surface(self.surface, origin).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_names() {
        let names: Vec<_> = SurfaceId::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["character", "bubble", "weather"]);
        assert_eq!(SurfaceId::Bubble.to_string(), "bubble");
    }
}
