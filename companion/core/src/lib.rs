//! Companion Core - Cross-Surface Coordination for the Desktop Companion
//!
//! Three borderless surfaces (a character sprite, a speech bubble with
//! rotating content and a small weather readout) behave as one character
//! with no shared memory between them. This crate is the engine behind
//! them: the pub/sub bus, the carousel, the animation state machines and
//! the settings/fetch orchestration. Rendering, windowing, networking and
//! audio are collaborators behind traits.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Collaborators                              │
//! │  fetcher · synthesizer · player · weather · host · links · picker │
//! │                          presenter                                │
//! └──────────┬──────────────────┬──────────────────────┬──────────────┘
//!            │                  │                      │
//!   ┌────────┴───────┐  ┌───────┴────────┐   ┌─────────┴──────┐
//!   │   character    │  │     bubble     │   │    weather     │
//!   │  Choreographer │  │    Carousel    │   │  refresh timer │
//!   │ SettingsDialog │  │  speech state  │   │                │
//!   └────────┬───────┘  └───────┬────────┘   └────────────────┘
//!            │                  │
//!            └──── EventBus ────┘  content-replaced · speech-begins
//!                                  speech-ends · content-navigated
//! ```
//!
//! Each surface is a tokio task owning its own state. The only things they
//! share are the [`EventBus`] and the persisted [`KeyValueStore`].
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use companion_core::{
//!     BubbleSurface, CharacterSurface, CompanionConfig, MemoryStore, SurfaceContext,
//!     WeatherSurface,
//! };
//!
//! let ctx = SurfaceContext::new(CompanionConfig::new(), Arc::new(MemoryStore::new()), collaborators);
//! let character = CharacterSurface::new(ctx.clone()).spawn();
//! let bubble = BubbleSurface::new(ctx.clone()).spawn();
//! let weather = WeatherSurface::new(ctx.clone()).spawn();
//! ```
//!
//! # Module Overview
//!
//! - [`bus`]: Topic-keyed broadcast bus between surfaces
//! - [`carousel`]: Item list, cursor and auto-advance
//! - [`animation`]: Blink, talk cycle, hop and transition choreography
//! - [`timer`]: One cancellable timer per channel
//! - [`orchestrator`]: Persist settings and fetch the selected source
//! - [`settings`]: Stored settings and the settings dialog state
//! - [`position`]: Clamping, drag and persisted positions
//! - [`store`]: Flat key/value persistence
//! - [`surface`]: The three surface event loops
//! - [`collaborators`]: Traits for everything outside the engine
//! - [`config`]: TOML + environment configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod bus;
pub mod carousel;
pub mod collaborators;
pub mod config;
pub mod content;
pub mod error;
pub mod frame;
pub mod orchestrator;
pub mod position;
pub mod settings;
pub mod store;
pub mod surface;
pub mod timer;
pub mod weather;

// Re-exports for convenience
pub use animation::{
    BaseVisibility, Choreographer, ChoreographyTiming, Easing, Phase, SpriteAssets, SpriteView,
    TransitionStart,
};
pub use bus::{BusEvent, EventBus, Subscription, Topic};
pub use carousel::{Carousel, Direction};
pub use collaborators::{
    AssetPicker, AudioPlayer, AuthorSource, Collaborators, ContentFetcher, LinkOpener, Presenter,
    SpeechSynthesizer, WeatherProvider, WeatherReading, WindowHost,
};
pub use content::ContentItem;
pub use error::{FetchError, HostError, PlaybackError, StoreError, SynthesisError};
pub use frame::{BubbleFrame, CharacterFrame, Notice, SpeakAffordance, SurfaceFrame, WeatherFrame};
pub use orchestrator::{Orchestrator, SaveOutcome};
pub use position::{PositionStore, RegionOrigin, ScreenPoint, ScreenRect, ScreenSize};
pub use settings::{ContentSourceKind, Settings, SettingsDialog};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use surface::{
    BubbleCommand, BubbleSurface, CharacterCommand, CharacterSurface, DragCommand,
    SurfaceContext, SurfaceHandle, SurfaceId, WeatherCommand, WeatherSurface,
};
pub use timer::{TimerChannel, TimerFired, TimerSlot};

// Config exports
pub use config::{
    default_config_path, default_state_path, load_config, load_config_from_path,
    CompanionConfig, CompanionToml, ConfigError, ConfigSource,
};
