//! Daemon Runner
//!
//! Spawns the three surface loops on one shared context and drives them from
//! line commands until `quit`, end of input or a shutdown signal.
//!
//! ```text
//!   stdin ──► parse ──► DaemonCommand
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//!      character         bubble          weather
//!          └────────── EventBus ────────────┘
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use companion_core::{
    BubbleCommand, BubbleSurface, CharacterCommand, CharacterSurface, ContentSourceKind,
    Settings, SurfaceContext, SurfaceHandle, WeatherCommand, WeatherSurface,
};

use crate::commands::{self, DaemonCommand};
use crate::headless::QueuedPicker;

/// The running surfaces
pub struct DaemonRunner {
    ctx: SurfaceContext,
    picker: Arc<QueuedPicker>,
    character: SurfaceHandle<CharacterCommand>,
    bubble: SurfaceHandle<BubbleCommand>,
    weather: SurfaceHandle<WeatherCommand>,
}

impl DaemonRunner {
    /// Spawn every surface
    pub fn start(ctx: SurfaceContext, picker: Arc<QueuedPicker>) -> Self {
        let character = CharacterSurface::new(ctx.clone()).spawn();
        let bubble = BubbleSurface::new(ctx.clone()).spawn();
        let weather = WeatherSurface::new(ctx.clone()).spawn();
        info!("Surfaces started");
        Self {
            ctx,
            picker,
            character,
            bubble,
            weather,
        }
    }

    /// Read commands until quit, end of input or shutdown
    pub async fn run<R>(self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut shutdown = self.ctx.shutdown_signal();

        while !*shutdown.borrow() {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    match commands::parse(&line) {
                        Ok(Some(command)) => self.dispatch(command).await,
                        Ok(None) => {}
                        Err(e) => warn!("{e}"),
                    }
                }
                _ = shutdown.changed() => {}
            }
        }

        self.stop().await;
        Ok(())
    }

    async fn dispatch(&self, command: DaemonCommand) {
        debug!(?command, "Command");
        let delivered = match command {
            DaemonCommand::Bubble(cmd) => self.bubble.send(cmd).await,
            DaemonCommand::Weather(cmd) => self.weather.send(cmd).await,
            DaemonCommand::Source(kind, value) => {
                let mut settings = self.ctx.orchestrator.current();
                settings.source_kind = kind;
                match kind {
                    ContentSourceKind::Rss => settings.feed_url = value,
                    ContentSourceKind::AuthorA => settings.author_a = value,
                    ContentSourceKind::AuthorB => settings.author_b = value,
                }
                self.save_settings(settings).await
            }
            DaemonCommand::Voice(voice_id) => {
                let mut settings = self.ctx.orchestrator.current();
                settings.voice_id = voice_id;
                self.save_settings(settings).await
            }
            DaemonCommand::Sprite(path) => {
                self.picker.queue(path);
                self.character.send(CharacterCommand::SelectSprite).await
            }
            DaemonCommand::BringToFront => self.character.send(CharacterCommand::BringToFront).await,
            DaemonCommand::Quit => self.character.send(CharacterCommand::Quit).await,
            DaemonCommand::Help => {
                println!("{}", commands::HELP);
                true
            }
        };
        if !delivered {
            warn!("Surface has stopped; command dropped");
        }
    }

    /// Headless saves go straight to the orchestrator; there is no dialog
    async fn save_settings(&self, settings: Settings) -> bool {
        match self.ctx.orchestrator.save(&settings).await {
            Ok(outcome) => info!(?outcome, "Settings applied"),
            Err(e) => warn!(error = %e, "Fetch after settings save failed"),
        }
        true
    }

    async fn stop(self) {
        self.ctx.request_shutdown();
        self.character.join().await;
        self.bubble.join().await;
        self.weather.join().await;
        info!("Surfaces stopped");
    }
}
