//! Weather Surface
//!
//! Fetches current conditions on load and on a repeating refresh timer.
//! Independent of the other surfaces; it never touches the bus.

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use super::{command_channel, restore_window, DragCommand, SurfaceContext, SurfaceHandle, SurfaceId, WindowDrag};
use crate::collaborators::WeatherReading;
use crate::error::FetchError;
use crate::frame::{SurfaceFrame, WeatherFrame};
use crate::timer::{timer_channel, TimerChannel, TimerFired, TimerSlot};
use crate::weather::{loading_frame, reading_frame, unavailable_frame};

/// Input for the weather surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherCommand {
    /// Fetch now
    Refresh,
    /// Drag the weather window
    Drag(DragCommand),
}

/// The weather surface's owned state
pub struct WeatherSurface {
    ctx: SurfaceContext,
    frame: WeatherFrame,
    refresh: TimerSlot,
    in_flight: bool,
    updated_at: Option<DateTime<Local>>,
    window_drag: WindowDrag,
    timers: mpsc::Receiver<TimerFired>,
    inbox_tx: mpsc::Sender<Result<WeatherReading, FetchError>>,
    inbox: mpsc::Receiver<Result<WeatherReading, FetchError>>,
}

impl WeatherSurface {
    /// Create the surface
    pub fn new(ctx: SurfaceContext) -> Self {
        let (timers_tx, timers) = timer_channel();
        let (inbox_tx, inbox) = mpsc::channel(4);
        let frame = loading_frame(&ctx.config.location_label);
        Self {
            ctx,
            frame,
            refresh: TimerSlot::new(TimerChannel::WeatherRefresh, timers_tx),
            in_flight: false,
            updated_at: None,
            window_drag: WindowDrag::new(SurfaceId::Weather),
            timers,
            inbox_tx,
            inbox,
        }
    }

    /// Start the surface loop
    pub fn spawn(self) -> SurfaceHandle<WeatherCommand> {
        let (commands, rx) = command_channel();
        let task = tokio::spawn(self.run(rx));
        SurfaceHandle {
            id: SurfaceId::Weather,
            commands,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<WeatherCommand>) {
        let mut shutdown = self.ctx.shutdown_signal();
        self.load().await;
        tracing::info!(surface = %SurfaceId::Weather, "Surface ready");

        while !*shutdown.borrow() {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command).await;
                }
                Some(fired) = self.timers.recv() => {
                    if self.refresh.accept(fired) {
                        self.fetch();
                    }
                }
                Some(result) = self.inbox.recv() => self.handle_reading(result),
                _ = shutdown.changed() => {}
            }
        }

        self.refresh.cancel();
        tracing::info!(surface = %SurfaceId::Weather, "Surface stopped");
    }

    async fn load(&mut self) {
        let host = self.ctx.collaborators.host.clone();
        restore_window(SurfaceId::Weather, host.as_ref(), &self.ctx.positions).await;
        self.render();
        self.fetch();
        self.refresh.start_repeating(self.ctx.config.weather_refresh);
    }

    async fn handle_command(&mut self, command: WeatherCommand) {
        match command {
            WeatherCommand::Refresh => self.fetch(),
            WeatherCommand::Drag(drag) => {
                let host = self.ctx.collaborators.host.clone();
                self.window_drag
                    .handle(drag, host.as_ref(), &self.ctx.positions)
                    .await;
            }
        }
    }

    /// At most one fetch runs at a time
    fn fetch(&mut self) {
        if self.in_flight {
            tracing::debug!("Weather fetch already running");
            return;
        }
        self.in_flight = true;
        let provider = self.ctx.collaborators.weather.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = provider.fetch_current().await;
            let _ = inbox.send(result).await;
        });
    }

    fn handle_reading(&mut self, result: Result<WeatherReading, FetchError>) {
        self.in_flight = false;
        self.frame = match result {
            Ok(reading) => {
                let now = Local::now();
                tracing::debug!(
                    temperature_c = reading.temperature_c,
                    code = reading.code,
                    at = %now.format("%H:%M"),
                    "Weather updated"
                );
                self.updated_at = Some(now);
                reading_frame(&self.ctx.config.location_label, &reading)
            }
            Err(e) => {
                let last = self.updated_at.map(|t| t.format("%H:%M").to_string());
                tracing::warn!(error = %e, last_update = ?last, "Weather fetch failed");
                unavailable_frame(&self.frame)
            }
        };
        self.render();
    }

    fn render(&self) {
        self.ctx
            .collaborators
            .presenter
            .present(SurfaceFrame::Weather(self.frame.clone()));
    }
}
