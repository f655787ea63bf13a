//! Bubble Surface
//!
//! Owns the [`Carousel`] and the speech pipeline. Publishes
//! `content-navigated` before every cursor move and brackets audio playback
//! with `speech-begins` / `speech-ends`.
//!
//! ```text
//! speak ─► Synthesizing ─► synthesize ─┬─ Ok  ─► Playing ─► play ─► Idle
//!   ▲                                  └─ Err ─► notice ─────────► Idle
//!   └── while Playing: stop player, speech-ends, start over
//! ```

use tokio::sync::mpsc;

use super::{command_channel, restore_window, DragCommand, SurfaceContext, SurfaceHandle, SurfaceId, WindowDrag};
use crate::bus::{BusEvent, Subscription, Topic};
use crate::carousel::{Carousel, Direction};
use crate::content::ContentItem;
use crate::error::{FetchError, PlaybackError, SynthesisError};
use crate::frame::{BubbleFrame, Notice, SpeakAffordance, SurfaceFrame};
use crate::timer::{timer_channel, TimerFired};

/// Input for the bubble surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleCommand {
    /// Show the next item
    Next,
    /// Show the previous item
    Previous,
    /// Click on the bubble body; same as [`Next`](Self::Next)
    Click,
    /// Read the current item aloud
    Speak,
    /// Open the current item's link
    OpenLink,
    /// Drag the bubble window
    Drag(DragCommand),
}

enum Completion {
    InitialItems(Result<Vec<ContentItem>, FetchError>),
    Synthesized {
        generation: u64,
        result: Result<Vec<u8>, SynthesisError>,
    },
    PlaybackEnded {
        generation: u64,
        result: Result<(), PlaybackError>,
    },
}

/// The bubble surface's owned state
pub struct BubbleSurface {
    ctx: SurfaceContext,
    carousel: Carousel,
    speak: SpeakAffordance,
    /// Bumped on every speak so late completions from an interrupted
    /// request are dropped
    speech_generation: u64,
    initial_pending: bool,
    window_drag: WindowDrag,
    subscription: Subscription,
    timers: mpsc::Receiver<TimerFired>,
    inbox_tx: mpsc::Sender<Completion>,
    inbox: mpsc::Receiver<Completion>,
}

impl BubbleSurface {
    /// Create the surface and subscribe to `content-replaced`
    pub fn new(ctx: SurfaceContext) -> Self {
        let (timers_tx, timers) = timer_channel();
        let (inbox_tx, inbox) = mpsc::channel(8);
        let carousel = Carousel::new(ctx.config.auto_advance, timers_tx);
        let subscription = ctx.bus.subscribe(&[Topic::ContentReplaced]);
        Self {
            ctx,
            carousel,
            speak: SpeakAffordance::Idle,
            speech_generation: 0,
            initial_pending: false,
            window_drag: WindowDrag::new(SurfaceId::Bubble),
            subscription,
            timers,
            inbox_tx,
            inbox,
        }
    }

    /// Start the surface loop
    pub fn spawn(self) -> SurfaceHandle<BubbleCommand> {
        let (commands, rx) = command_channel();
        let task = tokio::spawn(self.run(rx));
        SurfaceHandle {
            id: SurfaceId::Bubble,
            commands,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<BubbleCommand>) {
        let mut shutdown = self.ctx.shutdown_signal();
        self.load().await;
        tracing::info!(surface = %SurfaceId::Bubble, "Surface ready");

        while !*shutdown.borrow() {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command).await;
                }
                Some(event) = self.subscription.recv() => self.handle_event(event),
                Some(fired) = self.timers.recv() => {
                    if self.carousel.accept_tick(fired) {
                        self.navigate(Direction::Forward);
                    }
                }
                Some(done) = self.inbox.recv() => self.handle_completion(done),
                _ = shutdown.changed() => {}
            }
        }

        self.carousel.stop();
        if self.speak == SpeakAffordance::Playing {
            self.ctx.collaborators.player.stop();
        }
        tracing::info!(surface = %SurfaceId::Bubble, "Surface stopped");
    }

    async fn load(&mut self) {
        let host = self.ctx.collaborators.host.clone();
        restore_window(SurfaceId::Bubble, host.as_ref(), &self.ctx.positions).await;
        self.render();

        self.initial_pending = true;
        let orchestrator = self.ctx.orchestrator.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = orchestrator.fetch_initial().await;
            let _ = inbox.send(Completion::InitialItems(result)).await;
        });
    }

    async fn handle_command(&mut self, command: BubbleCommand) {
        match command {
            BubbleCommand::Next | BubbleCommand::Click => self.navigate(Direction::Forward),
            BubbleCommand::Previous => self.navigate(Direction::Backward),
            BubbleCommand::Speak => self.speak(),
            BubbleCommand::OpenLink => self.open_link(),
            BubbleCommand::Drag(drag) => {
                let host = self.ctx.collaborators.host.clone();
                self.window_drag
                    .handle(drag, host.as_ref(), &self.ctx.positions)
                    .await;
            }
        }
    }

    fn handle_event(&mut self, event: BusEvent) {
        let BusEvent::ContentReplaced { items } = event else {
            return;
        };
        if self.initial_pending {
            tracing::debug!("Content replaced before initial load finished");
            self.initial_pending = false;
        }
        self.carousel.load(items);
        self.render();
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::InitialItems(result) => {
                if !std::mem::take(&mut self.initial_pending) {
                    tracing::debug!("Dropping stale initial load");
                    return;
                }
                match result {
                    Ok(items) => self.carousel.load(items),
                    Err(e) => tracing::warn!(error = %e, "Initial content load failed"),
                }
            }
            Completion::Synthesized { generation, result } => {
                if generation != self.speech_generation {
                    return;
                }
                match result {
                    Ok(audio) => self.play(generation, audio),
                    Err(e) => {
                        tracing::error!(error = %e, "Speech synthesis failed");
                        self.ctx.collaborators.presenter.alert(
                            SurfaceId::Bubble,
                            Notice::new(
                                "Speech synthesis failed",
                                format!("{e}\n\nCheck that the speech backend is running."),
                            ),
                        );
                        self.end_speech();
                    }
                }
            }
            Completion::PlaybackEnded { generation, result } => {
                if generation != self.speech_generation || self.speak != SpeakAffordance::Playing {
                    return;
                }
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Playback failed");
                }
                self.end_speech();
            }
        }
        self.render();
    }

    /// Signal the transition first, then move the cursor
    fn navigate(&mut self, direction: Direction) {
        self.ctx.bus.publish(BusEvent::ContentNavigated);
        self.carousel.step(direction);
        tracing::trace!(cursor = self.carousel.cursor(), ?direction, "Navigated");
        self.render();
    }

    fn speak(&mut self) {
        match self.speak {
            SpeakAffordance::Synthesizing => return,
            SpeakAffordance::Playing => {
                self.ctx.collaborators.player.stop();
                self.end_speech();
            }
            SpeakAffordance::Idle => {}
        }

        self.speech_generation += 1;
        let generation = self.speech_generation;
        self.speak = SpeakAffordance::Synthesizing;

        let text = self.carousel.current().speech_text();
        let voice_id = self.ctx.orchestrator.current().voice_id;
        let synthesizer = self.ctx.collaborators.synthesizer.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = synthesizer.synthesize(&text, voice_id).await;
            let _ = inbox.send(Completion::Synthesized { generation, result }).await;
        });
        tracing::debug!(voice_id, generation, "Synthesizing speech");
        self.render();
    }

    fn play(&mut self, generation: u64, audio: Vec<u8>) {
        self.speak = SpeakAffordance::Playing;
        self.ctx.bus.publish(BusEvent::SpeechBegins {
            utterance: generation,
        });

        let player = self.ctx.collaborators.player.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = player.play(audio).await;
            let _ = inbox.send(Completion::PlaybackEnded { generation, result }).await;
        });
    }

    fn end_speech(&mut self) {
        self.speak = SpeakAffordance::Idle;
        self.ctx.bus.publish(BusEvent::SpeechEnds {
            utterance: self.speech_generation,
        });
    }

    fn open_link(&self) {
        let link = self.carousel.current().link.clone();
        if link.is_empty() {
            return;
        }
        let links = self.ctx.collaborators.links.clone();
        tokio::spawn(async move {
            if let Err(e) = links.open_external(&link).await {
                tracing::debug!(url = %link, error = %e, "Could not open link");
            }
        });
    }

    fn frame(&self) -> BubbleFrame {
        let item = self.carousel.current();
        BubbleFrame {
            text: item.display_text(),
            thumbnail: item.thumbnail().map(str::to_string),
            speak: self.speak,
            has_link: !item.link.is_empty(),
            index: self.carousel.cursor(),
            count: self.carousel.len(),
        }
    }

    fn render(&self) {
        self.ctx
            .collaborators
            .presenter
            .present(SurfaceFrame::Bubble(self.frame()));
    }
}
