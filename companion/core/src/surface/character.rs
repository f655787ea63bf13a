//! Character Surface
//!
//! Runs the [`Choreographer`], the settings dialog and sprite selection.
//! Reacts to `speech-begins`, `speech-ends` and `content-navigated` from the
//! bubble.

use std::path::PathBuf;

use tokio::sync::mpsc;

use super::{command_channel, restore_window, DragCommand, SurfaceContext, SurfaceHandle, SurfaceId, WindowDrag};
use crate::animation::{Choreographer, SpriteAssets};
use crate::bus::{BusEvent, Subscription, Topic};
use crate::error::FetchError;
use crate::frame::{CharacterFrame, Notice, SettingsDialogFrame, SurfaceFrame};
use crate::orchestrator::SaveOutcome;
use crate::position::{DragSession, RegionOrigin, ScreenRect, ScreenSize};
use crate::settings::{Settings, SettingsDialog};
use crate::store::{self, keys, KeyValueStore};
use crate::timer::{timer_channel, TimerFired};

/// Region name of the settings dialog
pub const SETTINGS_DIALOG_REGION: &str = "settings-dialog";

const SETTINGS_DIALOG_SIZE: ScreenSize = ScreenSize::new(280, 320);

/// Input for the character surface
#[derive(Clone, Debug, PartialEq)]
pub enum CharacterCommand {
    /// Drag the character window
    Drag(DragCommand),
    /// Drag the settings dialog inside the window
    DialogDrag(DragCommand),
    /// Open the settings dialog
    OpenSettings,
    /// Replace the dialog's draft values
    EditSettings(Settings),
    /// Save the draft and fetch the selected source
    SaveSettings,
    /// Close the dialog without saving
    CancelSettings,
    /// Ask the user for a sprite image
    SelectSprite,
    /// Raise all windows
    BringToFront,
    /// Close every surface and stop
    Quit,
}

enum Completion {
    SettingsSaved(Result<SaveOutcome, FetchError>),
    SpritePicked(Option<PathBuf>),
}

/// The character surface's owned state
pub struct CharacterSurface {
    ctx: SurfaceContext,
    choreo: Choreographer,
    dialog: SettingsDialog,
    dialog_origin: RegionOrigin,
    dialog_drag: Option<DragSession>,
    window_drag: WindowDrag,
    subscription: Subscription,
    timers: mpsc::Receiver<TimerFired>,
    inbox_tx: mpsc::Sender<Completion>,
    inbox: mpsc::Receiver<Completion>,
    picking_sprite: bool,
}

impl CharacterSurface {
    /// Create the surface and subscribe to its bus topics
    pub fn new(ctx: SurfaceContext) -> Self {
        let (timers_tx, timers) = timer_channel();
        let (inbox_tx, inbox) = mpsc::channel(8);
        let assets = SpriteAssets::with_transition(ctx.config.transition_asset.clone());
        let choreo = Choreographer::new(ctx.config.choreography, assets, timers_tx);
        let subscription = ctx.bus.subscribe(&[
            Topic::SpeechBegins,
            Topic::SpeechEnds,
            Topic::ContentNavigated,
        ]);
        Self {
            ctx,
            choreo,
            dialog: SettingsDialog::new(),
            dialog_origin: RegionOrigin::default(),
            dialog_drag: None,
            window_drag: WindowDrag::new(SurfaceId::Character),
            subscription,
            timers,
            inbox_tx,
            inbox,
            picking_sprite: false,
        }
    }

    /// Use a fixed seed for idle animation delays
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.choreo = self.choreo.with_seed(seed);
        self
    }

    /// Start the surface loop
    pub fn spawn(self) -> SurfaceHandle<CharacterCommand> {
        let (commands, rx) = command_channel();
        let task = tokio::spawn(self.run(rx));
        SurfaceHandle {
            id: SurfaceId::Character,
            commands,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<CharacterCommand>) {
        let mut shutdown = self.ctx.shutdown_signal();
        self.load().await;
        tracing::info!(surface = %SurfaceId::Character, "Surface ready");

        while !*shutdown.borrow() {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command).await {
                        break;
                    }
                }
                Some(event) = self.subscription.recv() => self.handle_event(event),
                Some(fired) = self.timers.recv() => {
                    if self.choreo.handle_timer(fired).is_some() {
                        self.render();
                    }
                }
                Some(done) = self.inbox.recv() => self.handle_completion(done).await,
                _ = shutdown.changed() => {}
            }
        }

        self.choreo.shutdown();
        tracing::info!(surface = %SurfaceId::Character, "Surface stopped");
    }

    async fn load(&mut self) {
        let host = self.ctx.collaborators.host.clone();
        restore_window(SurfaceId::Character, host.as_ref(), &self.ctx.positions).await;

        if let Some(path) = self.ctx.store.get(keys::SPRITE_PATH) {
            tracing::debug!(path = %path, "Restoring sprite");
            self.choreo.set_sprite(PathBuf::from(path));
        }
        self.choreo.start_idle();
        self.restore_dialog_origin().await;
        self.render();
    }

    async fn restore_dialog_origin(&mut self) {
        if self.ctx.positions.region(SETTINGS_DIALOG_REGION).is_none() {
            return;
        }
        let window = match self.ctx.collaborators.host.size(SurfaceId::Character).await {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read character window size");
                return;
            }
        };
        let bounds = ScreenRect::new(0, 0, window.width, window.height);
        if let Some(origin) =
            self.ctx
                .positions
                .restore_region(SETTINGS_DIALOG_REGION, SETTINGS_DIALOG_SIZE, bounds)
        {
            self.dialog_origin = origin;
        }
    }

    /// Returns `false` when the surface should stop
    async fn handle_command(&mut self, command: CharacterCommand) -> bool {
        match command {
            CharacterCommand::Drag(drag) => {
                let host = self.ctx.collaborators.host.clone();
                self.window_drag
                    .handle(drag, host.as_ref(), &self.ctx.positions)
                    .await;
                return true;
            }
            CharacterCommand::DialogDrag(drag) => self.drag_dialog(drag).await,
            CharacterCommand::OpenSettings => {
                self.dialog.open(self.ctx.orchestrator.current());
            }
            CharacterCommand::EditSettings(settings) => {
                if let Some(draft) = self.dialog.draft_mut() {
                    *draft = settings;
                }
            }
            CharacterCommand::SaveSettings => self.save_settings(),
            CharacterCommand::CancelSettings => self.dialog.cancel(),
            CharacterCommand::SelectSprite => self.select_sprite(),
            CharacterCommand::BringToFront => {
                let host = self.ctx.collaborators.host.clone();
                for surface in SurfaceId::ALL {
                    if let Err(e) = host.bring_to_front(surface).await {
                        tracing::warn!(surface = %surface, error = %e, "Could not raise window");
                    }
                }
                return true;
            }
            CharacterCommand::Quit => {
                self.quit().await;
                return false;
            }
        }
        self.render();
        true
    }

    fn handle_event(&mut self, event: BusEvent) {
        match event {
            BusEvent::SpeechBegins { utterance } => self.choreo.speech_begins(utterance),
            BusEvent::SpeechEnds { utterance } => self.choreo.speech_ends(utterance),
            BusEvent::ContentNavigated => {
                let outcome = self.choreo.play_transition();
                tracing::trace!(?outcome, "Transition triggered");
            }
            BusEvent::ContentReplaced { .. } => return,
        }
        self.render();
    }

    async fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::SettingsSaved(result) => {
                match result {
                    Ok(SaveOutcome::Published { items }) => {
                        tracing::info!(items, "Settings saved and content published");
                    }
                    Ok(SaveOutcome::NothingToFetch) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Fetch after settings save failed");
                        self.ctx.collaborators.presenter.alert(
                            SurfaceId::Character,
                            Notice::new("Could not fetch articles", e.to_string()),
                        );
                    }
                }
                self.dialog.finish_save();
            }
            Completion::SpritePicked(path) => {
                self.picking_sprite = false;
                let Some(path) = path else {
                    return;
                };
                let entry = (
                    keys::SPRITE_PATH.to_string(),
                    path.to_string_lossy().into_owned(),
                );
                if let Err(e) = store::persist(self.ctx.store.clone(), vec![entry]).await {
                    tracing::warn!(error = %e, "Could not persist sprite path");
                }
                tracing::info!(path = %path.display(), "Sprite selected");
                self.choreo.set_sprite(path);
            }
        }
        self.render();
    }

    async fn drag_dialog(&mut self, drag: DragCommand) {
        match drag {
            DragCommand::Start(pointer) => {
                if self.dialog.is_open() {
                    self.dialog_drag = Some(DragSession::begin(self.dialog_origin.into(), pointer));
                }
            }
            DragCommand::Move(pointer) => {
                if let Some(session) = self.dialog_drag {
                    self.dialog_origin = session.origin_at(pointer).into();
                }
            }
            DragCommand::End => {
                if self.dialog_drag.take().is_some() {
                    self.ctx
                        .positions
                        .save_region(SETTINGS_DIALOG_REGION, self.dialog_origin)
                        .await;
                }
            }
        }
    }

    fn save_settings(&mut self) {
        let Some(draft) = self.dialog.begin_save() else {
            return;
        };
        let orchestrator = self.ctx.orchestrator.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = orchestrator.save(&draft).await;
            let _ = inbox.send(Completion::SettingsSaved(result)).await;
        });
    }

    fn select_sprite(&mut self) {
        if self.picking_sprite {
            return;
        }
        self.picking_sprite = true;
        let picker = self.ctx.collaborators.picker.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let picked = picker.pick_sprite().await;
            let _ = inbox.send(Completion::SpritePicked(picked)).await;
        });
    }

    async fn quit(&mut self) {
        let host = self.ctx.collaborators.host.clone();
        for surface in [SurfaceId::Bubble, SurfaceId::Weather] {
            if let Err(e) = host.close(surface).await {
                tracing::warn!(surface = %surface, error = %e, "Window may already be closed");
            }
        }
        if let Err(e) = host.close(SurfaceId::Character).await {
            tracing::warn!(error = %e, "Could not close character window");
        }
        tracing::info!("Quit requested");
        self.ctx.request_shutdown();
    }

    fn frame(&self) -> CharacterFrame {
        CharacterFrame {
            sprite: self.choreo.view().clone(),
            settings_dialog: self.dialog.draft().map(|draft| SettingsDialogFrame {
                draft: draft.clone(),
                origin: self.dialog_origin,
                saving: self.dialog.is_saving(),
            }),
        }
    }

    fn render(&self) {
        self.ctx
            .collaborators
            .presenter
            .present(SurfaceFrame::Character(self.frame()));
    }
}
