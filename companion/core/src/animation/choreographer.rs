//! Animation Choreographer
//!
//! Owns the four animation channels of the character surface and the
//! [`SpriteView`] they drive. All state is touched only from the owning
//! surface loop; timers report back through the loop's [`TimerFired`] inbox.
//!
//! # Channel rules
//!
//! - Blink and hop are self-rescheduling one-shots started at surface load.
//! - Talk-cycle restarts cancel the previous cycle before starting.
//! - At most one transition plays at a time. While it plays both base images
//!   are hidden; when it ends the visibility captured at its start is
//!   restored exactly. A re-trigger while playing restarts the timer but
//!   keeps the originally captured visibility.

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use super::{AnimationChannel, BaseVisibility, Easing, HopPose, Phase, SpriteAssets, SpriteView};
use crate::timer::{TimerChannel, TimerFired, TimerSlot};

/// Durations for every animation channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChoreographyTiming {
    /// Shortest delay before a blink
    pub blink_min: Duration,
    /// Longest delay before a blink (exclusive)
    pub blink_max: Duration,
    /// How long the blink frame stays up
    pub blink_hold: Duration,
    /// Shortest delay before a hop
    pub hop_min: Duration,
    /// Longest delay before a hop (exclusive)
    pub hop_max: Duration,
    /// Time to reach the apex and to land again
    pub hop_rise: Duration,
    /// Apex height in pixels
    pub hop_height_px: i32,
    /// Time each mouth frame is shown
    pub talk_frame: Duration,
    /// Length of the transition flourish
    pub transition: Duration,
}

impl Default for ChoreographyTiming {
    fn default() -> Self {
        Self {
            blink_min: Duration::from_millis(2000),
            blink_max: Duration::from_millis(5000),
            blink_hold: Duration::from_millis(200),
            hop_min: Duration::from_millis(10_000),
            hop_max: Duration::from_millis(20_000),
            hop_rise: Duration::from_millis(300),
            hop_height_px: 20,
            talk_frame: Duration::from_millis(150),
            transition: Duration::from_millis(1000),
        }
    }
}

/// What a transition trigger did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionStart {
    /// A new flourish started
    Started,
    /// A flourish was already playing; its timer was restarted
    Restarted,
    /// No transition asset is configured; nothing happened
    Skipped,
}

/// The character surface's animation state machines
#[derive(Debug)]
pub struct Choreographer {
    timing: ChoreographyTiming,
    assets: SpriteAssets,
    view: SpriteView,

    blink: TimerSlot,
    blink_release: TimerSlot,
    hop: TimerSlot,
    hop_land: TimerSlot,
    talk: TimerSlot,
    talk_frame: usize,
    utterance: Option<u64>,
    ended_utterance: u64,
    transition: TimerSlot,
    saved_visibility: Option<BaseVisibility>,

    rng: StdRng,
}

impl Choreographer {
    /// Create a choreographer with every channel idle
    pub fn new(
        timing: ChoreographyTiming,
        assets: SpriteAssets,
        timers: mpsc::Sender<TimerFired>,
    ) -> Self {
        let view = SpriteView {
            hop: HopPose::rest(timing.hop_rise),
            ..SpriteView::default()
        };
        Self {
            timing,
            assets,
            view,
            blink: TimerSlot::new(TimerChannel::Blink, timers.clone()),
            blink_release: TimerSlot::new(TimerChannel::BlinkRelease, timers.clone()),
            hop: TimerSlot::new(TimerChannel::Hop, timers.clone()),
            hop_land: TimerSlot::new(TimerChannel::HopLand, timers.clone()),
            talk: TimerSlot::new(TimerChannel::TalkCycle, timers.clone()),
            talk_frame: 0,
            utterance: None,
            ended_utterance: 0,
            transition: TimerSlot::new(TimerChannel::Transition, timers),
            saved_visibility: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a deterministic random source for idle delays
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Start the idle loops (blink and hop)
    pub fn start_idle(&mut self) {
        self.start_blink();
        self.start_hop();
    }

    /// Show a new sprite and re-derive its blink and mouth frames
    ///
    /// Blink is stopped before the assets change and restarted afterwards.
    /// If a transition is playing, the new sprite becomes what it restores.
    pub fn set_sprite(&mut self, path: PathBuf) {
        self.stop_blink();
        self.assets.set_sprite(path.clone());
        self.view.sprite = Some(path);

        let visible = BaseVisibility {
            sprite: true,
            placeholder: false,
        };
        match self.saved_visibility.as_mut() {
            Some(saved) => *saved = visible,
            None => self.view.visibility = visible,
        }

        self.start_blink();
    }

    // ========================================================================
    // Blink
    // ========================================================================

    /// Schedule the next blink
    ///
    /// A no-op when no sprite (and so no blink frame) is configured.
    pub fn start_blink(&mut self) {
        if self.assets.blink.is_none() {
            return;
        }
        let delay = self.random_delay(self.timing.blink_min, self.timing.blink_max);
        self.blink.start_once(delay);
    }

    /// Cancel blinking and hide the blink frame
    pub fn stop_blink(&mut self) {
        self.blink.cancel();
        self.blink_release.cancel();
        self.view.blink_overlay = None;
    }

    // ========================================================================
    // Hop
    // ========================================================================

    /// Schedule the next hop
    pub fn start_hop(&mut self) {
        let delay = self.random_delay(self.timing.hop_min, self.timing.hop_max);
        self.hop.start_once(delay);
    }

    /// Cancel hopping and return to rest
    pub fn stop_hop(&mut self) {
        self.hop.cancel();
        self.hop_land.cancel();
        self.view.hop = HopPose::rest(self.timing.hop_rise);
    }

    // ========================================================================
    // Talk-cycle
    // ========================================================================

    /// Start cycling mouth frames, replacing any running cycle
    pub fn start_talk_cycle(&mut self) {
        self.stop_talk_cycle();
        if self.assets.mouth.is_empty() {
            return;
        }
        self.talk.start_repeating(self.timing.talk_frame);
    }

    /// Stop the talk-cycle and hide the mouth overlay
    pub fn stop_talk_cycle(&mut self) {
        self.talk.cancel();
        self.talk_frame = 0;
        self.view.mouth_overlay = None;
    }

    /// An utterance started playing
    ///
    /// Speech signals travel on separate topics, so a begin can arrive
    /// after the end of the same utterance. Such a begin is ignored.
    pub fn speech_begins(&mut self, utterance: u64) {
        if utterance <= self.ended_utterance {
            tracing::debug!(utterance, "Ignoring begin of an utterance that already ended");
            return;
        }
        self.utterance = Some(utterance);
        self.start_talk_cycle();
    }

    /// An utterance finished or was interrupted
    ///
    /// The end of an older utterance never stops the cycle of a newer one.
    pub fn speech_ends(&mut self, utterance: u64) {
        self.ended_utterance = self.ended_utterance.max(utterance);
        if matches!(self.utterance, Some(active) if active > utterance) {
            tracing::debug!(utterance, "Ignoring end of a superseded utterance");
            return;
        }
        self.utterance = None;
        self.stop_talk_cycle();
    }

    // ========================================================================
    // Transition
    // ========================================================================

    /// Play the transition flourish
    pub fn play_transition(&mut self) -> TransitionStart {
        let Some(asset) = self.assets.transition.clone() else {
            return TransitionStart::Skipped;
        };

        let outcome = if self.transition.is_running() {
            TransitionStart::Restarted
        } else {
            self.saved_visibility = Some(self.view.visibility);
            TransitionStart::Started
        };

        self.view.visibility = BaseVisibility {
            sprite: false,
            placeholder: false,
        };
        self.view.transition_overlay = Some(asset);
        self.transition.start_once(self.timing.transition);
        outcome
    }

    fn finish_transition(&mut self) {
        self.view.transition_overlay = None;
        if let Some(saved) = self.saved_visibility.take() {
            self.view.visibility = saved;
        }
    }

    // ========================================================================
    // Timer dispatch
    // ========================================================================

    /// Apply a timer notification
    ///
    /// Returns the channel whose visuals changed, or `None` when the
    /// notification was stale or not ours.
    pub fn handle_timer(&mut self, fired: TimerFired) -> Option<AnimationChannel> {
        match fired.channel {
            TimerChannel::Blink if self.blink.accept(fired) => {
                self.view.blink_overlay = self.assets.blink.clone();
                self.blink_release.start_once(self.timing.blink_hold);
                self.start_blink();
                Some(AnimationChannel::Blink)
            }
            TimerChannel::BlinkRelease if self.blink_release.accept(fired) => {
                self.view.blink_overlay = None;
                Some(AnimationChannel::Blink)
            }
            TimerChannel::Hop if self.hop.accept(fired) => {
                self.view.hop = HopPose {
                    offset_px: -self.timing.hop_height_px,
                    duration: self.timing.hop_rise,
                    easing: Easing::EaseOut,
                };
                self.hop_land.start_once(self.timing.hop_rise);
                self.start_hop();
                Some(AnimationChannel::Hop)
            }
            TimerChannel::HopLand if self.hop_land.accept(fired) => {
                self.view.hop = HopPose::rest(self.timing.hop_rise);
                Some(AnimationChannel::Hop)
            }
            TimerChannel::TalkCycle if self.talk.accept(fired) => {
                let frames = self.assets.mouth.len();
                if frames == 0 {
                    return None;
                }
                self.view.mouth_overlay = Some(self.assets.mouth[self.talk_frame % frames].clone());
                self.talk_frame = (self.talk_frame + 1) % frames;
                Some(AnimationChannel::TalkCycle)
            }
            TimerChannel::Transition if self.transition.accept(fired) => {
                self.finish_transition();
                Some(AnimationChannel::Transition)
            }
            _ => None,
        }
    }

    /// Phase of a channel
    #[must_use]
    pub fn phase(&self, channel: AnimationChannel) -> Phase {
        let active = match channel {
            AnimationChannel::Blink => self.blink.is_running() || self.blink_release.is_running(),
            AnimationChannel::Hop => self.hop.is_running() || self.hop_land.is_running(),
            AnimationChannel::TalkCycle => self.talk.is_running(),
            AnimationChannel::Transition => self.transition.is_running(),
        };
        if active {
            Phase::Active
        } else {
            Phase::Idle
        }
    }

    /// Current render projection
    #[must_use]
    pub fn view(&self) -> &SpriteView {
        &self.view
    }

    /// Assets in use
    #[must_use]
    pub fn assets(&self) -> &SpriteAssets {
        &self.assets
    }

    /// Cancel every channel and clear every overlay
    pub fn shutdown(&mut self) {
        self.stop_blink();
        self.stop_hop();
        self.stop_talk_cycle();
        self.transition.cancel();
        self.finish_transition();
    }

    fn random_delay(&mut self, min: Duration, max: Duration) -> Duration {
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        if max_ms <= min_ms {
            return min;
        }
        Duration::from_millis(self.rng.gen_range(min_ms..max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::timer_channel;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    fn choreographer(transition: Option<&str>) -> (Choreographer, mpsc::Receiver<TimerFired>) {
        let (tx, rx) = timer_channel();
        let assets = SpriteAssets::with_transition(transition.map(PathBuf::from));
        (
            Choreographer::new(ChoreographyTiming::default(), assets, tx).with_seed(7),
            rx,
        )
    }

    /// Feed notifications until one changes the given channel
    async fn pump(
        choreo: &mut Choreographer,
        rx: &mut mpsc::Receiver<TimerFired>,
        channel: AnimationChannel,
    ) {
        loop {
            let fired = rx.recv().await.unwrap();
            if choreo.handle_timer(fired) == Some(channel) {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_blink_needs_a_sprite() {
        let (mut choreo, _rx) = choreographer(None);
        choreo.start_blink();
        assert_eq!(choreo.phase(AnimationChannel::Blink), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_shows_frame_then_hides() {
        let (mut choreo, mut rx) = choreographer(None);
        let start = Instant::now();
        choreo.set_sprite("pics/cat.png".into());
        assert_eq!(choreo.phase(AnimationChannel::Blink), Phase::Active);

        pump(&mut choreo, &mut rx, AnimationChannel::Blink).await;
        let shown_at = start.elapsed();
        assert!(shown_at >= Duration::from_millis(2000));
        assert!(shown_at < Duration::from_millis(5000));
        assert_eq!(
            choreo.view().blink_overlay,
            Some(PathBuf::from("pics/cat_blink.png"))
        );

        pump(&mut choreo, &mut rx, AnimationChannel::Blink).await;
        assert_eq!(start.elapsed() - shown_at, Duration::from_millis(200));
        assert_eq!(choreo.view().blink_overlay, None);
        assert_eq!(choreo.phase(AnimationChannel::Blink), Phase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hop_rises_and_lands() {
        let (mut choreo, mut rx) = choreographer(None);
        let start = Instant::now();
        choreo.start_hop();

        pump(&mut choreo, &mut rx, AnimationChannel::Hop).await;
        let apex_at = start.elapsed();
        assert!(apex_at >= Duration::from_millis(10_000));
        assert!(apex_at < Duration::from_millis(20_000));
        assert_eq!(choreo.view().hop.offset_px, -20);
        assert_eq!(choreo.view().hop.easing, Easing::EaseOut);

        pump(&mut choreo, &mut rx, AnimationChannel::Hop).await;
        assert_eq!(start.elapsed() - apex_at, Duration::from_millis(300));
        assert_eq!(choreo.view().hop.offset_px, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_talk_cycle_wraps_frames() {
        let (mut choreo, mut rx) = choreographer(None);
        choreo.set_sprite("cat.png".into());
        choreo.stop_blink();
        choreo.start_talk_cycle();

        let mut seen = Vec::new();
        for _ in 0..4 {
            pump(&mut choreo, &mut rx, AnimationChannel::TalkCycle).await;
            seen.push(choreo.view().mouth_overlay.clone().unwrap());
        }
        assert_eq!(
            seen,
            vec![
                PathBuf::from("cat_mouth1.png"),
                PathBuf::from("cat_mouth2.png"),
                PathBuf::from("cat_mouth3.png"),
                PathBuf::from("cat_mouth1.png"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_talk_cycle_restart_keeps_one_interval() {
        let (mut choreo, mut rx) = choreographer(None);
        choreo.set_sprite("cat.png".into());
        choreo.stop_blink();

        choreo.start_talk_cycle();
        tokio::time::advance(Duration::from_millis(100)).await;
        choreo.start_talk_cycle();

        let restarted = Instant::now();
        let mut frames = 0;
        while restarted.elapsed() < Duration::from_millis(600) {
            let fired = rx.recv().await.unwrap();
            if choreo.handle_timer(fired).is_some() {
                frames += 1;
            }
        }
        assert_eq!(frames, 4);
    }

    #[tokio::test]
    async fn test_stop_talk_cycle_hides_mouth() {
        let (mut choreo, _rx) = choreographer(None);
        choreo.set_sprite("cat.png".into());
        choreo.start_talk_cycle();
        assert_eq!(choreo.phase(AnimationChannel::TalkCycle), Phase::Active);

        choreo.stop_talk_cycle();
        choreo.stop_talk_cycle();
        assert_eq!(choreo.phase(AnimationChannel::TalkCycle), Phase::Idle);
        assert_eq!(choreo.view().mouth_overlay, None);
    }

    #[tokio::test]
    async fn test_stale_speech_end_keeps_newer_cycle() {
        let (mut choreo, _rx) = choreographer(None);
        choreo.set_sprite("cat.png".into());

        choreo.speech_begins(1);
        // Interrupt: the next utterance's begin overtakes the old end
        choreo.speech_begins(2);
        choreo.speech_ends(1);
        assert_eq!(choreo.phase(AnimationChannel::TalkCycle), Phase::Active);

        choreo.speech_ends(2);
        assert_eq!(choreo.phase(AnimationChannel::TalkCycle), Phase::Idle);
    }

    #[tokio::test]
    async fn test_in_order_interrupt_restarts_cycle() {
        let (mut choreo, _rx) = choreographer(None);
        choreo.set_sprite("cat.png".into());

        choreo.speech_begins(1);
        choreo.speech_ends(1);
        assert_eq!(choreo.phase(AnimationChannel::TalkCycle), Phase::Idle);
        choreo.speech_begins(2);
        assert_eq!(choreo.phase(AnimationChannel::TalkCycle), Phase::Active);
    }

    #[tokio::test]
    async fn test_late_begin_of_ended_utterance_is_ignored() {
        let (mut choreo, _rx) = choreographer(None);
        choreo.set_sprite("cat.png".into());

        choreo.speech_ends(4);
        choreo.speech_begins(4);
        assert_eq!(choreo.phase(AnimationChannel::TalkCycle), Phase::Idle);
        assert_eq!(choreo.view().mouth_overlay, None);
    }

    #[tokio::test]
    async fn test_transition_without_asset_is_skipped() {
        let (mut choreo, _rx) = choreographer(None);
        assert_eq!(choreo.play_transition(), TransitionStart::Skipped);
        assert_eq!(choreo.view().visibility, BaseVisibility::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_restores_placeholder_when_no_sprite() {
        let (mut choreo, mut rx) = choreographer(Some("flourish.gif"));
        let before = choreo.view().visibility;
        let start = Instant::now();

        assert_eq!(choreo.play_transition(), TransitionStart::Started);
        assert!(!choreo.view().visibility.sprite);
        assert!(!choreo.view().visibility.placeholder);

        pump(&mut choreo, &mut rx, AnimationChannel::Transition).await;
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
        assert_eq!(choreo.view().visibility, before);
        assert_eq!(choreo.view().transition_overlay, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_keeps_captured_visibility() {
        let (mut choreo, mut rx) = choreographer(Some("flourish.gif"));
        choreo.set_sprite("cat.png".into());
        choreo.stop_blink();

        choreo.play_transition();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(choreo.play_transition(), TransitionStart::Restarted);

        let restarted = Instant::now();
        pump(&mut choreo, &mut rx, AnimationChannel::Transition).await;
        assert_eq!(restarted.elapsed(), Duration::from_millis(1000));
        assert_eq!(
            choreo.view().visibility,
            BaseVisibility {
                sprite: true,
                placeholder: false
            }
        );
    }

    #[tokio::test]
    async fn test_sprite_set_during_transition_is_restored() {
        let (mut choreo, _rx) = choreographer(Some("flourish.gif"));
        choreo.play_transition();
        choreo.set_sprite("dog.png".into());
        assert!(!choreo.view().visibility.sprite);

        choreo.shutdown();
        assert!(choreo.view().visibility.sprite);
        assert!(!choreo.view().visibility.placeholder);
    }

    #[tokio::test]
    async fn test_shutdown_idles_every_channel() {
        let (mut choreo, _rx) = choreographer(Some("flourish.gif"));
        choreo.set_sprite("cat.png".into());
        choreo.start_idle();
        choreo.start_talk_cycle();
        choreo.play_transition();

        choreo.shutdown();
        for channel in [
            AnimationChannel::Blink,
            AnimationChannel::Hop,
            AnimationChannel::TalkCycle,
            AnimationChannel::Transition,
        ] {
            assert_eq!(choreo.phase(channel), Phase::Idle, "{channel:?}");
        }
        assert_eq!(choreo.view().hop.offset_px, 0);
    }
}
