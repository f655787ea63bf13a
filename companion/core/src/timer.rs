//! Timer Slots
//!
//! Every time-driven behaviour on a surface (auto-advance, blink, hop,
//! talk-cycle, transition, weather refresh) owns exactly one [`TimerSlot`].
//! A slot spawns a small tokio task that posts [`TimerFired`] back into the
//! owning surface's loop; the loop hands the notification to the slot's owner,
//! which checks it with [`TimerSlot::accept`].
//!
//! # Invariants
//!
//! - Starting a slot always cancels whatever it was running first, so a
//!   channel never has two live timers.
//! - Cancelling bumps the slot generation. A notification that was already
//!   queued when the slot was cancelled or restarted carries the old
//!   generation and is rejected by `accept`.
//! - Cancelling an idle slot is a no-op.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Which timer a notification belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerChannel {
    /// Carousel auto-advance
    AutoAdvance,
    /// Next blink is due
    Blink,
    /// Blink frame has been shown long enough
    BlinkRelease,
    /// Next hop is due
    Hop,
    /// Hop has reached its apex and should land
    HopLand,
    /// Next mouth frame of the talk-cycle
    TalkCycle,
    /// Transition flourish has played out
    Transition,
    /// Weather readout refresh
    WeatherRefresh,
}

impl fmt::Display for TimerChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AutoAdvance => "auto-advance",
            Self::Blink => "blink",
            Self::BlinkRelease => "blink-release",
            Self::Hop => "hop",
            Self::HopLand => "hop-land",
            Self::TalkCycle => "talk-cycle",
            Self::Transition => "transition",
            Self::WeatherRefresh => "weather-refresh",
        };
        f.write_str(name)
    }
}

/// Notification that a timer elapsed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerFired {
    /// Channel that fired
    pub channel: TimerChannel,
    /// Generation of the slot when the timer was started
    pub generation: u64,
}

/// Create the channel a surface uses to receive its timer notifications
pub fn timer_channel() -> (mpsc::Sender<TimerFired>, mpsc::Receiver<TimerFired>) {
    mpsc::channel(64)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotMode {
    Idle,
    Once,
    Repeating,
}

/// A single cancellable timer owned by one animation or carousel channel
pub struct TimerSlot {
    channel: TimerChannel,
    generation: u64,
    mode: SlotMode,
    task: Option<JoinHandle<()>>,
    tx: mpsc::Sender<TimerFired>,
}

impl TimerSlot {
    /// Create an idle slot that reports into `tx`
    pub fn new(channel: TimerChannel, tx: mpsc::Sender<TimerFired>) -> Self {
        Self {
            channel,
            generation: 0,
            mode: SlotMode::Idle,
            task: None,
            tx,
        }
    }

    /// Channel this slot serves
    #[must_use]
    pub fn channel(&self) -> TimerChannel {
        self.channel
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a timer is scheduled
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.mode != SlotMode::Idle
    }

    /// Fire once after `delay`, replacing any running timer
    pub fn start_once(&mut self, delay: Duration) {
        self.cancel();
        let fired = self.next_notification();
        let tx = self.tx.clone();
        let deadline = Instant::now() + delay;
        self.task = Some(tokio::spawn(async move {
            time::sleep_until(deadline).await;
            let _ = tx.send(fired).await;
        }));
        self.mode = SlotMode::Once;
    }

    /// Fire every `period` until cancelled, replacing any running timer
    ///
    /// The first notification arrives one full period after the call.
    pub fn start_repeating(&mut self, period: Duration) {
        self.cancel();
        let fired = self.next_notification();
        let tx = self.tx.clone();
        let first = Instant::now() + period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(fired).await.is_err() {
                    break;
                }
            }
        }));
        self.mode = SlotMode::Repeating;
    }

    /// Stop the timer
    ///
    /// Returns `true` if something was running. Safe to call on an idle slot.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.is_running();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if was_running {
            self.generation = self.generation.wrapping_add(1);
        }
        self.mode = SlotMode::Idle;
        was_running
    }

    /// Check whether a notification is current for this slot
    ///
    /// Stale notifications (wrong channel, or from a cancelled/restarted
    /// timer) return `false`. A one-shot timer goes idle once its
    /// notification is accepted.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        if fired.channel != self.channel
            || fired.generation != self.generation
            || self.mode == SlotMode::Idle
        {
            return false;
        }
        if self.mode == SlotMode::Once {
            self.task = None;
            self.mode = SlotMode::Idle;
            self.generation = self.generation.wrapping_add(1);
        }
        true
    }

    fn next_notification(&self) -> TimerFired {
        TimerFired {
            channel: self.channel,
            generation: self.generation,
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl fmt::Debug for TimerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSlot")
            .field("channel", &self.channel)
            .field("generation", &self.generation)
            .field("mode", &self.mode)
            .finish()
    }
}
