//! Content Carousel
//!
//! Ordered list of [`ContentItem`]s with a cursor and an auto-advance timer.
//! Owned by the bubble surface.
//!
//! # Invariants
//!
//! - `items` is never empty; loading an empty list substitutes
//!   [`ContentItem::welcome`].
//! - `0 <= cursor < items.len()` at all times; replacing the list resets the
//!   cursor to 0.
//! - Auto-advance runs only while more than one item is present, and every
//!   load or manual navigation restarts it from a full period.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::content::ContentItem;
use crate::timer::{TimerChannel, TimerFired, TimerSlot};

/// Default auto-advance period
pub const AUTO_ADVANCE_MS: u64 = 20_000;

/// Navigation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Next item (wraps to the first)
    Forward,
    /// Previous item (wraps to the last)
    Backward,
}

/// The bubble's rotating item list
#[derive(Debug)]
pub struct Carousel {
    items: Vec<ContentItem>,
    cursor: usize,
    period: Duration,
    auto_advance: TimerSlot,
}

impl Carousel {
    /// Create a carousel showing the welcome item
    pub fn new(period: Duration, timers: mpsc::Sender<TimerFired>) -> Self {
        Self {
            items: vec![ContentItem::welcome()],
            cursor: 0,
            period,
            auto_advance: TimerSlot::new(TimerChannel::AutoAdvance, timers),
        }
    }

    /// Replace the item list
    ///
    /// Resets the cursor to 0 and restarts auto-advance when there is more
    /// than one item.
    pub fn load(&mut self, items: Vec<ContentItem>) {
        self.items = if items.is_empty() {
            vec![ContentItem::welcome()]
        } else {
            items
        };
        self.cursor = 0;
        self.restart_auto_advance();
        tracing::debug!(items = self.items.len(), "Carousel loaded");
    }

    /// Move to the next item
    pub fn next(&mut self) {
        self.step(Direction::Forward);
    }

    /// Move to the previous item
    pub fn previous(&mut self) {
        self.step(Direction::Backward);
    }

    /// Move one step with wraparound and restart auto-advance
    pub fn step(&mut self, direction: Direction) {
        let len = self.items.len();
        self.cursor = match direction {
            Direction::Forward => (self.cursor + 1) % len,
            Direction::Backward => (self.cursor + len - 1) % len,
        };
        self.restart_auto_advance();
    }

    /// Check whether a timer notification is this carousel's auto-advance tick
    ///
    /// The caller treats an accepted tick exactly like a manual
    /// [`next`](Self::next), including any signalling that precedes it.
    pub fn accept_tick(&mut self, fired: TimerFired) -> bool {
        fired.channel == TimerChannel::AutoAdvance
            && self.auto_advance.accept(fired)
            && self.items.len() > 1
    }

    /// Stop auto-advance
    pub fn stop(&mut self) {
        self.auto_advance.cancel();
    }

    /// Item under the cursor
    #[must_use]
    pub fn current(&self) -> &ContentItem {
        &self.items[self.cursor]
    }

    /// Cursor position
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are loaded; an empty load still holds the welcome item
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items
    #[must_use]
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Whether an auto-advance timer is scheduled
    #[must_use]
    pub fn auto_advance_running(&self) -> bool {
        self.auto_advance.is_running()
    }

    /// Generation of the auto-advance slot
    #[must_use]
    pub fn auto_advance_generation(&self) -> u64 {
        self.auto_advance.generation()
    }

    fn restart_auto_advance(&mut self) {
        self.auto_advance.cancel();
        if self.items.len() > 1 {
            self.auto_advance.start_repeating(self.period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::timer_channel;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    fn items(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| ContentItem::new(format!("item {i}"), "body"))
            .collect()
    }

    fn carousel() -> (Carousel, mpsc::Receiver<TimerFired>) {
        let (tx, rx) = timer_channel();
        (
            Carousel::new(Duration::from_millis(AUTO_ADVANCE_MS), tx),
            rx,
        )
    }

    #[tokio::test]
    async fn test_starts_on_welcome() {
        let (carousel, _rx) = carousel();
        assert_eq!(carousel.len(), 1);
        assert_eq!(carousel.current(), &ContentItem::welcome());
        assert!(!carousel.auto_advance_running());
    }

    #[tokio::test]
    async fn test_load_empty_yields_placeholder() {
        let (mut carousel, _rx) = carousel();
        carousel.load(items(3));
        carousel.next();

        carousel.load(Vec::new());
        assert_eq!(carousel.len(), 1);
        assert!(!carousel.is_empty());
        assert_eq!(carousel.cursor(), 0);
        assert_eq!(carousel.current(), &ContentItem::welcome());
        assert!(!carousel.auto_advance_running());
    }

    #[tokio::test]
    async fn test_next_then_previous_wraps() {
        let (mut carousel, _rx) = carousel();
        carousel.load(items(3));
        assert_eq!(carousel.cursor(), 0);

        carousel.next();
        assert_eq!(carousel.cursor(), 1);

        carousel.previous();
        carousel.previous();
        assert_eq!(carousel.cursor(), 2);
    }

    #[tokio::test]
    async fn test_full_cycle_returns_to_start() {
        for len in 2..8 {
            let (mut carousel, _rx) = carousel();
            carousel.load(items(len));
            carousel.next();
            let start = carousel.cursor();
            for _ in 0..len {
                carousel.next();
            }
            assert_eq!(carousel.cursor(), start, "len {len}");
        }
    }

    #[tokio::test]
    async fn test_single_item_navigation_is_safe() {
        let (mut carousel, _rx) = carousel();
        carousel.load(items(1));
        carousel.next();
        carousel.previous();
        assert_eq!(carousel.cursor(), 0);
        assert!(!carousel.auto_advance_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_advance_period() {
        let (mut carousel, mut rx) = carousel();
        let start = Instant::now();
        carousel.load(items(2));

        let fired = rx.recv().await.unwrap();
        assert!(carousel.accept_tick(fired));
        assert_eq!(start.elapsed(), Duration::from_millis(AUTO_ADVANCE_MS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_restarts_auto_advance() {
        let (mut carousel, mut rx) = carousel();
        carousel.load(items(3));

        tokio::time::advance(Duration::from_millis(15_000)).await;
        let before = carousel.auto_advance_generation();
        carousel.next();
        assert_ne!(before, carousel.auto_advance_generation());

        let restarted = Instant::now();
        let fired = rx.recv().await.unwrap();
        assert!(carousel.accept_tick(fired));
        assert_eq!(restarted.elapsed(), Duration::from_millis(AUTO_ADVANCE_MS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_never_doubles_rate() {
        let (mut carousel, mut rx) = carousel();
        carousel.load(items(3));
        carousel.load(items(5));
        carousel.load(items(4));

        let start = Instant::now();
        let mut accepted = 0;
        while start.elapsed() < Duration::from_millis(AUTO_ADVANCE_MS * 3) {
            let fired = rx.recv().await.unwrap();
            if carousel.accept_tick(fired) {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 3);
    }
}
