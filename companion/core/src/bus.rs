//! Cross-Surface Event Bus
//!
//! Broadcast, fire-and-forget signalling between the character, bubble and
//! weather surfaces. Surfaces never touch each other's state; everything that
//! crosses a surface boundary travels as a [`BusEvent`].
//!
//! # Delivery Semantics
//!
//! - [`EventBus::publish`] returns immediately and never waits for a
//!   subscriber.
//! - At most once, best effort, no replay: an event published before a
//!   subscriber attaches is never seen by it. A subscriber that falls too far
//!   behind skips the events it missed.
//! - Order is preserved within a topic. Nothing is promised across topics,
//!   so events that must pair up across topics carry a correlation id
//!   (`utterance` on the speech events).
//!
//! # Architecture
//!
//! ```text
//!   publish(ContentReplaced) ──► [broadcast: content-replaced] ──┐
//!   publish(SpeechBegins)    ──► [broadcast: speech-begins]    ──┤ StreamMap
//!   publish(SpeechEnds)      ──► [broadcast: speech-ends]      ──┤ per surface
//!   publish(ContentNavigated)──► [broadcast: content-navigated]──┘
//! ```
//!
//! Each topic has its own broadcast channel. A [`Subscription`] merges the
//! topics a surface cares about so the surface can poll them from its own
//! loop alongside its timers and commands.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{StreamExt, StreamMap};

use crate::content::ContentItem;

/// Default per-topic buffer
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Topics carried by the bus
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// The bubble's item list was replaced
    ContentReplaced,
    /// Speech audio started playing
    SpeechBegins,
    /// Speech audio finished or was interrupted
    SpeechEnds,
    /// The bubble is about to show a different item
    ContentNavigated,
}

impl Topic {
    /// Every defined topic
    pub const ALL: [Topic; 4] = [
        Self::ContentReplaced,
        Self::SpeechBegins,
        Self::SpeechEnds,
        Self::ContentNavigated,
    ];

    /// Wire name of the topic
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ContentReplaced => "content-replaced",
            Self::SpeechBegins => "speech-begins",
            Self::SpeechEnds => "speech-ends",
            Self::ContentNavigated => "content-navigated",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events carried by the bus
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BusEvent {
    /// New item list for the bubble carousel
    ContentReplaced {
        /// The normalized items (may be empty)
        items: Vec<ContentItem>,
    },
    /// Start the talk-cycle
    SpeechBegins {
        /// Increasing id of the utterance now playing
        utterance: u64,
    },
    /// Stop the talk-cycle
    SpeechEnds {
        /// Id of the utterance that finished or was interrupted
        utterance: u64,
    },
    /// Play the transition flourish
    ContentNavigated,
}

impl BusEvent {
    /// Topic this event is published on
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::ContentReplaced { .. } => Topic::ContentReplaced,
            Self::SpeechBegins { .. } => Topic::SpeechBegins,
            Self::SpeechEnds { .. } => Topic::SpeechEnds,
            Self::ContentNavigated => Topic::ContentNavigated,
        }
    }
}

/// Shared handle to the bus
///
/// Cloning is cheap; all clones publish into the same topics.
#[derive(Clone, Debug)]
pub struct EventBus {
    topics: HashMap<Topic, broadcast::Sender<BusEvent>>,
}

impl EventBus {
    /// Create a bus with [`DEFAULT_BUS_CAPACITY`] slots per topic
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus with a custom per-topic buffer
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let topics = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();
        Self { topics }
    }

    /// Publish an event
    ///
    /// Returns the number of subscribers that will see it. Zero is not an
    /// error.
    pub fn publish(&self, event: BusEvent) -> usize {
        let topic = event.topic();
        let Some(tx) = self.topics.get(&topic) else {
            return 0;
        };
        match tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(topic = %topic, receivers, "Published bus event");
                receivers
            }
            Err(_) => {
                tracing::debug!(topic = %topic, "Published bus event with no subscribers");
                0
            }
        }
    }

    /// Subscribe to a set of topics
    ///
    /// Only events published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        let mut streams = StreamMap::new();
        for topic in topics {
            if let Some(tx) = self.topics.get(topic) {
                streams.insert(*topic, BroadcastStream::new(tx.subscribe()));
            }
        }
        Subscription { streams }
    }

    /// Number of live subscribers on a topic
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics
            .get(&topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A surface's view of the bus
pub struct Subscription {
    streams: StreamMap<Topic, BroadcastStream<BusEvent>>,
}

impl Subscription {
    /// Wait for the next event on any subscribed topic
    ///
    /// Returns `None` once every topic has closed. Lagged receivers log the
    /// number of dropped events and keep going.
    pub async fn recv(&mut self) -> Option<BusEvent> {
        loop {
            match self.streams.next().await? {
                (_, Ok(event)) => return Some(event),
                (topic, Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::warn!(topic = %topic, skipped, "Subscriber lagged, events dropped");
                }
            }
        }
    }

    /// Topics this subscription listens to
    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.streams.keys().copied()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topics", &self.streams.keys().collect::<Vec<_>>())
            .finish()
    }
}
