//! User Settings
//!
//! The content source selection and speech voice, stored as flat keys in
//! the [`KeyValueStore`], plus the draft state of the settings dialog on the
//! character surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::collaborators::AuthorSource;
use crate::store::{keys, KeyValueStore};

/// Voice used when none has been stored
pub const DEFAULT_VOICE_ID: u32 = 1;

/// Which content source feeds the bubble
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentSourceKind {
    /// A plain RSS feed URL
    #[default]
    Rss,
    /// The first author feed
    AuthorA,
    /// The second author feed
    AuthorB,
}

impl ContentSourceKind {
    /// Stored representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rss => "rss",
            Self::AuthorA => "author_a",
            Self::AuthorB => "author_b",
        }
    }
}

impl fmt::Display for ContentSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rss" => Ok(Self::Rss),
            "author_a" | "author-a" => Ok(Self::AuthorA),
            "author_b" | "author-b" => Ok(Self::AuthorB),
            other => Err(format!("unknown content source kind: {other}")),
        }
    }
}

/// The fetch a saved settings group asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchTarget {
    /// Fetch an RSS feed
    Feed(String),
    /// Fetch an author's articles
    Author(AuthorSource, String),
}

/// User-configured content sources and voice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Selected source
    pub source_kind: ContentSourceKind,
    /// RSS feed URL
    pub feed_url: String,
    /// Handle for the first author feed
    pub author_a: String,
    /// Handle for the second author feed
    pub author_b: String,
    /// Speech voice id
    pub voice_id: u32,
}

impl Settings {
    /// Read the current settings, falling back to defaults for missing keys
    pub fn load(store: &dyn KeyValueStore, default_feed_url: &str) -> Self {
        let source_kind = store
            .get(keys::SOURCE_KIND)
            .and_then(|raw| match raw.parse::<ContentSourceKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring stored source kind");
                    None
                }
            })
            .unwrap_or_default();
        let voice_id = store
            .get(keys::VOICE_ID)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_VOICE_ID);

        Self {
            source_kind,
            feed_url: store
                .get(keys::FEED_URL)
                .unwrap_or_else(|| default_feed_url.to_string()),
            author_a: store.get(keys::AUTHOR_A).unwrap_or_default(),
            author_b: store.get(keys::AUTHOR_B).unwrap_or_default(),
            voice_id,
        }
    }

    /// Copy with every text field trimmed
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            source_kind: self.source_kind,
            feed_url: self.feed_url.trim().to_string(),
            author_a: self.author_a.trim().to_string(),
            author_b: self.author_b.trim().to_string(),
            voice_id: self.voice_id,
        }
    }

    /// Key/value pairs to persist for this group
    ///
    /// Blank text fields are left out so they never erase a stored value.
    /// The source kind and voice are always written.
    #[must_use]
    pub fn store_entries(&self) -> Vec<(&'static str, String)> {
        let trimmed = self.trimmed();
        let mut entries = vec![
            (keys::SOURCE_KIND, trimmed.source_kind.as_str().to_string()),
            (keys::VOICE_ID, trimmed.voice_id.to_string()),
        ];
        for (key, value) in [
            (keys::FEED_URL, trimmed.feed_url),
            (keys::AUTHOR_A, trimmed.author_a),
            (keys::AUTHOR_B, trimmed.author_b),
        ] {
            if !value.is_empty() {
                entries.push((key, value));
            }
        }
        entries
    }

    /// The fetch for the selected source, or `None` when its URL/handle is blank
    #[must_use]
    pub fn fetch_target(&self) -> Option<FetchTarget> {
        let trimmed = self.trimmed();
        let target = match trimmed.source_kind {
            ContentSourceKind::Rss => FetchTarget::Feed(trimmed.feed_url),
            ContentSourceKind::AuthorA => FetchTarget::Author(AuthorSource::A, trimmed.author_a),
            ContentSourceKind::AuthorB => FetchTarget::Author(AuthorSource::B, trimmed.author_b),
        };
        let blank = match &target {
            FetchTarget::Feed(value) | FetchTarget::Author(_, value) => value.is_empty(),
        };
        (!blank).then_some(target)
    }
}

/// Editable copy of the settings while the dialog is open
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsDialog {
    draft: Option<Settings>,
    saving: bool,
}

impl SettingsDialog {
    /// A closed dialog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog on a snapshot of the current settings
    ///
    /// Re-opening while already open refreshes the snapshot.
    pub fn open(&mut self, current: Settings) {
        if self.saving {
            return;
        }
        self.draft = Some(current);
    }

    /// Whether the dialog is showing
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Whether a save is in flight
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// The draft being edited
    #[must_use]
    pub fn draft(&self) -> Option<&Settings> {
        self.draft.as_ref()
    }

    /// Edit the draft; `None` when the dialog is closed or saving
    pub fn draft_mut(&mut self) -> Option<&mut Settings> {
        if self.saving {
            return None;
        }
        self.draft.as_mut()
    }

    /// Lock the draft for saving and hand out a copy
    pub fn begin_save(&mut self) -> Option<Settings> {
        if self.saving {
            return None;
        }
        let draft = self.draft.clone()?;
        self.saving = true;
        Some(draft)
    }

    /// Close after a save completed (successfully or not)
    pub fn finish_save(&mut self) {
        self.saving = false;
        self.draft = None;
    }

    /// Discard the draft without side effects
    pub fn cancel(&mut self) {
        if !self.saving {
            self.draft = None;
        }
    }
}
