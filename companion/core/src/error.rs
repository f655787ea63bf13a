//! Error Taxonomy
//!
//! Errors raised at the boundary with external collaborators and the
//! persisted store. None of these are fatal: every failure path leaves the
//! affected surface idle and consistent.
//!
//! | Error | Recovery |
//! |-------|----------|
//! | [`FetchError`] | Carousel keeps its previous item list |
//! | [`SynthesisError`] | Speak affordance back to idle, talk-cycle stopped |
//! | [`PlaybackError`] | Same as synthesis |
//! | [`HostError`] | Logged and ignored |
//! | [`StoreError`] | Logged; in-memory state stays authoritative |

use std::path::PathBuf;

use thiserror::Error;

/// A content source was unreachable or returned something unusable
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The source could not be reached
    #[error("content source unreachable: {0}")]
    Unreachable(String),

    /// The source answered with data that could not be parsed
    #[error("malformed content from source: {0}")]
    Malformed(String),
}

/// The speech backend failed to turn text into audio
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("speech synthesis failed: {reason}")]
pub struct SynthesisError {
    /// Backend-provided reason
    pub reason: String,
}

impl SynthesisError {
    /// Create a synthesis error with a reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Audio playback could not start or was cut short
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("audio playback failed: {0}")]
pub struct PlaybackError(pub String);

/// The window host rejected a position or lifecycle request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("window host error: {0}")]
pub struct HostError(pub String);

/// The persisted key/value store could not be read or written
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write the backing file
    #[error("store I/O failed at {path}: {source}")]
    Io {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// The backing file did not contain a flat string table
    #[error("store file is corrupt: {0}")]
    Corrupt(#[from] toml::de::Error),

    /// The in-memory table could not be serialized
    #[error("store serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The background write did not run to completion
    #[error("store write task failed: {0}")]
    Task(String),

    /// A stored value could not be decoded
    #[error("stored value for {key} is invalid: {source}")]
    Value {
        /// Key whose value failed to decode
        key: String,
        /// The underlying JSON error
        source: serde_json::Error,
    },
}
