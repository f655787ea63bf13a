//! TOML Configuration File Support
//!
//! Engine configuration lives in `~/.config/desktop-companion/companion.toml`.
//! User settings edited through the settings dialog are separate; they live
//! in the state store (see [`crate::store`]).
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (applied by the daemon after loading)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [timing]
//! auto_advance_ms = 20000
//! blink_min_ms = 2000
//! blink_max_ms = 5000
//! transition_ms = 1000
//! weather_refresh_secs = 1800
//!
//! [assets]
//! transition = "/usr/share/desktop-companion/flourish.gif"
//!
//! [content]
//! default_feed_url = "https://example.org/news.xml"
//!
//! [weather]
//! location_label = "Tokyo"
//!
//! [store]
//! path = "/home/me/.local/share/desktop-companion/state.toml"
//!
//! [bus]
//! capacity = 64
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::ChoreographyTiming;
use crate::bus::DEFAULT_BUS_CAPACITY;
use crate::carousel::AUTO_ADVANCE_MS;

/// Feed shown until the user configures one
pub const DEFAULT_FEED_URL: &str = "https://www.nhk.or.jp/rss/news/cat0.xml";

/// Location label shown on the weather surface
pub const DEFAULT_LOCATION_LABEL: &str = "Tokyo";

/// Weather refresh period
pub const WEATHER_REFRESH_SECS: u64 = 30 * 60;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[timing]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingToml {
    /// Carousel auto-advance period
    pub auto_advance_ms: Option<u64>,
    /// Shortest blink delay
    pub blink_min_ms: Option<u64>,
    /// Longest blink delay (exclusive)
    pub blink_max_ms: Option<u64>,
    /// Blink frame hold
    pub blink_hold_ms: Option<u64>,
    /// Shortest hop delay
    pub hop_min_ms: Option<u64>,
    /// Longest hop delay (exclusive)
    pub hop_max_ms: Option<u64>,
    /// Hop rise and land time
    pub hop_rise_ms: Option<u64>,
    /// Hop apex height
    pub hop_height_px: Option<i32>,
    /// Mouth frame time
    pub talk_frame_ms: Option<u64>,
    /// Transition flourish length
    pub transition_ms: Option<u64>,
    /// Weather refresh period
    pub weather_refresh_secs: Option<u64>,
}

/// `[assets]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsToml {
    /// Transition visual
    pub transition: Option<PathBuf>,
}

/// `[content]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentToml {
    /// Feed used before the user saves one
    pub default_feed_url: Option<String>,
}

/// `[weather]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherToml {
    /// Label in front of the condition
    pub location_label: Option<String>,
}

/// `[store]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreToml {
    /// State file location
    pub path: Option<PathBuf>,
}

/// `[bus]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusToml {
    /// Per-topic buffer
    pub capacity: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionToml {
    /// Timing section
    pub timing: TimingToml,
    /// Assets section
    pub assets: AssetsToml,
    /// Content section
    pub content: ContentToml,
    /// Weather section
    pub weather: WeatherToml,
    /// Store section
    pub store: StoreToml,
    /// Bus section
    pub bus: BusToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Effective engine configuration
#[derive(Clone, Debug)]
pub struct CompanionConfig {
    /// Carousel auto-advance period
    pub auto_advance: Duration,
    /// Animation timings
    pub choreography: ChoreographyTiming,
    /// Weather refresh period
    pub weather_refresh: Duration,
    /// Transition visual, if any
    pub transition_asset: Option<PathBuf>,
    /// Feed used before the user saves one
    pub default_feed_url: String,
    /// Label shown on the weather surface
    pub location_label: String,
    /// State file location
    pub state_path: Option<PathBuf>,
    /// Per-topic bus buffer
    pub bus_capacity: usize,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            auto_advance: Duration::from_millis(AUTO_ADVANCE_MS),
            choreography: ChoreographyTiming::default(),
            weather_refresh: Duration::from_secs(WEATHER_REFRESH_SECS),
            transition_asset: None,
            default_feed_url: DEFAULT_FEED_URL.to_string(),
            location_label: DEFAULT_LOCATION_LABEL.to_string(),
            state_path: default_state_path(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl CompanionConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reject settings that would break timer invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.choreography;
        if t.blink_min >= t.blink_max {
            return Err(ConfigError::ValidationError(
                "blink_min_ms must be below blink_max_ms".to_string(),
            ));
        }
        if t.hop_min >= t.hop_max {
            return Err(ConfigError::ValidationError(
                "hop_min_ms must be below hop_max_ms".to_string(),
            ));
        }
        if t.blink_hold >= t.blink_min {
            return Err(ConfigError::ValidationError(
                "blink_hold_ms must be below blink_min_ms".to_string(),
            ));
        }
        for (name, value) in [
            ("auto_advance_ms", self.auto_advance),
            ("talk_frame_ms", t.talk_frame),
            ("transition_ms", t.transition),
            ("hop_rise_ms", t.hop_rise),
            ("weather_refresh_secs", self.weather_refresh),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "bus capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Default configuration file path
///
/// `$XDG_CONFIG_HOME/desktop-companion/companion.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("desktop-companion").join("companion.toml"))
}

/// Default state store path
///
/// `$XDG_DATA_HOME/desktop-companion/state.toml`.
#[must_use]
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("desktop-companion").join("state.toml"))
}

/// Load configuration from the default path, the environment and defaults
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are inconsistent. A missing file is not an error.
pub fn load_config() -> Result<CompanionConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if validation
/// fails.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<CompanionConfig, ConfigError> {
    let mut config = CompanionConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            load_file(&mut config, config_path)?;
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn load_file(config: &mut CompanionConfig, path: &Path) -> Result<(), ConfigError> {
    let toml_content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let toml_config: CompanionToml = toml::from_str(&toml_content)?;
    apply_toml_config(config, &toml_config);
    config.config_file_path = Some(path.to_path_buf());
    config.source = ConfigSource::File;

    tracing::info!(path = %path.display(), "Loaded configuration from file");
    Ok(())
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut CompanionConfig, toml: &CompanionToml) {
    let t = &toml.timing;
    let c = &mut config.choreography;
    let ms = Duration::from_millis;

    if let Some(v) = t.auto_advance_ms {
        config.auto_advance = ms(v);
    }
    if let Some(v) = t.blink_min_ms {
        c.blink_min = ms(v);
    }
    if let Some(v) = t.blink_max_ms {
        c.blink_max = ms(v);
    }
    if let Some(v) = t.blink_hold_ms {
        c.blink_hold = ms(v);
    }
    if let Some(v) = t.hop_min_ms {
        c.hop_min = ms(v);
    }
    if let Some(v) = t.hop_max_ms {
        c.hop_max = ms(v);
    }
    if let Some(v) = t.hop_rise_ms {
        c.hop_rise = ms(v);
    }
    if let Some(v) = t.hop_height_px {
        c.hop_height_px = v;
    }
    if let Some(v) = t.talk_frame_ms {
        c.talk_frame = ms(v);
    }
    if let Some(v) = t.transition_ms {
        c.transition = ms(v);
    }
    if let Some(v) = t.weather_refresh_secs {
        config.weather_refresh = Duration::from_secs(v);
    }

    if toml.assets.transition.is_some() {
        config.transition_asset = toml.assets.transition.clone();
    }
    if let Some(ref url) = toml.content.default_feed_url {
        config.default_feed_url = url.clone();
    }
    if let Some(ref label) = toml.weather.location_label {
        config.location_label = label.clone();
    }
    if toml.store.path.is_some() {
        config.state_path = toml.store.path.clone();
    }
    if let Some(capacity) = toml.bus.capacity {
        config.bus_capacity = capacity;
    }
}

/// Apply environment variable overrides
///
/// `lookup` is `std::env::var` in production; tests pass a map.
fn apply_env_config(config: &mut CompanionConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup("COMPANION_STATE_PATH") {
        config.state_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    if let Some(url) = lookup("COMPANION_FEED_URL") {
        config.default_feed_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(asset) = lookup("COMPANION_TRANSITION_ASSET") {
        config.transition_asset = Some(PathBuf::from(asset));
        config.source = ConfigSource::Env;
    }
    if let Some(period) = lookup("COMPANION_AUTO_ADVANCE_MS") {
        match period.parse::<u64>() {
            Ok(ms) => {
                config.auto_advance = Duration::from_millis(ms);
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(value = %period, error = %e, "Ignoring COMPANION_AUTO_ADVANCE_MS"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
