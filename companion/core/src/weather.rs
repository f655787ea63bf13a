//! Weather Readout
//!
//! Turns a [`WeatherReading`] into the two lines the weather surface shows.
//! Condition codes follow the WMO weather interpretation table.

use crate::collaborators::WeatherReading;
use crate::frame::WeatherFrame;

/// Shown in place of the condition when a fetch fails
pub const UNAVAILABLE: &str = "unavailable";

/// Temperature placeholder before the first successful fetch
pub const TEMPERATURE_PLACEHOLDER: &str = "--°C";

/// Human-readable condition for a WMO code
#[must_use]
pub fn describe(code: u16) -> &'static str {
    match code {
        0 => "clear",
        1 | 2 => "mainly clear",
        3 => "cloudy",
        45 | 48 => "fog",
        51 | 61 => "light rain",
        53 | 63 => "rain",
        55 | 65 => "heavy rain",
        71 => "light snow",
        73 | 77 => "snow",
        75 => "heavy snow",
        80..=82 => "showers",
        85 | 86 => "snow showers",
        95 | 96 | 99 => "thunderstorm",
        _ => "unknown",
    }
}

/// Whole-degree temperature label, rounding halves up
#[must_use]
pub fn format_temperature(celsius: f64) -> String {
    let rounded = (celsius + 0.5).floor() as i64;
    format!("{rounded}°C")
}

/// Frame shown before the first fetch completes
#[must_use]
pub fn loading_frame(location: &str) -> WeatherFrame {
    WeatherFrame {
        temperature: TEMPERATURE_PLACEHOLDER.to_string(),
        description: format!("{location}: ..."),
    }
}

/// Frame for a successful reading
#[must_use]
pub fn reading_frame(location: &str, reading: &WeatherReading) -> WeatherFrame {
    WeatherFrame {
        temperature: format_temperature(reading.temperature_c),
        description: format!("{location}: {}", describe(reading.code)),
    }
}

/// Frame after a failed fetch; the last temperature stays up
#[must_use]
pub fn unavailable_frame(previous: &WeatherFrame) -> WeatherFrame {
    WeatherFrame {
        temperature: previous.temperature.clone(),
        description: UNAVAILABLE.to_string(),
    }
}
