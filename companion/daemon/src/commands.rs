//! Line Commands
//!
//! One command per stdin line:
//!
//! | Line | Effect |
//! |---|---|
//! | `next`, `prev`, `click` | navigate the bubble |
//! | `speak`, `open` | speak / open the current item |
//! | `settings rss <url>` | save an RSS source and fetch it |
//! | `settings author-a <handle>` | save an author source and fetch it |
//! | `settings author-b <handle>` | same, second author feed |
//! | `voice <id>` | save the speech voice |
//! | `sprite <path>` | select a sprite image |
//! | `weather` | refresh the weather now |
//! | `front` | raise every window |
//! | `quit` | close everything |

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use companion_core::{BubbleCommand, ContentSourceKind, WeatherCommand};

/// A parsed stdin command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DaemonCommand {
    /// Forward to the bubble
    Bubble(BubbleCommand),
    /// Forward to the weather surface
    Weather(WeatherCommand),
    /// Save a source through the settings dialog
    Source(ContentSourceKind, String),
    /// Save a voice through the settings dialog
    Voice(u32),
    /// Pick this sprite
    Sprite(PathBuf),
    /// Raise all windows
    BringToFront,
    /// Close everything
    Quit,
    /// Print the command list
    Help,
}

/// Parse one line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<DaemonCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "next" => DaemonCommand::Bubble(BubbleCommand::Next),
        "prev" | "previous" => DaemonCommand::Bubble(BubbleCommand::Previous),
        "click" => DaemonCommand::Bubble(BubbleCommand::Click),
        "speak" => DaemonCommand::Bubble(BubbleCommand::Speak),
        "open" => DaemonCommand::Bubble(BubbleCommand::OpenLink),
        "weather" => DaemonCommand::Weather(WeatherCommand::Refresh),
        "front" => DaemonCommand::BringToFront,
        "quit" | "exit" => DaemonCommand::Quit,
        "help" | "?" => DaemonCommand::Help,
        "settings" => {
            let (kind, value) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: settings <rss|author-a|author-b> <value>"))?;
            let kind: ContentSourceKind = kind
                .parse()
                .map_err(|_| anyhow!("unknown source kind: {kind}"))?;
            DaemonCommand::Source(kind, value.trim().to_string())
        }
        "voice" => {
            let id = rest
                .parse::<u32>()
                .with_context(|| format!("invalid voice id: {rest:?}"))?;
            DaemonCommand::Voice(id)
        }
        "sprite" => {
            if rest.is_empty() {
                bail!("usage: sprite <path>");
            }
            DaemonCommand::Sprite(PathBuf::from(rest))
        }
        other => bail!("unknown command: {other} (try `help`)"),
    };
    Ok(Some(command))
}

/// Text printed for `help`
pub const HELP: &str = "\
commands:
  next | prev | click          navigate the bubble
  speak | open                 speak / open the current item
  settings rss <url>           fetch an RSS feed
  settings author-a <handle>   fetch an author feed
  settings author-b <handle>   fetch the second author feed
  voice <id>                   set the speech voice
  sprite <path>                select a sprite image
  weather                      refresh the weather
  front                        raise all windows
  quit                         close everything";
