use crate::app::{Key, Target, UiEvent};
use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const HELP: &str = "\
Type a URL, file path or search term, or a command:
  :f<n>           move to display n (F1..F12)
  :open           show the overlay
  :dblclick       double-click the target window
  :esc            Escape
  :close          close button
  :hover <i>      hover thumbnail i
  :leave          leave thumbnails
  :preview <i>    click thumbnail i
  :apply <i>      double-click thumbnail i
  :list           list the gallery
  :quit
Prefix with :overlay to target the overlay window.";

/// Parses one console line. Blank lines are ignored, anything that isn't a
/// command goes to the search box.
pub fn parse_line(line: &str) -> Result<Option<UiEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.starts_with(':') {
        return Ok(Some(UiEvent::Submit(trimmed.to_string())));
    }

    let mut words = trimmed.split_whitespace().peekable();
    let target = if words.peek() == Some(&":overlay") {
        words.next();
        Target::Overlay
    } else {
        Target::Desktop
    };

    let Some(command) = words.next() else {
        bail!("Missing command after :overlay");
    };
    let mut index = || -> Result<usize> {
        let arg = words
            .next()
            .with_context(|| format!("{} needs a thumbnail index", command))?;
        arg.parse()
            .with_context(|| format!("Invalid thumbnail index: {}", arg))
    };

    let event = match command {
        ":open" => UiEvent::DoubleClick(Target::Desktop),
        ":dblclick" => UiEvent::DoubleClick(target),
        ":esc" => UiEvent::KeyUp { target, key: Key::Escape },
        ":close" => UiEvent::CloseButton,
        ":hover" => UiEvent::ThumbnailEnter(index()?),
        ":leave" => UiEvent::ThumbnailLeave,
        ":preview" => UiEvent::ThumbnailClick(index()?),
        ":apply" => UiEvent::ThumbnailDoubleClick(index()?),
        ":list" => UiEvent::ListGallery,
        ":quit" => UiEvent::Quit,
        other => match other.strip_prefix(":f").and_then(|n| n.parse::<u8>().ok()) {
            Some(n) if (1..=12).contains(&n) => UiEvent::KeyUp { target, key: Key::Function(n) },
            _ => bail!("Unknown command: {}", other),
        },
    };

    Ok(Some(event))
}

/// Reads stdin line by line and forwards parsed events. The channel closes
/// when stdin does.
pub fn spawn_reader(events: mpsc::Sender<UiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!("{}", HELP);

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            };

            match parse_line(&line) {
                Ok(Some(event)) => {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{}", e),
            }
        }
    })
}
