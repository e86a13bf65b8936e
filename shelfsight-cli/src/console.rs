//! Interactive session console
//!
//! Reads one command per line from stdin and forwards it to the running
//! assistant, while a second task prints the assistant's events.

use crate::config::apply_setting;
use anyhow::Result;
use shelfsight_assist::{AssistantEvent, AssistantHandle, OverlayKind};
use shelfsight_core::Settings;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::warn;

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Flip,
    Settings,
    Tutorial,
    Close,
    Resume,
    Status,
    Set { key: String, value: String },
    Save,
    Help,
    Quit,
}

/// Parse a console line; `None` for blank lines, `Err` for unknown input
pub fn parse_line(line: &str) -> Option<std::result::Result<ConsoleCommand, String>> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();

    let command = match head.as_str() {
        "start" | "camera" => ConsoleCommand::Start,
        "stop" => ConsoleCommand::Stop,
        "flip" | "switch" => ConsoleCommand::Flip,
        "settings" => ConsoleCommand::Settings,
        "tutorial" | "help-audio" => ConsoleCommand::Tutorial,
        "close" => ConsoleCommand::Close,
        "resume" => ConsoleCommand::Resume,
        "status" => ConsoleCommand::Status,
        "save" => ConsoleCommand::Save,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        "set" => {
            let key = match words.next() {
                Some(key) => key.to_string(),
                None => return Some(Err("usage: set <key> <value>".to_string())),
            };
            let value = words.collect::<Vec<_>>().join(" ");
            if value.is_empty() {
                return Some(Err("usage: set <key> <value>".to_string()));
            }
            ConsoleCommand::Set { key, value }
        }
        other => return Some(Err(format!("unknown command: {}", other))),
    };
    Some(Ok(command))
}

pub struct SessionConsole {
    handle: AssistantHandle,
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl SessionConsole {
    pub fn new(handle: AssistantHandle, settings: Settings, settings_path: Option<PathBuf>) -> Self {
        Self {
            handle,
            settings,
            settings_path,
        }
    }

    /// Run until `quit` or end of input
    pub async fn run(mut self) -> Result<()> {
        print_help();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let command = match parse_line(&line) {
                None => continue,
                Some(Ok(command)) => command,
                Some(Err(message)) => {
                    println!("❌ {}", message);
                    continue;
                }
            };

            match command {
                ConsoleCommand::Start => self.handle.start_session().await?,
                ConsoleCommand::Stop => self.handle.stop_session().await?,
                ConsoleCommand::Flip => self.handle.switch_facing().await?,
                ConsoleCommand::Settings => self.handle.open_overlay(OverlayKind::Settings).await?,
                ConsoleCommand::Tutorial => self.handle.open_overlay(OverlayKind::Tutorial).await?,
                ConsoleCommand::Close => self.handle.close_overlay().await?,
                ConsoleCommand::Resume => self.handle.resume().await?,
                ConsoleCommand::Status => {
                    println!("{}", serde_json::to_string_pretty(&self.handle.status())?);
                }
                ConsoleCommand::Set { key, value } => match apply_setting(&self.settings, &key, &value) {
                    Ok(settings) => {
                        self.settings = settings.clone();
                        self.handle.update_settings(settings).await?;
                        println!("✅ {} updated", key);
                    }
                    Err(e) => println!("❌ {}", e),
                },
                ConsoleCommand::Save => match &self.settings_path {
                    Some(path) => match self.settings.save(path) {
                        Ok(()) => println!("✅ Settings saved to {}", path.display()),
                        Err(e) => println!("❌ Failed to save settings: {}", e),
                    },
                    None => println!("❌ No settings file configured"),
                },
                ConsoleCommand::Help => print_help(),
                ConsoleCommand::Quit => break,
            }
        }
        Ok(())
    }
}

fn print_help() {
    println!("Commands:");
    println!("  start | stop | flip | resume");
    println!("  settings | tutorial | close");
    println!("  set <key> <value>   e.g. set captureDelayMs 2000, set fields.brand true");
    println!("  save | status | help | quit");
}

/// Print events until the assistant goes away
pub async fn print_events(mut events: broadcast::Receiver<AssistantEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = describe_event(&event) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Console missed {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn describe_event(event: &AssistantEvent) -> Option<String> {
    let line = match event {
        AssistantEvent::ModelLoaded { detector } => format!("✅ Detection model loaded ({})", detector),
        AssistantEvent::SessionStarted { facing } => format!("📷 Camera on ({})", facing.as_str()),
        AssistantEvent::SessionStopped => "📷 Camera off".to_string(),
        AssistantEvent::CameraUnavailable { message } => format!("❌ Camera unavailable: {}", message),
        AssistantEvent::MovePromptShown { nudges } => format!("👋 Keep moving the object ({})", nudges),
        AssistantEvent::MovePromptHidden => "👋 Prompt cleared".to_string(),
        AssistantEvent::CaptureStarted => "📸 Capturing".to_string(),
        AssistantEvent::Description { text, uninformative } => {
            if *uninformative {
                format!("🔄 {} (rotate the object)", text)
            } else {
                format!("🗣️  {}", text)
            }
        }
        AssistantEvent::CaptureFailed { message } => format!("❌ Capture failed: {}", message),
        AssistantEvent::Paused => "⏸️  Paused, type 'resume' to continue".to_string(),
        AssistantEvent::OverlayOpened { overlay } => format!("📋 {:?} opened", overlay),
        AssistantEvent::OverlayClosed { overlay } => format!("📋 {:?} closed", overlay),
        AssistantEvent::FacingChanged { facing } => format!("🔁 Facing {}", facing.as_str()),
        AssistantEvent::Error { message } => format!("❌ {}", message),
        AssistantEvent::StateChanged { .. } => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_line("start"), Some(Ok(ConsoleCommand::Start)));
        assert_eq!(parse_line("  FLIP "), Some(Ok(ConsoleCommand::Flip)));
        assert_eq!(parse_line("exit"), Some(Ok(ConsoleCommand::Quit)));
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn test_parse_set_keeps_value_words() {
        assert_eq!(
            parse_line("set beepVolume 0.25"),
            Some(Ok(ConsoleCommand::Set {
                key: "beepVolume".to_string(),
                value: "0.25".to_string(),
            }))
        );
        assert!(matches!(parse_line("set beepVolume"), Some(Err(_))));
        assert!(matches!(parse_line("dance"), Some(Err(_))));
    }

    #[test]
    fn test_state_changes_are_not_printed() {
        let event = AssistantEvent::StateChanged {
            from: shelfsight_assist::InteractionState::Idle,
            to: shelfsight_assist::InteractionState::Tracking,
        };
        assert!(describe_event(&event).is_none());
        assert!(describe_event(&AssistantEvent::Paused).is_some());
    }
}
