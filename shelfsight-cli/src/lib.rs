//! Library half of the `shelfsight` binary: configuration and console parsing

pub mod config;
pub mod console;
pub mod snapshots;

pub use config::{apply_setting, AppConfig};
pub use console::{parse_line, print_events, ConsoleCommand, SessionConsole};
pub use snapshots::PngOverlay;
