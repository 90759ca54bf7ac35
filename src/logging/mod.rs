//! Logging setup
//!
//! Records go to stderr through env_logger and to the in-app log window.

mod ui_logger;

pub use ui_logger::UiLogger;
