use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// Logger that forwards formatted lines to the log window and echoes
/// everything to an env_logger instance for terminal output.
pub struct UiLogger {
    sender: Mutex<Sender<String>>,
    stderr: env_logger::Logger,
    max_level: LevelFilter,
}

impl UiLogger {
    /// Install the logger and return the receiver the GUI reads lines from.
    /// Terminal verbosity follows `RUST_LOG` (default `info`); the window
    /// always receives debug and above.
    pub fn init() -> Result<Receiver<String>, SetLoggerError> {
        let (logger, rx) = Self::new();
        let max_level = logger.max_level;
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(max_level);
        Ok(rx)
    }

    fn new() -> (Self, Receiver<String>) {
        let stderr = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .build();
        let max_level = stderr.filter().max(LevelFilter::Debug);

        let (tx, rx) = mpsc::channel();
        let logger = UiLogger {
            sender: Mutex::new(tx),
            stderr,
            max_level,
        };
        (logger, rx)
    }

    /// `[LEVEL] target: message (file:line)`
    fn format(record: &Record) -> String {
        let mut msg = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        if let (Some(file), Some(line)) = (record.file(), record.line()) {
            msg.push_str(&format!(" ({}:{})", file, line));
        }
        msg
    }
}

impl Log for UiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if self.stderr.matches(record) {
            self.stderr.log(record);
        }
        // Window closed means nobody is reading any more
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(Self::format(record));
        }
    }

    fn flush(&self) {
        self.stderr.flush();
    }
}
