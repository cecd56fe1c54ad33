//! Structured logging with box-drawing output.
//!
//! Every line mimicoach prints goes through this module so that the daemon, the
//! one-shot commands and the track simulator all share the same visual layout:
//!
//! ```text
//! ┏ mimicoach v0.3.0 ━━╸
//! ┃
//! ┣ Geofence armed
//! ┃   Home: 35.676°N, 139.650°E (radius 100 m)
//! ┣[INFO] Entered home radius (8.9 m from home)
//! ╹
//! ```
//!
//! Output can be switched off at runtime (`Log::set_enabled`) and can be routed to
//! a file through a background writer thread (`Log::start_file_logging`). File
//! output is stripped of ANSI colour codes and every line is stamped with the
//! local wall-clock time.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Set once when --log is given; None means stdout.
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Line(String),
    Shutdown,
}

/// The shape of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `┏ mimicoach vX.Y.Z ━━╸`
    Version,
    /// Empty line + `┣ message`
    BlockStart,
    /// `┣ message`
    Decorated,
    /// `┃   message`
    Indented,
    /// `┃`
    Pipe,
    /// `╹`
    End,
    /// `┣[LEVEL] message`
    Level(Level),
    /// Empty line + `┗[ERROR] message`, used right before giving up.
    ErrorExit,
}

/// Semantic log level with its terminal colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Debug => "\x1b[32mDEBUG\x1b[0m",
            Level::Info => "\x1b[32mINFO\x1b[0m",
            Level::Warning => "\x1b[33mWARNING\x1b[0m",
            Level::Error => "\x1b[31mERROR\x1b[0m",
            Level::Critical => "\x1b[31mCRITICAL\x1b[0m",
        }
    }
}

/// Logging switches and file routing.
///
/// ## Conventions
///
/// - `log_block_start!` opens a new conceptual block (state changes, phases).
/// - `log_decorated!` continues a block, `log_indented!` lists details under it.
/// - `log_pipe!` inserts vertical spacing, typically before a leveled message that
///   starts its own block.
/// - `log_info!`, `log_warning!`, `log_error!`, `log_debug!` and `log_critical!`
///   carry a `[LEVEL]` tag.
/// - `log_version!` and `log_end!` frame the whole run.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Route all further output to `file_path`.
    ///
    /// The returned guard flushes and joins the writer thread when dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("File logging already started"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Line(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }
}

/// Keeps the file writer alive; dropping it flushes pending lines.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Render a message in the given line shape.
pub fn format_line(kind: LineKind, message: &str) -> String {
    match kind {
        LineKind::Version => format!("┏ mimicoach v{} ━━╸\n", env!("CARGO_PKG_VERSION")),
        LineKind::BlockStart => format!("┃\n┣ {message}\n"),
        LineKind::Decorated => format!("┣ {message}\n"),
        LineKind::Indented => format!("┃   {message}\n"),
        LineKind::Pipe => "┃\n".to_string(),
        LineKind::End => "╹\n".to_string(),
        LineKind::Level(level) => format!("┣[{}] {message}\n", level.tag()),
        LineKind::ErrorExit => format!("┃\n┗[{}] {message}\n", Level::Error.tag()),
    }
}

/// Emit one line if logging is enabled. Used by the `log_*!` macros.
pub fn emit(kind: LineKind, message: &str) {
    if !Log::is_enabled() {
        return;
    }
    write_output(&format_line(kind, message));
}

fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        let stamped: String = strip_ansi_codes(text)
            .lines()
            .map(|line| format!("[{stamp}] {line}\n"))
            .collect();
        let _ = tx.send(LogMessage::Line(stamped));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Remove `ESC [ ... m` colour sequences.
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with {
    ($kind:expr, $fmt:literal $($arg:tt)*) => {
        $crate::logger::emit($kind, &format!($fmt $($arg)*))
    };
    ($kind:expr, $expr:expr) => {
        $crate::logger::emit($kind, &$expr.to_string())
    };
}

/// Log a message that continues the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_with!($crate::logger::LineKind::Decorated, $($arg)+) };
}

/// Log a nested detail line.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_with!($crate::logger::LineKind::Indented, $($arg)+) };
}

/// Log a message that opens a new block.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_with!($crate::logger::LineKind::BlockStart, $($arg)+) };
}

/// Log an empty pipe line for spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit($crate::logger::LineKind::Pipe, "")
    };
}

/// Log the version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::emit($crate::logger::LineKind::Version, "")
    };
}

/// Log the closing marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit($crate::logger::LineKind::End, "")
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::__log_with!($crate::logger::LineKind::Level($crate::logger::Level::Debug), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::__log_with!($crate::logger::LineKind::Level($crate::logger::Level::Info), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::__log_with!($crate::logger::LineKind::Level($crate::logger::Level::Warning), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::__log_with!($crate::logger::LineKind::Level($crate::logger::Level::Error), $($arg)+)
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::__log_with!($crate::logger::LineKind::Level($crate::logger::Level::Critical), $($arg)+)
    };
}

/// Log an error that ends the current flow.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_with!($crate::logger::LineKind::ErrorExit, $($arg)+) };
}
