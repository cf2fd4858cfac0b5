use log::LevelFilter;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Logger already initialized: {0}")]
    InitError(#[from] log::SetLoggerError),
}

/// Parse a level name from config; unknown names fall back to `Info`
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Route `log` records to a file. The terminal belongs to the TUI, so nothing goes to stderr.
pub fn init(log_path: &Path, level: &str) -> Result<(), LoggingError> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(parse_level(level))
        .level_for("rusqlite", LevelFilter::Warn)
        .chain(fern::log_file(log_path)?)
        .apply()?;

    Ok(())
}
