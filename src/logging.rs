use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::RollingFileAppender;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log path {0} has no parent directory")]
    NoParent(PathBuf),
    #[error("log path {0} has no file name")]
    NoFileName(PathBuf),
    #[error("unknown log level {0:?}")]
    InvalidLevel(String),
    #[error("could not create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not install the tracing subscriber: {0}")]
    Install(String),
}

pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| LoggingError::InvalidLevel(level.to_string()))
}

/// File appender that never rotates. The terminal belongs to the UI, so
/// logs only ever go to this file.
pub fn try_create_appender(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let parent = path
        .parent()
        .ok_or_else(|| LoggingError::NoParent(path.to_path_buf()))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::NoFileName(path.to_path_buf()))?;

    std::fs::create_dir_all(parent)?;
    Ok(tracing_appender::rolling::never(parent, file_name))
}

/// Install the global subscriber writing to `path`.
pub fn init(path: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    let appender = try_create_appender(path)?;

    tracing_subscriber::fmt()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .map_err(|err| LoggingError::Install(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn parses_levels() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert_matches!(parse_level("loud"), Err(LoggingError::InvalidLevel(_)));
    }

    #[test]
    fn creates_missing_log_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");

        try_create_appender(&path).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn rejects_path_without_file_name() {
        assert_matches!(
            try_create_appender(Path::new("/")),
            Err(LoggingError::NoParent(_))
        );
    }
}
