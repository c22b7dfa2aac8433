/// File sink for the `log` facade.
///
/// The game owns the terminal in raw mode on the alternate screen, so
/// log records never go to stdout/stderr. Without a log file, logging
/// stays disabled.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogInitError {
    #[error("could not open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a logger is already installed")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Install the file logger. Appends to `path`, creating it if needed.
pub fn init(path: &Path, level: LevelFilter) -> Result<(), LogInitError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogInitError::Open { path: path.to_path_buf(), source })?;
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failure_is_reported() {
        let err = init(Path::new("/definitely/not/here/brain.log"), LevelFilter::Info).unwrap_err();
        assert!(matches!(err, LogInitError::Open { .. }));
    }

    #[test]
    fn records_reach_the_file_once_installed() {
        let path = std::env::temp_dir().join(format!("brain-train-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        init(&path, LevelFilter::Info).unwrap();
        log::warn!("fell back to defaults");
        log::debug!("below the configured level");
        log::logger().flush();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("fell back to defaults"), "{text}");
        assert!(!text.contains("below the configured level"), "{text}");

        // Only one logger per process.
        let again = init(&path, LevelFilter::Info).unwrap_err();
        assert!(matches!(again, LogInitError::AlreadySet(_)));

        let _ = std::fs::remove_file(&path);
    }
}
