//! Logger setup. Output goes to a file so it never lands on the TUI.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use env_logger::{Builder, Env, Target};

use crate::config::{LoggingSettings, default_log_path};
use crate::error::{Error, Result};

/// Where log lines go: the configured file, else the XDG state default.
pub fn log_path(settings: &LoggingSettings) -> Option<PathBuf> {
    settings.file.clone().or_else(default_log_path)
}

/// Install the global logger. `RUST_LOG` overrides `logging.level`.
pub fn init(settings: &LoggingSettings) -> Result<PathBuf> {
    let path = log_path(settings)
        .ok_or_else(|| Error::Logging("no log file path (set logging.file or HOME)".into()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Builder::from_env(Env::default().default_filter_or(settings.level.as_str()))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_file_wins_over_default() {
        let settings = LoggingSettings {
            file: Some(PathBuf::from("/tmp/legato-test.log")),
            ..LoggingSettings::default()
        };
        assert_eq!(log_path(&settings), Some(PathBuf::from("/tmp/legato-test.log")));
    }

    #[test]
    fn init_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("legato.log");
        let settings = LoggingSettings {
            level: "debug".to_string(),
            file: Some(path.clone()),
        };

        // Another test may already have installed a logger; the file is
        // created before installation either way.
        let _ = init(&settings);
        assert!(path.exists());
    }
}
