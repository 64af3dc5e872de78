//! Result log file

use crate::error::ConfigError;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Append one evaluation line to `path`, prefixed with a unix timestamp
pub fn append_result_line(path: &Path, line: &str) -> Result<(), ConfigError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ConfigError::new(format!("cannot open log file {}: {}", path.display(), e))
        })?;

    writeln!(file, "{} {}", timestamp, line).map_err(|e| {
        ConfigError::new(format!("cannot write log file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.log");

        append_result_line(&path, "first").unwrap();
        append_result_line(&path, "second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" first"));
        assert!(lines[1].ends_with(" second"));
    }

    #[test]
    fn test_unwritable_path_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("results.log");
        let err = append_result_line(&path, "x").unwrap_err();
        assert!(err.message().contains("cannot open log file"));
    }
}
