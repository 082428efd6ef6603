//! Error types for map file operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing a map file.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// An I/O error occurred while reading or writing the map file.
    #[error("map file I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The map file could not be parsed as valid JSON.
    #[error("failed to parse map file {path}: {reason}")]
    Parse {
        /// The map file path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// The map file format version does not match the current version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The map file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The actual format version found in the file.
        actual: u32,
    },

    /// The map could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = MapError::Parse {
            path: PathBuf::from("classes.dexmap"),
            reason: "unexpected EOF".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("classes.dexmap"));
        assert!(msg.contains("unexpected EOF"));
    }

    #[test]
    fn version_mismatch_display() {
        let err = MapError::VersionMismatch {
            path: PathBuf::from("classes.dexmap"),
            expected: 1,
            actual: 7,
        };
        assert!(err.to_string().contains("expected 1, got 7"));
    }
}
