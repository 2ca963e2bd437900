//! Error types for configuration operations.

use diffuse_core::DiffuseError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A `[states.<name>]` table is inconsistent
    #[error("invalid state '{name}': {reason}")]
    InvalidState {
        /// Table key of the offending entry.
        name: String,
        /// Description of the inconsistency.
        reason: String,
    },

    /// An engine setting is out of range or unknown
    #[error("invalid setting '{field}': {reason}")]
    InvalidSetting {
        /// Dotted field name, e.g. `ramp.shape`.
        field: String,
        /// Description of why the value was rejected.
        reason: String,
    },

    /// A console command could not be parsed
    #[error("invalid command '{command}': {reason}")]
    Command {
        /// The command text.
        command: String,
        /// Description of the syntax error.
        reason: String,
    },

    /// The engine rejected an operation
    #[error(transparent)]
    Engine(#[from] DiffuseError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid setting error.
    pub fn setting(field: impl Into<String>, reason: impl ToString) -> Self {
        ConfigError::InvalidSetting {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

/// Storage failures surface to the engine as [`DiffuseError::Storage`].
///
/// Engine errors that passed through a [`ConfigError`] come back unchanged.
impl From<ConfigError> for DiffuseError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Engine(inner) => inner,
            other => DiffuseError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = ConfigError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
        assert!(err.source().is_some(), "ReadFile must expose I/O source");
    }

    #[test]
    fn write_file_display() {
        let err = ConfigError::write_file("/a/states.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to write file"), "got: {msg}");
        assert!(msg.contains("/a/states.toml"), "got: {msg}");
    }

    #[test]
    fn create_dir_source_is_some() {
        let err = ConfigError::create_dir("/x", mock_io_err());
        assert!(err.source().is_some(), "CreateDir must expose I/O source");
    }

    #[test]
    fn invalid_state_display() {
        let err = ConfigError::InvalidState {
            name: "front".to_string(),
            reason: "count 3 does not match 2 ordinate values".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid state 'front': count 3 does not match 2 ordinate values"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn setting_factory() {
        let err = ConfigError::setting("ramp.shape", "unknown curve shape");
        assert_eq!(
            err.to_string(),
            "invalid setting 'ramp.shape': unknown curve shape"
        );
    }

    #[test]
    fn io_failures_become_storage_errors() {
        let err: DiffuseError = ConfigError::write_file("/x", mock_io_err()).into();
        assert!(matches!(err, DiffuseError::Storage(ref msg) if msg.contains("/x")));
    }

    #[test]
    fn engine_errors_pass_through() {
        let inner = DiffuseError::WriteProtected("x".into());
        let err: DiffuseError = ConfigError::Engine(inner.clone()).into();
        assert_eq!(err, inner);
    }
}
