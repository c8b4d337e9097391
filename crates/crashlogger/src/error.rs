//! Error types for crashlogger.
//!
//! The crash-detection path itself never fails. These errors come from setup
//! (configuration, trace files, the retrieval listener) and from peripherals,
//! whose failures are logged and swallowed by the recorder.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for crashlogger operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Trace Errors ===
    /// A line of a sensor trace could not be parsed.
    #[error("invalid trace {path} at line {line}: {source}")]
    TraceParse {
        /// Path to the trace file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A trace file could not be read.
    #[error("failed to read trace {path}: {source}")]
    TraceRead {
        /// Path to the trace file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Peripheral Errors ===
    /// The accelerometer did not deliver a sample.
    #[error("sensor read failed: {0}")]
    SensorRead(String),

    /// An outbound notification was not delivered.
    #[error("notification to '{recipient}' failed: {message}")]
    Notification {
        /// Recipient the message was addressed to.
        recipient: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Retrieval Errors ===
    /// Failed to bind the retrieval listener.
    #[error("failed to bind retrieval server on {addr}: {source}")]
    ServerBind {
        /// Address that couldn't be bound.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },
}

/// A specialized Result type for crashlogger operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a sensor read error.
    #[must_use]
    pub fn sensor_read(message: impl Into<String>) -> Self {
        Self::SensorRead(message.into())
    }

    /// Create a notification failure.
    #[must_use]
    pub fn notification(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notification {
            recipient: recipient.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Check if this error comes from a peripheral (sensor or notifier).
    ///
    /// Peripheral errors degrade a single subsystem and are never fatal.
    #[must_use]
    pub fn is_peripheral(&self) -> bool {
        matches!(
            self,
            Self::SensorRead(_) | Self::Notification { .. } | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::sensor_read("bus timeout");
        assert_eq!(err.to_string(), "sensor read failed: bus timeout");

        let err = Error::config_validation("capacity must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration: capacity must be greater than 0"
        );
    }

    #[test]
    fn test_notification_error_display() {
        let err = Error::notification("12345", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("12345"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = Error::timeout("notification");
        assert!(err.to_string().contains("notification"));
    }

    #[test]
    fn test_is_peripheral() {
        assert!(Error::sensor_read("x").is_peripheral());
        assert!(Error::notification("r", "x").is_peripheral());
        assert!(Error::timeout("x").is_peripheral());
        assert!(!Error::config_validation("x").is_peripheral());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_trace_parse_error_display() {
        let source = serde_json::from_str::<i32>("{").unwrap_err();
        let err = Error::TraceParse {
            path: PathBuf::from("/tmp/drive.jsonl"),
            line: 7,
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/drive.jsonl"));
        assert!(msg.contains("line 7"));
    }

    #[test]
    fn test_server_bind_error_display() {
        let err = Error::ServerBind {
            addr: "0.0.0.0:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("0.0.0.0:80"));
    }
}
