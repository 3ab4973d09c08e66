//! Error types for Compass.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompassError {
    /// Malformed or empty request; the orchestrator never runs
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Fault in the orchestration logic itself
    #[error("Orchestration failure: {0}")]
    Orchestration(String),

    /// Config file parsed but unusable, or not parseable at all
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompassError {
    /// HTTP status the boundary reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CompassError::Validation(_) => 400,
            CompassError::Orchestration(_) => 500,
            CompassError::Config(_) => 500,
            CompassError::Io(_) => 500,
        }
    }

    /// Message safe to show a client. Server-side faults stay generic.
    pub fn public_message(&self) -> String {
        match self {
            CompassError::Validation(msg) => msg.clone(),
            _ => "internal error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = CompassError::Orchestration("duplicate source id search-1".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "internal error");
    }

    #[test]
    fn test_startup_errors_are_server_side() {
        let err = CompassError::Config("max_sources must be at least 1".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "internal error");

        let err = CompassError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, CompassError::Io(_)));
        assert_eq!(err.public_message(), "internal error");
    }

    #[test]
    fn test_validation_is_client_error() {
        let err = CompassError::Validation("query must not be empty".into());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.public_message(), "query must not be empty");
    }
}
