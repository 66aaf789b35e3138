//! Error types and handling for the hotel geosearch library

use thiserror::Error;

/// Main error type for the hotel geosearch library
#[derive(Error, Debug)]
pub enum GeoSearchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A named anchor (station, landmark, hotel) does not resolve
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Datastore or cache unreachable or timed out
    #[error("{dependency} unavailable: {message}")]
    Unavailable {
        dependency: &'static str,
        message: String,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Encoding or decoding of stored values failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GeoSearchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a new dependency-unavailable error
    pub fn unavailable<S: Into<String>>(dependency: &'static str, message: S) -> Self {
        Self::Unavailable {
            dependency,
            message: message.into(),
        }
    }

    /// Create a new input validation error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the error comes from an unreachable or slow dependency
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GeoSearchError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            GeoSearchError::NotFound { entity, .. } => format!("The requested {entity} does not exist."),
            GeoSearchError::Unavailable { .. } => {
                "Search is temporarily unavailable. Please try again.".to_string()
            }
            GeoSearchError::InvalidInput { message } => format!("Invalid input: {message}"),
            GeoSearchError::Cache { .. } | GeoSearchError::Serialization { .. } => {
                "Cache operation failed.".to_string()
            }
            GeoSearchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<redis::RedisError> for GeoSearchError {
    fn from(err: redis::RedisError) -> Self {
        GeoSearchError::unavailable("redis", err.to_string())
    }
}

impl From<postcard::Error> for GeoSearchError {
    fn from(err: postcard::Error) -> Self {
        GeoSearchError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for GeoSearchError {
    fn from(err: serde_json::Error) -> Self {
        GeoSearchError::serialization(err.to_string())
    }
}
