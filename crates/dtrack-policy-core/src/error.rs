//! Error types for policy reconciliation.
//!
//! Every fallible operation in the engine and in remote accessors returns
//! [`ApplyError`]. The synchronizer decides per pass whether a
//! [`ApplyError::NotFound`] is tolerated; every other variant aborts the run.

use std::fmt;

/// Errors that can occur while building desired state or applying it.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// A named remote entity does not exist.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Kind of entity that was looked up (policy, tag, project, ...).
        kind: &'static str,
        /// Name, UUID or name:version used for the lookup.
        key: String,
    },

    /// The request never produced a usable response (connect, timeout, decode).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The remote service answered with a non-success status other than 404.
    #[error("Service error (HTTP {status}): {message}")]
    Service {
        /// HTTP status code returned by the service.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The condition document could not be parsed.
    #[error("Malformed input: {message}")]
    MalformedInput {
        /// Parser diagnostic.
        message: String,
    },

    /// Command-line or environment configuration is unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Which setting is wrong and why.
        message: String,
    },
}

impl ApplyError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `Service` error.
    #[must_use]
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `MalformedInput` error.
    #[must_use]
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for network, timeout and service failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Service { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Transport { .. } | Self::Service { .. } => ErrorCategory::Transport,
            Self::MalformedInput { .. } => ErrorCategory::Input,
            Self::InvalidConfig { .. } => ErrorCategory::Config,
        }
    }
}

/// Categories of apply errors for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Remote entity missing.
    NotFound,
    /// Network or service failure.
    Transport,
    /// Unparsable condition document.
    Input,
    /// Bad flags or environment.
    Config,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Transport => write!(f, "transport"),
            Self::Input => write!(f, "input"),
            Self::Config => write!(f, "config"),
        }
    }
}
