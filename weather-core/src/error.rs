use std::{fmt, time::Duration};

use thiserror::Error;
use tokio::task::JoinError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a single temperature provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The data source could not be reached, or answered with an error status.
    #[error("{provider}: {message}")]
    Io {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The response body did not have the expected shape.
    #[error("{provider}: failed to decode response")]
    Decode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response decoded but did not contain a usable reading.
    #[error("{provider}: {message}")]
    Data { provider: String, message: String },

    #[error("{provider}: no reading within {after:?}")]
    Timeout { provider: String, after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Io,
    Decode,
    Data,
    Timeout,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderErrorKind::Io => "io",
            ProviderErrorKind::Decode => "decode",
            ProviderErrorKind::Data => "data",
            ProviderErrorKind::Timeout => "timeout",
        })
    }
}

impl ProviderError {
    pub fn io<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::Io {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn io_with_source<P, M, E>(provider: P, message: M, source: E) -> Self
    where
        P: Into<String>,
        M: Into<String>,
        E: Into<BoxError>,
    {
        Self::Io {
            provider: provider.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn decode<P: Into<String>>(provider: P, source: serde_json::Error) -> Self {
        Self::Decode {
            provider: provider.into(),
            source,
        }
    }

    pub fn data<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::Data {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Name of the provider that failed.
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Io { provider, .. }
            | ProviderError::Decode { provider, .. }
            | ProviderError::Data { provider, .. }
            | ProviderError::Timeout { provider, .. } => provider,
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Io { .. } => ProviderErrorKind::Io,
            ProviderError::Decode { .. } => ProviderErrorKind::Decode,
            ProviderError::Data { .. } => ProviderErrorKind::Data,
            ProviderError::Timeout { .. } => ProviderErrorKind::Timeout,
        }
    }
}

/// Failure of a whole aggregation call.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no temperature providers configured")]
    NoProviders,

    /// The first provider failure observed, passed through unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider task did not complete")]
    Task(#[from] JoinError),

    #[error("aggregation cancelled")]
    Cancelled,
}

impl AggregateError {
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            AggregateError::Provider(err) => Some(err),
            _ => None,
        }
    }
}
