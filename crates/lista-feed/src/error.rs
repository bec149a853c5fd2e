use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The locator resource could not be read or named no snapshot.
    #[error("snapshot locator unavailable at {url}: {reason}")]
    LocatorUnavailable { url: String, reason: String },

    /// Connection failure or non-success status while downloading a snapshot.
    #[error("transfer of {url} failed: {reason}")]
    Transfer {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("gzip decompression failed: {0}")]
    Decompression(#[source] std::io::Error),

    /// The decompressed payload is not valid UTF-8 or not a valid catalog.
    #[error("catalog parse error for {context}: {reason}")]
    Parse { context: String, reason: String },

    /// Reading or writing the persisted snapshot cache failed.
    #[error("snapshot cache error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid feed URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(#[source] reqwest::Error),
}

/// Payload-free classification of a [`FeedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocatorUnavailable,
    Transfer,
    Decompression,
    Parse,
    Storage,
    Configuration,
}

impl FeedError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LocatorUnavailable { .. } => ErrorKind::LocatorUnavailable,
            Self::Transfer { .. } => ErrorKind::Transfer,
            Self::Decompression(_) => ErrorKind::Decompression,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::InvalidUrl { .. } | Self::ClientSetup(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn transfer(url: &str, err: &reqwest::Error) -> Self {
        Self::Transfer {
            url: url.to_owned(),
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }

    pub(crate) fn storage(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            source: source.into(),
        }
    }
}
