//! HTTP client for the published price-list feed.
//!
//! Two resources are involved: the locator, a small text file naming the
//! current snapshot, and the snapshot itself, a gzip-compressed JSON array
//! published under a fixed path prefix. Neither request is retried here;
//! retry policy belongs to whoever triggers the sync.

mod urls;

use std::time::Duration;

use futures::Stream;
use lista_core::{AppConfig, Catalog, SnapshotId};
use reqwest::{Client, Response, Url};

use crate::decode::{collect_text, text_chunks};
use crate::error::FeedError;
use crate::wire::parse_catalog;

pub(crate) use urls::validate_identifier;

pub const DEFAULT_LOCATOR_PATH: &str = "/price-lists-json/latest-json-filename.txt";
pub const DEFAULT_SNAPSHOT_PREFIX: &str = "/price-lists-json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "lista/0.1 (price-catalog)";

/// Client for the locator and snapshot endpoints of one feed origin.
///
/// Use [`FeedClient::from_config`] in production or
/// [`FeedClient::with_base_url`] to point at a mock server in tests.
pub struct FeedClient {
    client: Client,
    locator_url: Url,
    snapshot_prefix: Url,
}

impl FeedClient {
    /// Creates a client for the endpoints described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] if the configured origin or paths do
    /// not form valid URLs, or [`FeedError::ClientSetup`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, FeedError> {
        Self::new(
            &config.feed_base_url,
            &config.locator_path,
            &config.snapshot_prefix,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with the default locator path and snapshot prefix.
    ///
    /// # Errors
    ///
    /// See [`FeedClient::from_config`].
    pub fn with_base_url(base_url: &str) -> Result<Self, FeedError> {
        Self::new(
            base_url,
            DEFAULT_LOCATOR_PATH,
            DEFAULT_SNAPSHOT_PREFIX,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_USER_AGENT,
        )
    }

    /// # Errors
    ///
    /// See [`FeedClient::from_config`].
    pub fn new(
        base_url: &str,
        locator_path: &str,
        snapshot_prefix: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(FeedError::ClientSetup)?;

        Ok(Self {
            client,
            locator_url: urls::endpoint_url(base_url, locator_path)?,
            snapshot_prefix: urls::endpoint_url(base_url, snapshot_prefix)?,
        })
    }

    #[must_use]
    pub fn locator_url(&self) -> &Url {
        &self.locator_url
    }

    /// URL a snapshot with this identifier is published at.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] if the identifier is not a single
    /// path segment (empty, `..`, contains `/`, ...).
    pub fn snapshot_url(&self, identifier: &SnapshotId) -> Result<Url, FeedError> {
        urls::snapshot_url(&self.snapshot_prefix, identifier.as_str())
    }

    /// Reads the locator resource and returns its trimmed contents.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::LocatorUnavailable`] on connection failure, a
    /// non-success status, an empty body, or a body that is not usable as a
    /// snapshot name.
    pub async fn resolve_latest(&self) -> Result<SnapshotId, FeedError> {
        let url = self.locator_url.as_str();
        let unavailable = |reason: String| FeedError::LocatorUnavailable {
            url: url.to_owned(),
            reason,
        };

        tracing::debug!(url, "resolving latest snapshot identifier");
        let response = self
            .client
            .get(self.locator_url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("unexpected HTTP status {}", status.as_u16())));
        }

        let body = response.text().await.map_err(|e| unavailable(e.to_string()))?;
        let identifier = body.trim();
        validate_identifier(identifier).map_err(unavailable)?;

        tracing::debug!(identifier, "resolved latest snapshot identifier");
        Ok(SnapshotId::new(identifier))
    }

    /// Downloads, decompresses and decodes the snapshot named `identifier`.
    ///
    /// The body is decompressed chunk by chunk as it arrives; only the
    /// decoded text is accumulated before parsing. Nothing is cached here.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidUrl`] if the identifier is not a valid path segment.
    /// - [`FeedError::Transfer`] on connection failure or a non-success status.
    /// - [`FeedError::Decompression`] if the body is not valid gzip.
    /// - [`FeedError::Parse`] if the text is not valid UTF-8 or not a valid catalog.
    pub async fn fetch_snapshot(&self, identifier: &SnapshotId) -> Result<Catalog, FeedError> {
        let url = self.snapshot_url(identifier)?;
        tracing::info!(%identifier, url = %url, "fetching snapshot");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FeedError::transfer(url.as_str(), &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Transfer {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("unexpected HTTP status {}", status.as_u16()),
            });
        }

        let body = Box::pin(body_chunks(response, url.to_string()));
        let text = collect_text(text_chunks(body)).await?;
        let catalog = parse_catalog(&text, identifier.as_str())?;

        tracing::info!(%identifier, products = catalog.len(), "decoded snapshot");
        Ok(catalog)
    }
}

/// Adapts a response body into a stream of raw network chunks.
fn body_chunks(
    response: Response,
    url: String,
) -> impl Stream<Item = Result<impl AsRef<[u8]>, FeedError>> {
    futures::stream::try_unfold(response, move |mut response| {
        let url = url.clone();
        async move {
            let chunk = response
                .chunk()
                .await
                .map_err(|e| FeedError::transfer(&url, &e))?;
            Ok::<_, FeedError>(chunk.map(|chunk| (chunk, response)))
        }
    })
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
