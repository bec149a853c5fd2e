//! Currency reference shown alongside the catalog.
//!
//! Display-only: failures are reported to the caller, which shows `N/A`.

use std::time::Duration;

use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::FeedError;

#[derive(Debug, Deserialize)]
struct RateResponse {
    venta: Decimal,
}

pub struct RateClient {
    client: Client,
    url: Url,
}

impl RateClient {
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] for an unparsable URL or
    /// [`FeedError::ClientSetup`] if the HTTP client cannot be built.
    pub fn new(url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, FeedError> {
        let url = Url::parse(url).map_err(|e| FeedError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(FeedError::ClientSetup)?;
        Ok(Self { client, url })
    }

    /// Fetches the current sale price.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Transfer`] on connection failure or a non-success
    /// status, and [`FeedError::Parse`] if the body has no numeric `venta`.
    pub async fn fetch_sale_price(&self) -> Result<Decimal, FeedError> {
        let url = self.url.as_str();
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| FeedError::transfer(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Transfer {
                url: url.to_owned(),
                status: Some(status.as_u16()),
                reason: format!("unexpected HTTP status {}", status.as_u16()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::transfer(url, &e))?;
        let parsed: RateResponse = serde_json::from_str(&body).map_err(|e| FeedError::Parse {
            context: format!("currency reference from {url}"),
            reason: e.to_string(),
        })?;

        tracing::debug!(sale = %parsed.venta, "fetched currency reference");
        Ok(parsed.venta)
    }
}

/// Formats a sale price as `$1234.50`, or `N/A` when unavailable.
#[must_use]
pub fn format_sale_price(price: Option<Decimal>) -> String {
    match price {
        Some(price) => format!("${:.2}", price.round_dp(2)),
        None => "N/A".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_pads_to_two_decimals() {
        assert_eq!(format_sale_price(Some(Decimal::new(12345, 1))), "$1234.50");
    }

    #[test]
    fn format_rounds_to_two_decimals() {
        assert_eq!(format_sale_price(Some(Decimal::new(1_234_567, 3))), "$1234.57");
    }

    #[test]
    fn format_unavailable() {
        assert_eq!(format_sale_price(None), "N/A");
    }
}
