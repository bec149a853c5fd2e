//! Endpoint and snapshot URL construction for the feed client.

use reqwest::Url;

use crate::error::FeedError;

/// Resolves `path` against the configured feed origin.
///
/// The base is normalised to end with exactly one slash, so relative paths
/// nest under it while absolute paths (`/price-lists-json/...`) replace its path.
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> Result<Url, FeedError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    let base = Url::parse(&normalised).map_err(|e| FeedError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if base.cannot_be_a_base() {
        return Err(FeedError::InvalidUrl {
            url: base_url.to_owned(),
            reason: "URL cannot be used as a base".to_owned(),
        });
    }
    base.join(path).map_err(|e| FeedError::InvalidUrl {
        url: format!("{normalised}{path}"),
        reason: e.to_string(),
    })
}

/// Builds `{prefix}/{identifier}`, percent-encoding the identifier as a
/// single path segment.
pub(crate) fn snapshot_url(prefix: &Url, identifier: &str) -> Result<Url, FeedError> {
    validate_identifier(identifier).map_err(|reason| FeedError::InvalidUrl {
        url: format!("{prefix}/{identifier}"),
        reason,
    })?;

    let mut url = prefix.clone();
    url.path_segments_mut()
        .map_err(|()| FeedError::InvalidUrl {
            url: prefix.to_string(),
            reason: "URL cannot be used as a base".to_owned(),
        })?
        .pop_if_empty()
        .push(identifier);
    Ok(url)
}

/// Checks that a published identifier is usable as one path segment.
pub(crate) fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.is_empty() {
        return Err("identifier is empty".to_owned());
    }
    if identifier == "." || identifier == ".." {
        return Err(format!("identifier \"{identifier}\" is a relative path"));
    }
    if identifier.contains(['/', '\\']) {
        return Err(format!(
            "identifier \"{identifier}\" contains a path separator"
        ));
    }
    if identifier.chars().any(char::is_control) {
        return Err("identifier contains control characters".to_owned());
    }
    Ok(())
}
