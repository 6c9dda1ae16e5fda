// ! Source locator validation
// !
// ! Plugin artifacts are only fetched from absolute network addresses.

use url::Url;

use crate::core::error::{UpdaterError, UpdaterResult};

/// Schemes accepted for plugin sources
pub const NETWORK_SCHEMES: [&str; 2] = ["http", "https"];

/// Parse `locator` as an absolute `http`/`https` URL with a host
pub fn parse_network_url(locator: &str) -> UpdaterResult<Url> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return Err(UpdaterError::configuration("locator is empty"));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| UpdaterError::configuration(format!("invalid locator '{trimmed}': {e}")))?;

    if !NETWORK_SCHEMES.contains(&url.scheme()) {
        return Err(UpdaterError::configuration(format!(
            "locator '{trimmed}' must use http or https, not '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UpdaterError::configuration(format!(
            "locator '{trimmed}' has no host"
        )));
    }

    Ok(url)
}

/// Whether `locator` is a well-formed absolute network address
pub fn is_network_url(locator: &str) -> bool {
    parse_network_url(locator).is_ok()
}
