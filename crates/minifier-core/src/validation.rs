use crate::error::CoreError;
use url::Url;

/// Checks that `long_url` is an absolute http(s) URL with a host.
pub fn validate_url(long_url: &str) -> Result<(), CoreError> {
    if long_url.is_empty() {
        return Err(CoreError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let parsed =
        Url::parse(long_url).map_err(|e| CoreError::InvalidUrl(format!("{long_url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CoreError::InvalidUrl(format!(
                "URL scheme must be http or https: {other}"
            )))
        }
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => {
            return Err(CoreError::InvalidUrl(format!(
                "URL must have a host: {long_url}"
            )))
        }
    }

    Ok(())
}
