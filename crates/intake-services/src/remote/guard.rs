//! URL admission checks applied before any remote request is made.

use intake_core::UploadError;
use reqwest::Url;

/// Parse `url` and reject anything but http(s) URLs whose host passes the allow-list.
///
/// A host passes when it equals an allowed entry or is a sub-domain of one.
/// `None` allows every host.
pub fn check_url(url: &str, allowed_hosts: Option<&[String]>) -> Result<Url, UploadError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| UploadError::remote(None, format!("Invalid URL '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UploadError::remote(
            None,
            format!("Unsupported URL scheme '{}'", parsed.scheme()),
        ));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| UploadError::remote(None, "URL must have a host"))?
        .to_lowercase();

    if let Some(allowed) = allowed_hosts {
        let is_allowed = allowed.iter().any(|entry| {
            let entry = entry.trim().to_lowercase();
            host == entry || host.ends_with(&format!(".{}", entry))
        });
        if !is_allowed {
            return Err(UploadError::remote(
                None,
                format!("Host '{}' is not in the allowed list", host),
            ));
        }
    }

    Ok(parsed)
}
