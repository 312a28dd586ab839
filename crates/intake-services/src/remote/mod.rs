//! Remote URL fetching
//!
//! Two strategies:
//! - plain: one GET, body streamed to a temp file
//! - ranged: successive `Range` requests of `chunk_size` bytes appended to a temp file
//!
//! A 416 on the first ranged request falls back to plain. A 416 later on means the
//! resource is exhausted. Each request carries its own timeout, so a ranged download is
//! bounded by timeout times the number of requests. The temp file is removed on every
//! path that does not hand it to the caller.

mod guard;
mod range;

pub use guard::check_url;
pub use range::ContentRange;

use crate::source::FilePayload;
use intake_core::config::UrlDownloadConfig;
use intake_core::models::FetchOverrides;
use intake_core::UploadError;
use intake_processing::mime;
use range::range_header;
use reqwest::header::{ACCEPT, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Effective limits of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub chunked: bool,
    pub chunk_size: u64,
    /// Per request.
    pub timeout: Duration,
    pub max_size: u64,
}

impl FetchOptions {
    pub fn resolve(config: &UrlDownloadConfig, overrides: &FetchOverrides) -> Self {
        Self {
            chunked: overrides.chunked.unwrap_or(config.chunked),
            chunk_size: overrides.chunk_size.unwrap_or(config.chunk_size).max(1),
            timeout: Duration::from_secs(overrides.timeout_secs.unwrap_or(config.timeout_secs)),
            max_size: overrides.max_size.unwrap_or(config.max_size),
        }
    }
}

struct Download {
    file: NamedTempFile,
    size: u64,
    content_type: Option<String>,
}

fn spool() -> Result<(NamedTempFile, tokio::fs::File), UploadError> {
    let file = tempfile::Builder::new().prefix("intake-fetch-").tempfile()?;
    let out = tokio::fs::File::from_std(file.reopen()?);
    Ok((file, out))
}

fn request_error(url: &Url, err: reqwest::Error) -> UploadError {
    let status = err.status().map(|s| s.as_u16());
    if err.is_timeout() {
        UploadError::remote(status, format!("Request to {} timed out", url))
    } else {
        UploadError::remote(status, format!("Request to {} failed: {}", url, err))
    }
}

fn too_large(size: u64, max: u64) -> UploadError {
    UploadError::remote(
        None,
        format!("Remote file exceeds maximum size of {} bytes ({} bytes)", max, size),
    )
}

fn header_str(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Append the response body to `out`. `offset` is what the file already holds.
async fn copy_body(
    mut response: Response,
    out: &mut tokio::fs::File,
    url: &Url,
    offset: u64,
    max_size: u64,
) -> Result<u64, UploadError> {
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(|e| request_error(url, e))? {
        written += chunk.len() as u64;
        if offset + written > max_size {
            return Err(too_large(offset + written, max_size));
        }
        out.write_all(&chunk).await?;
    }
    Ok(written)
}

pub struct RemoteFetcher {
    client: Client,
    config: UrlDownloadConfig,
}

impl RemoteFetcher {
    pub fn new(config: UrlDownloadConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UploadError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: UrlDownloadConfig) -> Self {
        Self { client, config }
    }

    pub fn options(&self, overrides: &FetchOverrides) -> FetchOptions {
        FetchOptions::resolve(&self.config, overrides)
    }

    /// Download `url` into a spooled payload named after the URL with a content-derived
    /// extension.
    #[tracing::instrument(skip(self, options), fields(url = %url, chunked = options.chunked))]
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FilePayload, UploadError> {
        let start = std::time::Instant::now();
        let parsed = check_url(url, self.config.allowed_hosts.as_deref())?;

        let download = if options.chunked {
            match self.fetch_ranged(&parsed, options).await? {
                Some(download) => download,
                None => {
                    tracing::debug!("Range requests not satisfiable, retrying as plain fetch");
                    self.fetch_plain(&parsed, options).await?
                }
            }
        } else {
            self.fetch_plain(&parsed, options).await?
        };

        let payload = self.finish(&parsed, download).await?;
        tracing::info!(
            name = %payload.original_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote file fetched"
        );
        Ok(payload)
    }

    async fn fetch_plain(&self, url: &Url, options: &FetchOptions) -> Result<Download, UploadError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "*/*")
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::remote(
                Some(status.as_u16()),
                format!("GET {} returned {}", url, status),
            ));
        }
        if let Some(len) = response.content_length() {
            if len > options.max_size {
                return Err(too_large(len, options.max_size));
            }
        }

        let content_type = header_str(&response, CONTENT_TYPE);
        let (file, mut out) = spool()?;
        let size = copy_body(response, &mut out, url, 0, options.max_size).await?;
        out.flush().await?;

        Ok(Download {
            file,
            size,
            content_type,
        })
    }

    /// Ranged download. `Ok(None)` means ranges are unsupported and plain fetch should be used.
    async fn fetch_ranged(
        &self,
        url: &Url,
        options: &FetchOptions,
    ) -> Result<Option<Download>, UploadError> {
        let (file, mut out) = spool()?;
        let mut downloaded = 0u64;
        let mut total: Option<u64> = None;
        let mut content_type = None;

        loop {
            if matches!(total, Some(t) if downloaded >= t) {
                break;
            }

            let response = self
                .client
                .get(url.clone())
                .header(ACCEPT, "*/*")
                .header(RANGE, range_header(downloaded, options.chunk_size))
                .timeout(options.timeout)
                .send()
                .await
                .map_err(|e| request_error(url, e))?;

            let status = response.status();
            if status == StatusCode::RANGE_NOT_SATISFIABLE {
                if downloaded == 0 {
                    return Ok(None);
                }
                // End of resource
                break;
            }
            if content_type.is_none() {
                content_type = header_str(&response, CONTENT_TYPE);
            }

            if status == StatusCode::OK {
                if downloaded > 0 {
                    return Err(UploadError::remote(
                        Some(200),
                        format!("Server ignored range request at offset {}", downloaded),
                    ));
                }
                // Whole resource in one response
                if let Some(len) = response.content_length() {
                    if len > options.max_size {
                        return Err(too_large(len, options.max_size));
                    }
                }
                downloaded = copy_body(response, &mut out, url, 0, options.max_size).await?;
                break;
            }

            if status != StatusCode::PARTIAL_CONTENT {
                return Err(UploadError::remote(
                    Some(status.as_u16()),
                    format!("Range request at offset {} returned {}", downloaded, status),
                ));
            }

            let range = header_str(&response, CONTENT_RANGE)
                .as_deref()
                .and_then(ContentRange::parse);
            if let Some(range) = range {
                if range.start != downloaded {
                    return Err(UploadError::remote(
                        Some(206),
                        format!(
                            "Server returned range starting at {} instead of {}",
                            range.start, downloaded
                        ),
                    ));
                }
                if let Some(t) = range.total {
                    if t > options.max_size {
                        return Err(too_large(t, options.max_size));
                    }
                    total = Some(t);
                }
            }

            let received = copy_body(response, &mut out, url, downloaded, options.max_size).await?;
            downloaded += received;
            tracing::debug!(received = received, downloaded = downloaded, total = ?total, "Range chunk received");

            if received == 0 {
                break;
            }
            // Without a Content-Range the accumulated size is final.
            if range.is_none() {
                break;
            }
            if total.is_none() && received < options.chunk_size {
                break;
            }
        }

        out.flush().await?;
        Ok(Some(Download {
            file,
            size: downloaded,
            content_type,
        }))
    }

    /// Detect the type, enforce the allow-list and name the download.
    async fn finish(&self, url: &Url, download: Download) -> Result<FilePayload, UploadError> {
        let mut head = Vec::with_capacity(mime::SNIFF_LEN);
        tokio::fs::File::open(download.file.path())
            .await?
            .take(mime::SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .await?;

        let declared = download
            .content_type
            .as_deref()
            .map(mime::essence)
            .filter(|m| !m.is_empty() && m != mime::OCTET_STREAM)
            .or_else(|| mime::mime_from_name(url.path()));
        let mime_type = mime::detect(&head, declared.as_deref());

        if !self.config.is_mime_allowed(&mime_type) {
            return Err(UploadError::remote(
                None,
                format!("Content type '{}' is not allowed", mime_type),
            ));
        }

        let extension = mime::extension_for(&mime_type, Some(url.path()));
        let stem = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|segment| match segment.rsplit_once('.') {
                Some((stem, _)) => stem,
                None => segment,
            })
            .filter(|stem| !stem.is_empty())
            .unwrap_or("download");

        tracing::debug!(
            mime_type = %mime_type,
            size_bytes = download.size,
            "Remote content identified"
        );

        Ok(FilePayload::spooled(
            format!("{}.{}", stem, extension),
            Some(mime_type),
            download.file,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_resolve_overrides() {
        let config = UrlDownloadConfig::default();
        let defaults = FetchOptions::resolve(&config, &FetchOverrides::default());
        assert!(defaults.chunked);
        assert_eq!(defaults.chunk_size, config.chunk_size);
        assert_eq!(defaults.timeout, Duration::from_secs(config.timeout_secs));

        let overridden = FetchOptions::resolve(
            &config,
            &FetchOverrides {
                timeout_secs: Some(5),
                max_size: Some(10),
                chunk_size: Some(0),
                chunked: Some(false),
            },
        );
        assert!(!overridden.chunked);
        assert_eq!(overridden.chunk_size, 1);
        assert_eq!(overridden.timeout, Duration::from_secs(5));
        assert_eq!(overridden.max_size, 10);
    }

    #[tokio::test]
    async fn test_disallowed_host_makes_no_request() {
        let config = UrlDownloadConfig {
            allowed_hosts: Some(vec!["example.com".to_string()]),
            ..UrlDownloadConfig::default()
        };
        let fetcher = RemoteFetcher::new(config).unwrap();
        let options = fetcher.options(&FetchOverrides::default());
        let err = fetcher
            .fetch("http://127.0.0.1:9/file.png", &options)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not in the allowed list"));
    }
}
