//! HTTP implementations of the label and metadata services.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ImageInfo, LabelService, MetadataSource};
use crate::error::{ConfigurationError, LookupError};
use crate::tile::TilingParameters;

/// Default per-request timeout for HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

fn map_transport(err: reqwest::Error, timeout: Duration) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout(timeout)
    } else {
        LookupError::Network(err.to_string())
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    urls: &'a [String],
}

#[derive(Deserialize)]
struct SingleResponse {
    #[serde(default)]
    label: Option<String>,
}

/// Decode a batch response body: a JSON object from url to label.
///
/// `null` and empty labels count as absent.
pub fn decode_batch(body: &[u8]) -> Result<HashMap<String, String>, LookupError> {
    let raw: HashMap<String, Option<String>> =
        serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
    Ok(raw
        .into_iter()
        .filter_map(|(url, label)| label.filter(|l| !l.is_empty()).map(|l| (url, l)))
        .collect())
}

/// Decode a single-lookup response body: `{"label": "..."}` or `{"label": null}`.
pub fn decode_single(body: &[u8]) -> Result<Option<String>, LookupError> {
    let response: SingleResponse =
        serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
    Ok(response.label.filter(|l| !l.is_empty()))
}

/// Label service reached over HTTP.
///
/// - Batch: `POST {base}/labels/batch` with `{"urls": [...]}`
/// - Single: `GET {base}/labels?url=...`, where 404 means "no label"
#[derive(Debug, Clone)]
pub struct HttpLabelService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpLabelService {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = build_client(timeout)
            .map_err(|e| LookupError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn batch_endpoint(&self) -> String {
        format!("{}/labels/batch", self.base_url)
    }

    fn single_endpoint(&self) -> String {
        format!("{}/labels", self.base_url)
    }

    async fn post_batch(&self, urls: &[String]) -> Result<HashMap<String, String>, LookupError> {
        let endpoint = self.batch_endpoint();
        debug!(count = urls.len(), "Sending batched label lookup");

        let response = self
            .client
            .post(&endpoint)
            .json(&BatchRequest { urls })
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(LookupError::Status {
                status: response.status().as_u16(),
                url: endpoint,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;
        decode_batch(&body)
    }

    async fn get_single(&self, url: &str) -> Result<Option<String>, LookupError> {
        let endpoint = self.single_endpoint();

        let response = self
            .client
            .get(&endpoint)
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LookupError::Status {
                status: response.status().as_u16(),
                url: endpoint,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport(e, self.timeout))?;
        decode_single(&body)
    }
}

impl LabelService for HttpLabelService {
    fn lookup_batch<'a>(
        &'a self,
        urls: &'a [String],
    ) -> BoxFuture<'a, Result<HashMap<String, String>, LookupError>> {
        Box::pin(self.post_batch(urls))
    }

    fn lookup_one<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<String>, LookupError>> {
        Box::pin(self.get_single(url))
    }
}

/// Image metadata as served by `GET {base}/images/{image_set}/info`.
///
/// Every field is optional on the wire so a missing one can be reported by
/// name instead of as a generic decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct ImageInfoResponse {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub tile_size: Option<u32>,
    pub max_level: Option<u32>,
}

impl ImageInfoResponse {
    /// Check the response and turn it into validated [`ImageInfo`].
    pub fn into_image_info(self) -> Result<ImageInfo, ConfigurationError> {
        let width = self.width.ok_or(ConfigurationError::MissingField("width"))?;
        let height = self
            .height
            .ok_or(ConfigurationError::MissingField("height"))?;
        let tile_size = self
            .tile_size
            .ok_or(ConfigurationError::MissingField("tile_size"))?;
        let max_level = self
            .max_level
            .ok_or(ConfigurationError::MissingField("max_level"))?;

        let tiling = TilingParameters::new(width, height, tile_size);
        tiling.validate(max_level)?;
        Ok(ImageInfo { max_level, tiling })
    }
}

/// Metadata source reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMetadataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetadataSource {
    /// Create a client for the metadata service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigurationError> {
        let base_url = base_url.into();
        let client = build_client(timeout).map_err(|e| ConfigurationError::MetadataUnavailable {
            image_set: String::new(),
            reason: format!("Failed to create HTTP client: {}", e),
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, image_set: &str) -> Result<ImageInfo, ConfigurationError> {
        let unavailable = |reason: String| ConfigurationError::MetadataUnavailable {
            image_set: image_set.to_string(),
            reason,
        };

        let endpoint = format!("{}/images/{}/info", self.base_url, image_set);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let info: ImageInfoResponse =
            serde_json::from_slice(&body).map_err(|e| unavailable(e.to_string()))?;
        info.into_image_info()
    }
}

impl MetadataSource for HttpMetadataSource {
    fn image_info<'a>(&'a self, image_set: &'a str) -> BoxFuture<'a, Result<ImageInfo, ConfigurationError>> {
        Box::pin(self.fetch(image_set))
    }
}
