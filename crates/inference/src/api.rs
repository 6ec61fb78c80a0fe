//! REST client for the inference service prediction endpoints.
//!
//! Uploads a single file as multipart field `file` and decodes the
//! detections plus an optional annotated copy of the media.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use breedid_core::detection::Detection;
use breedid_core::media::MediaKind;
use serde::Deserialize;

/// Default per-call timeout for photo predictions.
pub const PHOTO_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-call timeout for video predictions.
pub const VIDEO_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client for the inference service.
#[derive(Clone)]
pub struct InferenceApi {
    client: reqwest::Client,
    base_url: String,
    photo_timeout: Duration,
    video_timeout: Duration,
}

/// Body returned by both prediction endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceResponse {
    /// Required. An empty list is a valid answer; a missing key is not.
    pub predictions: Vec<Detection>,
    #[serde(default)]
    pub processed_media: Option<ProcessedMedia>,
}

/// Annotated media produced by the model, base64 encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessedMedia {
    pub data: String,
    /// File extension without the dot, e.g. `jpg` or `mp4`.
    pub format: String,
}

impl ProcessedMedia {
    /// Decode the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, InferenceError> {
        STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| InferenceError::Decode(format!("processed media: {e}")))
    }

    /// Extension safe to use in a filename: ASCII alphanumerics only.
    pub fn safe_extension(&self) -> Option<String> {
        let ext = self.format.trim().trim_start_matches('.').to_ascii_lowercase();
        if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(ext)
        } else {
            None
        }
    }
}

/// Errors from the inference API layer.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service did not answer within the per-kind timeout.
    #[error("Inference request timed out after {0:?}")]
    Timeout(Duration),

    /// The service returned a non-2xx status code.
    #[error("Inference API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered 2xx with a body we could not use.
    #[error("Malformed inference response: {0}")]
    Decode(String),
}

impl InferenceApi {
    /// Create a new API client.
    ///
    /// * `base_url` - e.g. `http://localhost:8000`, without trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            photo_timeout: PHOTO_TIMEOUT,
            video_timeout: VIDEO_TIMEOUT,
        }
    }

    /// Override the per-kind timeouts.
    pub fn with_timeouts(mut self, photo: Duration, video: Duration) -> Self {
        self.photo_timeout = photo;
        self.video_timeout = video;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint and timeout used for a media kind.
    pub fn route_for(&self, kind: MediaKind) -> (String, Duration) {
        match kind {
            MediaKind::Photo => (format!("{}/predict", self.base_url), self.photo_timeout),
            MediaKind::Video => (format!("{}/predict/video", self.base_url), self.video_timeout),
        }
    }

    /// Upload one file and return the decoded detections.
    pub async fn predict(
        &self,
        kind: MediaKind,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> Result<InferenceResponse, InferenceError> {
        let (url, timeout) = self.route_for(kind);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(timeout)
                } else {
                    InferenceError::Request(e)
                }
            })?;

        Self::parse_response(response, timeout).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`InferenceError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body.
    async fn parse_response(
        response: reqwest::Response,
        timeout: Duration,
    ) -> Result<InferenceResponse, InferenceError> {
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout(timeout)
            } else {
                InferenceError::Request(e)
            }
        })?;
        serde_json::from_slice(&body).map_err(|e| InferenceError::Decode(e.to_string()))
    }
}
