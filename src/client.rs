use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{DashboardError, Result};
use crate::presentation::{normalize, normalize_history};
use crate::types::{AnalysisRecord, Config, UploadReceipt};

/// Audio formats the analysis service accepts, with the MIME type sent for each.
pub const ACCEPTED_AUDIO_FORMATS: &[(&str, &str)] = &[
    ("wav", "audio/wav"),
    ("mp3", "audio/mpeg"),
    ("flac", "audio/flac"),
];

/// Thin HTTP wrapper around the analysis service endpoints.
///
/// The shared-secret header is installed once as a default header, so every
/// request carries it.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
    max_upload_bytes: u64,
}

impl AnalysisClient {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let header_name = HeaderName::from_bytes(cfg.api_key_header.as_bytes())
            .with_context(|| format!("Invalid VOICE_API_KEY_HEADER {:?}", cfg.api_key_header))?;
        let mut header_value = HeaderValue::from_str(&cfg.api_key)
            .context("VOICE_API_KEY is not a valid header value")?;
        header_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header_name, header_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            max_upload_bytes: cfg.max_upload_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /patients/{id}/analysis`, normalized.
    pub async fn fetch_latest(&self, patient_id: &str) -> Result<AnalysisRecord> {
        let body = self.get_json(&format!("/patients/{}/analysis", patient_id)).await?;
        normalize(&body)
    }

    /// `GET /patients/{id}/history`, normalized in the order received.
    pub async fn fetch_history(&self, patient_id: &str) -> Result<Vec<AnalysisRecord>> {
        let body = self.get_json(&format!("/patients/{}/history", patient_id)).await?;
        normalize_history(&body)
    }

    /// `POST /patients/{id}/voice-samples` as a multipart `file` upload.
    ///
    /// Every failure, including local checks, comes back as `UploadFailure`.
    pub async fn upload_sample(&self, patient_id: &str, path: &Path) -> Result<UploadReceipt> {
        let mime = audio_mime_type(path)?;

        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| DashboardError::upload(format!("cannot read {}: {}", path.display(), e)))?
            .len();
        if size > self.max_upload_bytes {
            return Err(DashboardError::upload(format!(
                "{} is {} bytes, limit is {} bytes",
                path.display(),
                size,
                self.max_upload_bytes
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DashboardError::upload(format!("cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| DashboardError::upload(e.to_string()))?;
        let form = Form::new().part("file", part);

        let url = format!("{}/patients/{}/voice-samples", self.base_url, patient_id);
        info!("uploading {} ({} bytes) for patient {}", path.display(), size, patient_id);
        let res = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DashboardError::upload(format!("request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("voice sample upload failed: {} - {}", status, body);
            return Err(DashboardError::upload(format!("service returned {}: {}", status, body)));
        }

        // A 2xx means the sample was stored; the body is a bonus.
        let body = res.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<Value>(&body)
            .map_err(|e| DashboardError::malformed(e.to_string()))
            .and_then(|v| normalize(&v));
        let record = match parsed {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("upload acknowledged but response was not a usable analysis: {}", e);
                None
            }
        };

        Ok(UploadReceipt {
            status: status.as_u16(),
            record,
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let res = self.http.get(&url).send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("GET {} failed: {} - {}", path, status, body);
            return Err(DashboardError::ServiceStatus { status, body });
        }

        let body = res.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| DashboardError::malformed(format!("response body is not JSON: {}", e)))
    }
}

/// MIME type for an accepted audio file, matched on extension (case-insensitive).
pub fn audio_mime_type(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| DashboardError::upload(format!("{} has no file extension", path.display())))?;

    ACCEPTED_AUDIO_FORMATS
        .iter()
        .find(|(accepted, _)| *accepted == ext)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| {
            DashboardError::upload(format!(
                "unsupported audio format .{} (expected .wav, .mp3 or .flac)",
                ext
            ))
        })
}
