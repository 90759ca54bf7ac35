//! APOD fetcher
//!
//! One metadata request to the APOD endpoint, then one image download. The
//! image is re-encoded as PNG into the cache directory under a name derived
//! from the request date, replacing any earlier copy for that date.

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use super::date::is_valid_date;
use crate::config::ApodConfig;
use crate::error::ApodError;

static CACHE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"apod_(\d{4}-\d{2}-\d{2})\.png$").unwrap());

const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// One fetched picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Local PNG copy
    pub cache_path: PathBuf,
    pub title: String,
    /// The APOD "explanation" text
    pub description: String,
    /// Request date, `YYYY-MM-DD`
    pub date: String,
}

/// Successful APOD metadata response
#[derive(Debug, Deserialize)]
struct ApodResponse {
    media_type: Option<String>,
    url: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    explanation: String,
}

/// Error bodies. APOD itself replies `{"code": 400, "msg": "..."}`, the
/// api.nasa.gov gateway replies `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error: Option<GatewayError>,
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    message: Option<String>,
}

/// Check inputs before anything touches the network
pub fn validate_request(date: &str, api_key: &str) -> Result<(), ApodError> {
    if date.is_empty() || api_key.is_empty() {
        return Err(ApodError::MissingInput);
    }
    if !is_valid_date(date) {
        return Err(ApodError::InvalidDate(date.to_string()));
    }
    Ok(())
}

/// Recover the date from a cache file name such as `apod_images/apod_2020-10-10.png`
pub fn date_from_cache_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    CACHE_NAME_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Client for the APOD endpoint and the local image cache
#[derive(Debug, Clone)]
pub struct ApodClient {
    client: Client,
    endpoint: String,
    cache_dir: PathBuf,
}

impl ApodClient {
    pub fn new(config: &ApodConfig) -> Result<Self, ApodError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("APOD-Viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApodError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            cache_dir: config.cache_dir.clone(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the picture for `date` is stored
    pub fn cache_path_for(&self, date: &str) -> PathBuf {
        self.cache_dir.join(format!("apod_{}.png", date))
    }

    /// Fetch the picture for `date` and store it in the cache
    ///
    /// Returns `ApodError::NoImage` when the day's media is not an image
    /// (usually a video); nothing is written in that case.
    pub fn fetch(&self, date: &str, api_key: &str) -> Result<Entry, ApodError> {
        validate_request(date, api_key)?;

        log::info!("Fetching APOD for {}", date);
        let metadata = self.fetch_metadata(date, api_key)?;

        let url = match (metadata.media_type.as_deref(), metadata.url) {
            (Some("image"), Some(url)) => url,
            (media_type, _) => {
                log::info!("No image for {} (media_type: {:?})", date, media_type);
                return Err(ApodError::NoImage);
            }
        };

        let bytes = self.download(&url)?;
        let cache_path = self.store(date, &bytes)?;

        log::info!("Saved \"{}\" to {}", metadata.title, cache_path.display());
        Ok(Entry {
            cache_path,
            title: metadata.title,
            description: metadata.explanation,
            date: date.to_string(),
        })
    }

    fn fetch_metadata(&self, date: &str, api_key: &str) -> Result<ApodResponse, ApodError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("date", date), ("api_key", api_key)])
            .send()
            // The URL carries the API key, keep it out of messages and logs
            .map_err(|e| ApodError::Network(e.without_url().to_string()))?;

        let status = response.status();
        log::debug!("APOD metadata response: {}", status);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApodError::Auth);
        }

        let body = response
            .text()
            .map_err(|e| ApodError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(ApodError::Remote {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            ApodError::InvalidResponse(format!("{} (response: {}...)", e, preview))
        })
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, ApodError> {
        log::debug!("Downloading image from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ApodError::Network(format!("Failed to fetch image: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApodError::Network(format!(
                "HTTP error fetching image: {}",
                response.status()
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ApodError::Network(format!("Failed to read image bytes: {}", e)))
    }

    fn store(&self, date: &str, bytes: &[u8]) -> Result<PathBuf, ApodError> {
        let image =
            image::load_from_memory(bytes).map_err(|e| ApodError::ImageDecode(e.to_string()))?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| ApodError::ImageDecode(e.to_string()))?;

        fs::create_dir_all(&self.cache_dir).map_err(|source| ApodError::Cache {
            path: self.cache_dir.clone(),
            source,
        })?;

        let path = self.cache_path_for(date);
        fs::write(&path, &png).map_err(|source| ApodError::Cache {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg.or_else(|| b.error.and_then(|e| e.message)))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}
