//! Error type shared by the fetcher, favorites store, export and controller

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the user as notifications
#[derive(Error, Debug)]
pub enum ApodError {
    #[error("Please fill both API key and date fields")]
    MissingInput,

    #[error("Invalid date \"{0}\" (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid or missing API key. Please check your API key.")]
    Auth,

    #[error("{status} error: {message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response from APOD service: {0}")]
    InvalidResponse(String),

    #[error("No image available for the selected date")]
    NoImage,

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to write cache file {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Favorites file error: {0}")]
    Favorites(#[from] std::io::Error),

    #[error("No image in favorites")]
    EmptyFavorites,

    #[error("Error saving image: {0}")]
    ExportFailure(String),

    #[error("Fetch a photo before doing that")]
    MissingCurrentImage,

    #[error("A fetch is already in progress")]
    FetchInProgress,
}

impl ApodError {
    /// Short title for the notification window
    pub fn title(&self) -> &'static str {
        match self {
            ApodError::MissingInput => "Empty Fields",
            ApodError::InvalidDate(_) => "Invalid date",
            ApodError::Auth => "API Key Error",
            ApodError::Remote { status, .. } if *status >= 500 => "Server error",
            ApodError::Remote { .. } => "Client error",
            ApodError::Network(_) => "Request Error",
            ApodError::InvalidResponse(_) => "Bad Response",
            ApodError::NoImage => "No Image",
            ApodError::ImageDecode(_) => "Image Error",
            ApodError::Cache { .. } => "Cache Error",
            ApodError::Favorites(_) => "Favorites Error",
            ApodError::EmptyFavorites => "Empty Favorites",
            ApodError::ExportFailure(_) => "Save Error",
            ApodError::MissingCurrentImage => "No Image Loaded",
            ApodError::FetchInProgress => "Busy",
        }
    }

    /// Outcomes that are valid results rather than failures
    pub fn is_informational(&self) -> bool {
        matches!(self, ApodError::NoImage)
    }
}
