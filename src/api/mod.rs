//! NASA APOD integration
//!
//! Fetches picture metadata for a date, downloads the image and keeps a
//! local PNG copy per date.

pub mod apod;
pub mod date;

#[cfg(test)]
pub(crate) mod test_server;

pub use apod::{date_from_cache_path, validate_request, ApodClient, Entry};
pub use date::{is_valid_date, parse_date};
