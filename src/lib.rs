//! APOD Viewer Library
//!
//! Fetching, caching, favorites and export for NASA's Astronomy Picture of the Day.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod favorites;
pub mod gui;
pub mod logging;
pub mod session;

pub use error::ApodError;
