//! Favorites store
//!
//! A plain text file with one cached image path per line. Entries are only
//! ever appended. Reading back is round-robin through an in-memory cursor that
//! is re-clamped against the file on every read, so edits made outside the
//! app take effect immediately.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::ApodError;

/// How `add` decides that a path is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// A stored line must equal the path exactly
    #[default]
    ExactLine,
    /// The path appearing anywhere in the file counts as stored.
    /// Matches older favorites files but rejects paths that are a prefix
    /// of an existing entry (`apod_2020-10-1.png` vs `apod_2020-10-10.png`).
    Substring,
}

/// Result of adding a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// File-backed favorites list
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    policy: DuplicatePolicy,
    /// Index returned by the last `cycle_next`
    last_index: Option<usize>,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>, policy: DuplicatePolicy) -> Self {
        Self {
            path: path.into(),
            policy,
            last_index: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Append `image_path` unless it is already stored
    pub fn add(&self, image_path: &Path) -> Result<AddOutcome, ApodError> {
        let line = image_path.display().to_string();
        let existing = self.read_contents()?;

        let present = match self.policy {
            DuplicatePolicy::ExactLine => non_blank_lines(&existing).any(|l| l == line),
            DuplicatePolicy::Substring => existing.trim().contains(line.as_str()),
        };
        if present {
            log::debug!("{} already in favorites", line);
            return Ok(AddOutcome::AlreadyPresent);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Keep one path per line even if the file was hand-edited without a trailing newline
        if !existing.is_empty() && !existing.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{}", line)?;

        log::info!("Added {} to favorites", line);
        Ok(AddOutcome::Added)
    }

    /// Return the next stored path, wrapping back to the first after the last
    pub fn cycle_next(&mut self) -> Result<PathBuf, ApodError> {
        let entries = self.entries()?;
        if entries.is_empty() {
            return Err(ApodError::EmptyFavorites);
        }

        let index = self.last_index.map_or(0, |i| i + 1) % entries.len();
        self.last_index = Some(index);

        log::debug!("Favorite {}/{}: {}", index + 1, entries.len(), entries[index]);
        Ok(PathBuf::from(&entries[index]))
    }

    /// All stored paths, in file order
    pub fn entries(&self) -> Result<Vec<String>, ApodError> {
        let contents = self.read_contents()?;
        Ok(non_blank_lines(&contents).map(str::to_string).collect())
    }

    /// Whole file contents; a missing file reads as empty
    fn read_contents(&self) -> Result<String, ApodError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }
}

fn non_blank_lines(contents: &str) -> impl Iterator<Item = &str> {
    contents.lines().map(str::trim).filter(|l| !l.is_empty())
}
