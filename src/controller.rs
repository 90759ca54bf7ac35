//! Viewer controller
//!
//! Owns everything the window shows: the fetched pictures, the favorites
//! store and which image is on screen. The GUI only calls methods here and
//! redraws from `displayed()` and `nav_state()`.

use std::path::{Path, PathBuf};

use crate::api::{date_from_cache_path, validate_request, ApodClient, Entry};
use crate::config::ApodConfig;
use crate::error::ApodError;
use crate::export::{export_image, ExportResult};
use crate::favorites::{AddOutcome, FavoritesStore};
use crate::session::SessionList;

/// What is currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Display {
    /// Nothing fetched or opened yet
    Intro,
    /// The session list's current entry
    Session,
    /// A path read back from the favorites file
    Favorite { path: PathBuf, label: String },
}

/// Borrowed view of the displayed picture
#[derive(Debug, Clone, Copy)]
pub struct Displayed<'a> {
    pub path: &'a Path,
    pub title: &'a str,
    pub description: &'a str,
}

/// Button enablement derived from controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavState {
    pub image_loaded: bool,
    pub can_favorite: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub fetch_in_flight: bool,
}

/// The network half of a fetch, safe to run on a worker thread
#[derive(Debug)]
pub struct PendingFetch {
    client: ApodClient,
    date: String,
    api_key: String,
}

impl PendingFetch {
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn run(self) -> Result<Entry, ApodError> {
        self.client.fetch(&self.date, &self.api_key)
    }
}

pub struct Controller {
    client: ApodClient,
    session: SessionList<Entry>,
    favorites: FavoritesStore,
    display: Display,
    fetch_in_flight: bool,
}

impl Controller {
    pub fn new(config: &ApodConfig) -> Result<Self, ApodError> {
        let client = ApodClient::new(config)?;
        let favorites = FavoritesStore::new(config.favorites_file.clone(), config.duplicate_policy);
        log::info!(
            "Caching pictures in {}, favorites in {} ({:?})",
            client.cache_dir().display(),
            favorites.path().display(),
            favorites.policy()
        );
        Ok(Self::with_parts(client, favorites))
    }

    pub fn with_parts(client: ApodClient, favorites: FavoritesStore) -> Self {
        Self {
            client,
            session: SessionList::new(),
            favorites,
            display: Display::Intro,
            fetch_in_flight: false,
        }
    }

    /// Validate the inputs and claim the single fetch slot
    pub fn begin_fetch(&mut self, date: &str, api_key: &str) -> Result<PendingFetch, ApodError> {
        if self.fetch_in_flight {
            return Err(ApodError::FetchInProgress);
        }
        let date = date.trim();
        let api_key = api_key.trim();
        validate_request(date, api_key)?;

        self.fetch_in_flight = true;
        Ok(PendingFetch {
            client: self.client.clone(),
            date: date.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Record the outcome of a fetch started with `begin_fetch`
    ///
    /// On failure nothing but the in-flight flag changes.
    pub fn complete_fetch(&mut self, result: Result<Entry, ApodError>) -> Result<&Entry, ApodError> {
        self.fetch_in_flight = false;
        let entry = result?;

        log::debug!("Session now holds {} pictures", self.session.len() + 1);
        self.session.append(entry);
        self.display = Display::Session;
        self.session.current().ok_or(ApodError::MissingCurrentImage)
    }

    /// Fetch on the calling thread
    pub fn fetch(&mut self, date: &str, api_key: &str) -> Result<&Entry, ApodError> {
        let pending = self.begin_fetch(date, api_key)?;
        let result = pending.run();
        self.complete_fetch(result)
    }

    pub fn show_previous(&mut self) -> bool {
        self.step(SessionList::retreat)
    }

    pub fn show_next(&mut self) -> bool {
        self.step(SessionList::advance)
    }

    fn step(&mut self, move_cursor: fn(&mut SessionList<Entry>) -> bool) -> bool {
        let moved = move_cursor(&mut self.session);
        if moved {
            self.display = Display::Session;
        }
        moved
    }

    pub fn add_displayed_to_favorites(&mut self) -> Result<AddOutcome, ApodError> {
        let path = self
            .displayed()
            .map(|d| d.path.to_path_buf())
            .ok_or(ApodError::MissingCurrentImage)?;
        self.favorites.add(&path)
    }

    /// Read the next favorite and put it on screen
    pub fn show_next_favorite(&mut self) -> Result<PathBuf, ApodError> {
        let path = self.favorites.cycle_next()?;
        let label = match date_from_cache_path(&path) {
            Some(date) => format!("Favorite {}", date),
            None => "Favorite".to_string(),
        };
        self.display = Display::Favorite {
            path: path.clone(),
            label,
        };
        Ok(path)
    }

    pub fn export_displayed(&self, dest: &Path) -> Result<ExportResult, ApodError> {
        let displayed = self.displayed().ok_or(ApodError::MissingCurrentImage)?;
        export_image(displayed.path, dest)
    }

    pub fn displayed(&self) -> Option<Displayed<'_>> {
        match &self.display {
            Display::Intro => None,
            Display::Session => self.session.current().map(|entry| Displayed {
                path: &entry.cache_path,
                title: &entry.title,
                description: &entry.description,
            }),
            Display::Favorite { path, label } => Some(Displayed {
                path: path.as_path(),
                title: label.as_str(),
                description: "",
            }),
        }
    }

    /// Session entry under the cursor, regardless of what is displayed
    pub fn current_entry(&self) -> Option<&Entry> {
        self.session.current()
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn nav_state(&self) -> NavState {
        let image_loaded = self.displayed().is_some();
        NavState {
            image_loaded,
            can_favorite: image_loaded,
            prev_enabled: self.session.has_previous(),
            next_enabled: self.session.has_next(),
            fetch_in_flight: self.fetch_in_flight,
        }
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::png_bytes;
    use crate::favorites::DuplicatePolicy;

    struct Fixture {
        dir: tempfile::TempDir,
        controller: Controller,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = ApodConfig {
            endpoint: "http://127.0.0.1:9/planetary/apod".to_string(),
            cache_dir: dir.path().join("apod_images"),
            favorites_file: dir.path().join("favorites.txt"),
            duplicate_policy: DuplicatePolicy::ExactLine,
            ..ApodConfig::default()
        };
        let controller = Controller::new(&config).unwrap();
        Fixture { dir, controller }
    }

    /// Stand-in for a completed fetch, with a real cached file behind it
    fn entry(dir: &Path, date: &str) -> Entry {
        let cache_dir = dir.join("apod_images");
        std::fs::create_dir_all(&cache_dir).unwrap();
        let cache_path = cache_dir.join(format!("apod_{}.png", date));
        std::fs::write(&cache_path, png_bytes(2, 2)).unwrap();
        Entry {
            cache_path,
            title: format!("Picture of {}", date),
            description: "Stars.".to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_initial_state() {
        let f = fixture();
        assert_eq!(f.controller.display(), &Display::Intro);
        assert!(f.controller.displayed().is_none());
        assert_eq!(f.controller.nav_state(), NavState::default());
    }

    #[test]
    fn test_fetch_success_updates_nav_state() {
        let mut f = fixture();
        let e1 = entry(f.dir.path(), "2020-10-10");
        let e2 = entry(f.dir.path(), "2020-10-11");

        f.controller.begin_fetch("2020-10-10", "KEY").unwrap();
        assert!(f.controller.nav_state().fetch_in_flight);
        f.controller.complete_fetch(Ok(e1.clone())).unwrap();

        let state = f.controller.nav_state();
        assert!(state.image_loaded && state.can_favorite);
        assert!(!state.prev_enabled && !state.next_enabled && !state.fetch_in_flight);

        f.controller.begin_fetch("2020-10-11", "KEY").unwrap();
        let shown = f.controller.complete_fetch(Ok(e2)).unwrap();
        assert_eq!(shown.date, "2020-10-11");
        assert!(f.controller.nav_state().prev_enabled);

        assert!(f.controller.show_previous());
        assert_eq!(f.controller.current_entry(), Some(&e1));
        let state = f.controller.nav_state();
        assert!(!state.prev_enabled && state.next_enabled);
        assert!(!f.controller.show_previous());
    }

    #[test]
    fn test_failed_fetch_leaves_state() {
        let mut f = fixture();
        f.controller.begin_fetch("2020-10-10", "KEY").unwrap();
        let result = f.controller.complete_fetch(Err(ApodError::NoImage));
        assert!(matches!(result, Err(ApodError::NoImage)));
        assert_eq!(f.controller.display(), &Display::Intro);
        assert!(!f.controller.nav_state().fetch_in_flight);
    }

    #[test]
    fn test_single_fetch_in_flight() {
        let mut f = fixture();
        let pending = f.controller.begin_fetch(" 2020-10-10 ", " KEY ").unwrap();
        assert_eq!(pending.date(), "2020-10-10");
        assert!(matches!(
            f.controller.begin_fetch("2020-10-11", "KEY"),
            Err(ApodError::FetchInProgress)
        ));

        let _ = f.controller.complete_fetch(Err(ApodError::Auth));
        assert!(f.controller.begin_fetch("2020-10-11", "KEY").is_ok());
    }

    #[test]
    fn test_validation_does_not_claim_slot() {
        let mut f = fixture();
        assert!(matches!(
            f.controller.begin_fetch("2019-02-29", "KEY"),
            Err(ApodError::InvalidDate(_))
        ));
        assert!(matches!(
            f.controller.fetch("", "KEY"),
            Err(ApodError::MissingInput)
        ));
        assert!(!f.controller.nav_state().fetch_in_flight);
    }

    #[test]
    fn test_favorite_without_image() {
        let mut f = fixture();
        assert!(matches!(
            f.controller.add_displayed_to_favorites(),
            Err(ApodError::MissingCurrentImage)
        ));
        assert!(matches!(
            f.controller.export_displayed(&f.dir.path().join("out.png")),
            Err(ApodError::MissingCurrentImage)
        ));
    }

    #[test]
    fn test_favorites_round_trip() {
        let mut f = fixture();
        let e1 = entry(f.dir.path(), "2020-10-10");
        f.controller.complete_fetch(Ok(e1.clone())).unwrap();

        assert_eq!(f.controller.add_displayed_to_favorites().unwrap(), AddOutcome::Added);
        assert_eq!(
            f.controller.add_displayed_to_favorites().unwrap(),
            AddOutcome::AlreadyPresent
        );

        let path = f.controller.show_next_favorite().unwrap();
        assert_eq!(path, e1.cache_path);
        let shown = f.controller.displayed().unwrap();
        assert_eq!(shown.title, "Favorite 2020-10-10");
        assert_eq!(shown.description, "");

        // Navigating the session returns to session entries
        let e2 = entry(f.dir.path(), "2020-10-11");
        f.controller.complete_fetch(Ok(e2)).unwrap();
        f.controller.show_next_favorite().unwrap();
        assert!(f.controller.show_previous());
        assert_eq!(f.controller.display(), &Display::Session);
    }

    #[test]
    fn test_empty_favorites() {
        let mut f = fixture();
        assert!(matches!(
            f.controller.show_next_favorite(),
            Err(ApodError::EmptyFavorites)
        ));
        assert_eq!(f.controller.display(), &Display::Intro);
    }

    #[test]
    fn test_export_displayed() {
        let mut f = fixture();
        let e1 = entry(f.dir.path(), "2020-10-10");
        f.controller.complete_fetch(Ok(e1)).unwrap();

        let dest = f.dir.path().join("saved.jpg");
        let result = f.controller.export_displayed(&dest).unwrap();
        assert_eq!(result.output_path, dest);
        assert!(dest.exists());
    }

    #[test]
    fn test_sync_fetch_through_mock_server() {
        use crate::api::test_server::{MockResponse, MockServer};

        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::bind();
        let metadata = serde_json::json!({
            "media_type": "image",
            "title": "Moon",
            "explanation": "Full.",
            "url": server.url("/moon.png"),
        });
        server.serve(vec![
            ("/apod", MockResponse::json(200, metadata)),
            ("/moon.png", MockResponse::png(3, 3)),
        ]);

        let config = ApodConfig {
            endpoint: server.url("/apod"),
            cache_dir: dir.path().join("cache"),
            favorites_file: dir.path().join("favorites.txt"),
            ..ApodConfig::default()
        };
        let mut controller = Controller::new(&config).unwrap();
        let entry = controller.fetch("2020-10-10", "KEY").unwrap();
        assert_eq!(entry.title, "Moon");
        assert_eq!(controller.displayed().unwrap().description, "Full.");
    }
}
