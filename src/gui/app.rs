//! Main application state and UI implementation

use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::api::Entry;
use crate::controller::Controller;
use crate::error::ApodError;
use crate::export::default_export_name;
use crate::favorites::AddOutcome;

/// Largest size the picture is drawn at
const CANVAS_SIZE: f32 = 600.0;

const INSTRUCTIONS: &str = "Welcome to the Astronomy Picture of the Day (APOD) Viewer!\n\n\
Instructions:\n\
- Enter a valid API key (get one from https://api.nasa.gov/) and a date in YYYY-MM-DD format.\n\
- Press 'Get Photo' to retrieve the image for that date.\n\
- Use 'Add to faves' to save the image to your favorites.\n\
- Step through your favorites with 'See Faves'.\n\
- Go back and forth between fetched images with the Previous and Next buttons.\n\
- 'Save' writes the displayed image as PNG or JPEG.\n\n\
Shortcuts:\n\
- Enter: Get Photo\n\
- Ctrl + F: Add to favorites\n\
- Ctrl + D: Next favorite\n\
- Ctrl + I: Instructions\n\
- Left / Right: Previous / Next image";

const INTRO_TEXT: &str = "Fetch stunning Astronomy Photos of the Day from NASA's API \
and save them. You might just discover your next wallpaper!";

/// Main application state
pub struct App {
    /// Owns fetched pictures, favorites and what is displayed
    controller: Controller,
    /// API key input
    api_key: String,
    /// Date input (YYYY-MM-DD)
    date_input: String,
    /// Receiver for the background fetch
    fetch_receiver: Option<Receiver<Result<Entry, ApodError>>>,
    /// Texture for the displayed picture
    texture: Option<egui::TextureHandle>,
    /// Cache path the texture was loaded from
    texture_path: Option<PathBuf>,
    /// Notification shown as a modal window
    notification: Option<Notification>,
    /// Whether to show the instructions window
    show_instructions: bool,
    /// Whether to show the log window
    show_log_window: bool,
    /// Status/log messages
    log_messages: Vec<LogMessage>,
    /// Lines from the global logger
    log_receiver: Option<Receiver<String>>,
}

/// A log message with severity level
#[derive(Clone)]
struct LogMessage {
    text: String,
    level: LogLevel,
}

#[derive(Clone, Copy, PartialEq)]
enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn color(self) -> egui::Color32 {
        match self {
            LogLevel::Info => egui::Color32::GRAY,
            LogLevel::Success => egui::Color32::GREEN,
            LogLevel::Warning => egui::Color32::YELLOW,
            LogLevel::Error => egui::Color32::RED,
        }
    }

    /// Classify a line produced by `UiLogger`
    fn from_log_line(line: &str) -> Self {
        if line.starts_with("[ERROR]") {
            LogLevel::Error
        } else if line.starts_with("[WARN]") {
            LogLevel::Warning
        } else {
            LogLevel::Info
        }
    }
}

struct Notification {
    title: String,
    message: String,
    level: LogLevel,
}

impl App {
    /// Create a new App instance
    pub fn new(_cc: &eframe::CreationContext<'_>, controller: Controller, api_key: String) -> Self {
        Self {
            controller,
            api_key,
            date_input: String::new(),
            fetch_receiver: None,
            texture: None,
            texture_path: None,
            notification: None,
            show_instructions: true,
            show_log_window: false,
            log_messages: Vec::new(),
            log_receiver: super::take_log_receiver(),
        }
    }

    /// Add a log message
    fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log_messages.push(LogMessage {
            text: message.into(),
            level,
        });
        // Keep only last 200 messages
        if self.log_messages.len() > 200 {
            self.log_messages.remove(0);
        }
    }

    fn notify(&mut self, level: LogLevel, title: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        self.log(level, message.clone());
        self.notification = Some(Notification {
            title: title.into(),
            message,
            level,
        });
    }

    fn report(&mut self, error: &ApodError) {
        if error.is_informational() {
            log::info!("{}", error);
            self.notify(LogLevel::Info, error.title(), error.to_string());
        } else {
            log::warn!("{}", error);
            self.notify(LogLevel::Error, error.title(), error.to_string());
        }
    }

    /// Drain lines from the global logger into the log window
    fn poll_log(&mut self) {
        let lines: Vec<String> = match self.log_receiver {
            Some(ref receiver) => receiver.try_iter().collect(),
            None => return,
        };
        for line in lines {
            let level = LogLevel::from_log_line(&line);
            self.log(level, line);
        }
    }

    /// Start a fetch on a worker thread
    fn start_fetch(&mut self) {
        let pending = match self.controller.begin_fetch(&self.date_input, &self.api_key) {
            Ok(pending) => pending,
            Err(e) => {
                self.report(&e);
                return;
            }
        };

        self.log(LogLevel::Info, format!("Fetching picture for {}", pending.date()));
        let (tx, rx) = mpsc::channel();
        self.fetch_receiver = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(pending.run());
        });
    }

    /// Poll for the fetch result
    fn poll_fetch(&mut self) {
        let result = match self.fetch_receiver {
            Some(ref receiver) => match receiver.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => Err(ApodError::Network(
                    "Fetch thread terminated unexpectedly".to_string(),
                )),
            },
            None => return,
        };
        self.fetch_receiver = None;

        let clear_date = metadata_received(&result);
        let outcome = self
            .controller
            .complete_fetch(result)
            .map(|entry| format!("Loaded \"{}\" ({})", entry.title, entry.date));

        if clear_date {
            self.date_input.clear();
        }
        match outcome {
            Ok(msg) => self.log(LogLevel::Success, msg),
            Err(e) => self.report(&e),
        }
    }

    fn show_previous(&mut self) {
        self.controller.show_previous();
    }

    fn show_next(&mut self) {
        self.controller.show_next();
    }

    fn add_favorite(&mut self) {
        match self.controller.add_displayed_to_favorites() {
            Ok(AddOutcome::Added) => self.notify(LogLevel::Success, "Favorites", "Added to favorites."),
            Ok(AddOutcome::AlreadyPresent) => {
                self.notify(LogLevel::Info, "Favorites", "Already in Favorites.")
            }
            Err(e) => self.report(&e),
        }
    }

    fn show_favorite(&mut self) {
        match self.controller.show_next_favorite() {
            Ok(path) => self.log(LogLevel::Info, format!("Showing favorite {}", path.display())),
            Err(e) => self.report(&e),
        }
    }

    /// Ask for a destination and export the displayed picture
    fn save_image(&mut self) {
        let default_name = self.controller.displayed().map(|d| default_export_name(d.path));
        let Some(default_name) = default_name else {
            self.report(&ApodError::MissingCurrentImage);
            return;
        };

        let Some(dest) = rfd::FileDialog::new()
            .set_title("Save Image")
            .set_file_name(default_name)
            .add_filter("PNG files", &["png"])
            .add_filter("JPEG files", &["jpg", "jpeg"])
            .save_file()
        else {
            return;
        };

        match self.controller.export_displayed(&dest) {
            Ok(result) => self.notify(
                LogLevel::Success,
                "Image saved",
                format!("Image saved successfully to {}", result.output_path.display()),
            ),
            Err(e) => self.report(&e),
        }
    }

    /// Reload the texture when the displayed picture changes
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let wanted = self.controller.displayed().map(|d| d.path.to_path_buf());
        if wanted == self.texture_path {
            return;
        }
        self.texture_path = wanted.clone();
        self.texture = None;

        let Some(path) = wanted else {
            return;
        };
        match load_image_from_path(&path) {
            Ok(color_image) => {
                self.texture =
                    Some(ctx.load_texture("apod", color_image, egui::TextureOptions::LINEAR));
            }
            Err(e) => {
                log::error!("{}", e);
                self.notify(LogLevel::Error, "Image Error", e);
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let typing = ctx.memory(|m| m.focused().is_some());
        let (enter, favorite, faves, instructions, left, right) = ctx.input_mut(|i| {
            (
                i.key_pressed(egui::Key::Enter),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::F),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::D),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::I),
                !typing && i.key_pressed(egui::Key::ArrowLeft),
                !typing && i.key_pressed(egui::Key::ArrowRight),
            )
        });

        // Enter only while no modal window is up, so dismissing one does not refetch
        if enter && self.notification.is_none() && !self.controller.nav_state().fetch_in_flight {
            self.start_fetch();
        }
        if favorite && self.controller.nav_state().can_favorite {
            self.add_favorite();
        }
        if faves {
            self.show_favorite();
        }
        if instructions {
            self.show_instructions = true;
        }
        if left {
            self.show_previous();
        }
        if right {
            self.show_next();
        }
    }

    fn picture_panel(&self, ui: &mut egui::Ui) {
        let Some(displayed) = self.controller.displayed() else {
            ui.add_space(80.0);
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new(INTRO_TEXT)
                        .italics()
                        .size(20.0)
                        .color(egui::Color32::WHITE),
                );
            });
            return;
        };

        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new(displayed.title).strong().size(16.0));
            ui.add_space(6.0);

            if let Some(ref texture) = self.texture {
                let size = texture.size_vec2();
                let max = CANVAS_SIZE.min(ui.available_width());
                let scale = (max / size.x).min(max / size.y).min(1.0);
                ui.image((texture.id(), size * scale));
            } else {
                ui.colored_label(egui::Color32::LIGHT_RED, "Image could not be loaded");
            }
        });

        if !displayed.description.is_empty() {
            ui.add_space(8.0);
            egui::ScrollArea::vertical()
                .id_salt("explanation")
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    ui.label(egui::RichText::new(displayed.description).italics());
                });
        }
    }
}

/// Load a cached picture into an egui ColorImage
fn load_image_from_path(path: &Path) -> Result<egui::ColorImage, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| format!("Failed to decode image: {}", e))?;

    let size = [image.width() as usize, image.height() as usize];
    let image_buffer = image.to_rgba8();
    let pixels = image_buffer.as_flat_samples();

    Ok(egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()))
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_log();
        self.poll_fetch();

        // Request repaint while loading
        if self.fetch_receiver.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        self.handle_shortcuts(ctx);
        self.refresh_texture(ctx);

        let nav = self.controller.nav_state();
        let faves_hint = format!(
            "Cycle through {}",
            self.controller.favorites().path().display()
        );

        // Top panel with title
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Astronomy Picture of the Day");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("v{}", env!("APP_VERSION")));
                    ui.separator();
                    let log_count = self.log_messages.len();
                    let log_btn_text = if log_count > 0 {
                        format!("Log ({})", log_count)
                    } else {
                        "Log".to_string()
                    };
                    if ui.button(log_btn_text).clicked() {
                        self.show_log_window = !self.show_log_window;
                    }
                    if ui.button("Instructions").clicked() {
                        self.show_instructions = true;
                    }
                });
            });
            ui.add_space(4.0);
        });

        // Inputs and actions
        let mut fetch_clicked = false;
        let mut prev_clicked = false;
        let mut next_clicked = false;
        let mut favorite_clicked = false;
        let mut faves_clicked = false;
        let mut save_clicked = false;

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(6.0);
            egui::Grid::new("inputs")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("API key:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.api_key)
                            .password(true)
                            .desired_width(360.0)
                            .hint_text("From https://api.nasa.gov/"),
                    );
                    ui.end_row();

                    ui.label("Date (YYYY-MM-DD):");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.date_input)
                            .desired_width(360.0)
                            .hint_text("2020-10-10"),
                    );
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                faves_clicked = ui.button("See Faves").on_hover_text(faves_hint).clicked();
                favorite_clicked = ui
                    .add_enabled(nav.can_favorite, egui::Button::new("❤ Add to faves"))
                    .clicked();
                save_clicked = ui
                    .add_enabled(nav.image_loaded, egui::Button::new("Save"))
                    .clicked();

                ui.separator();
                prev_clicked = ui
                    .add_enabled(nav.prev_enabled, egui::Button::new("⬅ Previous"))
                    .clicked();
                fetch_clicked = ui
                    .add_enabled(!nav.fetch_in_flight, egui::Button::new("Get Photo"))
                    .clicked();
                next_clicked = ui
                    .add_enabled(nav.next_enabled, egui::Button::new("Next ➡"))
                    .clicked();

                if nav.fetch_in_flight {
                    ui.spinner();
                    ui.label("Fetching...");
                }
            });
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.picture_panel(ui);
        });

        if fetch_clicked {
            self.start_fetch();
        }
        if prev_clicked {
            self.show_previous();
        }
        if next_clicked {
            self.show_next();
        }
        if favorite_clicked {
            self.add_favorite();
        }
        if faves_clicked {
            self.show_favorite();
        }
        if save_clicked {
            self.save_image();
        }

        if self.show_instructions {
            let mut close = false;
            egui::Window::new("Using the APOD Viewer")
                .open(&mut self.show_instructions)
                .collapsible(false)
                .resizable(false)
                .default_width(400.0)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(INSTRUCTIONS);
                    ui.add_space(10.0);
                    close = ui.button("Close").clicked();
                });
            if close {
                self.show_instructions = false;
            }
        }

        // Log window (separate window, hidden by default)
        if self.show_log_window {
            egui::Window::new("Log")
                .open(&mut self.show_log_window)
                .default_size([500.0, 300.0])
                .resizable(true)
                .show(ctx, |ui| {
                    if ui.button("Clear").clicked() {
                        self.log_messages.clear();
                    }
                    ui.separator();

                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for msg in &self.log_messages {
                                ui.colored_label(msg.level.color(), &msg.text);
                            }
                        });
                });
        }

        if let Some(notification) = &self.notification {
            let mut dismissed = false;
            egui::Window::new(notification.title.as_str())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(notification.level.color(), &notification.message);
                    ui.add_space(10.0);
                    dismissed = ui.button("OK").clicked();
                });
            if dismissed {
                self.notification = None;
            }
        }
    }
}

/// The service answered with metadata, even if the picture itself was unusable
fn metadata_received(result: &Result<Entry, ApodError>) -> bool {
    matches!(
        result,
        Ok(_) | Err(ApodError::NoImage | ApodError::ImageDecode(_) | ApodError::Cache { .. })
    )
}
