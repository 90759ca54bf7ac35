//! APOD Viewer
//!
//! A desktop application that fetches NASA's Astronomy Picture of the Day for
//! a chosen date, keeps favorites and exports pictures to disk.

use apod_viewer::config::{get_config, get_secrets};
use apod_viewer::controller::Controller;
use apod_viewer::gui;
use apod_viewer::logging::UiLogger;
use eframe::egui;

fn main() -> eframe::Result<()> {
    match UiLogger::init() {
        Ok(receiver) => gui::set_log_receiver(receiver),
        Err(e) => eprintln!("Failed to install logger: {}", e),
    }

    let config = get_config();
    let api_key = get_secrets().nasa.api_key.clone();

    let controller = match Controller::new(&config.apod) {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([680.0, 900.0])
            .with_min_inner_size([480.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Astronomy picture of the day",
        options,
        Box::new(move |cc| Ok(Box::new(gui::App::new(cc, controller, api_key)))),
    )
}
