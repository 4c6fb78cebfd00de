//! Interactive viewer for the renderer
//!
//! Shows a cube (or the model named in the config) that the camera can fly
//! around: WASD to move, E/Q up and down, arrow keys to look, Escape to quit.
//! Settings are read from `viewer.toml` next to the working directory when it
//! exists.

mod app;
mod window;

use rust_renderer::config::Config;
use rust_renderer::core::ApplicationConfig;
use rust_renderer::foundation::logging;

use app::{AppError, ViewerApp};

const CONFIG_PATH: &str = "viewer.toml";

fn run() -> Result<(), AppError> {
    let config = ApplicationConfig::load_or_default(CONFIG_PATH)?;
    let mut app = ViewerApp::new(config)?;
    app.run()
}

fn main() {
    logging::init();
    log::info!("Starting viewer");

    if let Err(e) = run() {
        log::error!("Viewer failed: {}", e);
        std::process::exit(1);
    }
    log::info!("Viewer exited cleanly");
}
