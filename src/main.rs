#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use clap::Parser;
use eframe::egui;
use std::process::exit;

use scope_capture::{Args, ScopeCapture, INITIAL_HEIGHT, INITIAL_WIDTH, PROGRAM_TITLE};

// Application Entry Point
fn main() -> eframe::Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting {}", PROGRAM_TITLE);

    let mut app = match ScopeCapture::from_args(&args) {
        Ok(app) => app,
        Err(e) => {
            log::error!("{}", e);
            exit(1)
        }
    };

    if args.capture {
        let result = app.run_headless();
        app.shutdown_app();
        match result {
            Ok(path) => {
                log::info!("Capture written to {}", path.display());
                exit(0)
            }
            Err(e) => {
                log::error!("Execution failed with error: {}", e);
                exit(1)
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([INITIAL_WIDTH, INITIAL_HEIGHT])
            .with_title(PROGRAM_TITLE), // Set window title here
        ..Default::default()
    };

    eframe::run_native(
        PROGRAM_TITLE, // Used for window title if not set in viewport
        options,
        Box::new(|_cc| Ok(Box::new(app))), // Hand the loaded app to eframe
    )
}
