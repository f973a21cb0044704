// Export modules for testing
pub mod about;
pub mod app;
pub mod backend;
pub mod config;
pub mod gateway;
pub mod protocol;
pub mod state;
pub mod ui;
pub mod util;

use std::path::PathBuf;

// Re-export main types for testing
pub use crate::app::CaptureError;
pub use crate::backend::BackendKind;
pub use crate::config::{Background, ConfigStore, SettingKey, Settings};
pub use crate::gateway::{Backend, BackendInit, Gateway, InstrumentError, Session};
pub use crate::state::{State, Status};

// Constants
pub const PROGRAM_TITLE: &str = "Oscilloscope Screen Capture";
pub const INITIAL_WIDTH: f32 = 560.0;
pub const INITIAL_HEIGHT: f32 = 320.0;

// Args struct for command line parsing
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Config file to use instead of the one next to the executable
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Instrument-control backend
    #[arg(short, long, value_enum, default_value_t = BackendKind::default())]
    pub backend: BackendKind,

    /// Instrument address to store before starting
    #[arg(short, long)]
    pub address: Option<String>,

    /// Take one capture with the saved settings and exit without a window
    #[arg(long, default_value_t = false)]
    pub capture: bool,
}

// The main application struct
pub struct ScopeCapture {
    // State
    pub state: State,
    pub backend_status: Status,
    pub link_status: Status,

    // Instrument
    pub backend_label: String,
    pub gateway: Option<Gateway>, // None until a backend came up
    pub resources: Vec<String>,   // Addresses reported by the backend

    // Configuration
    pub config: ConfigStore,

    // Result of the last Print Screen, shown under the button
    pub last_capture: Option<Result<PathBuf, String>>,

    backend_init: BackendInit,
}
