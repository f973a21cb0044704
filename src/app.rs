use crate::backend::{self, BackendKind};
use crate::config::{Background, ConfigError, ConfigStore, SettingKey};
use crate::gateway::{self, BackendInit, InstrumentError};
use crate::state::{State, Status};
use crate::{protocol, ui, util, Args, ScopeCapture};
use chrono::Local;
use eframe::{egui, glow};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no instrument connected")]
    NotConnected,
    #[error("capture failed: {0}")]
    Instrument(#[from] InstrumentError),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the image verbatim, replacing any file of the same name.
pub fn save_capture(path: &Path, payload: &[u8]) -> Result<(), CaptureError> {
    fs::write(path, payload).map_err(|source| CaptureError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("saved {} bytes to {}", payload.len(), path.display());
    Ok(())
}

impl ScopeCapture {
    pub fn new(config: ConfigStore, kind: BackendKind) -> Self {
        Self::with_backend(config, kind.to_string(), backend::initializer(kind))
    }

    /// Builds the app around any backend constructor.
    pub fn with_backend(config: ConfigStore, backend_label: impl Into<String>, backend_init: BackendInit) -> Self {
        Self {
            state: State::Initialising,
            backend_status: Status::Down,
            link_status: Status::Down,
            backend_label: backend_label.into(),
            gateway: None,
            resources: Vec::new(),
            config,
            last_capture: None,
            backend_init,
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let path = args
            .config
            .clone()
            .unwrap_or_else(crate::config::default_config_path);
        let mut config = ConfigStore::load(path)?;
        if let Some(address) = &args.address {
            config.set(SettingKey::InstrumentAddr, address);
            config.save()?;
        }
        Ok(Self::new(config, args.backend))
    }

    // Initialization logic called once at the start
    pub fn init(&mut self) {
        self.handle_retry_backend();
        self.state = State::Running;
        info!("Initialization complete. State set to Running.");
    }

    // --- Action handlers ---

    /// (Re)loads the backend. Failure leaves no gateway and an empty resource
    /// list; it is never fatal.
    pub fn handle_retry_backend(&mut self) {
        if let Some(old) = self.gateway.take() {
            old.close();
        }
        self.link_status = Status::Down;

        match gateway::discover(self.backend_init.as_ref()) {
            Ok((gateway, resources)) => {
                self.gateway = Some(gateway);
                self.resources = resources;
                self.backend_status = Status::Up;
            }
            Err(e) => {
                warn!("{} backend failed to load: {}", self.backend_label, e);
                self.resources.clear();
                self.backend_status = Status::Down;
            }
        }
    }

    /// Connects to the configured address, replacing any open session.
    pub fn handle_connect(&mut self) -> Result<(), InstrumentError> {
        self.link_status = Status::Down;
        let address = self.config.settings().instrumentaddr.clone();
        let gateway = self.gateway.as_mut().ok_or_else(|| {
            InstrumentError::BackendUnavailable("backend not loaded".to_string())
        })?;

        match gateway.connect(&address) {
            Ok(()) => {
                self.link_status = Status::Up;
                Ok(())
            }
            Err(e) => {
                warn!("Instrument connection failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn handle_select_address(&mut self, address: &str) {
        self.update_setting(SettingKey::InstrumentAddr, address);
    }

    pub fn handle_background(&mut self, background: Background) {
        self.update_setting(SettingKey::Background, background.as_str());
    }

    pub fn handle_set_image_path(&mut self, path: &str) {
        self.update_setting(SettingKey::ImagePath, path);
    }

    pub fn handle_image_name(&mut self, name: &str) {
        self.update_setting(SettingKey::ImageName, name);
    }

    /// Opens the native folder picker and stores the choice.
    pub fn handle_browse(&mut self) {
        let current = self.config.settings().imagepath.clone();
        if let Some(dir) = rfd::FileDialog::new().set_directory(&current).pick_folder() {
            self.handle_set_image_path(&dir.to_string_lossy());
        }
    }

    /// Captures the screen and saves it under the configured path.
    ///
    /// An instrument failure closes the session, so the user has to reconnect
    /// before the next attempt.
    pub fn handle_capture(&mut self) -> Result<PathBuf, CaptureError> {
        let background = self.config.settings().background;
        let session = self
            .gateway
            .as_mut()
            .and_then(|g| g.session())
            .ok_or(CaptureError::NotConnected)?;

        let payload = match protocol::capture(session, background) {
            Ok(payload) => payload,
            Err(e) => {
                self.drop_link();
                return Err(e.into());
            }
        };

        let settings = self.config.settings();
        let path = util::output_path(&settings.imagepath, &settings.imagename, Local::now());
        save_capture(&path, &payload)?;
        Ok(path)
    }

    /// Print Screen from the window: errors end up in the log and the status line.
    // Capture and file errors never end the process here; only headless mode exits on them.
    pub fn capture_and_report(&mut self) {
        let outcome = self.handle_capture().map_err(|e| {
            error!("{}", e);
            e.to_string()
        });
        self.last_capture = Some(outcome);
    }

    /// One connect + capture without a window.
    pub fn run_headless(&mut self) -> Result<PathBuf, CaptureError> {
        self.init();
        self.handle_connect()?;
        self.handle_capture()
    }

    fn drop_link(&mut self) {
        if let Some(gateway) = self.gateway.as_mut() {
            gateway.disconnect_all();
        }
        self.link_status = Status::Down;
    }

    fn update_setting(&mut self, key: SettingKey, value: &str) {
        self.config.set(key, value);
        if let Err(e) = self.config.save() {
            error!("Failed to save configuration: {}", e);
        }
    }

    // Graceful shutdown logic
    pub fn shutdown_app(&mut self) {
        info!("Shutdown requested.");
        if let Some(gateway) = self.gateway.take() {
            gateway.close();
        }
        self.link_status = Status::Down;
        self.backend_status = Status::Down;

        if let Err(e) = self.config.save() {
            error!("Failed to save configuration on exit: {}", e);
        } else {
            info!("Configuration saved.");
        }
        info!("Shutdown complete.");
    }
}

// Main eframe application loop
impl eframe::App for ScopeCapture {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            State::Initialising => {
                ui.centered_and_justified(|ui| {
                    ui.label("Initialising...");
                });
                self.init();
                ctx.request_repaint();
            }
            State::About => {
                ui::draw_about_screen(self, ui);
            }
            State::Running => {
                ui::draw_running_state(self, ui, ctx);
            }
        });
    }

    // Called when the application is about to close
    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        self.shutdown_app();
    }
}
