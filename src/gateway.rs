use log::{debug, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("instrument backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("unsupported resource address '{0}'")]
    BadAddress(String),
    #[error("could not open {address}: {reason}")]
    Open { address: String, reason: String },
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// One open connection to one instrument.
pub trait Session {
    fn address(&self) -> &str;
    fn write(&mut self, command: &str) -> Result<(), InstrumentError>;
    /// Blocks until the instrument has sent a complete response.
    fn read_raw(&mut self) -> Result<Vec<u8>, InstrumentError>;
    fn close(&mut self) -> Result<(), InstrumentError>;
}

/// An instrument-control subsystem able to list and open resources.
pub trait Backend {
    fn name(&self) -> &str;
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError>;
    fn open(&mut self, address: &str) -> Result<Box<dyn Session>, InstrumentError>;
    fn close(&mut self) -> Result<(), InstrumentError>;
}

pub type BackendInit = Box<dyn Fn() -> Result<Box<dyn Backend>, InstrumentError>>;

/// A live backend plus the (at most one) session opened through it.
pub struct Gateway {
    backend: Box<dyn Backend>,
    session: Option<Box<dyn Session>>,
}

/// Brings up a backend and enumerates its resources.
///
/// Either step failing yields `Err`; the caller decides how to surface it.
pub fn discover(
    init: &dyn Fn() -> Result<Box<dyn Backend>, InstrumentError>,
) -> Result<(Gateway, Vec<String>), InstrumentError> {
    debug!("loading instrument backend");
    let mut backend = init()?;
    let resources = match backend.list_resources() {
        Ok(resources) => resources,
        Err(e) => {
            if let Err(close_err) = backend.close() {
                debug!("ignoring backend close failure: {}", close_err);
            }
            return Err(e);
        }
    };
    info!(
        "{} backend loaded, {} resource(s) found",
        backend.name(),
        resources.len()
    );
    Ok((
        Gateway {
            backend,
            session: None,
        },
        resources,
    ))
}

impl Gateway {
    /// Opens `address`, closing whatever session was open before.
    pub fn connect(&mut self, address: &str) -> Result<(), InstrumentError> {
        debug!("trying connection to {}", address);
        self.disconnect_all();
        let session = self.backend.open(address)?;
        info!("connected to {}", session.address());
        self.session = Some(session);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&mut self) -> Option<&mut (dyn Session + 'static)> {
        self.session.as_deref_mut()
    }

    /// Closes the open session, if any. Safe to call repeatedly.
    pub fn disconnect_all(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!("closing session to {}", session.address());
            if let Err(e) = session.close() {
                warn!("failed to close session to {}: {}", session.address(), e);
            }
        }
    }

    /// Releases the session and the backend. Failures are only logged.
    pub fn close(mut self) {
        self.disconnect_all();
        if let Err(e) = self.backend.close() {
            warn!("failed to close {} backend: {}", self.backend.name(), e);
        }
    }
}
