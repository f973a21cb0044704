pub mod vicp;
#[cfg(feature = "visa")]
pub mod visa;

use crate::gateway::{Backend, BackendInit, InstrumentError};

#[derive(clap::ValueEnum, Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// LeCroy VICP over TCP
    #[default]
    Vicp,
    /// NI-VISA (needs the `visa` feature)
    Visa,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BackendKind::Vicp => write!(f, "VICP"),
            BackendKind::Visa => write!(f, "VISA"),
        }
    }
}

pub fn init(kind: BackendKind) -> Result<Box<dyn Backend>, InstrumentError> {
    match kind {
        BackendKind::Vicp => Ok(Box::new(vicp::VicpBackend::new())),
        #[cfg(feature = "visa")]
        BackendKind::Visa => Ok(Box::new(visa::VisaBackend::new()?)),
        #[cfg(not(feature = "visa"))]
        BackendKind::Visa => Err(InstrumentError::BackendUnavailable(
            "built without VISA support (enable the `visa` feature)".to_string(),
        )),
    }
}

pub fn initializer(kind: BackendKind) -> BackendInit {
    Box::new(move || init(kind))
}

/// Command plus newline, to go out as one message.
#[cfg_attr(not(feature = "visa"), allow(dead_code))]
pub(crate) fn terminated_message(command: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(command.len() + 1);
    message.extend_from_slice(command.as_bytes());
    message.push(b'\n');
    message
}

/// Whether a read of `received` bytes into a buffer of `capacity` bytes ends
/// the response. std::io::Read hides the END status, so a short read counts
/// as END, and so does a full buffer ending on the JPEG end-of-image marker.
/// A full buffer that ends anywhere else means another read.
#[cfg_attr(not(feature = "visa"), allow(dead_code))]
pub(crate) fn read_finished(payload: &[u8], received: usize, capacity: usize) -> bool {
    received < capacity || payload.ends_with(&JPEG_EOI)
}

const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];
