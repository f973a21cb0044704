use crate::config::Background;
use crate::gateway::{InstrumentError, Session};
use log::{debug, info};

pub const TRIGGER_COMMAND: &str = "SCDP";

/// Hardcopy setup: JPEG of the grid area only, sent back over the active link.
pub fn setup_command(background: Background) -> String {
    format!(
        "HCSU DEV, JPEG, BCKG, {}, AREA, GRIDAREAONLY, PORT, NET",
        background
    )
}

/// Runs setup, trigger and read in order and returns the image bytes.
///
/// Errors are passed straight back. If one occurs midway the scope may still
/// be waiting to send, so the session should be re-opened before retrying.
pub fn capture(
    session: &mut dyn Session,
    background: Background,
) -> Result<Vec<u8>, InstrumentError> {
    let setup = setup_command(background);
    debug!("{} <- {}", session.address(), setup);
    session.write(&setup)?;

    debug!("{} <- {}", session.address(), TRIGGER_COMMAND);
    session.write(TRIGGER_COMMAND)?;

    let payload = session.read_raw()?;
    info!(
        "received {} byte capture from {}",
        payload.len(),
        session.address()
    );
    Ok(payload)
}
