#![allow(dead_code)]

use scope_capture::{Backend, BackendInit, ConfigStore, InstrumentError, ScopeCapture, Session};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(String),
    Write(String),
    Read,
    CloseSession(String),
    CloseBackend,
}

// Everything the stub instrument saw, plus knobs to make it misbehave
#[derive(Default)]
pub struct Wire {
    pub events: Vec<Event>,
    pub resources: Vec<String>,
    pub payload: Vec<u8>,
    pub open_sessions: usize,
    pub max_open_sessions: usize,
    pub fail_init: bool,
    pub fail_list: bool,
    pub fail_open: bool,
    pub fail_write: bool,
}

pub type SharedWire = Rc<RefCell<Wire>>;

pub fn wire() -> SharedWire {
    Rc::new(RefCell::new(Wire::default()))
}

pub struct StubBackend {
    wire: SharedWire,
}

impl StubBackend {
    pub fn new(wire: &SharedWire) -> Self {
        Self { wire: wire.clone() }
    }
}

impl Backend for StubBackend {
    fn name(&self) -> &str {
        "STUB"
    }

    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        let wire = self.wire.borrow();
        if wire.fail_list {
            return Err(InstrumentError::BackendUnavailable("list failed".to_string()));
        }
        Ok(wire.resources.clone())
    }

    fn open(&mut self, address: &str) -> Result<Box<dyn Session>, InstrumentError> {
        let mut wire = self.wire.borrow_mut();
        wire.events.push(Event::Open(address.to_string()));
        if wire.fail_open {
            return Err(InstrumentError::Open {
                address: address.to_string(),
                reason: "VI_ERROR_RSRC_NFOUND".to_string(),
            });
        }
        wire.open_sessions += 1;
        wire.max_open_sessions = wire.max_open_sessions.max(wire.open_sessions);
        Ok(Box::new(StubSession {
            address: address.to_string(),
            wire: self.wire.clone(),
            open: true,
        }))
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        self.wire.borrow_mut().events.push(Event::CloseBackend);
        Ok(())
    }
}

pub struct StubSession {
    address: String,
    wire: SharedWire,
    open: bool,
}

impl Session for StubSession {
    fn address(&self) -> &str {
        &self.address
    }

    fn write(&mut self, command: &str) -> Result<(), InstrumentError> {
        let mut wire = self.wire.borrow_mut();
        if wire.fail_write {
            return Err(InstrumentError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "link dropped",
            )));
        }
        wire.events.push(Event::Write(command.to_string()));
        Ok(())
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, InstrumentError> {
        let mut wire = self.wire.borrow_mut();
        wire.events.push(Event::Read);
        Ok(wire.payload.clone())
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        if self.open {
            self.open = false;
            let mut wire = self.wire.borrow_mut();
            wire.open_sessions -= 1;
            wire.events.push(Event::CloseSession(self.address.clone()));
        }
        Ok(())
    }
}

pub fn stub_init(wire: &SharedWire) -> BackendInit {
    let wire = wire.clone();
    Box::new(move || {
        if wire.borrow().fail_init {
            return Err(InstrumentError::BackendUnavailable(
                "visa64.dll not found".to_string(),
            ));
        }
        Ok(Box::new(StubBackend::new(&wire)) as Box<dyn Backend>)
    })
}

/// App with a fresh config under `dir` and the stub backend behind it.
pub fn stub_app(dir: &Path, wire: &SharedWire) -> ScopeCapture {
    let config = ConfigStore::load(dir.join("scope_capture.json5")).unwrap();
    ScopeCapture::with_backend(config, "STUB", stub_init(wire))
}
