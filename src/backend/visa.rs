use super::{read_finished, terminated_message};
use crate::gateway::{Backend, InstrumentError, Session};
use log::debug;
use std::ffi::CString;
use std::io::{Read, Write};
use visa_rs::prelude::*;

const RESOURCE_QUERY: &str = "?*INSTR";
const READ_CHUNK: usize = 64 * 1024;

fn backend_err(e: visa_rs::Error) -> InstrumentError {
    InstrumentError::BackendUnavailable(e.to_string())
}

pub struct VisaBackend {
    rm: DefaultRM,
}

impl VisaBackend {
    pub fn new() -> Result<Self, InstrumentError> {
        let rm = DefaultRM::new().map_err(backend_err)?;
        Ok(Self { rm })
    }
}

impl Backend for VisaBackend {
    fn name(&self) -> &str {
        "VISA"
    }

    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        let query = CString::new(RESOURCE_QUERY).map_err(|e| InstrumentError::Protocol(e.to_string()))?;
        let mut list = self.rm.find_res_list(&query.into()).map_err(backend_err)?;
        let mut resources = Vec::new();
        while let Some(res) = list.find_next().map_err(backend_err)? {
            resources.push(res.to_string());
        }
        Ok(resources)
    }

    fn open(&mut self, address: &str) -> Result<Box<dyn Session>, InstrumentError> {
        let id = CString::new(address).map_err(|_| InstrumentError::BadAddress(address.to_string()))?;
        let instr = self
            .rm
            .open(&id.into(), AccessMode::NO_LOCK, TIMEOUT_IMMEDIATE)
            .map_err(|e| InstrumentError::Open {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Box::new(VisaSession {
            address: address.to_string(),
            instr: Some(instr),
        }))
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        // the resource manager is released on drop
        Ok(())
    }
}

pub struct VisaSession {
    address: String,
    instr: Option<Instrument>,
}

impl VisaSession {
    fn instr(&self) -> Result<&Instrument, InstrumentError> {
        self.instr
            .as_ref()
            .ok_or_else(|| InstrumentError::Protocol(format!("session to {} is closed", self.address)))
    }
}

impl Session for VisaSession {
    fn address(&self) -> &str {
        &self.address
    }

    fn write(&mut self, command: &str) -> Result<(), InstrumentError> {
        let mut instr = self.instr()?;
        // one viWrite, so END lands after the newline only
        instr.write_all(&terminated_message(command))?;
        Ok(())
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, InstrumentError> {
        let mut instr = self.instr()?;
        let mut payload = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = instr.read(&mut chunk)?;
            payload.extend_from_slice(&chunk[..n]);
            if read_finished(&payload, n, chunk.len()) {
                break;
            }
        }
        debug!("visa read {} bytes from {}", payload.len(), self.address);
        Ok(payload)
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        self.instr = None;
        Ok(())
    }
}
