//! LeCroy VICP: instrument messages over TCP, each block preceded by an
//! 8-byte header `[flags, version, sequence, spare, length (BE u32)]`.

use crate::gateway::{Backend, InstrumentError, Session};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::str::FromStr;

pub const VICP_PORT: u16 = 1861;
pub const HEADER_VERSION: u8 = 1;
const HEADER_SIZE: usize = 8;
// Larger blocks than this mean we lost framing
const MAX_BLOCK_LEN: u32 = 64 * 1024 * 1024;

pub const FLAG_DATA: u8 = 0x80;
pub const FLAG_SRQ: u8 = 0x08;
pub const FLAG_EOI: u8 = 0x01;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub flags: u8,
    pub version: u8,
    pub sequence: u8,
    pub length: u32,
}

impl Header {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u8(self.flags)?;
        w.write_u8(self.version)?;
        w.write_u8(self.sequence)?;
        w.write_u8(0)?;
        w.write_u32::<BigEndian>(self.length)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let flags = r.read_u8()?;
        let version = r.read_u8()?;
        let sequence = r.read_u8()?;
        let _spare = r.read_u8()?;
        let length = r.read_u32::<BigEndian>()?;
        Ok(Self {
            flags,
            version,
            sequence,
            length,
        })
    }
}

/// Sequence numbers run 1..=255 and skip 0 on wrap.
pub fn next_sequence(sequence: u8) -> u8 {
    if sequence == u8::MAX {
        1
    } else {
        sequence + 1
    }
}

/// Sends `data` as a single terminated block.
pub fn write_block<W: Write>(w: &mut W, sequence: u8, data: &[u8]) -> Result<(), InstrumentError> {
    let length = u32::try_from(data.len())
        .map_err(|_| InstrumentError::Protocol(format!("block of {} bytes is too large", data.len())))?;
    let header = Header {
        flags: FLAG_DATA | FLAG_EOI,
        version: HEADER_VERSION,
        sequence,
        length,
    };

    let mut send_bytes: Vec<u8> = Vec::with_capacity(HEADER_SIZE + data.len());
    header.write_to(&mut send_bytes)?;
    send_bytes.extend_from_slice(data);
    w.write_all(&send_bytes)?;
    w.flush()?;
    Ok(())
}

/// Reads blocks until one carries EOI and returns their concatenated data.
/// Service requests arriving in between are dropped.
pub fn read_message<R: Read>(r: &mut R) -> Result<Vec<u8>, InstrumentError> {
    let mut payload = Vec::new();
    loop {
        let header = Header::read_from(r)?;
        trace!("vicp header {:?}", header);
        if header.version != HEADER_VERSION {
            return Err(InstrumentError::Protocol(format!(
                "unexpected header version {}",
                header.version
            )));
        }
        if header.length > MAX_BLOCK_LEN {
            return Err(InstrumentError::Protocol(format!(
                "block length {} exceeds limit",
                header.length
            )));
        }

        let mut block = vec![0u8; header.length as usize];
        r.read_exact(&mut block)?;

        if header.flags & FLAG_SRQ != 0 {
            debug!("discarding service request block");
            continue;
        }
        payload.extend_from_slice(&block);
        if header.flags & FLAG_EOI != 0 {
            return Ok(payload);
        }
    }
}

/// `VICP::<host>`, optionally followed by `::<port>` and/or `::INSTR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VicpAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for VicpAddress {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || InstrumentError::BadAddress(s.to_string());
        let mut parts = s.trim().split("::");

        let prefix = parts.next().ok_or_else(bad)?;
        let board = prefix
            .get(..4)
            .filter(|p| p.eq_ignore_ascii_case("VICP"))
            .map(|_| &prefix[4..])
            .ok_or_else(bad)?;
        if !board.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad());
        }

        let host = parts.next().filter(|h| !h.is_empty()).ok_or_else(bad)?;
        let mut port = VICP_PORT;
        let mut saw_instr = false;
        for part in parts {
            if saw_instr {
                return Err(bad());
            }
            if part.eq_ignore_ascii_case("INSTR") {
                saw_instr = true;
            } else {
                port = part.parse().map_err(|_| bad())?;
            }
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

pub struct VicpBackend;

impl VicpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VicpBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for VicpBackend {
    fn name(&self) -> &str {
        "VICP"
    }

    // VICP has no discovery; addresses are typed in by the user
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        Ok(Vec::new())
    }

    fn open(&mut self, address: &str) -> Result<Box<dyn Session>, InstrumentError> {
        let target: VicpAddress = address.parse()?;
        let stream = TcpStream::connect((target.host.as_str(), target.port)).map_err(|e| {
            InstrumentError::Open {
                address: address.to_string(),
                reason: e.to_string(),
            }
        })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not set TCP_NODELAY: {}", e);
        }
        Ok(Box::new(VicpSession {
            address: address.to_string(),
            stream,
            sequence: 0,
        }))
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        Ok(())
    }
}

pub struct VicpSession {
    address: String,
    stream: TcpStream,
    sequence: u8,
}

impl Session for VicpSession {
    fn address(&self) -> &str {
        &self.address
    }

    fn write(&mut self, command: &str) -> Result<(), InstrumentError> {
        self.sequence = next_sequence(self.sequence);
        write_block(&mut self.stream, self.sequence, command.as_bytes())
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, InstrumentError> {
        read_message(&mut self.stream)
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::thread;

    fn block(flags: u8, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        Header {
            flags,
            version: HEADER_VERSION,
            sequence: 1,
            length: data.len() as u32,
        }
        .write_to(&mut out)
        .unwrap();
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_write_block_header_layout() {
        let mut out = Vec::new();
        write_block(&mut out, 7, b"SCDP").unwrap();
        assert_eq!(out, vec![0x81, 0x01, 0x07, 0x00, 0x00, 0x00, 0x00, 0x04, b'S', b'C', b'D', b'P']);
    }

    #[test]
    fn test_read_message_joins_blocks_until_eoi() {
        let mut wire = block(FLAG_DATA, &[0xFF, 0xD8]);
        wire.extend(block(FLAG_DATA, &[0x01, 0x02]));
        wire.extend(block(FLAG_DATA | FLAG_EOI, &[0xFF, 0xD9]));
        wire.extend(block(FLAG_DATA | FLAG_EOI, b"next"));

        let mut cursor = Cursor::new(wire);
        let payload = read_message(&mut cursor).unwrap();
        assert_eq!(payload, vec![0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9]);
        // the following message is left unread
        assert_eq!(read_message(&mut cursor).unwrap(), b"next".to_vec());
    }

    #[test]
    fn test_read_message_skips_service_requests() {
        let mut wire = block(FLAG_SRQ, b"1");
        wire.extend(block(FLAG_DATA | FLAG_EOI, b"data"));
        let payload = read_message(&mut Cursor::new(wire)).unwrap();
        assert_eq!(payload, b"data".to_vec());
    }

    #[test]
    fn test_read_message_rejects_bad_version() {
        let mut wire = block(FLAG_DATA | FLAG_EOI, b"x");
        wire[1] = 2;
        let err = read_message(&mut Cursor::new(wire)).unwrap_err();
        assert!(matches!(err, InstrumentError::Protocol(_)));
    }

    #[test]
    fn test_read_message_truncated_stream_is_io_error() {
        let mut wire = block(FLAG_DATA | FLAG_EOI, b"abcdef");
        wire.truncate(10);
        let err = read_message(&mut Cursor::new(wire)).unwrap_err();
        assert!(matches!(err, InstrumentError::Io(_)));
    }

    #[test]
    fn test_sequence_wraps_past_zero() {
        assert_eq!(next_sequence(0), 1);
        assert_eq!(next_sequence(41), 42);
        assert_eq!(next_sequence(255), 1);
    }

    #[test]
    fn test_parse_addresses() {
        let addr: VicpAddress = "VICP::192.168.1.20".parse().unwrap();
        assert_eq!(addr.host, "192.168.1.20");
        assert_eq!(addr.port, VICP_PORT);

        let addr: VicpAddress = "vicp0::scope.lab::INSTR".parse().unwrap();
        assert_eq!(addr.host, "scope.lab");
        assert_eq!(addr.port, VICP_PORT);

        let addr: VicpAddress = "VICP::localhost::5025".parse().unwrap();
        assert_eq!(addr.port, 5025);
    }

    #[test]
    fn test_parse_rejects_other_resources() {
        for bad in [
            "USB0::TEMPLATE",
            "USB0::1234::5678::INSTR",
            "VICP::",
            "VICP",
            "VICPX::host",
            "VICP::host::INSTR::1861",
            "VICP::host::notaport",
        ] {
            let result: Result<VicpAddress, _> = bad.parse();
            assert!(
                matches!(result, Err(InstrumentError::BadAddress(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_session_talks_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let scope = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let first = Header::read_from(&mut stream).unwrap();
            let mut command = vec![0u8; first.length as usize];
            stream.read_exact(&mut command).unwrap();
            assert_eq!(first.sequence, 1);
            assert_eq!(first.flags, FLAG_DATA | FLAG_EOI);
            stream.write_all(&block(FLAG_DATA | FLAG_EOI, b"ok")).unwrap();
            String::from_utf8(command).unwrap()
        });

        let mut backend = VicpBackend::new();
        let mut session = backend.open(&format!("VICP::127.0.0.1::{}", port)).unwrap();
        session.write("*IDN?").unwrap();
        assert_eq!(session.read_raw().unwrap(), b"ok".to_vec());
        session.close().unwrap();

        assert_eq!(scope.join().unwrap(), "*IDN?");
    }

    #[test]
    fn test_open_bad_address_fails_without_connecting() {
        let mut backend = VicpBackend::new();
        let err = backend.open("USB0::TEMPLATE").err().unwrap();
        assert!(matches!(err, InstrumentError::BadAddress(_)));
    }
}
