//! Command, destination and payload-schema tables.
//!
//! Application code speaks in mnemonics (`"STATUS"`, `"ALL"`); the wire
//! carries one byte per command and one or two bytes per destination:
//!
//! ```text
//! ┌──────────────┬─────┬────────┬─────┬─────────┬─────┬──────────┐
//! │ Destination  │ '|' │ Cmd    │ '|' │ Payload │ '|' │ CRC hex  │
//! │ 1 or 2 bytes │     │ 1 byte │     │ N bytes │     │ 2 chars  │
//! └──────────────┴─────┴────────┴─────┴─────────┴─────┴──────────┘
//! ```
//!
//! Numeric destinations up to [`MAX_INDEX_VALUE`] take one byte. Larger ids
//! are satellite addresses `TTII` (type and index, two decimal digits each)
//! and take two bytes `[TT, II]`. Neither half can exceed 99, so a
//! destination byte never looks like the field separator.

use std::collections::HashMap;

use crate::error::{Result, SatlinkError};

/// Highest numeric destination that still travels as a single byte.
pub const MAX_INDEX_VALUE: u16 = 100;

/// Command mnemonics.
pub mod commands {
    pub const HELLO: &str = "HELLO";
    pub const PING: &str = "PING";
    pub const ACK: &str = "ACK";
    pub const NACK: &str = "NACK";
    pub const ID_ASSIGN: &str = "ID_ASSIGN";
    pub const NEW_SAT: &str = "NEW_SAT";
    pub const STATUS: &str = "STATUS";
    pub const ERROR: &str = "ERROR";
    pub const LOG: &str = "LOG";
    pub const SYNC_FRAME: &str = "SYNC_FRAME";
    pub const POWER: &str = "POWER";
    pub const REBOOT: &str = "REBOOT";
    pub const MODE: &str = "MODE";

    pub const LED: &str = "LED";
    pub const LED_FLASH: &str = "LEDFLASH";
    pub const LED_BREATH: &str = "LEDBREATH";
    pub const LED_CYLON: &str = "LEDCYLON";
    pub const LED_CENTRI: &str = "LEDCENTRI";
    pub const LED_RAINBOW: &str = "LEDRAINBOW";
    pub const LED_GLITCH: &str = "LEDGLITCH";

    pub const DSP: &str = "DSP";
    pub const DSP_CORRUPT: &str = "DSPCORRUPT";
    pub const DSP_MATRIX: &str = "DSPMATRIX";

    pub const SET_ENC: &str = "SETENC";

    pub const FILE_START: &str = "FILE_START";
    pub const FILE_CHUNK: &str = "FILE_CHUNK";
    pub const FILE_END: &str = "FILE_END";

    pub const VERSION_CHECK: &str = "VERSION_CHECK";
    pub const UPDATE_START: &str = "UPDATE_START";
    pub const UPDATE_WAIT: &str = "UPDATE_WAIT";
}

/// Reserved destination mnemonics.
pub mod destinations {
    /// Broadcast to every node in the chain.
    pub const ALL: &str = "ALL";
    /// The core controller.
    pub const CORE: &str = "CORE";
    /// Driver nodes.
    pub const DRIV: &str = "DRIV";
    /// Satellite group.
    pub const SAT: &str = "SAT";
}

/// How a command's payload is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// UTF-8 text, never tokenized.
    Text,
    /// One unsigned byte per value.
    ByteArray,
    /// One little-endian `u16` per value.
    WordArray,
    /// One little-endian `f32` per value.
    FloatArray,
    /// Opaque bytes passed through untouched.
    RawBytes,
}

impl PayloadKind {
    /// Size of one encoded element, for fixed-width kinds.
    pub fn element_size(self) -> Option<usize> {
        match self {
            PayloadKind::ByteArray => Some(1),
            PayloadKind::WordArray => Some(2),
            PayloadKind::FloatArray => Some(4),
            PayloadKind::Text | PayloadKind::RawBytes => None,
        }
    }
}

/// Bidirectional name/code map.
#[derive(Debug, Clone, Default)]
struct CodeMap {
    by_name: HashMap<String, u8>,
    by_code: HashMap<u8, String>,
}

impl CodeMap {
    fn insert(&mut self, name: &str, code: u8) {
        if let Some(previous) = self.by_code.insert(code, name.to_string()) {
            self.by_name.remove(&previous);
        }
        if let Some(previous) = self.by_name.insert(name.to_string(), code) {
            if previous != code {
                self.by_code.remove(&previous);
            }
        }
    }

    fn code(&self, name: &str) -> Option<u8> {
        self.by_name.get(name).copied()
    }

    fn name(&self, code: u8) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }
}

/// Protocol tables shared by both ends of a link.
///
/// [`ProtocolTables::standard`] (also `Default`) holds the stock command
/// set; applications can extend it with [`with_command`](Self::with_command)
/// so the transport stays reusable.
#[derive(Debug, Clone)]
pub struct ProtocolTables {
    commands: CodeMap,
    destinations: CodeMap,
    schemas: HashMap<String, PayloadKind>,
    max_index_value: u16,
}

impl ProtocolTables {
    /// Empty tables (no commands, no reserved destinations).
    pub fn empty() -> Self {
        Self {
            commands: CodeMap::default(),
            destinations: CodeMap::default(),
            schemas: HashMap::new(),
            max_index_value: MAX_INDEX_VALUE,
        }
    }

    /// The stock command set.
    pub fn standard() -> Self {
        use commands::*;
        use PayloadKind::*;

        let entries: &[(&str, u8, Option<PayloadKind>)] = &[
            // System & discovery
            (HELLO, 0xAA, Some(Text)),
            (PING, 0x01, None),
            (ACK, 0x02, None),
            (NACK, 0x03, None),
            (ID_ASSIGN, 0x04, Some(Text)),
            (NEW_SAT, 0x05, Some(Text)),
            (STATUS, 0x06, Some(ByteArray)),
            (ERROR, 0x07, Some(Text)),
            (LOG, 0x08, Some(Text)),
            (SYNC_FRAME, 0x09, Some(FloatArray)),
            (POWER, 0x0A, Some(FloatArray)),
            (REBOOT, 0x0B, Some(Text)),
            (MODE, 0x0C, Some(Text)),
            // LED
            (LED, 0x10, Some(ByteArray)),
            (LED_FLASH, 0x11, Some(ByteArray)),
            (LED_BREATH, 0x12, Some(ByteArray)),
            (LED_CYLON, 0x13, Some(ByteArray)),
            (LED_CENTRI, 0x14, Some(ByteArray)),
            (LED_RAINBOW, 0x15, Some(ByteArray)),
            (LED_GLITCH, 0x16, Some(ByteArray)),
            // Display
            (DSP, 0x20, Some(Text)),
            (DSP_CORRUPT, 0x21, Some(ByteArray)),
            (DSP_MATRIX, 0x22, Some(ByteArray)),
            // Encoder
            (SET_ENC, 0x30, Some(WordArray)),
            // File transfer
            (FILE_START, 0x40, Some(Text)),
            (FILE_CHUNK, 0x41, Some(RawBytes)),
            (FILE_END, 0x42, Some(Text)),
            // Firmware update handshake
            (VERSION_CHECK, 0x50, Some(Text)),
            (UPDATE_START, 0x51, Some(Text)),
            (UPDATE_WAIT, 0x52, Some(Text)),
        ];

        let mut tables = Self::empty();
        for &(name, code, kind) in entries {
            tables.insert_command(name, code, kind);
        }

        tables.destinations.insert(destinations::ALL, 0xFF);
        tables.destinations.insert(destinations::CORE, 0x00);
        tables.destinations.insert(destinations::DRIV, 0xFD);
        tables.destinations.insert(destinations::SAT, 0xFE);

        tables
    }

    /// Add or replace a command.
    pub fn with_command(mut self, name: &str, code: u8, kind: Option<PayloadKind>) -> Self {
        self.insert_command(name, code, kind);
        self
    }

    /// Add or replace a reserved destination mnemonic.
    pub fn with_destination(mut self, name: &str, code: u8) -> Self {
        self.destinations.insert(name, code);
        self
    }

    fn insert_command(&mut self, name: &str, code: u8, kind: Option<PayloadKind>) {
        self.commands.insert(name, code);
        match kind {
            Some(kind) => self.schemas.insert(name.to_string(), kind),
            None => self.schemas.remove(name),
        };
    }

    /// Wire code for a command mnemonic or decimal code.
    pub fn command_code(&self, command: &str) -> Result<u8> {
        self.commands
            .code(command)
            .or_else(|| command.parse::<u8>().ok())
            .ok_or_else(|| SatlinkError::UnknownCommand(command.to_string()))
    }

    /// Mnemonic for a wire code; unknown codes come back as decimal text.
    pub fn command_name(&self, code: u8) -> String {
        self.commands
            .name(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }

    /// Payload schema registered for a command mnemonic.
    pub fn payload_kind(&self, command: &str) -> Option<PayloadKind> {
        self.schemas.get(command).copied()
    }

    /// Append the wire form of `destination` to `out`.
    pub fn encode_destination(&self, destination: &str, out: &mut Vec<u8>) -> Result<()> {
        if let Some(code) = self.destinations.code(destination) {
            out.push(code);
            return Ok(());
        }

        let unknown = || SatlinkError::UnknownDestination(destination.to_string());
        if destination.is_empty()
            || destination.len() > 4
            || !destination.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(unknown());
        }

        let value: u16 = destination.parse().map_err(|_| unknown())?;
        if value <= self.max_index_value {
            out.push(value as u8);
        } else {
            out.extend_from_slice(&[(value / 100) as u8, (value % 100) as u8]);
        }
        Ok(())
    }

    /// Read a destination field of one or two bytes.
    pub fn decode_destination(&self, field: &[u8]) -> Option<String> {
        match *field {
            [code] => Some(
                self.destinations
                    .name(code)
                    .map(str::to_string)
                    .unwrap_or_else(|| code.to_string()),
            ),
            [kind, index] => Some(format!("{:02}{:02}", kind, index)),
            _ => None,
        }
    }
}

impl Default for ProtocolTables {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_dest(tables: &ProtocolTables, dest: &str) -> Vec<u8> {
        let mut out = Vec::new();
        tables.encode_destination(dest, &mut out).unwrap();
        out
    }

    #[test]
    fn test_command_round_trip() {
        let tables = ProtocolTables::standard();

        assert_eq!(tables.command_code("STATUS").unwrap(), 0x06);
        assert_eq!(tables.command_code("HELLO").unwrap(), 0xAA);
        assert_eq!(tables.command_name(0x04), "ID_ASSIGN");
        assert_eq!(tables.command_name(0x41), "FILE_CHUNK");
    }

    #[test]
    fn test_numeric_command_passthrough() {
        let tables = ProtocolTables::standard();

        assert_eq!(tables.command_code("200").unwrap(), 200);
        assert_eq!(tables.command_name(200), "200");
        assert!(matches!(
            tables.command_code("BOGUS"),
            Err(SatlinkError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_reserved_destinations() {
        let tables = ProtocolTables::standard();

        assert_eq!(encode_dest(&tables, "ALL"), vec![0xFF]);
        assert_eq!(encode_dest(&tables, "CORE"), vec![0x00]);
        assert_eq!(tables.decode_destination(&[0xFE]).unwrap(), "SAT");
        assert_eq!(tables.decode_destination(&[0xFD]).unwrap(), "DRIV");
    }

    #[test]
    fn test_small_numeric_destination_is_one_byte() {
        let tables = ProtocolTables::standard();

        assert_eq!(encode_dest(&tables, "7"), vec![7]);
        assert_eq!(encode_dest(&tables, "100"), vec![100]);
        assert_eq!(tables.decode_destination(&[7]).unwrap(), "7");
    }

    #[test]
    fn test_satellite_id_is_two_bytes() {
        let tables = ProtocolTables::standard();

        assert_eq!(encode_dest(&tables, "0101"), vec![1, 1]);
        assert_eq!(encode_dest(&tables, "0312"), vec![3, 12]);
        assert_eq!(tables.decode_destination(&[1, 1]).unwrap(), "0101");
        assert_eq!(tables.decode_destination(&[3, 12]).unwrap(), "0312");
    }

    #[test]
    fn test_invalid_destinations() {
        let tables = ProtocolTables::standard();
        let mut out = Vec::new();

        for bad in ["", "NOWHERE", "12345", "01a1"] {
            assert!(matches!(
                tables.encode_destination(bad, &mut out),
                Err(SatlinkError::UnknownDestination(_))
            ));
        }
        assert!(out.is_empty());
        assert!(tables.decode_destination(&[]).is_none());
        assert!(tables.decode_destination(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_payload_schemas() {
        let tables = ProtocolTables::standard();

        assert_eq!(tables.payload_kind("ID_ASSIGN"), Some(PayloadKind::Text));
        assert_eq!(tables.payload_kind("LED"), Some(PayloadKind::ByteArray));
        assert_eq!(tables.payload_kind("SETENC"), Some(PayloadKind::WordArray));
        assert_eq!(tables.payload_kind("POWER"), Some(PayloadKind::FloatArray));
        assert_eq!(tables.payload_kind("FILE_CHUNK"), Some(PayloadKind::RawBytes));
        assert_eq!(tables.payload_kind("PING"), None);
    }

    #[test]
    fn test_application_extension() {
        let tables = ProtocolTables::standard()
            .with_command("BEEP", 0x60, Some(PayloadKind::WordArray))
            .with_destination("HUB", 0xFC);

        assert_eq!(tables.command_code("BEEP").unwrap(), 0x60);
        assert_eq!(tables.command_name(0x60), "BEEP");
        assert_eq!(tables.payload_kind("BEEP"), Some(PayloadKind::WordArray));
        assert_eq!(encode_dest(&tables, "HUB"), vec![0xFC]);
    }

    #[test]
    fn test_replacing_code_drops_old_name() {
        let tables = ProtocolTables::standard().with_command("PONG", 0x01, None);

        assert_eq!(tables.command_name(0x01), "PONG");
        assert!(tables.command_code("PING").is_err());
    }
}
