//! Command dispatch tables.
//!
//! Every inbound command the driver reacts to is declared up front: a
//! table entry names the command byte, the payload arity the parser must
//! consume, and a handler tag the board matches on to apply the frame.
//! Each board owns its table; it is built at construction and only ever
//! grows.

use std::collections::HashMap;

use crate::command::{
    ANALOG_MESSAGE, CAPABILITY_RESPONSE, DIGITAL_MESSAGE, REPORT_FIRMWARE, REPORT_VERSION,
};

/// What to do with a decoded frame.
///
/// A closed set: dispatch sites match exhaustively, so a new handler
/// cannot ship half-wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// 14-bit analog sample for one channel.
    AnalogValue,
    /// 8-pin digital bitmask for one port.
    DigitalBitmask,
    /// Protocol version (major, minor).
    ReportVersion,
    /// Firmware version plus 14-bit-per-character name.
    ReportFirmware,
    /// Per-pin capability lists.
    CapabilityResponse,
}

/// One dispatch rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchEntry {
    /// Command byte (channel commands with the nibble masked off).
    pub command: u8,
    /// Payload bytes to read after the command byte, excluding the
    /// channel nibble embedded in the command itself. Unused for sysex
    /// entries; those payloads run to `END_SYSEX`.
    pub arity: u8,
    /// Handler tag the board dispatches on.
    pub handler: HandlerKind,
}

/// Command-byte lookup owned by a single board instance.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    entries: HashMap<u8, DispatchEntry>,
}

impl DispatchTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the four rules every board understands: analog
    /// samples, digital bitmasks, protocol version and firmware reports.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register(ANALOG_MESSAGE, 2, HandlerKind::AnalogValue);
        table.register(DIGITAL_MESSAGE, 2, HandlerKind::DigitalBitmask);
        table.register(REPORT_VERSION, 2, HandlerKind::ReportVersion);
        table.register(REPORT_FIRMWARE, 0, HandlerKind::ReportFirmware);
        table
    }

    /// The `standard` rules plus the capability-response rule used
    /// during auto-negotiation.
    pub fn with_capability_response() -> Self {
        let mut table = Self::standard();
        table.register(CAPABILITY_RESPONSE, 0, HandlerKind::CapabilityResponse);
        table
    }

    /// Add or replace a rule. Tables only grow; nothing deregisters.
    pub fn register(&mut self, command: u8, arity: u8, handler: HandlerKind) {
        self.entries.insert(
            command,
            DispatchEntry {
                command,
                arity,
                handler,
            },
        );
    }

    /// Rule for a command byte, if one was registered.
    pub fn get(&self, command: u8) -> Option<&DispatchEntry> {
        self.entries.get(&command)
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_core_commands() {
        let table = DispatchTable::standard();
        assert_eq!(table.len(), 4);

        let analog = table.get(ANALOG_MESSAGE).unwrap();
        assert_eq!(analog.arity, 2);
        assert_eq!(analog.handler, HandlerKind::AnalogValue);

        let digital = table.get(DIGITAL_MESSAGE).unwrap();
        assert_eq!(digital.arity, 2);
        assert_eq!(digital.handler, HandlerKind::DigitalBitmask);

        assert!(table.get(CAPABILITY_RESPONSE).is_none());
    }

    #[test]
    fn capability_table_adds_negotiation_rule() {
        let table = DispatchTable::with_capability_response();
        assert_eq!(table.len(), 5);
        assert_eq!(
            table.get(CAPABILITY_RESPONSE).unwrap().handler,
            HandlerKind::CapabilityResponse
        );
    }

    #[test]
    fn register_replaces_existing_rule() {
        let mut table = DispatchTable::new();
        table.register(0x42, 1, HandlerKind::ReportVersion);
        table.register(0x42, 3, HandlerKind::ReportFirmware);

        let entry = table.get(0x42).unwrap();
        assert_eq!(entry.arity, 3);
        assert_eq!(entry.handler, HandlerKind::ReportFirmware);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn empty_table_knows_nothing() {
        let table = DispatchTable::new();
        assert!(table.is_empty());
        assert!(table.get(ANALOG_MESSAGE).is_none());
    }
}
