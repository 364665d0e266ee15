use tracing::{debug, trace, warn};

use pinwire_transport::Transport;

use crate::codec::MAX_SYSEX_PAYLOAD;
use crate::command::{command_name, END_SYSEX, START_SYSEX};
use crate::dispatch::{DispatchTable, HandlerKind};
use crate::error::Result;

/// A decoded inbound frame: the handler tag its dispatch rule named and
/// the payload bytes the framing discipline produced.
///
/// For channel messages the low nibble of the command byte arrives as
/// the first payload element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub handler: HandlerKind,
    pub payload: Vec<u8>,
}

/// Read at most one frame off the link.
///
/// Returns `Ok(None)` when no byte is waiting, or when the byte(s) read
/// did not amount to a deliverable frame: unknown commands, stray data
/// bytes, truncated or oversize frames are all skipped in a way that
/// leaves the stream aligned for the next call. No parse state survives
/// between calls. Transport failures propagate.
pub fn read_frame<T: Transport>(
    link: &mut T,
    table: &DispatchTable,
) -> Result<Option<InboundFrame>> {
    let Some(lead) = link.read_byte()? else {
        return Ok(None);
    };

    if lead < 0x80 {
        // Stray data byte: leftovers of a frame whose command we
        // discarded, or line noise. Skipping one byte per call walks the
        // stream forward to the next command byte.
        trace!(byte = lead, "skipping stray data byte");
        return Ok(None);
    }

    if lead == START_SYSEX {
        return read_sysex(link, table);
    }

    if lead >= 0xF0 {
        return read_system(link, table, lead);
    }

    read_channel(link, table, lead)
}

/// Channel message: command in the high nibble, channel in the low one.
fn read_channel<T: Transport>(
    link: &mut T,
    table: &DispatchTable,
    lead: u8,
) -> Result<Option<InboundFrame>> {
    let command = lead & 0xF0;
    let Some(entry) = table.get(command) else {
        // Unknown channel command: drop the byte and consume nothing
        // further. Its payload bytes surface as stray data bytes on the
        // following calls.
        debug!(command, "discarding unknown channel command");
        return Ok(None);
    };

    let mut payload = Vec::with_capacity(entry.arity as usize + 1);
    payload.push(lead & 0x0F);
    for _ in 0..entry.arity {
        match link.read_byte()? {
            Some(byte) => payload.push(byte),
            None => {
                debug!(
                    command = command_name(command),
                    "dropping truncated channel message"
                );
                return Ok(None);
            }
        }
    }

    Ok(Some(InboundFrame {
        handler: entry.handler,
        payload,
    }))
}

/// System message: the byte itself is the command, declared arity follows.
fn read_system<T: Transport>(
    link: &mut T,
    table: &DispatchTable,
    command: u8,
) -> Result<Option<InboundFrame>> {
    let Some(entry) = table.get(command) else {
        debug!(command, "discarding unknown system command");
        return Ok(None);
    };

    let mut payload = Vec::with_capacity(entry.arity as usize);
    for _ in 0..entry.arity {
        match link.read_byte()? {
            Some(byte) => payload.push(byte),
            None => {
                debug!(
                    command = command_name(command),
                    "dropping truncated system message"
                );
                return Ok(None);
            }
        }
    }

    Ok(Some(InboundFrame {
        handler: entry.handler,
        payload,
    }))
}

/// Sysex: id byte, then data until `END_SYSEX`.
///
/// The terminator is always consumed, even for ids nobody registered a
/// rule for; bailing out early would leave the payload in the stream to
/// be misread as commands.
fn read_sysex<T: Transport>(link: &mut T, table: &DispatchTable) -> Result<Option<InboundFrame>> {
    let Some(id) = link.read_byte()? else {
        debug!("dropping sysex start with no id");
        return Ok(None);
    };
    if id == END_SYSEX {
        trace!("skipping empty sysex frame");
        return Ok(None);
    }

    let mut payload = Vec::new();
    let mut overflowed = false;
    loop {
        match link.read_byte()? {
            Some(END_SYSEX) => break,
            Some(byte) => {
                if payload.len() < MAX_SYSEX_PAYLOAD {
                    payload.push(byte);
                } else {
                    overflowed = true;
                }
            }
            None => {
                debug!(sysex_id = id, "dropping truncated sysex frame");
                return Ok(None);
            }
        }
    }

    if overflowed {
        warn!(
            sysex_id = id,
            max = MAX_SYSEX_PAYLOAD,
            "dropping oversize sysex frame"
        );
        return Ok(None);
    }

    let Some(entry) = table.get(id) else {
        debug!(sysex_id = id, "drained unknown sysex frame");
        return Ok(None);
    };

    Ok(Some(InboundFrame {
        handler: entry.handler,
        payload,
    }))
}
