#![cfg(feature = "board")]

//! Full driver session against a scripted in-memory link: negotiation,
//! pin acquisition, reads, writes and teardown through the facade crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pinwire::board::{Board, BoardConfig, BoardError};
use pinwire::protocol::command::{
    ANALOG_MESSAGE, CAPABILITY_QUERY, CAPABILITY_RESPONSE, DIGITAL_MESSAGE, END_SYSEX,
    REPORT_ANALOG, REPORT_FIRMWARE, REPORT_VERSION, SET_PIN_MODE, START_SYSEX,
};
use pinwire::transport::Transport;

#[derive(Debug, Default)]
struct LinkState {
    incoming: VecDeque<u8>,
    sent: Vec<u8>,
    closed: bool,
}

/// Transport whose buffers stay reachable after the board takes the link.
#[derive(Clone, Debug, Default)]
struct SharedLink(Arc<Mutex<LinkState>>);

impl SharedLink {
    fn feed(&self, bytes: &[u8]) {
        self.0
            .lock()
            .expect("link lock should not be poisoned")
            .incoming
            .extend(bytes.iter().copied());
    }

    fn take_sent(&self) -> Vec<u8> {
        std::mem::take(
            &mut self
                .0
                .lock()
                .expect("link lock should not be poisoned")
                .sent,
        )
    }

    fn closed(&self) -> bool {
        self.0
            .lock()
            .expect("link lock should not be poisoned")
            .closed
    }
}

impl Transport for SharedLink {
    fn read_byte(&mut self) -> pinwire::transport::Result<Option<u8>> {
        Ok(self
            .0
            .lock()
            .expect("link lock should not be poisoned")
            .incoming
            .pop_front())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> pinwire::transport::Result<()> {
        self.0
            .lock()
            .expect("link lock should not be poisoned")
            .sent
            .extend_from_slice(bytes);
        Ok(())
    }

    fn bytes_available(&mut self) -> pinwire::transport::Result<usize> {
        Ok(self
            .0
            .lock()
            .expect("link lock should not be poisoned")
            .incoming
            .len())
    }

    fn close(&mut self) -> pinwire::transport::Result<()> {
        self.0
            .lock()
            .expect("link lock should not be poisoned")
            .closed = true;
        Ok(())
    }
}

fn instant_config() -> BoardConfig {
    BoardConfig {
        startup_settle: Duration::ZERO,
        negotiation_settle: Duration::ZERO,
    }
}

/// Capability response for a four-pin board: pin 0 reports nothing,
/// pins 1-3 do input/output, pin 2 doubles as analog, pin 3 as PWM.
fn capability_frame() -> Vec<u8> {
    let mut bytes = vec![START_SYSEX, CAPABILITY_RESPONSE];
    bytes.push(0x7F);
    bytes.extend_from_slice(&[0x00, 0x01, 0x01, 0x01, 0x7F]);
    bytes.extend_from_slice(&[0x00, 0x01, 0x01, 0x01, 0x02, 0x0A, 0x7F]);
    bytes.extend_from_slice(&[0x00, 0x01, 0x01, 0x01, 0x03, 0x08, 0x7F]);
    bytes.push(END_SYSEX);
    bytes
}

fn boot_chatter() -> Vec<u8> {
    let mut bytes = vec![REPORT_VERSION, 2, 5];
    bytes.extend_from_slice(&[
        START_SYSEX,
        REPORT_FIRMWARE,
        2,
        5,
        b'S',
        0,
        b'F',
        0,
        END_SYSEX,
    ]);
    bytes
}

#[test]
fn full_session_over_scripted_link() {
    let link = SharedLink::default();
    link.feed(&boot_chatter());
    link.feed(&capability_frame());

    let mut board = Board::open_with_config(link.clone(), instant_config())
        .expect("negotiation should succeed");

    // Setup sent exactly one capability query.
    assert_eq!(
        link.take_sent(),
        vec![START_SYSEX, CAPABILITY_QUERY, END_SYSEX]
    );
    assert_eq!(board.protocol_version(), Some((2, 5)));
    assert_eq!(board.firmware_version(), Some((2, 5)));
    assert_eq!(board.firmware_name(), Some("SF"));

    let layout = board.layout();
    assert_eq!(layout.digital, vec![0, 1, 2, 3]);
    assert_eq!(layout.analog, vec![0]);
    assert_eq!(layout.pwm, vec![3]);
    assert_eq!(layout.disabled, vec![0]);

    // Analog acquisition turns on channel reporting.
    let sensor = board.acquire_pin("a0").expect("a0 should be free");
    assert_eq!(link.take_sent(), vec![REPORT_ANALOG, 1]);

    link.feed(&[ANALOG_MESSAGE, 0x7F, 0x03]);
    board.iterate().expect("sample should dispatch");
    assert_eq!(board.read(sensor).expect("a0 is readable"), Some(0.4995));

    // PWM pin: mode change then a duty-cycle write.
    let led = board.acquire_pin("d3p").expect("d3 should be free");
    assert_eq!(link.take_sent(), vec![SET_PIN_MODE, 3, 3]);
    board.write(led, 0.5).expect("duty write should go out");
    assert_eq!(
        link.take_sent(),
        vec![ANALOG_MESSAGE | 0x03, 0x00, 0x01]
    );

    // Plain output pin routes through the port bitmask.
    let relay = board.acquire_pin("d1o").expect("d1 should be free");
    link.take_sent();
    board.write(relay, 1.0).expect("digital write should go out");
    assert_eq!(link.take_sent(), vec![DIGITAL_MESSAGE, 0x02, 0x00]);

    board.teardown().expect("teardown should close the link");
    assert!(link.closed());
}

#[test]
fn acquisition_conflicts_are_reported() {
    let link = SharedLink::default();
    link.feed(&capability_frame());

    let mut board = Board::open_with_config(link.clone(), instant_config())
        .expect("negotiation should succeed");

    board.acquire_pin("d3p").expect("first claim should work");
    let err = board.acquire_pin("d3o").expect_err("second claim must fail");
    assert!(matches!(err, BoardError::PinAlreadyTaken { .. }));

    let err = board
        .acquire_pin("d0o")
        .expect_err("pin without capabilities must be unusable");
    assert!(matches!(err, BoardError::InvalidPinSpec { .. }));
}

#[test]
fn silent_firmware_fails_setup() {
    let link = SharedLink::default();

    let err = Board::open_with_config(link, instant_config())
        .expect_err("no capability response should fail setup");
    assert!(matches!(err, BoardError::SetupFailed(_)));
}
