//! Prints analog channel 0 as it changes, then lets the board go.
//!
//! Run with:
//!   cargo run --example analog-watch -- /dev/ttyACM0

use std::time::Duration;

use pinwire::board::Board;
use pinwire::transport::SerialTransport;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyACM0".to_string());

    let link = SerialTransport::open(&device)?;
    let mut board = Board::open(link)?;
    eprintln!("Connected to {board}");

    let sensor = board.acquire_pin("a0")?;

    let mut last = None;
    let mut printed = 0;
    while printed < 50 {
        board.drain()?;
        let value = board.read(sensor)?;
        if value != last {
            if let Some(v) = value {
                println!("a0 = {v}");
                printed += 1;
            }
            last = value;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    board.teardown()?;
    Ok(())
}
