//! Classic blink: toggles digital pin 13 once a second.
//!
//! Run with:
//!   cargo run --example blink -- /dev/ttyACM0

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

    let led = board.acquire_pin("d13o")?;

    for _ in 0..10 {
        board.write(led, 1.0)?;
        std::thread::sleep(Duration::from_millis(500));
        board.write(led, 0.0)?;
        std::thread::sleep(Duration::from_millis(500));
    }

    board.teardown()?;
    Ok(())
}
