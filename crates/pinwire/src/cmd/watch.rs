use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pinwire_board::Board;
use pinwire_transport::SerialTransport;

use crate::cmd::{open_board, WatchArgs};
use crate::exit::{board_error, CliError, CliResult, SUCCESS};
use crate::output::{print_reading, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let mut board = open_board(&args.device, &args.settle)?;

    let mut pins = Vec::with_capacity(args.pins.len());
    for spec in &args.pins {
        let id = board
            .acquire_pin(spec)
            .map_err(|err| board_error("pin setup failed", err))?;
        pins.push(id);
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    // One slot per watched pin; a sample prints only when it differs
    // from the last one printed for that pin.
    let mut last: Vec<Option<f32>> = vec![None; pins.len()];
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        board
            .drain()
            .map_err(|err| board_error("receive failed", err))?;

        for (slot, &id) in pins.iter().enumerate() {
            let value = board
                .read(id)
                .map_err(|err| board_error("read failed", err))?;
            let Some(value) = value else { continue };
            if last[slot] == Some(value) {
                continue;
            }
            last[slot] = Some(value);
            print_reading(&id.to_string(), value, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return finish(board);
                }
            }
        }

        std::thread::sleep(Duration::from_millis(10));
    }

    finish(board)
}

fn finish(mut board: Board<SerialTransport>) -> CliResult<i32> {
    board
        .teardown()
        .map_err(|err| board_error("teardown failed", err))?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
