use std::time::{Duration, Instant};

use crate::cmd::{open_board, parse_duration, WriteArgs};
use crate::exit::{board_error, CliResult, SUCCESS};
use crate::output::{print_reading, OutputFormat};

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let hold = args.hold.as_deref().map(parse_duration).transpose()?;

    let mut board = open_board(&args.device, &args.settle)?;
    let id = board
        .acquire_pin(&args.pin)
        .map_err(|err| board_error("pin setup failed", err))?;

    board
        .write(id, args.value)
        .map_err(|err| board_error("write failed", err))?;

    // Echo the value the board now carries for this pin.
    let cached = board
        .read(id)
        .map_err(|err| board_error("read failed", err))?;
    if let Some(value) = cached {
        print_reading(&id.to_string(), value, format);
    }

    if let Some(hold) = hold {
        // Keep pumping the link so inbound traffic does not back up
        // while the output is held. Servos also need the time to
        // physically reach the target before teardown detaches them.
        let deadline = Instant::now() + hold;
        while Instant::now() < deadline {
            board
                .drain()
                .map_err(|err| board_error("receive failed", err))?;
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    board
        .teardown()
        .map_err(|err| board_error("teardown failed", err))?;
    Ok(SUCCESS)
}
