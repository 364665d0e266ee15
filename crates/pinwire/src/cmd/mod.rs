use std::time::Duration;

use clap::{Args, Subcommand};
use pinwire_board::{Board, BoardConfig};
use pinwire_transport::SerialTransport;

use crate::exit::{board_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod info;
pub mod ports;
pub mod version;
pub mod watch;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial devices visible to the host.
    Ports(PortsArgs),
    /// Connect to a board and print its negotiated identity.
    Info(InfoArgs),
    /// Stream value changes from input pins.
    Watch(WatchArgs),
    /// Claim a pin and write one value to it.
    Write(WriteArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Serial device of the board.
    pub device: String,
    /// Time to let the firmware boot before negotiating (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub settle: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Serial device of the board.
    pub device: String,
    /// Pins to watch (comma-separated, e.g. a0,a1,d2i).
    #[arg(long, value_delimiter = ',', required = true)]
    pub pins: Vec<String>,
    /// Exit after printing N samples.
    #[arg(long)]
    pub count: Option<usize>,
    /// Time to let the firmware boot before negotiating (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub settle: String,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Serial device of the board.
    pub device: String,
    /// Pin descriptor, e.g. d13o, d3p or d9s.
    pub pin: String,
    /// Value to write (0/1 for output, 0.0-1.0 for PWM, degrees for servo).
    pub value: f32,
    /// Keep the link open for this long after writing (e.g. 2s).
    #[arg(long)]
    pub hold: Option<String>,
    /// Time to let the firmware boot before negotiating (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub settle: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the serial device and run the boot-settle plus capability handshake.
pub(crate) fn open_board(device: &str, settle: &str) -> CliResult<Board<SerialTransport>> {
    let startup_settle = parse_duration(settle)?;
    let link =
        SerialTransport::open(device).map_err(|err| transport_error("open failed", err))?;
    let config = BoardConfig {
        startup_settle,
        ..BoardConfig::default()
    };
    Board::open_with_config(link, config).map_err(|err| board_error("board setup failed", err))
}

/// Parse durations like `5s`, `500ms` or a bare number of seconds. Zero is
/// allowed; a board that was already running needs no settle time.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
