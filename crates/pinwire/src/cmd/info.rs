use serde::Serialize;

use crate::cmd::{open_board, InfoArgs};
use crate::exit::{board_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct InfoOutput {
    schema_id: &'static str,
    board: String,
    firmware_name: Option<String>,
    firmware_version: Option<String>,
    protocol_version: Option<String>,
    digital_pins: usize,
    analog_channels: usize,
    pwm_pins: Vec<u8>,
    disabled_pins: Vec<u8>,
    connected: bool,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut board = open_board(&args.device, &args.settle)?;

    let layout = board.layout();
    let out = InfoOutput {
        schema_id: "https://schemas.3leaps.dev/pinwire/cli/v1/board-info.schema.json",
        board: board.name().to_string(),
        firmware_name: board.firmware_name().map(str::to_string),
        firmware_version: board
            .firmware_version()
            .map(|(major, minor)| format!("{major}.{minor}")),
        protocol_version: board
            .protocol_version()
            .map(|(major, minor)| format!("{major}.{minor}")),
        digital_pins: layout.digital_pin_count(),
        analog_channels: layout.analog_channel_count(),
        pwm_pins: layout.pwm.clone(),
        disabled_pins: layout.disabled.clone(),
        connected: true,
    };

    print_info(&out, format);
    board
        .teardown()
        .map_err(|err| board_error("teardown failed", err))?;
    Ok(SUCCESS)
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Board Info:");
            println!("  Board:            {}", out.board);
            match (&out.firmware_name, &out.firmware_version) {
                (Some(name), Some(version)) => println!("  Firmware:         {name} {version}"),
                (Some(name), None) => println!("  Firmware:         {name}"),
                (None, Some(version)) => println!("  Firmware:         {version}"),
                (None, None) => println!("  Firmware:         unknown"),
            }
            match &out.protocol_version {
                Some(version) => println!("  Protocol:         Firmata {version}"),
                None => println!("  Protocol:         unknown"),
            }
            println!("  Digital pins:     {}", out.digital_pins);
            println!("  Analog channels:  {}", out.analog_channels);
            println!("  PWM pins:         {}", join_pins(&out.pwm_pins));
            println!("  Disabled pins:    {}", join_pins(&out.disabled_pins));
        }
        OutputFormat::Raw => {
            println!("{}", out.board);
        }
    }
}

fn join_pins(pins: &[u8]) -> String {
    if pins.is_empty() {
        return "none".to_string();
    }
    pins.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_json_has_schema_id() {
        let out = InfoOutput {
            schema_id: "x",
            board: "board".to_string(),
            firmware_name: Some("StandardFirmata".to_string()),
            firmware_version: Some("2.5".to_string()),
            protocol_version: Some("2.5".to_string()),
            digital_pins: 14,
            analog_channels: 6,
            pwm_pins: vec![3, 5, 6, 9, 10, 11],
            disabled_pins: vec![0, 1],
            connected: true,
        };

        let json = serde_json::to_string(&out).expect("info output should serialize");
        assert!(json.contains("\"schema_id\""));
        assert!(json.contains("\"analog_channels\":6"));
    }

    #[test]
    fn join_pins_handles_empty_list() {
        assert_eq!(join_pins(&[]), "none");
        assert_eq!(join_pins(&[3, 5, 6]), "3, 5, 6");
    }
}
