use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReadingOutput<'a> {
    schema_id: &'a str,
    pin: &'a str,
    value: f32,
    timestamp: String,
}

/// Print one pin sample in the selected format. Used by the streaming
/// commands, so each call stands alone on stdout.
pub fn print_reading(pin: &str, value: f32, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReadingOutput {
                schema_id: "https://schemas.3leaps.dev/pinwire/cli/v1/reading.schema.json",
                pin,
                value,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PIN", "VALUE", "TIME"])
                .add_row(vec![pin.to_string(), value.to_string(), now_unix_seconds()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("pin={pin} value={value} t={}", now_unix_seconds());
        }
        OutputFormat::Raw => {
            println!("{value}");
        }
    }
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
