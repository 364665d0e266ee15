use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pinwire_transport::{available_ports, SerialPortType};
use serde::Serialize;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PortEntry {
    name: String,
    kind: &'static str,
    manufacturer: Option<String>,
    product: Option<String>,
}

#[derive(Serialize)]
struct PortsOutput {
    schema_id: &'static str,
    ports: Vec<PortEntry>,
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports =
        available_ports().map_err(|err| transport_error("port enumeration failed", err))?;

    let entries: Vec<PortEntry> = ports
        .into_iter()
        .map(|info| {
            let (kind, manufacturer, product) = match info.port_type {
                SerialPortType::UsbPort(usb) => ("usb", usb.manufacturer, usb.product),
                SerialPortType::PciPort => ("pci", None, None),
                SerialPortType::BluetoothPort => ("bluetooth", None, None),
                SerialPortType::Unknown => ("unknown", None, None),
            };
            PortEntry {
                name: info.port_name,
                kind,
                manufacturer,
                product,
            }
        })
        .collect();

    let out = PortsOutput {
        schema_id: "https://schemas.3leaps.dev/pinwire/cli/v1/ports.schema.json",
        ports: entries,
    };

    print_ports(&out, format);
    Ok(SUCCESS)
}

fn print_ports(out: &PortsOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DEVICE", "KIND", "MANUFACTURER", "PRODUCT"]);
            for port in &out.ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.manufacturer.clone().unwrap_or_default(),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if out.ports.is_empty() {
                println!("no serial devices found");
            }
            for port in &out.ports {
                println!(
                    "{} kind={} product={}",
                    port.name,
                    port.kind,
                    port.product.as_deref().unwrap_or("?")
                );
            }
        }
        OutputFormat::Raw => {
            for port in &out.ports {
                println!("{}", port.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_json_has_schema_id() {
        let out = PortsOutput {
            schema_id: "x",
            ports: vec![PortEntry {
                name: "/dev/ttyACM0".to_string(),
                kind: "usb",
                manufacturer: Some("Arduino LLC".to_string()),
                product: Some("Arduino Uno".to_string()),
            }],
        };

        let json = serde_json::to_string(&out).expect("ports output should serialize");
        assert!(json.contains("\"schema_id\""));
        assert!(json.contains("\"/dev/ttyACM0\""));
    }
}
