use serialport::{SerialPortInfo, SerialPortType};
use std::collections::HashSet;

/// Return the list of available serial ports sorted/deduped for Unix.
pub fn available_ports_sorted() -> Vec<SerialPortInfo> {
    let raw_ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            log::warn!("serial port enumeration failed: {err}");
            Vec::new()
        }
    };
    sort_and_dedup_ports(raw_ports)
}

fn basename(port_name: &str) -> String {
    port_name
        .rsplit('/')
        .next()
        .unwrap_or(port_name)
        .to_lowercase()
}

/// Rank by adapter kind; bench controllers show up as USB or ACM devices.
fn priority(port_name: &str) -> u8 {
    let name = port_name.to_lowercase();
    if name.contains("usb") {
        0
    } else if name.contains("acm") {
        1
    } else if name.contains("ttys") || name.contains("serial") {
        2
    } else {
        10
    }
}

/// Drop repeated entries and order the rest by adapter kind, then path.
///
/// `port_name` is left untouched: it is the path handed to the opener later.
/// Two USB adapters sharing a basename under different directories stay
/// separate entries because their vid/pid differ.
pub(crate) fn sort_and_dedup_ports(raw_ports: Vec<SerialPortInfo>) -> Vec<SerialPortInfo> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ports: Vec<SerialPortInfo> = raw_ports
        .into_iter()
        .filter(|p| {
            let base = basename(&p.port_name);
            let key = match &p.port_type {
                SerialPortType::UsbPort(info) => {
                    format!("{base}:vid={:04x}:pid={:04x}", info.vid, info.pid)
                }
                _ => base,
            };
            seen.insert(key)
        })
        .collect();

    ports.sort_by(|a, b| {
        priority(&a.port_name)
            .cmp(&priority(&b.port_name))
            .then_with(|| a.port_name.cmp(&b.port_name))
    });
    ports
}
