// Platform-dispatched TTY helpers

#[cfg(unix)]
mod tty_unix;
#[cfg(unix)]
pub use tty_unix::available_ports_sorted;

// Other platforms: raw enumeration, alphabetical
#[cfg(not(unix))]
pub fn available_ports_sorted() -> Vec<serialport::SerialPortInfo> {
    let mut ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(err) => {
            log::warn!("serial port enumeration failed: {err}");
            Vec::new()
        }
    };
    ports.sort_by(|a, b| a.port_name.cmp(&b.port_name));
    ports
}
