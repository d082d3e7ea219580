use serialport::SerialPortInfo;
use std::io::{self, Write};

use crate::protocol::tty;

pub const NO_PORTS_MESSAGE: &str = "No supported serial ports found.";

/// Render the port list the way it is printed when no arguments are given.
pub fn format_port_list(ports: &[SerialPortInfo]) -> String {
    if ports.is_empty() {
        return format!("{NO_PORTS_MESSAGE}\n");
    }
    let mut out = String::from("found serials:\n");
    for (i, port) in ports.iter().enumerate() {
        out.push_str(&format!(
            "{i} : {} => {}\n",
            port.port_name,
            tty::describe(&port.port_type)
        ));
    }
    out
}

/// Enumerate and print ports. Enumeration failures are printed, not returned.
pub fn print_ports(out: &mut impl Write) -> io::Result<()> {
    match tty::list_ports() {
        Ok(ports) => {
            log::debug!("found {} serial port(s)", ports.len());
            out.write_all(format_port_list(&ports).as_bytes())
        }
        Err(err) => {
            log::warn!("port enumeration failed: {err}");
            writeln!(out, "Failed to get serial port list: {err}")
        }
    }
}
