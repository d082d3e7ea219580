use serialport::{SerialPortInfo, SerialPortType};
use std::collections::HashSet;

/// Enumerate ports, deduplicated and sorted with USB and ACM devices first.
pub fn list_ports() -> Result<Vec<SerialPortInfo>, serialport::Error> {
    serialport::available_ports().map(sort_and_dedup_ports)
}

pub(crate) fn sort_and_dedup_ports(raw_ports: Vec<SerialPortInfo>) -> Vec<SerialPortInfo> {
    let mut seen = HashSet::new();
    let mut ports: Vec<_> = raw_ports
        .into_iter()
        .filter(|p| seen.insert(p.port_name.to_lowercase()))
        .collect();

    ports.sort_by(|a, b| {
        priority(&a.port_name)
            .cmp(&priority(&b.port_name))
            .then_with(|| a.port_name.cmp(&b.port_name))
    });
    ports
}

fn priority(name: &str) -> u8 {
    let n = name.to_lowercase();
    if n.contains("usb") {
        0
    } else if n.contains("acm") {
        1
    } else if n.contains("ttys") || n.contains("com") {
        2
    } else {
        10
    }
}

/// Human readable description of where a port comes from.
pub fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => {
            let name = match (&info.manufacturer, &info.product) {
                (Some(m), Some(p)) => format!("{m} {p}"),
                (None, Some(p)) => p.clone(),
                (Some(m), None) => m.clone(),
                (None, None) => "USB device".to_string(),
            };
            format!("{name} ({:04x}:{:04x})", info.vid, info.pid)
        }
        SerialPortType::PciPort => "PCI device".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth device".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}
