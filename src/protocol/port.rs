use parking_lot::Mutex;
use std::{
    io::{self, Read, Write},
    sync::Arc,
    time::Duration,
};

use serialport::SerialPort;

use super::{
    config::{FlowControl, LineSetting, Parity, StopBits, TransportConfig},
    error::{ConfigureFailure, ConnectionError},
};

/// Deadline for a single blocking write.
pub const WRITE_DEADLINE: Duration = Duration::from_millis(100);

/// Baud rate used while opening; the configured rate is applied right after.
const OPEN_BAUD_RATE: u32 = 9600;

/// An open serial line. Implementations own the OS resource and release it on drop.
pub trait SerialLink: Send {
    fn apply(&mut self, setting: LineSetting) -> io::Result<()>;

    /// Return immediately with whatever is buffered, possibly nothing.
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write_blocking(&mut self, bytes: &[u8], deadline: Duration) -> io::Result<()>;
}

/// Resolves port names and opens them read-write.
pub trait Transport {
    fn open(&self, port_name: &str) -> Result<Box<dyn SerialLink>, ConnectionError>;
}

type SharedLink = Arc<Mutex<Option<Box<dyn SerialLink>>>>;

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "port is closed")
}

/// Exclusive owner of an open port.
///
/// Reads and writes serialize on one lock around the link so the reader thread
/// and the send path can share it. Closing takes the link out of the lock, so a
/// [`PortReader`] that outlives the handle only ever sees `NotConnected`.
pub struct PortHandle {
    port_name: String,
    link: SharedLink,
}

impl PortHandle {
    pub fn new(port_name: impl Into<String>, link: Box<dyn SerialLink>) -> Self {
        Self {
            port_name: port_name.into(),
            link: Arc::new(Mutex::new(Some(link))),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Apply every line setting in order. All settings are attempted even after
    /// a failure so the caller can report each rejected one.
    pub fn configure(&self, config: &TransportConfig) -> Result<(), Vec<ConfigureFailure>> {
        let mut guard = self.link.lock();
        let Some(link) = guard.as_mut() else {
            return Err(vec![ConfigureFailure {
                setting: "Port",
                reason: closed_error().to_string(),
            }]);
        };

        let failures: Vec<_> = config
            .line_settings()
            .into_iter()
            .filter_map(|setting| match link.apply(setting) {
                Ok(()) => {
                    log::debug!("[port] {}: applied {setting}", self.port_name);
                    None
                }
                Err(err) => {
                    log::warn!("[port] {}: {setting} failed: {err}", self.port_name);
                    Some(ConfigureFailure {
                        setting: setting.name(),
                        reason: err.to_string(),
                    })
                }
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    pub fn read_nonblocking(&self, buf: &mut [u8]) -> io::Result<usize> {
        read_shared(&self.link, buf)
    }

    pub fn write_blocking(&self, bytes: &[u8]) -> io::Result<()> {
        match self.link.lock().as_mut() {
            Some(link) => link.write_blocking(bytes, WRITE_DEADLINE),
            None => Err(closed_error()),
        }
    }

    /// A read-only view for the reader thread.
    pub fn reader(&self) -> PortReader {
        PortReader {
            link: Arc::clone(&self.link),
        }
    }

    pub fn is_open(&self) -> bool {
        self.link.lock().is_some()
    }

    /// Release the OS resource. Returns false when it was already released.
    pub fn close(&self) -> bool {
        let released = self.link.lock().take();
        if released.is_some() {
            log::info!("[port] {} closed", self.port_name);
        }
        released.is_some()
    }
}

impl Drop for PortHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortHandle")
            .field("port_name", &self.port_name)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Read side of a [`PortHandle`], handed to the reader thread.
#[derive(Clone)]
pub struct PortReader {
    link: SharedLink,
}

impl PortReader {
    pub fn read_nonblocking(&self, buf: &mut [u8]) -> io::Result<usize> {
        read_shared(&self.link, buf)
    }
}

fn read_shared(link: &SharedLink, buf: &mut [u8]) -> io::Result<usize> {
    match link.lock().as_mut() {
        Some(link) => link.read_nonblocking(buf),
        None => Err(closed_error()),
    }
}

/// Transport backed by the operating system's serial ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTransport;

impl Transport for SystemTransport {
    fn open(&self, port_name: &str) -> Result<Box<dyn SerialLink>, ConnectionError> {
        resolve_port(port_name)?;

        let port = serialport::new(port_name, OPEN_BAUD_RATE)
            .timeout(WRITE_DEADLINE)
            .open()
            .map_err(|err| classify_open_error(port_name, err))?;

        log::info!("[port] opened {port_name}");
        Ok(Box::new(SystemLink { port }))
    }
}

/// A name resolves when the OS lists it or, on Unix, when the device node exists.
fn resolve_port(port_name: &str) -> Result<(), ConnectionError> {
    let listed = serialport::available_ports()
        .map(|ports| {
            ports
                .iter()
                .any(|p| p.port_name.eq_ignore_ascii_case(port_name))
        })
        .unwrap_or(false);
    if listed {
        return Ok(());
    }

    #[cfg(unix)]
    let exists = std::path::Path::new(port_name).exists();
    // Enumeration can miss virtual COM ports; let open decide
    #[cfg(not(unix))]
    let exists = true;

    if exists {
        Ok(())
    } else {
        Err(ConnectionError::PortResolution {
            port: port_name.to_string(),
            reason: "no such serial port".to_string(),
        })
    }
}

fn classify_open_error(port_name: &str, err: serialport::Error) -> ConnectionError {
    match err.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            ConnectionError::PortResolution {
                port: port_name.to_string(),
                reason: err.description,
            }
        }
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => ConnectionError::PortOpen {
            port: port_name.to_string(),
            reason: err.description,
            hint: Some(PERMISSION_HINT),
        },
        _ => ConnectionError::PortOpen {
            port: port_name.to_string(),
            reason: err.description,
            hint: None,
        },
    }
}

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        pub const PERMISSION_HINT: &str = "Run as Administrator or check port permissions";
    } else {
        pub const PERMISSION_HINT: &str =
            "Permission denied. Try:\n  sudo chmod a+rw /dev/xxx\nor add your user to the dialout group";
    }
}

struct SystemLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink for SystemLink {
    fn apply(&mut self, setting: LineSetting) -> io::Result<()> {
        match setting {
            LineSetting::BaudRate(baud) => self.port.set_baud_rate(baud)?,
            LineSetting::DataBits(bits) => self.port.set_data_bits(data_bits(bits)?)?,
            LineSetting::Parity(parity) => self.port.set_parity(match parity {
                Parity::None => serialport::Parity::None,
                Parity::Odd => serialport::Parity::Odd,
                Parity::Even => serialport::Parity::Even,
            })?,
            LineSetting::StopBits(stop) => self.port.set_stop_bits(stop_bits(stop)?)?,
            LineSetting::FlowControl(flow) => self.port.set_flow_control(match flow {
                FlowControl::None => serialport::FlowControl::None,
                FlowControl::RtsCts => serialport::FlowControl::Hardware,
                FlowControl::XonXoff => serialport::FlowControl::Software,
            })?,
        }
        Ok(())
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 || buf.is_empty() {
            return Ok(0);
        }
        let len = available.min(buf.len());
        match self.port.read(&mut buf[..len]) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    fn write_blocking(&mut self, bytes: &[u8], deadline: Duration) -> io::Result<()> {
        self.port.set_timeout(deadline)?;
        self.port.write_all(bytes)?;
        self.port.flush()
    }
}

fn data_bits(bits: u8) -> io::Result<serialport::DataBits> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        other => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{other} data bits are not supported on this platform"),
        )),
    }
}

fn stop_bits(stop: StopBits) -> io::Result<serialport::StopBits> {
    match stop {
        StopBits::One => Ok(serialport::StopBits::One),
        StopBits::Two => Ok(serialport::StopBits::Two),
        StopBits::OnePointFive => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "1.5 stop bits are not supported on this platform",
        )),
    }
}
