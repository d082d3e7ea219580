//! In-memory transport for driving the connection pipeline without hardware.
//!
//! A [`MockTransport`] knows a set of named ports. Each port is backed by a
//! [`MockDevice`] the test keeps hold of to feed incoming chunks, inspect what
//! was written and applied, and inject failures.
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::Arc,
    time::Duration,
};

use super::{
    config::LineSetting,
    error::ConnectionError,
    port::{SerialLink, Transport, PERMISSION_HINT},
};

#[derive(Default)]
struct DeviceState {
    incoming: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    applied: Vec<LineSetting>,
    rejected: Vec<&'static str>,
    read_failure: Option<String>,
    write_failure: Option<String>,
    deny_open: bool,
    open_links: usize,
    times_opened: usize,
}

/// Test-side view of one simulated port.
#[derive(Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    /// Queue a chunk returned whole by a later read.
    pub fn feed(&self, chunk: impl Into<Vec<u8>>) {
        self.state.lock().incoming.push_back(chunk.into());
    }

    pub fn pending_chunks(&self) -> usize {
        self.state.lock().incoming.len()
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    pub fn applied(&self) -> Vec<LineSetting> {
        self.state.lock().applied.clone()
    }

    /// Make the setting with this name (e.g. "Parity") fail when applied.
    pub fn reject_setting(&self, name: &'static str) {
        self.state.lock().rejected.push(name);
    }

    /// Make every following read fail with `reason`.
    pub fn fail_reads(&self, reason: impl Into<String>) {
        self.state.lock().read_failure = Some(reason.into());
    }

    pub fn fail_writes(&self, reason: impl Into<String>) {
        self.state.lock().write_failure = Some(reason.into());
    }

    /// Refuse to open as if the OS denied permission.
    pub fn deny_open(&self) {
        self.state.lock().deny_open = true;
    }

    /// True when no link to this device is held any more.
    pub fn is_closed(&self) -> bool {
        self.state.lock().open_links == 0
    }

    pub fn times_opened(&self) -> usize {
        self.state.lock().times_opened
    }
}

/// A [`Transport`] whose ports exist only in memory.
#[derive(Clone, Default)]
pub struct MockTransport {
    ports: Arc<Mutex<HashMap<String, MockDevice>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a port and return the device behind it.
    pub fn add_port(&self, name: impl Into<String>) -> MockDevice {
        let device = MockDevice::default();
        self.ports.lock().insert(name.into(), device.clone());
        device
    }

    pub fn device(&self, name: &str) -> Option<MockDevice> {
        self.ports.lock().get(name).cloned()
    }
}

impl Transport for MockTransport {
    fn open(&self, port_name: &str) -> Result<Box<dyn SerialLink>, ConnectionError> {
        let device = self
            .device(port_name)
            .ok_or_else(|| ConnectionError::PortResolution {
                port: port_name.to_string(),
                reason: "no such serial port".to_string(),
            })?;

        {
            let mut state = device.state.lock();
            if state.deny_open {
                return Err(ConnectionError::PortOpen {
                    port: port_name.to_string(),
                    reason: "Permission denied".to_string(),
                    hint: Some(PERMISSION_HINT),
                });
            }
            if state.open_links > 0 {
                return Err(ConnectionError::PortOpen {
                    port: port_name.to_string(),
                    reason: "Device or resource busy".to_string(),
                    hint: None,
                });
            }
            state.open_links += 1;
            state.times_opened += 1;
        }

        Ok(Box::new(MockLink { device }))
    }
}

struct MockLink {
    device: MockDevice,
}

impl SerialLink for MockLink {
    fn apply(&mut self, setting: LineSetting) -> io::Result<()> {
        let mut state = self.device.state.lock();
        if state.rejected.contains(&setting.name()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "rejected by device",
            ));
        }
        state.applied.push(setting);
        Ok(())
    }

    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.device.state.lock();
        if let Some(reason) = &state.read_failure {
            return Err(io::Error::other(reason.clone()));
        }
        let Some(mut chunk) = state.incoming.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            state.incoming.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn write_blocking(&mut self, bytes: &[u8], _deadline: Duration) -> io::Result<()> {
        let mut state = self.device.state.lock();
        if let Some(reason) = &state.write_failure {
            return Err(io::Error::new(io::ErrorKind::TimedOut, reason.clone()));
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        let mut state = self.device.state.lock();
        state.open_links = state.open_links.saturating_sub(1);
    }
}
