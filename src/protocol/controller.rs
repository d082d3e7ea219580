use derive_more::Display;
use std::sync::Arc;

use super::{
    config::{ReadInterpretation, TransportConfig},
    error::ConnectionError,
    port::{PortHandle, Transport},
    runtime::{CancelHandle, ReaderExit, ReaderLoop},
};
use crate::core::logs::{DisplayRecord, MessageLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ConnectionState {
    #[default]
    #[display("disconnected")]
    Disconnected,
    #[display("opening")]
    Opening,
    #[display("opened")]
    Opened,
    #[display("connecting")]
    Connecting,
    #[display("connected")]
    Connected,
    #[display("in error")]
    Error,
}

/// Owns one connection attempt from open to disconnect.
///
/// A controller is single-use: once it has reached `Error` or has been
/// disconnected, reconnecting means building a fresh one from the same
/// [`TransportConfig`]. The port handle is owned here and released on every
/// exit path, including drop.
pub struct ConnectionController<T: Transport> {
    config: TransportConfig,
    read_as: ReadInterpretation,
    transport: T,
    log: Arc<MessageLog>,
    state: ConnectionState,
    port: Option<PortHandle>,
    reader: Option<ReaderLoop>,
    cancel: CancelHandle,
    last_error: Option<ConnectionError>,
    used: bool,
}

impl<T: Transport> ConnectionController<T> {
    pub fn new(
        config: TransportConfig,
        read_as: ReadInterpretation,
        transport: T,
        log: Arc<MessageLog>,
    ) -> Self {
        Self {
            config,
            read_as,
            transport,
            log,
            state: ConnectionState::Disconnected,
            port: None,
            reader: None,
            cancel: CancelHandle::new(),
            last_error: None,
            used: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn log(&self) -> &Arc<MessageLog> {
        &self.log
    }

    /// Handle that stops the reader when cancelled, usable from any thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn last_error(&self) -> Option<&ConnectionError> {
        self.last_error.as_ref()
    }

    pub fn port_is_open(&self) -> bool {
        self.port.as_ref().is_some_and(PortHandle::is_open)
    }

    /// True when a reader was started and its thread has exited.
    pub fn reader_finished(&self) -> bool {
        self.reader.as_ref().is_some_and(ReaderLoop::is_finished)
    }

    /// Resolve and open the configured port.
    pub fn open(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Disconnected || self.used {
            return Err(self.wrong_state("open"));
        }
        self.used = true;
        self.state = ConnectionState::Opening;

        let port_name = self.config.port_name().to_string();
        match self.transport.open(&port_name) {
            Ok(link) => {
                self.port = Some(PortHandle::new(port_name.as_str(), link));
                self.state = ConnectionState::Opened;
                log::info!("[controller] opened {port_name}");
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Apply every line setting. Any rejection closes the port.
    pub fn configure(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Opened {
            return Err(self.wrong_state("configure"));
        }
        self.state = ConnectionState::Connecting;

        let Some(port) = self.port.as_ref() else {
            return Err(self.wrong_state("configure"));
        };
        match port.configure(&self.config) {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                log::info!("[controller] configured {}", self.config);
                Ok(())
            }
            Err(failures) => {
                let err = ConnectionError::Configure {
                    port: self.config.port_name().to_string(),
                    failures,
                };
                Err(self.fail(err))
            }
        }
    }

    /// Spawn the reader thread on a connected port.
    pub fn start_reader(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connected || self.reader.is_some() {
            return Err(self.wrong_state("start reader"));
        }
        let Some(port) = self.port.as_ref() else {
            return Err(self.wrong_state("start reader"));
        };

        let spawned = ReaderLoop::spawn(
            port.reader(),
            self.read_as,
            Arc::clone(&self.log),
            self.cancel.clone(),
        );
        match spawned {
            Ok(reader) => {
                self.reader = Some(reader);
                Ok(())
            }
            Err(err) => Err(self.fail(ConnectionError::ReaderSpawn {
                reason: err.to_string(),
            })),
        }
    }

    /// Open, configure, post the banner and start reading.
    pub fn connect(&mut self) -> Result<(), ConnectionError> {
        self.open()?;
        self.configure()?;
        self.log.append(DisplayRecord::info(format!(
            "Connected to {} at {} baud",
            self.config.port_name(),
            self.config.baud_rate()
        )));
        self.log.append(DisplayRecord::info("ctrl+c to exit"));
        self.start_reader()
    }

    /// Write a line as-is and echo it to the log. A failed write is logged and
    /// returned but leaves the connection up.
    pub fn send(&self, text: &str) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connected {
            return Err(ConnectionError::InvalidState {
                operation: "send",
                state: self.state,
            });
        }
        let Some(port) = self.port.as_ref() else {
            return Err(ConnectionError::InvalidState {
                operation: "send",
                state: self.state,
            });
        };

        match port.write_blocking(text.as_bytes()) {
            Ok(()) => {
                self.log.append(DisplayRecord::sent(text));
                Ok(())
            }
            Err(err) => {
                log::warn!("[controller] write to {} failed: {err}", port.port_name());
                self.log
                    .append(DisplayRecord::error(&format!("Write failed: {err}")));
                Err(ConnectionError::Write {
                    port: port.port_name().to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Stop the reader, wait for it and release the port. Returns false when
    /// there was nothing to disconnect.
    pub fn disconnect(&mut self) -> bool {
        if !matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Opened
        ) {
            return false;
        }

        self.cancel.cancel();
        if let Some(reader) = self.reader.take() {
            match reader.join() {
                ReaderExit::Stopped => log::debug!("[controller] reader stopped"),
                ReaderExit::ReadFailed => log::debug!("[controller] reader had already failed"),
            }
        }
        // Reader joined; no read can be in flight
        self.release_port();
        self.state = ConnectionState::Disconnected;

        self.log.append(DisplayRecord::info(format!(
            "Disconnected from {}",
            self.config.port_name()
        )));
        log::info!("[controller] disconnected from {}", self.config.port_name());
        true
    }

    fn release_port(&mut self) {
        if let Some(port) = self.port.take() {
            port.close();
        }
    }

    fn fail(&mut self, err: ConnectionError) -> ConnectionError {
        self.cancel.cancel();
        if let Some(reader) = self.reader.take() {
            reader.join();
        }
        self.release_port();
        self.state = ConnectionState::Error;
        log::error!("[controller] {err}");
        self.last_error = Some(err.clone());
        err
    }

    /// Out-of-order call: the controller ends in `Error` without touching the OS.
    fn wrong_state(&mut self, operation: &'static str) -> ConnectionError {
        let err = ConnectionError::InvalidState {
            operation,
            state: self.state,
        };
        self.fail(err)
    }
}

impl<T: Transport> Drop for ConnectionController<T> {
    fn drop(&mut self) {
        if !self.disconnect() {
            self.cancel.cancel();
            if let Some(reader) = self.reader.take() {
                reader.join();
            }
            self.release_port();
        }
    }
}
