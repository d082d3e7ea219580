use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use super::{
    config::ReadInterpretation,
    decoder::{decode, READ_CHUNK_SIZE},
    port::PortReader,
};
use crate::core::logs::{DisplayRecord, MessageLog};

/// Pause between polls when the port has nothing buffered.
pub const IDLE_POLL: Duration = Duration::from_millis(1);

/// Shared running flag. Cancelling is one-way; every clone observes it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    running: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn cancel(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::debug!("[reader] cancellation requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_running()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// How a reader thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// The running flag was cleared.
    Stopped,
    /// A read failed while still running; one error record was logged.
    ReadFailed,
}

/// Background thread polling the port and feeding the message log.
pub struct ReaderLoop {
    handle: thread::JoinHandle<ReaderExit>,
}

impl ReaderLoop {
    pub fn spawn(
        port: PortReader,
        read_as: ReadInterpretation,
        log: Arc<MessageLog>,
        cancel: CancelHandle,
    ) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("uartline-reader".to_string())
            .spawn(move || run_reader(&port, read_as, &log, &cancel))?;
        Ok(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread. A panicked reader is reported as a failed read.
    pub fn join(self) -> ReaderExit {
        match self.handle.join() {
            Ok(exit) => exit,
            Err(_) => {
                log::error!("[reader] reader thread panicked");
                ReaderExit::ReadFailed
            }
        }
    }
}

/// Poll, decode and append until cancelled or a read fails.
pub fn run_reader(
    port: &PortReader,
    read_as: ReadInterpretation,
    log: &MessageLog,
    cancel: &CancelHandle,
) -> ReaderExit {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    log::debug!("[reader] started, decoding as {read_as}");

    while cancel.is_running() {
        match port.read_nonblocking(&mut buf) {
            Ok(0) => thread::sleep(IDLE_POLL),
            Ok(n) => {
                if let Some(record) = decode(&buf[..n], read_as) {
                    log.append(record);
                }
            }
            Err(err) => {
                // Errors caused by shutdown are expected
                if cancel.is_running() {
                    log::error!("[reader] read failed: {err}");
                    log.append(DisplayRecord::error(&format!("Read error: {err}")));
                    return ReaderExit::ReadFailed;
                }
                log::debug!("[reader] read failed during shutdown: {err}");
                break;
            }
        }
    }

    log::debug!("[reader] stopped");
    ReaderExit::Stopped
}
