use derive_more::{Display, Error};

use super::controller::ConnectionState;

/// A single line setting the OS refused while configuring a port.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{setting} failed: {reason}")]
pub struct ConfigureFailure {
    pub setting: &'static str,
    pub reason: String,
}

/// Failures of the connection lifecycle. Every variant is terminal for the
/// attempt that produced it except `Write`, which leaves the connection up.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ConnectionError {
    #[display("Cannot find port {port}: {reason}")]
    PortResolution { port: String, reason: String },
    #[display("Failed to open port {port}: {reason}{}", hint_suffix(hint))]
    PortOpen {
        port: String,
        reason: String,
        hint: Option<&'static str>,
    },
    #[display("Failed to configure port {port}: {}", join_failures(failures))]
    Configure {
        port: String,
        failures: Vec<ConfigureFailure>,
    },
    #[display("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },
    #[display("Failed to start reader thread: {reason}")]
    ReaderSpawn { reason: String },
    #[display("Failed to write to port {port}: {reason}")]
    Write { port: String, reason: String },
}

impl ConnectionError {
    /// Remediation hint attached to permission problems, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ConnectionError::PortOpen { hint, .. } => *hint,
            _ => None,
        }
    }
}

fn hint_suffix(hint: &Option<&'static str>) -> String {
    match hint {
        Some(hint) => format!("\n{hint}"),
        None => String::new(),
    }
}

fn join_failures(failures: &[ConfigureFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
