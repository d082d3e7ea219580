//! Serial transport pipeline: validated line parameters, the port handle, the
//! frame decoder, the background reader and the connection state machine.
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod mock;
pub mod port;
pub mod runtime;
pub mod tty;

pub use config::{ReadInterpretation, TransportConfig};
pub use controller::{ConnectionController, ConnectionState};
pub use error::ConnectionError;
pub use port::{PortHandle, SystemTransport, Transport};
pub use runtime::CancelHandle;
