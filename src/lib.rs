//! uartline: an interactive serial terminal.
//!
//! The library exposes the transport pipeline (`protocol`), the shared
//! message log (`core`) and the front-ends built on them (`cli`, `tui`).
//! The connection pipeline can be driven without hardware through
//! [`protocol::mock::MockTransport`].

#[doc(hidden)]
pub mod boot;
pub mod cli;
pub mod core;
pub mod protocol;
pub mod tui;
#[doc(hidden)]
pub mod utils;
