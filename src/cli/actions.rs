use anyhow::{anyhow, Result};
use std::{
    io::{self, Write},
    process::ExitCode,
    sync::Arc,
};

use super::{config::SessionSettings, parse_args, CliRequest};
use crate::{
    core::{bus, logs::MessageLog},
    protocol::{ConnectionController, SystemTransport},
    tui::{self, console::Console},
    utils::ports::print_ports,
};

/// Dispatch on the command line and run to completion.
pub fn run<I, T>(args: I) -> Result<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let request = match parse_args(args) {
        Ok(request) => request,
        Err(errors) => {
            for err in errors.iter() {
                eprintln!("{err}");
            }
            eprintln!("Try '--help' for more information.");
            return Ok(ExitCode::FAILURE);
        }
    };

    match request {
        CliRequest::ListPorts => {
            print_ports(&mut io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        CliRequest::Help(text) => {
            print!("{text}");
            io::stdout().flush()?;
            Ok(ExitCode::SUCCESS)
        }
        CliRequest::Version => {
            print!("{}", version_text());
            Ok(ExitCode::SUCCESS)
        }
        CliRequest::Connect(settings) => connect_and_run(settings),
    }
}

pub fn version_text() -> String {
    format!(
        "uartline {}\nbuilt {}\nlicense {}\nserialport {}, ratatui {}, crossterm {}\n",
        env!("CARGO_PKG_VERSION"),
        env!("UARTLINE_BUILD_DATE"),
        env!("CARGO_PKG_LICENSE"),
        env!("UARTLINE_SERIALPORT_VERSION"),
        env!("UARTLINE_RATATUI_VERSION"),
        env!("UARTLINE_CROSSTERM_VERSION"),
    )
}

fn connect_and_run(settings: SessionSettings) -> Result<ExitCode> {
    let (notifier, core_rx) = bus::channel();
    let log = Arc::new(MessageLog::with_notifier(settings.history, notifier.clone()));

    let mut controller = ConnectionController::new(
        settings.transport,
        settings.read_as,
        SystemTransport,
        Arc::clone(&log),
    );

    if let Err(err) = controller.connect() {
        eprintln!("{err}");
        return Ok(ExitCode::FAILURE);
    }

    let cancel = controller.cancel_handle();
    {
        let cancel = cancel.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            cancel.cancel();
            notifier.notify(bus::CoreToUi::Quit);
        }) {
            log::warn!("failed to install signal handler: {err}");
        }
    }

    let session = {
        let controller = &controller;
        let mut console = Console::new(Arc::clone(&log));
        console.set_on_send(move |line| {
            // Failures are already posted to the log
            let _ = controller.send(line);
        });
        tui::run(&mut console, &cancel, &core_rx)
    };

    controller.disconnect();
    session
        .map(|()| ExitCode::SUCCESS)
        .map_err(|err| anyhow!("terminal session failed: {err}"))
}
