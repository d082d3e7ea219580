pub mod actions;
pub mod config;

use clap::{
    error::{ContextKind, ContextValue, ErrorKind},
    Arg, ArgAction, ArgMatches, Command,
};
use std::ffi::OsString;

use crate::protocol::config::{ValidationError, ValidationErrors};
use config::{RawSessionArgs, SessionSettings};

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum CliRequest {
    /// No arguments: list ports and exit.
    ListPorts,
    Help(String),
    Version,
    Connect(SessionSettings),
}

/// Build the command definition.
pub fn build_command() -> Command {
    Command::new("uartline")
        .about("Interactive serial port terminal. Lists serial ports when run without options.")
        .disable_version_flag(true)
        .args_override_self(true)
        .arg(
            Arg::new("serial")
                .long("serial")
                .short('s')
                .visible_alias("port")
                .visible_short_alias('p')
                .value_name("SERIALPORT")
                .help("Serial port to open (required)"),
        )
        .arg(
            Arg::new("baudrate")
                .long("baudrate")
                .short('b')
                .value_name("RATE")
                .help("Baud rate (default: 115200)"),
        )
        .arg(
            Arg::new("databits")
                .long("databits")
                .short('d')
                .value_name("BITS")
                .help("Data bits: 5/6/7/8/9 (default: 8)"),
        )
        .arg(
            Arg::new("stopbits")
                .long("stopbits")
                .short('S')
                .value_name("BITS")
                .help("Stop bits: 1/1.5/2 (default: 1)"),
        )
        .arg(
            Arg::new("parity")
                .long("parity")
                .short('P')
                .value_name("TYPE")
                .help("Parity: none/odd/even (default: none)"),
        )
        .arg(
            Arg::new("flowcontrol")
                .long("flowcontrol")
                .short('f')
                .value_name("TYPE")
                .help("Flow control: none/rtscts/xonxoff (default: none)"),
        )
        .arg(
            Arg::new("read")
                .long("read")
                .short('r')
                .value_name("DATATYPE")
                .help("Show received data as str/hex/i32/u32 (default: str)"),
        )
        .arg(
            Arg::new("history")
                .long("history")
                .short('n')
                .value_name("RECORDS")
                .help("Number of records kept in the message log (default: 100)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Print version information"),
        )
}

/// Parse the process arguments, first item being the program name.
pub fn parse_args<I, T>(args: I) -> Result<CliRequest, ValidationErrors>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        return Ok(CliRequest::ListPorts);
    }

    let matches = match build_command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            return Ok(CliRequest::Help(err.render().to_string()));
        }
        Err(err) => return Err(map_clap_error(&err).into()),
    };

    if matches.get_flag("version") {
        return Ok(CliRequest::Version);
    }

    SessionSettings::from_raw(&raw_args(&matches)).map(CliRequest::Connect)
}

fn raw_args(matches: &ArgMatches) -> RawSessionArgs {
    let mut raw = RawSessionArgs::default();
    let value = |id: &str| matches.get_one::<String>(id).cloned();

    raw.transport.port = value("serial");
    if let Some(v) = value("baudrate") {
        raw.transport.baud_rate = v;
    }
    if let Some(v) = value("databits") {
        raw.transport.data_bits = v;
    }
    if let Some(v) = value("stopbits") {
        raw.transport.stop_bits = v;
    }
    if let Some(v) = value("parity") {
        raw.transport.parity = v;
    }
    if let Some(v) = value("flowcontrol") {
        raw.transport.flow_control = v;
    }
    if let Some(v) = value("read") {
        raw.read_as = v;
    }
    if let Some(v) = value("history") {
        raw.history = v;
    }
    raw
}

fn map_clap_error(err: &clap::Error) -> ValidationError {
    let arg_name = || {
        context_string(err, ContextKind::InvalidArg)
            .and_then(|s| s.split_whitespace().next().map(str::to_string))
            .unwrap_or_default()
    };

    match err.kind() {
        ErrorKind::UnknownArgument => ValidationError::UnknownParameter { name: arg_name() },
        ErrorKind::InvalidValue
            if context_string(err, ContextKind::InvalidValue).map_or(true, |v| v.is_empty()) =>
        {
            ValidationError::MissingValue { name: arg_name() }
        }
        _ => ValidationError::Malformed {
            message: err.render().to_string().trim().to_string(),
        },
    }
}

fn context_string(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind)? {
        ContextValue::String(s) => Some(s.clone()),
        ContextValue::Strings(v) => v.first().cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::config::{FlowControl, Parity, ReadInterpretation, StopBits};

    fn parse(args: &[&str]) -> Result<CliRequest, ValidationErrors> {
        parse_args(std::iter::once("uartline").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_valid() {
        build_command().debug_assert();
    }

    #[test]
    fn no_arguments_lists_ports() {
        assert_eq!(parse(&[]), Ok(CliRequest::ListPorts));
    }

    #[test]
    fn all_options() {
        let request = parse(&[
            "-p", "COM3", "-b", "9600", "-d", "7", "-S", "2", "-P", "even", "-f", "rtscts",
            "-r", "hex", "-n", "500",
        ])
        .unwrap();
        let CliRequest::Connect(settings) = request else {
            panic!("expected a connect request, got {request:?}");
        };
        let t = &settings.transport;
        assert_eq!(t.port_name(), "COM3");
        assert_eq!(t.baud_rate(), 9600);
        assert_eq!(t.data_bits(), 7);
        assert_eq!(t.stop_bits(), StopBits::Two);
        assert_eq!(t.parity(), Parity::Even);
        assert_eq!(t.flow_control(), FlowControl::RtsCts);
        assert_eq!(settings.read_as, ReadInterpretation::Hex);
        assert_eq!(settings.history, 500);
    }

    #[test]
    fn long_names_and_aliases() {
        for flag in ["--serial", "--port", "-s", "-p"] {
            let request = parse(&[flag, "/dev/ttyACM0", "--stopbits", "1.5"]).unwrap();
            assert!(matches!(request, CliRequest::Connect(_)), "{flag}");
        }
    }

    #[test]
    fn unknown_parameter() {
        let errors = parse(&["--port", "COM1", "--turbo"]).unwrap_err();
        assert_eq!(
            errors.0,
            vec![ValidationError::UnknownParameter {
                name: "--turbo".to_string()
            }]
        );
    }

    #[test]
    fn missing_value() {
        let errors = parse(&["--port", "COM1", "--baudrate"]).unwrap_err();
        assert_eq!(
            errors.0,
            vec![ValidationError::MissingValue {
                name: "--baudrate".to_string()
            }]
        );
    }

    #[test]
    fn missing_port_is_reported() {
        let errors = parse(&["-b", "9600"]).unwrap_err();
        assert_eq!(errors.0, vec![ValidationError::MissingPort]);
    }

    #[test]
    fn help_and_version() {
        assert!(matches!(parse(&["--help"]), Ok(CliRequest::Help(text)) if text.contains("--baudrate")));
        assert_eq!(parse(&["-v"]), Ok(CliRequest::Version));
    }
}
