use derive_more::{Display, Error};
use std::fmt;
use strum::{EnumIter, EnumString, IntoEnumIterator};

/// Baud rates accepted on the command line.
pub const STANDARD_BAUD_RATES: [u32; 30] = [
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400, 460800, 500000, 576000, 921600, 1000000, 1152000, 1500000, 2000000, 2500000,
    3000000, 3500000, 4000000,
];

pub const VALID_DATA_BITS: [u8; 5] = [5, 6, 7, 8, 9];

/// Stop bit values are compared with this tolerance to absorb float parsing noise.
const STOP_BITS_TOLERANCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, EnumString, EnumIter)]
pub enum Parity {
    #[default]
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "odd")]
    Odd,
    #[strum(to_string = "even")]
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, EnumString, EnumIter)]
pub enum FlowControl {
    #[default]
    #[strum(to_string = "none")]
    None,
    #[strum(to_string = "rtscts")]
    RtsCts,
    #[strum(to_string = "xonxoff")]
    XonXoff,
}

/// How received bytes are turned into display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, EnumString, EnumIter)]
pub enum ReadInterpretation {
    #[default]
    #[strum(to_string = "str")]
    Text,
    #[strum(to_string = "hex")]
    Hex,
    #[strum(to_string = "i32")]
    Int32,
    #[strum(to_string = "u32")]
    Uint32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
pub enum StopBits {
    #[default]
    #[display("1")]
    One,
    #[display("1.5")]
    OnePointFive,
    #[display("2")]
    Two,
}

impl StopBits {
    pub fn as_f32(self) -> f32 {
        match self {
            StopBits::One => 1.0,
            StopBits::OnePointFive => 1.5,
            StopBits::Two => 2.0,
        }
    }

    /// Map a parsed float onto the closest legal value, if any is within tolerance.
    pub fn from_f32(value: f32) -> Option<Self> {
        StopBits::iter().find(|candidate| (candidate.as_f32() - value).abs() < STOP_BITS_TOLERANCE)
    }
}

/// The field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConfigField {
    #[display("port")]
    Port,
    #[display("baudrate")]
    BaudRate,
    #[display("data bits")]
    DataBits,
    #[display("stop bits")]
    StopBits,
    #[display("parity")]
    Parity,
    #[display("flowcontrol")]
    FlowControl,
    #[display("read type")]
    ReadAs,
    #[display("history size")]
    History,
}

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ValidationError {
    #[display("Serial port name is required")]
    MissingPort,
    #[display("Invalid value '{value}' for {field}: not a number")]
    NotANumber { field: ConfigField, value: String },
    #[display("Invalid {field} '{value}'. Valid: {accepted}")]
    Rejected {
        field: ConfigField,
        value: String,
        accepted: String,
    },
    #[display("Unknown parameter: {name}")]
    UnknownParameter { name: String },
    #[display("Missing value for parameter: {name}")]
    MissingValue { name: String },
    #[display("{message}")]
    Malformed { message: String },
}

impl ValidationError {
    pub fn field(&self) -> Option<ConfigField> {
        match self {
            ValidationError::MissingPort => Some(ConfigField::Port),
            ValidationError::NotANumber { field, .. } | ValidationError::Rejected { field, .. } => {
                Some(*field)
            }
            ValidationError::UnknownParameter { .. }
            | ValidationError::MissingValue { .. }
            | ValidationError::Malformed { .. } => None,
        }
    }
}

/// Every failure found while validating one set of inputs, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw, unvalidated transport inputs as they arrive from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransportArgs {
    pub port: Option<String>,
    pub baud_rate: String,
    pub data_bits: String,
    pub stop_bits: String,
    pub parity: String,
    pub flow_control: String,
}

impl Default for RawTransportArgs {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: "115200".to_string(),
            data_bits: "8".to_string(),
            stop_bits: "1".to_string(),
            parity: Parity::None.to_string(),
            flow_control: FlowControl::None.to_string(),
        }
    }
}

/// One line setting, applied to an open port in the order returned by
/// [`TransportConfig::line_settings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSetting {
    BaudRate(u32),
    DataBits(u8),
    Parity(Parity),
    StopBits(StopBits),
    FlowControl(FlowControl),
}

impl LineSetting {
    pub fn name(&self) -> &'static str {
        match self {
            LineSetting::BaudRate(_) => "Baudrate",
            LineSetting::DataBits(_) => "Data bits",
            LineSetting::Parity(_) => "Parity",
            LineSetting::StopBits(_) => "Stop bits",
            LineSetting::FlowControl(_) => "Flow control",
        }
    }
}

impl fmt::Display for LineSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSetting::BaudRate(v) => write!(f, "{} {v}", self.name()),
            LineSetting::DataBits(v) => write!(f, "{} {v}", self.name()),
            LineSetting::Parity(v) => write!(f, "{} {v}", self.name()),
            LineSetting::StopBits(v) => write!(f, "{} {v}", self.name()),
            LineSetting::FlowControl(v) => write!(f, "{} {v}", self.name()),
        }
    }
}

/// Validated line parameters for one connection. Fields are private so a value
/// can only come out of validation and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    port_name: String,
    baud_rate: u32,
    data_bits: u8,
    stop_bits: StopBits,
    parity: Parity,
    flow_control: FlowControl,
}

impl TransportConfig {
    /// Validate typed inputs. All fields are checked and every failure is reported.
    pub fn new(
        port_name: impl Into<String>,
        baud_rate: u32,
        data_bits: u8,
        stop_bits: f32,
        parity: Parity,
        flow_control: FlowControl,
    ) -> Result<Self, ValidationErrors> {
        let port_name = port_name.into();
        let mut errors = Vec::new();

        let port = check_port_name(Some(port_name.as_str()))
            .map_err(|e| errors.push(e))
            .ok();
        let baud = check_baud_rate(baud_rate.into()).map_err(|e| errors.push(e)).ok();
        let data = check_data_bits(data_bits.into())
            .map_err(|e| errors.push(e))
            .ok();
        let stop = check_stop_bits(stop_bits).map_err(|e| errors.push(e)).ok();

        match (port, baud, data, stop) {
            (Some(port_name), Some(baud_rate), Some(data_bits), Some(stop_bits)) => Ok(Self {
                port_name,
                baud_rate,
                data_bits,
                stop_bits,
                parity,
                flow_control,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }

    /// Validate raw string inputs, parsing numbers and looking names up in the
    /// parity and flow control tables.
    pub fn from_raw(raw: &RawTransportArgs) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        let port = check_port_name(raw.port.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        // Wide parse: out-of-range numbers are rejected, not reported as non-numeric
        let baud = parse_number::<i64>(ConfigField::BaudRate, &raw.baud_rate)
            .and_then(check_baud_rate)
            .map_err(|e| errors.push(e))
            .ok();
        let data = parse_number::<i64>(ConfigField::DataBits, &raw.data_bits)
            .and_then(check_data_bits)
            .map_err(|e| errors.push(e))
            .ok();
        let stop = parse_number::<f32>(ConfigField::StopBits, &raw.stop_bits)
            .and_then(check_stop_bits)
            .map_err(|e| errors.push(e))
            .ok();
        let parity = parse_named::<Parity>(ConfigField::Parity, &raw.parity)
            .map_err(|e| errors.push(e))
            .ok();
        let flow = parse_named::<FlowControl>(ConfigField::FlowControl, &raw.flow_control)
            .map_err(|e| errors.push(e))
            .ok();

        match (port, baud, data, stop, parity, flow) {
            (
                Some(port_name),
                Some(baud_rate),
                Some(data_bits),
                Some(stop_bits),
                Some(parity),
                Some(flow_control),
            ) => Ok(Self {
                port_name,
                baud_rate,
                data_bits,
                stop_bits,
                parity,
                flow_control,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn data_bits(&self) -> u8 {
        self.data_bits
    }

    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn flow_control(&self) -> FlowControl {
        self.flow_control
    }

    /// Settings in the order they are applied to the port.
    pub fn line_settings(&self) -> [LineSetting; 5] {
        [
            LineSetting::BaudRate(self.baud_rate),
            LineSetting::DataBits(self.data_bits),
            LineSetting::Parity(self.parity),
            LineSetting::StopBits(self.stop_bits),
            LineSetting::FlowControl(self.flow_control),
        ]
    }
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{}{} flow={}",
            self.port_name,
            self.baud_rate,
            self.data_bits,
            match self.parity {
                Parity::None => 'N',
                Parity::Odd => 'O',
                Parity::Even => 'E',
            },
            self.stop_bits,
            self.flow_control
        )
    }
}

fn check_port_name(name: Option<&str>) -> Result<String, ValidationError> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ValidationError::MissingPort),
    }
}

fn check_baud_rate(baud: i64) -> Result<u32, ValidationError> {
    match u32::try_from(baud) {
        Ok(baud) if STANDARD_BAUD_RATES.contains(&baud) => Ok(baud),
        _ => Err(ValidationError::Rejected {
            field: ConfigField::BaudRate,
            value: baud.to_string(),
            accepted: join_values(STANDARD_BAUD_RATES.iter(), " "),
        }),
    }
}

fn check_data_bits(bits: i64) -> Result<u8, ValidationError> {
    match u8::try_from(bits) {
        Ok(bits) if VALID_DATA_BITS.contains(&bits) => Ok(bits),
        _ => Err(ValidationError::Rejected {
            field: ConfigField::DataBits,
            value: bits.to_string(),
            accepted: join_values(VALID_DATA_BITS.iter(), "/"),
        }),
    }
}

fn check_stop_bits(value: f32) -> Result<StopBits, ValidationError> {
    StopBits::from_f32(value).ok_or_else(|| ValidationError::Rejected {
        field: ConfigField::StopBits,
        value: format!("{value:.1}"),
        accepted: join_values(StopBits::iter(), "/"),
    })
}

pub(crate) fn parse_number<T: std::str::FromStr>(
    field: ConfigField,
    value: &str,
) -> Result<T, ValidationError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: value.to_string(),
        })
}

/// Look a name up in an enum's name table, listing the accepted names on failure.
pub fn parse_named<T>(field: ConfigField, value: &str) -> Result<T, ValidationError>
where
    T: std::str::FromStr + IntoEnumIterator + fmt::Display,
{
    value.parse::<T>().map_err(|_| ValidationError::Rejected {
        field,
        value: value.to_string(),
        accepted: join_values(T::iter(), "/"),
    })
}

fn join_values<I>(values: I, separator: &str) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(port: &str) -> RawTransportArgs {
        RawTransportArgs {
            port: Some(port.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_validate() {
        let cfg = TransportConfig::from_raw(&raw("COM1")).unwrap();
        assert_eq!(cfg.port_name(), "COM1");
        assert_eq!(cfg.baud_rate(), 115200);
        assert_eq!(cfg.data_bits(), 8);
        assert_eq!(cfg.stop_bits(), StopBits::One);
        assert_eq!(cfg.parity(), Parity::None);
        assert_eq!(cfg.flow_control(), FlowControl::None);
    }

    #[test]
    fn stop_bits_tolerance() {
        assert_eq!(StopBits::from_f32(1.0), Some(StopBits::One));
        assert_eq!(StopBits::from_f32(1.505), Some(StopBits::OnePointFive));
        assert_eq!(StopBits::from_f32(1.995), Some(StopBits::Two));
        assert_eq!(StopBits::from_f32(1.2), None);
        assert_eq!(StopBits::from_f32(f32::NAN), None);
    }

    #[test]
    fn every_field_is_checked() {
        let args = RawTransportArgs {
            port: None,
            baud_rate: "12345".to_string(),
            data_bits: "4".to_string(),
            stop_bits: "3".to_string(),
            parity: "mark".to_string(),
            flow_control: "dtrdsr".to_string(),
        };
        let errors = TransportConfig::from_raw(&args).unwrap_err();
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field()).collect();
        assert_eq!(
            fields,
            vec![
                ConfigField::Port,
                ConfigField::BaudRate,
                ConfigField::DataBits,
                ConfigField::StopBits,
                ConfigField::Parity,
                ConfigField::FlowControl,
            ]
        );
    }

    #[test]
    fn rejection_lists_accepted_names() {
        let args = RawTransportArgs {
            parity: "mark".to_string(),
            ..raw("COM1")
        };
        let errors = TransportConfig::from_raw(&args).unwrap_err();
        assert_eq!(
            errors.0,
            vec![ValidationError::Rejected {
                field: ConfigField::Parity,
                value: "mark".to_string(),
                accepted: "none/odd/even".to_string(),
            }]
        );
        assert_eq!(
            errors.to_string(),
            "Invalid parity 'mark'. Valid: none/odd/even"
        );
    }

    #[test]
    fn non_numeric_baud_is_reported() {
        let args = RawTransportArgs {
            baud_rate: "fast".to_string(),
            ..raw("COM1")
        };
        let errors = TransportConfig::from_raw(&args).unwrap_err();
        assert!(matches!(
            errors.0.as_slice(),
            [ValidationError::NotANumber {
                field: ConfigField::BaudRate,
                ..
            }]
        ));
    }

    #[test]
    fn out_of_range_numbers_are_rejected_with_accepted_values() {
        let args = RawTransportArgs {
            baud_rate: "-5".to_string(),
            data_bits: "300".to_string(),
            ..raw("COM1")
        };
        let errors = TransportConfig::from_raw(&args).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors.0[0],
            ValidationError::Rejected { field: ConfigField::BaudRate, value, .. } if value == "-5"
        ));
        assert_eq!(
            errors.0[1],
            ValidationError::Rejected {
                field: ConfigField::DataBits,
                value: "300".to_string(),
                accepted: "5/6/7/8/9".to_string(),
            }
        );
    }

    #[test]
    fn baud_rate_table_bounds() {
        assert!(TransportConfig::new("p", 50, 8, 1.0, Parity::None, FlowControl::None).is_ok());
        assert!(
            TransportConfig::new("p", 4_000_000, 8, 1.0, Parity::None, FlowControl::None).is_ok()
        );
        assert!(TransportConfig::new("p", 4_000_001, 8, 1.0, Parity::None, FlowControl::None)
            .is_err());
    }

    #[test]
    fn name_tables_round_trip() {
        assert_eq!("rtscts".parse::<FlowControl>().unwrap(), FlowControl::RtsCts);
        assert_eq!("xonxoff".parse::<FlowControl>().unwrap(), FlowControl::XonXoff);
        assert_eq!("i32".parse::<ReadInterpretation>().unwrap(), ReadInterpretation::Int32);
        assert_eq!(ReadInterpretation::Uint32.to_string(), "u32");
        assert!("text".parse::<ReadInterpretation>().is_err());
    }

    #[test]
    fn settings_apply_in_order() {
        let cfg =
            TransportConfig::new("COM1", 9600, 7, 2.0, Parity::Even, FlowControl::XonXoff).unwrap();
        let names: Vec<_> = cfg.line_settings().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["Baudrate", "Data bits", "Parity", "Stop bits", "Flow control"]
        );
        assert_eq!(cfg.to_string(), "COM1 9600 7E2 flow=xonxoff");
    }
}
