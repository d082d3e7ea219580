use crate::{
    core::logs::DEFAULT_LOG_CAPACITY,
    protocol::config::{
        parse_named, parse_number, ConfigField, RawTransportArgs, ReadInterpretation,
        TransportConfig, ValidationError, ValidationErrors,
    },
};

/// Everything needed to run one interactive session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub transport: TransportConfig,
    pub read_as: ReadInterpretation,
    pub history: usize,
}

/// Raw session inputs before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSessionArgs {
    pub transport: RawTransportArgs,
    pub read_as: String,
    pub history: String,
}

impl Default for RawSessionArgs {
    fn default() -> Self {
        Self {
            transport: RawTransportArgs::default(),
            read_as: ReadInterpretation::default().to_string(),
            history: DEFAULT_LOG_CAPACITY.to_string(),
        }
    }
}

impl SessionSettings {
    /// Validate all inputs, collecting every failure in field order.
    pub fn from_raw(raw: &RawSessionArgs) -> Result<Self, ValidationErrors> {
        let transport = TransportConfig::from_raw(&raw.transport);
        let read_as = parse_named::<ReadInterpretation>(ConfigField::ReadAs, &raw.read_as);
        let history = parse_number::<i64>(ConfigField::History, &raw.history).and_then(|n| {
            match usize::try_from(n) {
                Ok(n) if n >= 1 => Ok(n),
                _ => Err(ValidationError::Rejected {
                    field: ConfigField::History,
                    value: raw.history.trim().to_string(),
                    accepted: "any number of records from 1 up".to_string(),
                }),
            }
        });

        match (transport, read_as, history) {
            (Ok(transport), Ok(read_as), Ok(history)) => Ok(Self {
                transport,
                read_as,
                history,
            }),
            (transport, read_as, history) => {
                let mut errors = transport.err().map(|e| e.0).unwrap_or_default();
                errors.extend(read_as.err());
                errors.extend(history.err());
                Err(ValidationErrors(errors))
            }
        }
    }
}
