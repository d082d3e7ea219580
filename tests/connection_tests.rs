use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use uartline::{
    core::logs::{MessageLog, RecordKind},
    protocol::{
        config::{FlowControl, Parity, ReadInterpretation, TransportConfig},
        controller::{ConnectionController, ConnectionState},
        error::ConnectionError,
        mock::{MockDevice, MockTransport},
    },
};

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

fn setup(
    port: &str,
    data_bits: u8,
    read_as: ReadInterpretation,
) -> (ConnectionController<MockTransport>, MockDevice, Arc<MessageLog>) {
    let transport = MockTransport::new();
    let device = transport.add_port("COM1");
    let config =
        TransportConfig::new(port, 115200, data_bits, 1.0, Parity::None, FlowControl::None)
            .unwrap();
    let log = Arc::new(MessageLog::new(100));
    let controller = ConnectionController::new(config, read_as, transport, Arc::clone(&log));
    (controller, device, log)
}

fn received(log: &MessageLog) -> Vec<String> {
    log.records()
        .iter()
        .filter(|r| r.kind() == RecordKind::Received)
        .map(|r| r.text().to_string())
        .collect()
}

#[test]
fn end_to_end_text_session() {
    let (mut ctl, device, log) = setup("COM1", 8, ReadInterpretation::Text);

    ctl.open().unwrap();
    assert_eq!(ctl.state(), ConnectionState::Opened);
    ctl.configure().unwrap();
    assert_eq!(ctl.state(), ConnectionState::Connected);
    ctl.start_reader().unwrap();

    device.feed(b"hello\n".to_vec());
    assert!(wait_until(Duration::from_secs(2), || !received(&log).is_empty()));
    assert_eq!(received(&log), vec!["->: hello"]);

    let started = Instant::now();
    assert!(ctl.disconnect());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(ctl.state(), ConnectionState::Disconnected);
    assert!(!ctl.port_is_open());
    assert!(device.is_closed());

    let count = log.len();
    device.feed(b"late\n".to_vec());
    thread::sleep(Duration::from_millis(20));
    assert_eq!(log.len(), count);
    assert_eq!(device.pending_chunks(), 1);
}

#[test]
fn connect_posts_banner() {
    let (mut ctl, _device, log) = setup("COM1", 8, ReadInterpretation::Hex);
    ctl.connect().unwrap();
    let texts: Vec<_> = log.records().iter().map(|r| r.text().to_string()).collect();
    assert_eq!(
        texts,
        vec!["Connected to COM1 at 115200 baud", "ctrl+c to exit"]
    );
}

#[test]
fn nonexistent_port_goes_to_error_without_a_handle() {
    let (mut ctl, device, _log) = setup("COM7", 8, ReadInterpretation::Text);
    let err = ctl.open().unwrap_err();
    assert!(matches!(err, ConnectionError::PortResolution { ref port, .. } if port == "COM7"));
    assert_eq!(ctl.state(), ConnectionState::Error);
    assert!(!ctl.port_is_open());
    assert_eq!(device.times_opened(), 0);
    assert!(matches!(
        ctl.configure(),
        Err(ConnectionError::InvalidState { .. })
    ));
}

#[test]
fn configure_failure_attempts_every_setting_and_releases_port() {
    let (mut ctl, device, _log) = setup("COM1", 8, ReadInterpretation::Text);
    device.reject_setting("Data bits");
    device.reject_setting("Stop bits");

    ctl.open().unwrap();
    let err = ctl.configure().unwrap_err();

    let ConnectionError::Configure { failures, .. } = &err else {
        panic!("expected a configure error, got {err:?}");
    };
    let failed: Vec<_> = failures.iter().map(|f| f.setting).collect();
    assert_eq!(failed, vec!["Data bits", "Stop bits"]);
    // Remaining settings were still attempted
    assert_eq!(device.applied().len(), 3);

    assert_eq!(ctl.state(), ConnectionState::Error);
    assert!(!ctl.port_is_open());
    assert!(device.is_closed());
    assert!(ctl.send("x").is_err());
    assert!(device.written().is_empty());
}

#[test]
fn disconnect_is_idempotent() {
    let (mut ctl, device, log) = setup("COM1", 8, ReadInterpretation::Text);
    ctl.connect().unwrap();

    assert!(ctl.disconnect());
    let after_first = log.len();
    assert!(!ctl.disconnect());
    assert_eq!(log.len(), after_first);
    assert_eq!(ctl.state(), ConnectionState::Disconnected);
    assert!(device.is_closed());

    let shutdown_records = log
        .records()
        .iter()
        .filter(|r| r.text().starts_with("Disconnected from"))
        .count();
    assert_eq!(shutdown_records, 1);
}

#[test]
fn read_error_is_logged_once_and_connection_survives() {
    let (mut ctl, device, log) = setup("COM1", 8, ReadInterpretation::Text);
    ctl.connect().unwrap();
    device.fail_reads("device reports an I/O error");

    assert!(wait_until(Duration::from_secs(2), || ctl.reader_finished()));
    let errors: Vec<_> = log
        .records()
        .iter()
        .filter(|r| r.kind() == RecordKind::Error)
        .map(|r| r.text().to_string())
        .collect();
    assert_eq!(
        errors,
        vec!["[ERROR] Read error: device reports an I/O error"]
    );
    assert_eq!(ctl.state(), ConnectionState::Connected);
    assert!(ctl.disconnect());
}

#[test]
fn word_decoding_through_the_pipeline() {
    let (mut ctl, device, log) = setup("COM1", 8, ReadInterpretation::Uint32);
    ctl.connect().unwrap();
    device.feed(vec![0x00, 0x00, 0x00, 0x01, 0xAA]);
    assert!(wait_until(Duration::from_secs(2), || !received(&log).is_empty()));
    assert_eq!(received(&log), vec!["->: 16777216 "]);
}

#[test]
fn external_cancel_stops_reader() {
    let (mut ctl, _device, _log) = setup("COM1", 8, ReadInterpretation::Text);
    ctl.connect().unwrap();
    ctl.cancel_handle().cancel();
    assert!(wait_until(Duration::from_secs(2), || ctl.reader_finished()));
    assert!(ctl.disconnect());
}

#[test]
fn fresh_controller_reconnects_after_error() {
    let transport = MockTransport::new();
    let device = transport.add_port("COM1");
    let config =
        TransportConfig::new("COM1", 9600, 8, 1.0, Parity::Odd, FlowControl::RtsCts).unwrap();
    let log = Arc::new(MessageLog::new(10));

    device.reject_setting("Flow control");
    let mut first = ConnectionController::new(
        config.clone(),
        ReadInterpretation::Text,
        transport.clone(),
        Arc::clone(&log),
    );
    assert!(first.connect().is_err());
    assert_eq!(first.state(), ConnectionState::Error);
    drop(first);

    let transport_retry = MockTransport::new();
    transport_retry.add_port("COM1");
    let mut second =
        ConnectionController::new(config, ReadInterpretation::Text, transport_retry, log);
    second.connect().unwrap();
    assert_eq!(second.state(), ConnectionState::Connected);
}
