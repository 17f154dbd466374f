//! Command/reply exchanges driven through a `Session` against the mock
//! instrument.

use mks_rga::mock_stream::{self, MockInstrument};
use mks_rga::protocol::commands::OnOff;
use mks_rga::{Command, RgaError, ScalarValue, Session};
use std::time::Duration;

async fn greet(rga: &mut MockInstrument) {
    rga.expect_and_respond_frame(
        b"\n\r",
        &["MKSRGA  Single", "Protocol_Revision  1.1", "Min_Compatibility  1.1"],
    )
    .await;
}

#[tokio::test]
async fn sensors_reply_is_horizontal() {
    let (stream, mut rga) = mock_stream::new();
    let mut session = Session::new(stream);

    let client = tokio::spawn(async move {
        session.handshake().await.unwrap();
        session.sensors().await
    });

    greet(&mut rga).await;
    rga.expect_and_respond_frame(
        b"Sensors\n\r",
        &[
            "Sensors OK",
            "State  SerialNumber  Name",
            "Ready  LM70-00197021  \"Chamber A\"",
            "InUse  LM70-00197022  Load",
        ],
    )
    .await;

    let resp = client.await.unwrap().unwrap();
    assert_eq!(resp.command, "Sensors");
    assert_eq!(resp.get_str("State").as_deref(), Some("Ready"));
    assert_eq!(resp.get_str("SerialNumber").as_deref(), Some("LM70-00197021"));
    assert_eq!(resp.get_str("State1").as_deref(), Some("InUse"));
    assert_eq!(resp.get_str("SerialNumber1").as_deref(), Some("LM70-00197022"));
    assert_eq!(resp.get_str("Name1").as_deref(), Some("Load"));
}

#[tokio::test]
async fn detector_info_reply_is_composite() {
    let (stream, mut rga) = mock_stream::new();
    let mut session = Session::new(stream);

    let client = tokio::spawn(async move { session.execute(&Command::DetectorInfo(0)).await });

    rga.expect_and_respond_frame(
        b"DetectorInfo 0\n\r",
        &[
            "DetectorInfo OK",
            "DetectorIndex  0",
            "Factor  Voltage",
            "1.0e-6  850",
            "2.0e-6  900",
        ],
    )
    .await;

    let resp = client.await.unwrap().unwrap();
    let names: Vec<&str> = resp.fields.names().collect();
    assert_eq!(
        names,
        ["DetectorIndex", "Factor", "Voltage", "Factor1", "Voltage1"]
    );
    assert_eq!(resp.get_i64("DetectorIndex"), Some(0));
    assert_eq!(resp.get_f64("Factor1"), Some(2.0e-6));
    assert_eq!(resp.get("Voltage"), Some(&ScalarValue::Int(850)));
}

#[tokio::test]
async fn rejected_command_carries_code_and_description() {
    let (stream, mut rga) = mock_stream::new();
    let mut session = Session::new(stream);

    let client = tokio::spawn(async move {
        let err = session
            .filament_control(OnOff::On)
            .await
            .unwrap_err();
        // The session stays usable after an instrument rejection
        let ok = session.release().await;
        (err, ok)
    });

    rga.expect_and_respond_frame(
        b"FilamentControl On\n\r",
        &[
            "FilamentControl ERROR",
            "Number  200",
            "Description  Must be in control of sensor",
        ],
    )
    .await;
    rga.expect_and_respond_frame(b"Release\n\r", &["Release OK"])
        .await;

    let (err, ok) = client.await.unwrap();
    let instrument = err.as_instrument().unwrap();
    assert_eq!(instrument.command, "FilamentControl");
    assert_eq!(instrument.code, "200");
    assert_eq!(instrument.description, "Must be in control of sensor");
    assert!(ok.is_ok());
}

#[tokio::test]
async fn reply_split_across_writes_is_reassembled() {
    let (stream, mut rga) = mock_stream::new();
    let mut session = Session::new(stream);

    let client = tokio::spawn(async move { session.sensor_state().await });

    rga.expect_write(b"SensorState\n\r").await;
    rga.send_response(b"SensorState OK\r\nSta").unwrap();
    rga.send_response(b"te  InUse\r\nUserApplication  Recorder\r\n").unwrap();
    rga.send_response(b"\r\r").unwrap();

    let state = client.await.unwrap().unwrap();
    assert_eq!(state.as_str(), "InUse");
}

#[tokio::test]
async fn closed_connection_is_fatal() {
    let (stream, mut rga) = mock_stream::new();
    let mut session = Session::new(stream);

    let client = tokio::spawn(async move { session.info().await });

    rga.expect_write(b"Info\n\r").await;
    rga.send_response(b"Info OK\r\nName  ").unwrap();
    drop(rga);

    let err = client.await.unwrap().unwrap_err();
    assert!(matches!(err, RgaError::ConnectionClosed));
    assert!(err.is_connection_fatal());
}

#[tokio::test]
async fn unterminated_reply_overflows_buffer() {
    let (stream, mut rga) = mock_stream::new();
    let mut session = Session::new(stream).with_read_timeout(Some(Duration::from_secs(2)));

    let client = tokio::spawn(async move { session.sensor_state().await });

    rga.expect_write(b"SensorState\n\r").await;
    rga.send_response(&vec![b'x'; 5000]).unwrap();

    let err = client.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        RgaError::Protocol(mks_rga::ProtocolError::MissingTerminator { capacity: 4096 })
    ));
}
