//! Device session operations end to end.

use crate::common::{firmware, opcode_of, reply, wait_for_state, Harness};
use chameleon_term::{ConnectionState, DeviceError, Opcode, SessionError};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn test_get_version_returns_payload_text() {
    let harness = Harness::new();
    harness.usb.respond_with(|_| Some(vec![0x00, b'v', b'1']));
    harness.session.connect_usb(None).await.unwrap();

    let version = harness.device.get_version().await.unwrap();
    assert_eq!(version, "v1");
    assert_eq!(harness.usb.written(), vec![vec![0x00, 0x00, 0x10, 0x00]]);
}

#[tokio::test(start_paused = true)]
async fn test_get_version_times_out_after_five_seconds() {
    let harness = Harness::new();
    harness.session.connect_usb(None).await.unwrap();

    let started = tokio::time::Instant::now();
    let err = harness.device.get_version().await.unwrap_err();

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(harness.session.state(), ConnectionState::Connected);
    assert!(harness.session.is_connected());
    assert_eq!(harness.session.pending_requests(), 0);
}

#[tokio::test]
async fn test_operations_fail_immediately_when_disconnected() {
    let harness = Harness::new();

    let err = harness.device.scan_tags().await.unwrap_err();
    assert!(matches!(err, DeviceError::Session(SessionError::NotConnected)));
    assert!(harness.usb.written().is_empty());
}

#[tokio::test]
async fn test_scan_reports_card_uid() {
    let harness = Harness::connected().await;
    let cards = harness.device.scan_tags().await.unwrap();
    assert_eq!(cards, vec!["Card found: 04a1b2c3".to_string()]);
}

#[tokio::test]
async fn test_scan_without_card_is_empty() {
    let harness = Harness::new();
    harness.usb.respond_with(|_| Some(vec![0x00]));
    harness.session.connect_usb(None).await.unwrap();

    assert!(harness.device.scan_tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_slot_writes_slot_frame() {
    let harness = Harness::connected().await;
    harness.device.set_slot(3).await.unwrap();
    assert_eq!(
        harness.usb.written().last(),
        Some(&vec![0x00, 0x00, 0x10, 0x01, 0x03])
    );
}

#[tokio::test]
async fn test_set_uid_writes_decoded_bytes() {
    let harness = Harness::connected().await;
    harness.device.set_uid("04A1B2C3").await.unwrap();
    assert_eq!(
        harness.usb.written().last(),
        Some(&vec![0x00, 0x00, 0x30, 0x02, 0x04, 0xA1, 0xB2, 0xC3])
    );
}

#[tokio::test]
async fn test_emulation_setters() {
    let harness = Harness::connected().await;
    harness.device.set_sak(0x08).await.unwrap();
    harness.device.set_atqa([0x00, 0x04]).await.unwrap();
    harness.device.start_emulation().await.unwrap();
    harness.device.stop_emulation().await.unwrap();
    assert_eq!(harness.device.get_slot().await.unwrap().get(), 0);

    let opcodes: Vec<_> = harness
        .usb
        .written()
        .iter()
        .filter_map(|frame| opcode_of(frame))
        .collect();
    assert_eq!(
        opcodes,
        vec![
            Opcode::SetSak,
            Opcode::SetAtqa,
            Opcode::EmulatorStart,
            Opcode::EmulatorStop,
            Opcode::GetSlot,
        ]
    );
}

#[tokio::test]
async fn test_error_status_fails_operation() {
    let harness = Harness::new();
    harness.usb.respond_with(|_| Some(reply(0x02, &[])));
    harness.session.connect_usb(None).await.unwrap();

    let err = harness.device.set_slot(1).await.unwrap_err();
    match err {
        DeviceError::Rejected { opcode, status } => {
            assert_eq!(opcode, Opcode::SetSlot);
            assert_eq!(status, "INVALID_PARAM");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_send_raw_returns_status_to_caller() {
    let harness = Harness::new();
    harness.usb.respond_with(|_| Some(reply(0x01, &[0xAA])));
    harness.session.connect_usb(None).await.unwrap();

    let response = harness
        .device
        .send_raw(&[0x00, 0x00, 0x20, 0x01, 0x26])
        .await
        .unwrap();
    assert_eq!(response.status, 0x01);
    assert_eq!(response.payload, vec![0xAA]);
    assert!(!response.is_ok());
}

#[tokio::test]
async fn test_empty_chunk_is_not_a_reply() {
    let harness = Harness::new();
    harness.usb.respond_with(|_| Some(Vec::new()));
    harness.session.connect_usb(None).await.unwrap();

    // An empty chunk never leaves the reader, so this surfaces as a timeout.
    let mut config = harness.device.timeouts().clone();
    config.version_timeout_ms = 100;
    let device = chameleon_term::DeviceSession::new(harness.session.clone(), config);
    assert!(device.get_version().await.unwrap_err().is_timeout());
}

#[tokio::test]
async fn test_overlapping_requests_are_answered_in_order() {
    let harness = Harness::connected().await;

    let (version, cards, slot) = tokio::join!(
        harness.device.get_version(),
        harness.device.scan_tags(),
        harness.device.get_slot(),
    );

    assert_eq!(version.unwrap(), "ChameleonUltra v2.0");
    assert_eq!(cards.unwrap(), vec!["Card found: 04a1b2c3".to_string()]);
    assert_eq!(slot.unwrap().get(), 0);
}

#[tokio::test]
async fn test_timed_out_request_does_not_steal_next_reply() {
    let harness = Harness::new();
    let mut answered = false;
    harness.usb.respond_with(move |_| {
        // stay silent for the first request only
        let reply = answered.then(|| reply(0x00, b"second"));
        answered = true;
        reply
    });
    harness.session.connect_usb(None).await.unwrap();

    let first = harness
        .session
        .request(&[0x00, 0x00, 0x10, 0x00], Duration::from_millis(100))
        .await;
    assert!(matches!(first, Err(SessionError::Timeout(_))));

    let second = harness
        .session
        .request(&[0x00, 0x00, 0x10, 0x00], Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(second, b"\x00second".to_vec());
}

#[tokio::test]
async fn test_unsolicited_frames_are_published() {
    let harness = Harness::connected().await;
    let mut unsolicited = harness.session.subscribe_unsolicited();
    let mut inbound = harness.session.subscribe_inbound();

    harness.usb.push_frame(b"\x00tag in field");

    let frame = tokio::time::timeout(Duration::from_secs(2), unsolicited.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, b"\x00tag in field".to_vec());
    assert_eq!(inbound.recv().await.unwrap(), frame);
}

#[tokio::test]
async fn test_replies_reach_inbound_but_not_unsolicited() {
    let harness = Harness::connected().await;
    let mut unsolicited = harness.session.subscribe_unsolicited();
    let mut inbound = harness.session.subscribe_inbound();

    harness.device.get_version().await.unwrap();

    assert_eq!(inbound.recv().await.unwrap(), b"\x00ChameleonUltra v2.0".to_vec());
    assert!(unsolicited.try_recv().is_err());
}

#[tokio::test]
async fn test_link_loss_fails_pending_and_sets_error() {
    let harness = Harness::new();
    harness.usb.respond_with(firmware("v1"));
    harness.session.connect_usb(None).await.unwrap();
    let mut states = harness.session.subscribe_state();

    harness.usb.respond_with(|_| None);
    let request = {
        let device = harness.device.clone();
        tokio::spawn(async move { device.get_version().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    harness.usb.close();

    let state = wait_for_state(&mut states, |s| matches!(s, ConnectionState::Error(_))).await;
    assert_eq!(state, ConnectionState::Error("link lost".to_string()));
    assert!(!harness.session.is_connected());

    let err = request.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        DeviceError::Session(SessionError::LinkClosed) | DeviceError::Session(SessionError::Send(_))
    ));
}
