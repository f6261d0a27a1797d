//! Connection lifecycle: connect, replace, disconnect, failure and retry.

use crate::common::{firmware, Harness, PEER_PATH, USB_PATH};
use chameleon_term::config::SPP_SERVICE_UUID;
use chameleon_term::{ConnectionState, SessionError, TransportError, TransportKind};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn test_usb_connect_picks_first_usb_adapter() {
    let harness = Harness::new();
    harness.session.connect_usb(None).await.unwrap();

    assert_eq!(harness.session.state(), ConnectionState::Connected);
    assert_eq!(harness.session.active_transport_kind(), Some(TransportKind::Usb));
    // never the radio peer, even though it is also a serial node
    assert_eq!(harness.bus.opened(), vec![USB_PATH.to_string()]);
}

#[tokio::test]
async fn test_usb_connect_to_explicit_target() {
    let harness = Harness::new();
    let second = harness.bus.add_usb("/dev/ttyACM1", None);
    second.respond_with(firmware("second"));

    harness
        .session
        .connect_usb(Some("/dev/ttyACM1".to_string()))
        .await
        .unwrap();
    assert_eq!(harness.device.get_version().await.unwrap(), "second");
}

#[tokio::test]
async fn test_radio_connect_opens_spp_service() {
    let harness = Harness::new();
    harness.peer.respond_with(firmware("over the air"));

    harness.session.connect_radio(None).await.unwrap();

    assert_eq!(harness.session.active_transport_kind(), Some(TransportKind::Radio));
    assert_eq!(harness.bus.opened(), vec![PEER_PATH.to_string()]);
    assert_eq!(harness.bus.requested_services(), vec![SPP_SERVICE_UUID]);
    assert_eq!(harness.device.get_version().await.unwrap(), "over the air");
}

#[tokio::test]
async fn test_failed_connect_then_retry() {
    let harness = Harness::new();
    harness.bus.set_fail_open(true);

    let err = harness.session.connect_usb(None).await.unwrap_err();
    assert!(matches!(err, SessionError::Connect(TransportError::Port(_))));
    assert!(matches!(harness.session.state(), ConnectionState::Error(_)));
    assert!(!harness.session.is_connected());

    harness.bus.set_fail_open(false);
    harness.session.connect_usb(None).await.unwrap();
    assert_eq!(harness.session.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_unknown_radio_target() {
    let harness = Harness::new();
    let err = harness
        .session
        .connect_radio(Some("Headphones".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Connection failed: Device 'Headphones' not found");
    assert_eq!(
        harness.session.state(),
        ConnectionState::Error("Device 'Headphones' not found".to_string())
    );
}

#[tokio::test]
async fn test_new_connect_replaces_previous_transport() {
    let harness = Harness::new();
    harness.usb.respond_with(firmware("usb"));
    harness.peer.respond_with(firmware("radio"));

    harness.session.connect_usb(None).await.unwrap();
    harness.session.connect_radio(None).await.unwrap();

    assert_eq!(harness.session.active_transport_kind(), Some(TransportKind::Radio));
    assert_eq!(harness.device.get_version().await.unwrap(), "radio");
    assert!(harness.usb.written().is_empty());
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let harness = Harness::connected().await;

    harness.session.disconnect().await;
    harness.session.disconnect().await;

    assert_eq!(harness.session.state(), ConnectionState::Disconnected);
    assert_eq!(harness.session.active_transport_kind(), None);
    assert!(matches!(
        harness.session.send(&[0x00]).await,
        Err(SessionError::NotConnected)
    ));
}

#[tokio::test]
async fn test_disconnect_from_error_state() {
    let harness = Harness::new();
    let _ = harness.session.connect_radio(Some("nobody".to_string())).await;
    assert!(matches!(harness.session.state(), ConnectionState::Error(_)));

    harness.session.disconnect().await;
    assert_eq!(harness.session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_disconnect_fails_waiting_request() {
    let harness = Harness::new();
    harness.session.connect_usb(None).await.unwrap();

    let request = {
        let session = harness.session.clone();
        tokio::spawn(async move {
            session
                .request(&[0x00, 0x00, 0x10, 0x00], Duration::from_secs(30))
                .await
        })
    };
    // wait until the frame is on the wire and the request is parked
    while harness.usb.written().is_empty() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(harness.session.pending_requests(), 1);

    harness.session.disconnect().await;
    let result = request.await.unwrap();
    assert!(matches!(result, Err(SessionError::LinkClosed)));
}

#[tokio::test]
async fn test_state_stream_follows_lifecycle() {
    let harness = Harness::new();
    let mut states = harness.session.subscribe_state();
    assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);

    harness.session.connect_usb(None).await.unwrap();
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), ConnectionState::Connected);

    harness.session.disconnect().await;
    assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_raw_send_reaches_device() {
    let harness = Harness::connected().await;
    harness.session.send(&[0xDE, 0xAD]).await.unwrap();
    assert_eq!(harness.usb.written(), vec![vec![0xDE, 0xAD]]);
}
