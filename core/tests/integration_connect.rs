//! Connection integration tests
//!
//! Drive a `MobiusClient` against the scripted peripheral from discovery to
//! a ready session, and through every terminal failure.
//!
//! Run with: cargo test --test integration_connect

mod common;

use common::{client, FakePeripheral, ADDRESS};
use mobius_core::transport::ble::{
    RESPONSE_DATA_CHARACTERISTIC_UUID, RESPONSE_FINAL_CHARACTERISTIC_UUID,
};
use mobius_core::{ConnectionState, IndicatorColor, MobiusError};

#[test]
fn test_connect_yields_ready_session() {
    let mut client = client(FakePeripheral::new());

    let session = client.connect(ADDRESS).expect("Failed to connect");

    assert!(session.is_ready());
    assert_eq!(session.address(), ADDRESS);
    assert_eq!(session.message_id(), 2);
    assert_eq!(client.connection_state(), &ConnectionState::Ready);

    // Both notify channels are subscribed even though only one is read
    let subscribed = &client.transport().subscribed;
    assert!(subscribed.contains(&RESPONSE_DATA_CHARACTERISTIC_UUID));
    assert!(subscribed.contains(&RESPONSE_FINAL_CHARACTERISTIC_UUID));

    // Discovery light is held for the connect loop and released after
    assert_eq!(
        client.indicator().held,
        vec![(IndicatorColor::Green, true), (IndicatorColor::Green, false)]
    );
}

#[test]
fn test_address_is_matched_case_insensitively() {
    let mut client = client(FakePeripheral::new());
    let session = client
        .connect(&ADDRESS.to_lowercase())
        .expect("Failed to connect");
    assert!(session.is_ready());
}

#[test]
fn test_one_unsubscribable_characteristic_fails_connect() {
    let peripheral = FakePeripheral::new().refusing_subscribe(RESPONSE_FINAL_CHARACTERISTIC_UUID);
    let mut client = client(peripheral);

    let result = client.connect(ADDRESS);

    assert_eq!(result, Err(MobiusError::CharacteristicUnresolved));
    assert!(matches!(
        client.connection_state(),
        ConnectionState::Failed(MobiusError::CharacteristicUnresolved)
    ));
    // Disconnected after each of the two connect attempts
    assert_eq!(client.transport().disconnects, 2);
    assert!(!client.transport().connected);
    // One yellow burst per resolution failure: 2 connects x 3 discoveries
    assert_eq!(client.indicator().count(IndicatorColor::Yellow), 6 * 6);
}

#[test]
fn test_missing_request_characteristic_fails_connect() {
    let peripheral =
        FakePeripheral::new().without(mobius_core::transport::ble::REQUEST_CHARACTERISTIC_UUID);
    let mut client = client(peripheral);

    assert_eq!(
        client.connect(ADDRESS),
        Err(MobiusError::CharacteristicUnresolved)
    );
}

#[test]
fn test_silent_device_is_not_found() {
    let mut peripheral = FakePeripheral::new();
    peripheral.advertised = false;
    let mut client = client(peripheral);

    let result = client.connect(ADDRESS);

    assert_eq!(result, Err(MobiusError::NotFound(ADDRESS.to_string())));
    assert_eq!(client.pacer().pauses(), 26);
    assert_eq!(client.indicator().count(IndicatorColor::Blue), 26);
    assert_eq!(client.indicator().count(IndicatorColor::Red), 2);
    assert!(!client.transport().scanning);
}

#[test]
fn test_refused_connects_then_retry_succeeds() {
    let mut peripheral = FakePeripheral::new();
    peripheral.connect_results = [false, false].into_iter().collect();
    let mut client = client(peripheral);

    assert_eq!(
        client.connect(ADDRESS),
        Err(MobiusError::ConnectFailed(ADDRESS.to_string()))
    );

    // No automatic re-entry; the caller simply connects again
    let session = client.connect(ADDRESS).expect("Failed to reconnect");
    assert!(session.is_ready());
}

#[test]
fn test_disconnect_resets_session() {
    let mut client = client(FakePeripheral::new().confirming(vec![0x00, 0xFF, 0xFF]));
    let mut session = client.connect(ADDRESS).expect("Failed to connect");
    client.set_feed_scene(&mut session).expect("Failed to set scene");

    assert!(client.disconnect(&mut session));
    assert!(!session.is_ready());
    assert_eq!(session.message_id(), 2);
    assert!(!client.transport().connected);
    assert_eq!(client.connection_state(), &ConnectionState::Idle);
}

#[test]
fn test_scan_lists_advertising_devices() {
    let mut client = client(FakePeripheral::new());

    let found = client.scan(3).expect("Scan failed");

    assert_eq!(found, vec![ADDRESS.to_string()]);
    assert!(!client.transport().scanning);
}
