/// GATT capability consumed by the protocol engine
///
/// The engine never talks to a radio directly. Platform code (a desktop BLE
/// adapter, a microcontroller stack, a test fake) implements [`GattTransport`]
/// and the engine drives it through scan, connect, discovery and
/// characteristic primitives.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Local name Mobius controllers advertise
pub const MOBIUS_DEVICE_NAME: &str = "MOBIUS";

/// General Mobius GATT service
pub const GENERAL_SERVICE_UUID: Uuid = Uuid::from_u128(0x01ff0100_ba5e_f4ee_5ca1_eb1e5e4b1ce0);

/// Request channel (TX final)
pub const REQUEST_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x01ff0104_ba5e_f4ee_5ca1_eb1e5e4b1ce0);

/// First response channel (RX data)
pub const RESPONSE_DATA_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x01ff0101_ba5e_f4ee_5ca1_eb1e5e4b1ce0);

/// Second response channel (RX final); confirmations are read from here
pub const RESPONSE_FINAL_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x01ff0102_ba5e_f4ee_5ca1_eb1e5e4b1ce0);

/// Characteristics a Mobius session needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobiusCharacteristic {
    /// Writable request channel
    Request,
    /// Notify channel, subscribed but not read
    ResponseData,
    /// Notify channel carrying confirmations
    ResponseFinal,
}

impl MobiusCharacteristic {
    pub fn uuid(&self) -> Uuid {
        match self {
            MobiusCharacteristic::Request => REQUEST_CHARACTERISTIC_UUID,
            MobiusCharacteristic::ResponseData => RESPONSE_DATA_CHARACTERISTIC_UUID,
            MobiusCharacteristic::ResponseFinal => RESPONSE_FINAL_CHARACTERISTIC_UUID,
        }
    }
}

impl fmt::Display for MobiusCharacteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MobiusCharacteristic::Request => write!(f, "request"),
            MobiusCharacteristic::ResponseData => write!(f, "response-data"),
            MobiusCharacteristic::ResponseFinal => write!(f, "response-final"),
        }
    }
}

/// A peripheral reported by a scan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeripheralHandle {
    address: String,
    local_name: Option<String>,
}

impl PeripheralHandle {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            local_name: None,
        }
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_deref()
    }

    /// BLE addresses compare case-insensitively
    pub fn has_address(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}

/// A characteristic resolved on a connected peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicHandle {
    uuid: Uuid,
}

impl CharacteristicHandle {
    pub fn new(uuid: Uuid) -> Self {
        Self { uuid }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

/// GATT central primitives for platform implementations.
///
/// Every call is blocking and returns promptly; the engine owns all waiting
/// and retry decisions.
#[cfg_attr(test, mockall::automock)]
pub trait GattTransport {
    /// Start a scan filtered by advertised local name
    fn begin_scan_by_name(&mut self, name: &str) -> bool;

    /// Start a scan filtered by peripheral address
    fn begin_scan_by_address(&mut self, address: &str) -> bool;

    fn stop_scan(&mut self);

    /// Next peripheral matching the active scan filter, if one is available
    fn poll_available_peripheral(&mut self) -> Option<PeripheralHandle>;

    fn connect(&mut self, peripheral: &PeripheralHandle) -> bool;

    fn discover_service(&mut self, peripheral: &PeripheralHandle, service: Uuid) -> bool;

    fn resolve_characteristic(
        &mut self,
        peripheral: &PeripheralHandle,
        characteristic: Uuid,
    ) -> Option<CharacteristicHandle>;

    fn can_write(&self, characteristic: &CharacteristicHandle) -> bool;

    fn write_value(&mut self, characteristic: &CharacteristicHandle, value: &[u8]) -> bool;

    fn can_subscribe(&self, characteristic: &CharacteristicHandle) -> bool;

    fn subscribe(&mut self, characteristic: &CharacteristicHandle) -> bool;

    /// True once a notification arrived that has not been read yet
    fn value_updated(&mut self, characteristic: &CharacteristicHandle) -> bool;

    /// Take the latest notified value
    fn read_value(&mut self, characteristic: &CharacteristicHandle) -> Vec<u8>;

    /// Drop the link; true if the peripheral is no longer connected
    fn disconnect(&mut self, peripheral: &PeripheralHandle) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_uuids() {
        assert_eq!(
            MobiusCharacteristic::Request.uuid().to_string(),
            "01ff0104-ba5e-f4ee-5ca1-eb1e5e4b1ce0"
        );
        assert_eq!(
            MobiusCharacteristic::ResponseData.uuid().to_string(),
            "01ff0101-ba5e-f4ee-5ca1-eb1e5e4b1ce0"
        );
        assert_eq!(
            MobiusCharacteristic::ResponseFinal.uuid().to_string(),
            "01ff0102-ba5e-f4ee-5ca1-eb1e5e4b1ce0"
        );
        assert_eq!(
            GENERAL_SERVICE_UUID.to_string(),
            "01ff0100-ba5e-f4ee-5ca1-eb1e5e4b1ce0"
        );
    }

    #[test]
    fn test_peripheral_address_is_case_insensitive() {
        let peripheral = PeripheralHandle::new("AA:BB:CC:00:11:22").with_local_name("MOBIUS");
        assert!(peripheral.has_address("aa:bb:cc:00:11:22"));
        assert!(!peripheral.has_address("aa:bb:cc:00:11:23"));
        assert_eq!(peripheral.local_name(), Some("MOBIUS"));
    }
}
