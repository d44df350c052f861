/// BLE (Bluetooth Low Energy) layer of the Mobius engine
///
/// - **gatt**: the GATT capability trait, handles and Mobius UUIDs
/// - **characteristics**: resolution of the request and response channels
/// - **scanner**: name scans and address-filtered discovery with retry budgets

pub mod characteristics;
pub mod gatt;
pub mod scanner;

pub use characteristics::{resolve_characteristics, ResolvedCharacteristics};

pub use gatt::{
    CharacteristicHandle, GattTransport, MobiusCharacteristic, PeripheralHandle,
    GENERAL_SERVICE_UUID, MOBIUS_DEVICE_NAME, REQUEST_CHARACTERISTIC_UUID,
    RESPONSE_DATA_CHARACTERISTIC_UUID, RESPONSE_FINAL_CHARACTERISTIC_UUID,
};

#[cfg(test)]
pub use gatt::MockGattTransport;

pub use scanner::{find_peripheral, scan_for_devices};
