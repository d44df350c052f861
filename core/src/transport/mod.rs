// Transport module — capabilities the engine consumes and the request/response exchange

pub mod ble;
pub mod exchange;
pub mod indicator;
pub mod link;
pub mod pacing;

pub use ble::{
    CharacteristicHandle, GattTransport, MobiusCharacteristic, PeripheralHandle,
    ResolvedCharacteristics,
};
pub use exchange::Exchange;
pub use indicator::{Indicator, IndicatorColor, LedChannel, NoIndicator};
pub use link::Link;
pub use pacing::{InstantPacer, Pacer, ThreadPacer};
