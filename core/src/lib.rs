// Mobius Core — BLE protocol engine for Mobius aquarium controllers
//
// Frames attribute reads and writes, exchanges them over a GATT link and
// drives the controller from "known address" to a ready session.
// The engine is blocking and single-threaded; every wait is bounded.

pub mod config;
pub mod connection;
pub mod device;
pub mod message;
pub mod session;
pub mod transport;

use thiserror::Error;

pub use config::EngineConfig;
pub use connection::{ConnectionMachine, ConnectionState};
pub use device::MobiusClient;
pub use message::{AttributeSelector, ChecksumPolicy, FrameCodec, OpCode, RequestFrame};
pub use session::Session;
pub use transport::{
    CharacteristicHandle, GattTransport, Indicator, IndicatorColor, InstantPacer, NoIndicator,
    Pacer, PeripheralHandle, ResolvedCharacteristics, ThreadPacer,
};

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MobiusError {
    #[error("BLE transport unavailable: {0}")]
    TransportUnavailable(String),
    #[error("Device {0} not found")]
    NotFound(String),
    #[error("Could not connect to {0}")]
    ConnectFailed(String),
    #[error("Required characteristics unresolved")]
    CharacteristicUnresolved,
    #[error("Request write rejected")]
    WriteRejected,
    #[error("No response after {polls} polls")]
    ResponseTimeout { polls: usize },
    #[error("Malformed response")]
    MalformedResponse,
    #[error("Checksum mismatch (expected {expected:#06x}, got {actual:#06x})")]
    ChecksumMismatch { expected: u16, actual: u16 },
    #[error("SET not confirmed by device")]
    VerificationFailed,
    #[error("Not connected")]
    NotConnected,
    #[error("Attribute selector too long ({0} bytes)")]
    SelectorTooLong(usize),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl MobiusError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, MobiusError::ResponseTimeout { .. })
    }
}
