// Session — per-connection state of one Mobius controller
//
// A session exists only after the connection state machine reached Ready.
// It is an explicit value: every request threads it through, so nothing
// about the connected device lives in globals.

use crate::message::INITIAL_MESSAGE_ID;
use crate::transport::ble::{PeripheralHandle, ResolvedCharacteristics};
use crate::MobiusError;

/// Not `Clone`: a copy would carry its own message-id counter.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    address: String,
    peripheral: Option<PeripheralHandle>,
    characteristics: Option<ResolvedCharacteristics>,
    message_id: u16,
}

impl Session {
    pub(crate) fn open(
        address: impl Into<String>,
        peripheral: PeripheralHandle,
        characteristics: ResolvedCharacteristics,
    ) -> Self {
        Self {
            address: address.into(),
            peripheral: Some(peripheral),
            characteristics: Some(characteristics),
            message_id: INITIAL_MESSAGE_ID,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn peripheral(&self) -> Option<&PeripheralHandle> {
        self.peripheral.as_ref()
    }

    pub fn characteristics(&self) -> Option<&ResolvedCharacteristics> {
        self.characteristics.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.peripheral.is_some() && self.characteristics.is_some()
    }

    /// Id the next request will carry
    pub fn message_id(&self) -> u16 {
        self.message_id
    }

    /// Hand out the current id and advance the counter.
    ///
    /// Ids wrap per 16-bit arithmetic.
    pub(crate) fn next_message_id(&mut self) -> u16 {
        let id = self.message_id;
        self.message_id = self.message_id.wrapping_add(1);
        id
    }

    pub(crate) fn channels(&self) -> Result<ResolvedCharacteristics, MobiusError> {
        match (&self.peripheral, self.characteristics) {
            (Some(_), Some(characteristics)) => Ok(characteristics),
            _ => Err(MobiusError::NotConnected),
        }
    }

    /// Drop every handle and reset the counter; returns the peripheral to disconnect
    pub(crate) fn close(&mut self) -> Option<PeripheralHandle> {
        self.characteristics = None;
        self.message_id = INITIAL_MESSAGE_ID;
        self.peripheral.take()
    }
}
