//! Request/response exchange
//!
//! One write to the request characteristic, then a bounded wait for the
//! confirmation notification. No validation happens here: the caller gets
//! the bytes as received, or an explicit absence.

use super::ble::{GattTransport, ResolvedCharacteristics};
use super::indicator::{Indicator, IndicatorColor};
use super::link::Link;
use super::pacing::Pacer;
use crate::config::EngineConfig;
use crate::MobiusError;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Write-then-await cycle with a fixed poll budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    response_polls: usize,
    poll_interval: Duration,
    max_response_size: usize,
    debug: bool,
}

impl Exchange {
    pub fn new(response_polls: usize, poll_interval: Duration, max_response_size: usize) -> Self {
        Self {
            response_polls,
            poll_interval,
            max_response_size,
            debug: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            response_polls: config.response_polls,
            poll_interval: config.poll_interval(),
            max_response_size: config.max_response_size,
            debug: config.debug,
        }
    }

    pub fn response_polls(&self) -> usize {
        self.response_polls
    }

    /// Write `request` once and wait for the response.
    ///
    /// A notification already pending before the write belongs to an earlier
    /// request and is discarded.
    /// A rejected write fails immediately with [`MobiusError::WriteRejected`].
    /// Otherwise the response characteristic is polled up to
    /// `response_polls` times; a notification that reads back empty does
    /// not end the wait.
    pub fn send<T, I, P>(
        &self,
        link: &mut Link<T, I, P>,
        channels: &ResolvedCharacteristics,
        request: &[u8],
    ) -> Result<Vec<u8>, MobiusError>
    where
        T: GattTransport,
        I: Indicator,
        P: Pacer,
    {
        if self.debug {
            debug!(request = %hex::encode(request), "Sending request");
        }

        if link.transport.value_updated(&channels.response_final) {
            let stale = link.transport.read_value(&channels.response_final);
            trace!(len = stale.len(), "Discarded stale notification");
        }

        if !link.transport.write_value(&channels.request, request) {
            warn!("Request write rejected by peripheral");
            return Err(MobiusError::WriteRejected);
        }

        for attempt in 1..=self.response_polls {
            link.wait(IndicatorColor::LightBlue, self.poll_interval);

            if !link.transport.value_updated(&channels.response_final) {
                trace!(attempt, "No response yet");
                continue;
            }

            let mut response = link.transport.read_value(&channels.response_final);
            if response.is_empty() {
                trace!(attempt, "Empty notification ignored");
                continue;
            }
            response.truncate(self.max_response_size);

            if self.debug {
                debug!(response = %hex::encode(&response), attempt, "Response received");
            } else {
                debug!(len = response.len(), attempt, "Response received");
            }
            return Ok(response);
        }

        warn!("No response after {} polls", self.response_polls);
        Err(MobiusError::ResponseTimeout {
            polls: self.response_polls,
        })
    }
}
