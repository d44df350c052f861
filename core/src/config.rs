//! Engine configuration
//!
//! Retry budgets, pacing and response handling for one `MobiusClient`.
//! With the defaults, discovery gives up after 26 polls (about 13 s at one
//! pulse per poll) and a response is awaited for 5 polls.

use crate::message::ChecksumPolicy;
use crate::MobiusError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attempts to start an address-filtered scan
    pub scan_start_attempts: usize,

    /// Polls for the addressed peripheral once scanning
    pub discovery_polls: usize,

    /// Connect-and-discover composite attempts
    pub connect_attempts: usize,

    /// Service discovery attempts per successful connect
    pub service_discovery_attempts: usize,

    /// Polls for a notification after each request write
    pub response_polls: usize,

    /// Rounds of a name-filtered scan for any Mobius device
    pub name_scan_rounds: usize,

    /// Pause between polls, in milliseconds
    pub poll_interval_ms: u64,

    /// Longer notifications are truncated
    pub max_response_size: usize,

    /// Whether response checksums are checked
    pub checksum_policy: ChecksumPolicy,

    /// Log every frame as hex at debug level
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_start_attempts: 4,
            discovery_polls: 26,
            connect_attempts: 2,
            service_discovery_attempts: 3,
            response_polls: 5,
            name_scan_rounds: 3,
            poll_interval_ms: 500,
            max_response_size: 255,
            checksum_policy: ChecksumPolicy::Ignore,
            debug: false,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Upper bound on time spent waiting for the addressed peripheral
    pub fn discovery_budget(&self) -> Duration {
        self.poll_interval() * self.discovery_polls as u32
    }

    /// Enable frame dumps
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Every budget must allow at least one attempt
    pub fn validate(&self) -> Result<(), MobiusError> {
        let budgets = [
            ("scan_start_attempts", self.scan_start_attempts),
            ("discovery_polls", self.discovery_polls),
            ("connect_attempts", self.connect_attempts),
            ("service_discovery_attempts", self.service_discovery_attempts),
            ("response_polls", self.response_polls),
            ("name_scan_rounds", self.name_scan_rounds),
        ];
        for (name, value) in budgets {
            if value == 0 {
                return Err(MobiusError::InvalidConfig(format!("{} must be >= 1", name)));
            }
        }
        if self.max_response_size <= crate::message::FRAME_OVERHEAD {
            return Err(MobiusError::InvalidConfig(format!(
                "max_response_size must exceed {} bytes",
                crate::message::FRAME_OVERHEAD
            )));
        }
        Ok(())
    }
}
