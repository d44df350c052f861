// Link — the capability set the engine drives

use super::ble::GattTransport;
use super::indicator::{Indicator, IndicatorColor};
use super::pacing::Pacer;
use std::time::Duration;

/// GATT transport plus the indicator and pacer that accompany every wait.
#[derive(Debug)]
pub struct Link<T, I, P> {
    pub transport: T,
    pub indicator: I,
    pub pacer: P,
}

impl<T: GattTransport, I: Indicator, P: Pacer> Link<T, I, P> {
    pub fn new(transport: T, indicator: I, pacer: P) -> Self {
        Self {
            transport,
            indicator,
            pacer,
        }
    }

    /// One unit of waiting: a single pulse, then one interval
    pub(crate) fn wait(&mut self, color: IndicatorColor, interval: Duration) {
        self.indicator.pulse(1, color);
        self.pacer.pause(interval);
    }

    pub fn into_parts(self) -> (T, I, P) {
        (self.transport, self.indicator, self.pacer)
    }
}
