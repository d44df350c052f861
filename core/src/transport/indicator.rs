//! Status indicator capability
//!
//! Mobius bridge boards drive an RGB LED to show progress. The engine
//! only asks for colored pulses and a held "discovery" light; what a pulse
//! looks like is up to the implementation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical LED channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedChannel {
    Red,
    Green,
    Blue,
}

/// Colors the engine signals with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorColor {
    /// Device not found
    Red,
    /// Discovery in progress (held)
    Green,
    /// Waiting for the addressed device
    Blue,
    /// Scanning for any Mobius device
    Purple,
    /// Required characteristics missing
    Yellow,
    /// Waiting for a response
    LightBlue,
}

impl IndicatorColor {
    pub fn channels(self) -> &'static [LedChannel] {
        match self {
            IndicatorColor::Red => &[LedChannel::Red],
            IndicatorColor::Green => &[LedChannel::Green],
            IndicatorColor::Blue => &[LedChannel::Blue],
            IndicatorColor::Purple => &[LedChannel::Red, LedChannel::Blue],
            IndicatorColor::Yellow => &[LedChannel::Red, LedChannel::Green],
            IndicatorColor::LightBlue => &[LedChannel::Blue, LedChannel::Green],
        }
    }
}

impl fmt::Display for IndicatorColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorColor::Red => write!(f, "red"),
            IndicatorColor::Green => write!(f, "green"),
            IndicatorColor::Blue => write!(f, "blue"),
            IndicatorColor::Purple => write!(f, "purple"),
            IndicatorColor::Yellow => write!(f, "yellow"),
            IndicatorColor::LightBlue => write!(f, "light-blue"),
        }
    }
}

/// Fire-and-forget progress signaling.
#[cfg_attr(test, mockall::automock)]
pub trait Indicator {
    /// Blink `color` `count` times
    fn pulse(&mut self, count: u16, color: IndicatorColor);

    /// Turn `color` on or off until told otherwise
    fn hold(&mut self, color: IndicatorColor, on: bool);
}

/// Indicator for hosts without one
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn pulse(&mut self, _count: u16, _color: IndicatorColor) {}

    fn hold(&mut self, _color: IndicatorColor, _on: bool) {}
}
