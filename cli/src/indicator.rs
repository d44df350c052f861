// Console indicator — terminal stand-in for the controller's status LED

use colored::*;
use mobius_core::{Indicator, IndicatorColor};
use std::io::Write;
use tracing::{debug, trace};

/// Prints one colored dot per pulse on stderr when `progress` is set.
#[derive(Debug, Default)]
pub struct ConsoleIndicator {
    progress: bool,
    pulses: u64,
}

impl ConsoleIndicator {
    pub fn new(progress: bool) -> Self {
        Self { progress, pulses: 0 }
    }

    /// Pulses signaled so far
    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    /// End the current progress line, if one was started
    pub fn finish(&self) {
        if self.progress && self.pulses() > 0 {
            eprintln!();
        }
    }
}

fn dot(color: IndicatorColor) -> ColoredString {
    match color {
        IndicatorColor::Red => "•".red(),
        IndicatorColor::Green => "•".green(),
        IndicatorColor::Blue => "•".blue(),
        IndicatorColor::Purple => "•".magenta(),
        IndicatorColor::Yellow => "•".yellow(),
        IndicatorColor::LightBlue => "•".bright_cyan(),
    }
}

impl Indicator for ConsoleIndicator {
    fn pulse(&mut self, count: u16, color: IndicatorColor) {
        trace!(count, %color, "pulse");
        self.pulses += u64::from(count);
        if self.progress {
            let dots: String = (0..count).map(|_| dot(color).to_string()).collect();
            eprint!("{}", dots);
            let _ = std::io::stderr().flush();
        }
    }

    fn hold(&mut self, color: IndicatorColor, on: bool) {
        debug!(%color, on, "indicator hold");
    }
}
