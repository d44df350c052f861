/// Mobius device scanning
///
/// Two flavors of scan are used:
///
/// - a name scan that lists every nearby controller advertising "MOBIUS"
/// - an address-filtered discovery that waits (bounded) for one controller
///   before a connect
///
/// Both always stop the scan before returning.

use super::gatt::{GattTransport, PeripheralHandle, MOBIUS_DEVICE_NAME};
use crate::config::EngineConfig;
use crate::transport::indicator::{Indicator, IndicatorColor};
use crate::transport::link::Link;
use crate::transport::pacing::Pacer;
use crate::MobiusError;
use tracing::{debug, info, warn};

/// Red pulses signaled when the addressed device never shows up
const NOT_FOUND_PULSES: u16 = 2;

/// Purple pulses per name-scan round
const SCAN_ROUND_PULSES: u16 = 2;

/// List addresses of nearby Mobius controllers.
///
/// Runs up to `rounds` rounds, stopping after the first round that found
/// anything. Each round drains every peripheral the transport has
/// available; an address reported twice is recorded once.
pub fn scan_for_devices<T, I, P>(
    link: &mut Link<T, I, P>,
    config: &EngineConfig,
    rounds: usize,
) -> Result<Vec<String>, MobiusError>
where
    T: GattTransport,
    I: Indicator,
    P: Pacer,
{
    info!("Scanning for {} devices", MOBIUS_DEVICE_NAME);

    if !link.transport.begin_scan_by_name(MOBIUS_DEVICE_NAME) {
        warn!("Failed to start scan");
        link.transport.stop_scan();
        return Err(MobiusError::TransportUnavailable(
            "name scan did not start".to_string(),
        ));
    }

    let mut found: Vec<String> = Vec::new();
    for round in 0..rounds {
        if !found.is_empty() {
            break;
        }
        link.indicator.pulse(SCAN_ROUND_PULSES, IndicatorColor::Purple);
        link.pacer.pause(config.poll_interval());

        while let Some(peripheral) = link.transport.poll_available_peripheral() {
            if found.iter().any(|known| peripheral.has_address(known)) {
                break;
            }
            debug!(round, "Found {}", peripheral.address());
            found.push(peripheral.address().to_string());
            link.indicator.pulse(1, IndicatorColor::Purple);
        }
    }

    link.transport.stop_scan();
    info!("Device count: {}", found.len());
    Ok(found)
}

/// Wait for the peripheral at `address` to appear.
///
/// Starting the scan is attempted `scan_start_attempts` times with a blue
/// pulse after each failure. Once scanning, the transport is polled
/// `discovery_polls` times, pausing one interval after each miss.
pub fn find_peripheral<T, I, P>(
    link: &mut Link<T, I, P>,
    config: &EngineConfig,
    address: &str,
) -> Result<PeripheralHandle, MobiusError>
where
    T: GattTransport,
    I: Indicator,
    P: Pacer,
{
    info!("Scanning for BLE device ({})", address);

    let mut started = false;
    for attempt in 1..=config.scan_start_attempts {
        if link.transport.begin_scan_by_address(address) {
            started = true;
            break;
        }
        debug!(attempt, "Scan failed to start");
        link.indicator.pulse(1, IndicatorColor::Blue);
    }

    if !started {
        warn!(
            "Scan for {} failed to start after {} attempts",
            address, config.scan_start_attempts
        );
        link.transport.stop_scan();
        return Err(MobiusError::TransportUnavailable(format!(
            "address scan did not start after {} attempts",
            config.scan_start_attempts
        )));
    }

    let mut peripheral = None;
    for poll in 1..=config.discovery_polls {
        match link.transport.poll_available_peripheral() {
            Some(candidate) if candidate.has_address(address) => {
                debug!(poll, "Discovered {}", candidate.address());
                peripheral = Some(candidate);
                break;
            }
            Some(other) => {
                debug!(poll, "Ignoring {}", other.address());
                link.wait(IndicatorColor::Blue, config.poll_interval());
            }
            None => link.wait(IndicatorColor::Blue, config.poll_interval()),
        }
    }

    link.transport.stop_scan();

    match peripheral {
        Some(peripheral) => {
            info!("Found the BLE device");
            Ok(peripheral)
        }
        None => {
            warn!("BLE device {} not found", address);
            link.indicator.pulse(NOT_FOUND_PULSES, IndicatorColor::Red);
            Err(MobiusError::NotFound(address.to_string()))
        }
    }
}
