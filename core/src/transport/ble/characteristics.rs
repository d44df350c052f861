/// Characteristic resolution
///
/// A Mobius session needs three characteristics: a writable request
/// channel and two notify channels that must both accept a subscription.
/// Resolution is all or nothing.

use super::gatt::{CharacteristicHandle, GattTransport, MobiusCharacteristic, PeripheralHandle};
use crate::transport::indicator::{Indicator, IndicatorColor};
use crate::transport::link::Link;
use crate::transport::pacing::Pacer;
use tracing::{debug, warn};

/// Pulses signaled when resolution fails (about three seconds of yellow)
const UNRESOLVED_PULSES: u16 = 6;

/// The three channels of a ready session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCharacteristics {
    pub request: CharacteristicHandle,
    pub response_data: CharacteristicHandle,
    pub response_final: CharacteristicHandle,
}

/// Resolve and prepare the request and response characteristics.
///
/// All three checks run even when an earlier one fails, so each notify
/// channel gets its subscribe attempt. Any failure discards every handle.
pub fn resolve_characteristics<T, I, P>(
    link: &mut Link<T, I, P>,
    peripheral: &PeripheralHandle,
) -> Option<ResolvedCharacteristics>
where
    T: GattTransport,
    I: Indicator,
    P: Pacer,
{
    debug!("Resolving characteristics on {}", peripheral.address());

    let request = writable(&mut link.transport, peripheral, MobiusCharacteristic::Request);
    let response_data =
        subscribed(&mut link.transport, peripheral, MobiusCharacteristic::ResponseData);
    let response_final =
        subscribed(&mut link.transport, peripheral, MobiusCharacteristic::ResponseFinal);

    debug!(
        request = request.is_some(),
        response_data = response_data.is_some(),
        response_final = response_final.is_some(),
        "Characteristic resolution finished"
    );

    match (request, response_data, response_final) {
        (Some(request), Some(response_data), Some(response_final)) => {
            Some(ResolvedCharacteristics {
                request,
                response_data,
                response_final,
            })
        }
        _ => {
            warn!("Required characteristics missing on {}", peripheral.address());
            link.indicator.pulse(UNRESOLVED_PULSES, IndicatorColor::Yellow);
            None
        }
    }
}

fn writable<T: GattTransport>(
    transport: &mut T,
    peripheral: &PeripheralHandle,
    characteristic: MobiusCharacteristic,
) -> Option<CharacteristicHandle> {
    let handle = transport.resolve_characteristic(peripheral, characteristic.uuid())?;
    transport.can_write(&handle).then_some(handle)
}

fn subscribed<T: GattTransport>(
    transport: &mut T,
    peripheral: &PeripheralHandle,
    characteristic: MobiusCharacteristic,
) -> Option<CharacteristicHandle> {
    let handle = transport.resolve_characteristic(peripheral, characteristic.uuid())?;
    if !transport.can_subscribe(&handle) {
        debug!("{} characteristic cannot be subscribed", characteristic);
        return None;
    }
    transport.subscribe(&handle).then_some(handle)
}
