//! Scripted Mobius peripheral shared by the integration tests
#![allow(dead_code)]

use mobius_core::message::{crc16, OP_GROUP_CONFIRM, START_BYTE};
use mobius_core::transport::ble::RESPONSE_FINAL_CHARACTERISTIC_UUID;
use mobius_core::{
    CharacteristicHandle, EngineConfig, GattTransport, Indicator, IndicatorColor, InstantPacer,
    MobiusClient, PeripheralHandle,
};
use std::collections::VecDeque;
use uuid::Uuid;

pub const ADDRESS: &str = "C4:4F:33:6A:1B:02";

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>>>;

/// In-memory controller answering writes through a scripted responder
pub struct FakePeripheral {
    pub address: String,
    pub advertised: bool,
    pub connect_results: VecDeque<bool>,
    pub missing: Vec<Uuid>,
    pub unsubscribable: Vec<Uuid>,
    pub writes: Vec<Vec<u8>>,
    pub subscribed: Vec<Uuid>,
    pub connected: bool,
    pub scanning: bool,
    pub disconnects: usize,
    responder: Responder,
    pending: VecDeque<Vec<u8>>,
    late_first_reply: Option<usize>,
    held: Option<(Vec<u8>, usize)>,
}

impl FakePeripheral {
    pub fn new() -> Self {
        Self {
            address: ADDRESS.to_string(),
            advertised: true,
            connect_results: VecDeque::new(),
            missing: Vec::new(),
            unsubscribable: Vec::new(),
            writes: Vec::new(),
            subscribed: Vec::new(),
            connected: false,
            scanning: false,
            disconnects: 0,
            responder: Box::new(|_| None),
            pending: VecDeque::new(),
            late_first_reply: None,
            held: None,
        }
    }

    pub fn responding<F>(mut self, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + 'static,
    {
        self.responder = Box::new(responder);
        self
    }

    /// Answer every request with a confirmation carrying `data`
    pub fn confirming(self, data: Vec<u8>) -> Self {
        self.responding(move |request| Some(confirm(request, &data)))
    }

    /// Hold the reply to the first request back for `checks` update checks
    pub fn replying_late(mut self, checks: usize) -> Self {
        self.late_first_reply = Some(checks);
        self
    }

    pub fn without(mut self, characteristic: Uuid) -> Self {
        self.missing.push(characteristic);
        self
    }

    pub fn refusing_subscribe(mut self, characteristic: Uuid) -> Self {
        self.unsubscribable.push(characteristic);
        self
    }
}

impl GattTransport for FakePeripheral {
    fn begin_scan_by_name(&mut self, _name: &str) -> bool {
        self.scanning = true;
        true
    }

    fn begin_scan_by_address(&mut self, _address: &str) -> bool {
        self.scanning = true;
        true
    }

    fn stop_scan(&mut self) {
        self.scanning = false;
    }

    fn poll_available_peripheral(&mut self) -> Option<PeripheralHandle> {
        (self.scanning && self.advertised)
            .then(|| PeripheralHandle::new(self.address.clone()).with_local_name("MOBIUS"))
    }

    fn connect(&mut self, _peripheral: &PeripheralHandle) -> bool {
        self.connected = self.connect_results.pop_front().unwrap_or(true);
        self.connected
    }

    fn discover_service(&mut self, _peripheral: &PeripheralHandle, _service: Uuid) -> bool {
        self.connected
    }

    fn resolve_characteristic(
        &mut self,
        _peripheral: &PeripheralHandle,
        characteristic: Uuid,
    ) -> Option<CharacteristicHandle> {
        (!self.missing.contains(&characteristic)).then(|| CharacteristicHandle::new(characteristic))
    }

    fn can_write(&self, _characteristic: &CharacteristicHandle) -> bool {
        true
    }

    fn write_value(&mut self, _characteristic: &CharacteristicHandle, value: &[u8]) -> bool {
        if !self.connected {
            return false;
        }
        self.writes.push(value.to_vec());
        if let Some(reply) = (self.responder)(value) {
            match self.late_first_reply {
                Some(checks) if self.writes.len() == 1 => self.held = Some((reply, checks)),
                _ => self.pending.push_back(reply),
            }
        }
        true
    }

    fn can_subscribe(&self, characteristic: &CharacteristicHandle) -> bool {
        !self.unsubscribable.contains(&characteristic.uuid())
    }

    fn subscribe(&mut self, characteristic: &CharacteristicHandle) -> bool {
        self.subscribed.push(characteristic.uuid());
        true
    }

    fn value_updated(&mut self, characteristic: &CharacteristicHandle) -> bool {
        if characteristic.uuid() != RESPONSE_FINAL_CHARACTERISTIC_UUID {
            return false;
        }
        match self.held.take() {
            Some((reply, 0)) => self.pending.push_front(reply),
            Some((reply, checks)) => self.held = Some((reply, checks - 1)),
            None => {}
        }
        !self.pending.is_empty()
    }

    fn read_value(&mut self, _characteristic: &CharacteristicHandle) -> Vec<u8> {
        self.pending.pop_front().unwrap_or_default()
    }

    fn disconnect(&mut self, _peripheral: &PeripheralHandle) -> bool {
        self.connected = false;
        self.disconnects += 1;
        true
    }
}

/// Indicator that remembers every pulse
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub pulses: Vec<(u16, IndicatorColor)>,
    pub held: Vec<(IndicatorColor, bool)>,
}

impl RecordingIndicator {
    pub fn count(&self, color: IndicatorColor) -> u16 {
        self.pulses
            .iter()
            .filter(|(_, c)| *c == color)
            .map(|(n, _)| n)
            .sum()
    }
}

impl Indicator for RecordingIndicator {
    fn pulse(&mut self, count: u16, color: IndicatorColor) {
        self.pulses.push((count, color));
    }

    fn hold(&mut self, color: IndicatorColor, on: bool) {
        self.held.push((color, on));
    }
}

/// Confirmation mirroring the request's op code and message id
pub fn confirm(request: &[u8], data: &[u8]) -> Vec<u8> {
    let mut frame = vec![START_BYTE, OP_GROUP_CONFIRM, request[2], request[3], request[4], 0, 0];
    frame.extend_from_slice(&(data.len() as u16).to_le_bytes());
    frame.extend_from_slice(data);
    let crc = crc16(&frame[1..]);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

pub fn client(
    peripheral: FakePeripheral,
) -> MobiusClient<FakePeripheral, RecordingIndicator, InstantPacer> {
    client_with(peripheral, EngineConfig::default())
}

pub fn client_with(
    peripheral: FakePeripheral,
    config: EngineConfig,
) -> MobiusClient<FakePeripheral, RecordingIndicator, InstantPacer> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    MobiusClient::with_capabilities(
        peripheral,
        RecordingIndicator::default(),
        InstantPacer::new(),
        config,
    )
    .expect("valid config")
}
