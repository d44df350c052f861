// BLE transport over btleplug
//
// The engine's GATT capability is blocking; btleplug is async. Every call
// runs to completion on a runtime owned by the transport. Notifications are
// collected by a background task into a per-characteristic buffer that
// `value_updated` / `read_value` drain.

use anyhow::{Context, Result};
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use mobius_core::{CharacteristicHandle, GattTransport, PeripheralHandle};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// What the active scan is looking for
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanTarget {
    Name(String),
    Address(String),
}

impl ScanTarget {
    fn matches(&self, address: &str, local_name: Option<&str>) -> bool {
        match self {
            ScanTarget::Name(name) => local_name.is_some_and(|n| n.contains(name.as_str())),
            ScanTarget::Address(target) => target.eq_ignore_ascii_case(address),
        }
    }
}

type NotificationBuffer = Arc<Mutex<HashMap<Uuid, Vec<u8>>>>;

pub struct BtleTransport {
    runtime: Runtime,
    adapter: Adapter,
    target: Option<ScanTarget>,
    reported: HashSet<String>,
    pending: VecDeque<PeripheralHandle>,
    peripherals: HashMap<String, Peripheral>,
    connected: Option<Peripheral>,
    characteristics: HashMap<Uuid, Characteristic>,
    notifications: NotificationBuffer,
    listener: Option<JoinHandle<()>>,
}

impl BtleTransport {
    /// Open the BLE adapter at `adapter_index`
    pub fn new(adapter_index: usize) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("Failed to start BLE runtime")?;

        let adapter = runtime.block_on(async {
            let manager = Manager::new().await.context("Bluetooth unavailable")?;
            let adapters = manager.adapters().await.context("Failed to list adapters")?;
            adapters
                .into_iter()
                .nth(adapter_index)
                .with_context(|| format!("No BLE adapter at index {}", adapter_index))
        })?;

        Ok(Self {
            runtime,
            adapter,
            target: None,
            reported: HashSet::new(),
            pending: VecDeque::new(),
            peripherals: HashMap::new(),
            connected: None,
            characteristics: HashMap::new(),
            notifications: Arc::new(Mutex::new(HashMap::new())),
            listener: None,
        })
    }

    fn begin_scan(&mut self, target: ScanTarget) -> bool {
        self.target = Some(target);
        self.reported.clear();
        self.pending.clear();

        match self.runtime.block_on(self.adapter.start_scan(ScanFilter::default())) {
            Ok(()) => true,
            Err(err) => {
                warn!("start_scan failed: {}", err);
                self.target = None;
                false
            }
        }
    }

    /// Queue every newly seen peripheral matching the scan target
    fn refresh(&mut self) {
        let Some(target) = self.target.clone() else {
            return;
        };

        let found = self.runtime.block_on(async {
            let mut found = Vec::new();
            let peripherals = match self.adapter.peripherals().await {
                Ok(peripherals) => peripherals,
                Err(err) => {
                    warn!("Listing peripherals failed: {}", err);
                    return found;
                }
            };
            for peripheral in peripherals {
                let address = peripheral.address().to_string();
                let name = match peripheral.properties().await {
                    Ok(Some(properties)) => properties.local_name,
                    _ => None,
                };
                if target.matches(&address, name.as_deref()) {
                    found.push((address, name, peripheral));
                }
            }
            found
        });

        for (address, name, peripheral) in found {
            if !self.reported.insert(address.clone()) {
                continue;
            }
            trace!("Scan result {} ({:?})", address, name);
            let mut handle = PeripheralHandle::new(address.clone());
            if let Some(name) = name {
                handle = handle.with_local_name(name);
            }
            self.pending.push_back(handle);
            self.peripherals.insert(address, peripheral);
        }
    }

    fn peripheral(&self, handle: &PeripheralHandle) -> Option<Peripheral> {
        self.peripherals.get(handle.address()).cloned()
    }

    fn start_listener(&mut self, peripheral: &Peripheral) -> bool {
        if self.listener.is_some() {
            return true;
        }

        let stream = match self.runtime.block_on(peripheral.notifications()) {
            Ok(stream) => stream,
            Err(err) => {
                warn!("Notification stream unavailable: {}", err);
                return false;
            }
        };

        let buffer = self.notifications.clone();
        self.listener = Some(self.runtime.spawn(async move {
            let mut stream = stream;
            while let Some(notification) = stream.next().await {
                trace!(
                    uuid = %notification.uuid,
                    len = notification.value.len(),
                    "Notification"
                );
                buffer.lock().insert(notification.uuid, notification.value);
            }
        }));
        true
    }

    fn reset_link(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.characteristics.clear();
        self.notifications.lock().clear();
    }
}

impl GattTransport for BtleTransport {
    fn begin_scan_by_name(&mut self, name: &str) -> bool {
        self.begin_scan(ScanTarget::Name(name.to_string()))
    }

    fn begin_scan_by_address(&mut self, address: &str) -> bool {
        self.begin_scan(ScanTarget::Address(address.to_string()))
    }

    fn stop_scan(&mut self) {
        self.target = None;
        if let Err(err) = self.runtime.block_on(self.adapter.stop_scan()) {
            debug!("stop_scan failed: {}", err);
        }
    }

    fn poll_available_peripheral(&mut self) -> Option<PeripheralHandle> {
        if self.pending.is_empty() {
            self.refresh();
        }
        self.pending.pop_front()
    }

    fn connect(&mut self, handle: &PeripheralHandle) -> bool {
        let Some(peripheral) = self.peripheral(handle) else {
            warn!("{} was never discovered", handle.address());
            return false;
        };

        match self.runtime.block_on(peripheral.connect()) {
            Ok(()) => {
                self.connected = Some(peripheral);
                true
            }
            Err(err) => {
                warn!("Connect to {} failed: {}", handle.address(), err);
                false
            }
        }
    }

    fn discover_service(&mut self, handle: &PeripheralHandle, service: Uuid) -> bool {
        let Some(peripheral) = self.connected.clone() else {
            return false;
        };

        if let Err(err) = self.runtime.block_on(peripheral.discover_services()) {
            warn!("Service discovery on {} failed: {}", handle.address(), err);
            return false;
        }
        peripheral.services().iter().any(|s| s.uuid == service)
    }

    fn resolve_characteristic(
        &mut self,
        _handle: &PeripheralHandle,
        characteristic: Uuid,
    ) -> Option<CharacteristicHandle> {
        let peripheral = self.connected.as_ref()?;
        let found = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic)?;
        self.characteristics.insert(characteristic, found);
        Some(CharacteristicHandle::new(characteristic))
    }

    fn can_write(&self, handle: &CharacteristicHandle) -> bool {
        self.characteristics.get(&handle.uuid()).is_some_and(|c| {
            c.properties
                .intersects(CharPropFlags::WRITE | CharPropFlags::WRITE_WITHOUT_RESPONSE)
        })
    }

    fn write_value(&mut self, handle: &CharacteristicHandle, value: &[u8]) -> bool {
        let (Some(peripheral), Some(characteristic)) = (
            self.connected.as_ref(),
            self.characteristics.get(&handle.uuid()),
        ) else {
            return false;
        };

        match self.runtime.block_on(peripheral.write(
            characteristic,
            value,
            WriteType::WithResponse,
        )) {
            Ok(()) => true,
            Err(err) => {
                warn!("Write to {} failed: {}", handle.uuid(), err);
                false
            }
        }
    }

    fn can_subscribe(&self, handle: &CharacteristicHandle) -> bool {
        self.characteristics
            .get(&handle.uuid())
            .is_some_and(|c| c.properties.intersects(CharPropFlags::NOTIFY | CharPropFlags::INDICATE))
    }

    fn subscribe(&mut self, handle: &CharacteristicHandle) -> bool {
        let (Some(peripheral), Some(characteristic)) = (
            self.connected.clone(),
            self.characteristics.get(&handle.uuid()).cloned(),
        ) else {
            return false;
        };

        if let Err(err) = self.runtime.block_on(peripheral.subscribe(&characteristic)) {
            warn!("Subscribe to {} failed: {}", handle.uuid(), err);
            return false;
        }
        self.start_listener(&peripheral)
    }

    fn value_updated(&mut self, handle: &CharacteristicHandle) -> bool {
        self.notifications.lock().contains_key(&handle.uuid())
    }

    fn read_value(&mut self, handle: &CharacteristicHandle) -> Vec<u8> {
        self.notifications
            .lock()
            .remove(&handle.uuid())
            .unwrap_or_default()
    }

    fn disconnect(&mut self, handle: &PeripheralHandle) -> bool {
        self.reset_link();
        let Some(peripheral) = self.connected.take() else {
            return true;
        };

        if let Err(err) = self.runtime.block_on(peripheral.disconnect()) {
            warn!("Disconnect from {} failed: {}", handle.address(), err);
        }
        !self
            .runtime
            .block_on(peripheral.is_connected())
            .unwrap_or(false)
    }
}

impl Drop for BtleTransport {
    fn drop(&mut self) {
        if let Some(peripheral) = self.connected.take() {
            let _ = self.runtime.block_on(peripheral.disconnect());
        }
    }
}
