//! Connection state machine
//!
//! Drives a Mobius controller from "known address" to a usable session:
//!
//! ```text
//! Idle → Scanning → Connecting → DiscoveringCharacteristics → Ready
//!          │            │                  │
//!          └────────────┴──────────────────┴──→ Failed
//! ```
//!
//! Every stage has its own retry budget (see [`EngineConfig`]). Exhausting
//! a budget is terminal for that connect call: partial state is torn down
//! and there is no automatic re-entry into scanning.

use crate::config::EngineConfig;
use crate::session::Session;
use crate::transport::ble::{
    find_peripheral, resolve_characteristics, GattTransport, PeripheralHandle,
    ResolvedCharacteristics, GENERAL_SERVICE_UUID,
};
use crate::transport::indicator::{Indicator, IndicatorColor};
use crate::transport::link::Link;
use crate::transport::pacing::Pacer;
use crate::MobiusError;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Scanning,
    Connecting,
    DiscoveringCharacteristics,
    Ready,
    Failed(MobiusError),
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Ready | ConnectionState::Failed(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "Idle"),
            ConnectionState::Scanning => write!(f, "Scanning"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::DiscoveringCharacteristics => write!(f, "DiscoveringCharacteristics"),
            ConnectionState::Ready => write!(f, "Ready"),
            ConnectionState::Failed(err) => write!(f, "Failed({})", err),
        }
    }
}

/// One connect attempt against one address
pub struct ConnectionMachine<'a> {
    config: &'a EngineConfig,
    state: ConnectionState,
    history: Vec<ConnectionState>,
    peripheral: Option<PeripheralHandle>,
    characteristics: Option<ResolvedCharacteristics>,
}

impl<'a> ConnectionMachine<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Idle,
            history: vec![ConnectionState::Idle],
            peripheral: None,
            characteristics: None,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[ConnectionState] {
        &self.history
    }

    pub fn peripheral(&self) -> Option<&PeripheralHandle> {
        self.peripheral.as_ref()
    }

    pub fn characteristics(&self) -> Option<&ResolvedCharacteristics> {
        self.characteristics.as_ref()
    }

    /// Run every stage for `address`, yielding a ready session.
    pub fn run<T, I, P>(
        &mut self,
        link: &mut Link<T, I, P>,
        address: &str,
    ) -> Result<Session, MobiusError>
    where
        T: GattTransport,
        I: Indicator,
        P: Pacer,
    {
        if self.state != ConnectionState::Idle {
            return Err(MobiusError::InvalidState(self.state.to_string()));
        }

        self.transition(ConnectionState::Scanning);
        let peripheral = match find_peripheral(link, self.config, address) {
            Ok(peripheral) => peripheral,
            Err(err) => return Err(self.fail(err)),
        };
        self.peripheral = Some(peripheral.clone());

        self.transition(ConnectionState::Connecting);
        match self.connect_and_discover(link, &peripheral) {
            Ok(characteristics) => {
                self.characteristics = Some(characteristics);
                self.transition(ConnectionState::Ready);
                info!("Connected to {}", address);
                Ok(Session::open(address, peripheral, characteristics))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn connect_and_discover<T, I, P>(
        &mut self,
        link: &mut Link<T, I, P>,
        peripheral: &PeripheralHandle,
    ) -> Result<ResolvedCharacteristics, MobiusError>
    where
        T: GattTransport,
        I: Indicator,
        P: Pacer,
    {
        let mut linked = false;
        let mut resolved = None;

        for attempt in 1..=self.config.connect_attempts {
            self.transition(ConnectionState::Connecting);
            link.indicator.hold(IndicatorColor::Green, true);

            if !link.transport.connect(peripheral) {
                warn!(attempt, "Connecting to {} failed", peripheral.address());
                continue;
            }
            linked = true;
            debug!(attempt, "Connected, discovering service");
            self.transition(ConnectionState::DiscoveringCharacteristics);

            for discovery in 1..=self.config.service_discovery_attempts {
                if !link.transport.discover_service(peripheral, GENERAL_SERVICE_UUID) {
                    debug!(attempt, discovery, "Service discovery failed");
                    continue;
                }
                resolved = resolve_characteristics(link, peripheral);
                if resolved.is_some() {
                    break;
                }
            }

            if resolved.is_some() {
                break;
            }

            warn!(attempt, "Characteristics unavailable, disconnecting");
            link.transport.disconnect(peripheral);
        }

        link.indicator.hold(IndicatorColor::Green, false);

        match resolved {
            Some(characteristics) => Ok(characteristics),
            None if linked => Err(MobiusError::CharacteristicUnresolved),
            None => Err(MobiusError::ConnectFailed(peripheral.address().to_string())),
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        debug!("Connection state {} -> {}", self.state, next);
        self.state = next.clone();
        self.history.push(next);
    }

    /// Enter Failed, discarding every partially resolved handle
    fn fail(&mut self, err: MobiusError) -> MobiusError {
        self.peripheral = None;
        self.characteristics = None;
        self.transition(ConnectionState::Failed(err.clone()));
        err
    }
}
