//! Mobius client
//!
//! The caller-facing engine. Owns the transport capability set and the
//! engine configuration; every device operation takes the [`Session`]
//! returned by [`MobiusClient::connect`].

use crate::config::EngineConfig;
use crate::connection::{ConnectionMachine, ConnectionState};
use crate::message::{decode_scene_id, AttributeSelector, FrameCodec, OpCode, FEED_SCENE_ID};
use crate::session::Session;
use crate::transport::ble::{scan_for_devices, GattTransport};
use crate::transport::exchange::Exchange;
use crate::transport::indicator::{Indicator, NoIndicator};
use crate::transport::link::Link;
use crate::transport::pacing::{Pacer, ThreadPacer};
use crate::MobiusError;
use tracing::{debug, info, warn};

pub struct MobiusClient<T, I = NoIndicator, P = ThreadPacer> {
    link: Link<T, I, P>,
    config: EngineConfig,
    codec: FrameCodec,
    exchange: Exchange,
    state: ConnectionState,
}

impl<T: GattTransport> MobiusClient<T> {
    /// Client with default budgets, no indicator, and real sleeps between polls
    pub fn new(transport: T) -> Self {
        let config = EngineConfig::default();
        Self {
            link: Link::new(transport, NoIndicator, ThreadPacer),
            codec: FrameCodec::new(config.checksum_policy),
            exchange: Exchange::from_config(&config),
            config,
            state: ConnectionState::Idle,
        }
    }
}

impl<T, I, P> MobiusClient<T, I, P>
where
    T: GattTransport,
    I: Indicator,
    P: Pacer,
{
    pub fn with_capabilities(
        transport: T,
        indicator: I,
        pacer: P,
        config: EngineConfig,
    ) -> Result<Self, MobiusError> {
        config.validate()?;
        Ok(Self {
            link: Link::new(transport, indicator, pacer),
            codec: FrameCodec::new(config.checksum_policy),
            exchange: Exchange::from_config(&config),
            config,
            state: ConnectionState::Idle,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.link.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.link.transport
    }

    pub fn indicator(&self) -> &I {
        &self.link.indicator
    }

    pub fn pacer(&self) -> &P {
        &self.link.pacer
    }

    /// State the last connect attempt ended in
    pub fn connection_state(&self) -> &ConnectionState {
        &self.state
    }

    // ========================================================================
    // DISCOVERY & CONNECTION
    // ========================================================================

    /// Addresses of nearby Mobius controllers, found within `rounds` scan rounds
    pub fn scan(&mut self, rounds: usize) -> Result<Vec<String>, MobiusError> {
        scan_for_devices(&mut self.link, &self.config, rounds)
    }

    /// Discover, connect and resolve characteristics for `address`.
    ///
    /// On failure no handle is retained; call again to retry. A client holds
    /// at most one session: connecting while one is ready fails with
    /// [`MobiusError::InvalidState`] until it is disconnected.
    pub fn connect(&mut self, address: &str) -> Result<Session, MobiusError> {
        if self.state == ConnectionState::Ready {
            warn!("Connect to {} refused, a session is already open", address);
            return Err(MobiusError::InvalidState(self.state.to_string()));
        }

        let mut machine = ConnectionMachine::new(&self.config);
        let result = machine.run(&mut self.link, address);
        self.state = machine.state().clone();

        if let Err(err) = &result {
            warn!("Connect to {} failed: {}", address, err);
        }
        result
    }

    /// Tear down the session; true once the link is down.
    pub fn disconnect(&mut self, session: &mut Session) -> bool {
        self.state = ConnectionState::Idle;
        match session.close() {
            Some(peripheral) => {
                let down = self.link.transport.disconnect(&peripheral);
                info!("Disconnected from {} ({})", session.address(), down);
                down
            }
            None => true,
        }
    }

    // ========================================================================
    // ATTRIBUTES
    // ========================================================================

    /// Read an attribute; returns the response data segment.
    pub fn get_attribute(
        &mut self,
        session: &mut Session,
        selector: &AttributeSelector,
    ) -> Result<Vec<u8>, MobiusError> {
        let channels = session.channels()?;
        let request = self.codec.encode(
            selector.as_bytes(),
            OpCode::Get,
            OpCode::Get.reserved_word(),
            session.message_id(),
        )?;
        session.next_message_id();
        debug!(message_id = request.message_id(), "GET {:?}", selector);

        let response = self.exchange.send(&mut self.link, &channels, request.as_bytes())?;
        let data = self.codec.response_data(&response)?;
        if self.config.debug {
            debug!(data = %hex::encode(&data), "GET data");
        }
        Ok(data)
    }

    /// Write an attribute.
    ///
    /// With `verify`, the confirmation must carry the success payload for this
    /// request. Without it, only a rejected write is an error.
    pub fn set_attribute(
        &mut self,
        session: &mut Session,
        selector: &AttributeSelector,
        verify: bool,
    ) -> Result<(), MobiusError> {
        let channels = session.channels()?;
        let request = self.codec.encode(
            selector.as_bytes(),
            OpCode::Set,
            OpCode::Set.reserved_word(),
            session.message_id(),
        )?;
        session.next_message_id();
        debug!(message_id = request.message_id(), verify, "SET {:?}", selector);

        let response = match self.exchange.send(&mut self.link, &channels, request.as_bytes()) {
            Ok(response) => response,
            Err(err) if !verify && err.is_timeout() => return Ok(()),
            Err(err) => return Err(err),
        };

        if !verify || self.codec.verify_set_success(request.as_bytes(), &response) {
            Ok(())
        } else {
            warn!(message_id = request.message_id(), "SET not confirmed");
            Err(MobiusError::VerificationFailed)
        }
    }

    // ========================================================================
    // SCENES
    // ========================================================================

    pub fn get_current_scene(&mut self, session: &mut Session) -> Result<u16, MobiusError> {
        let data = self.get_attribute(session, &AttributeSelector::current_scene())?;
        let scene = decode_scene_id(&data).ok_or(MobiusError::MalformedResponse)?;
        info!("Current scene: {}", scene);
        Ok(scene)
    }

    pub fn set_scene(&mut self, session: &mut Session, scene_id: u16) -> Result<(), MobiusError> {
        info!("Setting scene {}", scene_id);
        self.set_attribute(session, &AttributeSelector::scene(scene_id), true)
    }

    pub fn set_feed_scene(&mut self, session: &mut Session) -> Result<(), MobiusError> {
        self.set_scene(session, FEED_SCENE_ID)
    }

    /// Return the controller to its programmed schedule
    pub fn run_schedule(&mut self, session: &mut Session) -> Result<(), MobiusError> {
        info!("Running schedule");
        self.set_attribute(session, &AttributeSelector::schedule(), true)
    }

    pub fn into_link(self) -> Link<T, I, P> {
        self.link
    }
}
