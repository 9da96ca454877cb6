//! Satellite network manager.
//!
//! Sits on top of a [`Transport`] at the core: discovers satellites, keeps
//! the registry and telemetry, tracks liveness and dispatches inbound
//! messages. All state is mutated through `&mut self` from a single task,
//! typically the one running [`monitor_satellites`](SatelliteNetworkManager::monitor_satellites).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use satlink::network::SatelliteNetworkManager;
//! use satlink::transport::Link;
//! use satlink::Transport;
//!
//! # async fn run(link: Link) -> satlink::Result<()> {
//! let transport = Arc::new(Transport::builder(link).build());
//! let mut network = SatelliteNetworkManager::builder(transport)
//!     .handle("DSP", |msg, _transport| async move {
//!         println!("{}", msg);
//!         Ok(())
//!     })
//!     .build();
//!
//! network.discover_satellites().await?;
//! network.monitor_satellites().await;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, error, info, warn, Instrument, Span};

use super::events::{LogHook, NetworkEvent, StatusHook};
use super::handlers::{HandlerRegistry, HandlerResult};
use super::satellite::{Satellite, Telemetry};
use super::throttle::TaskSlot;
use crate::config::NetworkConfig;
use crate::error::Result;
use crate::message::{Message, Payload};
use crate::protocol::{commands, destinations};
use crate::transport::Transport;

/// Type index and starting index of the first ID assignment (`TTII`).
const FIRST_ASSIGNMENT: &str = "0100";

/// Builder for a [`SatelliteNetworkManager`].
pub struct NetworkManagerBuilder {
    transport: Arc<Transport>,
    config: NetworkConfig,
    hook: Arc<dyn StatusHook>,
    handlers: HandlerRegistry,
    span: Span,
}

impl NetworkManagerBuilder {
    /// Start from the transport toward the satellites.
    pub fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            config: NetworkConfig::default(),
            hook: Arc::new(LogHook),
            handlers: HandlerRegistry::new(),
            span: Span::none(),
        }
    }

    /// Liveness, discovery and handler limits.
    ///
    /// Default: [`NetworkConfig::default`]
    pub fn config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }

    /// Hook that reacts to network events.
    ///
    /// Default: [`LogHook`]
    pub fn status_hook(mut self, hook: impl StatusHook) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    /// Register an application handler for `command`.
    ///
    /// Handlers run as tasks, at most `max_concurrent_handlers` at once.
    /// When this limit is reached, further messages for handlers are
    /// dropped with a warning.
    pub fn handle<F, Fut>(mut self, command: &str, handler: F) -> Self
    where
        F: Fn(Message, Arc<Transport>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers.register(command, handler);
        self
    }

    /// Span that manager calls and handler tasks run in.
    ///
    /// Default: `Span::none()`
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Create the manager. No task is spawned until it starts handling traffic.
    pub fn build(self) -> SatelliteNetworkManager {
        SatelliteNetworkManager {
            handler_permits: Arc::new(Semaphore::new(self.config.max_concurrent_handlers)),
            transport: self.transport,
            config: self.config,
            satellites: HashMap::new(),
            telemetry: HashMap::new(),
            handlers: self.handlers,
            hook: self.hook,
            status_slot: TaskSlot::new(),
            span: self.span,
        }
    }
}

/// Core-side orchestrator for the satellite chain.
pub struct SatelliteNetworkManager {
    transport: Arc<Transport>,
    config: NetworkConfig,
    satellites: HashMap<String, Satellite>,
    telemetry: HashMap<String, Telemetry>,
    handlers: HandlerRegistry,
    handler_permits: Arc<Semaphore>,
    hook: Arc<dyn StatusHook>,
    status_slot: TaskSlot,
    span: Span,
}

impl SatelliteNetworkManager {
    pub fn builder(transport: Arc<Transport>) -> NetworkManagerBuilder {
        NetworkManagerBuilder::new(transport)
    }

    /// Restart ID assignment along the chain.
    ///
    /// Forgets every registered satellite, broadcasts the first assignment
    /// and waits for the chain to settle. Satellites re-register as their
    /// HELLO frames arrive through [`handle_message`](Self::handle_message).
    pub async fn discover_satellites(&mut self) -> Result<()> {
        self.span.in_scope(|| {
            info!(forgotten = self.satellites.len(), "scanning bus, assigning ids");
        });
        self.satellites.clear();

        let message = Message::new(destinations::ALL, commands::ID_ASSIGN, FIRST_ASSIGNMENT);
        self.transport.send(&message).await?;

        tokio::time::sleep(self.config.discovery_settle).await;
        Ok(())
    }

    /// Registry lookup; `None` just means "not discovered yet".
    pub fn get(&self, id: &str) -> Option<&Satellite> {
        self.satellites.get(id)
    }

    /// All registered satellites.
    pub fn satellites(&self) -> impl Iterator<Item = &Satellite> {
        self.satellites.values()
    }

    pub fn active_count(&self) -> usize {
        self.satellites.values().filter(|sat| sat.is_active()).count()
    }

    /// Latest POWER readings from `id`.
    pub fn telemetry(&self, id: &str) -> Option<&Telemetry> {
        self.telemetry.get(id)
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Broadcast a command to every satellite.
    pub async fn send_all(&self, command: &str, payload: impl Into<Payload>) -> Result<()> {
        self.transport
            .send(&Message::new(destinations::ALL, command, payload))
            .await
    }

    /// Send a command to one satellite.
    pub async fn send_to(
        &self,
        id: &str,
        command: &str,
        payload: impl Into<Payload>,
    ) -> Result<()> {
        self.transport.send(&Message::new(id, command, payload)).await
    }

    /// Apply one inbound message.
    ///
    /// Never fails: anything that cannot be acted on is logged and dropped.
    pub fn handle_message(&mut self, message: Message) {
        let span = self.span.clone();
        let _enter = span.enter();
        let sid = message.destination().to_string();
        let now = Instant::now();

        if let Some(sat) = self.satellites.get_mut(&sid) {
            if sat.touch(now) {
                info!(sat = %sid, "link restored");
                self.raise(NetworkEvent::LinkRestored { id: sid.clone() });
            }
        }

        match message.command() {
            commands::STATUS => match self.satellites.get_mut(&sid) {
                Some(sat) => sat.update_status(message.payload().values()),
                None => {
                    warn!(sat = %sid, "STATUS from unregistered satellite");
                    self.raise(NetworkEvent::UnknownSatellite {
                        id: sid,
                        command: commands::STATUS.to_string(),
                    });
                }
            },
            commands::POWER => {
                let telemetry = Telemetry::from_values(&message.payload().values());
                debug!(sat = %sid, ?telemetry, "power telemetry");
                self.telemetry.insert(sid, telemetry);
            }
            commands::ERROR => {
                let detail = message.payload().to_string();
                warn!(sat = %sid, %detail, "satellite error");
                self.raise(NetworkEvent::SatelliteError { id: sid, detail });
            }
            commands::HELLO => {
                if !self.satellites.contains_key(&sid) {
                    let kind = message.payload().to_string();
                    info!(sat = %sid, %kind, "satellite registered");
                    self.satellites
                        .insert(sid.clone(), Satellite::new(sid.clone(), kind.clone(), now));
                    self.raise(NetworkEvent::SatelliteConnected { id: sid, kind });
                }
            }
            commands::NEW_SAT => {
                let kind = message.payload().to_string();
                info!(%kind, "new satellite on chain");
                let assignment = Message::new(
                    destinations::ALL,
                    commands::ID_ASSIGN,
                    format!("{}00", kind),
                );
                if let Err(e) = self.transport.try_send(&assignment) {
                    warn!("could not queue ID assignment: {}", e);
                }
                self.raise(NetworkEvent::NewSatellite { kind });
            }
            commands::PING => debug!(sat = %sid, "heartbeat"),
            commands::LOG => info!(sat = %sid, "{}", message.payload()),
            command => {
                let command = command.to_string();
                self.dispatch(sid, command, message);
            }
        }
    }

    /// Hand a message to its application handler, if any.
    fn dispatch(&mut self, sid: String, command: String, message: Message) {
        let Some(handler) = self.handlers.get(&command) else {
            debug!(sat = %sid, %command, "no handler, dropping");
            self.raise(NetworkEvent::UnknownCommand { id: sid, command });
            return;
        };

        let permit = match self.handler_permits.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                warn!(sat = %sid, %command, "handler capacity reached, dropping message");
                return;
            }
        };

        let transport = self.transport.clone();
        tokio::spawn(
            async move {
                // Permit is held until this task completes
                let _permit = permit;
                if let Err(e) = handler.call(message, transport).await {
                    error!(%command, "handler error: {}", e);
                }
            }
            .instrument(self.span.clone()),
        );
    }

    /// Mark satellites silent for longer than the liveness timeout inactive.
    pub fn check_liveness(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();
        let now = Instant::now();
        let timeout = self.config.liveness_timeout;

        let expired: Vec<String> = self
            .satellites
            .values_mut()
            .filter_map(|sat| sat.expire(now, timeout).then(|| sat.id().to_string()))
            .collect();

        for id in expired {
            warn!(sat = %id, "link lost");
            self.raise(NetworkEvent::LinkLost { id });
        }
    }

    /// Drain every decoded message, then check liveness.
    pub fn poll(&mut self) {
        while let Some(message) = self.transport.receive_nowait() {
            self.handle_message(message);
        }
        self.check_liveness();
    }

    /// Run [`poll`](Self::poll) every monitor interval, forever.
    pub async fn monitor_satellites(&mut self) {
        loop {
            self.poll();
            tokio::time::sleep(self.config.monitor_interval).await;
        }
    }

    /// Start the hook for `event` unless a previous one is still running.
    fn raise(&mut self, event: NetworkEvent) {
        let hook = self.hook.clone();
        let span = self.span.clone();
        if !self
            .status_slot
            .spawn(move || hook.on_event(event).instrument(span))
        {
            debug!("status refresh still running, skipped");
        }
    }
}
