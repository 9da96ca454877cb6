//! Network module - satellite discovery, liveness and dispatch at the core.
//!
//! Provides:
//! - [`SatelliteNetworkManager`] - registry, telemetry and message dispatch
//! - [`HandlerRegistry`] - application handlers for commands the manager does not own
//! - [`StatusHook`] / [`NetworkEvent`] - what to do when something changes
//! - [`TaskSlot`] - single-slot throttle for status refreshes

mod events;
mod handlers;
mod manager;
mod satellite;
mod throttle;

pub use events::{LogHook, NetworkEvent, StatusHook};
pub use handlers::{BoxFuture, FnHandler, Handler, HandlerRegistry, HandlerResult};
pub use manager::{NetworkManagerBuilder, SatelliteNetworkManager};
pub use satellite::{Satellite, Telemetry};
pub use throttle::TaskSlot;
