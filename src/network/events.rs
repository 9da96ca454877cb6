//! Network events and the hook that reacts to them.
//!
//! The manager raises a [`NetworkEvent`] wherever a status display or audio
//! cue would refresh. What actually happens is up to the injected
//! [`StatusHook`]; the default only logs.

use std::fmt;
use std::future::Future;

use tracing::info;

use super::handlers::BoxFuture;

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A satellite announced itself with HELLO and was registered.
    SatelliteConnected { id: String, kind: String },
    /// A node reported a new satellite of `kind` on the chain.
    NewSatellite { kind: String },
    /// No valid frame within the liveness timeout.
    LinkLost { id: String },
    /// An inactive satellite sent a valid frame again.
    LinkRestored { id: String },
    /// A satellite reported an error.
    SatelliteError { id: String, detail: String },
    /// A frame arrived from an id that is not registered.
    UnknownSatellite { id: String, command: String },
    /// No handler claims this command.
    UnknownCommand { id: String, command: String },
}

impl fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkEvent::SatelliteConnected { id, kind } => {
                write!(f, "NEW SAT: {} ({})", id, kind)
            }
            NetworkEvent::NewSatellite { kind } => write!(f, "SAT CONNECTED: TYPE {} FOUND", kind),
            NetworkEvent::LinkLost { id } => write!(f, "LINK LOST: ID {}", id),
            NetworkEvent::LinkRestored { id } => write!(f, "LINK RESTORED: ID {}", id),
            NetworkEvent::SatelliteError { id, detail } => {
                write!(f, "SAT ERROR: ID {} ERR {}", id, detail)
            }
            NetworkEvent::UnknownSatellite { id, command } => {
                write!(f, "UNKNOWN SAT: {} sent {}", id, command)
            }
            NetworkEvent::UnknownCommand { id, command } => {
                write!(f, "UNKNOWN COMMAND: {} sent {}", id, command)
            }
        }
    }
}

/// Reacts to network events (status display, audio cue, ...).
pub trait StatusHook: Send + Sync + 'static {
    fn on_event(&self, event: NetworkEvent) -> BoxFuture<'static, ()>;
}

impl<F, Fut> StatusHook for F
where
    F: Fn(NetworkEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn on_event(&self, event: NetworkEvent) -> BoxFuture<'static, ()> {
        Box::pin(self(event))
    }
}

/// Default hook: log the event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHook;

impl StatusHook for LogHook {
    fn on_event(&self, event: NetworkEvent) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            info!(%event, "status");
        })
    }
}
