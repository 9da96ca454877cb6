//! Application handler registry for commands the manager does not own.
//!
//! Display, LED, audio and game modes sit outside the network manager. They
//! claim commands by registering a handler, which receives the message and
//! the transport to reply through.
//!
//! # Example
//!
//! ```
//! use satlink::network::HandlerRegistry;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("DSP", |msg, _transport| async move {
//!     println!("display text: {}", msg.payload());
//!     Ok(())
//! });
//!
//! assert!(registry.contains("DSP"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::message::Message;
use crate::transport::Transport;

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    fn call(
        &self,
        message: Message,
        transport: Arc<Transport>,
    ) -> BoxFuture<'static, HandlerResult>;
}

/// Adapts an async closure to [`Handler`].
pub struct FnHandler<F, Fut>
where
    F: Fn(Message, Arc<Transport>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnHandler<F, Fut>
where
    F: Fn(Message, Arc<Transport>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Handler for FnHandler<F, Fut>
where
    F: Fn(Message, Arc<Transport>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(
        &self,
        message: Message,
        transport: Arc<Transport>,
    ) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self.handler)(message, transport))
    }
}

/// Registry mapping command mnemonics to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `command`, replacing any previous one.
    pub fn register<F, Fut>(&mut self, command: &str, handler: F)
    where
        F: Fn(Message, Arc<Transport>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers
            .insert(command.to_string(), Arc::new(FnHandler::new(handler)));
    }

    /// Get the handler for a command.
    pub fn get(&self, command: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(command).cloned()
    }

    /// Check if a handler is registered for `command`.
    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = HandlerRegistry::new();
        registry.register("LED", |_msg, _transport| async { Ok(()) });
        registry.register("DSP", |_msg, _transport| async { Ok(()) });

        assert_eq!(registry.len(), 2);
        assert!(registry.get("LED").is_some());
        assert!(registry.get("SETENC").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register("LED", |_msg, _transport| async { Ok(()) });
        registry.register("LED", |_msg, _transport| async { Ok(()) });

        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
