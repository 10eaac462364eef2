//! Routes parsed messages to the handler registered for their kind.

use super::schemas::{Message, MessageKind};
use std::{collections::HashMap, fmt};
use tracing::debug;

/// Callback invoked with each message of the kind it was registered for
pub type Handler = Box<dyn Fn(Message) + Send + Sync>;

/// Immutable kind to handler table, built once at startup.
///
/// Kinds without a handler are skipped; that is not an error.
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<MessageKind, Handler>,
}

#[derive(Default)]
pub struct DispatchTableBuilder {
    handlers: HashMap<MessageKind, Handler>,
}

impl DispatchTableBuilder {
    /// Registers `handler` for `kind`, replacing any previous one
    pub fn on<F>(mut self, kind: MessageKind, handler: F) -> Self
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            handlers: self.handlers,
        }
    }
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::default()
    }

    pub fn handles(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Hands `message` to its handler.
    ///
    /// Returns `false` when no handler is registered for the message kind.
    pub fn dispatch(&self, message: Message) -> bool {
        let kind = message.kind();

        let Some(handler) = self.handlers.get(&kind) else {
            debug!("No handler registered for {} messages, skipping", kind.as_str());
            return false;
        };

        handler(message);
        true
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().map(MessageKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("DispatchTable")
            .field("kinds", &kinds)
            .finish()
    }
}
