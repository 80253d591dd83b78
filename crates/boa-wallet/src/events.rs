//! Per-instance event dispatch.
//!
//! Each builder and account container owns its own [`EventDispatcher`].
//! Handlers are registered for one [`Event`] and run synchronously, in
//! subscription order, before the mutating call returns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of state change observers can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    ChangeSender,
    ChangeReceiver,
    ChangeTxFee,
    ChangePayloadFee,
    ChangeBalance,
    Error,
    Added,
    Removed,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::ChangeSender => "change_sender",
            Event::ChangeReceiver => "change_receiver",
            Event::ChangeTxFee => "change_tx_fee",
            Event::ChangePayloadFee => "change_payload_fee",
            Event::ChangeBalance => "change_balance",
            Event::Error => "error",
            Event::Added => "added",
            Event::Removed => "removed",
        };
        f.write_str(name)
    }
}

/// Handle returned by [`EventDispatcher::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<P> = Box<dyn FnMut(Event, &P) + Send>;

struct Subscription<P> {
    id: SubscriptionId,
    event: Event,
    handler: Handler<P>,
}

/// Synchronous dispatcher delivering `&P` payloads to subscribed handlers.
pub struct EventDispatcher<P> {
    next_id: u64,
    subscriptions: Vec<Subscription<P>>,
}

impl<P> EventDispatcher<P> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscriptions: Vec::new(),
        }
    }

    /// Register `handler` for `event`.
    pub fn subscribe<F>(&mut self, event: Event, handler: F) -> SubscriptionId
    where
        F: FnMut(Event, &P) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            event,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver `event` to every handler subscribed to it.
    pub fn publish(&mut self, event: Event, payload: &P) {
        for sub in self.subscriptions.iter_mut().filter(|s| s.event == event) {
            (sub.handler)(event, payload);
        }
    }

    /// Whether any handler listens for `event`.
    pub fn has_subscribers(&self, event: Event) -> bool {
        self.subscriptions.iter().any(|s| s.event == event)
    }
}

impl<P> Default for EventDispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventDispatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
