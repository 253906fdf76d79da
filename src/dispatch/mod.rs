//! Priority-ordered, condition-gated handler dispatch.
//!
//! Grounded on the registration/dispatch engine described in §4.4 of the
//! protocol this crate implements, redesigned per its own guidance (§9):
//! decorators become an explicit [`DispatcherBuilder`] that freezes its
//! registry/handler/children tables at [`configure`](Dispatcher::configure),
//! and the `ALL_PAYLOADS` sentinel becomes a distinct [`RegistrarTarget`]
//! variant instead of an identity-compared marker object.

use crate::config::SessionConfig;
use crate::error::ProtocolError;
use crate::packet::Packet;
use std::collections::{BinaryHeap, HashMap};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Handler execution order; `Urgent` runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Daemon,
    Normal,
    Important,
    Urgent,
}

/// A value handlers may pass forward via `takes_previous_value`.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerValue {
    None,
    Text(String),
    Outbound(Packet),
}

/// A predicate gating registration or handler execution.
///
/// `Has` conditions inspect packet fields and are only meaningful inside
/// handler gates; the specification forbids them on registry entries
/// (registration happens before a packet exists to inspect).
pub enum Condition<S> {
    Configured(fn(&SessionConfig) -> bool),
    Has(fn(&Packet) -> bool),
    And(Box<Condition<S>>, Box<Condition<S>>),
    Or(Box<Condition<S>>, Box<Condition<S>>),
    #[doc(hidden)]
    _Marker(PhantomData<S>, std::convert::Infallible),
}

impl<S> Condition<S> {
    pub fn configured(predicate: fn(&SessionConfig) -> bool) -> Self {
        Condition::Configured(predicate)
    }

    pub fn has(predicate: fn(&Packet) -> bool) -> Self {
        Condition::Has(predicate)
    }

    pub fn and(self, other: Condition<S>) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition<S>) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    fn evaluate(&self, config: &SessionConfig, packet: Option<&Packet>) -> bool {
        match self {
            Condition::Configured(predicate) => predicate(config),
            Condition::Has(predicate) => packet.map(|p| predicate(p)).unwrap_or(false),
            Condition::And(left, right) => left.evaluate(config, packet) && right.evaluate(config, packet),
            Condition::Or(left, right) => left.evaluate(config, packet) || right.evaluate(config, packet),
            Condition::_Marker(_, never) => match *never {},
        }
    }
}

/// Which packet tags a handler applies to: a specific tag, or every
/// currently registered tag (the `ALL_PAYLOADS` sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrarTarget {
    Tag(u8),
    AllPayloads,
}

pub type HandlerFn<S> = Box<dyn Fn(&mut S, &Packet, Option<&HandlerValue>) -> Result<HandlerValue, ProtocolError> + Send + Sync>;

/// One registered handler: its gate, ordering, and callback.
pub struct Handler<S> {
    priority: Priority,
    gate: Option<Condition<S>>,
    takes_previous_value: bool,
    response_hint: Option<u8>,
    func: HandlerFn<S>,
    sequence: u64,
}

impl<S> Handler<S> {
    pub fn new(
        priority: Priority,
        gate: Option<Condition<S>>,
        takes_previous_value: bool,
        response_hint: Option<u8>,
        func: HandlerFn<S>,
    ) -> Self {
        Handler { priority, gate, takes_previous_value, response_hint, func, sequence: next_sequence() }
    }

    /// The response-class hint this handler declared, if any (§4.4,
    /// "optional response-class hint").
    pub fn response_hint(&self) -> Option<u8> {
        self.response_hint
    }
}

struct HeapEntry<'a, S> {
    priority: Priority,
    sequence: u64,
    handler: &'a Handler<S>,
}

impl<'a, S> PartialEq for HeapEntry<'a, S> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl<'a, S> Eq for HeapEntry<'a, S> {}

impl<'a, S> PartialOrd for HeapEntry<'a, S> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, S> Ord for HeapEntry<'a, S> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Higher priority pops first; among equal priorities, the earlier
        // registration (lower sequence number) pops first, since
        // `BinaryHeap` is a max-heap and is not otherwise stable.
        self.priority.cmp(&other.priority).then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Builds a [`Dispatcher`] by accumulating registry entries, handlers, and
/// children, consumed once by [`Dispatcher::configure`].
pub struct DispatcherBuilder<S> {
    registry: Vec<(u8, Option<Condition<S>>)>,
    handlers: Vec<(RegistrarTarget, Handler<S>)>,
    children: Vec<DispatcherBuilder<S>>,
}

impl<S> Default for DispatcherBuilder<S> {
    fn default() -> Self {
        DispatcherBuilder { registry: Vec::new(), handlers: Vec::new(), children: Vec::new() }
    }
}

impl<S> DispatcherBuilder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a packet tag, optionally gated on session configuration.
    pub fn handles(mut self, tag: u8, gate: Option<Condition<S>>) -> Self {
        self.registry.push((tag, gate));
        self
    }

    /// Register a tag for both directions by calling `handles` twice;
    /// the Rust analogue of the original's `bidirectional` helper, since
    /// this crate has no separate inbound/outbound registry split.
    pub fn bidirectional(self, tag: u8, gate: Option<Condition<S>>) -> Self {
        self.handles(tag, gate)
    }

    /// Attach a handler for a specific packet tag.
    pub fn on(self, tag: u8, handler: Handler<S>) -> Self {
        self.with_handler(RegistrarTarget::Tag(tag), handler)
    }

    /// Attach a handler that runs for every registered, enabled tag.
    pub fn on_all(self, handler: Handler<S>) -> Self {
        self.with_handler(RegistrarTarget::AllPayloads, handler)
    }

    fn with_handler(mut self, target: RegistrarTarget, handler: Handler<S>) -> Self {
        self.handlers.push((target, handler));
        self
    }

    /// Nest a child sub-protocol; inherits this dispatcher's registry at
    /// `configure()` time (§4.4 `extends`).
    pub fn child(mut self, child: DispatcherBuilder<S>) -> Self {
        self.children.push(child);
        self
    }

    /// Freeze this builder into a [`Dispatcher`], pruning gated-off
    /// registrations/handlers under `config` and recursively configuring
    /// every child. One-shot: the builder's tables are consumed.
    pub fn configure(self, config: &SessionConfig) -> Dispatcher<S> {
        let mut registered = HashMap::new();
        for (tag, gate) in &self.registry {
            let enabled = gate.as_ref().map(|g| g.evaluate(config, None)).unwrap_or(true);
            if enabled {
                registered.insert(*tag, ());
            }
        }

        let mut handlers_by_target: HashMap<RegistrarTarget, Vec<Handler<S>>> = HashMap::new();
        for (target, handler) in self.handlers {
            let enabled = handler.gate.as_ref().map(|g| g.evaluate(config, None)).unwrap_or(true);
            if enabled {
                handlers_by_target.entry(target).or_insert_with(Vec::new).push(handler);
            }
        }

        let children = self.children.into_iter().map(|child| child.configure(config)).collect();

        Dispatcher { registered, handlers_by_target, children }
    }
}

/// A frozen dispatcher: gated-off registrations/handlers have been pruned
/// and every child has been configured; [`handle`](Dispatcher::handle) runs
/// the surviving handlers for an incoming packet.
pub struct Dispatcher<S> {
    registered: HashMap<u8, ()>,
    handlers_by_target: HashMap<RegistrarTarget, Vec<Handler<S>>>,
    children: Vec<Dispatcher<S>>,
}

impl<S> Dispatcher<S> {
    /// Whether `tag` survived `configure()` (registered and enabled).
    pub fn is_registered(&self, tag: u8) -> bool {
        self.registered.contains_key(&tag)
    }

    /// Run every applicable handler, in priority/FIFO order, for `packet`,
    /// then recurse into every child's dispatch. Unregistered tags are
    /// silently dropped (§4.4's "exactly one decode path... or none").
    pub fn handle(&self, ctx: &mut S, packet: &Packet) -> Vec<HandlerValue> {
        let tag = packet.tag();
        if !self.is_registered(tag) {
            self.handle_children(ctx, packet);
            return Vec::new();
        }

        let mut heap: BinaryHeap<HeapEntry<'_, S>> = BinaryHeap::new();
        if let Some(handlers) = self.handlers_by_target.get(&RegistrarTarget::Tag(tag)) {
            for handler in handlers {
                heap.push(HeapEntry { priority: handler.priority, sequence: handler.sequence, handler });
            }
        }
        if let Some(handlers) = self.handlers_by_target.get(&RegistrarTarget::AllPayloads) {
            for handler in handlers {
                heap.push(HeapEntry { priority: handler.priority, sequence: handler.sequence, handler });
            }
        }

        // `previous_value` is the return value of the immediately *higher*
        // priority tier, not the immediately preceding handler: handlers
        // within the same tier never see each other's results, only what
        // the tier above last produced (§3, §8 scenario 7).
        let mut results = Vec::new();
        let mut previous_tier_value = HandlerValue::None;
        let mut current_tier: Option<Priority> = None;
        let mut tier_latest_value = HandlerValue::None;
        while let Some(entry) = heap.pop() {
            let handler = entry.handler;
            if current_tier != Some(handler.priority) {
                if current_tier.is_some() {
                    previous_tier_value = tier_latest_value.clone();
                }
                current_tier = Some(handler.priority);
                tier_latest_value = HandlerValue::None;
            }

            let argument = if handler.takes_previous_value { Some(&previous_tier_value) } else { None };
            match (handler.func)(ctx, packet, argument) {
                Ok(value) => {
                    tier_latest_value = value.clone();
                    results.push(value);
                }
                Err(error) => {
                    warn!(event = packet.event(), %error, "handler returned an error, continuing with previous value");
                }
            }
        }

        self.handle_children(ctx, packet);
        results
    }

    fn handle_children(&self, ctx: &mut S, packet: &Packet) {
        for child in &self.children {
            child.handle(ctx, packet);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Session {
        log: Vec<String>,
    }

    fn make_handler(priority: Priority, label: &'static str, takes_previous_value: bool) -> Handler<Session> {
        Handler::new(
            priority,
            None,
            takes_previous_value,
            None,
            Box::new(move |ctx: &mut Session, _packet, previous| {
                if let Some(HandlerValue::Text(text)) = previous {
                    ctx.log.push(format!("{label} saw {text}"));
                } else {
                    ctx.log.push(label.to_string());
                }
                Ok(HandlerValue::Text(label.to_string()))
            }),
        )
    }

    #[test]
    fn priority_orders_urgent_above_daemon() {
        assert!(Priority::Urgent > Priority::Daemon);
        assert!(Priority::Important > Priority::Normal);
    }

    #[test]
    fn handlers_run_in_priority_order_with_fifo_ties() {
        let tag = 0x1Bu8; // ChatMessage
        let builder = DispatcherBuilder::<Session>::new()
            .handles(tag, None)
            .on(tag, make_handler(Priority::Urgent, "urgent", false))
            .on(tag, make_handler(Priority::Normal, "normal", false))
            .on(tag, make_handler(Priority::Daemon, "daemon", false))
            .on(tag, make_handler(Priority::Daemon, "daemon-chained", true));
        let dispatcher = builder.configure(&SessionConfig::default());

        let mut session = Session { log: Vec::new() };
        let packet = Packet::ChatMessage(crate::packet::ChatMessage::new(1, crate::packet::ChatType::Normal, "hi".to_string()));
        dispatcher.handle(&mut session, &packet);

        assert_eq!(session.log[0], "urgent");
        assert_eq!(session.log[1], "normal");
        assert_eq!(session.log[2], "daemon");
        assert_eq!(session.log[3], "daemon-chained saw normal");
    }

    #[test]
    fn unregistered_tag_runs_no_handlers() {
        let builder = DispatcherBuilder::<Session>::new().on(0x1B, make_handler(Priority::Normal, "normal", false));
        let dispatcher = builder.configure(&SessionConfig::default());
        let mut session = Session { log: Vec::new() };
        let packet = Packet::ChatMessage(crate::packet::ChatMessage::new(1, crate::packet::ChatType::Normal, "hi".to_string()));
        dispatcher.handle(&mut session, &packet);
        assert!(session.log.is_empty());
    }
}
