//! Event Dispatch Bus
//!
//! Engine-wide notifications with deferred fan-out. Anything may fire an
//! event at any time; nothing is delivered until the engine drains the bus,
//! once per tick. Draining is depth-first and most-recent-first: the pending
//! collection is a stack, and events fired by a listener mid-drain are
//! delivered before older pending events, all within the same `process`
//! call.
//!
//! Listeners are plain callbacks registered for every event. Mid-drain
//! mutation (firing, attaching, detaching) goes through the [`EventCtx`]
//! handed to each callback; requests are applied between events, so the
//! listener set seen by one event's notification pass is always a stable
//! snapshot.

use std::fmt;
use std::mem;

/// Where an event originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// Core engine systems
    Engine,
    /// The developer console
    Console,
    /// Script-callable bindings
    Script,
    /// A specific entity, by runtime id
    Entity(u64),
}

/// Typed event payload
///
/// Tagged variants instead of an opaque box; consumers match on the kind
/// they expect and ignore the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    None,
    Int(i64),
    Float(f64),
    Text(String),
    Flag(bool),
}

impl EventPayload {
    /// Kind discriminant label, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::None => "none",
            EventPayload::Int(_) => "int",
            EventPayload::Float(_) => "float",
            EventPayload::Text(_) => "text",
            EventPayload::Flag(_) => "flag",
        }
    }
}

/// An immutable notification record
///
/// Identity is by value. Each event is consumed exactly once by the drain
/// loop and then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub source: EventSource,
    pub data: EventPayload,
}

impl Event {
    pub fn new(id: impl Into<String>, source: EventSource, data: EventPayload) -> Self {
        Self {
            id: id.into(),
            source,
            data,
        }
    }

    /// Payload-less event
    pub fn signal(id: impl Into<String>, source: EventSource) -> Self {
        Self::new(id, source, EventPayload::None)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {})", self.id, self.source, self.data.kind())
    }
}

/// Opaque handle identifying an attached listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener callback: receives the event plus a context for mid-drain
/// bus mutation
pub type ListenerFn = Box<dyn FnMut(&Event, &mut EventCtx)>;

/// Mutation requests collected during one event's notification pass
///
/// Applied after the pass: fired events land on the pending stack (and are
/// therefore drained next), attach/detach take effect starting with the next
/// event. Detaching mid-pass never affects delivery of the current event to
/// the other listeners in the pass.
pub struct EventCtx {
    fired: Vec<Event>,
    attached: Vec<(ListenerId, ListenerFn)>,
    detached: Vec<ListenerId>,
    next_id: u64,
}

impl EventCtx {
    fn new(next_id: u64) -> Self {
        Self {
            fired: Vec::new(),
            attached: Vec::new(),
            detached: Vec::new(),
            next_id,
        }
    }

    /// Queue an event; it will be drained before any older pending event
    pub fn fire(&mut self, event: Event) {
        self.fired.push(event);
    }

    /// Attach a listener, effective from the next event
    pub fn attach(&mut self, callback: impl FnMut(&Event, &mut EventCtx) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.attached.push((id, Box::new(callback)));
        id
    }

    /// Detach a listener, effective from the next event
    pub fn detach(&mut self, id: ListenerId) {
        self.detached.push(id);
    }
}

/// The engine event bus
///
/// Single-threaded and synchronous: `fire` only queues, `process` drains.
/// The bus never errors; the one hazard is non-termination, which is the
/// listeners' contract to uphold (a listener that unconditionally fires a
/// new event on every notification makes `process` diverge — the bus does
/// not bound the drain).
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, ListenerFn)>,
    pending: Vec<Event>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
        }
    }

    /// Attach a listener; the returned handle detaches it later
    pub fn attach(&mut self, callback: impl FnMut(&Event, &mut EventCtx) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Detach a listener by handle
    ///
    /// Returns false if the handle was already detached.
    pub fn detach(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Queue an event for the next drain; never dispatches synchronously
    pub fn fire(&mut self, event: Event) {
        self.pending.push(event);
    }

    /// Number of events waiting for the next drain
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drain the pending stack, notifying every listener of every event
    ///
    /// Pops the most-recently-pushed event, notifies the current listener
    /// snapshot, applies mutation requests, repeats until nothing is
    /// pending. Events fired mid-drain are delivered before older pending
    /// events and before this call returns; the pending collection is empty
    /// when it does.
    pub fn process(&mut self) {
        while let Some(event) = self.pending.pop() {
            let mut ctx = EventCtx::new(self.next_id);

            // The listener set is moved out for the pass, so callbacks can
            // never observe or corrupt mid-iteration mutation.
            let mut listeners = mem::take(&mut self.listeners);
            for (_, callback) in listeners.iter_mut() {
                callback(&event, &mut ctx);
            }
            self.listeners = listeners;

            self.next_id = ctx.next_id;
            for id in ctx.detached {
                self.detach(id);
            }
            self.listeners.extend(ctx.attached);
            // Fired events go on top of the stack: drained next
            self.pending.extend(ctx.fired);
        }
    }
}
