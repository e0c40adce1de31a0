//! Event identification and rule triggers.
//!
//! Events are ordinary `'static` Rust types; their [`TypeId`] is the stable
//! tag the dispatcher matches on. A rule's [`Trigger`] records which events
//! (or pseudo-events) it reacts to.

use std::any::{type_name, TypeId};

/// Stable identity of an event type: its [`TypeId`] plus a readable name
/// for diagnostics and history records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventToken {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl EventToken {
    /// Token for the event type `E`.
    pub fn of<E: 'static>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
        }
    }

    /// Readable name of the event type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// What causes a rule to fire.
///
/// `Entry`/`Exit` rules are internal handlers: they never move the machine
/// and are invoked only while crossing a state boundary. `Anonymous` rules
/// fire as soon as their source becomes current and their guard passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// An explicit event type.
    On(EventToken),
    /// Any event type (lower precedence than an explicit match).
    AnyEvent,
    /// Entry handler for a specific event type.
    Entry(EventToken),
    /// Entry handler for any event, including the construction pseudo-event.
    EntryAny,
    /// Exit handler for a specific event type.
    Exit(EventToken),
    /// Exit handler for any event.
    ExitAny,
    /// Completion transition with no triggering event.
    Anonymous,
}

impl Trigger {
    /// True for `Entry`/`EntryAny`/`Exit`/`ExitAny`.
    pub fn is_handler(&self) -> bool {
        matches!(
            self,
            Trigger::Entry(_) | Trigger::EntryAny | Trigger::Exit(_) | Trigger::ExitAny
        )
    }
}

/// The event identity a dispatch pass matches triggers against.
///
/// `None` is the synthetic "no event" used for construction and anonymous
/// cascades; it matches only wildcard entry/exit handlers and anonymous
/// rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKey {
    Ty(TypeId),
    None,
}
