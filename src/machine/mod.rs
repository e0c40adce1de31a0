//! Machine instances.
//!
//! A [`Machine`] binds a [`TransitionTable`] to a [`ContextBag`] and tracks
//! the current state at its level, plus one owned instance per composite
//! state that has been entered. Construction verifies every callback in the
//! table against the bag, then enters the initial state (firing its entry
//! handlers) and runs the anonymous cascade to a stable configuration.

mod dispatch;

pub(crate) use dispatch::EventCtx;

use crate::core::{StateTag, TransitionHistory};
use crate::error::MachineError;
use crate::inject::ContextBag;
use crate::table::TransitionTable;
use std::collections::HashMap;

/// A running state machine.
///
/// # Example
///
/// ```rust
/// use tabula::{rule, ContextBag, Machine, TransitionTable};
///
/// struct Go;
///
/// let table = TransitionTable::builder()
///     .rule(rule("idle").initial().on::<Go>().to("running"))
///     .rule(rule("running").on::<Go>().to("idle"))
///     .build()
///     .unwrap();
///
/// let mut machine = Machine::new(table, ContextBag::new()).unwrap();
/// assert!(machine.is("idle"));
/// machine.process_event(Go).unwrap();
/// assert!(machine.is("running"));
/// ```
#[derive(Debug)]
pub struct Machine {
    pub(crate) table: TransitionTable,
    pub(crate) context: ContextBag,
    pub(crate) current: StateTag,
    pub(crate) subs: HashMap<StateTag, Machine>,
    pub(crate) history: TransitionHistory,
    dispatching: bool,
}

impl Machine {
    /// Construct a machine and enter its initial state.
    ///
    /// Every guard and action in the table (including sub-machine tables)
    /// is verified against `context` first; a callback whose parameters
    /// cannot be resolved fails construction with
    /// [`MachineError::Injection`]. The initial state's entry handlers and
    /// any anonymous transitions from it run before this returns.
    pub fn new(table: TransitionTable, context: ContextBag) -> Result<Self, MachineError> {
        table.verify(&context)?;
        let mut machine = Self::instance(table, context);
        let ev = EventCtx::none();
        machine.initialize(&ev)?;
        Ok(machine)
    }

    pub(crate) fn instance(table: TransitionTable, context: ContextBag) -> Self {
        let current = table.initial();
        Self {
            table,
            context,
            current,
            subs: HashMap::new(),
            history: TransitionHistory::new(),
            dispatching: false,
        }
    }

    /// Deliver one event.
    ///
    /// Runs to completion: rule selection, exit handlers, the action, entry
    /// handlers, child-level dispatch, and any cascaded anonymous
    /// transitions all finish before this returns. An event no rule matches
    /// is dropped silently.
    pub fn process_event<E: 'static>(&mut self, event: E) -> Result<(), MachineError> {
        if self.dispatching {
            return Err(MachineError::Reentrancy);
        }
        self.dispatching = true;
        let ev = EventCtx::of(event);
        let result = self.dispatch(&ev);
        self.dispatching = false;
        result.map(drop)
    }

    /// True iff the current state at this level is `tag`.
    ///
    /// Composite states compare by their own tag; use [`is_in`](Self::is_in)
    /// to look inside them.
    pub fn is(&self, tag: StateTag) -> bool {
        self.current == tag
    }

    /// The current state at this level.
    pub fn current_state(&self) -> StateTag {
        self.current
    }

    /// True iff the sub-machine registered under `sub_tag` (searched
    /// recursively) is currently in `tag`.
    ///
    /// A sub-machine keeps its final configuration after its composite is
    /// exited, so completion remains observable here.
    pub fn is_in(&self, sub_tag: StateTag, tag: StateTag) -> bool {
        self.find_sub(sub_tag).is_some_and(|sub| sub.current == tag)
    }

    fn find_sub(&self, tag: StateTag) -> Option<&Machine> {
        if let Some(sub) = self.subs.get(tag) {
            return Some(sub);
        }
        self.subs.values().find_map(|sub| sub.find_sub(tag))
    }

    /// The context bag shared with every callback.
    pub fn context(&self) -> &ContextBag {
        &self.context
    }

    /// Completed transitions at this level, oldest first.
    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::X;
    use crate::inject::Inj;
    use crate::table::rule;

    struct E1;
    struct E2;

    fn chain() -> TransitionTable {
        TransitionTable::builder()
            .rule(rule("idle").initial().on::<E1>().to("s1"))
            .rule(rule("s1").on::<E2>().to("s2"))
            .rule(rule("s2").on::<E1>().to("idle"))
            .build()
            .unwrap()
    }

    #[test]
    fn construction_enters_the_initial_state() {
        let machine = Machine::new(chain(), ContextBag::new()).unwrap();
        assert!(machine.is("idle"));
        assert_eq!(machine.current_state(), "idle");
    }

    #[test]
    fn unmatched_events_are_dropped_silently() {
        let mut machine = Machine::new(chain(), ContextBag::new()).unwrap();
        machine.process_event(E2).unwrap();
        assert!(machine.is("idle"));
    }

    #[test]
    fn construction_fails_when_injection_cannot_resolve() {
        let table = TransitionTable::builder()
            .rule(
                rule("idle")
                    .initial()
                    .on::<E1>()
                    .action(|count: Inj<i32>| count.set(1))
                    .to("idle"),
            )
            .build()
            .unwrap();

        let result = Machine::new(table, ContextBag::new());
        assert!(matches!(result, Err(MachineError::Injection(_))));
    }

    #[test]
    fn reentrant_dispatch_is_rejected() {
        let mut machine = Machine::new(chain(), ContextBag::new()).unwrap();
        machine.dispatching = true;

        assert!(matches!(
            machine.process_event(E1),
            Err(MachineError::Reentrancy)
        ));
        assert!(machine.is("idle"));

        machine.dispatching = false;
        machine.process_event(E1).unwrap();
        assert!(machine.is("s1"));
    }

    #[test]
    fn history_records_transitions_in_order() {
        let mut machine = Machine::new(chain(), ContextBag::new()).unwrap();
        machine.process_event(E1).unwrap();
        machine.process_event(E2).unwrap();

        assert_eq!(machine.history().path(), vec!["idle", "s1", "s2"]);
    }

    #[test]
    fn sub_machine_state_is_queryable_after_exit() {
        struct Done;

        let sub = TransitionTable::builder()
            .rule(rule("idle").initial().on::<Done>().to(X))
            .build()
            .unwrap();
        let table = TransitionTable::builder()
            .rule(rule("idle").initial().to("sub"))
            .rule(rule("sub").to("finished"))
            .rule(rule("finished").on::<E1>().action(|| {}))
            .submachine("sub", sub)
            .build()
            .unwrap();

        let mut machine = Machine::new(table, ContextBag::new()).unwrap();
        assert!(machine.is("sub"));
        assert!(machine.is_in("sub", "idle"));

        machine.process_event(Done).unwrap();
        assert!(machine.is("finished"));
        assert!(machine.is_in("sub", X));
    }
}
