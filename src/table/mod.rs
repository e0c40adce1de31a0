//! The declarative transition table.
//!
//! A [`TransitionTable`] is the immutable description of one machine level:
//! an ordered list of [`Rule`]s, the initial state, and the sub-machine
//! tables registered for composite states. Tables are validated once at
//! build time and shared cheaply afterwards (callbacks live behind `Rc`).

mod builder;
mod macros;

pub use builder::{rule, RuleBuilder, TableBuilder};

use crate::core::{EventKey, StateKind, StateTag, Trigger, X};
use crate::inject::{Action, ContextBag, EventSpec, Guard, InjectError};
use std::collections::HashMap;
use thiserror::Error;

/// Errors detected while building a table.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no rule is marked initial; mark exactly one rule with .initial()")]
    MissingInitial,

    #[error("rules on '{first}' and '{second}' are both marked initial")]
    MultipleInitial { first: StateTag, second: StateTag },

    #[error("rule on '{from_state}' targets unknown state '{target}'")]
    UnknownTarget { from_state: StateTag, target: StateTag },

    #[error("entry/exit handler on '{state}' cannot have a target")]
    HandlerWithTarget { state: StateTag },

    #[error("entry/exit handler on '{state}' needs an action")]
    HandlerWithoutAction { state: StateTag },

    #[error("anonymous rule on '{state}' needs a target")]
    AnonymousWithoutTarget { state: StateTag },

    #[error("sub-machine '{tag}' is registered twice")]
    DuplicateSubmachine { tag: StateTag },

    #[error("'{0}' is reserved for the terminal pseudo-state")]
    ReservedTag(StateTag),

    #[error("table has no rules")]
    Empty,
}

/// One row of a transition table.
#[derive(Clone, Debug)]
pub struct Rule {
    pub(crate) source: StateTag,
    pub(crate) trigger: Trigger,
    pub(crate) guard: Option<Guard>,
    pub(crate) action: Option<Action>,
    pub(crate) target: Option<StateTag>,
    pub(crate) initial: bool,
}

impl Rule {
    /// What the rule's trigger promises about the event its callbacks see.
    pub(crate) fn event_spec(&self) -> EventSpec {
        match self.trigger {
            Trigger::On(token) | Trigger::Entry(token) | Trigger::Exit(token) => {
                EventSpec::Exactly(token)
            }
            Trigger::AnyEvent | Trigger::EntryAny | Trigger::ExitAny => EventSpec::Any,
            Trigger::Anonymous => EventSpec::None,
        }
    }
}

/// Immutable description of one machine level.
#[derive(Clone, Debug)]
pub struct TransitionTable {
    rules: Vec<Rule>,
    initial: StateTag,
    submachines: HashMap<StateTag, TransitionTable>,
}

impl TransitionTable {
    /// Start building a table.
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    pub(crate) fn from_parts(
        rules: Vec<Rule>,
        initial: StateTag,
        submachines: HashMap<StateTag, TransitionTable>,
    ) -> Self {
        Self {
            rules,
            initial,
            submachines,
        }
    }

    /// The state the machine starts in.
    pub fn initial(&self) -> StateTag {
        self.initial
    }

    /// Number of rules; also the anonymous-cascade bound for this level.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub(crate) fn rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    /// How `tag` behaves at this level.
    pub(crate) fn kind_of(&self, tag: StateTag) -> StateKind {
        if tag == X {
            StateKind::Terminal
        } else if self.submachines.contains_key(tag) {
            StateKind::Composite
        } else {
            StateKind::Simple
        }
    }

    pub(crate) fn submachine(&self, tag: StateTag) -> Option<&TransitionTable> {
        self.submachines.get(tag)
    }

    /// Indices of transition rules dispatchable from `source` for `key`, in
    /// precedence order: explicit event matches first (declaration order),
    /// then wildcard matches. For [`EventKey::None`] only anonymous rules
    /// qualify.
    pub(crate) fn candidates(&self, source: StateTag, key: EventKey) -> Vec<usize> {
        let mut explicit = Vec::new();
        let mut wildcard = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.source != source {
                continue;
            }
            match (key, rule.trigger) {
                (EventKey::Ty(id), Trigger::On(token)) if token.id == id => explicit.push(index),
                (EventKey::Ty(_), Trigger::AnyEvent) => wildcard.push(index),
                (EventKey::None, Trigger::Anonymous) => explicit.push(index),
                _ => {}
            }
        }
        explicit.extend(wildcard);
        explicit
    }

    /// Indices of entry (or exit) handler rules on `state` matching `key`,
    /// in precedence order: event-specific first, then wildcard. The
    /// synthetic no-event matches only wildcard handlers.
    pub(crate) fn handlers(&self, state: StateTag, entry: bool, key: EventKey) -> Vec<usize> {
        let mut specific = Vec::new();
        let mut wildcard = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.source != state {
                continue;
            }
            match (entry, rule.trigger) {
                (true, Trigger::Entry(token)) => {
                    if let EventKey::Ty(id) = key {
                        if token.id == id {
                            specific.push(index);
                        }
                    }
                }
                (true, Trigger::EntryAny) => wildcard.push(index),
                (false, Trigger::Exit(token)) => {
                    if let EventKey::Ty(id) = key {
                        if token.id == id {
                            specific.push(index);
                        }
                    }
                }
                (false, Trigger::ExitAny) => wildcard.push(index),
                _ => {}
            }
        }
        specific.extend(wildcard);
        specific
    }

    /// Verify every callback in the table (recursively through sub-machine
    /// tables) against a context bag.
    pub(crate) fn verify(&self, bag: &ContextBag) -> Result<(), InjectError> {
        for rule in &self.rules {
            let spec = rule.event_spec();
            if let Some(guard) = &rule.guard {
                (guard.verify)(bag, spec)?;
            }
            if let Some(action) = &rule.action {
                (action.verify)(bag, spec)?;
            }
        }
        for sub in self.submachines.values() {
            sub.verify(bag)?;
        }
        Ok(())
    }
}
