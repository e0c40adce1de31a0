//! Fluent construction of rules and tables.
//!
//! A rule reads the way it dispatches:
//!
//! ```rust
//! use tabula::{rule, TransitionTable};
//!
//! struct Brew;
//! struct Serve;
//!
//! let table = TransitionTable::builder()
//!     .rule(rule("idle").initial().on::<Brew>().to("brewing"))
//!     .rule(rule("brewing").on::<Serve>().guard(|| true).to("idle"))
//!     .rule(rule("brewing").entry_any().action(|| {}))
//!     .build()
//!     .unwrap();
//! assert_eq!(table.initial(), "idle");
//! ```
//!
//! Omitting a trigger makes the rule anonymous (it fires as soon as its
//! source becomes current); omitting `.to` makes it internal (action only,
//! no state change).

use super::{BuildError, Rule, TransitionTable};
use crate::core::{EventToken, StateTag, Trigger, X};
use crate::inject::{Action, Guard, IntoAction, IntoGuard};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::collections::HashSet;

/// Start a rule with the given source state.
pub fn rule(source: StateTag) -> RuleBuilder {
    RuleBuilder {
        source,
        trigger: None,
        guard: None,
        action: None,
        target: None,
        initial: false,
    }
}

/// Builder for one transition rule.
#[derive(Clone, Debug)]
pub struct RuleBuilder {
    source: StateTag,
    trigger: Option<Trigger>,
    guard: Option<Guard>,
    action: Option<Action>,
    target: Option<StateTag>,
    initial: bool,
}

impl RuleBuilder {
    /// Mark this rule's source as the machine's initial state.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    /// Trigger on events of type `E`.
    pub fn on<E: 'static>(mut self) -> Self {
        self.trigger = Some(Trigger::On(EventToken::of::<E>()));
        self
    }

    /// Trigger on any event (lower precedence than an explicit match).
    pub fn on_any(mut self) -> Self {
        self.trigger = Some(Trigger::AnyEvent);
        self
    }

    /// Entry handler fired when the source is entered via an `E`.
    pub fn entry<E: 'static>(mut self) -> Self {
        self.trigger = Some(Trigger::Entry(EventToken::of::<E>()));
        self
    }

    /// Entry handler fired on any entry, including construction.
    pub fn entry_any(mut self) -> Self {
        self.trigger = Some(Trigger::EntryAny);
        self
    }

    /// Exit handler fired when the source is exited via an `E`.
    pub fn exit<E: 'static>(mut self) -> Self {
        self.trigger = Some(Trigger::Exit(EventToken::of::<E>()));
        self
    }

    /// Exit handler fired on any exit.
    pub fn exit_any(mut self) -> Self {
        self.trigger = Some(Trigger::ExitAny);
        self
    }

    /// Guard the rule with a predicate; parameters are injected.
    pub fn guard<F, Args>(mut self, predicate: F) -> Self
    where
        F: IntoGuard<Args>,
    {
        self.guard = Some(predicate.into_guard());
        self
    }

    /// Run a side effect when the rule fires; parameters are injected.
    pub fn action<F, Args>(mut self, action: F) -> Self
    where
        F: IntoAction<Args>,
    {
        self.action = Some(action.into_action());
        self
    }

    /// Set the destination state. A target equal to the source makes the
    /// rule a self-transition (exit and entry fire).
    pub fn to(mut self, target: StateTag) -> Self {
        self.target = Some(target);
        self
    }

    fn build(self) -> Result<Rule, BuildError> {
        let trigger = self.trigger.unwrap_or(Trigger::Anonymous);
        if trigger.is_handler() {
            if self.target.is_some() {
                return Err(BuildError::HandlerWithTarget { state: self.source });
            }
            if self.action.is_none() {
                return Err(BuildError::HandlerWithoutAction { state: self.source });
            }
        }
        if trigger == Trigger::Anonymous && self.target.is_none() {
            return Err(BuildError::AnonymousWithoutTarget { state: self.source });
        }
        Ok(Rule {
            source: self.source,
            trigger,
            guard: self.guard,
            action: self.action,
            target: self.target,
            initial: self.initial,
        })
    }
}

/// Builder for a [`TransitionTable`].
#[derive(Clone, Debug, Default)]
pub struct TableBuilder {
    rules: Vec<RuleBuilder>,
    submachines: Vec<(StateTag, TransitionTable)>,
}

impl TableBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Declaration order is significant: among rules of
    /// equal trigger specificity, the earlier rule wins.
    pub fn rule(mut self, rule: RuleBuilder) -> Self {
        self.rules.push(rule);
        self
    }

    /// Register `tag` as a composite state backed by `table`.
    pub fn submachine(mut self, tag: StateTag, table: TransitionTable) -> Self {
        self.submachines.push((tag, table));
        self
    }

    /// Validate and produce the table.
    pub fn build(self) -> Result<TransitionTable, BuildError> {
        if self.rules.is_empty() {
            return Err(BuildError::Empty);
        }

        let mut submachines = HashMap::new();
        for (tag, table) in self.submachines {
            if tag == X {
                return Err(BuildError::ReservedTag(tag));
            }
            match submachines.entry(tag) {
                Entry::Occupied(_) => return Err(BuildError::DuplicateSubmachine { tag }),
                Entry::Vacant(entry) => {
                    entry.insert(table);
                }
            }
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for builder in self.rules {
            rules.push(builder.build()?);
        }

        let mut initial = None;
        for rule in &rules {
            if rule.initial {
                match initial {
                    None => initial = Some(rule.source),
                    Some(first) => {
                        return Err(BuildError::MultipleInitial {
                            first,
                            second: rule.source,
                        })
                    }
                }
            }
        }
        let initial = initial.ok_or(BuildError::MissingInitial)?;

        let known: HashSet<StateTag> = rules
            .iter()
            .map(|rule| rule.source)
            .chain(submachines.keys().copied())
            .chain([X])
            .collect();
        for rule in &rules {
            if let Some(target) = rule.target {
                if !known.contains(target) {
                    return Err(BuildError::UnknownTarget {
                        from_state: rule.source,
                        target,
                    });
                }
            }
        }

        Ok(TransitionTable::from_parts(rules, initial, submachines))
    }
}
