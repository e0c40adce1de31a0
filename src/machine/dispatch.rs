//! Event dispatch, anonymous cascades, and the composite runtime.
//!
//! One primitive drives everything: a dispatch pass over the table for an
//! optional event. Real events arrive through `Machine::process_event`; the
//! synthetic no-event drives construction and anonymous cascades, matching
//! only anonymous rules and wildcard entry/exit handlers.

use super::Machine;
use crate::core::{EventKey, StateKind, StateTag, TransitionRecord, Trigger, X};
use crate::error::MachineError;
use crate::inject::{ContextBag, EventRef, Scope};
use chrono::Utc;
use std::any::{type_name, Any, TypeId};
use std::rc::Rc;
use tracing::{trace, warn};

/// A dispatch pass's view of the triggering event.
pub(crate) struct EventCtx {
    pub(crate) key: EventKey,
    value: Option<Rc<dyn Any>>,
    name: Option<&'static str>,
}

impl EventCtx {
    /// The synthetic no-event.
    pub(crate) fn none() -> Self {
        Self {
            key: EventKey::None,
            value: None,
            name: None,
        }
    }

    /// Wrap a real event.
    pub(crate) fn of<E: 'static>(event: E) -> Self {
        Self {
            key: EventKey::Ty(TypeId::of::<E>()),
            value: Some(Rc::new(event)),
            name: Some(type_name::<E>()),
        }
    }

    pub(crate) fn name(&self) -> Option<&'static str> {
        self.name
    }

    fn scope<'a>(&'a self, bag: &'a ContextBag) -> Scope<'a> {
        let event = match (self.key, &self.value) {
            (EventKey::Ty(id), Some(value)) => Some(EventRef {
                id,
                value,
                name: self.name.unwrap_or(""),
            }),
            _ => None,
        };
        Scope { bag, event }
    }
}

fn rank(trigger: Trigger) -> u8 {
    match trigger {
        Trigger::AnyEvent => 1,
        _ => 0,
    }
}

impl Machine {
    /// Enter the initial state: fire its entry handlers for `ev`, descend
    /// into it if it is composite, then cascade.
    pub(crate) fn initialize(&mut self, ev: &EventCtx) -> Result<(), MachineError> {
        self.current = self.table.initial();
        self.run_handler(self.current, true, ev)?;
        self.enter_substate(self.current, ev)?;
        self.run_cascade()
    }

    /// One dispatch pass at this level. Returns whether the event was
    /// consumed (any rule fired, including internal rules).
    pub(crate) fn dispatch(&mut self, ev: &EventCtx) -> Result<bool, MachineError> {
        // Composite states offer the event to the child first; consumption
        // there stops propagation unless the child just completed.
        if self.table.kind_of(self.current) == StateKind::Composite {
            if let Some(sub) = self.subs.get_mut(self.current) {
                let consumed = sub.dispatch(ev)?;
                let completed = sub.current == X;
                if consumed {
                    if completed {
                        self.run_cascade()?;
                    }
                    return Ok(true);
                }
            }
        }

        let Some(index) = self.select(self.current, ev)? else {
            return Ok(false);
        };
        let changed = self.fire_rule(index, ev)?;
        if changed {
            self.run_cascade()?;
        }
        Ok(true)
    }

    /// Pick the rule to fire from `source` for `ev`: explicit-event rules
    /// beat wildcard rules regardless of declaration order, declaration
    /// order breaks ties, and the first passing guard wins.
    fn select(&self, source: StateTag, ev: &EventCtx) -> Result<Option<usize>, MachineError> {
        let candidates = self.table.candidates(source, ev.key);
        let scope = ev.scope(&self.context);

        let mut chosen = None;
        for (position, &index) in candidates.iter().enumerate() {
            let rule = self.table.rule(index);
            let pass = match &rule.guard {
                Some(guard) => guard.check(&scope)?,
                None => true,
            };
            if pass {
                chosen = Some((position, index));
                break;
            }
        }
        let Some((position, index)) = chosen else {
            return Ok(None);
        };

        // Diagnostic only: a later guard-less rule of equal specificity can
        // never fire, which usually means a table mistake.
        let winner = rank(self.table.rule(index).trigger);
        for &other in &candidates[position + 1..] {
            let rule = self.table.rule(other);
            if rule.guard.is_none() && rank(rule.trigger) == winner {
                warn!(
                    state = source,
                    event = ev.name().unwrap_or("<none>"),
                    "ambiguous transition rules; earliest declaration wins"
                );
                break;
            }
        }

        Ok(Some(index))
    }

    /// Fire one selected rule. Returns whether the state changed.
    ///
    /// Internal rules (no target) run their action only. Everything else
    /// runs exit handlers, then the action, then the state change, then
    /// entry handlers, and descends into composite targets.
    fn fire_rule(&mut self, index: usize, ev: &EventCtx) -> Result<bool, MachineError> {
        let rule = self.table.rule(index).clone();

        let Some(target) = rule.target else {
            if let Some(action) = &rule.action {
                action.call(&ev.scope(&self.context))?;
            }
            return Ok(false);
        };

        self.exit_current(ev)?;
        if let Some(action) = &rule.action {
            action.call(&ev.scope(&self.context))?;
        }

        let from = self.current;
        self.current = target;
        self.history = self.history.record(TransitionRecord {
            from: from.to_string(),
            to: target.to_string(),
            trigger: ev.name().map(str::to_string),
            timestamp: Utc::now(),
        });
        trace!(
            from,
            to = target,
            event = ev.name().unwrap_or("<none>"),
            "transition"
        );

        self.run_handler(target, true, ev)?;
        self.enter_substate(target, ev)?;
        Ok(true)
    }

    /// Exit the current state: child levels first, innermost outward, then
    /// this level's exit handler. The triggering event propagates through
    /// every layer.
    fn exit_current(&self, ev: &EventCtx) -> Result<(), MachineError> {
        if self.table.kind_of(self.current) == StateKind::Composite {
            if let Some(sub) = self.subs.get(self.current) {
                sub.exit_current(ev)?;
            }
        }
        self.run_handler(self.current, false, ev)
    }

    /// Fire the best-matching entry (or exit) handler of `state` for `ev`:
    /// an event-specific handler beats a wildcard one, first passing guard
    /// in declaration order wins, and at most one handler fires.
    fn run_handler(&self, state: StateTag, entry: bool, ev: &EventCtx) -> Result<(), MachineError> {
        let handlers = self.table.handlers(state, entry, ev.key);
        let scope = ev.scope(&self.context);
        for index in handlers {
            let rule = self.table.rule(index);
            let pass = match &rule.guard {
                Some(guard) => guard.check(&scope)?,
                None => true,
            };
            if pass {
                if let Some(action) = &rule.action {
                    action.call(&scope)?;
                }
                return Ok(());
            }
        }
        Ok(())
    }

    /// Descend into `state` if it is composite: a fresh child instance is
    /// initialised with the same triggering event, replacing any instance
    /// left over from a previous visit.
    fn enter_substate(&mut self, state: StateTag, ev: &EventCtx) -> Result<(), MachineError> {
        if let Some(sub_table) = self.table.submachine(state) {
            let mut sub = Machine::instance(sub_table.clone(), self.context.clone());
            sub.initialize(ev)?;
            self.subs.insert(state, sub);
        }
        Ok(())
    }

    /// Drive anonymous transitions from the current state until none
    /// applies. Anonymous rules out of a composite state wait for the child
    /// to reach its terminal state. The cascade is bounded by the table's
    /// rule count; exceeding it reports a cycle and leaves the machine at
    /// the last completed transition.
    fn run_cascade(&mut self) -> Result<(), MachineError> {
        let limit = self.table.rule_count();
        let mut steps = 0usize;
        let ev = EventCtx::none();
        loop {
            if self.table.kind_of(self.current) == StateKind::Composite {
                let completed = self
                    .subs
                    .get(self.current)
                    .is_some_and(|sub| sub.current == X);
                if !completed {
                    break;
                }
            }
            let Some(index) = self.select(self.current, &ev)? else {
                break;
            };
            steps += 1;
            if steps > limit {
                return Err(MachineError::AnonymousCycle {
                    state: self.current,
                    limit,
                });
            }
            self.fire_rule(index, &ev)?;
        }
        Ok(())
    }
}
