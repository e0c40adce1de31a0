//! State tags and the terminal pseudo-state.
//!
//! States are identified by stable string tags. A tag is *simple* unless the
//! table registered a sub-machine under it (making it *composite*) or it is
//! the terminal pseudo-state [`X`].

/// Stable identifier for a state within one transition table.
pub type StateTag = &'static str;

/// The terminal pseudo-state.
///
/// A sub-machine that transitions to `X` has completed; its parent observes
/// the completion and may leave the composite state through an anonymous
/// transition. At the top level a machine resting in `X` simply stays there
/// (rules with source `X` remain dispatchable).
///
/// # Example
///
/// ```rust
/// use tabula::{rule, ContextBag, Machine, TransitionTable, X};
///
/// struct Finish;
///
/// let table = TransitionTable::builder()
///     .rule(rule("idle").initial().on::<Finish>().to(X))
///     .build()
///     .unwrap();
///
/// let mut machine = Machine::new(table, ContextBag::new()).unwrap();
/// machine.process_event(Finish).unwrap();
/// assert!(machine.is(X));
/// ```
pub const X: StateTag = "X";

/// How a tag behaves during dispatch, resolved against the owning table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    /// Ordinary state with no nested machine.
    Simple,
    /// Tag registered against a nested transition table.
    Composite,
    /// The terminal pseudo-state [`X`].
    Terminal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_tag_is_stable() {
        assert_eq!(X, "X");
    }

    #[test]
    fn state_kind_is_comparable() {
        assert_eq!(StateKind::Simple, StateKind::Simple);
        assert_ne!(StateKind::Simple, StateKind::Composite);
        assert_ne!(StateKind::Composite, StateKind::Terminal);
    }
}
