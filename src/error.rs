//! Runtime errors.

use crate::core::StateTag;
use crate::inject::InjectError;
use thiserror::Error;

/// Errors raised while constructing or running a machine.
///
/// Unmatched events are not errors; they leave the machine unchanged.
#[derive(Debug, Error)]
pub enum MachineError {
    /// A callback's parameters could not be resolved. Raised at
    /// construction for every callback in the table, or mid-dispatch when a
    /// wildcard-triggered callback asks for a different event type.
    #[error(transparent)]
    Injection(#[from] InjectError),

    /// An anonymous cascade exceeded the table's rule count. The machine is
    /// left at the last completed transition.
    #[error("anonymous transition cascade exceeded {limit} steps at state '{state}'")]
    AnonymousCycle { state: StateTag, limit: usize },

    /// `process_event` was called while a dispatch was already running on
    /// this instance. The machine is left in its pre-call configuration.
    #[error("event dispatched while the machine is already dispatching")]
    Reentrancy,
}
