//! Tabula: an embeddable hierarchical state machine engine.
//!
//! A machine is described declaratively as a transition table (an ordered
//! list of rules over state tags and event types) and interpreted at
//! runtime. The engine covers guarded transitions, entry/exit handlers,
//! internal and self transitions, anonymous (completion) transitions, and
//! composite states that nest whole sub-machines to arbitrary depth.
//!
//! # Core concepts
//!
//! - **Rules**: `rule(source).on::<Event>().guard(g).action(a).to(target)`.
//!   Omit the trigger for an anonymous rule, omit the target for an
//!   internal one.
//! - **Injection**: guards and actions are plain closures; each parameter
//!   binds by type against the machine's [`ContextBag`] ([`Inj<T>`]) or the
//!   triggering event ([`Ev<E>`]).
//! - **Composites**: register a nested table with
//!   [`TableBuilder::submachine`]; the child signals completion by
//!   transitioning to [`X`].
//!
//! # Example
//!
//! ```rust
//! use tabula::{context, rule, Ev, Inj, Machine, TransitionTable};
//!
//! struct Deposit(u32);
//! struct Withdraw(u32);
//!
//! let table = TransitionTable::builder()
//!     .rule(
//!         rule("open")
//!             .initial()
//!             .on::<Deposit>()
//!             .action(|balance: Inj<u32>, event: Ev<Deposit>| {
//!                 *balance.borrow_mut() += event.0;
//!             }),
//!     )
//!     .rule(
//!         rule("open")
//!             .on::<Withdraw>()
//!             .guard(|balance: Inj<u32>| balance.get() == 0)
//!             .to("overdrawn"),
//!     )
//!     .rule(rule("overdrawn").on::<Deposit>().to("open"))
//!     .build()
//!     .unwrap();
//!
//! let mut account = Machine::new(table, context![0u32]).unwrap();
//! account.process_event(Deposit(10)).unwrap();
//! assert!(account.is("open"));
//! assert_eq!(account.context().get::<u32>().unwrap().get(), 10);
//! ```

pub mod core;
pub mod inject;
pub mod machine;
pub mod table;

mod error;

pub use crate::core::{
    EventToken, StateKind, StateTag, TransitionHistory, TransitionRecord, Trigger, X,
};
pub use crate::error::MachineError;
pub use crate::inject::{
    Action, AnyEv, ContextBag, Ev, Guard, Inj, InjectError, IntoAction, IntoGuard,
};
pub use crate::machine::Machine;
pub use crate::table::{rule, BuildError, Rule, RuleBuilder, TableBuilder, TransitionTable};
