//! Guard and action trampolines.
//!
//! User callbacks are plain closures whose parameters implement
//! [`FromScope`]. At rule-construction time they are wrapped into [`Guard`]
//! / [`Action`] values holding two erased closures: one that resolves the
//! parameters and invokes the callback, and one that re-runs the same
//! resolution checks against a bag without invoking anything (used when a
//! machine is constructed).

use super::{ContextBag, EventSpec, FromScope, InjectError, Scope};
use std::fmt;
use std::rc::Rc;

type RunGuard = Rc<dyn Fn(&Scope<'_>) -> Result<bool, InjectError>>;
type RunAction = Rc<dyn Fn(&Scope<'_>) -> Result<(), InjectError>>;
type Verify = Rc<dyn Fn(&ContextBag, EventSpec) -> Result<(), InjectError>>;

/// An erased guard predicate with injectable parameters.
pub struct Guard {
    pub(crate) run: RunGuard,
    pub(crate) verify: Verify,
}

impl Guard {
    /// Wrap a predicate closure.
    pub fn new<F, Args>(predicate: F) -> Self
    where
        F: IntoGuard<Args>,
    {
        predicate.into_guard()
    }

    /// Evaluate the predicate against a scope.
    pub(crate) fn check(&self, scope: &Scope<'_>) -> Result<bool, InjectError> {
        (self.run)(scope)
    }
}

impl Clone for Guard {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
            verify: Rc::clone(&self.verify),
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard")
    }
}

/// An erased side-effect callback with injectable parameters.
pub struct Action {
    pub(crate) run: RunAction,
    pub(crate) verify: Verify,
}

impl Action {
    /// Wrap an action closure.
    pub fn new<F, Args>(action: F) -> Self
    where
        F: IntoAction<Args>,
    {
        action.into_action()
    }

    /// Invoke the action against a scope.
    pub(crate) fn call(&self, scope: &Scope<'_>) -> Result<(), InjectError> {
        (self.run)(scope)
    }
}

impl Clone for Action {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
            verify: Rc::clone(&self.verify),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action")
    }
}

/// Conversion of a closure `Fn(P1, …, Pn) -> bool` into a [`Guard`].
pub trait IntoGuard<Args> {
    fn into_guard(self) -> Guard;
}

/// Conversion of a closure `Fn(P1, …, Pn)` into an [`Action`].
pub trait IntoAction<Args> {
    fn into_action(self) -> Action;
}

macro_rules! impl_trampolines {
    ($($param:ident),*) => {
        impl<F, $($param,)*> IntoGuard<($($param,)*)> for F
        where
            F: Fn($($param),*) -> bool + 'static,
            $($param: FromScope,)*
        {
            fn into_guard(self) -> Guard {
                Guard {
                    run: Rc::new(move |_scope: &Scope<'_>| {
                        Ok(self($($param::from_scope(_scope)?),*))
                    }),
                    verify: Rc::new(|_bag: &ContextBag, _event: EventSpec| {
                        $($param::verify(_bag, _event)?;)*
                        Ok(())
                    }),
                }
            }
        }

        impl<F, $($param,)*> IntoAction<($($param,)*)> for F
        where
            F: Fn($($param),*) + 'static,
            $($param: FromScope,)*
        {
            fn into_action(self) -> Action {
                Action {
                    run: Rc::new(move |_scope: &Scope<'_>| {
                        self($($param::from_scope(_scope)?),*);
                        Ok(())
                    }),
                    verify: Rc::new(|_bag: &ContextBag, _event: EventSpec| {
                        $($param::verify(_bag, _event)?;)*
                        Ok(())
                    }),
                }
            }
        }
    };
}

impl_trampolines!();
impl_trampolines!(P1);
impl_trampolines!(P1, P2);
impl_trampolines!(P1, P2, P3);
impl_trampolines!(P1, P2, P3, P4);
