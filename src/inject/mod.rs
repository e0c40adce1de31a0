//! Dependency injection for guards and actions.
//!
//! Machines carry a [`ContextBag`]: a type-keyed collection of values
//! supplied at construction. When a guard or action fires, each of its
//! parameters is resolved against the bag plus the current event: a
//! parameter of type [`Inj<T>`] binds to the injected `T`, a parameter of
//! type [`Ev<E>`] binds to the triggering event when it is an `E`, and a
//! parameter of type [`AnyEv`] binds to whatever event is present.
//! Resolution is verified for every callback in the table when the machine
//! is constructed; a missing value fails construction with
//! [`InjectError::MissingValue`].

mod handler;

pub use handler::{Action, Guard, IntoAction, IntoGuard};

use crate::core::EventToken;
use std::any::{type_name, Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use thiserror::Error;

/// Injection failures.
///
/// `MissingValue` and `DuplicateValue` surface while the bag or machine is
/// being built; `EventMismatch` can also surface mid-dispatch when a
/// wildcard-triggered callback asks for an event type the current event is
/// not.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("no injected value of type '{ty}' is available")]
    MissingValue { ty: &'static str },

    #[error("callback expects event '{expected}' but the current event is {got}")]
    EventMismatch { expected: &'static str, got: String },

    #[error("a value of type '{ty}' is already in the context bag")]
    DuplicateValue { ty: &'static str },
}

#[derive(Clone)]
struct Slot {
    value: Rc<dyn Any>,
    name: &'static str,
}

/// Type-keyed bag of values shared with every callback in a machine.
///
/// Each type may appear at most once. Values live behind `Rc<RefCell<_>>`,
/// so a bag clone shares the same slots; keep a clone to observe mutations
/// made by actions.
///
/// # Example
///
/// ```rust
/// use tabula::ContextBag;
///
/// let mut bag = ContextBag::new();
/// bag.insert(42i32);
/// bag.insert(String::from("hello"));
///
/// let shared = bag.clone();
/// shared.get::<String>().unwrap().borrow_mut().push_str(", world");
/// assert_eq!(&*bag.get::<String>().unwrap().borrow(), "hello, world");
/// ```
#[derive(Clone, Default)]
pub struct ContextBag {
    slots: HashMap<TypeId, Slot>,
}

impl ContextBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Insert a value, failing if its type is already present.
    pub fn try_insert<T: 'static>(&mut self, value: T) -> Result<(), InjectError> {
        match self.slots.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => Err(InjectError::DuplicateValue {
                ty: type_name::<T>(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(Slot {
                    value: Rc::new(RefCell::new(value)),
                    name: type_name::<T>(),
                });
                Ok(())
            }
        }
    }

    /// Insert a value.
    ///
    /// # Panics
    ///
    /// Panics if a value of the same type is already present; context value
    /// types must be unique.
    pub fn insert<T: 'static>(&mut self, value: T) {
        self.try_insert(value)
            .expect("context value types must be unique");
    }

    /// Chainable [`insert`](Self::insert).
    pub fn with<T: 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Handle to the injected value of type `T`, if present.
    pub fn get<T: 'static>(&self) -> Option<Inj<T>> {
        let slot = self.slots.get(&TypeId::of::<T>())?;
        let cell = Rc::clone(&slot.value).downcast::<RefCell<T>>().ok()?;
        Some(Inj { cell })
    }

    /// Number of injected values.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing has been injected.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn contains(&self, id: TypeId) -> bool {
        self.slots.contains_key(&id)
    }
}

impl fmt::Debug for ContextBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.slots.values().map(|slot| slot.name))
            .finish()
    }
}

/// Handle to an injected value of type `T`.
///
/// Actions mutate context through this handle; guards read through it.
/// Borrow rules are the usual `RefCell` rules: a callback must not hold a
/// mutable borrow across a nested borrow of the same slot.
pub struct Inj<T: 'static> {
    cell: Rc<RefCell<T>>,
}

impl<T: 'static> Inj<T> {
    /// Shared borrow of the value.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.borrow()
    }

    /// Mutable borrow of the value.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.borrow_mut()
    }

    /// Copy of the value.
    pub fn get(&self) -> T
    where
        T: Copy,
    {
        *self.cell.borrow()
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = value;
    }
}

impl<T: 'static> Clone for Inj<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: 'static + fmt::Debug> fmt::Debug for Inj<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inj").field(&self.cell.borrow()).finish()
    }
}

/// The triggering event, injected when its type is `E`.
///
/// Derefs to the event value.
pub struct Ev<E: 'static> {
    event: Rc<E>,
}

impl<E: 'static> Deref for Ev<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.event
    }
}

impl<E: 'static> Clone for Ev<E> {
    fn clone(&self) -> Self {
        Self {
            event: Rc::clone(&self.event),
        }
    }
}

impl<E: 'static + fmt::Debug> fmt::Debug for Ev<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ev").field(&*self.event).finish()
    }
}

/// The triggering event's identity, whatever its type.
///
/// Unlike [`Ev<E>`], which resolves only when the event is exactly an `E`,
/// this binds to any event and hands back its [`EventToken`]. It is the
/// extractor for wildcard-triggered guards that pick among several event
/// types at runtime:
///
/// ```rust
/// use tabula::AnyEv;
///
/// struct Retry;
/// struct Abort;
///
/// let retryable = |event: AnyEv| event.is::<Retry>() || event.is::<Abort>();
/// ```
#[derive(Clone, Copy, Debug)]
pub struct AnyEv {
    token: EventToken,
}

impl AnyEv {
    /// Token identifying the event's type.
    pub fn token(&self) -> EventToken {
        self.token
    }

    /// True iff the event is an `E`.
    pub fn is<E: 'static>(&self) -> bool {
        self.token.id == TypeId::of::<E>()
    }
}

/// What a rule's trigger promises about the event a callback will see.
///
/// Used when verifying callbacks at machine construction: an explicit
/// trigger pins the event type, wildcard triggers leave it open, anonymous
/// rules guarantee there is none.
#[derive(Clone, Copy, Debug)]
pub enum EventSpec {
    /// No event will be present (anonymous rules).
    None,
    /// Exactly this event type.
    Exactly(EventToken),
    /// Any event type, possibly none (wildcard triggers and handlers).
    Any,
}

pub(crate) struct EventRef<'a> {
    pub(crate) id: TypeId,
    pub(crate) value: &'a Rc<dyn Any>,
    pub(crate) name: &'static str,
}

/// Resolution context handed to callback trampolines: the machine's bag
/// plus the current event, if any.
pub struct Scope<'a> {
    pub(crate) bag: &'a ContextBag,
    pub(crate) event: Option<EventRef<'a>>,
}

/// A callback parameter resolvable from a [`Scope`].
pub trait FromScope: Sized + 'static {
    /// Resolve the parameter at invocation time.
    fn from_scope(scope: &Scope<'_>) -> Result<Self, InjectError>;

    /// Check at machine construction that resolution can succeed.
    fn verify(bag: &ContextBag, event: EventSpec) -> Result<(), InjectError>;
}

impl<T: 'static> FromScope for Inj<T> {
    fn from_scope(scope: &Scope<'_>) -> Result<Self, InjectError> {
        scope.bag.get::<T>().ok_or(InjectError::MissingValue {
            ty: type_name::<T>(),
        })
    }

    fn verify(bag: &ContextBag, _event: EventSpec) -> Result<(), InjectError> {
        if bag.contains(TypeId::of::<T>()) {
            Ok(())
        } else {
            Err(InjectError::MissingValue {
                ty: type_name::<T>(),
            })
        }
    }
}

impl<E: 'static> FromScope for Ev<E> {
    fn from_scope(scope: &Scope<'_>) -> Result<Self, InjectError> {
        match &scope.event {
            Some(event) if event.id == TypeId::of::<E>() => {
                let value = Rc::clone(event.value)
                    .downcast::<E>()
                    .expect("event TypeId matched but downcast failed");
                Ok(Ev { event: value })
            }
            Some(event) => Err(InjectError::EventMismatch {
                expected: type_name::<E>(),
                got: format!("'{}'", event.name),
            }),
            None => Err(InjectError::EventMismatch {
                expected: type_name::<E>(),
                got: "absent (anonymous transition)".to_string(),
            }),
        }
    }

    fn verify(_bag: &ContextBag, event: EventSpec) -> Result<(), InjectError> {
        match event {
            EventSpec::Exactly(token) if token.id == TypeId::of::<E>() => Ok(()),
            EventSpec::Any => Ok(()),
            EventSpec::Exactly(token) => Err(InjectError::EventMismatch {
                expected: type_name::<E>(),
                got: format!("'{}'", token.name()),
            }),
            EventSpec::None => Err(InjectError::EventMismatch {
                expected: type_name::<E>(),
                got: "absent (anonymous rule)".to_string(),
            }),
        }
    }
}

impl FromScope for AnyEv {
    fn from_scope(scope: &Scope<'_>) -> Result<Self, InjectError> {
        match &scope.event {
            Some(event) => Ok(AnyEv {
                token: EventToken {
                    id: event.id,
                    name: event.name,
                },
            }),
            None => Err(InjectError::EventMismatch {
                expected: "any event",
                got: "absent (anonymous transition)".to_string(),
            }),
        }
    }

    fn verify(_bag: &ContextBag, event: EventSpec) -> Result<(), InjectError> {
        match event {
            EventSpec::Exactly(_) | EventSpec::Any => Ok(()),
            EventSpec::None => Err(InjectError::EventMismatch {
                expected: "any event",
                got: "absent (anonymous rule)".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    #[test]
    fn bag_stores_one_value_per_type() {
        let mut bag = ContextBag::new();
        bag.insert(42i32);

        assert!(matches!(
            bag.try_insert(7i32),
            Err(InjectError::DuplicateValue { .. })
        ));
        assert_eq!(bag.get::<i32>().unwrap().get(), 42);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn bag_clones_share_slots() {
        let bag = ContextBag::new().with(String::from("a"));
        let clone = bag.clone();

        clone.get::<String>().unwrap().borrow_mut().push('b');

        assert_eq!(&*bag.get::<String>().unwrap().borrow(), "ab");
    }

    #[test]
    fn missing_value_is_reported_by_type_name() {
        let bag = ContextBag::new();
        let scope = Scope { bag: &bag, event: None };

        let err = Inj::<f64>::from_scope(&scope).unwrap_err();
        assert!(err.to_string().contains("f64"));
    }

    #[test]
    fn event_resolves_by_type() {
        let bag = ContextBag::new();
        let value: Rc<dyn Any> = Rc::new(Ping(9));
        let scope = Scope {
            bag: &bag,
            event: Some(EventRef {
                id: TypeId::of::<Ping>(),
                value: &value,
                name: "Ping",
            }),
        };

        let ev = Ev::<Ping>::from_scope(&scope).unwrap();
        assert_eq!(*ev, Ping(9));
    }

    #[test]
    fn event_mismatch_is_an_error() {
        let bag = ContextBag::new();
        let value: Rc<dyn Any> = Rc::new(Ping(9));
        let scope = Scope {
            bag: &bag,
            event: Some(EventRef {
                id: TypeId::of::<Ping>(),
                value: &value,
                name: "Ping",
            }),
        };

        assert!(matches!(
            Ev::<i32>::from_scope(&scope),
            Err(InjectError::EventMismatch { .. })
        ));
    }

    #[test]
    fn any_event_resolves_whatever_the_type() {
        let bag = ContextBag::new();
        let value: Rc<dyn Any> = Rc::new(Ping(9));
        let scope = Scope {
            bag: &bag,
            event: Some(EventRef {
                id: TypeId::of::<Ping>(),
                value: &value,
                name: "Ping",
            }),
        };

        let ev = AnyEv::from_scope(&scope).unwrap();
        assert!(ev.is::<Ping>());
        assert!(!ev.is::<i32>());
        assert_eq!(ev.token().name(), "Ping");
    }

    #[test]
    fn any_event_is_absent_on_anonymous_transitions() {
        let bag = ContextBag::new();
        let scope = Scope { bag: &bag, event: None };

        assert!(matches!(
            AnyEv::from_scope(&scope),
            Err(InjectError::EventMismatch { .. })
        ));
        assert!(AnyEv::verify(&bag, EventSpec::None).is_err());
        assert!(AnyEv::verify(&bag, EventSpec::Any).is_ok());
        assert!(AnyEv::verify(&bag, EventSpec::Exactly(EventToken::of::<Ping>())).is_ok());
    }

    #[test]
    fn verify_checks_event_spec() {
        let bag = ContextBag::new();

        assert!(Ev::<Ping>::verify(&bag, EventSpec::Exactly(EventToken::of::<Ping>())).is_ok());
        assert!(Ev::<Ping>::verify(&bag, EventSpec::Any).is_ok());
        assert!(Ev::<Ping>::verify(&bag, EventSpec::None).is_err());
        assert!(Ev::<Ping>::verify(&bag, EventSpec::Exactly(EventToken::of::<i32>())).is_err());
    }
}
