//! Construction sugar.

/// Build a [`ContextBag`](crate::ContextBag) from a list of values.
///
/// Each value's type becomes its slot key, so the types must be distinct.
///
/// # Example
///
/// ```rust
/// use tabula::context;
///
/// let bag = context![42i32, 87.0f64, String::from("log")];
/// assert_eq!(bag.len(), 3);
/// assert_eq!(bag.get::<i32>().unwrap().get(), 42);
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::ContextBag::new()
    };
    ($($value:expr),+ $(,)?) => {{
        let mut bag = $crate::ContextBag::new();
        $(bag.insert($value);)+
        bag
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn empty_context_builds() {
        let bag = context![];
        assert!(bag.is_empty());
    }

    #[test]
    fn context_accepts_mixed_values() {
        let bag = context![1u8, "tag", vec![1, 2, 3]];

        assert_eq!(bag.len(), 3);
        assert_eq!(bag.get::<u8>().unwrap().get(), 1);
        assert_eq!(*bag.get::<Vec<i32>>().unwrap().borrow(), [1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "unique")]
    fn duplicate_types_panic() {
        let _ = context![1i32, 2i32];
    }
}
