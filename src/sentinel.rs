//! The "no key" marker stored in unoccupied slots.
//!
//! Every key type used with the tables in this crate designates one of its
//! values as the empty marker. Unoccupied slots of the main key array hold
//! that value, so testing whether a slot is occupied is a single comparison
//! against the marker with no side metadata.
//!
//! The marker is still a perfectly legal key from the caller's point of view:
//! the tables store it out-of-band in a dedicated slot rather than in the main
//! array, so inserting `0u32` or `None::<String>` behaves like inserting any
//! other key.

/// A key type with a distinguished empty value.
///
/// `empty()` must always return the same value and `is_empty_key` must return
/// `true` for exactly that value. The empty value must compare equal to itself
/// under whatever [`HashStrategy`](crate::strategy::HashStrategy) the table
/// uses.
///
/// # Examples
///
/// ```rust
/// use probe_hash::EmptyKey;
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// struct Handle(u32);
///
/// impl EmptyKey for Handle {
///     fn empty() -> Self {
///         Handle(u32::MAX)
///     }
///
///     fn is_empty_key(&self) -> bool {
///         self.0 == u32::MAX
///     }
/// }
///
/// let mut set: probe_hash::HashSet<Handle> = probe_hash::HashSet::new();
/// assert!(set.insert(Handle(u32::MAX)));
/// assert!(set.contains(&Handle(u32::MAX)));
/// ```
pub trait EmptyKey: Sized {
    /// Returns the empty marker value.
    fn empty() -> Self;

    /// Returns `true` if `self` is the empty marker value.
    fn is_empty_key(&self) -> bool;
}

macro_rules! zero_empty_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl EmptyKey for $t {
                #[inline(always)]
                fn empty() -> Self {
                    0
                }

                #[inline(always)]
                fn is_empty_key(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

zero_empty_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl EmptyKey for char {
    #[inline(always)]
    fn empty() -> Self {
        '\0'
    }

    #[inline(always)]
    fn is_empty_key(&self) -> bool {
        *self == '\0'
    }
}

impl EmptyKey for bool {
    #[inline(always)]
    fn empty() -> Self {
        false
    }

    #[inline(always)]
    fn is_empty_key(&self) -> bool {
        !*self
    }
}

/// `None` plays the role of the null reference for object keys.
impl<T> EmptyKey for Option<T> {
    #[inline(always)]
    fn empty() -> Self {
        None
    }

    #[inline(always)]
    fn is_empty_key(&self) -> bool {
        self.is_none()
    }
}
