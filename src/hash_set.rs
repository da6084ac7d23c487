use core::fmt::Debug;
use core::hash::Hash;
use core::hash::Hasher;

use crate::cursor::Cursors;
use crate::error::TryReserveError;
use crate::hash_table;
use crate::hash_table::HashTable;
use crate::hash_table::Linear;
use crate::hash_table::ProbePolicy;
use crate::hash_table::RobinHood;
use crate::sentinel::EmptyKey;
use crate::strategy::HashStrategy;
use crate::strategy::Intrinsic;
use crate::strategy::intrinsic_hash;

/// A hash set backed by an open-addressing [`HashTable`] with no values.
///
/// `HashSet<T, S, P>` hashes and compares elements through the strategy `S`
/// and probes with `P`. The element type's empty marker (see [`EmptyKey`])
/// may be inserted like any other element.
///
/// # Examples
///
/// ```rust
/// use probe_hash::HashSet;
///
/// let mut set: HashSet<i64> = HashSet::new();
/// assert!(set.insert(0));
/// assert!(set.insert(-4));
/// assert!(!set.insert(-4));
/// assert_eq!(set.len(), 2);
/// ```
pub struct HashSet<T, S = Intrinsic, P = Linear>
where
    T: EmptyKey,
{
    table: HashTable<T, (), S, P>,
}

/// A [`HashSet`] that resolves collisions with Robin Hood probing.
pub type RobinHoodHashSet<T, S = Intrinsic> = HashSet<T, S, RobinHood>;

impl<T, S, P> Clone for HashSet<T, S, P>
where
    T: EmptyKey + Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<T, S, P> PartialEq for HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T> + PartialEq,
    P: ProbePolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.strategy() == other.strategy() && self.is_subset(other)
    }
}

impl<T, S, P> Eq for HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T> + Eq,
    P: ProbePolicy,
{
}

impl<T, S, P> Hash for HashSet<T, S, P>
where
    T: EmptyKey + Hash,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl<T, S, P> Debug for HashSet<T, S, P>
where
    T: EmptyKey + Debug,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S, P> HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T> + Default,
    P: ProbePolicy,
{
    /// Creates an empty set with the default strategy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashSet;
    ///
    /// let set: HashSet<u32> = HashSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a set holding at least `capacity` elements without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity, S::default())
    }
}

impl<T, S, P> Default for HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T> + Default,
    P: ProbePolicy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S, P> HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    /// Creates an empty set that hashes and compares with `strategy`.
    pub fn with_strategy(strategy: S) -> Self {
        Self::with_capacity_and_strategy(0, strategy)
    }

    /// Creates a set with the given capacity and strategy.
    pub fn with_capacity_and_strategy(capacity: usize, strategy: S) -> Self {
        Self {
            table: HashTable::with_capacity_and_strategy(capacity, strategy),
        }
    }

    /// Creates a set with the given capacity, load factor and strategy.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not in `(0, 1]`.
    pub fn with_capacity_load_factor_and_strategy(
        capacity: usize,
        load_factor: f64,
        strategy: S,
    ) -> Self {
        Self {
            table: HashTable::with_capacity_load_factor_and_strategy(
                capacity,
                load_factor,
                strategy,
            ),
        }
    }

    /// Replaces the perturbation seed, rehashing existing elements.
    pub fn with_perturbation(self, perturbation: u64) -> Self {
        Self {
            table: self.table.with_perturbation(perturbation),
        }
    }

    /// Returns the set's strategy.
    pub fn strategy(&self) -> &S {
        self.table.strategy()
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &HashTable<T, (), S, P> {
        &self.table
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns how many elements the set holds before it must reallocate.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the length of the underlying slot array.
    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    /// Returns the configured load factor.
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Removes all elements, keeping the allocated memory.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the slot array as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Tries to reserve capacity for at least `additional` more elements.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(additional)
    }

    /// Adds a value to the set, returning whether it was newly inserted.
    pub fn insert(&mut self, value: T) -> bool {
        self.table.insert(value, ()).is_none()
    }

    /// Adds a value to the set, reporting allocation failure instead of
    /// aborting. On error the set is unchanged.
    pub fn try_insert(&mut self, value: T) -> Result<bool, TryReserveError> {
        self.table
            .try_insert(value, ())
            .map(|previous| previous.is_none())
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.table.contains(value)
    }

    /// Returns the stored element equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.table.find_entry(value).map(|(stored, _)| stored)
    }

    /// Removes `value`, returning whether it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.table.remove(value).is_some()
    }

    /// Removes and returns the stored element equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.table.remove_entry(value).map(|(stored, _)| stored)
    }

    /// Adds `value`, replacing and returning an equal stored element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashSet;
    ///
    /// let mut set: HashSet<u32> = HashSet::new();
    /// assert_eq!(set.replace(5), None);
    /// assert_eq!(set.replace(5), Some(5));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn replace(&mut self, value: T) -> Option<T> {
        if self.table.contains(&value) {
            self.table.replace_key(value)
        } else {
            self.table.insert(value, ());
            None
        }
    }

    /// Removes `value` and returns how many elements were removed (0 or 1).
    pub fn remove_all_occurrences(&mut self, value: &T) -> usize {
        usize::from(self.remove(value))
    }

    /// Keeps only the elements for which `keep` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::RobinHoodHashSet;
    ///
    /// let mut set: RobinHoodHashSet<u32> = (1..=6).collect();
    /// set.retain(|&x| x % 2 == 0);
    /// assert_eq!(set.len(), 3);
    /// ```
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.table.retain(|value, _| keep(value));
    }

    /// Removes every element matching `predicate`, returning how many were
    /// removed.
    pub fn remove_all_matching(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.table.retain(|value, _| !predicate(value))
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Removes and yields every element.
    pub fn drain(&mut self) -> Drain<'_, T, S, P> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Starts a cursor walk exposing slot indices.
    pub fn cursors(&self) -> Cursors<'_, T, (), S, P> {
        self.table.cursors()
    }

    /// Calls `procedure` for every element.
    pub fn for_each(&self, mut procedure: impl FnMut(&T)) {
        self.table.for_each(|value, _| procedure(value));
    }

    /// Calls `predicate` for every element until it returns `false`. Returns
    /// `true` if every element was visited.
    pub fn for_each_while(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.table.for_each_while(|value, _| predicate(value))
    }

    /// Returns `true` if `self` has no elements in common with `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashSet;
    ///
    /// let a: HashSet<u32> = [1, 2, 3].into_iter().collect();
    /// let b: HashSet<u32> = [4, 5].into_iter().collect();
    /// assert!(a.is_disjoint(&b));
    /// ```
    pub fn is_disjoint(&self, other: &Self) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if every element of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every element of `other` is in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Visits the elements of `self`, then those of `other` not in `self`.
    pub fn union<'a>(&'a self, other: &'a Self) -> Union<'a, T, S, P> {
        Union {
            iter: self.iter(),
            other_iter: other.iter(),
            first: self,
        }
    }

    /// Visits the elements present in both sets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashSet;
    ///
    /// let a: HashSet<u32> = [0, 1, 2, 3].into_iter().collect();
    /// let b: HashSet<u32> = [0, 3, 4].into_iter().collect();
    /// let mut both: Vec<u32> = a.intersection(&b).copied().collect();
    /// both.sort();
    /// assert_eq!(both, [0, 3]);
    /// ```
    pub fn intersection<'a>(&'a self, other: &'a Self) -> Intersection<'a, T, S, P> {
        if self.len() <= other.len() {
            Intersection {
                iter: self.iter(),
                other,
            }
        } else {
            Intersection {
                iter: other.iter(),
                other: self,
            }
        }
    }

    /// Visits the elements of `self` that are not in `other`.
    pub fn difference<'a>(&'a self, other: &'a Self) -> Difference<'a, T, S, P> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Visits the elements in exactly one of the sets.
    pub fn symmetric_difference<'a>(&'a self, other: &'a Self) -> SymmetricDifference<'a, T, S, P> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }
}

impl<T, S, P> HashSet<T, S, P>
where
    T: EmptyKey + Hash,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    /// Order- and strategy-independent hash of the set's contents.
    pub fn content_hash(&self) -> u64 {
        self.iter()
            .fold(0u64, |acc, value| acc.wrapping_add(intrinsic_hash(value)))
    }
}

impl<T, S, P> FromIterator<T> for HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T> + Default,
    P: ProbePolicy,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, S, P> Extend<T> for HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, S, P> IntoIterator for HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type IntoIter = IntoIter<T, S, P>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S, P> IntoIterator for &'a HashSet<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the elements of a [`HashSet`].
pub struct Iter<'a, T> {
    inner: hash_table::Iter<'a, T, ()>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T: EmptyKey> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: EmptyKey> ExactSizeIterator for Iter<'_, T> {}

/// A draining iterator over the elements of a [`HashSet`].
pub struct Drain<'a, T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    inner: hash_table::Drain<'a, T, (), S, P>,
}

impl<T, S, P> Iterator for Drain<'_, T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }
}

/// An owning iterator over the elements of a [`HashSet`].
pub struct IntoIter<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    inner: hash_table::IntoIter<T, (), S, P>,
}

impl<T, S, P> Iterator for IntoIter<T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, _)| value)
    }
}

/// An iterator over the union of two sets.
pub struct Union<'a, T, S, P>
where
    T: EmptyKey,
{
    iter: Iter<'a, T>,
    other_iter: Iter<'a, T>,
    first: &'a HashSet<T, S, P>,
}

impl<'a, T, S, P> Iterator for Union<'a, T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.iter.next() {
            return Some(v);
        }
        loop {
            let v = self.other_iter.next()?;
            if !self.first.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the intersection of two sets.
pub struct Intersection<'a, T, S, P>
where
    T: EmptyKey,
{
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S, P>,
}

impl<'a, T, S, P> Iterator for Intersection<'a, T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the difference of two sets.
pub struct Difference<'a, T, S, P>
where
    T: EmptyKey,
{
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S, P>,
}

impl<'a, T, S, P> Iterator for Difference<'a, T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let v = self.iter.next()?;
            if !self.other.contains(v) {
                return Some(v);
            }
        }
    }
}

/// An iterator over the symmetric difference of two sets.
pub struct SymmetricDifference<'a, T, S, P>
where
    T: EmptyKey,
{
    iter: core::iter::Chain<Difference<'a, T, S, P>, Difference<'a, T, S, P>>,
}

impl<'a, T, S, P> Iterator for SymmetricDifference<'a, T, S, P>
where
    T: EmptyKey,
    S: HashStrategy<T>,
    P: ProbePolicy,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}
