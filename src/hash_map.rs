use core::fmt::Debug;
use core::hash::Hash;
use core::hash::Hasher;

use crate::cursor::Cursors;
use crate::error::TryReserveError;
use crate::hash_table::Drain;
use crate::hash_table::HashTable;
use crate::hash_table::IntoIter;
use crate::hash_table::Iter;
use crate::hash_table::IterMut;
use crate::hash_table::Linear;
use crate::hash_table::ProbePolicy;
use crate::hash_table::RobinHood;
use crate::sentinel::EmptyKey;
use crate::strategy::HashStrategy;
use crate::strategy::Intrinsic;
use crate::strategy::intrinsic_hash;

pub use crate::hash_table::Entry;
pub use crate::hash_table::OccupiedEntry;
pub use crate::hash_table::VacantEntry;

/// A hash map backed by an open-addressing [`HashTable`].
///
/// `HashMap<K, V, S, P>` stores key-value pairs in two parallel slot arrays.
/// Keys are hashed and compared through the strategy `S`; `P` selects
/// [`Linear`] or [`RobinHood`] probing. Every key type reserves one value as
/// its empty marker (see [`EmptyKey`]), which is nevertheless a valid key.
///
/// # Performance Characteristics
///
/// - **Memory**: `size_of::<K>() + size_of::<V>()` per slot (plus a `usize`
///   for Robin Hood maps), with at most `load_factor` of the slots in use.
///
/// # Examples
///
/// ```rust
/// use probe_hash::HashMap;
///
/// let mut ages: HashMap<u32, &str> = HashMap::new();
/// ages.insert(0, "root");
/// ages.insert(1000, "alice");
///
/// assert_eq!(ages.get(&0), Some(&"root"));
/// assert_eq!(ages.len(), 2);
/// ```
pub struct HashMap<K, V, S = Intrinsic, P = Linear>
where
    K: EmptyKey,
{
    table: HashTable<K, V, S, P>,
}

/// A [`HashMap`] that resolves collisions with Robin Hood probing.
pub type RobinHoodHashMap<K, V, S = Intrinsic> = HashMap<K, V, S, RobinHood>;

impl<K, V, S, P> Clone for HashMap<K, V, S, P>
where
    K: EmptyKey + Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K, V, S, P> Debug for HashMap<K, V, S, P>
where
    K: EmptyKey + Debug,
    V: Debug,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K> + Default,
    P: ProbePolicy,
{
    /// Creates an empty map with the default strategy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a map holding at least `capacity` entries without growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::RobinHoodHashMap;
    ///
    /// let map: RobinHoodHashMap<i32, String> = RobinHoodHashMap::with_capacity(100);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity, S::default())
    }
}

impl<K, V, S, P> Default for HashMap<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K> + Default,
    P: ProbePolicy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Creates an empty map that hashes and compares keys with `strategy`.
    pub fn with_strategy(strategy: S) -> Self {
        Self::with_capacity_and_strategy(0, strategy)
    }

    /// Creates a map with the given capacity and strategy.
    pub fn with_capacity_and_strategy(capacity: usize, strategy: S) -> Self {
        Self {
            table: HashTable::with_capacity_and_strategy(capacity, strategy),
        }
    }

    /// Creates a map with the given capacity, load factor and strategy.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not in `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    /// use probe_hash::Intrinsic;
    ///
    /// let map: HashMap<u64, u64> =
    ///     HashMap::with_capacity_load_factor_and_strategy(10, 0.5, Intrinsic);
    /// assert_eq!(map.load_factor(), 0.5);
    /// assert!(map.capacity() >= 10);
    /// ```
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

    /// Replaces the perturbation seed, rehashing existing entries.
    pub fn with_perturbation(self, perturbation: u64) -> Self {
        Self {
            table: self.table.with_perturbation(perturbation),
        }
    }

    /// Returns the map's strategy.
    pub fn strategy(&self) -> &S {
        self.table.strategy()
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &HashTable<K, V, S, P> {
        &self.table
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<u8, &str> = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns how many entries the map holds before it must reallocate.
    ///
    /// The empty key is stored out-of-band and does not count against this.
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

    /// Removes all entries, keeping the allocated memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<u8, &str> = HashMap::new();
    /// map.insert(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the slot array as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more entries.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows, and aborts if the allocation
    /// fails.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Tries to reserve capacity for at least `additional` more entries.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(additional)
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<u32, &str> = HashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    /// Inserts a key-value pair, reporting allocation failure instead of
    /// aborting. On error the map is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, TryReserveError> {
        self.table.try_insert(key, value)
    }

    /// Returns a reference to the value for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.find(key)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.table.find_entry(key)
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<u32, i32> = HashMap::new();
    /// map.insert(1, 10);
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x += 5;
    /// }
    /// assert_eq!(map.get(&1), Some(&15));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.find_mut(key)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains(key)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.table.remove(key)
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.table.remove_entry(key)
    }

    /// Removes `key` and returns how many entries were removed (0 or 1).
    pub fn remove_all_occurrences(&mut self, key: &K) -> usize {
        usize::from(self.table.remove(key).is_some())
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// `keep` is called exactly once per entry, in unspecified order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<u32, u32> = (0..8).map(|x| (x, x * 10)).collect();
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert_eq!(map.len(), 4);
    /// ```
    pub fn retain(&mut self, keep: impl FnMut(&K, &mut V) -> bool) {
        self.table.retain(keep);
    }

    /// Removes every entry matching `predicate`, returning how many were
    /// removed.
    pub fn remove_all_matching(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> usize {
        self.table.retain(|key, value| !predicate(key, value))
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::RobinHoodHashMap;
    ///
    /// let mut letters: RobinHoodHashMap<char, u32> = RobinHoodHashMap::new();
    /// for ch in "a short treatise on fungi".chars() {
    ///     *letters.entry(ch).or_insert(0) += 1;
    /// }
    /// assert_eq!(letters.get(&'s'), Some(&2));
    /// assert_eq!(letters.get(&'t'), Some(&3));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, P> {
        self.table.entry(key)
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<u32, u32> = [(1, 1), (2, 2)].into_iter().collect();
    /// for value in map.values_mut() {
    ///     *value *= 100;
    /// }
    /// assert_eq!(map.get(&2), Some(&200));
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Removes and yields every entry.
    pub fn drain(&mut self) -> Drain<'_, K, V, S, P> {
        self.table.drain()
    }

    /// Starts a cursor walk exposing slot indices.
    pub fn cursors(&self) -> Cursors<'_, K, V, S, P> {
        self.table.cursors()
    }

    /// Calls `procedure` for every entry.
    pub fn for_each(&self, procedure: impl FnMut(&K, &V)) {
        self.table.for_each(procedure);
    }

    /// Calls `predicate` for every entry until it returns `false`. Returns
    /// `true` if every entry was visited.
    pub fn for_each_while(&self, predicate: impl FnMut(&K, &V) -> bool) -> bool {
        self.table.for_each_while(predicate)
    }
}

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: EmptyKey,
    V: Default + Clone,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Returns a copy of the value for `key`, or `V::default()` if absent.
    pub fn get_or_default(&self, key: &K) -> V {
        self.get(key).cloned().unwrap_or_default()
    }
}

impl<K, V, S, P> HashMap<K, V, S, P>
where
    K: EmptyKey + Hash,
    V: Hash,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Order- and strategy-independent hash of the map's contents.
    ///
    /// Equal maps always have equal content hashes.
    pub fn content_hash(&self) -> u64 {
        self.iter().fold(0u64, |acc, (key, value)| {
            acc.wrapping_add(intrinsic_hash(key) ^ intrinsic_hash(value))
        })
    }
}

impl<K, V, S, P> PartialEq for HashMap<K, V, S, P>
where
    K: EmptyKey,
    V: PartialEq,
    S: HashStrategy<K> + PartialEq,
    P: ProbePolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.strategy() == other.strategy()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S, P> Eq for HashMap<K, V, S, P>
where
    K: EmptyKey,
    V: Eq,
    S: HashStrategy<K> + Eq,
    P: ProbePolicy,
{
}

impl<K, V, S, P> Hash for HashMap<K, V, S, P>
where
    K: EmptyKey + Hash,
    V: Hash,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.content_hash());
    }
}

impl<K, V, S, P> FromIterator<(K, V)> for HashMap<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K> + Default,
    P: ProbePolicy,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, S, P> Extend<(K, V)> for HashMap<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S, P> IntoIterator for HashMap<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    type IntoIter = IntoIter<K, V, S, P>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a HashMap<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the keys of a [`HashMap`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: EmptyKey, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: EmptyKey, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`HashMap`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: EmptyKey, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: EmptyKey, V> ExactSizeIterator for Values<'_, K, V> {}

/// An iterator over mutable references to the values of a [`HashMap`].
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K: EmptyKey, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
