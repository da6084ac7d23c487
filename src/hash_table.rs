use alloc::boxed::Box;
use core::fmt::Debug;
use core::marker::PhantomData;
use core::mem::MaybeUninit;

use crate::error::TryReserveError;
use crate::resize::SlotArrays;
use crate::sentinel::EmptyKey;
use crate::strategy::HashStrategy;
use crate::strategy::Intrinsic;
use crate::strategy::fresh_perturbation;
use crate::strategy::mix;

/// Smallest slot array ever allocated.
pub(crate) const MIN_SLOTS: usize = 4;

cfg_if::cfg_if! {
    if #[cfg(feature = "density-ninety")] {
        /// Load factor used when none is given at construction.
        pub const DEFAULT_LOAD_FACTOR: f64 = 0.9;
    } else if #[cfg(feature = "density-fifty")] {
        /// Load factor used when none is given at construction.
        pub const DEFAULT_LOAD_FACTOR: f64 = 0.5;
    } else {
        /// Load factor used when none is given at construction.
        pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
    }
}

/// Number of entries a table of `slots` slots holds before growing.
///
/// Always leaves two slots free: one for a pending insertion and one so that
/// every probe sequence ends on an empty slot.
#[inline(always)]
pub(crate) fn growth_threshold(slots: usize, load_factor: f64) -> usize {
    let by_load = (slots as f64 * load_factor) as usize;
    by_load.min(slots - 2)
}

/// Smallest power-of-two slot count whose growth threshold fits `expected`.
pub(crate) fn slots_for(expected: usize, load_factor: f64) -> Result<usize, TryReserveError> {
    let wanted = (expected as f64 / load_factor).ceil();
    if wanted >= (isize::MAX as usize >> 1) as f64 {
        return Err(TryReserveError::CapacityOverflow);
    }

    let mut slots = (wanted as usize)
        .max(MIN_SLOTS)
        .checked_next_power_of_two()
        .ok_or(TryReserveError::CapacityOverflow)?;
    while growth_threshold(slots, load_factor) < expected {
        slots = slots
            .checked_mul(2)
            .ok_or(TryReserveError::CapacityOverflow)?;
    }
    Ok(slots)
}

#[inline]
fn check_load_factor(load_factor: f64) {
    assert!(
        load_factor > 0.0 && load_factor <= 1.0,
        "load factor must be in (0, 1], got {load_factor}"
    );
}

mod private {
    pub trait Sealed {}
}

/// Selects the collision resolution algorithm of a [`HashTable`].
///
/// Implemented by [`Linear`] and [`RobinHood`] only.
pub trait ProbePolicy: private::Sealed {
    /// Whether slots cache their ideal index and insertions displace entries
    /// that sit closer to home.
    const ROBIN_HOOD: bool;
}

/// Classic linear probing: a new key takes the first empty slot after its
/// ideal slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Linear;

/// Robin Hood probing: a new key takes the slot of the first entry that has
/// probed less far than it has, and that entry moves on instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RobinHood;

impl private::Sealed for Linear {}
impl private::Sealed for RobinHood {}

impl ProbePolicy for Linear {
    const ROBIN_HOOD: bool = false;
}

impl ProbePolicy for RobinHood {
    const ROBIN_HOOD: bool = true;
}

/// Result of walking a probe sequence for a key.
pub(crate) enum Probe {
    /// The key lives in this slot.
    Found(usize),
    /// The key is absent and would be placed in this slot.
    Vacant(usize),
}

/// Where an entry lives: a slot of the main arrays, or the out-of-band slot
/// reserved for the empty key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    Slot(usize),
    Sentinel,
}

/// An open-addressing hash table keyed by `K` with co-indexed values `V`.
///
/// Keys live in one flat array, values in a second array of the same length,
/// and (for [`RobinHood`]) each slot's ideal index in a third. Unoccupied
/// slots hold [`EmptyKey::empty`]; a caller that inserts that key gets it
/// stored in a dedicated out-of-band slot, so it behaves like any other key.
///
/// Deletion uses backward shifting, so the table never contains tombstones
/// and every key stays reachable by a forward scan from its ideal slot.
///
/// ## Performance Characteristics
///
/// - **Memory**: `size_of::<K>() + size_of::<V>()` per slot, plus a `usize`
///   per slot for Robin Hood tables.
///
/// ## Example
///
/// ```rust
/// use probe_hash::hash_table::Entry;
/// use probe_hash::hash_table::HashTable;
/// use probe_hash::hash_table::Linear;
/// use probe_hash::Intrinsic;
///
/// let mut table: HashTable<u64, &str, Intrinsic, Linear> = HashTable::with_capacity(16);
/// match table.entry(123) {
///     Entry::Vacant(entry) => {
///         entry.insert("Alice");
///     }
///     Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// assert_eq!(table.find(&123), Some(&"Alice"));
/// ```
pub struct HashTable<K, V, S = Intrinsic, P = Linear>
where
    K: EmptyKey,
{
    pub(crate) keys: Box<[K]>,
    pub(crate) values: Box<[MaybeUninit<V>]>,
    pub(crate) origins: Box<[usize]>,

    pub(crate) empty_key: K,
    pub(crate) sentinel: Option<V>,

    pub(crate) populated: usize,
    pub(crate) max_pop: usize,
    pub(crate) mask: usize,
    pub(crate) load_factor: f64,
    pub(crate) perturbation: u64,

    pub(crate) strategy: S,
    pub(crate) _policy: PhantomData<P>,
}

impl<K, V, S, P> Debug for HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;
        use alloc::vec::Vec;

        f.debug_struct("HashTable")
            .field(
                "distances",
                &self
                    .keys
                    .chunks(16)
                    .enumerate()
                    .map(|(row, chunk)| {
                        let mut items = Vec::new();
                        for offset in 0..chunk.len() {
                            let slot = row * 16 + offset;
                            if self.is_occupied(slot) {
                                items.push(format!("{:02}", self.probe_distance(slot)));
                            } else {
                                items.push("..".to_string());
                            }
                        }
                        items.join(", ")
                    })
                    .collect::<Vec<String>>(),
            )
            .field("populated", &self.populated)
            .field("capacity", &self.max_pop)
            .field("has_empty_key", &self.sentinel.is_some())
            .finish()
    }
}

impl<K, V, S, P> Clone for HashTable<K, V, S, P>
where
    K: EmptyKey + Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        let values = self
            .keys
            .iter()
            .zip(self.values.iter())
            .map(|(key, value)| {
                if key.is_empty_key() {
                    MaybeUninit::uninit()
                } else {
                    // SAFETY: Values are initialized exactly where the key is occupied.
                    MaybeUninit::new(unsafe { value.assume_init_ref() }.clone())
                }
            })
            .collect();

        Self {
            keys: self.keys.clone(),
            values,
            origins: self.origins.clone(),
            empty_key: K::empty(),
            sentinel: self.sentinel.clone(),
            populated: self.populated,
            max_pop: self.max_pop,
            mask: self.mask,
            load_factor: self.load_factor,
            perturbation: self.perturbation,
            strategy: self.strategy.clone(),
            _policy: PhantomData,
        }
    }
}

impl<K, V, S, P> Drop for HashTable<K, V, S, P>
where
    K: EmptyKey,
{
    fn drop(&mut self) {
        if core::mem::needs_drop::<V>() && self.populated > 0 {
            for (key, value) in self.keys.iter().zip(self.values.iter_mut()) {
                if !key.is_empty_key() {
                    // SAFETY: Values are initialized exactly where the key is occupied,
                    // and nothing reads them after drop.
                    unsafe { value.assume_init_drop() };
                }
            }
        }
    }
}

impl<K, V, S, P> HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K> + Default,
    P: ProbePolicy,
{
    /// Creates an empty table with the default strategy.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a table that holds at least `capacity` entries without
    /// growing, using the default strategy and load factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::RobinHood;
    /// use probe_hash::Intrinsic;
    ///
    /// let table: HashTable<u32, String, Intrinsic, RobinHood> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity, S::default())
    }
}

impl<K, V, S, P> Default for HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K> + Default,
    P: ProbePolicy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P> HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Creates a table holding at least `capacity` entries without growing,
    /// with the given strategy and the default load factor.
    pub fn with_capacity_and_strategy(capacity: usize, strategy: S) -> Self {
        Self::with_capacity_load_factor_and_strategy(capacity, DEFAULT_LOAD_FACTOR, strategy)
    }

    /// Creates a table holding at least `capacity` entries without growing.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not in `(0, 1]`, or if the required slot
    /// array cannot be allocated.
    pub fn with_capacity_load_factor_and_strategy(
        capacity: usize,
        load_factor: f64,
        strategy: S,
    ) -> Self {
        check_load_factor(load_factor);
        let slots = slots_for(capacity, load_factor).unwrap_or_else(|e| e.handle());
        let arrays = SlotArrays::allocate(slots, P::ROBIN_HOOD).unwrap_or_else(|e| e.handle());

        Self {
            keys: arrays.keys,
            values: arrays.values,
            origins: arrays.origins,
            empty_key: K::empty(),
            sentinel: None,
            populated: 0,
            max_pop: growth_threshold(slots, load_factor),
            mask: slots - 1,
            load_factor,
            perturbation: fresh_perturbation(),
            strategy,
            _policy: PhantomData,
        }
    }

    /// Replaces the perturbation seed, rehashing any existing entries.
    ///
    /// Tables are seeded randomly; a fixed seed gives reproducible layouts.
    pub fn with_perturbation(mut self, perturbation: u64) -> Self {
        self.perturbation = perturbation;
        if self.populated > 0 {
            let slots = self.keys.len();
            if let Err(e) = self.try_resize_to(slots) {
                e.handle();
            }
        }
        self
    }

    /// Returns the number of entries, including the empty key if present.
    pub fn len(&self) -> usize {
        self.populated + usize::from(self.sentinel.is_some())
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many entries the slot array holds before it must grow.
    ///
    /// The empty key is stored out-of-band and never counts against this.
    pub fn capacity(&self) -> usize {
        self.max_pop
    }

    /// Returns the length of the slot array.
    pub fn slot_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns the configured load factor.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns the per-instance perturbation seed.
    pub fn perturbation(&self) -> u64 {
        self.perturbation
    }

    /// Returns the table's strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    #[inline(always)]
    pub(crate) fn is_occupied(&self, slot: usize) -> bool {
        !self.keys[slot].is_empty_key()
    }

    #[inline(always)]
    pub(crate) fn hash_of(&self, key: &K) -> u64 {
        self.strategy.hash_key(key)
    }

    #[inline(always)]
    pub(crate) fn ideal_slot(&self, hash: u64) -> usize {
        mix(hash, self.perturbation) as usize & self.mask
    }

    /// Distance of the entry in `slot` from its ideal slot.
    #[inline]
    pub(crate) fn probe_distance(&self, slot: usize) -> usize {
        let ideal = if P::ROBIN_HOOD {
            self.origins[slot]
        } else {
            self.ideal_slot(self.hash_of(&self.keys[slot]))
        };
        slot.wrapping_sub(ideal) & self.mask
    }

    /// Walks the probe sequence of `key`.
    ///
    /// Linear probing stops at the first empty slot; Robin Hood additionally
    /// stops at the first entry closer to home than `key` would be, since
    /// `key` would have displaced it.
    pub(crate) fn probe(&self, key: &K, hash: u64) -> Probe {
        debug_assert!(!key.is_empty_key());

        let mut slot = self.ideal_slot(hash);
        let mut distance = 0;
        loop {
            if !self.is_occupied(slot) {
                return Probe::Vacant(slot);
            }
            if P::ROBIN_HOOD && self.probe_distance(slot) < distance {
                return Probe::Vacant(slot);
            }
            if self.strategy.equals(&self.keys[slot], key) {
                return Probe::Found(slot);
            }
            slot = (slot + 1) & self.mask;
            distance += 1;
        }
    }

    /// Finds where a key known to be absent would be placed.
    pub(crate) fn insertion_slot(&self, hash: u64) -> usize {
        let mut slot = self.ideal_slot(hash);
        let mut distance = 0;
        while self.is_occupied(slot) {
            if P::ROBIN_HOOD && self.probe_distance(slot) < distance {
                break;
            }
            slot = (slot + 1) & self.mask;
            distance += 1;
        }
        slot
    }

    /// Locates `key`, looking in the out-of-band slot for the empty key.
    pub(crate) fn position_of(&self, key: &K) -> Option<Position> {
        if key.is_empty_key() {
            return self.sentinel.as_ref().map(|_| Position::Sentinel);
        }
        if self.populated == 0 {
            return None;
        }
        match self.probe(key, self.hash_of(key)) {
            Probe::Found(slot) => Some(Position::Slot(slot)),
            Probe::Vacant(_) => None,
        }
    }

    pub(crate) fn key_at(&self, position: Position) -> &K {
        match position {
            Position::Slot(slot) => &self.keys[slot],
            Position::Sentinel => &self.empty_key,
        }
    }

    pub(crate) fn value_at(&self, position: Position) -> &V {
        match position {
            // SAFETY: Positions are only produced for occupied slots.
            Position::Slot(slot) => unsafe { self.values[slot].assume_init_ref() },
            Position::Sentinel => match &self.sentinel {
                Some(value) => value,
                None => unreachable!("sentinel position without a value"),
            },
        }
    }

    pub(crate) fn value_at_mut(&mut self, position: Position) -> &mut V {
        match position {
            // SAFETY: Positions are only produced for occupied slots.
            Position::Slot(slot) => unsafe { self.values[slot].assume_init_mut() },
            Position::Sentinel => match &mut self.sentinel {
                Some(value) => value,
                None => unreachable!("sentinel position without a value"),
            },
        }
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::Linear;
    /// use probe_hash::Intrinsic;
    ///
    /// let mut table: HashTable<i32, &str, Intrinsic, Linear> = HashTable::new();
    /// table.insert(0, "zero");
    /// table.insert(1, "one");
    /// assert_eq!(table.find(&0), Some(&"zero"));
    /// assert_eq!(table.find(&2), None);
    /// ```
    pub fn find(&self, key: &K) -> Option<&V> {
        self.position_of(key)
            .map(|position| self.value_at(position))
    }

    /// Returns the stored key and value for `key`.
    pub fn find_entry(&self, key: &K) -> Option<(&K, &V)> {
        self.position_of(key)
            .map(|position| (self.key_at(position), self.value_at(position)))
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        self.position_of(key)
            .map(|position| self.value_at_mut(position))
    }

    /// Returns `true` if the table contains `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.position_of(key).is_some()
    }

    /// Gets the entry for `key`.
    ///
    /// Looking up an existing key never grows the table; growth happens only
    /// when a vacant entry is filled while the table is at its threshold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::RobinHood;
    /// use probe_hash::Intrinsic;
    ///
    /// let mut table: HashTable<u32, u32, Intrinsic, RobinHood> = HashTable::new();
    /// *table.entry(7).or_insert(0) += 1;
    /// *table.entry(7).or_insert(0) += 1;
    /// assert_eq!(table.find(&7), Some(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, P> {
        if key.is_empty_key() {
            return if self.sentinel.is_some() {
                Entry::Occupied(OccupiedEntry {
                    table: self,
                    position: Position::Sentinel,
                })
            } else {
                Entry::Vacant(VacantEntry {
                    table: self,
                    key,
                    hash: 0,
                    slot: None,
                })
            };
        }

        let hash = self.hash_of(&key);
        match self.probe(&key, hash) {
            Probe::Found(slot) => Entry::Occupied(OccupiedEntry {
                table: self,
                position: Position::Slot(slot),
            }),
            Probe::Vacant(slot) => Entry::Vacant(VacantEntry {
                table: self,
                key,
                hash,
                slot: Some(slot),
            }),
        }
    }

    /// Inserts `value` for `key`, returning the previous value.
    ///
    /// An existing key keeps its original stored key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Like [`insert`](Self::insert), but reports allocation failure instead
    /// of aborting.
    ///
    /// On error the table is unchanged and `key`/`value` are dropped.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, TryReserveError> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Ok(Some(entry.insert(value))),
            Entry::Vacant(entry) => entry.try_insert(value).map(|_| None),
        }
    }

    /// Writes a new entry into `slot`, which came from [`Self::probe`] or
    /// [`Self::insertion_slot`] for `hash` on the current arrays.
    pub(crate) fn place(&mut self, slot: usize, hash: u64, key: K, value: V) {
        debug_assert!(self.populated + 1 < self.keys.len());

        if P::ROBIN_HOOD {
            let origin = self.ideal_slot(hash);
            self.place_robin_hood(slot, origin, key, value);
        } else {
            debug_assert!(!self.is_occupied(slot));
            self.keys[slot] = key;
            self.values[slot].write(value);
        }
        self.populated += 1;
    }

    /// Inserts a key known to be absent, without growth checks.
    pub(crate) fn reinsert(&mut self, key: K, value: V) {
        let hash = self.hash_of(&key);
        let slot = self.insertion_slot(hash);
        self.place(slot, hash, key, value);
    }

    /// Removes `key`, returning its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::Linear;
    /// use probe_hash::Intrinsic;
    ///
    /// let mut table: HashTable<u64, u64, Intrinsic, Linear> = HashTable::new();
    /// table.insert(42, 1);
    /// assert_eq!(table.remove(&42), Some(1));
    /// assert_eq!(table.remove(&42), None);
    /// assert!(table.is_empty());
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key`, returning the stored key and its value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        match self.position_of(key)? {
            Position::Slot(slot) => Some(self.remove_at(slot)),
            Position::Sentinel => self.sentinel.take().map(|value| (K::empty(), value)),
        }
    }

    /// Takes the entry out of `slot` and closes the gap by backward shifting.
    pub(crate) fn remove_at(&mut self, slot: usize) -> (K, V) {
        debug_assert!(self.is_occupied(slot));

        let key = core::mem::replace(&mut self.keys[slot], K::empty());
        // SAFETY: The slot was occupied, so its value is initialized; the key
        // is now the empty marker so the value is treated as uninitialized.
        let value = unsafe { self.values[slot].assume_init_read() };
        self.populated -= 1;

        if P::ROBIN_HOOD {
            self.shift_back_robin_hood(slot);
        } else {
            self.shift_back_linear(slot);
        }
        self.verify();

        (key, value)
    }

    /// Closes the gap at `gap` for linear probing.
    ///
    /// Walks forward to the next empty slot; every entry whose drift from its
    /// ideal slot reaches back to the gap moves into it, and the gap moves to
    /// the vacated slot.
    fn shift_back_linear(&mut self, mut gap: usize) {
        let mask = self.mask;
        let mut distance = 0;
        loop {
            distance += 1;
            let slot = (gap + distance) & mask;
            if !self.is_occupied(slot) {
                break;
            }

            let drift = self.probe_distance(slot);
            if drift >= distance {
                self.keys.swap(gap, slot);
                self.values.swap(gap, slot);
                gap = slot;
                distance = 0;
            }
        }
    }

    /// Removes every entry for which `keep` returns `false`, returning how
    /// many were removed.
    ///
    /// `keep` is called exactly once per entry.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) -> usize {
        let mut removed = 0;

        if let Some(value) = self.sentinel.as_mut()
            && !keep(&self.empty_key, value)
        {
            self.sentinel = None;
            removed += 1;
        }

        if self.populated == 0 {
            return removed;
        }

        // Scanning the ring once starting after an empty slot means entries
        // shifted back by a removal always come from the unvisited part.
        let slots = self.keys.len();
        let start = (0..slots)
            .find(|&slot| !self.is_occupied(slot))
            .unwrap_or(0);
        let mut offset = 1;
        while offset < slots {
            let slot = (start + offset) & self.mask;
            if !self.keys[slot].is_empty_key() {
                // SAFETY: The slot is occupied, so its value is initialized.
                let value = unsafe { self.values[slot].assume_init_mut() };
                if !keep(&self.keys[slot], value) {
                    drop(self.remove_at(slot));
                    removed += 1;
                    continue;
                }
            }
            offset += 1;
        }

        removed
    }

    /// Removes all entries, keeping the allocated slot arrays.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::Linear;
    /// use probe_hash::Intrinsic;
    ///
    /// let mut table: HashTable<u64, u64, Intrinsic, Linear> = HashTable::with_capacity(10);
    /// table.insert(1, 1);
    /// table.insert(2, 2);
    /// let slots = table.slot_count();
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.slot_count(), slots);
    /// ```
    pub fn clear(&mut self) {
        for (key, value) in self.keys.iter_mut().zip(self.values.iter_mut()) {
            if !key.is_empty_key() {
                *key = K::empty();
                if core::mem::needs_drop::<V>() {
                    // SAFETY: The slot was occupied, so its value is initialized;
                    // the key has been reset so nothing reads it again.
                    unsafe { value.assume_init_drop() };
                }
            }
        }
        self.populated = 0;
        self.sentinel = None;
    }

    /// Returns an iterator over all entries in slot order, followed by the
    /// empty key if present.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.keys.iter().zip(self.values.iter()),
            sentinel: self.sentinel.as_ref().map(|value| (&self.empty_key, value)),
            remaining: self.len(),
        }
    }

    /// Returns an iterator over all entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len();
        IterMut {
            slots: self.keys.iter().zip(self.values.iter_mut()),
            sentinel: self.sentinel.as_mut().map(|value| (&self.empty_key, value)),
            remaining,
        }
    }

    /// Returns an iterator that removes and yields every entry.
    ///
    /// After the iterator is dropped the table is empty, whether or not it
    /// was run to completion. Entries leave the table one at a time, so a
    /// leaked `Drain` leaves a valid table holding the entries it had not
    /// yet yielded.
    pub fn drain(&mut self) -> Drain<'_, K, V, S, P> {
        Drain {
            table: self,
            slot: 0,
        }
    }

    /// Calls `procedure` for every entry.
    pub fn for_each(&self, mut procedure: impl FnMut(&K, &V)) {
        for (key, value) in self.iter() {
            procedure(key, value);
        }
    }

    /// Calls `predicate` for every entry until it returns `false`.
    ///
    /// Returns `true` if every entry was visited.
    pub fn for_each_while(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> bool {
        for (key, value) in self.iter() {
            if !predicate(key, value) {
                return false;
            }
        }
        true
    }

    /// Removes the first entry at or after `slot`, leaving the table valid.
    ///
    /// Every slot below `slot` is already empty, so the backward shift only
    /// pulls entries into `slot` from ahead of it and `slot` is rechecked
    /// before moving on.
    fn take_next(&mut self, slot: &mut usize) -> Option<(K, V)> {
        while *slot < self.keys.len() {
            if self.is_occupied(*slot) {
                return Some(self.remove_at(*slot));
            }
            *slot += 1;
        }

        self.sentinel.take().map(|value| (K::empty(), value))
    }

    /// Exhaustively checks the structural invariants of the table.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violated invariant.
    #[cfg(any(test, feature = "verify-invariants"))]
    pub fn assert_invariants(&self) {
        let slots = self.keys.len();
        assert!(slots.is_power_of_two() && slots >= MIN_SLOTS);
        assert_eq!(self.mask, slots - 1);
        assert_eq!(self.values.len(), slots);
        assert_eq!(self.origins.len(), if P::ROBIN_HOOD { slots } else { 0 });
        assert!(self.empty_key.is_empty_key());

        let occupied = (0..slots).filter(|&slot| self.is_occupied(slot)).count();
        assert_eq!(occupied, self.populated, "populated count drifted");
        assert!(self.populated < slots, "no free slot left");
        assert!(self.populated <= self.max_pop, "threshold exceeded");

        for slot in 0..slots {
            if !self.is_occupied(slot) {
                continue;
            }
            let ideal = self.ideal_slot(self.hash_of(&self.keys[slot]));
            if P::ROBIN_HOOD {
                assert_eq!(
                    self.origins[slot], ideal,
                    "cached origin of slot {slot} is stale"
                );
            }

            let mut probe = ideal;
            while probe != slot {
                assert!(
                    self.is_occupied(probe),
                    "slot {slot} unreachable from its ideal slot {ideal}: {probe} is empty"
                );
                probe = (probe + 1) & self.mask;
            }

            if P::ROBIN_HOOD {
                let next = (slot + 1) & self.mask;
                if self.is_occupied(next) {
                    assert!(
                        self.probe_distance(next) <= self.probe_distance(slot) + 1,
                        "slot {next} is further from home than robin hood allows"
                    );
                }
            }
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "verify-invariants")] {
        impl<K, V, S, P> HashTable<K, V, S, P>
        where
            K: EmptyKey,
            S: HashStrategy<K>,
            P: ProbePolicy,
        {
            #[inline]
            pub(crate) fn verify(&self) {
                self.assert_invariants();
            }
        }
    } else {
        impl<K, V, S, P> HashTable<K, V, S, P>
        where
            K: EmptyKey,
            S: HashStrategy<K>,
            P: ProbePolicy,
        {
            #[inline(always)]
            pub(crate) fn verify(&self) {}
        }
    }
}

impl<K, S, P> HashTable<K, (), S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Swaps the stored key for `key` in place, returning the old stored key.
    pub(crate) fn replace_key(&mut self, key: K) -> Option<K> {
        match self.position_of(&key)? {
            Position::Slot(slot) => Some(core::mem::replace(&mut self.keys[slot], key)),
            Position::Sentinel => Some(core::mem::replace(&mut self.empty_key, key)),
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, K, V, S, P>
where
    K: EmptyKey,
{
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, S, P>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, S, P>),
}

impl<'a, K, V, S, P> Entry<'a, K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Inserts `default` if the entry is vacant and returns a mutable reference
    /// to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Modifies an occupied entry in place before any potential insertion.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns the entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V, S, P> Entry<'a, K, V, S, P>
where
    K: EmptyKey,
    V: Default,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, K, V, S, P>
where
    K: EmptyKey,
{
    table: &'a mut HashTable<K, V, S, P>,
    key: K,
    hash: u64,
    /// `None` for the empty key.
    slot: Option<usize>,
}

impl<'a, K, V, S, P> VacantEntry<'a, K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Returns the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` and returns a mutable reference to it.
    ///
    /// If the table is at its growth threshold, it grows first and the entry
    /// is placed in the grown table.
    pub fn insert(self, value: V) -> &'a mut V {
        match self.try_insert(value) {
            Ok(value) => value,
            Err(e) => e.handle(),
        }
    }

    /// Like [`insert`](Self::insert), but reports allocation failure instead
    /// of aborting. On error the table is unchanged.
    pub fn try_insert(self, value: V) -> Result<&'a mut V, TryReserveError> {
        let VacantEntry {
            table,
            key,
            hash,
            slot,
        } = self;

        let Some(mut slot) = slot else {
            return Ok(table.sentinel.insert(value));
        };

        if table.populated == table.max_pop {
            table.grow()?;
            slot = table.insertion_slot(hash);
        }
        table.place(slot, hash, key, value);
        table.verify();

        // SAFETY: `place` leaves the new entry in `slot`; displaced entries
        // move only to later slots.
        Ok(unsafe { table.values[slot].assume_init_mut() })
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, K, V, S, P>
where
    K: EmptyKey,
{
    table: &'a mut HashTable<K, V, S, P>,
    position: Position,
}

impl<'a, K, V, S, P> OccupiedEntry<'a, K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Returns the stored key.
    pub fn key(&self) -> &K {
        self.table.key_at(self.position)
    }

    /// Returns a reference to the value.
    pub fn get(&self) -> &V {
        self.table.value_at(self.position)
    }

    /// Returns a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.value_at_mut(self.position)
    }

    /// Converts the entry into a mutable reference bound to the table.
    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { table, position } = self;
        table.value_at_mut(position)
    }

    /// Replaces the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        match self.position {
            Position::Slot(slot) => self.table.remove_at(slot),
            Position::Sentinel => match self.table.sentinel.take() {
                Some(value) => (K::empty(), value),
                None => unreachable!("occupied sentinel entry without a value"),
            },
        }
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// Created by [`HashTable::iter`].
pub struct Iter<'a, K, V> {
    slots: core::iter::Zip<core::slice::Iter<'a, K>, core::slice::Iter<'a, MaybeUninit<V>>>,
    sentinel: Option<(&'a K, &'a V)>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            sentinel: self.sentinel,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: EmptyKey,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        for (key, value) in self.slots.by_ref() {
            if !key.is_empty_key() {
                // SAFETY: Values are initialized exactly where the key is occupied.
                return Some((key, unsafe { value.assume_init_ref() }));
            }
        }
        self.sentinel.take()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> where K: EmptyKey {}

/// An iterator over the entries of a [`HashTable`] with mutable values.
///
/// Created by [`HashTable::iter_mut`].
pub struct IterMut<'a, K, V> {
    slots: core::iter::Zip<core::slice::Iter<'a, K>, core::slice::IterMut<'a, MaybeUninit<V>>>,
    sentinel: Option<(&'a K, &'a mut V)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V>
where
    K: EmptyKey,
{
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        for (key, value) in self.slots.by_ref() {
            if !key.is_empty_key() {
                // SAFETY: Values are initialized exactly where the key is occupied.
                return Some((key, unsafe { value.assume_init_mut() }));
            }
        }
        self.sentinel.take()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> where K: EmptyKey {}

/// A draining iterator over the entries of a [`HashTable`].
///
/// Created by [`HashTable::drain`].
pub struct Drain<'a, K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    table: &'a mut HashTable<K, V, S, P>,
    slot: usize,
}

impl<K, V, S, P> Drop for Drain<'_, K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

impl<K, V, S, P> Iterator for Drain<'_, K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.table.take_next(&mut self.slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.table.len();
        (len, Some(len))
    }
}

/// An owning iterator over the entries of a [`HashTable`].
pub struct IntoIter<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    table: HashTable<K, V, S, P>,
    slot: usize,
}

impl<K, V, S, P> Iterator for IntoIter<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.table.take_next(&mut self.slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.table.len();
        (len, Some(len))
    }
}

impl<K, V, S, P> IntoIterator for HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    type IntoIter = IntoIter<K, V, S, P>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            table: self,
            slot: 0,
        }
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a HashTable<K, V, S, P>
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
