//! Slot array allocation and rehashing.
//!
//! New arrays are always allocated in full before the table is touched, so a
//! failed allocation leaves the table exactly as it was. Entries are then
//! moved from the old arrays, highest index first, into the new ones.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::mem;
use core::mem::MaybeUninit;

use crate::error::TryReserveError;
use crate::hash_table::HashTable;
use crate::hash_table::ProbePolicy;
use crate::hash_table::growth_threshold;
use crate::hash_table::slots_for;
use crate::sentinel::EmptyKey;
use crate::strategy::HashStrategy;

/// Freshly allocated, empty slot arrays.
pub(crate) struct SlotArrays<K, V> {
    pub(crate) keys: Box<[K]>,
    pub(crate) values: Box<[MaybeUninit<V>]>,
    pub(crate) origins: Box<[usize]>,
}

fn try_filled<T>(len: usize, fill: impl FnMut() -> T) -> Result<Box<[T]>, TryReserveError> {
    let layout = Layout::array::<T>(len).map_err(|_| TryReserveError::CapacityOverflow)?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| TryReserveError::AllocError { layout })?;
    buffer.resize_with(len, fill);
    Ok(buffer.into_boxed_slice())
}

impl<K: EmptyKey, V> SlotArrays<K, V> {
    /// Allocates `slots` empty slots; the origin array is only allocated for
    /// Robin Hood tables.
    pub(crate) fn allocate(slots: usize, robin_hood: bool) -> Result<Self, TryReserveError> {
        debug_assert!(slots.is_power_of_two());

        let keys = try_filled(slots, K::empty)?;
        let values = try_filled(slots, MaybeUninit::uninit)?;
        let origins = if robin_hood {
            try_filled(slots, || 0)?
        } else {
            Box::default()
        };

        Ok(Self {
            keys,
            values,
            origins,
        })
    }
}

impl<K, V, S, P> HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Moves every entry into freshly allocated arrays of `slots` slots.
    pub(crate) fn try_resize_to(&mut self, slots: usize) -> Result<(), TryReserveError> {
        debug_assert!(slots > self.populated + 1);

        let fresh = SlotArrays::allocate(slots, P::ROBIN_HOOD)?;

        let mut old_keys = mem::replace(&mut self.keys, fresh.keys);
        let old_values = mem::replace(&mut self.values, fresh.values);
        self.origins = fresh.origins;
        self.mask = slots - 1;
        self.max_pop = growth_threshold(slots, self.load_factor);

        let live = self.populated;
        self.populated = 0;
        for slot in (0..old_keys.len()).rev() {
            if old_keys[slot].is_empty_key() {
                continue;
            }
            let key = mem::replace(&mut old_keys[slot], K::empty());
            // SAFETY: The slot was occupied, so its value is initialized. The
            // old arrays are dropped without touching it again.
            let value = unsafe { old_values[slot].assume_init_read() };
            self.reinsert(key, value);
        }
        debug_assert_eq!(self.populated, live);

        self.verify();
        Ok(())
    }

    /// Grows the slot array ahead of inserting one more key.
    ///
    /// The new size at least doubles the current one.
    pub(crate) fn grow(&mut self) -> Result<(), TryReserveError> {
        let doubled = self
            .keys
            .len()
            .checked_mul(2)
            .ok_or(TryReserveError::CapacityOverflow)?;
        let needed = slots_for(self.populated + 1, self.load_factor)?;
        self.try_resize_to(doubled.max(needed))
    }

    /// Ensures `additional` more entries fit without growing.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows, and aborts via
    /// [`handle_alloc_error`](alloc::alloc::handle_alloc_error) if the
    /// allocation fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::Linear;
    /// use probe_hash::Intrinsic;
    ///
    /// let mut table: HashTable<u32, (), Intrinsic, Linear> = HashTable::new();
    /// table.reserve(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        if let Err(e) = self.try_reserve(additional) {
            e.handle();
        }
    }

    /// Ensures `additional` more entries fit without growing, reporting
    /// failure instead of aborting. On error the table is unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::hash_table::HashTable;
    /// use probe_hash::hash_table::RobinHood;
    /// use probe_hash::Intrinsic;
    /// use probe_hash::TryReserveError;
    ///
    /// let mut table: HashTable<u32, (), Intrinsic, RobinHood> = HashTable::new();
    /// table.insert(1, ());
    /// assert_eq!(table.try_reserve(usize::MAX), Err(TryReserveError::CapacityOverflow));
    /// assert!(table.contains(&1));
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let required = self
            .populated
            .checked_add(additional)
            .ok_or(TryReserveError::CapacityOverflow)?;
        if required <= self.max_pop {
            return Ok(());
        }

        let slots = slots_for(required, self.load_factor)?;
        self.try_resize_to(slots)
    }

    /// Shrinks the slot array to the smallest size that holds the current
    /// entries.
    pub fn shrink_to_fit(&mut self) {
        let slots = slots_for(self.populated, self.load_factor).unwrap_or_else(|e| e.handle());
        if slots < self.keys.len()
            && let Err(e) = self.try_resize_to(slots)
        {
            e.handle();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;

    use crate::error::TryReserveError;
    use crate::hash_table::HashTable;
    use crate::hash_table::Linear;
    use crate::hash_table::ProbePolicy;
    use crate::hash_table::RobinHood;
    use crate::strategy::Intrinsic;

    type Table<P> = HashTable<u64, String, Intrinsic, P>;

    fn fixed<P: ProbePolicy>(capacity: usize) -> Table<P> {
        HashTable::with_capacity_load_factor_and_strategy(capacity, 0.75, Intrinsic)
    }

    fn grows_exactly_at_threshold<P: ProbePolicy>() {
        let mut table = fixed::<P>(0);
        assert_eq!(table.slot_count(), 4);
        assert_eq!(table.capacity(), 2);

        table.insert(1, "1".to_string());
        table.insert(2, "2".to_string());
        assert_eq!(table.slot_count(), 4);

        // Overwriting at the threshold never grows.
        table.insert(2, "two".to_string());
        assert_eq!(table.slot_count(), 4);

        table.insert(3, "3".to_string());
        assert_eq!(table.slot_count(), 8);
        assert_eq!(table.capacity(), 6);
        table.assert_invariants();
        assert_eq!(table.find(&2).map(String::as_str), Some("two"));
    }

    #[test]
    fn grows_exactly_at_threshold_linear() {
        grows_exactly_at_threshold::<Linear>();
    }

    #[test]
    fn grows_exactly_at_threshold_robin_hood() {
        grows_exactly_at_threshold::<RobinHood>();
    }

    fn insert_many<P: ProbePolicy>() {
        let mut table = fixed::<P>(0);
        for k in 1..=5000u64 {
            table.insert(k, k.to_string());
            assert!(table.len() <= table.capacity());
        }
        table.assert_invariants();
        assert_eq!(table.len(), 5000);
        assert!(table.slot_count().is_power_of_two());
        for k in 1..=5000u64 {
            assert_eq!(table.find(&k), Some(&k.to_string()));
        }
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many_linear() {
        insert_many::<Linear>();
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many_robin_hood() {
        insert_many::<RobinHood>();
    }

    #[test]
    fn reserve_avoids_growth() {
        let mut table = fixed::<RobinHood>(0);
        table.reserve(100);
        let slots = table.slot_count();
        assert!(table.capacity() >= 100);
        for k in 1..=100u64 {
            table.insert(k, k.to_string());
        }
        assert_eq!(table.slot_count(), slots);

        // Already satisfied.
        table.reserve(0);
        assert_eq!(table.slot_count(), slots);
    }

    #[test]
    fn failed_reserve_leaves_table_untouched() {
        let mut table = fixed::<Linear>(0);
        table.insert(7, "seven".to_string());
        table.insert(0, "zero".to_string());
        let slots = table.slot_count();

        assert_eq!(
            table.try_reserve(usize::MAX),
            Err(TryReserveError::CapacityOverflow)
        );
        assert_eq!(
            table.try_reserve(usize::MAX / 4),
            Err(TryReserveError::CapacityOverflow)
        );
        assert_eq!(table.slot_count(), slots);
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(&7).map(String::as_str), Some("seven"));
        assert_eq!(table.find(&0).map(String::as_str), Some("zero"));
        table.assert_invariants();
    }

    fn refused_allocation_leaves_table_untouched<P: ProbePolicy>() {
        let mut table: HashTable<u8, (), Intrinsic, P> = HashTable::new();
        table.insert(7, ());
        table.insert(0, ());
        let slots = table.slot_count();

        // Sized below the layout limit, so the allocator itself refuses.
        let result = table.try_reserve(1 << 60);
        assert!(
            matches!(result, Err(TryReserveError::AllocError { .. })),
            "{result:?}"
        );
        assert_eq!(table.slot_count(), slots);
        assert_eq!(table.len(), 2);
        assert!(table.contains(&7));
        assert!(table.contains(&0));
        table.assert_invariants();

        table.insert(9, ());
        assert!(table.contains(&9));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn refused_allocation_leaves_table_untouched_linear() {
        refused_allocation_leaves_table_untouched::<Linear>();
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn refused_allocation_leaves_table_untouched_robin_hood() {
        refused_allocation_leaves_table_untouched::<RobinHood>();
    }

    fn shrink_to_fit_keeps_entries<P: ProbePolicy>() {
        let mut table = fixed::<P>(1000);
        let slots = table.slot_count();
        for k in 1..=10u64 {
            table.insert(k, k.to_string());
        }
        table.shrink_to_fit();
        assert!(table.slot_count() < slots);
        assert_eq!(table.slot_count(), 16);
        table.assert_invariants();
        for k in 1..=10u64 {
            assert_eq!(table.find(&k), Some(&k.to_string()));
        }

        table.clear();
        table.shrink_to_fit();
        assert_eq!(table.slot_count(), 4);
    }

    #[test]
    fn shrink_to_fit_keeps_entries_linear() {
        shrink_to_fit_keeps_entries::<Linear>();
    }

    #[test]
    fn shrink_to_fit_keeps_entries_robin_hood() {
        shrink_to_fit_keeps_entries::<RobinHood>();
    }

    #[test]
    fn growth_keeps_perturbation() {
        let mut table = fixed::<RobinHood>(0).with_perturbation(77);
        for k in 1..=100u64 {
            table.insert(k, k.to_string());
        }
        assert_eq!(table.perturbation(), 77);
        table.assert_invariants();
    }

    #[test]
    fn reperturbing_rehashes_entries() {
        let mut table = fixed::<Linear>(0);
        for k in 1..=50u64 {
            table.insert(k, k.to_string());
        }
        let table = table.with_perturbation(12345);
        table.assert_invariants();
        for k in 1..=50u64 {
            assert_eq!(table.find(&k), Some(&k.to_string()));
        }
    }
}
