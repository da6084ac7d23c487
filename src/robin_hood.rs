//! Robin Hood displacement and deletion.
//!
//! Each occupied slot caches the index of its entry's ideal slot in
//! `origins`, so probe distances are read without rehashing. Insertion keeps
//! entries ordered by distance within a cluster: a probing entry takes the
//! slot of the first occupant that is closer to home than itself, and that
//! occupant continues probing instead. As a result `dist(i + 1) <= dist(i) + 1`
//! holds for all adjacent occupied slots, which lets lookups and deletions stop
//! early.

use core::mem;

use crate::hash_table::HashTable;
use crate::hash_table::ProbePolicy;
use crate::sentinel::EmptyKey;
use crate::strategy::HashStrategy;

impl<K, V, S, P> HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Writes a new entry with ideal slot `origin` into `slot`, carrying any
    /// displaced occupants forward until one lands in an empty slot.
    pub(crate) fn place_robin_hood(&mut self, slot: usize, origin: usize, key: K, value: V) {
        debug_assert!(P::ROBIN_HOOD);

        if !self.is_occupied(slot) {
            self.keys[slot] = key;
            self.values[slot].write(value);
            self.origins[slot] = origin;
            return;
        }

        let mut carried_key = mem::replace(&mut self.keys[slot], key);
        // SAFETY: The slot was occupied, so its value is initialized. It is
        // overwritten immediately below.
        let mut carried_value = unsafe { self.values[slot].assume_init_read() };
        self.values[slot].write(value);
        let mut carried_origin = mem::replace(&mut self.origins[slot], origin);

        let mut distance = slot.wrapping_sub(carried_origin) & self.mask;
        let mut slot = slot;
        loop {
            slot = (slot + 1) & self.mask;
            distance += 1;

            if !self.is_occupied(slot) {
                self.keys[slot] = carried_key;
                self.values[slot].write(carried_value);
                self.origins[slot] = carried_origin;
                return;
            }

            let incumbent = self.probe_distance(slot);
            if incumbent < distance {
                mem::swap(&mut self.keys[slot], &mut carried_key);
                mem::swap(&mut self.origins[slot], &mut carried_origin);
                // SAFETY: The slot is occupied, so its value is initialized. It
                // is overwritten immediately with the carried value.
                let displaced = unsafe { self.values[slot].assume_init_read() };
                self.values[slot].write(carried_value);
                carried_value = displaced;
                distance = incumbent;
            }
        }
    }

    /// Closes the gap at `gap` after a removal.
    ///
    /// Successors move back one slot each until an empty slot or an entry
    /// already in its ideal slot is reached.
    pub(crate) fn shift_back_robin_hood(&mut self, mut gap: usize) {
        debug_assert!(P::ROBIN_HOOD);

        loop {
            let next = (gap + 1) & self.mask;
            if !self.is_occupied(next) || self.probe_distance(next) == 0 {
                break;
            }
            self.keys.swap(gap, next);
            self.values.swap(gap, next);
            self.origins[gap] = self.origins[next];
            gap = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use core::cell::Cell;

    use crate::hash_table::HashTable;
    use crate::hash_table::Linear;
    use crate::hash_table::ProbePolicy;
    use crate::hash_table::RobinHood;
    use crate::strategy::HashStrategy;
    use crate::strategy::mix;

    /// Smallest hash whose ideal slot is `slot` in an 8-slot table with a
    /// zero perturbation.
    fn landing(slot: usize) -> u64 {
        (1u64..)
            .find(|&h| mix(h, 0) as usize & 7 == slot)
            .unwrap()
    }

    /// Places each key at a chosen ideal slot and counts comparisons.
    struct Scripted {
        ideals: Vec<(u64, u64)>,
        compares: Cell<usize>,
    }

    impl Scripted {
        fn new(ideals: &[(u64, usize)]) -> Self {
            Self {
                ideals: ideals.iter().map(|&(k, slot)| (k, landing(slot))).collect(),
                compares: Cell::new(0),
            }
        }
    }

    impl HashStrategy<u64> for Scripted {
        fn hash_key(&self, key: &u64) -> u64 {
            self.ideals
                .iter()
                .find(|(k, _)| k == key)
                .map(|&(_, h)| h)
                .unwrap()
        }

        fn equals(&self, a: &u64, b: &u64) -> bool {
            self.compares.set(self.compares.get() + 1);
            a == b
        }
    }

    fn scripted<P: ProbePolicy>(ideals: &[(u64, usize)]) -> HashTable<u64, u64, Scripted, P> {
        let table =
            HashTable::with_capacity_load_factor_and_strategy(4, 0.75, Scripted::new(ideals))
                .with_perturbation(0);
        assert_eq!(table.slot_count(), 8);
        table
    }

    #[test]
    fn displacement_lowers_max_distance() {
        let ideals = [(5, 1), (9, 0), (13, 0)];
        let mut linear = scripted::<Linear>(&ideals);
        let mut robin_hood = scripted::<RobinHood>(&ideals);
        for key in [5, 9, 13] {
            linear.insert(key, key * 10);
            robin_hood.insert(key, key * 10);
        }

        assert_eq!(linear.max_probe_distance(), 2);
        assert_eq!(robin_hood.max_probe_distance(), 1);
        robin_hood.assert_invariants();

        // 13 took the slot of 5, which moved on.
        assert_eq!(robin_hood.keys[1], 13);
        assert_eq!(robin_hood.keys[2], 5);
        for key in [5, 9, 13] {
            assert_eq!(robin_hood.find(&key), Some(&(key * 10)));
        }
    }

    #[test]
    fn full_collision_distances() {
        let ideals = [(1, 3), (2, 3), (3, 3)];
        let mut table = scripted::<RobinHood>(&ideals);
        for key in [1, 2, 3] {
            table.insert(key, key);
        }
        let mut distances: Vec<usize> = (0..8)
            .filter(|&slot| table.is_occupied(slot))
            .map(|slot| table.probe_distance(slot))
            .collect();
        distances.sort_unstable();
        assert_eq!(distances, [0, 1, 2]);
    }

    #[test]
    fn lookup_stops_at_richer_entry() {
        let ideals = [(1, 0), (2, 0), (3, 1), (4, 2), (5, 1)];

        let mut robin_hood = scripted::<RobinHood>(&ideals);
        let mut linear = scripted::<Linear>(&ideals);
        for key in [1, 2, 3, 4] {
            robin_hood.insert(key, key);
            linear.insert(key, key);
        }

        robin_hood.strategy().compares.set(0);
        assert_eq!(robin_hood.find(&5), None);
        assert_eq!(robin_hood.strategy().compares.get(), 2);

        linear.strategy().compares.set(0);
        assert_eq!(linear.find(&5), None);
        assert_eq!(linear.strategy().compares.get(), 3);
    }

    #[test]
    fn removal_stops_at_home_entry() {
        let ideals = [(1, 0), (2, 0), (3, 2), (4, 2)];
        let mut table = scripted::<RobinHood>(&ideals);
        for key in [1, 2, 3, 4] {
            table.insert(key, key);
        }
        // Slots: 0 -> 1, 1 -> 2, 2 -> 3, 3 -> 4
        assert_eq!(table.keys[..4], [1, 2, 3, 4]);

        assert_eq!(table.remove(&1), Some(1));
        table.assert_invariants();
        // 2 moves home; 3 is already home so nothing after it moves.
        assert_eq!(table.keys[..4], [2, 0, 3, 4]);
        assert_eq!(table.origins[0], 0);
    }

    #[test]
    fn removal_keeps_wrapped_cluster_reachable() {
        let ideals = [(1, 6), (2, 6), (3, 7), (4, 7), (5, 0)];
        let mut table = scripted::<RobinHood>(&ideals);
        for key in [1, 2, 3, 4, 5] {
            table.insert(key, key);
        }
        table.assert_invariants();
        assert_eq!(table.remove(&2), Some(2));
        table.assert_invariants();
        for key in [1, 3, 4, 5] {
            assert_eq!(table.find(&key), Some(&key));
        }
        assert_eq!(table.remove(&1), Some(1));
        assert_eq!(table.remove(&3), Some(3));
        table.assert_invariants();
        assert_eq!(table.find(&4), Some(&4));
        assert_eq!(table.find(&5), Some(&5));
    }
}
