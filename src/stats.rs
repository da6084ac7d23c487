//! Probe-length statistics for analysing table layouts.
//!
//! Compiled with the `stats` feature (and always in tests).

use alloc::vec;
use alloc::vec::Vec;

use crate::hash_table::HashTable;
use crate::hash_table::ProbePolicy;
use crate::sentinel::EmptyKey;
use crate::strategy::HashStrategy;

/// Number of entries at each probe distance.
///
/// `bins[d]` counts the entries stored `d` slots after their ideal slot. The
/// empty key is stored out-of-band and never appears here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    /// Entry counts indexed by probe distance.
    pub bins: Vec<usize>,
}

impl ProbeHistogram {
    /// Total number of entries counted.
    pub fn entries(&self) -> usize {
        self.bins.iter().sum()
    }

    /// Largest probe distance with at least one entry.
    pub fn max_distance(&self) -> usize {
        self.bins.iter().rposition(|&count| count > 0).unwrap_or(0)
    }

    /// Average probe distance, or zero for an empty table.
    pub fn mean_distance(&self) -> f64 {
        let entries = self.entries();
        if entries == 0 {
            return 0.0;
        }
        let total: usize = self
            .bins
            .iter()
            .enumerate()
            .map(|(distance, &count)| distance * count)
            .sum();
        total as f64 / entries as f64
    }

    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.bins.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.entries());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (distance, &count) in self.bins.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// Debug statistics for hash table analysis.
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries in the slot array
    pub populated: usize,
    /// Whether the empty key is stored out-of-band
    pub has_empty_key: bool,
    /// Maximum population before growth
    pub capacity: usize,
    /// Total number of slots allocated
    pub total_slots: usize,
    /// Configured load factor
    pub load_factor: f64,
    /// Slot utilization (populated / total_slots)
    pub slot_utilization: f64,
    /// Longest probe distance of any entry
    pub max_probe_distance: usize,
    /// Average probe distance
    pub mean_probe_distance: f64,
    /// Total memory in bytes used by the slot arrays
    pub total_bytes: usize,
    /// Bytes held by unoccupied slots
    pub wasted_bytes: usize,
}

impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} (configured load factor {:.2})",
            self.populated, self.capacity, self.load_factor
        );
        println!(
            "Slot Usage: {}/{} ({:.2}% utilization)",
            self.populated,
            self.total_slots,
            self.slot_utilization * 100.0
        );
        println!("Empty key present: {}", self.has_empty_key);
        println!(
            "Probe distance: max {}, mean {:.3}",
            self.max_probe_distance, self.mean_probe_distance
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

impl<K, V, S, P> HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Computes a histogram of probe distances for the current table state.
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut bins = vec![0usize; 1];
        for slot in 0..self.keys.len() {
            if !self.is_occupied(slot) {
                continue;
            }
            let distance = self.probe_distance(slot);
            if distance >= bins.len() {
                bins.resize(distance + 1, 0);
            }
            bins[distance] += 1;
        }
        ProbeHistogram { bins }
    }

    /// Longest probe distance of any entry in the slot array.
    pub fn max_probe_distance(&self) -> usize {
        (0..self.keys.len())
            .filter(|&slot| self.is_occupied(slot))
            .map(|slot| self.probe_distance(slot))
            .max()
            .unwrap_or(0)
    }

    /// Returns detailed utilization statistics for debugging.
    pub fn debug_stats(&self) -> DebugStats {
        let total_slots = self.keys.len();
        let histogram = self.probe_histogram();
        let per_slot = core::mem::size_of::<K>()
            + core::mem::size_of::<V>()
            + if P::ROBIN_HOOD {
                core::mem::size_of::<usize>()
            } else {
                0
            };

        DebugStats {
            populated: self.populated,
            has_empty_key: self.sentinel.is_some(),
            capacity: self.max_pop,
            total_slots,
            load_factor: self.load_factor,
            slot_utilization: self.populated as f64 / total_slots as f64,
            max_probe_distance: histogram.max_distance(),
            mean_probe_distance: histogram.mean_distance(),
            total_bytes: total_slots * per_slot,
            wasted_bytes: (total_slots - self.populated) * per_slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::hash_table::HashTable;
    use crate::hash_table::Linear;
    use crate::hash_table::RobinHood;
    use crate::strategy::HashStrategy;
    use crate::strategy::Intrinsic;

    #[derive(Default)]
    struct Colliding;

    impl HashStrategy<u32> for Colliding {
        fn hash_key(&self, _key: &u32) -> u64 {
            0
        }

        fn equals(&self, a: &u32, b: &u32) -> bool {
            a == b
        }
    }

    #[test]
    fn histogram_of_single_cluster() {
        let mut table: HashTable<u32, (), Colliding, Linear> = HashTable::with_capacity(8);
        for k in 1..=5u32 {
            table.insert(k, ());
        }
        let histogram = table.probe_histogram();
        assert_eq!(histogram.bins, [1, 1, 1, 1, 1]);
        assert_eq!(histogram.entries(), 5);
        assert_eq!(histogram.max_distance(), 4);
        assert_eq!(histogram.mean_distance(), 2.0);
        assert_eq!(table.max_probe_distance(), 4);
    }

    #[test]
    fn empty_table_stats() {
        let table: HashTable<u32, u64, Intrinsic, RobinHood> = HashTable::new();
        let stats = table.debug_stats();
        assert_eq!(stats.populated, 0);
        assert_eq!(stats.max_probe_distance, 0);
        assert_eq!(stats.wasted_bytes, stats.total_bytes);
        assert_eq!(table.probe_histogram().mean_distance(), 0.0);
    }

    #[test]
    fn stats_ignore_empty_key() {
        let mut table: HashTable<u32, (), Intrinsic, Linear> = HashTable::new();
        table.insert(0, ());
        table.insert(9, ());
        let stats = table.debug_stats();
        assert_eq!(stats.populated, 1);
        assert!(stats.has_empty_key);
        assert_eq!(table.probe_histogram().entries(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    #[cfg(feature = "std")]
    fn histogram_output() {
        let mut table: HashTable<u64, u64, Intrinsic, RobinHood> = HashTable::with_capacity(10000);
        for k in 1..=table.capacity() as u64 {
            table.insert(k, k);
        }

        table.probe_histogram().print();
        table.debug_stats().print();
    }
}
