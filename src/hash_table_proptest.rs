// Property tests for the table engine, kept inside the crate so they can
// check internal layout and invariants directly.

use std::collections::HashMap as StdHashMap;

use proptest::prelude::*;

use crate::hash_map::HashMap;
use crate::hash_table::HashTable;
use crate::hash_table::Linear;
use crate::hash_table::ProbePolicy;
use crate::hash_table::RobinHood;
use crate::strategy::HashStrategy;
use crate::strategy::Intrinsic;

// Keeps only a few hash bits so random keys pile into long clusters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct FewBits;

impl HashStrategy<u32> for FewBits {
    fn hash_key(&self, key: &u32) -> u64 {
        u64::from(*key & 0x7)
    }

    fn equals(&self, a: &u32, b: &u32) -> bool {
        a == b
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, i64),
    Remove(u32),
    Get(u32),
    RetainOdd,
    Clear,
    Reserve(u8),
    Shrink,
}

// Keys come from a small domain that includes the empty key so that
// inserts, removes and the out-of-band slot interact often.
fn arb_op() -> impl Strategy<Value = Op> {
    let key = 0u32..48;
    prop_oneof![
        6 => (key.clone(), any::<i64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.prop_map(Op::Get),
        1 => Just(Op::RetainOdd),
        1 => Just(Op::Clear),
        1 => any::<u8>().prop_map(Op::Reserve),
        1 => Just(Op::Shrink),
    ]
}

fn run_model<S, P>(strategy: S, load_factor: f64, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: HashStrategy<u32>,
    P: ProbePolicy,
{
    let mut sut: HashTable<u32, i64, S, P> =
        HashTable::with_capacity_load_factor_and_strategy(0, load_factor, strategy);
    let mut model: StdHashMap<u32, i64> = StdHashMap::new();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let slots = sut.slot_count();
                let present = model.contains_key(&k);
                let at_threshold = sut.populated == sut.max_pop;
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
                if present || k == 0 || !at_threshold {
                    prop_assert_eq!(sut.slot_count(), slots, "grew without need");
                } else {
                    prop_assert!(sut.slot_count() > slots, "did not grow at threshold");
                }
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                prop_assert_eq!(sut.remove(&k), None);
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.find(&k), model.get(&k));
                prop_assert_eq!(sut.contains(&k), model.contains_key(&k));
            }
            Op::RetainOdd => {
                let before = model.len();
                model.retain(|_, v| *v % 2 != 0);
                let removed = sut.retain(|_, v| *v % 2 != 0);
                prop_assert_eq!(removed, before - model.len());
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::Reserve(n) => {
                sut.reserve(usize::from(n));
                prop_assert!(sut.capacity() >= sut.populated + usize::from(n));
            }
            Op::Shrink => sut.shrink_to_fit(),
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.populated as f64 <= sut.slot_count() as f64 * load_factor);
    }

    let mut seen: Vec<(u32, i64)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
    let mut expected: Vec<(u32, i64)> = model.into_iter().collect();
    seen.sort_unstable();
    expected.sort_unstable();
    prop_assert_eq!(seen, expected);
    Ok(())
}

fn layout_distances<S, P>(table: &HashTable<u32, (), S, P>) -> usize
where
    S: HashStrategy<u32>,
    P: ProbePolicy,
{
    table.max_probe_distance()
}

// Properties checked against std::collections::HashMap across random
// operation sequences:
// - every operation agrees with the model, including the empty key;
// - growth happens exactly when a new key meets a full threshold;
// - structural invariants (reachability, cached origins, distance ordering,
//   population counts) hold after every step;
// - population never exceeds slots * load factor;
// - a second removal of the same key is a no-op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]

    #[test]
    fn prop_linear_matches_model(ops in proptest::collection::vec(arb_op(), 1..120)) {
        run_model::<_, Linear>(Intrinsic, 0.75, ops)?;
    }

    #[test]
    fn prop_robin_hood_matches_model(ops in proptest::collection::vec(arb_op(), 1..120)) {
        run_model::<_, RobinHood>(Intrinsic, 0.75, ops)?;
    }

    #[test]
    fn prop_clustered_linear_matches_model(
        ops in proptest::collection::vec(arb_op(), 1..120),
        load_factor in 0.3f64..=1.0,
    ) {
        run_model::<_, Linear>(FewBits, load_factor, ops)?;
    }

    #[test]
    fn prop_clustered_robin_hood_matches_model(
        ops in proptest::collection::vec(arb_op(), 1..120),
        load_factor in 0.3f64..=1.0,
    ) {
        run_model::<_, RobinHood>(FewBits, load_factor, ops)?;
    }

    // For the same keys, seed and load factor both policies occupy the same
    // slots, and Robin Hood orders each cluster by ideal slot, which never
    // lengthens the longest probe.
    #[test]
    fn prop_robin_hood_max_distance_not_worse(
        keys in proptest::collection::vec(1u32..10_000, 1..200),
        perturbation in any::<u64>(),
    ) {
        let mut linear: HashTable<u32, (), Intrinsic, Linear> =
            HashTable::with_capacity(0).with_perturbation(perturbation);
        let mut robin_hood: HashTable<u32, (), Intrinsic, RobinHood> =
            HashTable::with_capacity(0).with_perturbation(perturbation);
        for &k in &keys {
            linear.insert(k, ());
            robin_hood.insert(k, ());
        }
        prop_assert_eq!(linear.slot_count(), robin_hood.slot_count());
        prop_assert!(layout_distances(&robin_hood) <= layout_distances(&linear));
    }

    // Storing or removing the empty key never touches the slot arrays.
    #[test]
    fn prop_empty_key_is_isolated(keys in proptest::collection::vec(1u32..1_000, 0..64)) {
        let mut table: HashTable<u32, u32, Intrinsic, RobinHood> = HashTable::new();
        for &k in &keys {
            table.insert(k, k);
        }
        let before = table.keys.clone();
        let populated = table.populated;

        table.insert(0, 7);
        prop_assert_eq!(&table.keys, &before);
        prop_assert_eq!(table.populated, populated);
        prop_assert_eq!(table.find(&0), Some(&7));

        prop_assert_eq!(table.remove(&0), Some(7));
        prop_assert_eq!(&table.keys, &before);
        prop_assert_eq!(table.len(), populated);
    }

    // Maps with the same contents are equal and hash alike regardless of
    // insertion order, capacity or seed.
    #[test]
    fn prop_equal_contents_equal_maps(
        entries in proptest::collection::btree_map(0u32..500, any::<u16>(), 0..80),
        capacity in 0usize..256,
    ) {
        let forward: HashMap<u32, u16> = entries.iter().map(|(k, v)| (*k, *v)).collect();
        let mut backward: HashMap<u32, u16> = HashMap::with_capacity(capacity);
        for (k, v) in entries.iter().rev() {
            backward.insert(*k, *v);
        }
        prop_assert!(forward == backward);
        prop_assert_eq!(forward.content_hash(), backward.content_hash());

        let cloned = forward.clone();
        prop_assert!(cloned == forward);
        prop_assert_eq!(cloned.table().perturbation(), forward.table().perturbation());
    }
}
