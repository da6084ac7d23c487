use std::hash::BuildHasher;

use foldhash::fast::FixedState;
use probe_hash::HashMap;
use probe_hash::HashSet;
use probe_hash::HashStrategy;
use probe_hash::Intrinsic;
use probe_hash::RobinHoodHashMap;
use probe_hash::RobinHoodHashSet;
use probe_hash::hash_table::Linear;
use probe_hash::hash_table::ProbePolicy;
use probe_hash::hash_table::RobinHood;
use probe_hash::strategy::mix;

/// Places chosen keys at chosen ideal slots of an 8-slot table seeded with a
/// zero perturbation.
#[derive(Clone, Debug, PartialEq)]
struct Scripted(Vec<(u32, usize)>);

impl Scripted {
    fn landing(slot: usize) -> u64 {
        (1u64..)
            .find(|&h| mix(h, 0) as usize & 7 == slot)
            .unwrap()
    }
}

impl HashStrategy<u32> for Scripted {
    fn hash_key(&self, key: &u32) -> u64 {
        let (_, slot) = self.0.iter().find(|(k, _)| k == key).unwrap();
        Self::landing(*slot)
    }

    fn equals(&self, a: &u32, b: &u32) -> bool {
        a == b
    }
}

/// Every key hashes alike, so all keys form one probe chain.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Colliding;

impl HashStrategy<u32> for Colliding {
    fn hash_key(&self, _key: &u32) -> u64 {
        0
    }

    fn equals(&self, a: &u32, b: &u32) -> bool {
        a == b
    }
}

/// Keyed hashing; two instances are equal only when their seeds are.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Seeded(u64);

impl HashStrategy<u64> for Seeded {
    fn hash_key(&self, key: &u64) -> u64 {
        FixedState::with_seed(self.0).hash_one(key)
    }

    fn equals(&self, a: &u64, b: &u64) -> bool {
        a == b
    }
}

fn max_distance<S, P>(set: &HashSet<u32, S, P>) -> usize
where
    S: HashStrategy<u32>,
    P: ProbePolicy,
{
    let mask = set.slot_count() - 1;
    let perturbation = set.table().perturbation();
    let mut cursors = set.cursors();
    let mut max = 0;
    while let Some(cursor) = cursors.advance() {
        if cursor.index() > mask {
            continue;
        }
        let ideal = mix(set.strategy().hash_key(cursor.key()), perturbation) as usize & mask;
        max = max.max(cursor.index().wrapping_sub(ideal) & mask);
    }
    max
}

#[test]
fn growth_doubles_and_respects_load_factor() {
    let mut map: HashMap<u32, u32> =
        HashMap::with_capacity_load_factor_and_strategy(16, 0.75, Intrinsic);
    assert!(map.capacity() >= 16);

    let mut slots = map.slot_count();
    for k in 1..=1000u32 {
        map.insert(k, k * 2);

        let now = map.slot_count();
        assert!(now == slots || now == slots * 2, "{slots} -> {now}");
        slots = now;
        assert!(map.len() <= map.capacity());
        assert!(map.len() as f64 <= map.slot_count() as f64 * 0.75);
    }

    assert_eq!(map.len(), 1000);
    for k in 1..=1000u32 {
        assert_eq!(map.get(&k), Some(&(k * 2)));
    }
}

#[test]
fn robin_hood_levels_probe_distances() {
    let script = Scripted(vec![(5, 1), (9, 0), (13, 0)]);

    let mut robin_hood: RobinHoodHashSet<u32, Scripted> =
        HashSet::with_capacity_load_factor_and_strategy(4, 0.75, script.clone())
            .with_perturbation(0);
    let mut linear: HashSet<u32, Scripted, Linear> =
        HashSet::with_capacity_load_factor_and_strategy(4, 0.75, script)
            .with_perturbation(0);
    assert_eq!(robin_hood.slot_count(), 8);

    for key in [5, 9, 13] {
        assert!(robin_hood.insert(key));
        assert!(linear.insert(key));
    }
    for key in [5, 9, 13] {
        assert!(robin_hood.contains(&key));
    }

    assert_eq!(max_distance(&robin_hood), 1);
    assert_eq!(max_distance(&linear), 2);
}

#[test]
fn full_collision_chain_distances() {
    let script = Scripted(vec![(5, 2), (9, 2), (13, 2)]);
    let mut set: RobinHoodHashSet<u32, Scripted> =
        HashSet::with_capacity_load_factor_and_strategy(4, 0.75, script)
            .with_perturbation(0);
    for key in [5, 9, 13] {
        set.insert(key);
    }
    assert_eq!(max_distance(&set), 2);
}

fn backward_shift_keeps_chain<P: ProbePolicy>() {
    let mut set: HashSet<u32, Colliding, P> = HashSet::with_capacity(16);
    let keys: Vec<u32> = (1..=10).collect();
    for &k in &keys {
        set.insert(k);
    }

    // Slot order along the single chain.
    let mut chain = Vec::new();
    let mut cursors = set.cursors();
    while let Some(cursor) = cursors.advance() {
        chain.push((cursor.index(), *cursor.key()));
    }
    assert_eq!(chain.len(), 10);

    let start = Colliding.hash_key(&1);
    let mask = set.slot_count() - 1;
    let ideal = mix(start, set.table().perturbation()) as usize & mask;
    chain.sort_by_key(|(index, _)| index.wrapping_sub(ideal) & mask);
    let victim = chain[3].1;

    assert!(set.remove(&victim));
    for &k in &keys {
        assert_eq!(set.contains(&k), k != victim, "key {k}");
    }
    assert_eq!(set.len(), 9);
}

#[test]
fn backward_shift_keeps_chain_linear() {
    backward_shift_keeps_chain::<Linear>();
}

#[test]
fn backward_shift_keeps_chain_robin_hood() {
    backward_shift_keeps_chain::<RobinHood>();
}

#[test]
fn empty_key_round_trip() {
    let mut map: HashMap<u32, &str> = HashMap::new();
    map.insert(0, "z");
    assert_eq!(map.get(&0), Some(&"z"));
    assert_eq!(map.len(), 1);

    assert_eq!(map.remove(&0), Some("z"));
    assert_eq!(map.len(), 0);
    assert!(!map.contains_key(&0));

    let mut robin_hood: RobinHoodHashMap<u32, &str> = RobinHoodHashMap::new();
    robin_hood.insert(0, "z");
    assert_eq!(robin_hood.get(&0), Some(&"z"));
    assert_eq!(robin_hood.remove(&0), Some("z"));
    assert!(robin_hood.is_empty());
}

#[test]
fn different_strategies_are_unequal() {
    let mut a: HashMap<u64, u64, Seeded> = HashMap::with_strategy(Seeded(1));
    let mut b: HashMap<u64, u64, Seeded> = HashMap::with_strategy(Seeded(2));
    let mut c: HashMap<u64, u64, Seeded> = HashMap::with_strategy(Seeded(1));
    for k in 1..=20u64 {
        a.insert(k, k);
        b.insert(k, k);
        c.insert(k, k);
    }

    assert_ne!(a, b);
    assert_eq!(a, c);
    // Content hashes ignore the strategy.
    assert_eq!(a.content_hash(), b.content_hash());
}

#[test]
fn try_insert_reports_without_changing_map() {
    let mut map: HashMap<u32, u32> = HashMap::new();
    for k in 1..=100u32 {
        assert_eq!(map.try_insert(k, k), Ok(None));
    }
    assert_eq!(map.try_insert(7, 70), Ok(Some(7)));
    assert!(map.try_reserve(usize::MAX).is_err());
    assert_eq!(map.len(), 100);
    assert_eq!(map.get(&7), Some(&70));
}

#[test]
fn empty_key_does_not_count_against_capacity() {
    let mut set: RobinHoodHashSet<u32> = HashSet::with_capacity(8);
    let mut k = 1;
    while set.len() < set.capacity() {
        set.insert(k);
        k += 1;
    }
    let slots = set.slot_count();

    assert!(set.insert(0));
    assert_eq!(set.slot_count(), slots);
    assert_eq!(set.len(), set.capacity() + 1);
    assert!(set.contains(&0));

    assert!(set.insert(k));
    assert!(set.slot_count() > slots);
    assert_eq!(set.len() - usize::from(set.contains(&0)), k as usize);
    assert!(set.len() - 1 <= set.capacity());
}
