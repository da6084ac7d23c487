//! Pluggable key hashing and equality.
//!
//! Tables never call `Hash`/`Eq` on their keys directly; they go through a
//! [`HashStrategy`]. The default [`Intrinsic`] strategy defers to the key
//! type's own `Hash` and `Eq` implementations, while custom strategies can
//! redefine both (for example to compare strings case-insensitively).
//!
//! Whatever the strategy returns is further mixed with the table's
//! per-instance perturbation seed before it is reduced to a slot index, see
//! [`mix`].

use core::hash::BuildHasher;
use core::hash::Hash;
use core::sync::atomic::AtomicUsize;
use core::sync::atomic::Ordering;

use foldhash::fast::FixedState;
use foldhash::fast::RandomState;

/// Seed for the strategy-independent content hash. Fixed so that equal
/// containers report equal hashes across instances.
const INTRINSIC_SEED: u64 = 0x243f_6a88_85a3_08d3;

/// Hashing and equality used by a table to place and find keys.
///
/// Implementations must be consistent: `equals(a, b)` implies
/// `hash_key(a) == hash_key(b)`.
///
/// # Examples
///
/// ```rust
/// use probe_hash::HashMap;
/// use probe_hash::HashStrategy;
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// struct LowBits;
///
/// impl HashStrategy<u32> for LowBits {
///     fn hash_key(&self, key: &u32) -> u64 {
///         (*key & 0xff) as u64
///     }
///
///     fn equals(&self, a: &u32, b: &u32) -> bool {
///         a & 0xff == b & 0xff
///     }
/// }
///
/// let mut map: HashMap<u32, &str, LowBits> = HashMap::with_strategy(LowBits);
/// map.insert(0x101, "a");
/// assert_eq!(map.get(&0x201), Some(&"a"));
/// ```
pub trait HashStrategy<K: ?Sized> {
    /// Hashes `key`.
    fn hash_key(&self, key: &K) -> u64;

    /// Returns `true` if `a` and `b` denote the same key.
    fn equals(&self, a: &K, b: &K) -> bool;
}

/// The key type's own `Hash` and `Eq`.
///
/// Hashes are computed with a fixed-seed foldhash; per-table randomization
/// comes from the table's perturbation seed instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Intrinsic;

impl<K> HashStrategy<K> for Intrinsic
where
    K: Hash + Eq + ?Sized,
{
    #[inline(always)]
    fn hash_key(&self, key: &K) -> u64 {
        intrinsic_hash(key)
    }

    #[inline(always)]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// The key type's `Eq` with hashes produced by a [`BuildHasher`].
///
/// Two `WithHasher` strategies compare equal when their builders do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithHasher<B = FixedState>(pub B);

impl<K, B> HashStrategy<K> for WithHasher<B>
where
    K: Hash + Eq + ?Sized,
    B: BuildHasher,
{
    #[inline(always)]
    fn hash_key(&self, key: &K) -> u64 {
        self.0.hash_one(key)
    }

    #[inline(always)]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Strategy-independent hash of a value, used for container content hashes.
#[inline]
pub fn intrinsic_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    FixedState::with_seed(INTRINSIC_SEED).hash_one(value)
}

/// Mixes a strategy hash with a table's perturbation seed.
///
/// This is the 64-bit murmur3 finalizer applied to `hash ^ perturbation`; it
/// is a bijection, so distinct hashes never collide before masking, and every
/// output bit depends on every input bit, so masking to the low bits is safe
/// even for weak strategy hashes like the identity.
#[inline(always)]
pub fn mix(hash: u64, perturbation: u64) -> u64 {
    let mut h = hash ^ perturbation;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// Returns a new perturbation seed, distinct per call.
pub(crate) fn fresh_perturbation() -> u64 {
    static TABLES: AtomicUsize = AtomicUsize::new(0);
    let ordinal = TABLES.fetch_add(1, Ordering::Relaxed);
    RandomState::default().hash_one(ordinal)
}
