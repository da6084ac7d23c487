//! Cursor-style traversal exposing slot indices.
//!
//! [`Cursors`] walks the occupied slots of a table in index order and then
//! the out-of-band slot of the empty key, which reports an index equal to the
//! slot count. Each step overwrites the same [`Cursor`] in place, so walking a
//! table allocates nothing.

use crate::hash_table::HashTable;
use crate::hash_table::ProbePolicy;
use crate::sentinel::EmptyKey;
use crate::strategy::HashStrategy;

/// The entry a [`Cursors`] walk is positioned on.
#[derive(Debug)]
pub struct Cursor<'a, K, V> {
    index: usize,
    key: &'a K,
    value: &'a V,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Slot index of the entry. The empty key reports the table's slot count.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The entry's key.
    pub fn key(&self) -> &'a K {
        self.key
    }

    /// The entry's value.
    pub fn value(&self) -> &'a V {
        self.value
    }
}

/// A walk over the entries of a table that reuses one [`Cursor`].
///
/// Created by [`HashTable::cursors`].
///
/// # Examples
///
/// ```rust
/// use probe_hash::HashMap;
///
/// let mut map: HashMap<u32, &str> = HashMap::new();
/// map.insert(0, "zero");
/// map.insert(7, "seven");
///
/// let mut cursors = map.cursors();
/// let mut seen = Vec::new();
/// while let Some(cursor) = cursors.advance() {
///     seen.push((cursor.index(), *cursor.key()));
/// }
///
/// assert_eq!(seen.len(), 2);
/// // The empty key comes last, past the end of the slot array.
/// assert_eq!(seen[1], (map.slot_count(), 0));
/// ```
pub struct Cursors<'a, K, V, S, P>
where
    K: EmptyKey,
{
    table: &'a HashTable<K, V, S, P>,
    next: usize,
    cursor: Option<Cursor<'a, K, V>>,
}

impl<'a, K, V, S, P> Cursors<'a, K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Moves to the next entry and returns it, or `None` once every entry
    /// has been visited.
    pub fn advance(&mut self) -> Option<&Cursor<'a, K, V>> {
        let table = self.table;
        let slots = table.slot_count();

        while self.next < slots {
            let index = self.next;
            self.next += 1;
            if table.is_occupied(index) {
                // SAFETY: Values are initialized exactly where the key is occupied.
                let value = unsafe { table.values[index].assume_init_ref() };
                return Some(self.cursor.insert(Cursor {
                    index,
                    key: &table.keys[index],
                    value,
                }));
            }
        }

        if self.next == slots {
            self.next += 1;
            if let Some(value) = &table.sentinel {
                return Some(self.cursor.insert(Cursor {
                    index: slots,
                    key: &table.empty_key,
                    value,
                }));
            }
        }

        self.cursor = None;
        None
    }
}

impl<K, V, S, P> HashTable<K, V, S, P>
where
    K: EmptyKey,
    S: HashStrategy<K>,
    P: ProbePolicy,
{
    /// Starts a cursor walk over every entry.
    pub fn cursors(&self) -> Cursors<'_, K, V, S, P> {
        Cursors {
            table: self,
            next: 0,
            cursor: None,
        }
    }
}
