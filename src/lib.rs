#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Cursor-style traversal that exposes slot indices.
pub mod cursor;

mod error;

/// A hash map over the open-addressing table.
///
/// This module provides a `HashMap` that wraps the `HashTable` and exposes a
/// standard key-value map interface with pluggable hashing strategies.
pub mod hash_map;

/// A hash set over the open-addressing table.
///
/// This module provides a `HashSet` that wraps a value-less `HashTable` and
/// exposes a standard set interface, including set algebra.
pub mod hash_set;

/// The open-addressing engine shared by maps and sets.
pub mod hash_table;

mod resize;
mod robin_hood;

/// The empty-key marker stored in unoccupied slots.
pub mod sentinel;

#[cfg(any(test, feature = "stats"))]
pub mod stats;

/// Pluggable hashing and key equality.
pub mod strategy;

#[cfg(all(test, feature = "std"))]
mod hash_table_proptest;

pub use cursor::Cursor;
pub use error::TryReserveError;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_map::RobinHoodHashMap;
pub use hash_set::HashSet;
pub use hash_set::RobinHoodHashSet;
pub use hash_table::DEFAULT_LOAD_FACTOR;
pub use hash_table::HashTable;
pub use hash_table::Linear;
pub use hash_table::RobinHood;
pub use sentinel::EmptyKey;
pub use strategy::HashStrategy;
pub use strategy::Intrinsic;
pub use strategy::WithHasher;
