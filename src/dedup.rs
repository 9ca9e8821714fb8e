use std::collections::HashSet;

use crate::record::{Key, Record};

/// Returns the first key in `incoming` that collides with a key in `existing`
/// or with an earlier record of `incoming` itself.
///
/// Scanning stops at the first collision; a batch with any collision is
/// rejected as a whole, so later collisions are never reported.
pub fn find_duplicate(existing: &[Record], incoming: &[Record], key_column: &str) -> Option<Key> {
    let existing_keys: HashSet<Key> = existing.iter().map(|r| r.key(key_column)).collect();
    let mut seen = HashSet::with_capacity(incoming.len());

    for record in incoming {
        let key = record.key(key_column);
        if existing_keys.contains(&key) || seen.contains(&key) {
            return Some(key);
        }
        seen.insert(key);
    }
    None
}
