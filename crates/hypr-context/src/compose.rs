//! Ordered union of context groups.
//!
//! This is how "current session" + "manually added" + "tool-derived" sets
//! are flattened into one list. Whichever group is listed first wins a
//! key collision.

use std::collections::HashSet;

use hypr_core::Keyed;

/// Merge `groups` into one list with one entry per key.
///
/// Groups are visited in argument order and their elements in iteration
/// order; the first occurrence of a key is kept and later ones are dropped.
/// Empty groups contribute nothing.
pub fn compose<T, G, I>(groups: I) -> Vec<T>
where
    T: Keyed,
    G: IntoIterator<Item = T>,
    I: IntoIterator<Item = G>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();
    for group in groups {
        for item in group {
            if seen.insert(item.key().to_owned()) {
                merged.push(item);
            }
        }
    }
    merged
}
