//! Combining compiled predicates.

use std::collections::btree_map::Entry;

use crate::query::filter::{Predicate, PredicateNode};

/// Merge predicates left to right.
///
/// Per key, the later predicate wins unless both sides are nested trees, in
/// which case they merge recursively. `None` entries are skipped, so callers
/// can pass `[request_filter, constraint]` without checking either.
pub fn merge_predicates<I>(predicates: I) -> Predicate
where
    I: IntoIterator<Item = Option<Predicate>>,
{
    predicates
        .into_iter()
        .flatten()
        .fold(Predicate::new(), |mut merged, next| {
            merge_into(&mut merged, next);
            merged
        })
}

fn merge_into(target: &mut Predicate, other: Predicate) {
    for (key, node) in other.into_nodes() {
        match target.nodes_mut().entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(node);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), node) {
                (PredicateNode::Nested(existing), PredicateNode::Nested(incoming)) => {
                    merge_into(existing, incoming);
                }
                (existing, incoming) => *existing = incoming,
            },
        }
    }
}
