//! Breadth-first bulk construction.
//!
//! Loads a whole item hierarchy into a source level by level over a FIFO
//! queue, so stack usage is bounded by the queue's heap buffer instead of
//! call-stack depth. Produces the same tree as recursive insertion; finishes
//! with a single `reload`.

use std::collections::VecDeque;

use tracing::instrument;

use crate::traits::ListTree;

/// Bulk-adds `items` and their transitive children to `source`.
///
/// `children_of` supplies the children for any given item; it is consulted
/// exactly once per inserted item. Items are appended top-level first, then
/// each dequeued item's children directly under it, preserving the order
/// `children_of` returns.
#[instrument(level = "debug", skip_all)]
pub fn add_items<T, F, S>(items: Vec<T>, children_of: F, source: &mut S)
where
    T: Clone,
    F: Fn(&T) -> Vec<T>,
    S: ListTree<T>,
{
    source.append(items.clone(), None);

    let mut queue: VecDeque<T> = items.into();
    while let Some(current) = queue.pop_front() {
        let children = children_of(&current);
        if children.is_empty() {
            continue;
        }
        source.append(children.clone(), Some(&current));
        queue.extend(children);
    }

    source.reload();
}
