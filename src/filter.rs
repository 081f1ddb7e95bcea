//! Path-preserving filter over a list tree source.
//!
//! `FilterableListTreeSource` wraps a [`ListTreeSource`] and adds an async
//! "filter, but keep ancestor paths visible" mode: every node matching a
//! caller predicate stays reachable because its whole ancestor chain is
//! force-expanded, while the projection is rebuilt under a temporary
//! visibility rule instead of the plain expansion rule.
//!
//! The match and ancestor-closure computation runs on tokio's blocking pool
//! over an immutable snapshot of the forest; all flag writes and the install
//! of the new projection happen back on the owner side, after the `await`.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::arena::TreeNode;
use crate::errors::{TreeError, TreeResult};
use crate::store::ListTreeSource;
use crate::traits::ListTree;

type SharedPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Immutable flattening of the whole forest, ignoring expansion state.
/// Rebuilt lazily, only after a structural mutation. Shared with the filter
/// worker so the off-thread phase never observes the live arena.
#[derive(Debug)]
struct FilterSnapshot<T> {
    /// All nodes in depth-first order, with their values cloned out.
    entries: Vec<(Index, T)>,
    /// Parent edge per node, for ancestor-chain walks.
    parents: HashMap<Index, Option<Index>>,
}

/// Result of the off-thread phase: which nodes match, and the union of all
/// their ancestor chains.
#[derive(Debug)]
struct FilterOutcome {
    targets: Vec<Index>,
    ancestors: HashSet<Index>,
}

/// The installed filter: predicate plus ancestor closure, consulted by the
/// projection rule on every reload while filtering is active.
struct ActiveFilter<T> {
    predicate: SharedPredicate<T>,
    targets: Vec<Index>,
    ancestors: HashSet<Index>,
}

/// A [`ListTreeSource`] with asynchronous, ancestor-preserving filtering.
///
/// Read access passes through `Deref`; mutations go through the re-exposed
/// methods here so the all-items snapshot is invalidated and reloads keep
/// applying the active filter rule.
pub struct FilterableListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    base: ListTreeSource<T>,
    snapshot: Option<Arc<FilterSnapshot<T>>>,
    snapshot_stale: bool,
    active: Option<ActiveFilter<T>>,
}

impl<T> FilterableListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            base: ListTreeSource::new(),
            snapshot: None,
            snapshot_stale: true,
            active: None,
        }
    }

    // ------------------------------------------------------------
    // Structural mutation (invalidates the snapshot)
    // ------------------------------------------------------------

    pub fn append(&mut self, items: Vec<T>, parent: Option<&T>) {
        self.base.append(items, parent);
        self.snapshot_stale = true;
    }

    pub fn insert_before(&mut self, items: Vec<T>, anchor: &T) {
        self.base.insert_before(items, anchor);
        self.snapshot_stale = true;
    }

    pub fn insert_after(&mut self, items: Vec<T>, anchor: &T) {
        self.base.insert_after(items, anchor);
        self.snapshot_stale = true;
    }

    pub fn delete(&mut self, items: &[T]) {
        self.base.delete(items);
        self.snapshot_stale = true;
    }

    pub fn move_item(&mut self, item: &T, to_index: usize, parent: Option<&T>) -> TreeResult<()> {
        let result = self.base.move_item(item, to_index, parent);
        self.snapshot_stale = true;
        result
    }

    /// Mutable node access; see [`ListTreeSource::get_node_mut`].
    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode<T>> {
        self.base.get_node_mut(idx)
    }

    // ------------------------------------------------------------
    // Expansion (reloads through the active filter rule)
    // ------------------------------------------------------------

    pub fn toggle_expand(&mut self, item: &T) {
        self.base.toggle_expand_flag(item);
        self.reload();
    }

    pub fn set_subtree_expanded(&mut self, item: &T, expanded: bool) {
        self.base.set_subtree_expanded_flags(item, expanded);
        self.reload();
    }

    pub fn expand_all(&mut self) {
        self.base.set_all_expanded_flags(true);
        self.reload();
    }

    pub fn collapse_all(&mut self) {
        self.base.set_all_expanded_flags(false);
        self.reload();
    }

    /// Recomputes the projection: under the plain expansion rule normally,
    /// under the temporary visibility rule while a filter is active.
    #[instrument(level = "trace", skip(self))]
    pub fn reload(&mut self) {
        match self.active.take() {
            Some(filter) => {
                self.base.reload_with(|idx, node| {
                    Self::included_in_expand(&filter, idx, node)
                });
                self.active = Some(filter);
            }
            None => self.base.reload(),
        }
    }

    // ------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------

    /// Filters the source by `predicate`, keeping every ancestor path to a
    /// match visible.
    ///
    /// The match/closure computation runs off-thread over an immutable
    /// snapshot; the expansion flags are rewritten and the filtered
    /// projection installed only after control returns here. Completion is
    /// the future resolving. Dropping the future before completion cancels
    /// the request: a superseded filter never installs its result, so the
    /// latest request always wins.
    #[instrument(level = "debug", skip_all)]
    pub async fn filter_keeping_parents<P>(&mut self, predicate: P) -> TreeResult<()>
    where
        T: Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: SharedPredicate<T> = Arc::new(predicate);

        let snapshot = self.ensure_snapshot();
        let worker_predicate = Arc::clone(&predicate);
        let outcome = tokio::task::spawn_blocking(move || {
            Self::compute_outcome(&snapshot, &worker_predicate)
        })
        .await
        .map_err(TreeError::FilterTask)?;

        self.install(predicate, outcome);
        Ok(())
    }

    /// Clears the filter and restores the expansion-driven projection,
    /// optionally collapsing every node back to the root-only view.
    #[instrument(level = "debug", skip(self))]
    pub fn reset_filtering(&mut self, collapsing_all: bool) {
        self.active = None;
        self.reload();

        if collapsing_all {
            self.collapse_all();
        }
    }

    /// Nodes directly matching the active predicate, snapshot order.
    pub fn filtered_targets(&self) -> &[Index] {
        self.active.as_ref().map(|f| f.targets.as_slice()).unwrap_or(&[])
    }

    /// The ancestor closure of the active filter.
    pub fn traversed_ancestors(&self) -> Option<&HashSet<Index>> {
        self.active.as_ref().map(|f| &f.ancestors)
    }

    pub fn is_filtering(&self) -> bool {
        self.active.is_some()
    }

    // ------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------

    fn ensure_snapshot(&mut self) -> Arc<FilterSnapshot<T>> {
        if !self.snapshot_stale {
            if let Some(snapshot) = &self.snapshot {
                return Arc::clone(snapshot);
            }
        }

        let forest = self.base.forest();
        let mut entries = Vec::with_capacity(self.base.len());
        let mut parents = HashMap::with_capacity(self.base.len());
        for (idx, node) in forest.iter() {
            entries.push((idx, node.value.clone()));
            parents.insert(idx, node.parent);
        }
        let snapshot = Arc::new(FilterSnapshot { entries, parents });
        self.snapshot = Some(Arc::clone(&snapshot));
        self.snapshot_stale = false;
        trace!(nodes = self.base.len(), "all-items snapshot rebuilt");
        snapshot
    }

    fn compute_outcome(snapshot: &FilterSnapshot<T>, predicate: &SharedPredicate<T>) -> FilterOutcome {
        let targets: Vec<Index> = snapshot
            .entries
            .iter()
            .filter(|(_, value)| predicate(value))
            .map(|(idx, _)| *idx)
            .collect();

        let mut ancestors = HashSet::new();
        for idx in &targets {
            let mut current = snapshot.parents.get(idx).copied().flatten();
            while let Some(parent) = current {
                // The rest of this chain is already recorded.
                if !ancestors.insert(parent) {
                    break;
                }
                current = snapshot.parents.get(&parent).copied().flatten();
            }
        }

        FilterOutcome { targets, ancestors }
    }

    /// Owner-side install: the only place filtering writes expansion flags.
    fn install(&mut self, predicate: SharedPredicate<T>, outcome: FilterOutcome) {
        debug!(
            targets = outcome.targets.len(),
            ancestors = outcome.ancestors.len(),
            "installing filter result"
        );

        // Clean slate, then force every traversed ancestor open so no match
        // is orphaned in the view.
        self.base.set_all_expanded_flags(false);
        for &idx in &outcome.ancestors {
            if let Some(node) = self.base.get_node_mut(idx) {
                node.expanded = true;
            }
        }

        self.active = Some(ActiveFilter {
            predicate,
            targets: outcome.targets,
            ancestors: outcome.ancestors,
        });
        self.reload();
    }

    /// The temporary visibility rule. Roots qualify by matching or by being
    /// on a path to a match; children of closure nodes must match; everything
    /// below an accepted match is shown without re-testing — a matched
    /// subtree deliberately reveals its remaining contents wholesale.
    fn included_in_expand(filter: &ActiveFilter<T>, idx: Index, node: &TreeNode<T>) -> bool {
        match node.parent {
            None => (filter.predicate)(&node.value) || filter.ancestors.contains(&idx),
            Some(_) if filter.ancestors.contains(&idx) => true,
            Some(parent) => {
                if filter.ancestors.contains(&parent) {
                    (filter.predicate)(&node.value)
                } else {
                    true
                }
            }
        }
    }
}

impl<T> Default for FilterableListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for FilterableListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    type Target = ListTreeSource<T>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<T> ListTree<T> for FilterableListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    fn append(&mut self, items: Vec<T>, parent: Option<&T>) {
        FilterableListTreeSource::append(self, items, parent);
    }

    fn reload(&mut self) {
        FilterableListTreeSource::reload(self);
    }
}
