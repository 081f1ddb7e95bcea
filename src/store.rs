//! Flat-list projection over a mutable forest.
//!
//! `ListTreeSource` owns the structural truth (arena forest + identity lookup
//! table) and the cached projection of currently visible rows. Structural and
//! expansion mutations mark the projection stale; `reload` recomputes it.

use std::collections::HashMap;
use std::hash::Hash;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::arena::{Forest, TreeNode};
use crate::errors::{TreeError, TreeResult};
use crate::traits::ListTree;

/// Forest store with O(1) identity lookup and a reload-driven projection.
///
/// Structural operations are total over possibly-stale identities: an absent
/// identity degrades to a no-op instead of failing, because callers are
/// typically driven by UI events that can race with deletions. The single
/// exception is `move_item`, which rejects a reparent into the moved node's
/// own subtree.
#[derive(Debug)]
pub struct ListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    forest: Forest<T>,
    /// Identity -> node map. At most one node per item identity.
    lookup_table: HashMap<T, Index>,
    /// Cached projection: visible rows in depth-first order.
    shown: Vec<Index>,
    /// Set by every mutation, cleared by the projection rebuild.
    stale: bool,
}

impl<T> ListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            forest: Forest::new(),
            lookup_table: HashMap::new(),
            shown: Vec::new(),
            stale: false,
        }
    }

    // ------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------

    /// Appends `items` as the last children of `parent`, or as new roots when
    /// `parent` is `None`. No-op when a named parent does not resolve.
    /// Items whose identity is already present are skipped.
    #[instrument(level = "trace", skip_all)]
    pub fn append(&mut self, items: Vec<T>, parent: Option<&T>) {
        let parent_idx = match parent {
            Some(p) => match self.lookup_table.get(p) {
                Some(&idx) => Some(idx),
                None => {
                    debug!("append: parent identity not found, ignoring");
                    return;
                }
            },
            None => None,
        };

        for item in items {
            self.create_node(item, parent_idx, None);
        }
        self.stale = true;
    }

    /// Inserts `items` immediately before `anchor` within its sibling array.
    /// No-op if the anchor is unknown.
    pub fn insert_before(&mut self, items: Vec<T>, anchor: &T) {
        self.insert_at_anchor(items, anchor, false);
    }

    /// Inserts `items` immediately after `anchor` within its sibling array.
    /// No-op if the anchor is unknown.
    pub fn insert_after(&mut self, items: Vec<T>, anchor: &T) {
        self.insert_at_anchor(items, anchor, true);
    }

    #[instrument(level = "trace", skip_all)]
    fn insert_at_anchor(&mut self, items: Vec<T>, anchor: &T, after: bool) {
        let Some(&anchor_idx) = self.lookup_table.get(anchor) else {
            debug!("insert: anchor identity not found, ignoring");
            return;
        };
        let Some(anchor_node) = self.forest.get_node(anchor_idx) else {
            return;
        };
        let parent_idx = anchor_node.parent;

        let siblings: &[Index] = match parent_idx {
            Some(p) => match self.forest.get_node(p) {
                Some(n) => &n.children,
                None => return,
            },
            None => self.forest.roots(),
        };
        let Some(anchor_pos) = siblings.iter().position(|&s| s == anchor_idx) else {
            return;
        };
        let base = if after { anchor_pos + 1 } else { anchor_pos };

        let mut inserted = 0;
        for item in items {
            if self.create_node(item, parent_idx, Some(base + inserted)) {
                inserted += 1;
            }
        }
        self.stale = true;
    }

    /// Removes every node whose value is in `items`, together with its entire
    /// subtree, from the forest and the lookup table. Absent identities are
    /// per-entry no-ops.
    #[instrument(level = "trace", skip_all)]
    pub fn delete(&mut self, items: &[T]) {
        for item in items {
            // May already be gone as a descendant of an earlier entry.
            let Some(&idx) = self.lookup_table.get(item) else {
                continue;
            };
            for value in self.forest.remove_subtree(idx) {
                self.lookup_table.remove(&value);
            }
        }
        self.stale = true;
    }

    /// Relocates `item` (with its whole subtree) to position `to_index` in the
    /// children of `parent`, or the root list when `parent` is `None`.
    ///
    /// The destination index follows single-array `insert(at:)` semantics
    /// after detaching, clamped to the destination length. Unknown item or
    /// unknown named parent: no-op. Moving a node into itself or its own
    /// subtree is rejected with [`TreeError::MoveIntoDescendant`].
    #[instrument(level = "trace", skip_all)]
    pub fn move_item(&mut self, item: &T, to_index: usize, parent: Option<&T>) -> TreeResult<()> {
        let Some(&idx) = self.lookup_table.get(item) else {
            debug!("move: item identity not found, ignoring");
            return Ok(());
        };
        let parent_idx = match parent {
            Some(p) => match self.lookup_table.get(p) {
                Some(&pi) => Some(pi),
                None => {
                    debug!("move: parent identity not found, ignoring");
                    return Ok(());
                }
            },
            None => None,
        };

        if let Some(pi) = parent_idx {
            if self.forest.is_self_or_descendant(pi, idx) {
                return Err(TreeError::MoveIntoDescendant);
            }
        }

        self.forest.detach(idx);
        self.forest.attach(idx, parent_idx, to_index);
        self.stale = true;
        Ok(())
    }

    // ------------------------------------------------------------
    // Lookup and access
    // ------------------------------------------------------------

    /// O(1) average identity resolution.
    pub fn lookup(&self, item: &T) -> Option<Index> {
        self.lookup_table.get(item).copied()
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode<T>> {
        self.forest.get_node(idx)
    }

    /// Mutable node access, e.g. for flipping `expanded` in bulk before one
    /// explicit `reload`. Flag writes alone never trigger recomputation.
    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode<T>> {
        self.forest.get_node_mut(idx)
    }

    /// The current projection: visible rows in depth-first order.
    pub fn items(&self) -> Vec<&TreeNode<T>> {
        self.shown
            .iter()
            .filter_map(|&idx| self.forest.get_node(idx))
            .collect()
    }

    /// Projection row indices; resolve through [`Self::get_node`].
    pub fn shown_indices(&self) -> &[Index] {
        &self.shown
    }

    /// Total node count, visible or not.
    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// True after any mutation until the next `reload`.
    pub fn is_projection_stale(&self) -> bool {
        self.stale
    }

    pub fn forest(&self) -> &Forest<T> {
        &self.forest
    }

    // ------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------

    /// Recomputes the projection from the current forest and expansion state.
    /// Collapsed subtrees are never descended into.
    #[instrument(level = "trace", skip(self))]
    pub fn reload(&mut self) {
        self.shown = self.forest.flatten_where(|node| node.expanded, |_, _| true);
        self.stale = false;
        trace!(visible = self.shown.len(), "projection rebuilt");
    }

    /// Rebuilds the projection under a caller-supplied visibility rule.
    /// Expansion still gates descent; `include` gates emission.
    pub(crate) fn reload_with<I>(&mut self, include: I)
    where
        I: Fn(Index, &TreeNode<T>) -> bool,
    {
        self.shown = self.forest.flatten_where(|node| node.expanded, include);
        self.stale = false;
    }

    // ------------------------------------------------------------
    // Expansion state
    // ------------------------------------------------------------

    /// Flips `expanded` on the node for `item`, then reloads.
    pub fn toggle_expand(&mut self, item: &T) {
        self.toggle_expand_flag(item);
        self.reload();
    }

    /// Sets `expanded` on the node for `item` and every descendant, then
    /// reloads. This is the whole-subtree batch expand/collapse.
    pub fn set_subtree_expanded(&mut self, item: &T, expanded: bool) {
        self.set_subtree_expanded_flags(item, expanded);
        self.reload();
    }

    /// Sets `expanded` on every node in the forest, then reloads.
    pub fn expand_all(&mut self) {
        self.set_all_expanded_flags(true);
        self.reload();
    }

    /// Clears `expanded` on every node in the forest, then reloads.
    pub fn collapse_all(&mut self) {
        self.set_all_expanded_flags(false);
        self.reload();
    }

    pub(crate) fn toggle_expand_flag(&mut self, item: &T) {
        if let Some(&idx) = self.lookup_table.get(item) {
            if let Some(node) = self.forest.get_node_mut(idx) {
                node.expanded = !node.expanded;
            }
        }
        self.stale = true;
    }

    pub(crate) fn set_subtree_expanded_flags(&mut self, item: &T, expanded: bool) {
        if let Some(&idx) = self.lookup_table.get(item) {
            for node_idx in self.forest.descendants(idx) {
                if let Some(node) = self.forest.get_node_mut(node_idx) {
                    node.expanded = expanded;
                }
            }
        }
        self.stale = true;
    }

    pub(crate) fn set_all_expanded_flags(&mut self, expanded: bool) {
        for (_, node) in self.forest.nodes_mut() {
            node.expanded = expanded;
        }
        self.stale = true;
    }

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------

    fn create_node(&mut self, item: T, parent: Option<Index>, at: Option<usize>) -> bool {
        if self.lookup_table.contains_key(&item) {
            trace!("duplicate identity skipped");
            return false;
        }
        let idx = match at {
            Some(at) => self.forest.insert_node_at(item.clone(), parent, at),
            None => self.forest.insert_node(item.clone(), parent),
        };
        self.lookup_table.insert(item, idx);
        true
    }
}

impl<T> Default for ListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListTree<T> for ListTreeSource<T>
where
    T: Clone + Eq + Hash,
{
    fn append(&mut self, items: Vec<T>, parent: Option<&T>) {
        ListTreeSource::append(self, items, parent);
    }

    fn reload(&mut self) {
        ListTreeSource::reload(self);
    }
}
