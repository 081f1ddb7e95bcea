//! Arena-based forest storage.
//!
//! All nodes of every root live in one `generational_arena::Arena`; the arena
//! owns the nodes, `parent` back-edges are plain non-owning indices. Every
//! traversal here runs on an explicit work stack, never on call-stack
//! recursion, because forests in the millions of nodes are in scope.

use generational_arena::{Arena, Index};
use tracing::instrument;

/// Tree node wrapping one caller-supplied value.
#[derive(Debug)]
pub struct TreeNode<T> {
    /// The item this node represents.
    pub value: T,
    /// Index of the parent node, `None` for roots. Non-owning back-edge.
    pub parent: Option<Index>,
    /// Ordered child indices; order is significant and preserved.
    pub children: Vec<Index>,
    /// Expansion flag. Writing it does not trigger recomputation.
    pub expanded: bool,
    /// Depth from the nearest root (root = 0). Maintained on reparent.
    pub level: usize,
}

/// Multi-root tree storage.
///
/// The ownership graph is strictly parent-owns-children through the arena;
/// removing a subtree frees every node in it.
#[derive(Debug)]
pub struct Forest<T> {
    arena: Arena<TreeNode<T>>,
    roots: Vec<Index>,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Forest<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Appends a node as the last child of `parent`, or as the last root.
    /// A `parent` index that no longer resolves degrades to a root attach.
    #[instrument(level = "trace", skip_all)]
    pub fn insert_node(&mut self, value: T, parent: Option<Index>) -> Index {
        let parent = parent.filter(|&p| self.arena.contains(p));
        let level = parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.level + 1)
            .unwrap_or(0);
        let node_idx = self.arena.insert(TreeNode {
            value,
            parent,
            children: Vec::new(),
            expanded: false,
            level,
        });

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }

        node_idx
    }

    /// Appends a node spliced into the sibling array at `at` (clamped).
    #[instrument(level = "trace", skip_all)]
    pub fn insert_node_at(&mut self, value: T, parent: Option<Index>, at: usize) -> Index {
        let node_idx = self.insert_node(value, parent);
        // insert_node pushed it last; relocate within the same sibling array.
        let parent = self.arena.get(node_idx).and_then(|n| n.parent);
        let siblings = self.sibling_array_mut(parent);
        siblings.pop();
        let at = at.min(siblings.len());
        siblings.insert(at, node_idx);
        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode<T>> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode<T>> {
        self.arena.get_mut(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    fn sibling_array_mut(&mut self, parent: Option<Index>) -> &mut Vec<Index> {
        match parent {
            Some(p) => self
                .arena
                .get_mut(p)
                .map(|n| &mut n.children)
                .unwrap_or(&mut self.roots),
            None => &mut self.roots,
        }
    }

    /// Removes `idx` from its parent's children (or the root list) without
    /// touching the subtree. The node keeps its `parent` field until it is
    /// re-attached or removed.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, idx: Index) {
        let parent = self.arena.get(idx).and_then(|n| n.parent);
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.arena.get_mut(p) {
                    parent_node.children.retain(|&c| c != idx);
                }
            }
            None => self.roots.retain(|&r| r != idx),
        }
    }

    /// Attaches a detached node under `parent` (or as a root) at sibling
    /// position `at` (clamped), then recomputes `level` for the whole subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, idx: Index, parent: Option<Index>, at: usize) {
        {
            let siblings = self.sibling_array_mut(parent);
            let at = at.min(siblings.len());
            siblings.insert(at, idx);
        }
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = parent;
        }
        self.relevel(idx);
    }

    /// Recomputes `level` for `idx` and every descendant from the current
    /// parent chain. Explicit stack, uniform shift for the whole subtree.
    fn relevel(&mut self, idx: Index) {
        let base = self
            .arena
            .get(idx)
            .and_then(|n| n.parent)
            .and_then(|p| self.arena.get(p))
            .map(|p| p.level + 1)
            .unwrap_or(0);

        let mut stack = vec![(idx, base)];
        while let Some((current, level)) = stack.pop() {
            if let Some(node) = self.arena.get_mut(current) {
                node.level = level;
                for &child in &node.children {
                    stack.push((child, level + 1));
                }
            }
        }
    }

    /// Detaches `idx` and frees the entire subtree, returning the removed
    /// values (pre-order, used by callers to purge lookup entries).
    #[instrument(level = "trace", skip(self))]
    pub fn remove_subtree(&mut self, idx: Index) -> Vec<T> {
        self.detach(idx);

        let mut removed = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children.iter().rev().copied());
                removed.push(node.value);
            }
        }
        removed
    }

    /// Pre-order indices of `idx` and all its descendants.
    pub fn descendants(&self, idx: Index) -> Vec<Index> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.get(current) {
                out.push(current);
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Ancestor chain of `idx`, nearest parent first.
    pub fn ancestors(&self, idx: Index) -> Vec<Index> {
        let mut out = Vec::new();
        let mut current = self.arena.get(idx).and_then(|n| n.parent);
        while let Some(p) = current {
            out.push(p);
            current = self.arena.get(p).and_then(|n| n.parent);
        }
        out
    }

    /// True when `idx` equals `ancestor` or sits anywhere below it.
    pub fn is_self_or_descendant(&self, idx: Index, ancestor: Index) -> bool {
        let mut current = Some(idx);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.arena.get(c).and_then(|n| n.parent);
        }
        false
    }

    /// Depth-first pre-order flatten over the roots in store order.
    ///
    /// `descend` gates whether a node's children are walked at all (the
    /// expansion rule); `include` gates whether a node is emitted and pushed
    /// (the filter rule). Skipped subtrees are never visited, which is the
    /// complexity win for large collapsed forests.
    pub fn flatten_where<D, I>(&self, descend: D, include: I) -> Vec<Index>
    where
        D: Fn(&TreeNode<T>) -> bool,
        I: Fn(Index, &TreeNode<T>) -> bool,
    {
        let mut out = Vec::new();
        let mut stack: Vec<Index> = self
            .roots
            .iter()
            .rev()
            .copied()
            .filter(|&i| self.arena.get(i).is_some_and(|n| include(i, n)))
            .collect();

        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.arena.get(current) {
                if descend(node) {
                    for &child in node.children.iter().rev() {
                        if let Some(child_node) = self.arena.get(child) {
                            if include(child, child_node) {
                                stack.push(child);
                            }
                        }
                    }
                }
            }
        }
        out
    }

    /// Full depth-first flatten ignoring expansion state.
    pub fn flatten_all(&self) -> Vec<Index> {
        self.flatten_where(|_| true, |_, _| true)
    }

    /// Pre-order iterator over every node of every root.
    pub fn iter(&self) -> ForestIterator<'_, T> {
        ForestIterator::new(self)
    }

    /// Mutable access to every node, arena order. Used for whole-forest flag
    /// sweeps; does not expose structure.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (Index, &mut TreeNode<T>)> {
        self.arena.iter_mut()
    }
}

pub struct ForestIterator<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<Index>,
}

impl<'a, T> ForestIterator<'a, T> {
    fn new(forest: &'a Forest<T>) -> Self {
        let stack = forest.roots.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a, T> Iterator for ForestIterator<'a, T> {
    type Item = (Index, &'a TreeNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Forest<&'static str>, Index, Index, Index) {
        let mut forest = Forest::new();
        let a = forest.insert_node("a", None);
        let b = forest.insert_node("b", Some(a));
        let c = forest.insert_node("c", Some(b));
        (forest, a, b, c)
    }

    #[test]
    fn insert_node_tracks_parent_children_and_level() {
        let (forest, a, b, c) = sample();
        assert_eq!(forest.roots(), &[a]);
        assert_eq!(forest.get_node(a).unwrap().children, vec![b]);
        assert_eq!(forest.get_node(b).unwrap().parent, Some(a));
        assert_eq!(forest.get_node(c).unwrap().level, 2);
    }

    #[test]
    fn detach_and_attach_relevel_the_subtree() {
        let (mut forest, a, b, c) = sample();
        forest.detach(b);
        forest.attach(b, None, 1);
        assert_eq!(forest.roots(), &[a, b]);
        assert_eq!(forest.get_node(b).unwrap().level, 0);
        assert_eq!(forest.get_node(c).unwrap().level, 1);
    }

    #[test]
    fn remove_subtree_frees_every_descendant() {
        let (mut forest, a, b, _c) = sample();
        let removed = forest.remove_subtree(b);
        assert_eq!(removed, vec!["b", "c"]);
        assert_eq!(forest.len(), 1);
        assert!(forest.get_node(a).unwrap().children.is_empty());
    }

    #[test]
    fn iter_visits_left_to_right_pre_order() {
        let mut forest = Forest::new();
        let a = forest.insert_node("a", None);
        forest.insert_node("b", Some(a));
        forest.insert_node("c", Some(a));
        forest.insert_node("d", None);
        let order: Vec<_> = forest.iter().map(|(_, n)| n.value).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }
}
