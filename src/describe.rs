//! Debug renderings of a source's forest and projection.
//!
//! One row per line, two spaces of indent per level. Intended for test
//! assertions and log dumps, not for driving a view.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use generational_arena::Index;
use itertools::Itertools;
use termtree::Tree;

use crate::store::ListTreeSource;

/// Renders the current projection, one visible row per line.
pub fn describe_shown<T>(source: &ListTreeSource<T>) -> String
where
    T: Clone + Eq + Hash + Display,
{
    render_rows(source, source.shown_indices().iter().copied())
}

/// Renders every node regardless of expansion state.
pub fn describe_all_levels<T>(source: &ListTreeSource<T>) -> String
where
    T: Clone + Eq + Hash + Display,
{
    render_rows(source, source.forest().flatten_all().into_iter())
}

/// Renders the rows the plain expansion rule would show, regardless of any
/// active filter.
pub fn describe_expanded_levels<T>(source: &ListTreeSource<T>) -> String
where
    T: Clone + Eq + Hash + Display,
{
    let rows = source.forest().flatten_where(|n| n.expanded, |_, _| true);
    render_rows(source, rows.into_iter())
}

fn render_rows<T>(source: &ListTreeSource<T>, rows: impl Iterator<Item = Index>) -> String
where
    T: Clone + Eq + Hash + Display,
{
    rows.filter_map(|idx| source.get_node(idx))
        .map(|node| format!("{}{}", "  ".repeat(node.level), node.value))
        .join("\n")
}

/// Converts each root's hierarchy into a [`termtree::Tree`] for pretty
/// box-drawing dumps.
pub fn to_tree_strings<T>(source: &ListTreeSource<T>) -> Vec<Tree<String>>
where
    T: Clone + Eq + Hash + Display,
{
    source
        .forest()
        .roots()
        .iter()
        .filter_map(|&root| build_tree(source, root))
        .collect()
}

/// Post-order, explicit-stack build: a node is assembled only after every
/// child's subtree is finished, so arbitrarily deep hierarchies stay off the
/// call stack.
fn build_tree<T>(source: &ListTreeSource<T>, root: Index) -> Option<Tree<String>>
where
    T: Clone + Eq + Hash + Display,
{
    let mut built: HashMap<Index, Tree<String>> = HashMap::new();
    let mut stack = vec![(root, false)];
    while let Some((idx, children_done)) = stack.pop() {
        let Some(node) = source.get_node(idx) else {
            continue;
        };
        if children_done {
            let leaves: Vec<Tree<String>> = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(idx, Tree::new(node.value.to_string()).with_leaves(leaves));
        } else {
            stack.push((idx, true));
            for &child in node.children.iter().rev() {
                stack.push((child, false));
            }
        }
    }
    built.remove(&root)
}
