//! Shared operation surface for both source flavors, so bulk construction
//! and fixtures can target either one.

/// The minimal mutation surface a flattenable tree source exposes.
pub trait ListTree<T> {
    /// Appends `items` under the node for `parent`, or as new roots.
    fn append(&mut self, items: Vec<T>, parent: Option<&T>);

    /// Recomputes the visible projection from current state.
    fn reload(&mut self);
}
