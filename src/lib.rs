//! Flattened list projections over expandable forests.
//!
//! A mutable multi-root tree (a forest) is projected into one ordered, flat
//! row sequence suitable for driving a linear list view. Each node can be
//! expanded or collapsed independently, and an asynchronous filter mode keeps
//! every ancestor path to a match visible without permanently rewriting the
//! caller's expansion choices.
//!
//! The engine decides *which* rows are visible and in *what order*; rendering,
//! input handling, and persistence stay with the caller.
//!
//! ```
//! use listtree::{add_items, ListTreeSource};
//!
//! let mut source = ListTreeSource::new();
//! add_items(
//!     vec!["a", "c"],
//!     |item| if *item == "a" { vec!["b"] } else { vec![] },
//!     &mut source,
//! );
//! assert_eq!(source.items().len(), 2); // collapsed: roots only
//!
//! source.toggle_expand(&"a");
//! assert_eq!(source.items().len(), 3);
//! ```

pub mod arena;
pub mod builder;
pub mod describe;
pub mod errors;
pub mod filter;
pub mod store;
pub mod traits;
pub mod util;

pub use arena::{Forest, ForestIterator, TreeNode};
pub use builder::add_items;
pub use describe::{describe_all_levels, describe_expanded_levels, describe_shown, to_tree_strings};
pub use errors::{TreeError, TreeResult};
pub use filter::FilterableListTreeSource;
pub use store::ListTreeSource;
pub use traits::ListTree;
