//! Test support: logging bootstrap and explicit outline fixtures.

use std::collections::HashMap;
use std::env;
use std::sync::Once;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::builder::add_items;
use crate::traits::ListTree;

static TEST_SETUP: Once = Once::new();

/// Installs the global tracing subscriber for test runs, once.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(env_filter),
        );
        // try_init fails when another harness already installed a subscriber.
        if subscriber.try_init().is_ok() {
            info!("Test setup complete");
        }
    });
}

/// Deterministic outline dataset with no hidden global state.
///
/// Generates string items labeled by path ("0", "0.1", "0.1.2", ...), with a
/// fixed breadth per level, and feeds any [`ListTree`] through the bulk
/// loader. Explicit builder instances replace the process-wide mock-data
/// singletons of typical demo apps.
#[derive(Debug, Clone)]
pub struct OutlineFixture {
    roots: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl OutlineFixture {
    /// Builds a fixture with `breadth[d]` children per node at depth `d`.
    /// `breadth = [2, 3]` yields 2 roots with 3 children each.
    pub fn with_breadth(breadth: &[usize]) -> Self {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let roots: Vec<String> = (0..breadth.first().copied().unwrap_or(0))
            .map(|i| i.to_string())
            .collect();

        let mut frontier = roots.clone();
        for &width in breadth.iter().skip(1) {
            let mut next = Vec::new();
            for label in &frontier {
                let kids: Vec<String> =
                    (0..width).map(|i| format!("{label}.{i}")).collect();
                next.extend(kids.iter().cloned());
                children.insert(label.clone(), kids);
            }
            frontier = next;
        }

        Self { roots, children }
    }

    /// A linear chain `0` -> `1` -> ... of the given depth, for exercising
    /// deep-nesting paths. Labels are flat indices so very deep chains stay
    /// cheap to generate.
    pub fn chain(depth: usize) -> Self {
        let mut children = HashMap::new();
        for i in 1..depth {
            children.insert((i - 1).to_string(), vec![i.to_string()]);
        }
        let roots = if depth == 0 {
            Vec::new()
        } else {
            vec!["0".to_string()]
        };
        Self { roots, children }
    }

    pub fn roots(&self) -> Vec<String> {
        self.roots.clone()
    }

    pub fn children_of(&self, item: &str) -> Vec<String> {
        self.children.get(item).cloned().unwrap_or_default()
    }

    /// Total number of items the fixture generates.
    pub fn len(&self) -> usize {
        self.roots.len() + self.children.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Bulk-loads the fixture into `source` and reloads it.
    pub fn populate<S: ListTree<String>>(&self, source: &mut S) {
        add_items(self.roots(), |item| self.children_of(item), source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_breadth_generates_expected_counts() {
        let fixture = OutlineFixture::with_breadth(&[2, 3, 1]);
        assert_eq!(fixture.roots().len(), 2);
        // 2 roots + 6 children + 6 grandchildren
        assert_eq!(fixture.len(), 14);
        assert_eq!(fixture.children_of("0").len(), 3);
        assert_eq!(fixture.children_of("0.1"), vec!["0.1.0".to_string()]);
    }

    #[test]
    fn with_breadth_accepts_degenerate_shapes() {
        let empty = OutlineFixture::with_breadth(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);

        let roots_only = OutlineFixture::with_breadth(&[3]);
        assert_eq!(roots_only.len(), 3);
        assert!(roots_only.children_of("0").is_empty());
    }

    #[test]
    fn chain_generates_one_path() {
        let fixture = OutlineFixture::chain(4);
        assert_eq!(fixture.len(), 4);
        assert_eq!(fixture.children_of("2"), vec!["3".to_string()]);
        assert!(fixture.children_of("3").is_empty());
    }
}
