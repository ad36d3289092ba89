//! Hierarchical provide/inject.
//!
//! Every instance owns a [`DependencyTable`]. `inject` checks the local table
//! first and then asks the nearest ancestor that owns a table, strictly
//! upward through the container hierarchy. Plain nodes in between are
//! skipped. The hierarchy is reached only through [`ContainerHierarchy`], so
//! resolution can be exercised on any tree, not just the host document.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::component::Component;
use crate::current::with_current;
use crate::dom::NodeId;
use crate::error::{report, Diagnostic};
use crate::value::Value;

/// Global counter for generating unique injection keys.
static NEXT_KEY_ID: AtomicUsize = AtomicUsize::new(0);

/// An opaque, unique key for a provided value.
///
/// Two keys created with the same description are still distinct.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InjectionKey {
    id: usize,
    description: &'static str,
}

impl InjectionKey {
    pub fn new(description: &'static str) -> Self {
        Self {
            id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    pub fn description(&self) -> &'static str {
        self.description
    }
}

impl fmt::Debug for InjectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InjectionKey({}#{})", self.description, self.id)
    }
}

impl fmt::Display for InjectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description)
    }
}

/// One instance's provided bindings. The last `provide` for a key wins.
#[derive(Default)]
pub struct DependencyTable {
    bindings: RefCell<HashMap<InjectionKey, Value>>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provide(&self, key: InjectionKey, value: Value) {
        self.bindings.borrow_mut().insert(key, value);
    }

    pub fn lookup(&self, key: &InjectionKey) -> Option<Value> {
        self.bindings.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &InjectionKey) -> bool {
        self.bindings.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }
}

impl fmt::Debug for DependencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.bindings.borrow().iter()).finish()
    }
}

/// The narrow view of a tree that dependency resolution needs.
pub trait ContainerHierarchy {
    /// The containing node, or `None` at the top of the tree.
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// The dependency table owned by the node, if it is a component.
    fn scope_at(&self, node: NodeId) -> Option<Rc<DependencyTable>>;

    /// The nearest strict ancestor that owns a dependency table.
    fn nearest_scoped_ancestor(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.parent_of(node);
        while let Some(candidate) = current {
            if self.scope_at(candidate).is_some() {
                return Some(candidate);
            }
            current = self.parent_of(candidate);
        }
        None
    }
}

/// Resolve `key` starting at `node`: the node's own table, then each scoped
/// ancestor in turn.
pub fn resolve<H>(hierarchy: &H, node: NodeId, key: &InjectionKey) -> Option<Value>
where
    H: ContainerHierarchy + ?Sized,
{
    if let Some(value) = hierarchy
        .scope_at(node)
        .and_then(|table| table.lookup(key))
    {
        return Some(value);
    }

    let ancestor = hierarchy.nearest_scoped_ancestor(node)?;
    resolve(hierarchy, ancestor, key)
}

/// Settle a resolution: the found value, else the default, else a reported
/// miss resolving to [`Value::Absent`].
pub(crate) fn settle(key: &InjectionKey, found: Option<Value>, default: Option<Value>) -> Value {
    match (found, default) {
        (Some(value), _) => value,
        (None, Some(default)) => default,
        (None, None) => {
            report(Diagnostic::InjectionNotFound {
                key: key.to_string(),
            });
            Value::Absent
        }
    }
}

/// Provide a value from the instance currently running setup.
pub fn provide(key: InjectionKey, value: impl Into<Value>) {
    let value = value.into();
    with_current("provide", |component: &Component| {
        component.provide(key, value)
    });
}

/// Inject a value into the instance currently running setup.
///
/// Resolves to [`Value::Absent`] (with a diagnostic) when nothing provides
/// `key` or when called outside setup.
pub fn inject(key: InjectionKey) -> Value {
    with_current("inject", |component: &Component| component.inject(key))
        .unwrap_or(Value::Absent)
}

/// Like [`inject`], falling back to `default` when nothing provides `key`.
///
/// Outside setup the usage error is reported and `default` is returned.
pub fn inject_or(key: InjectionKey, default: impl Into<Value>) -> Value {
    let default = default.into();
    let fallback = default.clone();
    with_current("inject", |component: &Component| {
        component.inject_or(key, default)
    })
    .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::take_diagnostics;

    /// A synthetic tree: parent links plus tables on some nodes.
    #[derive(Default)]
    struct Tree {
        parents: HashMap<NodeId, NodeId>,
        scopes: HashMap<NodeId, Rc<DependencyTable>>,
    }

    impl Tree {
        fn link(&mut self, child: usize, parent: usize) {
            self.parents.insert(NodeId::from(child), NodeId::from(parent));
        }

        fn scope(&mut self, node: usize) -> Rc<DependencyTable> {
            Rc::clone(self.scopes.entry(NodeId::from(node)).or_default())
        }
    }

    impl ContainerHierarchy for Tree {
        fn parent_of(&self, node: NodeId) -> Option<NodeId> {
            self.parents.get(&node).copied()
        }

        fn scope_at(&self, node: NodeId) -> Option<Rc<DependencyTable>> {
            self.scopes.get(&node).cloned()
        }
    }

    #[test]
    fn keys_are_unique_even_with_equal_descriptions() {
        let a = InjectionKey::new("theme");
        let b = InjectionKey::new("theme");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "theme");
    }

    #[test]
    fn last_provide_wins() {
        let table = DependencyTable::new();
        let key = InjectionKey::new("k");
        table.provide(key, Value::from(1));
        table.provide(key, Value::from(2));
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(&key), Some(Value::Int(2)));
    }

    #[test]
    fn local_binding_beats_ancestors() {
        // 0 (scoped) -> 1 (scoped)
        let mut tree = Tree::default();
        tree.link(1, 0);
        let key = InjectionKey::new("k");
        tree.scope(0).provide(key, Value::from("outer"));
        tree.scope(1).provide(key, Value::from("inner"));

        assert_eq!(
            resolve(&tree, NodeId::from(1), &key),
            Some(Value::from("inner"))
        );
    }

    #[test]
    fn walk_skips_plain_nodes_and_closest_provider_wins() {
        // 0 (scoped, provides) -> 1 (scoped, provides) -> 2 (plain) -> 3 (scoped)
        let mut tree = Tree::default();
        tree.link(1, 0);
        tree.link(2, 1);
        tree.link(3, 2);
        let key = InjectionKey::new("k");
        tree.scope(0).provide(key, Value::from(0));
        tree.scope(1).provide(key, Value::from(1));
        tree.scope(3);

        assert_eq!(tree.nearest_scoped_ancestor(NodeId::from(3)), Some(NodeId::from(1)));
        assert_eq!(resolve(&tree, NodeId::from(3), &key), Some(Value::from(1)));
    }

    #[test]
    fn walk_never_looks_sideways_or_down() {
        // 0 -> {1, 2}; 2 -> 3. Only 1 and 3 provide.
        let mut tree = Tree::default();
        tree.link(1, 0);
        tree.link(2, 0);
        tree.link(3, 2);
        tree.scope(0);
        tree.scope(2);
        let key = InjectionKey::new("k");
        tree.scope(1).provide(key, Value::from("sibling"));
        tree.scope(3).provide(key, Value::from("child"));

        assert_eq!(resolve(&tree, NodeId::from(2), &key), None);
    }

    #[test]
    fn settle_prefers_found_then_default_then_reports() {
        take_diagnostics();
        let key = InjectionKey::new("missing");

        assert_eq!(settle(&key, Some(Value::from(1)), Some(Value::from(2))), Value::Int(1));
        assert_eq!(settle(&key, None, Some(Value::from(2))), Value::Int(2));
        assert!(take_diagnostics().is_empty());

        assert_eq!(settle(&key, None, None), Value::Absent);
        assert_eq!(
            take_diagnostics(),
            vec![Diagnostic::InjectionNotFound {
                key: "missing".into()
            }]
        );
    }

    #[test]
    fn free_helpers_outside_setup_are_usage_errors() {
        take_diagnostics();
        let key = InjectionKey::new("k");
        provide(key, 1);
        assert_eq!(inject(key), Value::Absent);

        assert_eq!(
            take_diagnostics(),
            vec![
                Diagnostic::NoActiveInstance { helper: "provide" },
                Diagnostic::NoActiveInstance { helper: "inject" },
            ]
        );
    }

    #[test]
    fn inject_or_outside_setup_returns_the_default() {
        take_diagnostics();
        let key = InjectionKey::new("theme");
        assert_eq!(inject_or(key, "light"), Value::from("light"));
        assert_eq!(
            take_diagnostics(),
            vec![Diagnostic::NoActiveInstance { helper: "inject" }]
        );
    }
}
