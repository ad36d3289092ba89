//! An in-memory host document.
//!
//! [`Dom`] plays the part of the browser platform for sprig components: it
//! owns the node tree and the custom element registry, constructs component
//! instances, and reports connection, disconnection and attribute changes to
//! them. Render output is projected as markup text onto the render root; no
//! structural diffing happens here.
//!
//! Elements whose tag is defined are upgraded (constructed) when they first
//! become connected, parents before children, or immediately by
//! [`Dom::define`] if they are already connected. After construction the
//! element's existing observed attributes are replayed, then it is connected.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use sprig_core::batch;

use crate::component::Component;
use crate::error::{ComponentError, RegistryError};
use crate::events::{Event, EventCallback, EventHandlerId, EventRegistry};
use crate::inject::{ContainerHierarchy, DependencyTable};
use crate::registry::{ComponentDefinition, ElementRegistry};
use crate::template::TemplateResult;

/// Handle to a node in a [`Dom`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

enum NodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        shadow_root: Option<NodeId>,
    },
    ShadowRoot {
        host: NodeId,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Markup projected by the last render into this node.
    rendered: Option<String>,
    /// Style sheets injected into this node.
    styles: Vec<String>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            rendered: None,
            styles: Vec::new(),
        }
    }
}

pub(crate) struct DomInner {
    nodes: RefCell<Vec<NodeData>>,
    registry: RefCell<ElementRegistry>,
    instances: RefCell<HashMap<NodeId, Component>>,
    events: RefCell<EventRegistry>,
    body: NodeId,
}

/// The host document. Cloning shares the document.
#[derive(Clone)]
pub struct Dom {
    inner: Rc<DomInner>,
}

impl Dom {
    /// A document containing only an empty `body`.
    pub fn new() -> Self {
        let body = NodeData::new(NodeKind::Element {
            tag: "body".to_string(),
            attributes: IndexMap::new(),
            shadow_root: None,
        });
        Self {
            inner: Rc::new(DomInner {
                nodes: RefCell::new(vec![body]),
                registry: RefCell::new(ElementRegistry::new()),
                instances: RefCell::new(HashMap::new()),
                events: RefCell::new(EventRegistry::new()),
                body: NodeId(0),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<DomInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_weak(weak: &Weak<DomInner>) -> Option<Dom> {
        weak.upgrade().map(|inner| Dom { inner })
    }

    /// The document root. Everything below it is connected.
    pub fn body(&self) -> NodeId {
        self.inner.body
    }

    fn push_node(&self, kind: NodeKind) -> NodeId {
        let mut nodes = self.inner.nodes.borrow_mut();
        nodes.push(NodeData::new(kind));
        NodeId(nodes.len() - 1)
    }

    fn check(&self, node: NodeId) -> Result<(), ComponentError> {
        if node.0 < self.inner.nodes.borrow().len() {
            Ok(())
        } else {
            Err(ComponentError::NoSuchNode(node.0))
        }
    }

    // ========================================================================
    // Tree construction
    // ========================================================================

    /// Create a detached element. Defined tags are upgraded once connected.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            shadow_root: None,
        })
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    /// Append `child` to `parent`, moving it if it already has a parent.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), ComponentError> {
        self.check(parent)?;
        self.check(child)?;
        self.validate_insertion(parent, child)?;

        let old_parent = self.inner.nodes.borrow()[child.0].parent;
        if let Some(old_parent) = old_parent {
            // Moving: detach first so the subtree sees a disconnect
            self.remove_child(old_parent, child)?;
        }

        {
            let mut nodes = self.inner.nodes.borrow_mut();
            nodes[parent.0].children.push(child);
            nodes[child.0].parent = Some(parent);
        }

        if self.is_connected(parent) {
            self.connect_subtree(child);
        }
        Ok(())
    }

    fn validate_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), ComponentError> {
        let reject = |reason| {
            Err(ComponentError::HierarchyRequest {
                parent: parent.0,
                child: child.0,
                reason,
            })
        };

        {
            let nodes = self.inner.nodes.borrow();
            if matches!(nodes[parent.0].kind, NodeKind::Text(_)) {
                return reject("text nodes cannot have children");
            }
            if matches!(nodes[child.0].kind, NodeKind::ShadowRoot { .. }) {
                return reject("shadow roots cannot be inserted");
            }
        }
        if child == self.body() {
            return reject("the document root cannot be moved");
        }

        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return reject("a node cannot contain itself");
            }
            current = self.parent_of(node);
        }
        Ok(())
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), ComponentError> {
        self.check(parent)?;
        self.check(child)?;

        let was_connected = self.is_connected(child);
        {
            let mut nodes = self.inner.nodes.borrow_mut();
            if nodes[child.0].parent != Some(parent) {
                return Err(ComponentError::HierarchyRequest {
                    parent: parent.0,
                    child: child.0,
                    reason: "not a child of this parent",
                });
            }
            nodes[parent.0].children.retain(|c| *c != child);
            nodes[child.0].parent = None;
        }

        if was_connected {
            self.disconnect_subtree(child);
        }
        Ok(())
    }

    /// Attach an isolated shadow root to an element, or return the existing one.
    pub fn attach_shadow(&self, host: NodeId) -> Result<NodeId, ComponentError> {
        self.check(host)?;
        match &self.inner.nodes.borrow()[host.0].kind {
            NodeKind::Element {
                shadow_root: Some(root),
                ..
            } => return Ok(*root),
            NodeKind::Element { .. } => {}
            _ => return Err(ComponentError::NotAnElement(host.0)),
        }

        let root = self.push_node(NodeKind::ShadowRoot { host });
        if let NodeKind::Element { shadow_root, .. } = &mut self.inner.nodes.borrow_mut()[host.0].kind {
            *shadow_root = Some(root);
        }
        Ok(root)
    }

    // ========================================================================
    // Tree queries
    // ========================================================================

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        match &self.inner.nodes.borrow().get(host.0)?.kind {
            NodeKind::Element { shadow_root, .. } => *shadow_root,
            _ => None,
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .nodes
            .borrow()
            .get(node.0)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.inner.nodes.borrow().get(node.0)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        match &self.inner.nodes.borrow().get(node.0)?.kind {
            NodeKind::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Whether the node is in the document, crossing shadow boundaries.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == self.body() {
                return true;
            }
            current = self.parent_of(candidate);
        }
        false
    }

    /// Connected elements with the given tag, in tree order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.tree_order(self.body())
            .into_iter()
            .filter(|node| self.tag_name(*node).as_deref() == Some(tag))
            .collect()
    }

    /// `root` and its descendants in tree order; a shadow root is visited
    /// before its host's light children.
    fn tree_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        let nodes = self.inner.nodes.borrow();
        while let Some(node) = stack.pop() {
            order.push(node);
            let data = &nodes[node.0];
            stack.extend(data.children.iter().rev().copied());
            if let NodeKind::Element {
                shadow_root: Some(shadow),
                ..
            } = data.kind
            {
                stack.push(shadow);
            }
        }
        order
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.inner.nodes.borrow().get(node.0)?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            _ => None,
        }
    }

    /// Set an attribute; observed attributes are forwarded to the instance.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), ComponentError> {
        let old = self.write_attribute(node, name, Some(value))?;
        self.notify_attribute(node, name, old.as_deref(), Some(value));
        Ok(())
    }

    /// Remove an attribute; observed attributes are forwarded as `None`.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), ComponentError> {
        if let Some(old) = self.write_attribute(node, name, None)? {
            self.notify_attribute(node, name, Some(&old), None);
        }
        Ok(())
    }

    fn write_attribute(
        &self,
        node: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<Option<String>, ComponentError> {
        self.check(node)?;
        let mut nodes = self.inner.nodes.borrow_mut();
        let NodeKind::Element { attributes, .. } = &mut nodes[node.0].kind else {
            return Err(ComponentError::NotAnElement(node.0));
        };
        Ok(match value {
            Some(value) => attributes.insert(name.to_string(), value.to_string()),
            None => attributes.shift_remove(name),
        })
    }

    fn notify_attribute(&self, node: NodeId, name: &str, old: Option<&str>, new: Option<&str>) {
        if let Some(component) = self.instance(node) {
            component.attribute_changed(name, old, new);
        }
    }

    // ========================================================================
    // Custom elements
    // ========================================================================

    /// Register a component kind and upgrade matching connected elements.
    pub fn define(&self, definition: ComponentDefinition) -> Result<Rc<ComponentDefinition>, RegistryError> {
        let definition = self.inner.registry.borrow_mut().define(definition)?;
        tracing::debug!(
            component = definition.name(),
            observed = ?definition.observed_attributes(),
            "defined component"
        );

        for node in self.find_by_tag(definition.name()) {
            // An earlier upgrade may have detached it
            if self.is_connected(node) && self.instance(node).is_none() {
                self.upgrade(node);
                if let Some(component) = self.instance(node) {
                    component.connected();
                }
            }
        }
        Ok(definition)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.inner.registry.borrow().contains(name)
    }

    pub fn definition(&self, name: &str) -> Option<Rc<ComponentDefinition>> {
        self.inner.registry.borrow().get(name)
    }

    /// The component instance living on `node`.
    pub fn instance(&self, node: NodeId) -> Option<Component> {
        self.inner.instances.borrow().get(&node).cloned()
    }

    /// Construct the instance for `node` if its tag is defined.
    fn upgrade(&self, node: NodeId) {
        if self.instance(node).is_some() {
            return;
        }
        let Some(tag) = self.tag_name(node) else {
            return;
        };
        let Some(definition) = self.definition(&tag) else {
            return;
        };

        let render_root = if definition.options().isolated_style_scope {
            match self.attach_shadow(node) {
                Ok(root) => root,
                Err(err) => {
                    tracing::warn!(component = %tag, "cannot attach shadow root: {}", err);
                    node
                }
            }
        } else {
            node
        };

        tracing::debug!(component = %tag, node = node.0, "upgrading element");
        let component = Component::new(Rc::clone(&definition), self, node, render_root);
        // Registered before setup so descendants upgraded during setup can
        // resolve injections through it
        self.inner
            .instances
            .borrow_mut()
            .insert(node, component.clone());
        component.initialize();

        // Replay attributes that were set before the upgrade
        let present: Vec<(String, String)> = definition
            .observed_attributes()
            .into_iter()
            .filter_map(|name| {
                self.get_attribute(node, name)
                    .map(|value| (name.to_string(), value))
            })
            .collect();
        if !present.is_empty() {
            batch(|| {
                for (name, value) in &present {
                    component.attribute_changed(name, None, Some(value));
                }
            });
        }
    }

    fn connect_subtree(&self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            // Setup may have moved the node out of the document
            if !self.is_connected(node) {
                continue;
            }
            self.upgrade(node);
            if let Some(component) = self.instance(node) {
                component.connected();
            }

            // Read children after the upgrade so nodes added by setup are seen
            let nodes = self.inner.nodes.borrow();
            let data = &nodes[node.0];
            stack.extend(data.children.iter().rev().copied());
            if let NodeKind::Element {
                shadow_root: Some(shadow),
                ..
            } = data.kind
            {
                stack.push(shadow);
            }
        }
    }

    fn disconnect_subtree(&self, root: NodeId) {
        for node in self.tree_order(root) {
            if let Some(component) = self.instance(node) {
                component.disconnected();
            }
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Project a render result onto `root`, replacing earlier output.
    pub fn render(&self, result: &TemplateResult, root: NodeId) {
        let markup = result.to_markup();
        if let Some(data) = self.inner.nodes.borrow_mut().get_mut(root.0) {
            data.rendered = Some(markup);
        }
    }

    /// Markup projected by the last render into `node`.
    pub fn rendered_markup(&self, node: NodeId) -> Option<String> {
        self.inner.nodes.borrow().get(node.0)?.rendered.clone()
    }

    /// Markup a component renders, whether into itself or its shadow root.
    pub fn component_markup(&self, node: NodeId) -> Option<String> {
        let root = self.instance(node)?.render_root();
        self.rendered_markup(root)
    }

    /// Inject a style sheet into `root`. The same text is injected once.
    pub fn inject_style(&self, root: NodeId, style: &str) {
        let mut nodes = self.inner.nodes.borrow_mut();
        if let Some(data) = nodes.get_mut(root.0) {
            if !data.styles.iter().any(|s| s == style) {
                data.styles.push(style.to_string());
            }
        }
    }

    pub fn styles(&self, node: NodeId) -> Vec<String> {
        self.inner
            .nodes
            .borrow()
            .get(node.0)
            .map(|data| data.styles.clone())
            .unwrap_or_default()
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn add_event_listener(
        &self,
        node: NodeId,
        event: &str,
        callback: impl Fn(&Event) + 'static,
    ) -> EventHandlerId {
        let callback: EventCallback = Rc::new(callback);
        self.inner
            .events
            .borrow_mut()
            .register(node, event, callback)
    }

    pub fn remove_event_listener(&self, id: EventHandlerId) -> bool {
        self.inner.events.borrow_mut().remove(id)
    }

    /// Dispatch an event on `target`, bubbling toward the root.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch_event(&self, target: NodeId, name: &str, value: Option<&str>) -> usize {
        let mut invoked = 0;
        let mut current = Some(target);
        while let Some(node) = current {
            let listeners = self.inner.events.borrow().listeners(node, name);
            let event = Event {
                name: name.to_string(),
                target,
                current_target: node,
                value: value.map(str::to_string),
            };
            for listener in listeners {
                listener(&event);
                invoked += 1;
            }
            current = self.parent_of(node);
        }
        tracing::trace!(event = name, target = target.0, invoked, "dispatched event");
        invoked
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.inner.nodes.borrow().len())
            .field("definitions", &self.inner.registry.borrow().len())
            .field("instances", &self.inner.instances.borrow().len())
            .finish()
    }
}

impl ContainerHierarchy for Dom {
    /// A shadow root's parent is its host.
    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        let nodes = self.inner.nodes.borrow();
        let data = nodes.get(node.0)?;
        match data.kind {
            NodeKind::ShadowRoot { host } => Some(host),
            _ => data.parent,
        }
    }

    fn scope_at(&self, node: NodeId) -> Option<Rc<DependencyTable>> {
        self.instance(node).map(|component| component.dependency_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_structure() {
        let dom = Dom::new();
        let div = dom.create_element("DIV");
        let text = dom.create_text("hi");

        dom.append_child(dom.body(), div).unwrap();
        dom.append_child(div, text).unwrap();

        assert_eq!(dom.tag_name(div).as_deref(), Some("div"));
        assert_eq!(dom.children(div), vec![text]);
        assert_eq!(dom.parent_of(text), Some(div));
        assert!(dom.is_connected(text));

        dom.remove_child(dom.body(), div).unwrap();
        assert!(!dom.is_connected(text));
    }

    #[test]
    fn invalid_insertions_are_rejected() {
        let dom = Dom::new();
        let outer = dom.create_element("div");
        let inner = dom.create_element("div");
        let text = dom.create_text("t");
        dom.append_child(outer, inner).unwrap();

        assert!(matches!(
            dom.append_child(inner, outer),
            Err(ComponentError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            dom.append_child(text, inner),
            Err(ComponentError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            dom.append_child(outer, NodeId::from(999)),
            Err(ComponentError::NoSuchNode(999))
        ));
        assert!(dom.remove_child(text, inner).is_err());
    }

    #[test]
    fn moving_a_node_reparents_it() {
        let dom = Dom::new();
        let a = dom.create_element("div");
        let b = dom.create_element("div");
        let child = dom.create_element("span");
        dom.append_child(a, child).unwrap();
        dom.append_child(b, child).unwrap();

        assert!(dom.children(a).is_empty());
        assert_eq!(dom.children(b), vec![child]);
    }

    #[test]
    fn shadow_roots_belong_to_their_host() {
        let dom = Dom::new();
        let host = dom.create_element("div");
        dom.append_child(dom.body(), host).unwrap();
        let shadow = dom.attach_shadow(host).unwrap();
        let inside = dom.create_element("p");
        dom.append_child(shadow, inside).unwrap();

        assert_eq!(dom.attach_shadow(host).unwrap(), shadow);
        assert_eq!(dom.parent_of(shadow), Some(host));
        assert!(dom.is_connected(inside));
        assert!(dom.attach_shadow(dom.create_text("x")).is_err());
    }

    #[test]
    fn attributes_round_trip() {
        let dom = Dom::new();
        let el = dom.create_element("div");
        dom.set_attribute(el, "title", "a").unwrap();
        assert_eq!(dom.get_attribute(el, "title").as_deref(), Some("a"));

        dom.remove_attribute(el, "title").unwrap();
        assert_eq!(dom.get_attribute(el, "title"), None);
        assert!(dom.set_attribute(dom.create_text("t"), "x", "y").is_err());
    }

    #[test]
    fn events_bubble_to_ancestors() {
        let dom = Dom::new();
        let outer = dom.create_element("div");
        let button = dom.create_element("button");
        dom.append_child(outer, button).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for node in [button, outer] {
            let seen = Rc::clone(&seen);
            dom.add_event_listener(node, "click", move |event: &Event| {
                seen.borrow_mut().push((event.target, event.current_target));
            });
        }

        assert_eq!(dom.dispatch_event(button, "click", None), 2);
        assert_eq!(*seen.borrow(), vec![(button, button), (button, outer)]);
        assert_eq!(dom.dispatch_event(button, "input", None), 0);
    }

    #[test]
    fn styles_are_injected_once() {
        let dom = Dom::new();
        let el = dom.create_element("div");
        dom.inject_style(el, "p{}");
        dom.inject_style(el, "p{}");
        assert_eq!(dom.styles(el), vec!["p{}".to_string()]);
    }
}
