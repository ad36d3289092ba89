//! Component instances.
//!
//! A [`Component`] is the live instance behind one custom element. It owns
//! the props container, lifecycle hooks, dependency table, exposed members,
//! mount state and the single render effect. Construction is strictly
//! sequenced:
//!
//! 1. props initialized from the definition's defaults
//! 2. the instance becomes the ambient current instance
//! 3. setup runs and returns the render function
//! 4. the ambient instance is cleared
//! 5. before-mount hooks
//! 6. render effect established (first render)
//! 7. style injection into the render root

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use sprig_core::{untracked, Effect, Scope};

use crate::current::CurrentInstanceGuard;
use crate::dom::{Dom, DomInner, NodeId};
use crate::error::ComponentError;
use crate::inject::{self, DependencyTable, InjectionKey};
use crate::lifecycle::{Lifecycle, LifecycleCallback, LifecycleHooks};
use crate::props::Props;
use crate::registry::ComponentDefinition;
use crate::render::{MountState, RenderFn};
use crate::suggestions::find_closest;
use crate::value::Value;

/// A member attached with `expose`.
#[derive(Clone, Debug)]
struct ExposedMember {
    value: Value,
    readonly: bool,
}

/// A live component instance. Cloning shares the instance.
#[derive(Clone)]
pub struct Component {
    pub(crate) inner: Rc<ComponentInner>,
}

pub(crate) struct ComponentInner {
    definition: Rc<ComponentDefinition>,
    node: NodeId,
    dom: Weak<DomInner>,
    render_root: NodeId,
    props: Props,
    hooks: LifecycleHooks,
    provides: Rc<DependencyTable>,
    exposed: RefCell<IndexMap<String, ExposedMember>>,
    pub(crate) state: Cell<MountState>,
    pub(crate) render_count: Cell<usize>,
    pub(crate) render_fn: OnceCell<RenderFn>,
    pub(crate) render_effect: OnceCell<Effect>,
    /// Owns the render effect and every effect created during setup.
    pub(crate) scope: Scope,
}

impl Drop for ComponentInner {
    fn drop(&mut self) {
        tracing::trace!(component = self.definition.name(), "instance released");
    }
}

impl Component {
    /// Allocate an instance for `node`. Setup has not run yet.
    pub(crate) fn new(definition: Rc<ComponentDefinition>, dom: &Dom, node: NodeId, render_root: NodeId) -> Self {
        let props = Props::from_defs(definition.props());
        Component {
            inner: Rc::new(ComponentInner {
                definition,
                node,
                dom: dom.downgrade(),
                render_root,
                props,
                hooks: LifecycleHooks::new(),
                provides: Rc::new(DependencyTable::new()),
                exposed: RefCell::new(IndexMap::new()),
                state: Cell::new(MountState::Unrendered),
                render_count: Cell::new(0),
                render_fn: OnceCell::new(),
                render_effect: OnceCell::new(),
                scope: Scope::new(),
            }),
        }
    }

    /// Run setup, before-mount hooks, the first render and style injection.
    pub(crate) fn initialize(&self) {
        if self.inner.render_fn.get().is_some() {
            return;
        }
        tracing::debug!(
            component = self.tag_name(),
            node = self.node().index(),
            "running setup"
        );

        let render = untracked(|| {
            self.inner.scope.run(|| {
                let _current = CurrentInstanceGuard::enter(self);
                let ctx = SetupContext {
                    component: self,
                    props: self.inner.props.clone(),
                };
                (self.inner.definition.setup())(&ctx)
            })
        });
        let _ = self.inner.render_fn.set(render);

        // Hooks and the first render must not see the instance (or an outer one)
        let _masked = CurrentInstanceGuard::mask();
        self.hooks().run(Lifecycle::BeforeMount, self);
        untracked(|| self.establish_render_effect());

        if let (Some(style), Some(dom)) = (&self.inner.definition.options().style_text, self.dom()) {
            dom.inject_style(self.render_root(), style);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn tag_name(&self) -> &str {
        self.inner.definition.name()
    }

    pub fn definition(&self) -> &Rc<ComponentDefinition> {
        &self.inner.definition
    }

    /// The element this instance is attached to.
    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    /// The node render output is projected into: the element itself or its
    /// isolated shadow root.
    pub fn render_root(&self) -> NodeId {
        self.inner.render_root
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub fn mount_state(&self) -> MountState {
        self.inner.state.get()
    }

    /// Completed render passes.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    pub fn dom(&self) -> Option<Dom> {
        Dom::from_weak(&self.inner.dom)
    }

    pub(crate) fn hooks(&self) -> &LifecycleHooks {
        &self.inner.hooks
    }

    pub(crate) fn dependency_table(&self) -> Rc<DependencyTable> {
        Rc::clone(&self.inner.provides)
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Member access
    // ------------------------------------------------------------------

    /// Read a property or exposed member. Property reads are tracked.
    pub fn get(&self, name: &str) -> Result<Value, ComponentError> {
        if let Some(value) = self.inner.props.get(name) {
            return Ok(value);
        }
        if let Some(member) = self.inner.exposed.borrow().get(name) {
            return Ok(member.value.clone());
        }
        Err(self.unknown_member(name))
    }

    /// Write a property or a writable exposed member.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), ComponentError> {
        let value = value.into();
        if self.inner.props.contains(name) {
            self.inner.props.set(name, value);
            return Ok(());
        }

        let mut exposed = self.inner.exposed.borrow_mut();
        match exposed.get_mut(name) {
            Some(member) if member.readonly => Err(ComponentError::ReadOnlyMember {
                component: self.tag_name().to_string(),
                name: name.to_string(),
            }),
            Some(member) => {
                member.value = value;
                Ok(())
            }
            None => {
                drop(exposed);
                Err(self.unknown_member(name))
            }
        }
    }

    /// Attach a writable member.
    pub fn expose(&self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ComponentError> {
        self.attach_member(name.into(), value.into(), false)
    }

    /// Attach a member that `set` refuses to overwrite.
    pub fn expose_readonly(&self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ComponentError> {
        self.attach_member(name.into(), value.into(), true)
    }

    fn attach_member(&self, name: String, value: Value, readonly: bool) -> Result<(), ComponentError> {
        let conflict = self.inner.props.contains(&name)
            || self
                .inner
                .exposed
                .borrow()
                .get(&name)
                .is_some_and(|member| member.readonly);
        if conflict {
            return Err(ComponentError::ReadOnlyMember {
                component: self.tag_name().to_string(),
                name,
            });
        }

        self.inner
            .exposed
            .borrow_mut()
            .insert(name, ExposedMember { value, readonly });
        Ok(())
    }

    /// Names of all properties followed by all exposed members.
    pub fn member_names(&self) -> Vec<String> {
        self.inner
            .props
            .keys()
            .map(str::to_string)
            .chain(self.inner.exposed.borrow().keys().cloned())
            .collect()
    }

    fn unknown_member(&self, name: &str) -> ComponentError {
        let known = self.member_names();
        ComponentError::UnknownMember {
            component: self.tag_name().to_string(),
            name: name.to_string(),
            suggestion: find_closest(name, known.iter().map(String::as_str)),
        }
    }

    // ------------------------------------------------------------------
    // Provide / inject
    // ------------------------------------------------------------------

    /// Bind `key` on this instance, replacing any earlier binding.
    pub fn provide(&self, key: InjectionKey, value: impl Into<Value>) {
        self.inner.provides.provide(key, value.into());
    }

    /// Resolve `key` here or on the nearest providing ancestor.
    ///
    /// A miss reports a diagnostic and yields [`Value::Absent`].
    pub fn inject(&self, key: InjectionKey) -> Value {
        inject::settle(&key, self.lookup(&key), None)
    }

    /// Resolve `key`, falling back to `default` on a miss.
    pub fn inject_or(&self, key: InjectionKey, default: impl Into<Value>) -> Value {
        inject::settle(&key, self.lookup(&key), Some(default.into()))
    }

    fn lookup(&self, key: &InjectionKey) -> Option<Value> {
        if let Some(value) = self.inner.provides.lookup(key) {
            return Some(value);
        }
        let dom = self.dom()?;
        let ancestor = inject::ContainerHierarchy::nearest_scoped_ancestor(&dom, self.node())?;
        inject::resolve(&dom, ancestor, key)
    }

    // ------------------------------------------------------------------
    // Host callbacks
    // ------------------------------------------------------------------

    /// The host connected the element.
    pub(crate) fn connected(&self) {
        if self.mount_state() == MountState::Mounted {
            return;
        }
        self.inner.state.set(MountState::Mounted);
        tracing::debug!(component = self.tag_name(), node = self.node().index(), "mounted");
        let _masked = CurrentInstanceGuard::mask();
        self.hooks().run(Lifecycle::Mounted, self);
    }

    /// The host disconnected the element.
    pub(crate) fn disconnected(&self) {
        if self.mount_state() != MountState::Mounted {
            return;
        }
        self.inner.state.set(MountState::Rendered);
        tracing::debug!(component = self.tag_name(), node = self.node().index(), "unmounted");
        let _masked = CurrentInstanceGuard::mask();
        self.hooks().run(Lifecycle::Unmounted, self);
    }

    /// The host reported a write to an observed attribute.
    pub(crate) fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        let Some(def) = self.inner.definition.props().get(name) else {
            return;
        };
        tracing::trace!(
            component = self.tag_name(),
            attribute = name,
            ?old,
            ?new,
            "attribute changed"
        );
        let _masked = CurrentInstanceGuard::mask();
        self.inner.props.set(def.name(), def.parse_attribute(new));
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("tag", &self.tag_name())
            .field("node", &self.node())
            .field("state", &self.mount_state())
            .field("renders", &self.render_count())
            .finish()
    }
}

// ============================================================================
// Setup context
// ============================================================================

/// What a setup function receives: the instance being constructed and its
/// props. Everything registered here targets that instance explicitly.
pub struct SetupContext<'a> {
    component: &'a Component,
    props: Props,
}

impl<'a> SetupContext<'a> {
    pub fn component(&self) -> &'a Component {
        self.component
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    fn register(&self, phase: Lifecycle, callback: LifecycleCallback) {
        self.component.hooks().register(phase, callback);
    }

    pub fn on_before_mount(&self, f: impl Fn(&Component) + 'static) {
        self.register(Lifecycle::BeforeMount, Rc::new(f));
    }

    pub fn on_mounted(&self, f: impl Fn(&Component) + 'static) {
        self.register(Lifecycle::Mounted, Rc::new(f));
    }

    pub fn on_before_update(&self, f: impl Fn(&Component) + 'static) {
        self.register(Lifecycle::BeforeUpdate, Rc::new(f));
    }

    pub fn on_updated(&self, f: impl Fn(&Component) + 'static) {
        self.register(Lifecycle::Updated, Rc::new(f));
    }

    pub fn on_unmounted(&self, f: impl Fn(&Component) + 'static) {
        self.register(Lifecycle::Unmounted, Rc::new(f));
    }

    pub fn provide(&self, key: InjectionKey, value: impl Into<Value>) {
        self.component.provide(key, value);
    }

    pub fn inject(&self, key: InjectionKey) -> Value {
        self.component.inject(key)
    }

    pub fn inject_or(&self, key: InjectionKey, default: impl Into<Value>) -> Value {
        self.component.inject_or(key, default)
    }

    pub fn expose(&self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ComponentError> {
        self.component.expose(name, value)
    }

    pub fn expose_readonly(&self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ComponentError> {
        self.component.expose_readonly(name, value)
    }
}
