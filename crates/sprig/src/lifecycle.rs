//! Lifecycle hook tables.
//!
//! Each instance owns one ordered list of callbacks per [`Lifecycle`] phase.
//! Callbacks are appended while setup runs and invoked in registration order
//! afterwards. There is no removal and no de-duplication.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::component::Component;
use crate::current::with_current;

/// A lifecycle callback. Receives the instance it was registered on.
pub type LifecycleCallback = Rc<dyn Fn(&Component)>;

/// The five lifecycle phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// After setup, before the first render.
    BeforeMount,
    /// Each time the element is connected to the document.
    Mounted,
    /// Before every render pass except the first.
    BeforeUpdate,
    /// After every render pass except the first.
    Updated,
    /// Each time the element is disconnected from the document.
    Unmounted,
}

impl Lifecycle {
    pub const ALL: [Lifecycle; 5] = [
        Lifecycle::BeforeMount,
        Lifecycle::Mounted,
        Lifecycle::BeforeUpdate,
        Lifecycle::Updated,
        Lifecycle::Unmounted,
    ];

    fn index(self) -> usize {
        match self {
            Lifecycle::BeforeMount => 0,
            Lifecycle::Mounted => 1,
            Lifecycle::BeforeUpdate => 2,
            Lifecycle::Updated => 3,
            Lifecycle::Unmounted => 4,
        }
    }

    /// Name of the free-function helper registering this phase.
    pub fn helper_name(self) -> &'static str {
        match self {
            Lifecycle::BeforeMount => "on_before_mount",
            Lifecycle::Mounted => "on_mounted",
            Lifecycle::BeforeUpdate => "on_before_update",
            Lifecycle::Updated => "on_updated",
            Lifecycle::Unmounted => "on_unmounted",
        }
    }
}

/// Per-instance callback lists, one per phase.
#[derive(Default)]
pub struct LifecycleHooks {
    hooks: RefCell<[Vec<LifecycleCallback>; 5]>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, phase: Lifecycle, callback: LifecycleCallback) {
        self.hooks.borrow_mut()[phase.index()].push(callback);
    }

    pub fn len(&self, phase: Lifecycle) -> usize {
        self.hooks.borrow()[phase.index()].len()
    }

    /// Invoke every callback of a phase in registration order.
    ///
    /// The list is snapshotted first, so a callback that registers another
    /// callback does not see it run in the same dispatch. Reads made by
    /// callbacks are not tracked.
    pub fn run(&self, phase: Lifecycle, component: &Component) {
        let callbacks: Vec<LifecycleCallback> = self.hooks.borrow()[phase.index()].clone();
        if callbacks.is_empty() {
            return;
        }

        tracing::trace!(
            component = component.tag_name(),
            phase = ?phase,
            count = callbacks.len(),
            "dispatching lifecycle hooks"
        );
        sprig_core::untracked(|| {
            for callback in &callbacks {
                callback(component);
            }
        });
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for phase in Lifecycle::ALL {
            map.entry(&phase, &self.len(phase));
        }
        map.finish()
    }
}

fn register_on_current(phase: Lifecycle, callback: LifecycleCallback) {
    with_current(phase.helper_name(), |component| {
        component.hooks().register(phase, callback)
    });
}

/// Register a before-mount callback on the instance currently running setup.
pub fn on_before_mount(f: impl Fn(&Component) + 'static) {
    register_on_current(Lifecycle::BeforeMount, Rc::new(f));
}

/// Register a mounted callback on the instance currently running setup.
pub fn on_mounted(f: impl Fn(&Component) + 'static) {
    register_on_current(Lifecycle::Mounted, Rc::new(f));
}

/// Register a before-update callback on the instance currently running setup.
pub fn on_before_update(f: impl Fn(&Component) + 'static) {
    register_on_current(Lifecycle::BeforeUpdate, Rc::new(f));
}

/// Register an updated callback on the instance currently running setup.
pub fn on_updated(f: impl Fn(&Component) + 'static) {
    register_on_current(Lifecycle::Updated, Rc::new(f));
}

/// Register an unmounted callback on the instance currently running setup.
pub fn on_unmounted(f: impl Fn(&Component) + 'static) {
    register_on_current(Lifecycle::Unmounted, Rc::new(f));
}
