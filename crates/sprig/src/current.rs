//! The ambient "current instance" used by the free-function helpers.
//!
//! The slot is only populated for the dynamic extent of a setup call: a
//! [`CurrentInstanceGuard`] pushes the instance and pops it on drop, so it is
//! cleared even if setup panics, and a setup that upgrades nested elements
//! restores the outer instance when the inner one finishes.
//!
//! Code that runs on behalf of an instance outside its setup (hooks, render
//! passes, attribute callbacks) pushes a mask instead. A nested element
//! upgraded from an outer setup therefore never sees the outer instance.

use std::cell::RefCell;

use crate::component::Component;
use crate::error::{report, Diagnostic};

thread_local! {
    static CURRENT_INSTANCE: RefCell<Vec<Option<Component>>> = const { RefCell::new(Vec::new()) };
}

/// Keeps an instance current (or hides the current one) until dropped.
#[must_use = "the instance stops being current as soon as the guard is dropped"]
pub(crate) struct CurrentInstanceGuard {
    _private: (),
}

impl CurrentInstanceGuard {
    pub(crate) fn enter(component: &Component) -> Self {
        Self::push(Some(component.clone()))
    }

    /// No instance is current until the guard drops.
    pub(crate) fn mask() -> Self {
        Self::push(None)
    }

    fn push(entry: Option<Component>) -> Self {
        CURRENT_INSTANCE.with(|stack| stack.borrow_mut().push(entry));
        CurrentInstanceGuard { _private: () }
    }
}

impl Drop for CurrentInstanceGuard {
    fn drop(&mut self) {
        CURRENT_INSTANCE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The instance whose setup function is running, if any.
pub fn current_instance() -> Option<Component> {
    CURRENT_INSTANCE.with(|stack| stack.borrow().last().cloned().flatten())
}

/// Run `f` against the current instance, or report `helper` as misused.
pub(crate) fn with_current<R>(helper: &'static str, f: impl FnOnce(&Component) -> R) -> Option<R> {
    match current_instance() {
        Some(component) => Some(f(&component)),
        None => {
            report(Diagnostic::NoActiveInstance { helper });
            None
        }
    }
}
