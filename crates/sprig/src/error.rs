//! Error types and non-fatal diagnostics.
//!
//! Registration problems are fatal and returned as [`RegistryError`].
//! Misuse of an instance's surface is returned as [`ComponentError`].
//! Everything else degrades gracefully: it is reported as a [`Diagnostic`],
//! logged through `tracing`, and the operation becomes a no-op.

use std::cell::RefCell;

use thiserror::Error;

/// Errors raised while defining a component. Not recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{name}` is not a valid custom element name: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("a custom element named `{name}` has already been defined")]
    AlreadyDefined { name: String },
}

/// Errors returned by the instance surface and the host document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    #[error("unknown member `{name}` on `{component}`{}", suggestion_suffix(.suggestion))]
    UnknownMember {
        component: String,
        name: String,
        suggestion: Option<String>,
    },

    #[error("member `{name}` on `{component}` is read-only")]
    ReadOnlyMember { component: String, name: String },

    #[error("cannot write to a derived reference cell")]
    DerivedRefWrite,

    #[error("node {0} is not an element")]
    NotAnElement(usize),

    #[error("node {0} does not exist")]
    NoSuchNode(usize),

    #[error("cannot insert node {child} into node {parent}: {reason}")]
    HierarchyRequest {
        parent: usize,
        child: usize,
        reason: &'static str,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean `{}`?)", name),
        None => String::new(),
    }
}

/// A non-fatal usage problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error(
        "`{helper}` called outside of component setup; lifecycle and injection helpers only work while a setup function runs"
    )]
    NoActiveInstance { helper: &'static str },

    #[error("injection `{key}` not found")]
    InjectionNotFound { key: String },

    #[error("`{helper}` expects a reference cell; the write was skipped")]
    NotARef { helper: &'static str },

    #[error("`{helper}` cannot write to a derived reference cell; the write was skipped")]
    ReadOnlyRef { helper: &'static str },
}

// Per-thread log of reported diagnostics, drained by `take_diagnostics`.
thread_local! {
    static DIAGNOSTICS: RefCell<Vec<Diagnostic>> = const { RefCell::new(Vec::new()) };
}

/// Report a diagnostic: log it and record it for inspection.
pub fn report(diagnostic: Diagnostic) {
    tracing::warn!("sprig: {}", diagnostic);
    DIAGNOSTICS.with(|log| log.borrow_mut().push(diagnostic));
}

/// Drain every diagnostic reported on this thread so far.
pub fn take_diagnostics() -> Vec<Diagnostic> {
    DIAGNOSTICS.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_member_mentions_suggestion() {
        let err = ComponentError::UnknownMember {
            component: "x-counter".into(),
            name: "conut".into(),
            suggestion: Some("count".into()),
        };
        assert_eq!(
            err.to_string(),
            "unknown member `conut` on `x-counter` (did you mean `count`?)"
        );
    }

    #[test]
    fn reported_diagnostics_are_drained() {
        take_diagnostics();
        report(Diagnostic::NotARef { helper: "update" });
        assert_eq!(
            take_diagnostics(),
            vec![Diagnostic::NotARef { helper: "update" }]
        );
        assert!(take_diagnostics().is_empty());
    }
}
