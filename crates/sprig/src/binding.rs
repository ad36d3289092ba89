//! Two-way binding helpers.

use std::rc::Rc;

use crate::error::{report, Diagnostic};
use crate::events::{Event, EventCallback};
use crate::value::Value;

/// An event handler that writes the event's payload into `target`.
///
/// `target` must be a writable reference cell. Anything else is reported as a
/// binding misuse when the handler fires, and the write is skipped.
///
/// # Example
///
/// ```ignore
/// let name = ref_cell("");
/// dom.add_event_listener(input, "input", update(&name));
/// ```
pub fn update(target: impl Into<Value>) -> EventCallback {
    let target = target.into();
    Rc::new(move |event: &Event| {
        let Value::Ref(cell) = &target else {
            report(Diagnostic::NotARef { helper: "update" });
            return;
        };
        let payload = event.value.clone().map(Value::Str).unwrap_or(Value::Null);
        if cell.set(payload).is_err() {
            report(Diagnostic::ReadOnlyRef { helper: "update" });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;
    use crate::error::take_diagnostics;
    use crate::value::{computed, ref_cell};

    fn input(value: &str) -> Event {
        let node = NodeId::from(0);
        Event {
            name: "input".into(),
            target: node,
            current_target: node,
            value: Some(value.into()),
        }
    }

    #[test]
    fn writes_payload_into_ref() {
        take_diagnostics();
        let name = ref_cell("");
        let handler = update(&name);

        handler(&input("ada"));

        assert_eq!(name.get_untracked(), Value::from("ada"));
        assert!(take_diagnostics().is_empty());
    }

    #[test]
    fn non_ref_target_is_reported() {
        take_diagnostics();
        let handler = update("plain");

        handler(&input("ignored"));

        assert_eq!(
            take_diagnostics(),
            vec![Diagnostic::NotARef { helper: "update" }]
        );
    }

    #[test]
    fn derived_target_is_reported() {
        take_diagnostics();
        let doubled = computed(|| 2);
        let handler = update(&doubled);

        handler(&input("3"));

        assert_eq!(doubled.get_untracked(), Value::Int(2));
        assert_eq!(
            take_diagnostics(),
            vec![Diagnostic::ReadOnlyRef { helper: "update" }]
        );
    }
}
