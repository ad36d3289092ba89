//! Template render results.
//!
//! A [`TemplateResult`] is what a component's render function returns: the
//! static strings of a template plus the values interpolated between them.
//! The static strings are shared behind an `Rc`, so two results from the same
//! template have the same slot identity.

use std::rc::Rc;

use crate::value::Value;

/// Static template parts plus interpolated values.
///
/// Invariant: `strings.len() == values.len() + 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateResult {
    strings: Rc<[&'static str]>,
    values: Vec<Value>,
}

impl TemplateResult {
    /// Build a render result.
    ///
    /// Missing trailing strings are padded with `""` and surplus strings are
    /// ignored so the invariant always holds.
    pub fn new(strings: Rc<[&'static str]>, values: Vec<Value>) -> Self {
        if strings.len() == values.len() + 1 {
            return Self { strings, values };
        }

        tracing::warn!(
            strings = strings.len(),
            values = values.len(),
            "template has mismatched static parts; normalizing"
        );
        let mut parts: Vec<&'static str> = strings.iter().copied().collect();
        parts.resize(values.len() + 1, "");
        Self {
            strings: Rc::from(parts),
            values,
        }
    }

    /// A template with no interpolations.
    pub fn text(markup: &'static str) -> Self {
        Self::new(Rc::from(&[markup][..]), Vec::new())
    }

    pub fn strings(&self) -> &[&'static str] {
        &self.strings
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Whether both results come from the same template.
    pub fn same_template(&self, other: &TemplateResult) -> bool {
        Rc::ptr_eq(&self.strings, &other.strings)
    }

    /// Same template, new values.
    pub(crate) fn with_values(&self, values: Vec<Value>) -> Self {
        Self {
            strings: Rc::clone(&self.strings),
            values,
        }
    }

    /// Interleave the static parts with the display form of each value.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for (index, part) in self.strings.iter().enumerate() {
            out.push_str(part);
            if let Some(value) = self.values.get(index) {
                out.push_str(&value.to_string());
            }
        }
        out
    }
}
