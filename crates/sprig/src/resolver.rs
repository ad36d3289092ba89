//! Reference-cell unwrapping at the render boundary.

use crate::template::TemplateResult;
use crate::value::Value;

/// Replace every reference-cell value with its current contents.
///
/// The input is left untouched; the output shares the input's static
/// strings, so slot identity and positions are preserved. Reading the cells
/// is tracked, which subscribes the running render effect to them.
pub fn resolve_refs(result: &TemplateResult) -> TemplateResult {
    let values = result
        .values()
        .iter()
        .map(|value| match value {
            Value::Ref(cell) => cell.get(),
            other => other.clone(),
        })
        .collect();
    result.with_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{computed, ref_cell};
    use std::rc::Rc;

    #[test]
    fn unwraps_refs_in_place() {
        let plain = Value::any("payload");
        let input = TemplateResult::new(
            Rc::from(&["<a>", "", "", "</a>"][..]),
            vec![
                Value::from(ref_cell(5)),
                Value::from("x"),
                Value::from(ref_cell(plain.clone())),
            ],
        );

        let resolved = resolve_refs(&input);

        assert_eq!(
            resolved.values(),
            &[Value::Int(5), Value::from("x"), plain][..]
        );
        assert!(resolved.same_template(&input));
        // Input still holds the cells
        assert!(matches!(input.values()[0], Value::Ref(_)));
    }

    #[test]
    fn unwraps_derived_cells() {
        let base = ref_cell(2);
        let base_c = base.clone();
        let squared = computed(move || {
            let n = base_c.get().as_int().unwrap_or(0);
            n * n
        });
        let input = crate::html! { "<b>" {squared} "</b>" };

        assert_eq!(resolve_refs(&input).to_markup(), "<b>4</b>");
        base.set(3).unwrap();
        assert_eq!(resolve_refs(&input).to_markup(), "<b>9</b>");
    }

    #[test]
    fn empty_result_is_unchanged() {
        let input = TemplateResult::text("<hr>");
        assert_eq!(resolve_refs(&input), input);
    }
}
