//! Declared properties and their per-instance reactive fields.
//!
//! A [`PropDefs`] map is the explicit contract between a component's fields
//! and the DOM attributes it observes: every entry names one field, one
//! observed attribute (always the same name), a default value, and an
//! optional parser for attribute strings. Each instance turns the map into a
//! [`Props`] container holding one signal per field.

use std::rc::Rc;

use indexmap::IndexMap;
use sprig_core::Signal;

use crate::value::Value;

/// Converts an attribute string into a field value.
pub type AttributeParser = fn(&str) -> Value;

/// One declared property.
#[derive(Clone, Debug)]
pub struct PropDef {
    name: String,
    default: Value,
    parser: Option<AttributeParser>,
}

impl PropDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The observed attribute mirrored into this field.
    pub fn attribute(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Convert an attribute write into the field value.
    ///
    /// Without a parser the string is stored as-is; a removed attribute
    /// becomes [`Value::Null`].
    pub fn parse_attribute(&self, raw: Option<&str>) -> Value {
        match (raw, self.parser) {
            (None, _) => Value::Null,
            (Some(raw), Some(parser)) => parser(raw),
            (Some(raw), None) => Value::Str(raw.to_string()),
        }
    }
}

/// A component's property-definition map, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct PropDefs {
    defs: IndexMap<String, PropDef>,
}

impl PropDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property with a default value. Redeclaring a name replaces
    /// the earlier entry.
    pub fn prop(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.insert(name.into(), default.into(), None)
    }

    /// Declare a property whose attribute writes go through `parser`.
    pub fn prop_with_parser(
        self,
        name: impl Into<String>,
        default: impl Into<Value>,
        parser: AttributeParser,
    ) -> Self {
        self.insert(name.into(), default.into(), Some(parser))
    }

    fn insert(mut self, name: String, default: Value, parser: Option<AttributeParser>) -> Self {
        self.defs.insert(
            name.clone(),
            PropDef {
                name,
                default,
                parser,
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PropDef> {
        self.defs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropDef> {
        self.defs.values()
    }

    /// The attributes the host must report changes for.
    pub fn observed_attributes(&self) -> Vec<&str> {
        self.defs.values().map(PropDef::attribute).collect()
    }
}

/// The per-instance tracked property container.
///
/// Cloning shares the same fields.
#[derive(Clone, Debug)]
pub struct Props {
    fields: Rc<IndexMap<String, Signal<Value>>>,
}

impl Props {
    /// One field per definition, seeded with its default.
    pub fn from_defs(defs: &PropDefs) -> Self {
        let fields = defs
            .iter()
            .map(|def| (def.name.clone(), Signal::new(def.default.clone())))
            .collect();
        Self {
            fields: Rc::new(fields),
        }
    }

    /// Read a field (tracked).
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.get(name).map(Signal::get)
    }

    /// Write a field. Returns `false` if no such field exists.
    ///
    /// Writing the value a field already holds does not notify.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        match self.fields.get(name) {
            Some(field) => {
                field.set_if_changed(value.into());
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The backing signal of a field.
    pub fn signal(&self, name: &str) -> Option<Signal<Value>> {
        self.fields.get(name).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ready-made attribute parsers.
pub mod parse {
    use crate::value::Value;

    /// Integer attribute; unparsable input becomes `Null`.
    pub fn int(raw: &str) -> Value {
        raw.trim().parse::<i64>().map_or(Value::Null, Value::Int)
    }

    /// Floating point attribute; unparsable input becomes `Null`.
    pub fn float(raw: &str) -> Value {
        raw.trim().parse::<f64>().map_or(Value::Null, Value::Float)
    }

    /// Boolean attribute: present means `true` unless spelled `"false"`.
    pub fn boolean(raw: &str) -> Value {
        Value::Bool(!raw.trim().eq_ignore_ascii_case("false"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::Effect;
    use std::cell::Cell;

    #[test]
    fn fields_match_definitions() {
        let defs = PropDefs::new().prop("count", 0).prop("label", "hi");
        let props = Props::from_defs(&defs);

        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["count", "label"]);
        assert_eq!(props.get("count"), Some(Value::Int(0)));
        assert_eq!(props.get("label"), Some(Value::from("hi")));
        assert_eq!(defs.observed_attributes(), vec!["count", "label"]);
    }

    #[test]
    fn empty_definitions_are_legal() {
        let props = Props::from_defs(&PropDefs::new());
        assert!(props.is_empty());
        assert!(!props.set("anything", 1));
    }

    #[test]
    fn redeclaring_replaces_default() {
        let defs = PropDefs::new().prop("count", 0).prop("count", 5);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs.get("count").unwrap().default_value(), &Value::Int(5));
    }

    #[test]
    fn attribute_parsing() {
        let defs = PropDefs::new()
            .prop("label", "")
            .prop_with_parser("size", 1, parse::int);

        let label = defs.get("label").unwrap();
        assert_eq!(label.parse_attribute(Some("12")), Value::from("12"));
        assert_eq!(label.parse_attribute(None), Value::Null);

        let size = defs.get("size").unwrap();
        assert_eq!(size.parse_attribute(Some(" 12 ")), Value::Int(12));
        assert_eq!(size.parse_attribute(Some("big")), Value::Null);
        assert_eq!(parse::boolean("False"), Value::Bool(false));
        assert_eq!(parse::boolean(""), Value::Bool(true));
    }

    #[test]
    fn writes_notify_readers() {
        let props = Props::from_defs(&PropDefs::new().prop("count", 0));
        let runs = Rc::new(Cell::new(0));

        let (props_c, runs_c) = (props.clone(), runs.clone());
        Effect::new(move || {
            let _ = props_c.get("count");
            runs_c.set(runs_c.get() + 1);
        });

        assert!(props.set("count", 7));
        assert_eq!(runs.get(), 2);

        // Same value, no re-run
        props.set("count", 7);
        assert_eq!(runs.get(), 2);
    }
}
