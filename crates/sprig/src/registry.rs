//! Component definitions and the custom element registry.
//!
//! [`define_component`] turns a setup function, its options and its property
//! definitions into a [`ComponentDefinition`] and registers it with a host
//! [`Dom`]. Registration problems are fatal: the name must be a valid custom
//! element name and must not already be defined.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::component::SetupContext;
use crate::dom::Dom;
use crate::error::RegistryError;
use crate::props::PropDefs;
use crate::render::RenderFn;

/// The setup function: runs once per instance and produces its render function.
pub type SetupFn = Rc<dyn Fn(&SetupContext<'_>) -> RenderFn>;

/// Per-definition options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Render into an isolated shadow root instead of the element itself.
    pub isolated_style_scope: bool,
    /// Style sheet injected into the render root after the first render.
    pub style_text: Option<String>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render into an isolated style scope.
    pub fn isolated(mut self) -> Self {
        self.isolated_style_scope = true;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style_text = Some(style.into());
        self
    }
}

/// An immutable, registered component kind.
pub struct ComponentDefinition {
    name: String,
    options: ComponentOptions,
    props: PropDefs,
    setup: SetupFn,
}

impl ComponentDefinition {
    pub fn new<F>(name: impl Into<String>, options: ComponentOptions, props: PropDefs, setup: F) -> Self
    where
        F: Fn(&SetupContext<'_>) -> RenderFn + 'static,
    {
        Self {
            name: name.into(),
            options,
            props,
            setup: Rc::new(setup),
        }
    }

    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.options
    }

    pub fn props(&self) -> &PropDefs {
        &self.props
    }

    pub fn observed_attributes(&self) -> Vec<&str> {
        self.props.observed_attributes()
    }

    pub(crate) fn setup(&self) -> &SetupFn {
        &self.setup
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

/// Names the platform reserves even though they contain a hyphen.
const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Check a tag against the custom element naming rule.
pub fn validate_element_name(name: &str) -> Result<(), RegistryError> {
    let invalid = |reason| {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return invalid("must start with a lowercase ASCII letter");
    }
    if !name.contains('-') {
        return invalid("must contain a hyphen");
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return invalid("must not contain uppercase ASCII letters");
    }
    let allowed = |c: char| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_') || !c.is_ascii()
    };
    if !name.chars().all(allowed) {
        return invalid("contains a character not allowed in custom element names");
    }
    if RESERVED_NAMES.contains(&name) {
        return invalid("is reserved by the platform");
    }
    Ok(())
}

/// Tag name → definition.
#[derive(Default)]
pub struct ElementRegistry {
    definitions: HashMap<String, Rc<ComponentDefinition>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, definition: ComponentDefinition) -> Result<Rc<ComponentDefinition>, RegistryError> {
        validate_element_name(definition.name())?;
        if self.definitions.contains_key(definition.name()) {
            return Err(RegistryError::AlreadyDefined {
                name: definition.name().to_string(),
            });
        }

        let definition = Rc::new(definition);
        self.definitions
            .insert(definition.name().to_string(), Rc::clone(&definition));
        Ok(definition)
    }

    pub fn get(&self, name: &str) -> Option<Rc<ComponentDefinition>> {
        self.definitions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Define a component without declared properties.
///
/// # Example
///
/// ```ignore
/// define_component(&dom, "x-hello", ComponentOptions::default(), |_ctx| {
///     Box::new(|| html! { "<p>Hello</p>" })
/// })?;
/// ```
pub fn define_component<F>(
    dom: &Dom,
    name: &str,
    options: ComponentOptions,
    setup: F,
) -> Result<Rc<ComponentDefinition>, RegistryError>
where
    F: Fn(&SetupContext<'_>) -> RenderFn + 'static,
{
    define_component_with_props(dom, name, options, PropDefs::new(), setup)
}

/// Define a component whose fields and observed attributes come from `props`.
///
/// # Example
///
/// ```ignore
/// define_component_with_props(&dom, "x-counter", ComponentOptions::default(), props! { count: 0 }, |ctx| {
///     let props = ctx.props().clone();
///     Box::new(move || html! { "<p>" {props.get("count")} "</p>" })
/// })?;
/// ```
pub fn define_component_with_props<F>(
    dom: &Dom,
    name: &str,
    options: ComponentOptions,
    props: PropDefs,
    setup: F,
) -> Result<Rc<ComponentDefinition>, RegistryError>
where
    F: Fn(&SetupContext<'_>) -> RenderFn + 'static,
{
    dom.define(ComponentDefinition::new(name, options, props, setup))
}
