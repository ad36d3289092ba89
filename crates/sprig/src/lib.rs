//! Sprig - reactive custom elements with lifecycle hooks and provide/inject.
//!
//! A component is defined once with a tag name, property definitions and a
//! setup function. Each element with that tag gets its own instance: the
//! properties become reactive fields kept in sync with observed attributes,
//! the render function returned by setup runs inside a reactive effect, and
//! the instance re-renders whenever state it read during its last render
//! changes.
//!
//! # Quick Start
//!
//! ```ignore
//! use sprig::prelude::*;
//!
//! let dom = Dom::new();
//! define_component_with_props(
//!     &dom,
//!     "x-counter",
//!     ComponentOptions::default(),
//!     props! { count: 0 => sprig::parse::int },
//!     |ctx| {
//!         let props = ctx.props().clone();
//!         ctx.on_mounted(|c| tracing::info!("{} mounted", c.tag_name()));
//!         Box::new(move || html! { "<p>Count: " {props.get("count")} "</p>" })
//!     },
//! )?;
//!
//! let counter = dom.create_element("x-counter");
//! dom.append_child(dom.body(), counter)?;
//! dom.set_attribute(counter, "count", "7")?;
//! assert_eq!(dom.component_markup(counter).as_deref(), Some("<p>Count: 7</p>"));
//! ```
//!
//! # Lifecycle
//!
//! | Phase | Runs |
//! |-------|------|
//! | before-mount | after setup, before the first render |
//! | mounted | when the element is connected |
//! | before-update | before every re-render |
//! | updated | after every re-render |
//! | unmounted | when the element is disconnected |
//!
//! Hooks are registered through the [`SetupContext`] or, during setup only,
//! through the free functions such as [`on_mounted`].
//!
//! # Provide / inject
//!
//! Values provided by an instance are visible to every component nested
//! below it. [`inject()`] looks at the instance's own table first, then walks
//! up through the host tree to the nearest providing ancestor.

// Lets `html!` and `props!` expand to `::sprig::...` inside this crate too.
extern crate self as sprig;

pub mod binding;
pub mod component;
pub mod current;
pub mod dom;
pub mod error;
pub mod events;
pub mod inject;
pub mod lifecycle;
pub mod props;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod suggestions;
pub mod template;
pub mod value;

pub mod prelude {
    //! Common imports for sprig components.
    pub use crate::binding::update;
    pub use crate::component::{Component, SetupContext};
    pub use crate::current::current_instance;
    pub use crate::dom::{Dom, NodeId};
    pub use crate::error::{take_diagnostics, ComponentError, Diagnostic, RegistryError};
    pub use crate::events::Event;
    pub use crate::inject::{inject, inject_or, provide, InjectionKey};
    pub use crate::lifecycle::{
        on_before_mount, on_before_update, on_mounted, on_unmounted, on_updated,
    };
    pub use crate::props::{PropDefs, Props};
    pub use crate::registry::{define_component, define_component_with_props, ComponentOptions};
    pub use crate::render::{MountState, RenderFn};
    pub use crate::template::TemplateResult;
    pub use crate::value::{computed, is_ref, ref_cell, Value, ValueRef};
    pub use sprig_core::{batch, untracked, Effect, Memo, Scope, Signal};
    pub use sprig_macros::{html, props};
}

// Re-export core types at crate root
pub use binding::update;
pub use component::{Component, SetupContext};
pub use current::current_instance;
pub use dom::{Dom, NodeId};
pub use error::{take_diagnostics, ComponentError, Diagnostic, RegistryError};
pub use inject::{inject, inject_or, provide, ContainerHierarchy, InjectionKey};
pub use lifecycle::{on_before_mount, on_before_update, on_mounted, on_unmounted, on_updated};
pub use props::{parse, PropDefs, Props};
pub use registry::{define_component, define_component_with_props, ComponentOptions};
pub use render::{MountState, RenderFn};
pub use resolver::resolve_refs;
pub use template::TemplateResult;
pub use value::{computed, is_ref, ref_cell, Value, ValueRef};
pub use sprig_core::{batch, untracked, Effect, Memo, Scope, Signal};
pub use sprig_macros::{html, props};

pub use sprig_core as core;

