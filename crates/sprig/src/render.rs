//! The per-instance render effect.
//!
//! Each instance gets exactly one effect, created right after setup and
//! before-mount hooks. Every execution renders once: before-update hooks,
//! render function, reference-cell unwrapping, projection into the render
//! root, updated hooks. The first execution skips both update phases and
//! moves the instance out of [`MountState::Unrendered`].

use std::rc::Rc;

use sprig_core::Effect;

use crate::component::Component;
use crate::current::CurrentInstanceGuard;
use crate::lifecycle::Lifecycle;
use crate::resolver::resolve_refs;
use crate::template::TemplateResult;

/// A render function produced by setup.
pub type RenderFn = Box<dyn Fn() -> TemplateResult>;

/// Where an instance is in its render/mount cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountState {
    /// Setup has not produced a first render yet.
    Unrendered,
    /// Rendered at least once, not connected.
    Rendered,
    /// Rendered and connected to the document.
    Mounted,
}

impl Component {
    /// Create the render effect. Runs the first render pass immediately.
    pub(crate) fn establish_render_effect(&self) {
        if self.inner.render_effect.get().is_some() {
            tracing::warn!(
                component = self.tag_name(),
                "render effect already established; ignoring"
            );
            return;
        }

        let weak = Rc::downgrade(&self.inner);
        let effect = self.inner.scope.run(|| {
            Effect::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Component { inner }.render_pass();
                }
            })
        });
        // The first pass has already run; the slot is still empty here
        let _ = self.inner.render_effect.set(effect);
    }

    /// One render pass. Only ever called by the render effect.
    fn render_pass(&self) {
        let Some(render) = self.inner.render_fn.get() else {
            return;
        };
        let first = self.mount_state() == MountState::Unrendered;
        // A re-render can be flushed while another instance's setup runs
        let _masked = CurrentInstanceGuard::mask();

        if !first {
            self.hooks().run(Lifecycle::BeforeUpdate, self);
        }

        let result = resolve_refs(&render());
        match self.dom() {
            Some(dom) => dom.render(&result, self.render_root()),
            None => tracing::debug!(
                component = self.tag_name(),
                "host document is gone; render output dropped"
            ),
        }
        self.inner.render_count.set(self.inner.render_count.get() + 1);

        tracing::debug!(
            component = self.tag_name(),
            node = self.node().index(),
            pass = self.inner.render_count.get(),
            "rendered"
        );

        if first {
            self.inner.state.set(MountState::Rendered);
        } else {
            self.hooks().run(Lifecycle::Updated, self);
        }
    }
}
