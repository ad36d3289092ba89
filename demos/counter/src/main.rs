//! counter - Two sprig components sharing state through provide/inject.
//!
//! `x-theme` provides a reference cell holding the accent colour and
//! `x-counter` renders its `count` property in that colour. The demo then
//! drives the document the way a browser would: attribute writes, click and
//! input events, and removal from the tree.

use sprig::prelude::*;

const THEME: &str = "theme";

fn define_components(dom: &Dom, theme_key: InjectionKey) -> Result<(), RegistryError> {
    define_component_with_props(
        dom,
        "x-theme",
        ComponentOptions::default(),
        props! { accent: "steelblue" },
        move |ctx| {
            let accent = ref_cell(ctx.props().get("accent").unwrap_or_default());
            ctx.provide(theme_key, accent.clone());
            ctx.expose_readonly("accent", accent.clone())
                .unwrap_or_else(|err| tracing::warn!("{}", err));

            let props = ctx.props().clone();
            Box::new(move || html! { "<section data-accent=\"" {props.get("accent")} "\"><slot></slot></section>" })
        },
    )?;

    define_component_with_props(
        dom,
        "x-counter",
        ComponentOptions::new()
            .isolated()
            .with_style("button { font-weight: bold }"),
        props! { count: 0 => sprig::parse::int, label: "Clicks" },
        move |ctx| {
            let accent = ctx.inject_or(theme_key, "black");
            let props = ctx.props().clone();

            ctx.on_mounted(|c| tracing::info!(component = c.tag_name(), "mounted"));
            ctx.on_updated(|c| tracing::info!(component = c.tag_name(), renders = c.render_count(), "updated"));
            ctx.on_unmounted(|c| tracing::info!(component = c.tag_name(), "unmounted"));

            Box::new(move || {
                html! {
                    "<p style=\"color: " {accent.clone()} "\">"
                    {props.get("label")} ": " {props.get("count")}
                    "</p><button>+1</button>"
                }
            })
        },
    )?;

    Ok(())
}

fn print_markup(dom: &Dom, node: NodeId) {
    println!("{}", dom.component_markup(node).unwrap_or_default());
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt::try_init();

    let dom = Dom::new();
    let theme_key = InjectionKey::new(THEME);
    define_components(&dom, theme_key)?;

    // <x-theme><x-counter label="Apples"></x-counter></x-theme>
    let theme = dom.create_element("x-theme");
    let counter = dom.create_element("x-counter");
    dom.set_attribute(counter, "label", "Apples")?;
    dom.append_child(theme, counter)?;
    dom.append_child(dom.body(), theme)?;
    print_markup(&dom, counter);

    // Clicking increments through the component's public surface
    let instance = dom
        .instance(counter)
        .ok_or("x-counter was not upgraded")?;
    let clicked = instance.clone();
    dom.add_event_listener(counter, "click", move |_event| {
        let next = clicked
            .get("count")
            .ok()
            .and_then(|value| value.as_int())
            .unwrap_or(0)
            + 1;
        if let Err(err) = clicked.set("count", next) {
            tracing::warn!("{}", err);
        }
    });
    for _ in 0..3 {
        dom.dispatch_event(counter, "click", None);
    }
    print_markup(&dom, counter);

    // Attribute writes are parsed by the property's parser
    dom.set_attribute(counter, "count", "40")?;
    print_markup(&dom, counter);

    // The provided accent cell is shared, so writes reach the counter
    let accent = dom
        .instance(theme)
        .and_then(|theme| theme.get("accent").ok())
        .and_then(|value| value.as_ref_cell().cloned())
        .ok_or("x-theme exposes no accent cell")?;
    let picker = dom.create_element("input");
    dom.append_child(theme, picker)?;
    let on_input = update(&accent);
    dom.add_event_listener(picker, "input", move |event| on_input(event));
    dom.dispatch_event(picker, "input", Some("tomato"));
    print_markup(&dom, counter);

    // Several writes in one batch render once
    batch(|| {
        let _ = instance.set("label", "Pears");
        let _ = instance.set("count", 0);
    });
    print_markup(&dom, counter);
    println!("render passes: {}", instance.render_count());

    dom.remove_child(theme, counter)?;
    println!("state after removal: {:?}", instance.mount_state());

    for diagnostic in take_diagnostics() {
        println!("diagnostic: {}", diagnostic);
    }
    Ok(())
}
