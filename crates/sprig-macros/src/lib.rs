//! Procedural macros for sprig.
//!
//! Provides `html!` for building template render results and `props!` for
//! declaring a component's property definitions.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{braced, token, Expr, Ident, LitStr, Result, Token};

/// Build a `sprig::TemplateResult` from literal markup and interpolations.
///
/// String literals become the static parts of the template; `{expr}` blocks
/// become interpolated values (anything convertible into `sprig::Value`).
/// The static parts are allocated once per call site, so every render from
/// the same call site shares slot identity.
///
/// # Example
///
/// ```ignore
/// use sprig::prelude::*;
///
/// let count = ref_cell(3);
/// let result = html! { "<p>Count: " {count.clone()} "</p>" };
/// ```
#[proc_macro]
pub fn html(input: TokenStream) -> TokenStream {
    let template = syn::parse_macro_input!(input as HtmlTemplate);
    template.to_tokens().into()
}

/// Declare a property-definition map.
///
/// Each entry is `name: default`, optionally followed by `=> parser` where
/// `parser` is a `fn(&str) -> sprig::Value` applied to attribute writes.
/// Names may be identifiers or string literals.
///
/// # Example
///
/// ```ignore
/// let defs = props! {
///     count: 0 => sprig::parse::int,
///     label: "Clicks",
///     "data-mode": "compact",
/// };
/// ```
#[proc_macro]
pub fn props(input: TokenStream) -> TokenStream {
    let defs = syn::parse_macro_input!(input as PropsInput);
    defs.to_tokens().into()
}

// ============================================================================
// html!
// ============================================================================

/// A node in an `html!` template.
enum HtmlNode {
    /// A static markup literal.
    Text(LitStr),
    /// A Rust expression in braces.
    Expr(Expr),
}

impl Parse for HtmlNode {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.peek(LitStr) {
            Ok(HtmlNode::Text(input.parse()?))
        } else if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            Ok(HtmlNode::Expr(content.parse()?))
        } else {
            Err(input.error("expected a string literal or a `{expression}`"))
        }
    }
}

struct HtmlTemplate {
    nodes: Vec<HtmlNode>,
}

impl Parse for HtmlTemplate {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut nodes = Vec::new();
        while !input.is_empty() {
            nodes.push(input.parse()?);

            // Consume trailing comma if present
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(HtmlTemplate { nodes })
    }
}

impl HtmlTemplate {
    /// Split the nodes into `values.len() + 1` static strings and the values.
    ///
    /// Adjacent literals are merged; adjacent expressions get an empty
    /// string between them.
    fn split(&self) -> (Vec<String>, Vec<&Expr>) {
        let mut strings = vec![String::new()];
        let mut values = Vec::new();

        for node in &self.nodes {
            match node {
                HtmlNode::Text(lit) => {
                    if let Some(last) = strings.last_mut() {
                        last.push_str(&lit.value());
                    }
                }
                HtmlNode::Expr(expr) => {
                    values.push(expr);
                    strings.push(String::new());
                }
            }
        }

        (strings, values)
    }

    fn to_tokens(&self) -> TokenStream2 {
        let (strings, values) = self.split();

        quote! {
            {
                ::std::thread_local! {
                    static __SPRIG_TEMPLATE_STRINGS: ::std::rc::Rc<[&'static str]> =
                        ::std::rc::Rc::from(&[#(#strings),*][..]);
                }
                ::sprig::TemplateResult::new(
                    __SPRIG_TEMPLATE_STRINGS.with(::std::rc::Rc::clone),
                    ::std::vec![#(::sprig::Value::from(#values)),*],
                )
            }
        }
    }
}

// ============================================================================
// props!
// ============================================================================

/// One `name: default [=> parser]` entry.
struct PropEntry {
    name: LitStr,
    default: Expr,
    parser: Option<Expr>,
}

impl Parse for PropEntry {
    fn parse(input: ParseStream) -> Result<Self> {
        let name = if input.peek(LitStr) {
            input.parse::<LitStr>()?
        } else {
            let ident: Ident = input.parse()?;
            LitStr::new(&ident.to_string(), ident.span())
        };
        input.parse::<Token![:]>()?;
        let default: Expr = input.parse()?;

        let parser = if input.peek(Token![=>]) {
            input.parse::<Token![=>]>()?;
            Some(input.parse()?)
        } else {
            None
        };

        Ok(PropEntry {
            name,
            default,
            parser,
        })
    }
}

struct PropsInput {
    entries: Vec<PropEntry>,
}

impl Parse for PropsInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let entries = input
            .parse_terminated(PropEntry::parse, Token![,])?
            .into_iter()
            .collect();
        Ok(PropsInput { entries })
    }
}

impl PropsInput {
    /// Return a compile_error! if a property name is declared twice.
    fn validate(&self) -> Option<TokenStream2> {
        for (index, entry) in self.entries.iter().enumerate() {
            let name = entry.name.value();
            if name.is_empty() {
                return Some(
                    syn::Error::new_spanned(&entry.name, "property names cannot be empty")
                        .to_compile_error(),
                );
            }
            if self.entries[..index].iter().any(|e| e.name.value() == name) {
                let msg = format!("property `{}` is declared more than once", name);
                return Some(syn::Error::new_spanned(&entry.name, msg).to_compile_error());
            }
        }
        None
    }

    fn to_tokens(&self) -> TokenStream2 {
        if let Some(error) = self.validate() {
            return error;
        }

        let entries = self.entries.iter().map(|entry| {
            let name = &entry.name;
            let default = &entry.default;
            match &entry.parser {
                Some(parser) => quote! { .prop_with_parser(#name, #default, #parser) },
                None => quote! { .prop(#name, #default) },
            }
        });

        quote! {
            ::sprig::PropDefs::new() #(#entries)*
        }
    }
}
