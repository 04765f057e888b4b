//! Immutable descriptions of the desired tree.

use std::any::{type_name, TypeId};
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::props::{Event, EventHandler, PropValue, Properties};

/// Property carrying the content of a text element.
pub const TEXT_VALUE_KEY: &str = "value";

type RenderFn = dyn Fn(&Properties) -> anyhow::Result<Element>;

/// How two components decide whether they are the same tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Identity {
    /// Zero-sized function items and non-capturing closures: one type, one function.
    Type(TypeId),
    /// Explicit key supplied through [`Component::keyed`].
    Key(TypeId, &'static str),
    /// Everything else is only equal to clones of itself.
    Instance,
}

/// A function component.
///
/// A component wrapping a function item (or a closure capturing nothing)
/// is identified by that function's type, so building a fresh `Component`
/// from it on every render keeps the tag stable. Function pointers, boxed
/// functions and capturing closures carry no such guarantee; they are
/// identified by the shared render function itself, which survives
/// `clone()`. Use [`Component::keyed`] to give those a stable tag.
#[derive(Clone)]
pub struct Component {
    identity: Identity,
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Properties) -> anyhow::Result<Element> + 'static,
    {
        let identity = if mem::size_of::<F>() == 0 {
            Identity::Type(TypeId::of::<F>())
        } else {
            Identity::Instance
        };
        Self {
            identity,
            name: short_type_name::<F>(),
            render: Rc::new(render),
        }
    }

    /// Wraps `render` under an explicit `key`. Components built with the same
    /// key and the same function type are the same tag.
    pub fn keyed<F>(key: &'static str, render: F) -> Self
    where
        F: Fn(&Properties) -> anyhow::Result<Element> + 'static,
    {
        Self {
            identity: Identity::Key(TypeId::of::<F>(), key),
            name: key,
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, props: &Properties) -> anyhow::Result<Element> {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        match (self.identity, other.identity) {
            (Identity::Instance, Identity::Instance) => {
                Rc::as_ptr(&self.render) as *const () == Rc::as_ptr(&other.render) as *const ()
            }
            (a, b) => a == b,
        }
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

fn short_type_name<F>() -> &'static str {
    let full = type_name::<F>();
    full.rsplit("::").next().unwrap_or(full)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTag {
    Element(String),
    Text,
}

impl fmt::Display for HostTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostTag::Element(name) => f.write_str(name),
            HostTag::Text => f.write_str("#text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Host(HostTag),
    Component(Component),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) ty: ElementType,
    pub(crate) props: Properties,
}

impl Element {
    pub fn new(ty: ElementType, props: Properties) -> Self {
        Self { ty, props }
    }

    pub fn host(tag: impl Into<String>) -> Self {
        Self::new(ElementType::Host(HostTag::Element(tag.into())), Properties::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        let mut props = Properties::new();
        props.insert(TEXT_VALUE_KEY, PropValue::Str(value.into()));
        Self::new(ElementType::Host(HostTag::Text), props)
    }

    pub fn component(component: Component) -> Self {
        Self::new(ElementType::Component(component), Properties::new())
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name, value);
        self
    }

    /// Attaches `handler` under the `on<Event>` key for `event`.
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
            None => "on".to_owned(),
        };
        self.prop(key, EventHandler::new(handler))
    }

    pub fn child(mut self, child: Element) -> Self {
        self.props.push_child(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        for child in children {
            self.props.push_child(child);
        }
        self
    }

    pub fn element_type(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Properties {
        &self.props
    }
}
