//! Property values and the host property diff.
//!
//! Properties are kept in insertion order so that the patches produced by
//! [`diff_properties`] are deterministic for a given pair of inputs.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::element::Element;
use crate::host::NodeId;

/// Reserved key that enumerates child elements. Never applied to a host node.
pub const CHILDREN_KEY: &str = "children";

/// Keys starting with this prefix carry event handlers.
pub const EVENT_PREFIX: &str = "on";

/// Event delivered to a listener by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
}

/// Shared event listener. Two handlers are equal only if they are the same closure.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => write!(f, "{value:?}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Handler(_) => f.write_str("<handler>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(handler: EventHandler) -> Self {
        PropValue::Handler(handler)
    }
}

/// Properties of an element or fiber: named values plus the ordered child elements.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: IndexMap<String, PropValue>,
    children: Rc<Vec<Element>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(children: Vec<Element>) -> Self {
        Self {
            values: IndexMap::new(),
            children: Rc::new(children),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn push_child(&mut self, child: Element) {
        Rc::make_mut(&mut self.children).push(child);
    }

    fn events(&self) -> impl Iterator<Item = (&str, String, &EventHandler)> {
        self.values.iter().filter_map(|(key, value)| {
            let handler = value.as_handler()?;
            let event = event_name(key)?;
            Some((key.as_str(), event, handler))
        })
    }

    fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values
            .iter()
            .filter(|(key, value)| is_attribute(key, value))
            .map(|(key, value)| (key.as_str(), value))
    }

    fn event_handler(&self, key: &str) -> Option<&EventHandler> {
        event_name(key)?;
        self.values.get(key)?.as_handler()
    }

    fn attribute(&self, key: &str) -> Option<&PropValue> {
        self.values
            .get(key)
            .filter(|value| is_attribute(key, value))
    }
}

/// `onClick` -> `click`. Returns `None` for keys without the event prefix.
pub fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix(EVENT_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_lowercase())
}

fn is_attribute(key: &str, value: &PropValue) -> bool {
    if key == CHILDREN_KEY {
        return false;
    }
    !(value.as_handler().is_some() && event_name(key).is_some())
}

/// One host mutation produced by [`diff_properties`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyPatch {
    RemoveListener { event: String, handler: EventHandler },
    RemoveProperty { name: String },
    SetProperty { name: String, value: PropValue },
    AddListener { event: String, handler: EventHandler },
}

/// Computes the host mutations that turn `prev` into `next`.
///
/// Patches come out grouped: stale listeners removed, stale properties removed,
/// new or changed properties set, new or changed listeners added.
pub fn diff_properties(prev: &Properties, next: &Properties) -> Vec<PropertyPatch> {
    let mut patches = Vec::new();

    for (key, event, handler) in prev.events() {
        let kept = next
            .event_handler(key)
            .is_some_and(|new_handler| new_handler.ptr_eq(handler));
        if !kept {
            patches.push(PropertyPatch::RemoveListener {
                event,
                handler: handler.clone(),
            });
        }
    }

    for (key, _) in prev.attributes() {
        if next.attribute(key).is_none() {
            patches.push(PropertyPatch::RemoveProperty {
                name: key.to_owned(),
            });
        }
    }

    for (key, value) in next.attributes() {
        if prev.attribute(key) != Some(value) {
            patches.push(PropertyPatch::SetProperty {
                name: key.to_owned(),
                value: value.clone(),
            });
        }
    }

    for (key, event, handler) in next.events() {
        let unchanged = prev
            .event_handler(key)
            .is_some_and(|old_handler| old_handler.ptr_eq(handler));
        if !unchanged {
            patches.push(PropertyPatch::AddListener {
                event,
                handler: handler.clone(),
            });
        }
    }

    patches
}

#[cfg(test)]
#[path = "tests/props_tests.rs"]
mod tests;
