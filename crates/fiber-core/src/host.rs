//! The host capability the reconciler mutates, plus an in-memory implementation.

use std::fmt::Write as _;

use crate::collections::map::HashMap;
use crate::props::{Event, EventHandler, PropValue};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("node {id} missing")]
    Missing { id: NodeId },
    #[error("node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("host cannot {operation}")]
    Unsupported { operation: String },
}

/// Concrete node operations supplied by the embedding platform.
///
/// The reconciler never inspects host nodes; it only holds their ids.
pub trait Host {
    fn create_node(&mut self, tag: &str) -> Result<NodeId, NodeError>;
    fn create_text_node(&mut self) -> Result<NodeId, NodeError>;
    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue) -> Result<(), NodeError>;
    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), NodeError>;
    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError>;
    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError>;
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
}

/// Operation log entry recorded by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateNode { id: NodeId, tag: String },
    CreateText { id: NodeId },
    SetProperty { node: NodeId, name: String, value: PropValue },
    RemoveProperty { node: NodeId, name: String },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId, event: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
}

impl HostOp {
    pub fn is_property_write(&self) -> bool {
        matches!(
            self,
            HostOp::SetProperty { .. }
                | HostOp::RemoveProperty { .. }
                | HostOp::AddListener { .. }
                | HostOp::RemoveListener { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct MemoryNode {
    pub tag: Option<String>,
    pub properties: HashMap<String, PropValue>,
    pub listeners: HashMap<String, Vec<EventHandler>>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl MemoryNode {
    pub fn is_text(&self) -> bool {
        self.tag.is_none()
    }
}

/// Host backed by a vector of nodes. Records every operation it receives.
#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<MemoryNode>,
    ops: Vec<HostOp>,
    failing_tag: Option<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached container node, outside the operation log.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MemoryNode {
            tag: Some(tag.to_owned()),
            ..MemoryNode::default()
        });
        id
    }

    /// Makes every later `create_node(tag)` fail.
    pub fn fail_on_create(&mut self, tag: impl Into<String>) {
        self.failing_tag = Some(tag.into());
    }

    pub fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes.get(id).ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes.get_mut(id).ok_or(NodeError::Missing { id })
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], NodeError> {
        Ok(&self.node(id)?.children)
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes.get(id)?.properties.get(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Invokes every listener registered for `event` on `node`.
    pub fn dispatch_event(&self, node: NodeId, event: &str) -> Result<usize, NodeError> {
        let handlers: Vec<EventHandler> = self
            .node(node)?
            .listeners
            .get(event)
            .cloned()
            .unwrap_or_default();
        let payload = Event {
            name: event.to_owned(),
            target: node,
        };
        for handler in &handlers {
            handler.call(&payload);
        }
        Ok(handlers.len())
    }

    /// Renders the subtree under `root` as indented text, properties sorted by name.
    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.nodes.get(id) else {
            let _ = writeln!(output, "{indent}(missing {id})");
            return;
        };
        match &node.tag {
            Some(tag) => {
                let mut props: Vec<_> = node.properties.iter().collect();
                props.sort_by(|a, b| a.0.cmp(b.0));
                let _ = write!(output, "{indent}<{tag}");
                for (name, value) in props {
                    let _ = write!(output, " {name}={value}");
                }
                let mut events: Vec<_> = node
                    .listeners
                    .iter()
                    .filter(|(_, handlers)| !handlers.is_empty())
                    .map(|(event, _)| event.as_str())
                    .collect();
                events.sort_unstable();
                for event in events {
                    let _ = write!(output, " @{event}");
                }
                let _ = writeln!(output, ">");
            }
            None => {
                let value = node
                    .properties
                    .get(crate::element::TEXT_VALUE_KEY)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(output, "{indent}{value}");
            }
        }
        for &child in &node.children {
            self.dump_node(output, child, depth + 1);
        }
    }
}

impl Host for MemoryHost {
    fn create_node(&mut self, tag: &str) -> Result<NodeId, NodeError> {
        if self.failing_tag.as_deref() == Some(tag) {
            return Err(NodeError::Unsupported {
                operation: format!("create <{tag}>"),
            });
        }
        let id = self.create_container(tag);
        self.ops.push(HostOp::CreateNode {
            id,
            tag: tag.to_owned(),
        });
        Ok(id)
    }

    fn create_text_node(&mut self) -> Result<NodeId, NodeError> {
        let id = self.nodes.len();
        self.nodes.push(MemoryNode::default());
        self.ops.push(HostOp::CreateText { id });
        Ok(id)
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: &PropValue) -> Result<(), NodeError> {
        self.node_mut(node)?
            .properties
            .insert(name.to_owned(), value.clone());
        self.ops.push(HostOp::SetProperty {
            node,
            name: name.to_owned(),
            value: value.clone(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: NodeId, name: &str) -> Result<(), NodeError> {
        self.node_mut(node)?.properties.remove(name);
        self.ops.push(HostOp::RemoveProperty {
            node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError> {
        self.node_mut(node)?
            .listeners
            .entry(event.to_owned())
            .or_default()
            .push(handler.clone());
        self.ops.push(HostOp::AddListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), NodeError> {
        if let Some(handlers) = self.node_mut(node)?.listeners.get_mut(event) {
            handlers.retain(|registered| !registered.ptr_eq(handler));
        }
        self.ops.push(HostOp::RemoveListener {
            node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.node(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(HostOp::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let children = &mut self.node_mut(parent)?.children;
        let index = children
            .iter()
            .position(|&id| id == child)
            .ok_or(NodeError::NotAChild { parent, child })?;
        children.remove(index);
        self.node_mut(child)?.parent = None;
        self.ops.push(HostOp::RemoveChild { parent, child });
        Ok(())
    }
}
