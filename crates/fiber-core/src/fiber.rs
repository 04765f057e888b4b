//! Fiber records and the arena that owns them.
//!
//! Structural links (`parent`, `child`, `sibling`, `alternate`) are arena keys,
//! never owning pointers. A freed fiber leaves stale keys behind; lookups on
//! them fail instead of aliasing a newer fiber.

use std::rc::Rc;

use slotmap::SlotMap;

use crate::collections::map::HashSet;
use crate::element::{Component, ElementType, HostTag};
use crate::error::FiberError;
use crate::hooks::HookCell;
use crate::host::NodeId;
use crate::props::Properties;

slotmap::new_key_type! {
    pub struct FiberId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    Placement,
    Update,
    Deletion,
}

#[derive(Debug, Clone)]
pub enum FiberKind {
    /// Root of a pass; owns the container node.
    Root,
    Host(HostTag),
    Component(Component),
}

impl FiberKind {
    pub fn from_element(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(tag) => FiberKind::Host(tag.clone()),
            ElementType::Component(component) => FiberKind::Component(component.clone()),
        }
    }

    /// Tag equality against an element; the only test used to pair old and new.
    pub fn matches(&self, ty: &ElementType) -> bool {
        match (self, ty) {
            (FiberKind::Host(a), ElementType::Host(b)) => a == b,
            (FiberKind::Component(a), ElementType::Component(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, FiberKind::Component(_))
    }
}

pub struct Fiber {
    pub(crate) kind: FiberKind,
    pub(crate) props: Properties,
    pub(crate) node: Option<NodeId>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<Rc<dyn HookCell>>,
}

impl Fiber {
    pub(crate) fn new(kind: FiberKind, props: Properties) -> Self {
        Self {
            kind,
            props,
            node: None,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect: None,
            hooks: Vec::new(),
        }
    }

    pub fn kind(&self) -> &FiberKind {
        &self.kind
    }

    pub fn props(&self) -> &Properties {
        &self.props
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn effect(&self) -> Option<EffectTag> {
        self.effect
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

#[derive(Default)]
pub struct FiberTree {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub(crate) fn fiber(&self, id: FiberId) -> Result<&Fiber, FiberError> {
        self.fibers
            .get(id)
            .ok_or_else(|| FiberError::structural(id, "fiber was freed"))
    }

    pub(crate) fn fiber_mut(&mut self, id: FiberId) -> Result<&mut Fiber, FiberError> {
        self.fibers
            .get_mut(id)
            .ok_or_else(|| FiberError::structural(id, "fiber was freed"))
    }

    /// Children of `id` in sibling order.
    pub fn children(&self, id: FiberId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|fiber| fiber.child),
        }
    }

    /// Pre-order listing of the subtree rooted at `root`, `root` included.
    pub fn preorder(&self, root: FiberId) -> Vec<FiberId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            order.push(id);
            let children: Vec<FiberId> = self.children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }

    /// Next fiber in depth-first order: first child, else the nearest sibling
    /// found while ascending. `None` once the walk climbs past the root.
    pub(crate) fn next_unit_after(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Node of the nearest ancestor that owns one; component fibers are skipped.
    pub(crate) fn host_parent(&self, id: FiberId) -> Result<NodeId, FiberError> {
        let mut cursor = self.fiber(id)?.parent;
        while let Some(current) = cursor {
            let fiber = self.fiber(current)?;
            if let Some(node) = fiber.node {
                return Ok(node);
            }
            cursor = fiber.parent;
        }
        Err(FiberError::structural(id, "no host-owning ancestor"))
    }

    /// Clears alternate links in the tree under `root`.
    pub(crate) fn sever_alternates(&mut self, root: FiberId) {
        for id in self.preorder(root) {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.alternate = None;
            }
        }
    }

    /// Frees every fiber not in the tree under `root`. Returns how many were freed.
    pub(crate) fn retain_reachable(&mut self, root: Option<FiberId>) -> usize {
        let live: HashSet<FiberId> = match root {
            Some(root) => self.preorder(root).into_iter().collect(),
            None => HashSet::default(),
        };
        let before = self.fibers.len();
        self.fibers.retain(|id, _| live.contains(&id));
        before - self.fibers.len()
    }
}

pub struct Children<'a> {
    tree: &'a FiberTree,
    next: Option<FiberId>,
}

impl Iterator for Children<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|fiber| fiber.sibling);
        Some(current)
    }
}

#[cfg(test)]
#[path = "tests/fiber_tests.rs"]
mod tests;
