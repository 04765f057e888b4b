//! The reconciler context and its cooperative work loop.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};

use crate::commit::apply_patches;
use crate::config::ReconcilerConfig;
use crate::element::{Component, Element, HostTag};
use crate::error::FiberError;
use crate::fiber::{Fiber, FiberId, FiberKind, FiberTree};
use crate::hooks::with_hook_frame;
use crate::host::{Host, NodeId};
use crate::platform::Deadline;
use crate::props::{diff_properties, Properties};
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};

/// Counts of effects applied by one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    /// Property and listener mutations applied to updated nodes.
    pub patches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing scheduled.
    Idle,
    /// The slice ran out with units of work left.
    Yielded,
    /// A pass completed and was committed during this slice.
    Committed(CommitStats),
}

/// Engine context: committed tree, work-in-progress tree, scheduling cursor
/// and pending deletions, plus the host they are applied to.
///
/// There is no process-wide state; embeddings hold as many reconcilers as
/// they have roots.
pub struct Reconciler<H: Host> {
    pub(crate) host: H,
    pub(crate) fibers: FiberTree,
    runtime: Runtime,
    config: ReconcilerConfig,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) last_commit: Option<CommitStats>,
}

impl<H: Host> Reconciler<H> {
    pub fn new(host: H) -> Self {
        Self::with_runtime(host, Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_runtime(host: H, runtime: Runtime) -> Self {
        Self {
            host,
            fibers: FiberTree::new(),
            runtime,
            config: ReconcilerConfig::default(),
            current_root: None,
            wip_root: None,
            next_unit: None,
            deletions: Vec::new(),
            last_commit: None,
        }
    }

    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Schedules a pass that renders `element` as the only child of `container`.
    ///
    /// Any in-flight, uncommitted pass is discarded, and so is a pending
    /// re-render request: the new pass renders every component again, so
    /// queued state updates are still applied.
    pub fn render(&mut self, element: Element, container: NodeId) {
        if self.runtime.take_rerender_request() {
            trace!("pending re-render superseded by render()");
        }
        let props = Properties::with_children(vec![element]);
        self.begin_pass(container, props, self.current_root);
        self.runtime.request_continuation();
    }

    /// Runs units of work until the pass completes or `deadline` drops below
    /// the yield threshold. At least one unit runs per call so that a starved
    /// slice still makes progress.
    ///
    /// On error the in-flight pass is abandoned and the committed tree is kept.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, FiberError> {
        if self.runtime.take_rerender_request() {
            self.restart_from_committed();
        }

        while let Some(unit) = self.next_unit {
            match self.perform_unit_of_work(unit) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    debug!("abandoning pass: {err}");
                    self.discard_work_in_progress();
                    return Err(err);
                }
            }
            if deadline.time_remaining() < self.config.yield_threshold {
                break;
            }
        }

        let mut status = if self.next_unit.is_some() {
            WorkStatus::Yielded
        } else {
            WorkStatus::Idle
        };
        if self.next_unit.is_none() {
            if let Some(root) = self.wip_root {
                status = WorkStatus::Committed(self.commit_root(root)?);
            }
        }
        if self.has_pending_work() {
            self.runtime.request_continuation();
        }
        Ok(status)
    }

    /// Drives the work loop with an unbounded budget until nothing is pending.
    /// Returns the stats of the last commit made, if any.
    pub fn flush(&mut self) -> Result<Option<CommitStats>, FiberError> {
        let unbounded = || Duration::MAX;
        let mut committed = None;
        while self.has_pending_work() {
            if let WorkStatus::Committed(stats) = self.work_loop(&unbounded)? {
                committed = Some(stats);
            }
        }
        Ok(committed)
    }

    pub fn has_pending_work(&self) -> bool {
        self.next_unit.is_some() || self.wip_root.is_some() || self.runtime.rerender_requested()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn fibers(&self) -> &FiberTree {
        &self.fibers
    }

    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    pub fn work_in_progress_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    pub fn next_unit_of_work(&self) -> Option<FiberId> {
        self.next_unit
    }

    pub fn pending_deletions(&self) -> &[FiberId] {
        &self.deletions
    }

    pub fn last_commit(&self) -> Option<CommitStats> {
        self.last_commit
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    fn begin_pass(&mut self, container: NodeId, props: Properties, alternate: Option<FiberId>) {
        self.discard_work_in_progress();
        let mut root = Fiber::new(FiberKind::Root, props);
        root.node = Some(container);
        root.alternate = alternate;
        let root = self.fibers.insert(root);
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        debug!("render pass scheduled at {root:?} (alternate {alternate:?})");
    }

    /// Starts a new pass from the committed root, or from the in-flight root
    /// when nothing has been committed yet.
    fn restart_from_committed(&mut self) {
        let Some(base) = self.current_root.or(self.wip_root) else {
            return;
        };
        let Some(fiber) = self.fibers.get(base) else {
            return;
        };
        let Some(container) = fiber.node() else {
            return;
        };
        let props = fiber.props().clone();
        self.begin_pass(container, props, self.current_root);
    }

    pub(crate) fn discard_work_in_progress(&mut self) {
        for id in self.deletions.drain(..) {
            if let Ok(fiber) = self.fibers.fiber_mut(id) {
                fiber.effect = None;
            }
        }
        self.wip_root = None;
        self.next_unit = None;
        let freed = self.fibers.retain_reachable(self.current_root);
        if freed > 0 {
            trace!("released {freed} work-in-progress fibers");
        }
    }

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, FiberError> {
        let kind = self.fibers.fiber(id)?.kind.clone();
        trace!("unit of work {id:?}: {kind:?}");
        match kind {
            FiberKind::Component(component) => self.update_component(id, &component)?,
            FiberKind::Host(tag) => self.update_host(id, Some(&tag))?,
            FiberKind::Root => self.update_host(id, None)?,
        }
        Ok(self.fibers.next_unit_after(id))
    }

    fn update_host(&mut self, id: FiberId, tag: Option<&HostTag>) -> Result<(), FiberError> {
        let fiber = self.fibers.fiber(id)?;
        let props = fiber.props.clone();
        if fiber.node.is_none() {
            let tag = tag.ok_or_else(|| FiberError::structural(id, "root fiber has no container"))?;
            let node = self.create_host_node(tag, &props)?;
            self.fibers.fiber_mut(id)?.node = Some(node);
        }
        self.fibers
            .reconcile_children(id, props.children(), &mut self.deletions)
    }

    fn create_host_node(&mut self, tag: &HostTag, props: &Properties) -> Result<NodeId, FiberError> {
        let node = match tag {
            HostTag::Element(name) => self.host.create_node(name)?,
            HostTag::Text => self.host.create_text_node()?,
        };
        let patches = diff_properties(&Properties::new(), props);
        apply_patches(&mut self.host, node, &patches)?;
        Ok(node)
    }

    fn update_component(&mut self, id: FiberId, component: &Component) -> Result<(), FiberError> {
        let fiber = self.fibers.fiber(id)?;
        let props = fiber.props.clone();
        let previous = match fiber.alternate {
            Some(alternate) => self.fibers.fiber(alternate)?.hooks.clone(),
            None => Vec::new(),
        };
        let (rendered, hooks) =
            with_hook_frame(previous, self.runtime.handle(), || component.render(&props));
        self.fibers.fiber_mut(id)?.hooks = hooks;
        let child = rendered.map_err(|err| FiberError::component(component.name(), err))?;
        self.fibers
            .reconcile_children(id, std::slice::from_ref(&child), &mut self.deletions)
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
