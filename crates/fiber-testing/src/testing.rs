use std::time::Duration;

use fiber_core::{
    CommitStats, Deadline, Element, FiberError, HostOp, MemoryHost, NodeError, NodeId, Reconciler,
    ReconcilerConfig, WorkStatus,
};

/// Deadline that never runs out; a pass always completes in one slice.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundedDeadline;

impl Deadline for UnboundedDeadline {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Deadline that is already exhausted, so every slice performs exactly one
/// unit of work before yielding.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitBudgetDeadline;

impl Deadline for UnitBudgetDeadline {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

/// Headless harness for exercising the reconciler in tests.
///
/// `ReconcilerTestRule` owns an in-memory host with a mounted container and
/// exposes helpers for rendering content, driving the work loop slice by
/// slice and inspecting the resulting node tree.
pub struct ReconcilerTestRule {
    reconciler: Reconciler<MemoryHost>,
    container: NodeId,
    content: Option<Box<dyn Fn() -> Element>>,
    slices: usize,
}

impl ReconcilerTestRule {
    /// Create a new test rule backed by a fresh in-memory host.
    pub fn new() -> Self {
        Self::with_config(ReconcilerConfig::default())
    }

    pub fn with_config(config: ReconcilerConfig) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        Self {
            reconciler: Reconciler::new(host).with_config(config),
            container,
            content: None,
            slices: 0,
        }
    }

    /// Install `content` and schedule a pass for it without running any work.
    pub fn set_content(&mut self, content: impl Fn() -> Element + 'static) {
        self.reconciler.render(content(), self.container);
        self.content = Some(Box::new(content));
    }

    /// Schedule a fresh pass from the installed content.
    pub fn rerender(&mut self) {
        if let Some(content) = &self.content {
            self.reconciler.render(content(), self.container);
        }
    }

    /// Drive the work loop with an unbounded deadline until nothing is pending.
    pub fn pump_until_idle(&mut self) -> Result<Vec<CommitStats>, FiberError> {
        self.pump_with(&UnboundedDeadline)
    }

    /// Drive the work loop with `deadline` until nothing is pending, counting
    /// slices along the way.
    pub fn pump_with(&mut self, deadline: &dyn Deadline) -> Result<Vec<CommitStats>, FiberError> {
        let mut commits = Vec::new();
        while self.reconciler.has_pending_work() {
            self.slices += 1;
            if let WorkStatus::Committed(stats) = self.reconciler.work_loop(deadline)? {
                commits.push(stats);
            }
        }
        Ok(commits)
    }

    /// Run a single slice with `deadline`.
    pub fn step(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, FiberError> {
        self.slices += 1;
        self.reconciler.work_loop(deadline)
    }

    /// Number of work loop slices run so far.
    pub fn slices(&self) -> usize {
        self.slices
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn host(&self) -> &MemoryHost {
        self.reconciler.host()
    }

    /// Snapshot of the node tree under the container.
    pub fn dump(&self) -> String {
        self.reconciler.host().dump_tree(self.container)
    }

    /// Drain the host operation log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        self.reconciler.host_mut().take_ops()
    }

    /// Dispatch `event` to `node` and pump until idle.
    pub fn dispatch(&mut self, node: NodeId, event: &str) -> Result<usize, FiberError> {
        let handled = self.reconciler.host().dispatch_event(node, event)?;
        self.pump_until_idle()?;
        Ok(handled)
    }

    /// Follows child indices from the container down to a host node.
    pub fn node_at(&self, path: &[usize]) -> Result<NodeId, NodeError> {
        let mut node = self.container;
        for &index in path {
            let children = self.host().children(node)?;
            node = *children.get(index).ok_or(NodeError::Missing { id: node })?;
        }
        Ok(node)
    }

    /// Gain mutable access to the reconciler for advanced scenarios.
    pub fn reconciler(&mut self) -> &mut Reconciler<MemoryHost> {
        &mut self.reconciler
    }
}

impl Default for ReconcilerTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `ReconcilerTestRule`.
pub fn run_test_reconciler<R>(f: impl FnOnce(&mut ReconcilerTestRule) -> R) -> R {
    let mut rule = ReconcilerTestRule::new();
    f(&mut rule)
}
