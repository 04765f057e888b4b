//! Applies the effects of a completed work-in-progress tree to the host.
//!
//! Commit runs in one uninterrupted call: deferred deletions first, then a
//! pre-order walk of the new tree. Afterwards the new tree becomes the
//! committed one and everything unreachable from it is released.

use log::debug;

use crate::error::FiberError;
use crate::fiber::{EffectTag, FiberId};
use crate::host::{Host, NodeError, NodeId};
use crate::props::{diff_properties, Properties, PropertyPatch};
use crate::scheduler::{CommitStats, Reconciler};

pub(crate) fn apply_patches<H: Host>(
    host: &mut H,
    node: NodeId,
    patches: &[PropertyPatch],
) -> Result<(), NodeError> {
    for patch in patches {
        match patch {
            PropertyPatch::RemoveListener { event, handler } => {
                host.remove_event_listener(node, event, handler)?
            }
            PropertyPatch::RemoveProperty { name } => host.remove_property(node, name)?,
            PropertyPatch::SetProperty { name, value } => host.set_property(node, name, value)?,
            PropertyPatch::AddListener { event, handler } => {
                host.add_event_listener(node, event, handler)?
            }
        }
    }
    Ok(())
}

impl<H: Host> Reconciler<H> {
    pub(crate) fn commit_root(&mut self, root: FiberId) -> Result<CommitStats, FiberError> {
        match self.commit_tree(root) {
            Ok(stats) => Ok(stats),
            Err(err) => {
                debug!("commit of {root:?} failed: {err}");
                self.discard_work_in_progress();
                Err(err)
            }
        }
    }

    fn commit_tree(&mut self, root: FiberId) -> Result<CommitStats, FiberError> {
        let mut stats = CommitStats::default();

        let deletions = self.deletions.clone();
        for id in deletions {
            let parent = self.fibers.host_parent(id)?;
            self.commit_deletion(id, parent)?;
            stats.deletions += 1;
        }

        for id in self.fibers.preorder(root).into_iter().skip(1) {
            self.commit_fiber(id, &mut stats)?;
        }

        self.deletions.clear();
        self.wip_root = None;
        self.current_root = Some(root);
        self.fibers.sever_alternates(root);
        let released = self.fibers.retain_reachable(Some(root));
        debug!("committed {root:?}: {stats:?}, released {released} fibers");
        self.last_commit = Some(stats);
        Ok(stats)
    }

    fn commit_fiber(&mut self, id: FiberId, stats: &mut CommitStats) -> Result<(), FiberError> {
        let parent = self.fibers.host_parent(id)?;
        let fiber = self.fibers.fiber(id)?;
        let (effect, node, alternate) = (fiber.effect, fiber.node, fiber.alternate);
        for hook in &fiber.hooks {
            hook.commit();
        }

        match effect {
            Some(EffectTag::Placement) => {
                if let Some(node) = node {
                    self.host.append_child(parent, node)?;
                }
                stats.placements += 1;
            }
            Some(EffectTag::Update) => {
                if let Some(node) = node {
                    let previous = match alternate {
                        Some(alternate) => self.fibers.fiber(alternate)?.props.clone(),
                        None => Properties::new(),
                    };
                    let patches = diff_properties(&previous, &self.fibers.fiber(id)?.props);
                    apply_patches(&mut self.host, node, &patches)?;
                    stats.patches += patches.len();
                }
                stats.updates += 1;
            }
            Some(EffectTag::Deletion) => {
                self.commit_deletion(id, parent)?;
                stats.deletions += 1;
            }
            None => {}
        }

        self.fibers.fiber_mut(id)?.effect = None;
        Ok(())
    }

    /// Detaches the host nodes of `id` from `parent`. Component fibers own no
    /// node, so their children are detached in their place.
    fn commit_deletion(&mut self, id: FiberId, parent: NodeId) -> Result<(), FiberError> {
        if let Some(node) = self.fibers.fiber(id)?.node {
            self.host.remove_child(parent, node)?;
            return Ok(());
        }
        let children: Vec<FiberId> = self.fibers.children(id).collect();
        for child in children {
            self.commit_deletion(child, parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
