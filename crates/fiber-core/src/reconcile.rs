//! Positional child diffing.
//!
//! Old children (walked through `sibling`) and new elements (walked by index)
//! are paired strictly by position. There are no keys and no moves: a reorder
//! is seen as a series of type changes.

use crate::element::Element;
use crate::error::FiberError;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberKind, FiberTree};

impl FiberTree {
    /// Rebuilds the child list of `parent` from `elements`, diffing against the
    /// children of the parent's alternate.
    ///
    /// Old fibers with no same-typed counterpart are tagged
    /// [`EffectTag::Deletion`] and pushed onto `deletions`; they never become
    /// part of the new tree.
    pub(crate) fn reconcile_children(
        &mut self,
        parent: FiberId,
        elements: &[Element],
        deletions: &mut Vec<FiberId>,
    ) -> Result<(), FiberError> {
        let mut old = match self.fiber(parent)?.alternate {
            Some(alternate) => self.fiber(alternate)?.child,
            None => None,
        };
        self.fiber_mut(parent)?.child = None;

        let mut previous: Option<FiberId> = None;
        let mut index = 0;
        while index < elements.len() || old.is_some() {
            let element = elements.get(index);
            let (same_type, next_old) = match old {
                Some(old_id) => {
                    let old_fiber = self.fiber(old_id)?;
                    let same = element.is_some_and(|element| old_fiber.kind.matches(&element.ty));
                    (same, old_fiber.sibling)
                }
                None => (false, None),
            };

            let produced = match element {
                Some(element) => {
                    let mut fiber =
                        Fiber::new(FiberKind::from_element(&element.ty), element.props.clone());
                    fiber.parent = Some(parent);
                    match old.filter(|_| same_type) {
                        Some(old_id) => {
                            fiber.node = self.fiber(old_id)?.node;
                            fiber.alternate = Some(old_id);
                            fiber.effect = Some(EffectTag::Update);
                        }
                        None => fiber.effect = Some(EffectTag::Placement),
                    }
                    Some(self.insert(fiber))
                }
                None => None,
            };

            if let Some(old_id) = old.filter(|_| !same_type) {
                self.fiber_mut(old_id)?.effect = Some(EffectTag::Deletion);
                deletions.push(old_id);
            }

            if let Some(id) = produced {
                match previous {
                    Some(prev) => self.fiber_mut(prev)?.sibling = Some(id),
                    None => self.fiber_mut(parent)?.child = Some(id),
                }
                previous = Some(id);
            }

            old = next_old;
            index += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
