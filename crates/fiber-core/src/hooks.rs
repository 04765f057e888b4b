//! Per-component state cells.
//!
//! A component's hooks are identified purely by call order. The cell for a
//! tree position is handed from the committed fiber to its successor through
//! the alternate link, so a cell lives exactly as long as its position does.
//! Rendering folds the pending queue over the committed value without
//! consuming it; commit promotes the folded value. A pass that is discarded
//! before commit therefore loses no updates.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use crate::runtime::RuntimeHandle;

pub(crate) trait HookCell {
    /// Promotes the value produced by the last render of this cell.
    fn commit(&self);
    fn as_any(self: Rc<Self>) -> Rc<dyn Any>;
}

enum StateUpdate<T> {
    Replace(T),
    Apply(Rc<dyn Fn(&T) -> T>),
}

impl<T: Clone> Clone for StateUpdate<T> {
    fn clone(&self) -> Self {
        match self {
            StateUpdate::Replace(value) => StateUpdate::Replace(value.clone()),
            StateUpdate::Apply(update) => StateUpdate::Apply(Rc::clone(update)),
        }
    }
}

struct StateHook<T> {
    base: RefCell<T>,
    queue: RefCell<Vec<StateUpdate<T>>>,
    staged: RefCell<Option<(T, usize)>>,
}

impl<T: Clone + 'static> StateHook<T> {
    fn new(initial: T) -> Self {
        Self {
            base: RefCell::new(initial),
            queue: RefCell::new(Vec::new()),
            staged: RefCell::new(None),
        }
    }

    fn render(&self) -> T {
        let mut value = self.base.borrow().clone();
        let updates: Vec<StateUpdate<T>> = self.queue.borrow().clone();
        for update in &updates {
            value = match update {
                StateUpdate::Replace(next) => next.clone(),
                StateUpdate::Apply(apply) => apply(&value),
            };
        }
        *self.staged.borrow_mut() = Some((value.clone(), updates.len()));
        value
    }
}

impl<T: Clone + 'static> HookCell for StateHook<T> {
    fn commit(&self) {
        let Some((value, consumed)) = self.staged.borrow_mut().take() else {
            return;
        };
        *self.base.borrow_mut() = value;
        let mut queue = self.queue.borrow_mut();
        let consumed = consumed.min(queue.len());
        queue.drain(..consumed);
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

struct HookFrame {
    previous: Vec<Rc<dyn HookCell>>,
    hooks: Vec<Rc<dyn HookCell>>,
    runtime: RuntimeHandle,
}

thread_local! {
    static HOOK_FRAMES: RefCell<Vec<HookFrame>> = const { RefCell::new(Vec::new()) };
}

struct FrameGuard {
    armed: bool,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if self.armed {
            HOOK_FRAMES.with(|frames| {
                frames.borrow_mut().pop();
            });
        }
    }
}

/// Runs `render` with a hook frame installed and returns the hooks it created,
/// in call order.
pub(crate) fn with_hook_frame<R>(
    previous: Vec<Rc<dyn HookCell>>,
    runtime: RuntimeHandle,
    render: impl FnOnce() -> R,
) -> (R, Vec<Rc<dyn HookCell>>) {
    HOOK_FRAMES.with(|frames| {
        frames.borrow_mut().push(HookFrame {
            previous,
            hooks: Vec::new(),
            runtime,
        })
    });
    let mut guard = FrameGuard { armed: true };
    let result = render();
    guard.armed = false;
    let hooks = HOOK_FRAMES
        .with(|frames| frames.borrow_mut().pop())
        .map(|frame| frame.hooks)
        .unwrap_or_default();
    (result, hooks)
}

/// Declares a state cell in the component currently rendering.
///
/// Returns the current value and a setter. Must be called unconditionally and
/// in the same order on every render of the component.
///
/// # Panics
///
/// Panics when called outside of a component render.
pub fn use_state<T: Clone + 'static>(initial: T) -> (T, StateSetter<T>) {
    let (hook, runtime) = HOOK_FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        let frame = frames
            .last_mut()
            .expect("use_state called outside of a component render");
        let index = frame.hooks.len();
        let reused = frame.previous.get(index).cloned().and_then(|cell| {
            match cell.as_any().downcast::<StateHook<T>>() {
                Ok(hook) => Some(hook),
                Err(_) => {
                    warn!(
                        "hook {index} changed type to {}; reseeding with the initial value",
                        type_name::<T>()
                    );
                    None
                }
            }
        });
        let hook = reused.unwrap_or_else(|| Rc::new(StateHook::new(initial)));
        let cell: Rc<dyn HookCell> = hook.clone();
        frame.hooks.push(cell);
        (hook, frame.runtime.clone())
    });
    let value = hook.render();
    let setter = StateSetter {
        hook: Rc::downgrade(&hook),
        runtime,
    };
    (value, setter)
}

/// Enqueues updates against one state cell and requests a re-render.
pub struct StateSetter<T> {
    hook: Weak<StateHook<T>>,
    runtime: RuntimeHandle,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            hook: Weak::clone(&self.hook),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("mounted", &(self.hook.strong_count() > 0))
            .finish()
    }
}

impl<T: Clone + 'static> StateSetter<T> {
    pub fn set(&self, value: T) {
        self.enqueue(StateUpdate::Replace(value));
    }

    pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
        self.enqueue(StateUpdate::Apply(Rc::new(update)));
    }

    pub fn is_mounted(&self) -> bool {
        self.hook.strong_count() > 0
    }

    fn enqueue(&self, update: StateUpdate<T>) {
        let Some(hook) = self.hook.upgrade() else {
            debug!("state update for an unmounted {} cell ignored", type_name::<T>());
            return;
        };
        hook.queue.borrow_mut().push(update);
        if !self.runtime.request_rerender() {
            debug!("state update queued after the runtime was dropped");
        }
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
