#![doc = r"Core of an incremental fiber reconciler: element model, positional diffing, cooperative scheduling, commit and state hooks."]

pub mod collections;
pub mod config;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod platform;
pub mod props;
pub mod runtime;

mod commit;
mod reconcile;
mod scheduler;

pub use config::ReconcilerConfig;
pub use element::{Component, Element, ElementType, HostTag, TEXT_VALUE_KEY};
pub use error::FiberError;
pub use fiber::{EffectTag, Fiber, FiberId, FiberKind, FiberTree};
pub use hooks::{use_state, StateSetter};
pub use host::{Host, HostOp, MemoryHost, MemoryNode, NodeError, NodeId};
pub use platform::{Clock, Deadline, RuntimeScheduler};
pub use props::{
    diff_properties, event_name, Event, EventHandler, PropValue, Properties, PropertyPatch,
    CHILDREN_KEY, EVENT_PREFIX,
};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use scheduler::{CommitStats, Reconciler, WorkStatus};
