use crate::fiber::FiberId;
use crate::host::NodeError;

#[derive(Debug, thiserror::Error)]
pub enum FiberError {
    /// An engine invariant was broken; the pass cannot continue.
    #[error("structural violation at {fiber:?}: {reason}")]
    StructuralViolation {
        fiber: FiberId,
        reason: &'static str,
    },
    #[error("host operation failed: {0}")]
    Host(#[from] NodeError),
    #[error("component `{name}` failed to render")]
    Component {
        name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl FiberError {
    pub(crate) fn structural(fiber: FiberId, reason: &'static str) -> Self {
        FiberError::StructuralViolation { fiber, reason }
    }

    pub(crate) fn component(name: &'static str, error: anyhow::Error) -> Self {
        FiberError::Component {
            name,
            source: error.into(),
        }
    }
}
