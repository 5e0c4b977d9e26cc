//! Node lifecycle and spinning
//!
//! A [`Node`] owns the process's connection to the middleware: an allocator,
//! init-options, a context and the node object itself. Construction acquires
//! them in that order and releases whatever was acquired if a later step
//! fails. Publishers and subscribers share ownership of the node's inner
//! state; shutting the node down finalizes every endpoint still alive and
//! turns further use of those handles into [`BridgeError::NodeShutdown`].
//!
//! [`BridgeError::NodeShutdown`]: crate::error::BridgeError::NodeShutdown

pub mod lifecycle;
pub mod spin;

pub use lifecycle::Node;
pub use spin::{SpinMode, SpinReport};

pub(crate) use lifecycle::{EndpointRole, NodeInner};
