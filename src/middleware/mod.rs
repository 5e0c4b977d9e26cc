//! Interface to the publish/subscribe middleware
//!
//! The bridge never talks to a transport directly. Everything it needs from
//! the middleware (allocator, init-options, context, node, endpoints,
//! publish, take and wait) goes through the [`Middleware`] trait. The
//! [`LoopbackMiddleware`] implementation delivers messages inside the current
//! process and keeps count of every live resource.

pub mod loopback;
pub mod names;
pub mod resources;

use std::{fmt, time::Duration};

use crate::message::{MessagePayload, MessageView, TypeSupport};

pub use loopback::{LoopbackConfig, LoopbackMiddleware};
pub use resources::{Fault, FaultPlan, ResourceCounts, ResourceKind, ResourceTracker};

/// Allocator handed out by the middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocatorId(pub u64);

/// Initialized init-options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitOptionsId(pub u64);

/// Initialized connection context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

/// Middleware node object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Publisher or subscription endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(pub u64);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Return codes reported by the middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetCode {
    /// Unspecified failure
    Error,
    /// Allocation failed
    BadAlloc,
    /// An argument was rejected
    InvalidArgument,
    /// The referenced object does not exist or was finalized
    NotInit,
    /// The context was already shut down
    AlreadyShutdown,
    /// Node name failed validation
    NodeInvalidName,
    /// Node namespace failed validation
    NodeInvalidNamespace,
    /// Topic name failed validation
    TopicNameInvalid,
    /// A wait ran out of time
    Timeout,
}

impl fmt::Display for RetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Error => "error",
            Self::BadAlloc => "bad alloc",
            Self::InvalidArgument => "invalid argument",
            Self::NotInit => "not initialized",
            Self::AlreadyShutdown => "already shut down",
            Self::NodeInvalidName => "invalid node name",
            Self::NodeInvalidNamespace => "invalid node namespace",
            Self::TopicNameInvalid => "invalid topic name",
            Self::Timeout => "timeout",
        };
        f.write_str(text)
    }
}

/// Failure reported by a middleware primitive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct MiddlewareError {
    pub code: RetCode,
    pub message: String,
}

impl MiddlewareError {
    pub fn new(code: RetCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result of a middleware primitive
pub type MwResult<T> = std::result::Result<T, MiddlewareError>;

/// Delivery reliability requested for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    /// Best effort delivery (may drop messages)
    BestEffort,
    /// Reliable delivery
    #[default]
    Reliable,
}

/// Quality of service used when creating endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosProfile {
    /// Keep-last history depth
    pub history_depth: usize,
    pub reliability: Reliability,
}

impl Default for QosProfile {
    fn default() -> Self {
        Self {
            history_depth: crate::config::defaults::HISTORY_DEPTH,
            reliability: Reliability::Reliable,
        }
    }
}

/// Metadata returned alongside a taken message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    /// Endpoint that published the message
    pub publisher: EndpointId,
    /// Per-publisher sequence number, starting at 1
    pub sequence: u64,
    /// Publish time in nanoseconds since the Unix epoch
    pub source_timestamp_ns: u64,
}

/// Primitives the bridge consumes from a publish/subscribe middleware.
///
/// Every `init_*`/`fini_*` pair must balance. Implementations report failures
/// as [`MiddlewareError`]; `take` returns `Ok(None)` when nothing is queued.
pub trait Middleware: Send + Sync + fmt::Debug {
    /// Acquire the default allocator
    fn default_allocator(&self) -> AllocatorId;

    /// Release an allocator acquired with `default_allocator`
    fn release_allocator(&self, allocator: AllocatorId);

    fn init_options(&self, allocator: AllocatorId) -> MwResult<InitOptionsId>;

    fn fini_options(&self, options: InitOptionsId) -> MwResult<()>;

    fn init_context(&self, options: InitOptionsId) -> MwResult<ContextId>;

    /// Invalidate a context; it must still be finalized afterwards
    fn shutdown_context(&self, context: ContextId) -> MwResult<()>;

    fn fini_context(&self, context: ContextId) -> MwResult<()>;

    fn init_node(&self, context: ContextId, name: &str, namespace: &str) -> MwResult<NodeId>;

    fn fini_node(&self, node: NodeId) -> MwResult<()>;

    fn init_publisher(
        &self,
        node: NodeId,
        type_support: &TypeSupport,
        topic: &str,
        qos: &QosProfile,
    ) -> MwResult<EndpointId>;

    fn fini_publisher(&self, publisher: EndpointId) -> MwResult<()>;

    fn init_subscription(
        &self,
        node: NodeId,
        type_support: &TypeSupport,
        topic: &str,
        qos: &QosProfile,
    ) -> MwResult<EndpointId>;

    fn fini_subscription(&self, subscription: EndpointId) -> MwResult<()>;

    /// Publish synchronously; the view is not retained after returning
    fn publish(&self, publisher: EndpointId, message: MessageView<'_>) -> MwResult<()>;

    /// Non-blocking receive into `payload`
    fn take(
        &self,
        subscription: EndpointId,
        payload: &mut MessagePayload,
    ) -> MwResult<Option<MessageInfo>>;

    /// Block until one of `subscriptions` has data or `timeout` elapses,
    /// returning the ready ones (empty on timeout)
    fn wait(&self, subscriptions: &[EndpointId], timeout: Duration) -> MwResult<Vec<EndpointId>>;
}
