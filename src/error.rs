//! Error types and handling for the bridge

use crate::message::MessageKind;
use crate::middleware::MiddlewareError;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Every failure the bridge can surface to its caller
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Init-options could not be initialized from the allocator
    #[error("Failed to initialize init options")]
    OptionsInit {
        #[source]
        source: MiddlewareError,
    },

    /// The middleware context could not be initialized
    #[error("Failed to initialize context")]
    ContextInit {
        #[source]
        source: MiddlewareError,
    },

    /// The node object could not be created on the context
    #[error("Failed to create node '{name}'")]
    NodeInit {
        name: String,
        #[source]
        source: MiddlewareError,
    },

    /// Publisher endpoint construction failed
    #[error("Failed to create publisher on topic '{topic}'")]
    PublisherInit {
        topic: String,
        #[source]
        source: MiddlewareError,
    },

    /// Subscription endpoint construction failed
    #[error("Failed to create subscriber on topic '{topic}'")]
    SubscriberInit {
        topic: String,
        #[source]
        source: MiddlewareError,
    },

    /// The middleware rejected a publish
    #[error("Failed to publish on topic '{topic}'")]
    Publish {
        topic: String,
        #[source]
        source: MiddlewareError,
    },

    /// The middleware reported a receive error (not an empty queue)
    #[error("Failed to take from topic '{topic}'")]
    Take {
        topic: String,
        #[source]
        source: MiddlewareError,
    },

    /// Operation invoked on a handle carrying a different message shape
    #[error("Variant mismatch: handle carries {actual}, operation requires {expected}")]
    VariantMismatch {
        expected: MessageKind,
        actual: MessageKind,
    },

    /// A release step failed while tearing a node down
    #[error("Failed to shut down node '{name}'")]
    Shutdown {
        name: String,
        #[source]
        source: MiddlewareError,
    },

    /// The middleware wait primitive failed during a spin
    #[error("Failed to wait for messages on node '{name}'")]
    Wait {
        name: String,
        #[source]
        source: MiddlewareError,
    },

    /// The node a handle was created from has already been shut down
    #[error("Node '{name}' has been shut down")]
    NodeShutdown { name: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl BridgeError {
    /// Create a node init error
    pub fn node_init(name: impl Into<String>, source: MiddlewareError) -> Self {
        Self::NodeInit {
            name: name.into(),
            source,
        }
    }

    /// Create a publisher init error
    pub fn publisher_init(topic: impl Into<String>, source: MiddlewareError) -> Self {
        Self::PublisherInit {
            topic: topic.into(),
            source,
        }
    }

    /// Create a subscriber init error
    pub fn subscriber_init(topic: impl Into<String>, source: MiddlewareError) -> Self {
        Self::SubscriberInit {
            topic: topic.into(),
            source,
        }
    }

    /// Create a publish error
    pub fn publish(topic: impl Into<String>, source: MiddlewareError) -> Self {
        Self::Publish {
            topic: topic.into(),
            source,
        }
    }

    /// Create a take error
    pub fn take(topic: impl Into<String>, source: MiddlewareError) -> Self {
        Self::Take {
            topic: topic.into(),
            source,
        }
    }

    /// Create a variant mismatch error
    pub fn variant_mismatch(expected: MessageKind, actual: MessageKind) -> Self {
        Self::VariantMismatch { expected, actual }
    }

    /// Create a node shutdown error
    pub fn node_shutdown(name: impl Into<String>) -> Self {
        Self::NodeShutdown { name: name.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Whether this error happened while constructing a node
    pub fn is_init_error(&self) -> bool {
        matches!(
            self,
            Self::OptionsInit { .. } | Self::ContextInit { .. } | Self::NodeInit { .. }
        )
    }
}
