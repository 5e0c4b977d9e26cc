//! C Foreign Function Interface (FFI) for numeric hosts
//!
//! Nodes, publishers and subscribers are handed out as opaque handles backed
//! by a process-wide registry. Every node created here connects to one shared
//! in-process middleware.

pub mod node;
pub mod publishers;
pub mod subscribers;
pub mod types;
pub mod utils;
pub mod version;

// Re-export commonly used types and functions
pub use types::{BridgeErrorCode, BridgeNodeHandle, BridgePublisherHandle, BridgeSubscriberHandle};

pub use utils::{bridge_free_string, bridge_logging_init, HANDLE_REGISTRY, MIDDLEWARE};

// Node API
pub use node::{bridge_init, bridge_init_ex, bridge_shutdown, bridge_spin_once, bridge_spin_once_ex};

// Publisher API
pub use publishers::{
    bridge_create_publisher, bridge_create_string_publisher, bridge_publish, bridge_publish_ex,
    bridge_publish_string, bridge_publish_string_ex, bridge_publisher_destroy,
};

// Subscriber API
pub use subscribers::{
    bridge_create_string_subscriber, bridge_create_subscriber, bridge_subscriber_destroy,
    bridge_take_message, bridge_take_message_ex, bridge_take_string, bridge_take_string_ex,
};

// Version API
pub use version::{
    bridge_version_major, bridge_version_minor, bridge_version_patch, bridge_version_string,
};
