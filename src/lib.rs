//! # pubsub-bridge - Typed Publish/Subscribe for Numerical Hosts
//!
//! pubsub-bridge lets a numerical program exchange typed messages over a
//! publish/subscribe middleware without touching the middleware's own API.
//! A host creates one or more nodes, creates text or numeric-array publishers
//! and subscribers on named topics, publishes and polls for messages, and
//! finally shuts the node down.
//!
//! ## Features
//!
//! - **Explicit nodes**: Staged construction that unwinds on failure, ordered teardown
//! - **Two message shapes**: UTF-8 text and `f64` arrays, fixed per handle
//! - **Grow-only buffers**: Exact-fit growth, reused across messages
//! - **Non-blocking takes**: Empty, received or failed, with truncation reported
//! - **C API**: Stable handle-based interface for Fortran/C hosts
//! - **Loopback middleware**: In-process delivery with resource accounting
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 Bridge Core                     │
//! ├─────────────────────────────────────────────────┤
//! │  Node                    │  Handles             │
//! │  - Staged init/teardown  │  - Publisher         │
//! │  - Spin (sleep | wait)   │  - Subscriber        │
//! │  - Endpoint tracking     │  - Payload buffers   │
//! └─────────────────────────────────────────────────┘
//!           │                         │
//!           ▼                         ▼
//! ┌─────────────────┐    ┌─────────────────────────┐
//! │   C API Layer   │    │   Middleware trait      │
//! │  (C/Fortran)    │    │   (loopback backend)    │
//! └─────────────────┘    └─────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use pubsub_bridge::{LoopbackMiddleware, Node};
//!
//! let node = Node::initialize("host", Arc::new(LoopbackMiddleware::new())).unwrap();
//! let mut publisher = node.create_array_publisher("t1").unwrap();
//! let mut subscriber = node.create_array_subscriber("t1").unwrap();
//!
//! publisher.publish_array(&[1.0, 2.0, 3.0]).unwrap();
//! let mut buffer = [0.0; 10];
//! let outcome = subscriber.take_array(&mut buffer).unwrap();
//! assert_eq!(outcome.copied(), 3);
//! assert_eq!(&buffer[..3], &[1.0, 2.0, 3.0]);
//!
//! node.shutdown().unwrap();
//! ```

// Core modules
pub mod buffers;
pub mod config;
pub mod error;
pub mod handles;
pub mod message;
pub mod middleware;
pub mod node;

#[cfg(feature = "c-api")]
pub mod ffi;

// Main API re-exports
pub use buffers::{BufferStats, GrowBuffer};
pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use error::{BridgeError, Result};
pub use handles::{Publisher, Subscriber};
pub use message::{MessageKind, MessagePayload, MessageView, TakeOutcome, Taken};
pub use middleware::{
    EndpointId, Fault, LoopbackConfig, LoopbackMiddleware, MessageInfo, Middleware,
    MiddlewareError, QosProfile, Reliability, ResourceCounts, RetCode,
};
pub use node::{Node, SpinMode, SpinReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 2;
pub const VERSION_PATCH: u32 = 0;
