//! Publisher and subscriber handles
//!
//! A handle is bound to one topic and one [`MessageKind`] for its whole
//! life. Operations that need the other kind fail with
//! [`BridgeError::VariantMismatch`] before anything is sent, received or
//! overwritten.
//!
//! [`MessageKind`]: crate::message::MessageKind
//! [`BridgeError::VariantMismatch`]: crate::error::BridgeError::VariantMismatch

pub mod publisher;
pub mod subscriber;

pub use publisher::Publisher;
pub use subscriber::Subscriber;
