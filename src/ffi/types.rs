//! FFI type definitions and handle types

use std::ffi::c_void;

use crate::error::BridgeError;

/// Opaque handle types for C API
pub type BridgeNodeHandle = *mut c_void;
pub type BridgePublisherHandle = *mut c_void;
pub type BridgeSubscriberHandle = *mut c_void;

/// Error codes for C API
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeErrorCode {
    Success = 0,
    InvalidParameter = 1,
    OptionsInitFailed = 2,
    ContextInitFailed = 3,
    NodeInitFailed = 4,
    PublisherInitFailed = 5,
    SubscriberInitFailed = 6,
    PublishFailed = 7,
    TakeFailed = 8,
    VariantMismatch = 9,
    NodeShutdown = 10,
    NoMessage = 11,
    ShutdownFailed = 12,
    WaitFailed = 13,
    UnknownError = 99,
}

impl From<&BridgeError> for BridgeErrorCode {
    fn from(error: &BridgeError) -> Self {
        match error {
            BridgeError::OptionsInit { .. } => BridgeErrorCode::OptionsInitFailed,
            BridgeError::ContextInit { .. } => BridgeErrorCode::ContextInitFailed,
            BridgeError::NodeInit { .. } => BridgeErrorCode::NodeInitFailed,
            BridgeError::PublisherInit { .. } => BridgeErrorCode::PublisherInitFailed,
            BridgeError::SubscriberInit { .. } => BridgeErrorCode::SubscriberInitFailed,
            BridgeError::Publish { .. } => BridgeErrorCode::PublishFailed,
            BridgeError::Take { .. } => BridgeErrorCode::TakeFailed,
            BridgeError::VariantMismatch { .. } => BridgeErrorCode::VariantMismatch,
            BridgeError::Shutdown { .. } => BridgeErrorCode::ShutdownFailed,
            BridgeError::Wait { .. } => BridgeErrorCode::WaitFailed,
            BridgeError::NodeShutdown { .. } => BridgeErrorCode::NodeShutdown,
            BridgeError::InvalidParameter { .. } => BridgeErrorCode::InvalidParameter,
        }
    }
}

impl From<BridgeError> for BridgeErrorCode {
    fn from(error: BridgeError) -> Self {
        Self::from(&error)
    }
}

impl<T> From<crate::error::Result<T>> for BridgeErrorCode {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(_) => BridgeErrorCode::Success,
            Err(e) => e.into(),
        }
    }
}
