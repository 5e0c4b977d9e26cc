//! FFI functions for publishers
//!
//! The legacy entry points follow the "NULL / nothing on failure" contract
//! and log a diagnostic. The `_ex` variants return a [`BridgeErrorCode`].

use std::ffi::c_char;

use log::warn;

use crate::{
    error::{BridgeError, Result},
    message::MessageKind,
};

use super::{
    types::*,
    utils::{buffer_len, c_str_to_string, handle_id, registry, to_handle},
};

fn create(node: BridgeNodeHandle, topic: *const c_char, kind: MessageKind) -> Result<usize> {
    let node_id = handle_id(node)?;
    let topic = c_str_to_string(topic)?;

    let mut registry = registry();
    let node = registry
        .get_node(node_id)
        .ok_or_else(|| BridgeError::invalid_parameter("node", "unknown node handle"))?;
    let publisher = match kind {
        MessageKind::Text => node.create_text_publisher(&topic)?,
        MessageKind::NumericArray => node.create_array_publisher(&topic)?,
    };
    Ok(registry.store_publisher(publisher))
}

fn create_or_null(
    node: BridgeNodeHandle,
    topic: *const c_char,
    kind: MessageKind,
) -> BridgePublisherHandle {
    match create(node, topic, kind) {
        Ok(id) => to_handle(id),
        Err(e) => {
            warn!("Failed to create {} publisher: {}", kind, e);
            std::ptr::null_mut()
        }
    }
}

/// Create a text publisher on `topic`. Returns NULL on failure.
#[no_mangle]
pub extern "C" fn bridge_create_string_publisher(
    node: BridgeNodeHandle,
    topic: *const c_char,
) -> BridgePublisherHandle {
    create_or_null(node, topic, MessageKind::Text)
}

/// Create a numeric array publisher on `topic`. Returns NULL on failure.
#[no_mangle]
pub extern "C" fn bridge_create_publisher(
    node: BridgeNodeHandle,
    topic: *const c_char,
) -> BridgePublisherHandle {
    create_or_null(node, topic, MessageKind::NumericArray)
}

/// Destroy a publisher, releasing its endpoint
#[no_mangle]
pub extern "C" fn bridge_publisher_destroy(publisher: BridgePublisherHandle) -> BridgeErrorCode {
    let id = match handle_id(publisher) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    match registry().publishers.remove(&id) {
        Some(_) => BridgeErrorCode::Success,
        None => BridgeErrorCode::InvalidParameter,
    }
}

fn publish_text(publisher: BridgePublisherHandle, text: *const c_char) -> Result<()> {
    let id = handle_id(publisher)?;
    let text = c_str_to_string(text)?;
    let mut registry = registry();
    let publisher = registry
        .publishers
        .get_mut(&id)
        .ok_or_else(|| BridgeError::invalid_parameter("publisher", "unknown publisher handle"))?;
    publisher.publish_text(&text)
}

fn publish_array(publisher: BridgePublisherHandle, data: *const f64, size: i32) -> Result<()> {
    let id = handle_id(publisher)?;
    let len = buffer_len(size, "size")?;
    let elements: &[f64] = if len == 0 {
        &[]
    } else if data.is_null() {
        return Err(BridgeError::invalid_parameter("data", "null pointer"));
    } else {
        unsafe { std::slice::from_raw_parts(data, len) }
    };

    let mut registry = registry();
    let publisher = registry
        .publishers
        .get_mut(&id)
        .ok_or_else(|| BridgeError::invalid_parameter("publisher", "unknown publisher handle"))?;
    publisher.publish_array(elements)
}

/// Publish a NUL-terminated string. Failures are logged only.
#[no_mangle]
pub extern "C" fn bridge_publish_string(publisher: BridgePublisherHandle, text: *const c_char) {
    if let Err(e) = publish_text(publisher, text) {
        warn!("Failed to publish string message: {}", e);
    }
}

/// Publish a NUL-terminated string
#[no_mangle]
pub extern "C" fn bridge_publish_string_ex(
    publisher: BridgePublisherHandle,
    text: *const c_char,
) -> BridgeErrorCode {
    publish_text(publisher, text).into()
}

/// Publish `size` doubles from `data`. Failures are logged only.
#[no_mangle]
pub extern "C" fn bridge_publish(publisher: BridgePublisherHandle, data: *const f64, size: i32) {
    if let Err(e) = publish_array(publisher, data, size) {
        warn!("Failed to publish message: {}", e);
    }
}

/// Publish `size` doubles from `data`
#[no_mangle]
pub extern "C" fn bridge_publish_ex(
    publisher: BridgePublisherHandle,
    data: *const f64,
    size: i32,
) -> BridgeErrorCode {
    publish_array(publisher, data, size).into()
}
