//! FFI functions for subscribers
//!
//! Legacy takes return the number of elements copied, with 0 covering "no
//! message" and every error. The `_ex` variants separate the three cases:
//! `Success` with the copied count and truncation flag, `NoMessage`, or an
//! error code.

use std::ffi::c_char;

use log::warn;

use crate::{
    error::{BridgeError, Result},
    message::{MessageKind, TakeOutcome},
};

use super::{
    types::*,
    utils::{buffer_len, c_str_to_string, handle_id, registry, to_handle, write_out},
};

fn create(node: BridgeNodeHandle, topic: *const c_char, kind: MessageKind) -> Result<usize> {
    let node_id = handle_id(node)?;
    let topic = c_str_to_string(topic)?;

    let mut registry = registry();
    let node = registry
        .get_node(node_id)
        .ok_or_else(|| BridgeError::invalid_parameter("node", "unknown node handle"))?;
    let subscriber = match kind {
        MessageKind::Text => node.create_text_subscriber(&topic)?,
        MessageKind::NumericArray => node.create_array_subscriber(&topic)?,
    };
    Ok(registry.store_subscriber(subscriber))
}

fn create_or_null(
    node: BridgeNodeHandle,
    topic: *const c_char,
    kind: MessageKind,
) -> BridgeSubscriberHandle {
    match create(node, topic, kind) {
        Ok(id) => to_handle(id),
        Err(e) => {
            warn!("Failed to create {} subscriber: {}", kind, e);
            std::ptr::null_mut()
        }
    }
}

/// Create a text subscriber on `topic`. Returns NULL on failure.
#[no_mangle]
pub extern "C" fn bridge_create_string_subscriber(
    node: BridgeNodeHandle,
    topic: *const c_char,
) -> BridgeSubscriberHandle {
    create_or_null(node, topic, MessageKind::Text)
}

/// Create a numeric array subscriber on `topic`. Returns NULL on failure.
#[no_mangle]
pub extern "C" fn bridge_create_subscriber(
    node: BridgeNodeHandle,
    topic: *const c_char,
) -> BridgeSubscriberHandle {
    create_or_null(node, topic, MessageKind::NumericArray)
}

/// Destroy a subscriber, releasing its endpoint
#[no_mangle]
pub extern "C" fn bridge_subscriber_destroy(subscriber: BridgeSubscriberHandle) -> BridgeErrorCode {
    let id = match handle_id(subscriber) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    match registry().subscribers.remove(&id) {
        Some(_) => BridgeErrorCode::Success,
        None => BridgeErrorCode::InvalidParameter,
    }
}

fn take_text(
    subscriber: BridgeSubscriberHandle,
    buffer: *mut c_char,
    size: i32,
) -> Result<TakeOutcome> {
    let id = handle_id(subscriber)?;
    let len = buffer_len(size, "buffer_size")?;
    if buffer.is_null() {
        return Err(BridgeError::invalid_parameter("buffer", "null pointer"));
    }

    let mut registry = registry();
    let subscriber = registry
        .subscribers
        .get_mut(&id)
        .ok_or_else(|| BridgeError::invalid_parameter("subscriber", "unknown subscriber handle"))?;
    let bytes = unsafe { std::slice::from_raw_parts_mut(buffer.cast::<u8>(), len) };
    subscriber.take_text(bytes)
}

fn take_array(
    subscriber: BridgeSubscriberHandle,
    buffer: *mut f64,
    size: i32,
) -> Result<TakeOutcome> {
    let id = handle_id(subscriber)?;
    let len = buffer_len(size, "buffer_size")?;

    let mut registry = registry();
    let subscriber = registry
        .subscribers
        .get_mut(&id)
        .ok_or_else(|| BridgeError::invalid_parameter("subscriber", "unknown subscriber handle"))?;
    let elements: &mut [f64] = if len == 0 {
        &mut []
    } else if buffer.is_null() {
        return Err(BridgeError::invalid_parameter("buffer", "null pointer"));
    } else {
        unsafe { std::slice::from_raw_parts_mut(buffer, len) }
    };
    subscriber.take_array(elements)
}

fn legacy_count(result: Result<TakeOutcome>, what: &str) -> i32 {
    match result {
        // Bounded by the caller's `int` buffer size.
        Ok(outcome) => outcome.copied() as i32,
        Err(e) => {
            warn!("Failed to take {}: {}", what, e);
            0
        }
    }
}

fn report(
    result: Result<TakeOutcome>,
    out_copied: *mut usize,
    out_truncated: *mut bool,
) -> BridgeErrorCode {
    match result {
        Ok(TakeOutcome::Taken(taken)) => {
            write_out(out_copied, taken.copied);
            write_out(out_truncated, taken.is_truncated());
            BridgeErrorCode::Success
        }
        Ok(TakeOutcome::Empty) => {
            write_out(out_copied, 0);
            write_out(out_truncated, false);
            BridgeErrorCode::NoMessage
        }
        Err(e) => {
            write_out(out_copied, 0);
            write_out(out_truncated, false);
            e.into()
        }
    }
}

/// Take one text message into `buffer` (NUL-terminated, at most
/// `buffer_size - 1` characters). Returns the characters copied, 0 when
/// nothing was received.
#[no_mangle]
pub extern "C" fn bridge_take_string(
    subscriber: BridgeSubscriberHandle,
    buffer: *mut c_char,
    buffer_size: i32,
) -> i32 {
    legacy_count(take_text(subscriber, buffer, buffer_size), "string message")
}

/// Take one text message, reporting the copied length and truncation
#[no_mangle]
pub extern "C" fn bridge_take_string_ex(
    subscriber: BridgeSubscriberHandle,
    buffer: *mut c_char,
    buffer_size: i32,
    out_copied: *mut usize,
    out_truncated: *mut bool,
) -> BridgeErrorCode {
    report(take_text(subscriber, buffer, buffer_size), out_copied, out_truncated)
}

/// Take one numeric array into `buffer` (at most `buffer_size` elements).
/// Returns the elements copied, 0 when nothing was received.
#[no_mangle]
pub extern "C" fn bridge_take_message(
    subscriber: BridgeSubscriberHandle,
    buffer: *mut f64,
    buffer_size: i32,
) -> i32 {
    legacy_count(take_array(subscriber, buffer, buffer_size), "message")
}

/// Take one numeric array, reporting the copied length and truncation
#[no_mangle]
pub extern "C" fn bridge_take_message_ex(
    subscriber: BridgeSubscriberHandle,
    buffer: *mut f64,
    buffer_size: i32,
    out_copied: *mut usize,
    out_truncated: *mut bool,
) -> BridgeErrorCode {
    report(take_array(subscriber, buffer, buffer_size), out_copied, out_truncated)
}
