//! FFI functions for node lifecycle and spinning

use std::{ffi::c_char, time::Duration};

use log::warn;

use crate::{
    error::{BridgeError, Result},
    node::Node,
};

use super::{
    types::*,
    utils::{c_str_to_string, handle_id, init_config, middleware, registry, to_handle, write_out},
};

fn init(name: *const c_char) -> Result<usize> {
    let name = c_str_to_string(name)?;
    let node = Node::initialize_with_config(&name, middleware(), init_config())?;
    Ok(registry().store_node(node))
}

/// Initialize a node.
///
/// Acquires allocator, init-options, context and node. Anything acquired
/// before a failing step is released again.
///
/// # Returns
/// - Valid handle on success
/// - Null pointer on failure (a diagnostic is logged)
///
/// # Example
/// ```c
/// BridgeNodeHandle node = bridge_init("talker");
/// if (node == NULL) {
///     // Handle error
/// }
/// ```
#[no_mangle]
pub extern "C" fn bridge_init(name: *const c_char) -> BridgeNodeHandle {
    match init(name) {
        Ok(id) => to_handle(id),
        Err(e) => {
            warn!("bridge_init failed: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Initialize a node, reporting why it failed
#[no_mangle]
pub extern "C" fn bridge_init_ex(
    name: *const c_char,
    out_node: *mut BridgeNodeHandle,
) -> BridgeErrorCode {
    if out_node.is_null() {
        return BridgeErrorCode::InvalidParameter;
    }
    match init(name) {
        Ok(id) => {
            write_out(out_node, to_handle(id));
            BridgeErrorCode::Success
        }
        Err(e) => {
            write_out(out_node, std::ptr::null_mut());
            e.into()
        }
    }
}

fn spin(node: BridgeNodeHandle, timeout_ms: i32) -> Result<usize> {
    let id = handle_id(node)?;
    // Clone out of the registry so other calls are not blocked while sleeping.
    let node = registry()
        .get_node(id)
        .ok_or_else(|| BridgeError::invalid_parameter("node", "unknown node handle"))?;
    let timeout = Duration::from_millis(u64::try_from(timeout_ms).unwrap_or(0));
    Ok(node.spin_once(timeout)?.ready.len())
}

/// Run one spin iteration bounded by `timeout_ms` (negative counts as 0)
#[no_mangle]
pub extern "C" fn bridge_spin_once(node: BridgeNodeHandle, timeout_ms: i32) {
    if let Err(e) = spin(node, timeout_ms) {
        warn!("bridge_spin_once failed: {}", e);
    }
}

/// Run one spin iteration, reporting how many subscriptions became ready
#[no_mangle]
pub extern "C" fn bridge_spin_once_ex(
    node: BridgeNodeHandle,
    timeout_ms: i32,
    out_ready: *mut usize,
) -> BridgeErrorCode {
    match spin(node, timeout_ms) {
        Ok(ready) => {
            write_out(out_ready, ready);
            BridgeErrorCode::Success
        }
        Err(e) => {
            write_out(out_ready, 0);
            e.into()
        }
    }
}

/// Shut a node down.
///
/// Publishers and subscribers created from it stay valid handles but every
/// operation on them fails with `NodeShutdown` until they are destroyed.
/// Shutting down an unknown or already shut down handle returns
/// `InvalidParameter`.
#[no_mangle]
pub extern "C" fn bridge_shutdown(node: BridgeNodeHandle) -> BridgeErrorCode {
    let id = match handle_id(node) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };
    let node = match registry().remove_node(id) {
        Some(node) => node,
        None => return BridgeErrorCode::InvalidParameter,
    };

    let result = node.inner.shutdown();
    if let Err(e) = &result {
        warn!("bridge_shutdown failed: {}", e);
    }
    result.into()
}
