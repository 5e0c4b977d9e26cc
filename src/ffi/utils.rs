//! FFI utilities and handle management

use std::{
    collections::HashMap,
    ffi::{c_char, c_void, CStr, CString},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    config::BridgeConfig,
    error::{BridgeError, Result},
    handles::{Publisher, Subscriber},
    middleware::{LoopbackMiddleware, Middleware},
    node::Node,
};

// Global handle management
lazy_static::lazy_static! {
    pub static ref HANDLE_REGISTRY: Mutex<HandleRegistry> = Mutex::new(HandleRegistry::new());

    /// Middleware every node created through the C API connects to
    pub static ref MIDDLEWARE: Arc<LoopbackMiddleware> = Arc::new(LoopbackMiddleware::new());
}

/// Lock the registry, recovering from a poisoned lock
pub fn registry() -> MutexGuard<'static, HandleRegistry> {
    HANDLE_REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Middleware shared by every C API node
pub fn middleware() -> Arc<dyn Middleware> {
    let loopback: Arc<LoopbackMiddleware> = Arc::clone(&MIDDLEWARE);
    loopback
}

/// Configuration for nodes created through `bridge_init`
pub fn init_config() -> BridgeConfig {
    match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring bridge environment configuration: {}", e);
            BridgeConfig::default()
        }
    }
}

/// Live nodes and handles, keyed by the id handed out as the C handle
pub struct HandleRegistry {
    pub nodes: HashMap<usize, Arc<Node>>,
    pub publishers: HashMap<usize, Publisher>,
    pub subscribers: HashMap<usize, Subscriber>,
    pub next_id: usize,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            publishers: HashMap::new(),
            subscribers: HashMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn store_node(&mut self, node: Node) -> usize {
        let id = self.allocate_id();
        self.nodes.insert(id, Arc::new(node));
        id
    }

    pub fn get_node(&self, id: usize) -> Option<Arc<Node>> {
        self.nodes.get(&id).cloned()
    }

    pub fn remove_node(&mut self, id: usize) -> Option<Arc<Node>> {
        self.nodes.remove(&id)
    }

    pub fn store_publisher(&mut self, publisher: Publisher) -> usize {
        let id = self.allocate_id();
        self.publishers.insert(id, publisher);
        id
    }

    pub fn store_subscriber(&mut self, subscriber: Subscriber) -> usize {
        let id = self.allocate_id();
        self.subscribers.insert(id, subscriber);
        id
    }
}

/// Turn a registry id into an opaque handle
pub fn to_handle(id: usize) -> *mut c_void {
    id as *mut c_void
}

/// Registry id behind an opaque handle
pub fn handle_id(handle: *mut c_void) -> Result<usize> {
    if handle.is_null() {
        return Err(BridgeError::invalid_parameter("handle", "null handle"));
    }
    Ok(handle as usize)
}

/// Convert C string to Rust String
pub fn c_str_to_string(c_str: *const c_char) -> Result<String> {
    if c_str.is_null() {
        return Err(BridgeError::invalid_parameter("string", "null pointer"));
    }

    unsafe {
        CStr::from_ptr(c_str)
            .to_str()
            .map(|s| s.to_owned())
            .map_err(|e| BridgeError::invalid_parameter("string", e.to_string()))
    }
}

/// Convert Rust String to C string (caller must free with bridge_free_string)
pub fn string_to_c_str(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Length of a caller buffer given as a C `int`
pub fn buffer_len(size: i32, parameter: &str) -> Result<usize> {
    usize::try_from(size).map_err(|_| {
        BridgeError::invalid_parameter(parameter, format!("negative size {}", size))
    })
}

/// Write an out-parameter if the caller supplied one
pub fn write_out<T>(out: *mut T, value: T) {
    if !out.is_null() {
        unsafe {
            *out = value;
        }
    }
}

/// Free a C string allocated by this library
#[no_mangle]
pub extern "C" fn bridge_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

/// Install the env_logger backend (reads `RUST_LOG`).
///
/// Returns `true` if this call installed it, `false` if a logger was
/// already present.
#[no_mangle]
pub extern "C" fn bridge_logging_init() -> bool {
    env_logger::try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_string_conversion() {
        let raw = string_to_c_str("chatter".to_string());
        assert!(!raw.is_null());
        assert_eq!(c_str_to_string(raw).unwrap(), "chatter");
        bridge_free_string(raw);

        assert!(c_str_to_string(std::ptr::null()).is_err());
        assert!(string_to_c_str("nul\0inside".to_string()).is_null());
    }

    #[test]
    fn test_handle_ids() {
        assert!(handle_id(std::ptr::null_mut()).is_err());
        assert_eq!(handle_id(to_handle(42)).unwrap(), 42);
        assert_eq!(buffer_len(3, "size").unwrap(), 3);
        assert!(buffer_len(-1, "size").is_err());
    }
}
