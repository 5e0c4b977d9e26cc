//! In-process middleware backend
//!
//! Messages published on a topic are serialized with bincode and queued on
//! every subscription of the same resolved topic and message type. Each
//! subscription keeps the last `history_depth` messages. All state lives
//! behind one mutex; a condition variable wakes `wait` callers whenever a
//! message is queued.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::message::{MessagePayload, MessageView, TypeSupport};

use super::{
    names::{normalize_namespace, resolve_topic, validate_node_name},
    AllocatorId, ContextId, EndpointId, Fault, FaultPlan, InitOptionsId, MessageInfo, Middleware,
    MiddlewareError, MwResult, NodeId, QosProfile, ResourceCounts, ResourceKind, ResourceTracker,
    RetCode,
};

/// Limits applied by the loopback backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackConfig {
    /// Upper bound on any subscription's history depth
    pub max_history_depth: usize,
    /// Largest message accepted, in elements (bytes for text)
    pub max_message_elements: usize,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            max_history_depth: 1000,
            max_message_elements: 16 * 1024 * 1024,
        }
    }
}

#[derive(Serialize)]
enum WireRef<'a> {
    Text(&'a str),
    NumericArray(&'a [f64]),
}

#[derive(Deserialize)]
enum WireOwned {
    Text(String),
    NumericArray(Vec<f64>),
}

#[derive(Debug)]
struct Frame {
    bytes: Vec<u8>,
    info: MessageInfo,
}

#[derive(Debug)]
struct NodeRecord {
    context: ContextId,
    name: String,
    namespace: String,
}

#[derive(Debug)]
struct PublisherRecord {
    node: NodeId,
    topic: String,
    type_name: String,
    sequence: u64,
}

#[derive(Debug)]
struct SubscriptionRecord {
    topic: String,
    type_name: String,
    depth: usize,
    queue: VecDeque<Frame>,
    dropped: u64,
}

#[derive(Debug, Default)]
struct BusState {
    next_id: u64,
    allocators: HashSet<u64>,
    options: HashSet<u64>,
    /// Context id to "still valid" flag
    contexts: HashMap<u64, bool>,
    nodes: HashMap<u64, NodeRecord>,
    publishers: HashMap<u64, PublisherRecord>,
    subscriptions: HashMap<u64, SubscriptionRecord>,
}

impl BusState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn live_node(&self, node: NodeId) -> MwResult<&NodeRecord> {
        let record = self
            .nodes
            .get(&node.0)
            .ok_or_else(|| not_init("node", node.0))?;
        match self.contexts.get(&record.context.0) {
            Some(true) => Ok(record),
            Some(false) => Err(MiddlewareError::new(
                RetCode::AlreadyShutdown,
                format!("context of node '{}' was shut down", record.name),
            )),
            None => Err(not_init("context", record.context.0)),
        }
    }

    fn context_valid(&self, node: NodeId) -> bool {
        self.nodes
            .get(&node.0)
            .and_then(|record| self.contexts.get(&record.context.0))
            .copied()
            .unwrap_or(false)
    }
}

fn not_init(what: &str, id: u64) -> MiddlewareError {
    MiddlewareError::new(RetCode::NotInit, format!("{} {} is not initialized", what, id))
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Publish/subscribe middleware that delivers inside the current process
#[derive(Debug)]
pub struct LoopbackMiddleware {
    config: LoopbackConfig,
    state: Mutex<BusState>,
    ready: Condvar,
    resources: ResourceTracker,
    faults: FaultPlan,
}

impl Default for LoopbackMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackMiddleware {
    /// Create a backend with default limits
    pub fn new() -> Self {
        Self::with_config(LoopbackConfig::default())
    }

    /// Create a backend with custom limits
    pub fn with_config(config: LoopbackConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BusState::default()),
            ready: Condvar::new(),
            resources: ResourceTracker::new(),
            faults: FaultPlan::new(),
        }
    }

    /// Live resource counts
    pub fn resources(&self) -> ResourceCounts {
        self.resources.counts()
    }

    /// Fault injection switchboard
    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// Number of messages queued on a subscription
    pub fn pending(&self, subscription: EndpointId) -> Option<usize> {
        self.lock()
            .subscriptions
            .get(&subscription.0)
            .map(|record| record.queue.len())
    }

    /// Number of messages a subscription lost to its history depth
    pub fn dropped(&self, subscription: EndpointId) -> Option<u64> {
        self.lock()
            .subscriptions
            .get(&subscription.0)
            .map(|record| record.dropped)
    }

    /// Resolved topic names that currently have an endpoint
    pub fn topic_names(&self) -> Vec<String> {
        let state = self.lock();
        let mut names: Vec<String> = state
            .publishers
            .values()
            .map(|record| record.topic.clone())
            .chain(state.subscriptions.values().map(|record| record.topic.clone()))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_for(&self, node: NodeId, topic: &str) -> MwResult<String> {
        let state = self.lock();
        let record = state.live_node(node)?;
        resolve_topic(topic, &record.namespace, &record.name)
    }

    fn encode(&self, message: MessageView<'_>) -> MwResult<Vec<u8>> {
        if message.len() > self.config.max_message_elements {
            return Err(MiddlewareError::new(
                RetCode::BadAlloc,
                format!(
                    "message of {} elements exceeds limit {}",
                    message.len(),
                    self.config.max_message_elements
                ),
            ));
        }
        let wire = match message {
            MessageView::Text(text) => WireRef::Text(text),
            MessageView::NumericArray(data) => WireRef::NumericArray(data),
        };
        bincode::serialize(&wire)
            .map_err(|e| MiddlewareError::new(RetCode::Error, format!("serialization failed: {}", e)))
    }
}

impl Middleware for LoopbackMiddleware {
    fn default_allocator(&self) -> AllocatorId {
        let mut state = self.lock();
        let id = state.next_id();
        state.allocators.insert(id);
        self.resources.acquire(ResourceKind::Allocator);
        AllocatorId(id)
    }

    fn release_allocator(&self, allocator: AllocatorId) {
        if self.lock().allocators.remove(&allocator.0) {
            self.resources.release(ResourceKind::Allocator);
        }
    }

    fn init_options(&self, allocator: AllocatorId) -> MwResult<InitOptionsId> {
        self.faults.check(Fault::OptionsInit)?;
        let mut state = self.lock();
        if !state.allocators.contains(&allocator.0) {
            return Err(not_init("allocator", allocator.0));
        }
        let id = state.next_id();
        state.options.insert(id);
        self.resources.acquire(ResourceKind::InitOptions);
        Ok(InitOptionsId(id))
    }

    fn fini_options(&self, options: InitOptionsId) -> MwResult<()> {
        if !self.lock().options.remove(&options.0) {
            return Err(not_init("init options", options.0));
        }
        self.resources.release(ResourceKind::InitOptions);
        Ok(())
    }

    fn init_context(&self, options: InitOptionsId) -> MwResult<ContextId> {
        self.faults.check(Fault::ContextInit)?;
        let mut state = self.lock();
        if !state.options.contains(&options.0) {
            return Err(not_init("init options", options.0));
        }
        let id = state.next_id();
        state.contexts.insert(id, true);
        self.resources.acquire(ResourceKind::Context);
        Ok(ContextId(id))
    }

    fn shutdown_context(&self, context: ContextId) -> MwResult<()> {
        let mut state = self.lock();
        let valid = state
            .contexts
            .get_mut(&context.0)
            .ok_or_else(|| not_init("context", context.0))?;
        if !*valid {
            return Err(MiddlewareError::new(
                RetCode::AlreadyShutdown,
                format!("context {} already shut down", context.0),
            ));
        }
        *valid = false;
        drop(state);
        self.ready.notify_all();
        Ok(())
    }

    fn fini_context(&self, context: ContextId) -> MwResult<()> {
        let mut state = self.lock();
        match state.contexts.get(&context.0) {
            Some(true) => Err(MiddlewareError::new(
                RetCode::InvalidArgument,
                format!("context {} must be shut down before finalization", context.0),
            )),
            Some(false) => {
                state.contexts.remove(&context.0);
                self.resources.release(ResourceKind::Context);
                Ok(())
            }
            None => Err(not_init("context", context.0)),
        }
    }

    fn init_node(&self, context: ContextId, name: &str, namespace: &str) -> MwResult<NodeId> {
        self.faults.check(Fault::NodeInit)?;
        validate_node_name(name)?;
        let namespace = normalize_namespace(namespace)?;

        let mut state = self.lock();
        match state.contexts.get(&context.0) {
            Some(true) => {}
            Some(false) => {
                return Err(MiddlewareError::new(
                    RetCode::AlreadyShutdown,
                    format!("context {} was shut down", context.0),
                ))
            }
            None => return Err(not_init("context", context.0)),
        }
        let id = state.next_id();
        state.nodes.insert(
            id,
            NodeRecord {
                context,
                name: name.to_string(),
                namespace,
            },
        );
        self.resources.acquire(ResourceKind::Node);
        Ok(NodeId(id))
    }

    fn fini_node(&self, node: NodeId) -> MwResult<()> {
        if self.lock().nodes.remove(&node.0).is_none() {
            return Err(not_init("node", node.0));
        }
        self.resources.release(ResourceKind::Node);
        Ok(())
    }

    fn init_publisher(
        &self,
        node: NodeId,
        type_support: &TypeSupport,
        topic: &str,
        _qos: &QosProfile,
    ) -> MwResult<EndpointId> {
        self.faults.check(Fault::PublisherInit)?;
        let topic = self.resolve_for(node, topic)?;

        let mut state = self.lock();
        let id = state.next_id();
        trace!("loopback publisher {} on '{}'", id, topic);
        state.publishers.insert(
            id,
            PublisherRecord {
                node,
                topic,
                type_name: type_support.full_name(),
                sequence: 0,
            },
        );
        self.resources.acquire(ResourceKind::Publisher);
        Ok(EndpointId(id))
    }

    fn fini_publisher(&self, publisher: EndpointId) -> MwResult<()> {
        if self.lock().publishers.remove(&publisher.0).is_none() {
            return Err(not_init("publisher", publisher.0));
        }
        self.resources.release(ResourceKind::Publisher);
        Ok(())
    }

    fn init_subscription(
        &self,
        node: NodeId,
        type_support: &TypeSupport,
        topic: &str,
        qos: &QosProfile,
    ) -> MwResult<EndpointId> {
        self.faults.check(Fault::SubscriptionInit)?;
        if qos.history_depth == 0 {
            return Err(MiddlewareError::new(
                RetCode::InvalidArgument,
                "history depth must be at least 1",
            ));
        }
        let topic = self.resolve_for(node, topic)?;

        let mut state = self.lock();
        let id = state.next_id();
        trace!("loopback subscription {} on '{}'", id, topic);
        state.subscriptions.insert(
            id,
            SubscriptionRecord {
                topic,
                type_name: type_support.full_name(),
                depth: qos.history_depth.min(self.config.max_history_depth),
                queue: VecDeque::new(),
                dropped: 0,
            },
        );
        self.resources.acquire(ResourceKind::Subscription);
        Ok(EndpointId(id))
    }

    fn fini_subscription(&self, subscription: EndpointId) -> MwResult<()> {
        if self.lock().subscriptions.remove(&subscription.0).is_none() {
            return Err(not_init("subscription", subscription.0));
        }
        self.resources.release(ResourceKind::Subscription);
        Ok(())
    }

    fn publish(&self, publisher: EndpointId, message: MessageView<'_>) -> MwResult<()> {
        self.faults.check(Fault::Publish)?;
        let bytes = self.encode(message)?;

        let mut state = self.lock();
        let node = state
            .publishers
            .get(&publisher.0)
            .ok_or_else(|| not_init("publisher", publisher.0))?
            .node;
        if !state.context_valid(node) {
            return Err(MiddlewareError::new(
                RetCode::AlreadyShutdown,
                format!("publisher {} belongs to a shut down context", publisher.0),
            ));
        }
        let (topic, type_name, sequence) = {
            let record = state
                .publishers
                .get_mut(&publisher.0)
                .ok_or_else(|| not_init("publisher", publisher.0))?;
            record.sequence += 1;
            (record.topic.clone(), record.type_name.clone(), record.sequence)
        };

        let info = MessageInfo {
            publisher,
            sequence,
            source_timestamp_ns: now_ns(),
        };
        let mut delivered = 0usize;
        for record in state.subscriptions.values_mut() {
            if record.topic != topic || record.type_name != type_name {
                continue;
            }
            if record.queue.len() >= record.depth {
                record.queue.pop_front();
                record.dropped += 1;
            }
            record.queue.push_back(Frame {
                bytes: bytes.clone(),
                info: info.clone(),
            });
            delivered += 1;
        }
        drop(state);

        debug!("published {} on '{}' to {} subscription(s)", sequence, topic, delivered);
        if delivered > 0 {
            self.ready.notify_all();
        }
        Ok(())
    }

    fn take(
        &self,
        subscription: EndpointId,
        payload: &mut MessagePayload,
    ) -> MwResult<Option<MessageInfo>> {
        self.faults.check(Fault::Take)?;
        let frame = {
            let mut state = self.lock();
            let record = state
                .subscriptions
                .get_mut(&subscription.0)
                .ok_or_else(|| not_init("subscription", subscription.0))?;
            match record.queue.pop_front() {
                Some(frame) => frame,
                None => return Ok(None),
            }
        };

        let wire: WireOwned = bincode::deserialize(&frame.bytes).map_err(|e| {
            MiddlewareError::new(RetCode::Error, format!("deserialization failed: {}", e))
        })?;
        let filled = match wire {
            WireOwned::Text(text) => payload.fill_text(&text),
            WireOwned::NumericArray(data) => payload.fill_array(&data),
        };
        filled.map_err(|e| MiddlewareError::new(RetCode::InvalidArgument, e.to_string()))?;
        Ok(Some(frame.info))
    }

    fn wait(&self, subscriptions: &[EndpointId], timeout: Duration) -> MwResult<Vec<EndpointId>> {
        self.faults.check(Fault::Wait)?;
        // A timeout too large to represent waits without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();

        loop {
            let mut ready = Vec::new();
            for id in subscriptions {
                let record = state
                    .subscriptions
                    .get(&id.0)
                    .ok_or_else(|| not_init("subscription", id.0))?;
                if !record.queue.is_empty() {
                    ready.push(*id);
                }
            }
            if !ready.is_empty() {
                return Ok(ready);
            }

            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(ready);
                    }
                    self.ready
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self.ready.wait(state).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}
