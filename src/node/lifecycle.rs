//! Staged node construction and ordered teardown

use std::{
    collections::HashMap,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::{info, warn};

use crate::{
    config::BridgeConfig,
    error::{BridgeError, Result},
    handles::{Publisher, Subscriber},
    message::MessageKind,
    middleware::{
        AllocatorId, ContextId, EndpointId, InitOptionsId, Middleware, MiddlewareError, MwResult,
        NodeId,
    },
};

/// Middleware resources held by a live node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeResources {
    pub allocator: AllocatorId,
    pub options: InitOptionsId,
    pub context: ContextId,
    pub node: NodeId,
}

/// Which side of a topic an endpoint is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndpointRole {
    Publisher,
    Subscription,
}

impl EndpointRole {
    fn fini(self, middleware: &dyn Middleware, endpoint: EndpointId) -> MwResult<()> {
        match self {
            Self::Publisher => middleware.fini_publisher(endpoint),
            Self::Subscription => middleware.fini_subscription(endpoint),
        }
    }
}

#[derive(Debug)]
pub(crate) struct LiveNode {
    pub resources: NodeResources,
    pub endpoints: HashMap<EndpointId, EndpointRole>,
}

#[derive(Debug)]
enum NodeState {
    Live(LiveNode),
    ShutDown,
}

/// Sub-resources acquired so far; dropping releases them in reverse order
struct Staged<'a> {
    middleware: &'a dyn Middleware,
    allocator: Option<AllocatorId>,
    options: Option<InitOptionsId>,
    context: Option<ContextId>,
}

impl<'a> Staged<'a> {
    fn new(middleware: &'a dyn Middleware) -> Self {
        Self {
            middleware,
            allocator: None,
            options: None,
            context: None,
        }
    }

    /// Hand ownership of everything acquired to the caller
    fn disarm(&mut self) {
        self.allocator = None;
        self.options = None;
        self.context = None;
    }
}

impl Drop for Staged<'_> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            if let Err(e) = self.middleware.shutdown_context(context) {
                warn!("Failed to shut down partially built context: {}", e);
            }
            if let Err(e) = self.middleware.fini_context(context) {
                warn!("Failed to finalize partially built context: {}", e);
            }
        }
        if let Some(options) = self.options.take() {
            if let Err(e) = self.middleware.fini_options(options) {
                warn!("Failed to finalize init options: {}", e);
            }
        }
        if let Some(allocator) = self.allocator.take() {
            self.middleware.release_allocator(allocator);
        }
    }
}

fn acquire(middleware: &dyn Middleware, name: &str, namespace: &str) -> Result<NodeResources> {
    let mut staged = Staged::new(middleware);

    let allocator = middleware.default_allocator();
    staged.allocator = Some(allocator);

    let options = middleware
        .init_options(allocator)
        .map_err(|source| BridgeError::OptionsInit { source })?;
    staged.options = Some(options);

    let context = middleware
        .init_context(options)
        .map_err(|source| BridgeError::ContextInit { source })?;
    staged.context = Some(context);

    let node = middleware
        .init_node(context, name, namespace)
        .map_err(|source| BridgeError::node_init(name, source))?;

    staged.disarm();
    Ok(NodeResources {
        allocator,
        options,
        context,
        node,
    })
}

/// State shared between a node and every handle created from it
#[derive(Debug)]
pub(crate) struct NodeInner {
    name: String,
    config: BridgeConfig,
    middleware: Arc<dyn Middleware>,
    state: Mutex<NodeState>,
}

impl NodeInner {
    fn lock_state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn middleware(&self) -> &dyn Middleware {
        self.middleware.as_ref()
    }

    pub fn is_live(&self) -> bool {
        matches!(*self.lock_state(), NodeState::Live(_))
    }

    /// Run `f` against the live node, or fail with `NodeShutdown`
    pub fn with_live<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Middleware, &mut LiveNode) -> Result<T>,
    {
        let mut state = self.lock_state();
        match &mut *state {
            NodeState::Live(live) => f(self.middleware.as_ref(), live),
            NodeState::ShutDown => Err(BridgeError::node_shutdown(&self.name)),
        }
    }

    /// Create a middleware endpoint and start tracking it
    pub fn create_endpoint(
        &self,
        role: EndpointRole,
        kind: MessageKind,
        topic: &str,
    ) -> Result<EndpointId> {
        let qos = self.config.qos();
        self.with_live(|middleware, live| {
            let node = live.resources.node;
            let type_support = kind.type_support();
            let endpoint = match role {
                EndpointRole::Publisher => middleware
                    .init_publisher(node, type_support, topic, &qos)
                    .map_err(|source| BridgeError::publisher_init(topic, source))?,
                EndpointRole::Subscription => middleware
                    .init_subscription(node, type_support, topic, &qos)
                    .map_err(|source| BridgeError::subscriber_init(topic, source))?,
            };
            live.endpoints.insert(endpoint, role);
            Ok(endpoint)
        })
    }

    /// Finalize an endpoint whose handle is going away.
    ///
    /// Endpoints of a node that was already shut down were finalized then.
    pub fn release_endpoint(&self, endpoint: EndpointId) {
        let mut state = self.lock_state();
        if let NodeState::Live(live) = &mut *state {
            if let Some(role) = live.endpoints.remove(&endpoint) {
                if let Err(e) = role.fini(self.middleware.as_ref(), endpoint) {
                    warn!("Failed to release endpoint {} of node '{}': {}", endpoint, self.name, e);
                }
            }
        }
    }

    /// Subscriptions currently alive on this node
    pub fn subscriptions(&self) -> Result<Vec<EndpointId>> {
        self.with_live(|_, live| {
            Ok(live
                .endpoints
                .iter()
                .filter(|(_, role)| **role == EndpointRole::Subscription)
                .map(|(endpoint, _)| *endpoint)
                .collect())
        })
    }

    /// Number of endpoints alive on this node
    pub fn endpoint_count(&self) -> usize {
        match &*self.lock_state() {
            NodeState::Live(live) => live.endpoints.len(),
            NodeState::ShutDown => 0,
        }
    }

    /// Release endpoints, node, context, init-options and allocator.
    ///
    /// Every step runs even if an earlier one fails; the first failure is
    /// returned. Calling this on a node that is already down does nothing.
    pub fn shutdown(&self) -> Result<()> {
        let live = match mem::replace(&mut *self.lock_state(), NodeState::ShutDown) {
            NodeState::Live(live) => live,
            NodeState::ShutDown => return Ok(()),
        };

        let middleware = self.middleware.as_ref();
        let resources = live.resources;
        let mut first_error: Option<MiddlewareError> = None;
        let mut record = |step: &str, result: MwResult<()>| {
            if let Err(e) = result {
                warn!("Node '{}' {} failed: {}", self.name, step, e);
                first_error.get_or_insert(e);
            }
        };

        for (endpoint, role) in live.endpoints {
            record("endpoint release", role.fini(middleware, endpoint));
        }
        record("node release", middleware.fini_node(resources.node));
        record("context shutdown", middleware.shutdown_context(resources.context));
        record("context finalization", middleware.fini_context(resources.context));
        record("init options finalization", middleware.fini_options(resources.options));
        middleware.release_allocator(resources.allocator);

        info!("Node '{}' shut down", self.name);
        match first_error {
            None => Ok(()),
            Some(source) => Err(BridgeError::Shutdown {
                name: self.name.clone(),
                source,
            }),
        }
    }
}

/// A live connection to the middleware under one node identity.
///
/// Dropping a node runs the same release sequence as [`Node::shutdown`].
#[derive(Debug)]
pub struct Node {
    pub(crate) inner: Arc<NodeInner>,
}

impl Node {
    /// Create a node with the default configuration
    pub fn initialize(name: &str, middleware: Arc<dyn Middleware>) -> Result<Self> {
        Self::initialize_with_config(name, middleware, BridgeConfig::default())
    }

    /// Create a node, acquiring allocator, init-options, context and node
    /// in order. On failure everything acquired so far is released.
    pub fn initialize_with_config(
        name: &str,
        middleware: Arc<dyn Middleware>,
        config: BridgeConfig,
    ) -> Result<Self> {
        config.validate()?;
        let resources = acquire(middleware.as_ref(), name, &config.namespace)?;

        info!("Node '{}' initialized", name);
        Ok(Self {
            inner: Arc::new(NodeInner {
                name: name.to_string(),
                config,
                middleware,
                state: Mutex::new(NodeState::Live(LiveNode {
                    resources,
                    endpoints: HashMap::new(),
                })),
            }),
        })
    }

    /// Node name
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Configuration the node was created with
    pub fn config(&self) -> &BridgeConfig {
        self.inner.config()
    }

    /// Whether the node has not been shut down
    pub fn is_live(&self) -> bool {
        self.inner.is_live()
    }

    /// Number of publishers and subscribers alive on this node
    pub fn endpoint_count(&self) -> usize {
        self.inner.endpoint_count()
    }

    /// Create a publisher for text messages
    pub fn create_text_publisher(&self, topic: &str) -> Result<Publisher> {
        Publisher::create(&self.inner, MessageKind::Text, topic)
    }

    /// Create a publisher for numeric arrays
    pub fn create_array_publisher(&self, topic: &str) -> Result<Publisher> {
        Publisher::create(&self.inner, MessageKind::NumericArray, topic)
    }

    /// Create a subscriber for text messages
    pub fn create_text_subscriber(&self, topic: &str) -> Result<Subscriber> {
        Subscriber::create(&self.inner, MessageKind::Text, topic)
    }

    /// Create a subscriber for numeric arrays
    pub fn create_array_subscriber(&self, topic: &str) -> Result<Subscriber> {
        Subscriber::create(&self.inner, MessageKind::NumericArray, topic)
    }

    /// Tear the node down, reporting the first release failure
    pub fn shutdown(self) -> Result<()> {
        self.inner.shutdown()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Err(e) = self.inner.shutdown() {
            warn!("Error while dropping node '{}': {}", self.inner.name(), e);
        }
    }
}
