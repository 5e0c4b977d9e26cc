//! Live resource accounting and fault injection for middleware backends

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
};

use super::{MiddlewareError, MwResult, RetCode};

/// Kinds of middleware resources that must be released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Allocator,
    InitOptions,
    Context,
    Node,
    Publisher,
    Subscription,
}

/// Snapshot of how many resources of each kind are alive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub allocators: usize,
    pub init_options: usize,
    pub contexts: usize,
    pub nodes: usize,
    pub publishers: usize,
    pub subscriptions: usize,
}

impl ResourceCounts {
    /// Total number of live resources
    pub fn total(&self) -> usize {
        self.allocators
            + self.init_options
            + self.contexts
            + self.nodes
            + self.publishers
            + self.subscriptions
    }

    /// Check if nothing is alive
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Thread-safe live resource counters
#[derive(Debug, Default)]
pub struct ResourceTracker {
    allocators: AtomicUsize,
    init_options: AtomicUsize,
    contexts: AtomicUsize,
    nodes: AtomicUsize,
    publishers: AtomicUsize,
    subscriptions: AtomicUsize,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, kind: ResourceKind) -> &AtomicUsize {
        match kind {
            ResourceKind::Allocator => &self.allocators,
            ResourceKind::InitOptions => &self.init_options,
            ResourceKind::Context => &self.contexts,
            ResourceKind::Node => &self.nodes,
            ResourceKind::Publisher => &self.publishers,
            ResourceKind::Subscription => &self.subscriptions,
        }
    }

    /// Record an acquisition
    pub fn acquire(&self, kind: ResourceKind) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Record a release
    pub fn release(&self, kind: ResourceKind) {
        let counter = self.counter(kind);
        let mut current = counter.load(Ordering::Relaxed);
        while current > 0 {
            match counter.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => current = x,
            }
        }
    }

    /// Number of live resources of `kind`
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.counter(kind).load(Ordering::Relaxed)
    }

    /// Take a snapshot of all counters
    pub fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            allocators: self.live(ResourceKind::Allocator),
            init_options: self.live(ResourceKind::InitOptions),
            contexts: self.live(ResourceKind::Context),
            nodes: self.live(ResourceKind::Node),
            publishers: self.live(ResourceKind::Publisher),
            subscriptions: self.live(ResourceKind::Subscription),
        }
    }
}

/// Middleware steps that can be made to fail on purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    OptionsInit,
    ContextInit,
    NodeInit,
    PublisherInit,
    SubscriptionInit,
    Publish,
    Take,
    Wait,
}

/// Set of faults currently armed
#[derive(Debug, Default)]
pub struct FaultPlan {
    armed: Mutex<HashSet<Fault>>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `fault` step fail
    pub fn inject(&self, fault: Fault) {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fault);
    }

    /// Stop failing `fault` steps
    pub fn clear(&self, fault: Fault) {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&fault);
    }

    /// Disarm every fault
    pub fn clear_all(&self) {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_armed(&self, fault: Fault) -> bool {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&fault)
    }

    /// Fail with `RetCode::Error` if `fault` is armed
    pub fn check(&self, fault: Fault) -> MwResult<()> {
        if self.is_armed(fault) {
            return Err(MiddlewareError::new(
                RetCode::Error,
                format!("injected {:?} failure", fault),
            ));
        }
        Ok(())
    }
}
