//! Single-iteration event processing

use std::{
    fmt,
    str::FromStr,
    thread,
    time::{Duration, Instant},
};

use log::trace;

use crate::{
    error::{BridgeError, Result},
    middleware::EndpointId,
};

use super::Node;

/// What [`Node::spin_once`] does with its timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinMode {
    /// Sleep for the full timeout without touching the middleware.
    /// Messages are only ever received by explicit takes.
    #[default]
    Sleep,
    /// Block in the middleware until a subscription has data or the
    /// timeout elapses, then report which subscriptions are ready
    Wait,
}

impl FromStr for SpinMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sleep" => Ok(Self::Sleep),
            "wait" => Ok(Self::Wait),
            other => Err(BridgeError::invalid_parameter(
                "spin_mode",
                format!("unknown spin mode '{}'", other),
            )),
        }
    }
}

impl fmt::Display for SpinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sleep => write!(f, "sleep"),
            Self::Wait => write!(f, "wait"),
        }
    }
}

/// What one spin iteration observed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpinReport {
    /// Subscriptions with at least one queued message (always empty in
    /// sleep mode)
    pub ready: Vec<EndpointId>,
    /// Wall time spent in the call
    pub elapsed: Duration,
}

impl Node {
    /// Give the middleware one chance to make progress, bounded by
    /// `timeout`. Messages are never taken here.
    pub fn spin_once(&self, timeout: Duration) -> Result<SpinReport> {
        let start = Instant::now();
        let ready = match self.config().spin_mode {
            SpinMode::Sleep => {
                if !self.inner.is_live() {
                    return Err(BridgeError::node_shutdown(self.name()));
                }
                thread::sleep(timeout);
                Vec::new()
            }
            SpinMode::Wait => {
                // The state lock is not held while blocking so publishers on
                // other threads can make progress.
                let subscriptions = self.inner.subscriptions()?;
                self.inner
                    .middleware()
                    .wait(&subscriptions, timeout)
                    .map_err(|source| BridgeError::Wait {
                        name: self.name().to_string(),
                        source,
                    })?
            }
        };

        let report = SpinReport {
            ready,
            elapsed: start.elapsed(),
        };
        trace!(
            "Node '{}' spun for {:?}, {} subscription(s) ready",
            self.name(),
            report.elapsed,
            report.ready.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BridgeConfig, middleware::LoopbackMiddleware};
    use std::sync::Arc;

    #[test]
    fn test_spin_mode_parse() {
        assert_eq!("sleep".parse::<SpinMode>().unwrap(), SpinMode::Sleep);
        assert_eq!(" WAIT ".parse::<SpinMode>().unwrap(), SpinMode::Wait);
        assert!("poll".parse::<SpinMode>().is_err());
        assert_eq!(SpinMode::Wait.to_string(), "wait");
    }

    #[test]
    fn test_sleep_mode_waits_full_timeout() {
        let node = Node::initialize("spinner", Arc::new(LoopbackMiddleware::new())).unwrap();
        let report = node.spin_once(Duration::from_millis(20)).unwrap();
        assert!(report.elapsed >= Duration::from_millis(20));
        assert!(report.ready.is_empty());
    }

    #[test]
    fn test_wait_mode_reports_ready_subscription() {
        let config = BridgeConfig::default().with_spin_mode(SpinMode::Wait);
        let node =
            Node::initialize_with_config("spinner", Arc::new(LoopbackMiddleware::new()), config)
                .unwrap();
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let subscriber = node.create_text_subscriber("chatter").unwrap();

        let report = node.spin_once(Duration::from_millis(5)).unwrap();
        assert!(report.ready.is_empty());

        publisher.publish_text("hello").unwrap();
        let report = node.spin_once(Duration::from_secs(1)).unwrap();
        assert_eq!(report.ready, vec![subscriber.endpoint()]);
    }
}
