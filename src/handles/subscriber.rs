//! Receiving side of a topic

use std::sync::Arc;

use log::info;

use crate::{
    error::{BridgeError, Result},
    message::{MessageKind, MessagePayload, TakeOutcome, Taken},
    middleware::{EndpointId, MessageInfo},
    node::{EndpointRole, NodeInner},
};

/// Subscriber bound to one topic and message kind.
///
/// Takes never block. Received messages land in the subscriber's own
/// payload buffer first and are then copied into the caller's buffer,
/// truncated to fit.
#[derive(Debug)]
pub struct Subscriber {
    node: Arc<NodeInner>,
    endpoint: EndpointId,
    kind: MessageKind,
    topic: String,
    payload: MessagePayload,
}

impl Subscriber {
    pub(crate) fn create(node: &Arc<NodeInner>, kind: MessageKind, topic: &str) -> Result<Self> {
        let endpoint = node.create_endpoint(EndpointRole::Subscription, kind, topic)?;
        info!(
            "Created {} subscriber {} on '{}' for node '{}'",
            kind,
            endpoint,
            topic,
            node.name()
        );
        Ok(Self {
            node: Arc::clone(node),
            endpoint,
            kind,
            topic: topic.to_string(),
            payload: MessagePayload::empty(kind),
        })
    }

    /// Message kind this subscriber carries
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Topic name as given at creation
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Middleware endpoint id
    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    /// Current capacity of the receive buffer, in elements
    pub fn capacity(&self) -> usize {
        self.payload.capacity()
    }

    /// Last message received, as stored in the subscriber's buffer
    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    /// Whether the owning node is still live
    pub fn is_live(&self) -> bool {
        self.node.is_live()
    }

    /// Receive one message into the internal buffer
    fn receive(&mut self, expected: MessageKind) -> Result<Option<MessageInfo>> {
        self.kind.expect(expected)?;
        let endpoint = self.endpoint;
        let topic = &self.topic;
        let payload = &mut self.payload;
        self.node.with_live(|middleware, _| {
            middleware
                .take(endpoint, payload)
                .map_err(|source| BridgeError::take(topic.as_str(), source))
        })
    }

    /// Take one text message into `buffer` as a NUL-terminated string.
    ///
    /// At most `buffer.len() - 1` bytes of text are copied, followed by a
    /// terminating zero byte. An empty buffer cannot hold the terminator and
    /// is rejected before anything is received.
    pub fn take_text(&mut self, buffer: &mut [u8]) -> Result<TakeOutcome> {
        self.kind.expect(MessageKind::Text)?;
        let room = buffer.len().checked_sub(1).ok_or_else(|| {
            BridgeError::invalid_parameter("buffer", "text buffer must hold at least one byte")
        })?;

        let info = match self.receive(MessageKind::Text)? {
            Some(info) => info,
            None => return Ok(TakeOutcome::Empty),
        };
        let text = self.payload.as_text().map(|b| b.as_slice()).unwrap_or_default();
        let copied = text.len().min(room);
        buffer[..copied].copy_from_slice(&text[..copied]);
        buffer[copied] = 0;

        Ok(TakeOutcome::Taken(Taken {
            copied,
            available: text.len(),
            info,
        }))
    }

    /// Take one numeric array into `buffer`, copying at most `buffer.len()`
    /// elements
    pub fn take_array(&mut self, buffer: &mut [f64]) -> Result<TakeOutcome> {
        let info = match self.receive(MessageKind::NumericArray)? {
            Some(info) => info,
            None => return Ok(TakeOutcome::Empty),
        };
        let (copied, available) = match self.payload.as_array() {
            Some(elements) => (elements.copy_into(buffer), elements.len()),
            None => (0, 0),
        };

        Ok(TakeOutcome::Taken(Taken {
            copied,
            available,
            info,
        }))
    }

    /// Take one text message as an owned string
    pub fn take_text_string(&mut self) -> Result<Option<String>> {
        if self.receive(MessageKind::Text)?.is_none() {
            return Ok(None);
        }
        let text = self.payload.as_text().map(|b| b.as_slice()).unwrap_or_default();
        Ok(Some(String::from_utf8_lossy(text).into_owned()))
    }

    /// Take one numeric array as an owned vector
    pub fn take_array_vec(&mut self) -> Result<Option<Vec<f64>>> {
        if self.receive(MessageKind::NumericArray)?.is_none() {
            return Ok(None);
        }
        Ok(self.payload.as_array().map(|b| b.as_slice().to_vec()))
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.node.release_endpoint(self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{middleware::LoopbackMiddleware, node::Node};

    fn node() -> Node {
        Node::initialize("sub_test", Arc::new(LoopbackMiddleware::new())).unwrap()
    }

    #[test]
    fn test_take_text_truncates_and_terminates() {
        let node = node();
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let mut subscriber = node.create_text_subscriber("chatter").unwrap();

        publisher.publish_text("hello world").unwrap();
        let mut buffer = [0xffu8; 6];
        let outcome = subscriber.take_text(&mut buffer).unwrap();
        assert_eq!(outcome.copied(), 5);
        assert!(outcome.is_truncated());
        assert_eq!(&buffer, b"hello\0");

        assert!(subscriber.take_text(&mut buffer).unwrap().is_empty());
    }

    #[test]
    fn test_take_text_rejects_empty_buffer() {
        let node = node();
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let mut subscriber = node.create_text_subscriber("chatter").unwrap();
        publisher.publish_text("kept").unwrap();

        let err = subscriber.take_text(&mut []).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParameter { .. }));
        assert_eq!(subscriber.take_text_string().unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_take_array_truncates() {
        let node = node();
        let mut publisher = node.create_array_publisher("data").unwrap();
        let mut subscriber = node.create_array_subscriber("data").unwrap();

        publisher.publish_array(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut buffer = [0.0; 2];
        let outcome = subscriber.take_array(&mut buffer).unwrap();
        let taken = outcome.taken().unwrap();
        assert_eq!(taken.copied, 2);
        assert_eq!(taken.available, 4);
        assert_eq!(buffer, [1.0, 2.0]);
    }

    #[test]
    fn test_mismatch_consumes_nothing() {
        let node = node();
        let mut publisher = node.create_text_publisher("chatter").unwrap();
        let mut subscriber = node.create_text_subscriber("chatter").unwrap();
        publisher.publish_text("still here").unwrap();

        let err = subscriber.take_array(&mut [0.0; 4]).unwrap_err();
        assert!(matches!(err, BridgeError::VariantMismatch { .. }));
        assert_eq!(
            subscriber.take_text_string().unwrap().as_deref(),
            Some("still here")
        );
    }
}
