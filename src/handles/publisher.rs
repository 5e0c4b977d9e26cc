//! Publishing side of a topic

use std::sync::Arc;

use log::info;

use crate::{
    error::{BridgeError, Result},
    message::{MessageKind, MessagePayload, MessageView},
    middleware::EndpointId,
    node::{EndpointRole, NodeInner},
};

/// Publisher bound to one topic and message kind.
///
/// Array publishers keep a reusable payload buffer that grows to fit the
/// largest message published so far and never shrinks.
#[derive(Debug)]
pub struct Publisher {
    node: Arc<NodeInner>,
    endpoint: EndpointId,
    kind: MessageKind,
    topic: String,
    payload: MessagePayload,
}

impl Publisher {
    pub(crate) fn create(node: &Arc<NodeInner>, kind: MessageKind, topic: &str) -> Result<Self> {
        let endpoint = node.create_endpoint(EndpointRole::Publisher, kind, topic)?;
        info!(
            "Created {} publisher {} on '{}' for node '{}'",
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

    /// Message kind this publisher carries
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

    /// Current capacity of the reusable payload buffer, in elements
    pub fn capacity(&self) -> usize {
        self.payload.capacity()
    }

    /// Reusable payload buffer
    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    /// Whether the owning node is still live
    pub fn is_live(&self) -> bool {
        self.node.is_live()
    }

    /// Publish a text message.
    ///
    /// The text is lent to the middleware for the duration of the call and
    /// not retained.
    pub fn publish_text(&mut self, text: &str) -> Result<()> {
        self.kind.expect(MessageKind::Text)?;
        let endpoint = self.endpoint;
        let topic = &self.topic;
        self.node.with_live(|middleware, _| {
            middleware
                .publish(endpoint, MessageView::Text(text))
                .map_err(|source| BridgeError::publish(topic.as_str(), source))
        })
    }

    /// Publish a numeric array.
    ///
    /// The elements are copied into the publisher's buffer, growing it to
    /// exactly `data.len()` when it is too small, and published from there.
    pub fn publish_array(&mut self, data: &[f64]) -> Result<()> {
        self.kind.expect(MessageKind::NumericArray)?;
        let endpoint = self.endpoint;
        let topic = &self.topic;
        let payload = &mut self.payload;
        self.node.with_live(|middleware, _| {
            payload.fill_array(data)?;
            let elements = payload
                .as_array()
                .map(|buffer| buffer.as_slice())
                .unwrap_or_default();
            middleware
                .publish(endpoint, MessageView::NumericArray(elements))
                .map_err(|source| BridgeError::publish(topic.as_str(), source))
        })
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.node.release_endpoint(self.endpoint);
    }
}
