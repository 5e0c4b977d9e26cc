//! Message variant tag, type descriptors, and payload storage

use std::fmt;

use crate::buffers::GrowBuffer;
use crate::error::{BridgeError, Result};

/// Middleware type descriptor for a fixed message shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSupport {
    /// Interface package, e.g. `std_msgs`
    pub package: &'static str,
    /// Message name inside the package
    pub name: &'static str,
}

impl TypeSupport {
    /// Fully qualified type name (`package/msg/Name`)
    pub fn full_name(&self) -> String {
        format!("{}/msg/{}", self.package, self.name)
    }
}

/// `std_msgs/msg/String`
pub const TEXT_TYPE: TypeSupport = TypeSupport {
    package: "std_msgs",
    name: "String",
};

/// `std_msgs/msg/Float64MultiArray`
pub const NUMERIC_ARRAY_TYPE: TypeSupport = TypeSupport {
    package: "std_msgs",
    name: "Float64MultiArray",
};

/// The closed set of message shapes a handle can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// UTF-8 text
    Text,
    /// Double-precision element array
    NumericArray,
}

impl MessageKind {
    /// Type descriptor used when creating endpoints of this kind
    pub fn type_support(&self) -> &'static TypeSupport {
        match self {
            Self::Text => &TEXT_TYPE,
            Self::NumericArray => &NUMERIC_ARRAY_TYPE,
        }
    }

    /// Size in bytes of one payload element
    pub fn element_size(&self) -> usize {
        match self {
            Self::Text => std::mem::size_of::<u8>(),
            Self::NumericArray => std::mem::size_of::<f64>(),
        }
    }

    /// Fail with `VariantMismatch` unless this is `expected`
    pub fn expect(&self, expected: MessageKind) -> Result<()> {
        if *self != expected {
            return Err(BridgeError::variant_mismatch(expected, *self));
        }
        Ok(())
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::NumericArray => write!(f, "numeric array"),
        }
    }
}

/// A borrowed message handed to the middleware for one publish call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageView<'a> {
    Text(&'a str),
    NumericArray(&'a [f64]),
}

impl<'a> MessageView<'a> {
    /// Shape of the viewed message
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::NumericArray(_) => MessageKind::NumericArray,
        }
    }

    /// Number of elements (bytes for text)
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::NumericArray(data) => data.len(),
        }
    }

    /// Check if the view holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity advertised to the middleware; text reserves its terminator
    pub fn capacity(&self) -> usize {
        match self {
            Self::Text(text) => text.len() + 1,
            Self::NumericArray(data) => data.len(),
        }
    }
}

/// Payload storage owned by a handle; the variant never changes
#[derive(Debug, Clone)]
pub enum MessagePayload {
    Text(GrowBuffer<u8>),
    NumericArray(GrowBuffer<f64>),
}

impl MessagePayload {
    /// Create an empty payload for `kind`
    pub fn empty(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Text => Self::Text(GrowBuffer::new()),
            MessageKind::NumericArray => Self::NumericArray(GrowBuffer::new()),
        }
    }

    /// Shape of this payload
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::NumericArray(_) => MessageKind::NumericArray,
        }
    }

    /// Number of valid elements
    pub fn len(&self) -> usize {
        match self {
            Self::Text(buffer) => buffer.len(),
            Self::NumericArray(buffer) => buffer.len(),
        }
    }

    /// Check if no elements are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current capacity in elements
    pub fn capacity(&self) -> usize {
        match self {
            Self::Text(buffer) => buffer.capacity(),
            Self::NumericArray(buffer) => buffer.capacity(),
        }
    }

    /// Number of reallocations performed so far
    pub fn grows(&self) -> u64 {
        match self {
            Self::Text(buffer) => buffer.stats().grows,
            Self::NumericArray(buffer) => buffer.stats().grows,
        }
    }

    /// Store a received text message
    pub fn fill_text(&mut self, text: &str) -> Result<()> {
        match self {
            Self::Text(buffer) => {
                buffer.fill_from(text.as_bytes());
                Ok(())
            }
            Self::NumericArray(_) => Err(BridgeError::variant_mismatch(
                MessageKind::NumericArray,
                MessageKind::Text,
            )),
        }
    }

    /// Store a received or outgoing element array
    pub fn fill_array(&mut self, data: &[f64]) -> Result<()> {
        match self {
            Self::NumericArray(buffer) => {
                buffer.fill_from(data);
                Ok(())
            }
            Self::Text(_) => Err(BridgeError::variant_mismatch(
                MessageKind::Text,
                MessageKind::NumericArray,
            )),
        }
    }

    /// Borrow the text buffer
    pub fn as_text(&self) -> Option<&GrowBuffer<u8>> {
        match self {
            Self::Text(buffer) => Some(buffer),
            Self::NumericArray(_) => None,
        }
    }

    /// Borrow the element buffer
    pub fn as_array(&self) -> Option<&GrowBuffer<f64>> {
        match self {
            Self::NumericArray(buffer) => Some(buffer),
            Self::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_support_names() {
        assert_eq!(TEXT_TYPE.full_name(), "std_msgs/msg/String");
        assert_eq!(
            MessageKind::NumericArray.type_support().full_name(),
            "std_msgs/msg/Float64MultiArray"
        );
        assert_eq!(MessageKind::NumericArray.element_size(), 8);
    }

    #[test]
    fn test_expect_kind() {
        assert!(MessageKind::Text.expect(MessageKind::Text).is_ok());
        let err = MessageKind::Text
            .expect(MessageKind::NumericArray)
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::VariantMismatch {
                expected: MessageKind::NumericArray,
                actual: MessageKind::Text,
            }
        ));
    }

    #[test]
    fn test_view_capacity_reserves_terminator() {
        let view = MessageView::Text("abc");
        assert_eq!(view.len(), 3);
        assert_eq!(view.capacity(), 4);

        let data = [1.0, 2.0];
        let view = MessageView::NumericArray(&data);
        assert_eq!(view.capacity(), 2);
        assert_eq!(view.kind(), MessageKind::NumericArray);
    }

    #[test]
    fn test_payload_rejects_wrong_shape() {
        let mut payload = MessagePayload::empty(MessageKind::Text);
        assert!(payload.fill_array(&[1.0]).is_err());
        assert_eq!(payload.capacity(), 0);

        payload.fill_text("hi").unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.as_text().unwrap().as_slice(), b"hi");
        assert!(payload.as_array().is_none());
    }
}
