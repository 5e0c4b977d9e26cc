//! Result of a non-blocking take

use crate::middleware::MessageInfo;

/// A message that was received and copied out to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Taken {
    /// Elements (bytes for text) written to the caller's buffer
    pub copied: usize,
    /// Elements the incoming message carried
    pub available: usize,
    /// Delivery metadata reported by the middleware
    pub info: MessageInfo,
}

impl Taken {
    /// Whether part of the message was dropped to fit the caller's buffer
    pub fn is_truncated(&self) -> bool {
        self.available > self.copied
    }
}

/// Outcome of one receive attempt; errors travel separately in `Result`
#[derive(Debug, Clone, PartialEq)]
pub enum TakeOutcome {
    /// No message was waiting
    Empty,
    /// A message was received
    Taken(Taken),
}

impl TakeOutcome {
    /// Number of elements copied, zero when empty
    pub fn copied(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Taken(taken) => taken.copied,
        }
    }

    /// Check if no message was available
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Check if a received message was cut short
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Taken(taken) => taken.is_truncated(),
        }
    }

    /// Get the received message details
    pub fn taken(&self) -> Option<&Taken> {
        match self {
            Self::Empty => None,
            Self::Taken(taken) => Some(taken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::EndpointId;

    #[test]
    fn test_truncation_flag() {
        let info = MessageInfo {
            publisher: EndpointId(1),
            sequence: 1,
            source_timestamp_ns: 0,
        };
        let full = TakeOutcome::Taken(Taken {
            copied: 3,
            available: 3,
            info: info.clone(),
        });
        assert!(!full.is_truncated());
        assert_eq!(full.copied(), 3);

        let cut = TakeOutcome::Taken(Taken {
            copied: 2,
            available: 5,
            info,
        });
        assert!(cut.is_truncated());

        assert!(TakeOutcome::Empty.is_empty());
        assert_eq!(TakeOutcome::Empty.copied(), 0);
        assert!(TakeOutcome::Empty.taken().is_none());
    }
}
