//! Message shapes carried by publishers and subscribers
//!
//! A handle carries exactly one [`MessageKind`] for its whole lifetime. The
//! kind decides which payload buffer the handle owns, which middleware type
//! descriptor its endpoint is created with, and which publish/take calls are
//! legal on it.

pub mod outcome;
pub mod variant;

pub use outcome::{TakeOutcome, Taken};
pub use variant::{
    MessageKind, MessagePayload, MessageView, TypeSupport, NUMERIC_ARRAY_TYPE, TEXT_TYPE,
};
