//! Message payload buffers
//!
//! Every publisher and subscriber owns exactly one payload buffer. Buffers
//! follow a grow-only policy: capacity is raised to exactly the size a message
//! needs and is never reduced for the lifetime of the handle.

pub mod buffer;
pub mod stats;

// Re-export main types
pub use buffer::GrowBuffer;
pub use stats::BufferStats;
