//! Grow-only payload buffer

use log::debug;

use crate::error::{BridgeError, Result};

use super::stats::BufferStats;

/// A growable element buffer with an explicit length/capacity pair.
///
/// Capacity only changes through [`GrowBuffer::ensure_capacity`], which
/// reallocates to exactly the requested number of elements and never shrinks.
/// The length is set per operation and may move freely within capacity.
#[derive(Debug, Clone, Default)]
pub struct GrowBuffer<T> {
    /// Backing storage; `storage.len()` is the logical capacity
    storage: Vec<T>,
    /// Number of valid elements
    len: usize,
    stats: BufferStats,
}

impl<T: Copy + Default> GrowBuffer<T> {
    /// Create an empty buffer with zero capacity
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            len: 0,
            stats: BufferStats::new(),
        }
    }

    /// Create an empty buffer with a preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.ensure_capacity(capacity);
        buffer
    }

    /// Make sure at least `required` elements fit.
    ///
    /// Returns `true` when a reallocation happened. The new capacity is
    /// exactly `required`; smaller requests leave the buffer untouched.
    pub fn ensure_capacity(&mut self, required: usize) -> bool {
        let capacity = self.capacity();
        if required <= capacity {
            return false;
        }

        self.storage.reserve_exact(required - capacity);
        self.storage.resize(required, T::default());
        self.stats.record_grow();
        debug!("payload buffer grown from {} to {} elements", capacity, required);
        true
    }

    /// Replace the contents with `src`, growing if needed
    pub fn fill_from(&mut self, src: &[T]) {
        self.ensure_capacity(src.len());
        self.storage[..src.len()].copy_from_slice(src);
        self.len = src.len();
        self.stats.record_fill(src.len());
    }

    /// Copy the valid elements into `dst`, returning how many were copied.
    ///
    /// At most `dst.len()` elements are written; the rest are dropped.
    pub fn copy_into(&self, dst: &mut [T]) -> usize {
        let count = self.len.min(dst.len());
        dst[..count].copy_from_slice(&self.storage[..count]);
        count
    }

    /// Set the number of valid elements without touching capacity
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > self.capacity() {
            return Err(BridgeError::invalid_parameter(
                "len",
                format!("length {} exceeds capacity {}", len, self.capacity()),
            ));
        }
        self.len = len;
        Ok(())
    }

    /// Get the valid elements
    pub fn as_slice(&self) -> &[T] {
        &self.storage[..self.len]
    }

    /// Number of valid elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of elements the buffer can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Check if the buffer holds no valid elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark the buffer empty (capacity is kept)
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Get growth statistics
    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Size in bytes of one element
    pub fn element_size(&self) -> usize {
        std::mem::size_of::<T>()
    }
}

impl<T: Copy + Default> AsRef<[T]> for GrowBuffer<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer: GrowBuffer<f64> = GrowBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.element_size(), 8);
    }

    #[test]
    fn test_exact_fit_growth() {
        let mut buffer: GrowBuffer<f64> = GrowBuffer::new();
        assert!(buffer.ensure_capacity(7));
        assert_eq!(buffer.capacity(), 7);
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_never_shrinks() {
        let mut buffer: GrowBuffer<f64> = GrowBuffer::with_capacity(10);
        assert!(!buffer.ensure_capacity(3));
        assert_eq!(buffer.capacity(), 10);

        buffer.fill_from(&[1.0, 2.0]);
        assert_eq!(buffer.capacity(), 10);
        assert_eq!(buffer.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_fill_sequence_capacity() {
        let mut buffer: GrowBuffer<f64> = GrowBuffer::new();
        let mut last_capacity = 0;
        for size in [2usize, 5, 3, 5] {
            let data: Vec<f64> = (0..size).map(|i| i as f64).collect();
            buffer.fill_from(&data);
            assert!(buffer.capacity() >= last_capacity);
            assert_eq!(buffer.len(), size);
            last_capacity = buffer.capacity();
        }
        assert_eq!(buffer.capacity(), 5);
        assert_eq!(buffer.stats().grows, 2);
        assert_eq!(buffer.stats().fills, 4);
    }

    #[test]
    fn test_copy_into_truncates() {
        let mut buffer: GrowBuffer<u8> = GrowBuffer::new();
        buffer.fill_from(b"hello world");

        let mut small = [0u8; 5];
        assert_eq!(buffer.copy_into(&mut small), 5);
        assert_eq!(&small, b"hello");

        let mut large = [0u8; 32];
        assert_eq!(buffer.copy_into(&mut large), 11);
        assert_eq!(&large[..11], b"hello world");
    }

    #[test]
    fn test_set_len_bounds() {
        let mut buffer: GrowBuffer<u8> = GrowBuffer::with_capacity(4);
        assert!(buffer.set_len(4).is_ok());
        assert!(buffer.set_len(5).is_err());
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);
    }
}
