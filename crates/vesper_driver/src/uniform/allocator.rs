//! Heap allocator interface for uniform buffers that outgrow inline storage.

/// Source of heap blocks for [`UniformBuffer`](super::UniformBuffer).
///
/// A buffer calls [`allocate`](Self::allocate) once when it is created with a size
/// larger than the inline capacity and hands the block back through
/// [`free`](Self::free) exactly once when it is dropped.
pub trait UniformAllocator {
    /// Returns a zero-filled block of exactly `size` bytes.
    fn allocate(&self, size: usize) -> Box<[u8]>;

    /// Takes back a block previously returned by [`allocate`](Self::allocate).
    fn free(&self, block: Box<[u8]>) {
        drop(block);
    }
}

/// Allocator backed by the global Rust allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

impl UniformAllocator for SystemAllocator {
    #[inline]
    fn allocate(&self, size: usize) -> Box<[u8]> {
        vec![0; size].into_boxed_slice()
    }
}
