//! CPU-side Uniform Block
//!
//! [`UniformBuffer`] owns the bytes of one shader uniform block. Values are written
//! at byte offsets following the layout table in [`super::layout`]; the buffer
//! tracks a single coarse dirty flag the driver clears after uploading.
//!
//! Blocks up to [`LOCAL_STORAGE_SIZE`] bytes live inline in the buffer itself so
//! the common per-draw case never touches the heap. Larger blocks take one block
//! of exactly `size` bytes from the buffer's [`UniformAllocator`].

use std::cell::Cell;
use std::fmt;

use vesper_core::errors::{Result, VesperError};
use vesper_core::layout::range_fits;

use super::allocator::{SystemAllocator, UniformAllocator};
use super::layout::{Uniform, UniformRead};
use crate::interface_block::InterfaceBlockLookup;

/// Capacity of the inline block used for small uniform buffers.
pub const LOCAL_STORAGE_SIZE: usize = 96;

enum Storage {
    Local([u8; LOCAL_STORAGE_SIZE]),
    Heap(Box<[u8]>),
}

/// One shader uniform block, packed on the CPU.
pub struct UniformBuffer<A: UniformAllocator = SystemAllocator> {
    storage: Storage,
    size: usize,
    dirty: Cell<bool>,
    allocator: A,
}

impl UniformBuffer<SystemAllocator> {
    /// Creates an empty buffer (size 0, inline storage).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zero-filled buffer of `size` bytes.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self::with_allocator(size, SystemAllocator)
    }

    /// Creates a zero-filled buffer sized to hold the whole interface block.
    #[must_use]
    pub fn from_interface_block(block: &(impl InterfaceBlockLookup + ?Sized)) -> Self {
        Self::with_size(block.size())
    }
}

impl<A: UniformAllocator> UniformBuffer<A> {
    /// Creates a zero-filled buffer of `size` bytes, taking heap storage (if any)
    /// from `allocator`.
    pub fn with_allocator(size: usize, allocator: A) -> Self {
        let storage = if size <= LOCAL_STORAGE_SIZE {
            Storage::Local([0; LOCAL_STORAGE_SIZE])
        } else {
            let block = allocator.allocate(size);
            assert_eq!(
                block.len(),
                size,
                "uniform allocator returned {} bytes, expected {size}",
                block.len()
            );
            log::debug!("Uniform buffer allocated {size} bytes on the heap");
            Storage::Heap(block)
        };

        Self {
            storage,
            size,
            dirty: Cell::new(false),
            allocator,
        }
    }

    /// Same as [`UniformBuffer::from_interface_block`] with an explicit allocator.
    pub fn from_interface_block_with(
        block: &(impl InterfaceBlockLookup + ?Sized),
        allocator: A,
    ) -> Self {
        Self::with_allocator(block.size(), allocator)
    }

    /// Copies the leading `trim` bytes of `rhs` into a new buffer of `trim` bytes.
    ///
    /// The new buffer always declares exactly `trim` bytes, so a caller can also
    /// grow a block this way: when `trim` exceeds `rhs.size()` only the source
    /// bytes are copied and the tail is zero-filled. The dirty flag is carried
    /// over.
    pub fn trimmed(rhs: &Self, trim: usize) -> Self
    where
        A: Clone,
    {
        let mut buffer = Self::with_allocator(trim, rhs.allocator.clone());
        let len = trim.min(rhs.size);
        buffer.bytes_mut()[..len].copy_from_slice(&rhs.as_bytes()[..len]);
        buffer.dirty.set(rhs.dirty.get());
        buffer
    }

    /// Moves the contents out, leaving `self` empty, clean and inline.
    ///
    /// Same as `std::mem::take` but only needs a cloneable allocator, which the
    /// emptied buffer keeps.
    #[must_use]
    pub fn take(&mut self) -> Self
    where
        A: Clone,
    {
        let empty = Self::with_allocator(0, self.allocator.clone());
        std::mem::replace(self, empty)
    }

    /// Size of the uniform block in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The packed contents, exactly [`size`](Self::size) bytes long.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Local(block) => &block[..self.size],
            Storage::Heap(block) => block,
        }
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Local(block) => &mut block[..self.size],
            Storage::Heap(block) => block,
        }
    }

    /// Whether the contents live in the inline block rather than on the heap.
    #[inline]
    #[must_use]
    pub fn is_local_storage(&self) -> bool {
        matches!(self.storage, Storage::Local(_))
    }

    /// Whether any uniform was written since the last [`clean`](Self::clean).
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Marks the whole buffer as clean, typically right after uploading it.
    #[inline]
    pub fn clean(&self) {
        self.dirty.set(false);
    }

    #[inline]
    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Marks the buffer dirty and returns the writable range `offset..offset + size`.
    ///
    /// # Panics
    ///
    /// Panics if the range reaches past the end of the buffer, in every build
    /// configuration.
    pub fn invalidate_uniforms(&mut self, offset: usize, size: usize) -> &mut [u8] {
        assert!(
            range_fits(offset, size, self.size),
            "uniform range out of bounds: offset {offset} + size {size} exceeds buffer size {}",
            self.size
        );
        self.dirty.set(true);
        &mut self.bytes_mut()[offset..offset + size]
    }

    /// Checked form of [`invalidate_uniforms`](Self::invalidate_uniforms).
    ///
    /// The dirty flag is left untouched when the range is rejected.
    pub fn try_invalidate_uniforms(&mut self, offset: usize, size: usize) -> Result<&mut [u8]> {
        if !range_fits(offset, size, self.size) {
            return Err(VesperError::UniformOutOfBounds {
                offset,
                size,
                capacity: self.size,
            });
        }
        Ok(self.invalidate_uniforms(offset, size))
    }

    /// Writes one value at `offset`.
    ///
    /// 3-component vectors write 12 bytes and leave the 4th lane of their slot
    /// alone; 3x3 matrices write three padded 16-byte columns.
    #[inline]
    pub fn set_uniform<T: Uniform>(&mut self, offset: usize, value: T) {
        let size = T::TYPE.size();
        value.pack(self.invalidate_uniforms(offset, size));
    }

    /// Writes `values` as consecutive array elements starting at `offset`, one
    /// element per array stride.
    pub fn set_uniform_array<T: Uniform>(&mut self, offset: usize, values: &[T]) {
        let layout = T::TYPE.layout();
        let span = layout.stride.saturating_mul(values.len());
        let dst = self.invalidate_uniforms(offset, span);
        for (value, slot) in values.iter().zip(dst.chunks_exact_mut(layout.stride)) {
            value.pack(&mut slot[..layout.size]);
        }
    }

    /// Reads back the value stored at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the value would reach past the end of the buffer.
    #[must_use]
    pub fn get_uniform<T: UniformRead>(&self, offset: usize) -> T {
        let size = T::TYPE.size();
        assert!(
            range_fits(offset, size, self.size),
            "uniform read out of bounds: offset {offset} + size {size} exceeds buffer size {}",
            self.size
        );
        T::unpack(&self.as_bytes()[offset..offset + size])
    }

    /// Writes element `index` of the uniform called `name`, if `block` declares it.
    ///
    /// A uniform the block does not declare is skipped without error: materials
    /// routinely set values that only some shader variants use.
    #[inline]
    pub fn set_uniform_by_name<T: Uniform>(
        &mut self,
        block: &(impl InterfaceBlockLookup + ?Sized),
        name: &str,
        index: usize,
        value: T,
    ) {
        if let Some(offset) = block.uniform_offset(name, index) {
            self.set_uniform(offset, value);
        }
    }
}

impl<A: UniformAllocator + Default> Default for UniformBuffer<A> {
    fn default() -> Self {
        Self {
            storage: Storage::Local([0; LOCAL_STORAGE_SIZE]),
            size: 0,
            dirty: Cell::new(false),
            allocator: A::default(),
        }
    }
}

impl<A: UniformAllocator + Clone> Clone for UniformBuffer<A> {
    fn clone(&self) -> Self {
        Self::trimmed(self, self.size)
    }
}

impl<A: UniformAllocator> Drop for UniformBuffer<A> {
    fn drop(&mut self) {
        if let Storage::Heap(block) =
            std::mem::replace(&mut self.storage, Storage::Local([0; LOCAL_STORAGE_SIZE]))
        {
            self.allocator.free(block);
        }
    }
}

struct Word<'a>(&'a [u8]);

impl fmt::Debug for Word<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl<A: UniformAllocator> fmt::Debug for UniformBuffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformBuffer")
            .field("size", &self.size)
            .field("local", &self.is_local_storage())
            .field("dirty", &self.is_dirty())
            .field("data", &self.as_bytes().chunks(4).map(Word).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

    #[test]
    fn test_default_is_empty_and_local() {
        let buffer = UniformBuffer::new();
        assert_eq!(buffer.size(), 0);
        assert!(buffer.is_local_storage());
        assert!(!buffer.is_dirty());
        assert!(buffer.as_bytes().is_empty());
    }

    #[test]
    fn test_storage_threshold() {
        assert!(UniformBuffer::with_size(LOCAL_STORAGE_SIZE).is_local_storage());
        assert!(!UniformBuffer::with_size(LOCAL_STORAGE_SIZE + 1).is_local_storage());
    }

    #[test]
    fn test_invalidate_marks_dirty_and_clean_resets() {
        let mut buffer = UniformBuffer::with_size(32);
        let range = buffer.invalidate_uniforms(16, 16);
        assert_eq!(range.len(), 16);
        assert!(buffer.is_dirty());

        buffer.clean();
        assert!(!buffer.is_dirty());
    }

    #[test]
    #[should_panic(expected = "uniform range out of bounds")]
    fn test_invalidate_out_of_bounds_panics() {
        let mut buffer = UniformBuffer::with_size(32);
        let _ = buffer.invalidate_uniforms(20, 16);
    }

    #[test]
    fn test_try_invalidate_reports_range() {
        let mut buffer = UniformBuffer::with_size(32);
        let err = buffer.try_invalidate_uniforms(20, 16).unwrap_err();
        assert_eq!(
            err,
            VesperError::UniformOutOfBounds {
                offset: 20,
                size: 16,
                capacity: 32
            }
        );
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn test_scalar_after_vec3_shares_slot() {
        let mut buffer = UniformBuffer::with_size(32);
        buffer.set_uniform(12, 5.0f32);
        buffer.set_uniform(0, Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(buffer.get_uniform::<Vec3>(0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(buffer.get_uniform::<f32>(12), 5.0);
    }

    #[test]
    fn test_mixed_block_layout() {
        let mut buffer = UniformBuffer::with_size(176);
        buffer.set_uniform(0, Mat4::IDENTITY);
        buffer.set_uniform(64, Mat3::IDENTITY);
        buffer.set_uniform(112, Vec4::ONE);
        buffer.set_uniform(128, Vec2::new(0.5, 0.25));
        buffer.set_uniform(136, 7u32);
        buffer.set_uniform(140, true);

        assert_eq!(buffer.get_uniform::<Mat4>(0), Mat4::IDENTITY);
        assert_eq!(buffer.get_uniform::<Vec4>(64), Vec4::new(1.0, 0.0, 0.0, 0.0));
        assert_eq!(buffer.get_uniform::<Vec4>(80), Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(buffer.get_uniform::<Vec4>(96), Vec4::new(0.0, 0.0, 1.0, 0.0));
        assert_eq!(buffer.get_uniform::<Vec4>(112), Vec4::ONE);
        assert_eq!(buffer.get_uniform::<Vec2>(128), Vec2::new(0.5, 0.25));
        assert_eq!(buffer.get_uniform::<u32>(136), 7);
        assert!(buffer.get_uniform::<bool>(140));
    }

    #[test]
    fn test_trimmed_copies_leading_bytes() {
        let mut source = UniformBuffer::with_size(64);
        source.set_uniform(0, Vec4::splat(1.0));
        source.set_uniform(48, Vec4::splat(2.0));

        let trimmed = UniformBuffer::trimmed(&source, 16);
        assert_eq!(trimmed.size(), 16);
        assert_eq!(trimmed.as_bytes(), &source.as_bytes()[..16]);
        assert!(trimmed.is_dirty());

        let grown = UniformBuffer::trimmed(&source, 128);
        assert_eq!(grown.size(), 128);
        assert!(!grown.is_local_storage());
        assert_eq!(&grown.as_bytes()[..64], source.as_bytes());
        assert!(grown.as_bytes()[64..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_take_empties_source() {
        let mut source = UniformBuffer::with_size(128);
        source.set_uniform(0, Vec4::ONE);

        let moved = source.take();
        assert_eq!(source.size(), 0);
        assert!(source.is_local_storage());
        assert!(!source.is_dirty());
        assert_eq!(moved.size(), 128);
        assert!(!moved.is_local_storage());
        assert_eq!(moved.get_uniform::<Vec4>(0), Vec4::ONE);
    }

    #[test]
    fn test_debug_output() {
        let mut buffer = UniformBuffer::with_size(4);
        buffer.set_uniform(0, 0x0102_0304u32);
        let text = format!("{buffer:?}");
        assert!(text.contains("size: 4"));
        assert!(text.contains("dirty: true"));
    }
}
