//! Byte layout helpers shared by the uniform packer and interface blocks.

/// Alignment of a block as a whole; blocks are padded up to a multiple of this.
pub const BLOCK_ALIGNMENT: usize = 16;

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two.
#[inline]
#[must_use]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Checks that `offset..offset + size` lies inside a block of `capacity` bytes.
#[inline]
#[must_use]
pub const fn range_fits(offset: usize, size: usize, capacity: usize) -> bool {
    match offset.checked_add(size) {
        Some(end) => end <= capacity,
        None => false,
    }
}
