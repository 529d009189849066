//! Uniform block packing.
//!
//! - [`layout`]: the per-type size/alignment/stride table and the [`Uniform`] trait
//! - [`buffer`]: [`UniformBuffer`], the CPU-side copy of one uniform block
//! - [`allocator`]: heap storage interface for blocks larger than the inline capacity

pub mod allocator;
pub mod buffer;
pub mod layout;

pub use allocator::{SystemAllocator, UniformAllocator};
pub use buffer::{LOCAL_STORAGE_SIZE, UniformBuffer};
pub use layout::{Uniform, UniformLayout, UniformRead, UniformType};
