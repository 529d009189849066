//! # Vesper
//!
//! Driver-layer building blocks for a GPU renderer:
//!
//! - [`UniformBuffer`]: CPU-side uniform block with std140-style packing and
//!   inline storage for small blocks
//! - [`InterfaceBlock`] / [`InterfaceBlockLookup`]: uniform name to offset resolution
//! - [`Disposer`] / [`ResourceSet`]: reference-counted deferred destruction of GPU
//!   resources still referenced by in-flight submissions
//!
//! ```rust,ignore
//! use vesper::{Disposer, ResourceSet, UniformBuffer};
//! use vesper::glam::Vec4;
//!
//! let mut params = UniformBuffer::with_size(64);
//! params.set_uniform(0, Vec4::ONE);
//!
//! let mut disposer = Disposer::new();
//! let mut frame = ResourceSet::new();
//! disposer.create_disposable(texture_id, move || destroy_texture(texture_id))?;
//! disposer.acquire(texture_id, &mut frame)?;
//! // ... submit, wait for the fence ...
//! disposer.release(&mut frame)?;
//! disposer.gc();
//! ```

pub use vesper_core::errors;
pub use vesper_core::errors::{Result, VesperError};
pub use vesper_driver::{disposer, interface_block, uniform};

pub use vesper_driver::{
    Destructor, Disposer, InterfaceBlock, InterfaceBlockBuilder, InterfaceBlockLookup,
    LOCAL_STORAGE_SIZE, ResourceSet, SystemAllocator, Uniform, UniformAllocator, UniformBuffer,
    UniformField, UniformLayout, UniformRead, UniformType,
};

pub use glam;
