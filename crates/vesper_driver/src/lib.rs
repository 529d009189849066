//! Driver-layer primitives shared by every backend.
//!
//! - [`uniform`]: packs typed values into uniform blocks with the GPU's alignment rules
//! - [`interface_block`]: resolves uniform names to byte offsets
//! - [`disposer`]: defers resource destruction until in-flight GPU work is done

pub mod disposer;
pub mod interface_block;
pub mod uniform;

pub use disposer::{Destructor, Disposer, ResourceSet};
pub use interface_block::{
    InterfaceBlock, InterfaceBlockBuilder, InterfaceBlockLookup, UniformField,
};
pub use uniform::{
    LOCAL_STORAGE_SIZE, SystemAllocator, Uniform, UniformAllocator, UniformBuffer, UniformLayout,
    UniformRead, UniformType,
};
