//! Core utilities and foundational types for the Vesper driver layer.

pub mod errors;
pub mod layout;

pub use errors::{Result, VesperError};
pub use layout::{BLOCK_ALIGNMENT, align_up, range_fits};
