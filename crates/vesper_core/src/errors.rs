//! Error Types
//!
//! This module defines the error type shared by the driver-layer crates.
//!
//! # Overview
//!
//! [`VesperError`] covers the programmer-contract violations the driver layer
//! reports as values instead of absorbing them:
//! - Uniform ranges that fall outside their buffer
//! - Malformed interface block declarations
//! - Disposer misuse (duplicate, unknown or already condemned keys)
//!
//! Resolution misses for named uniforms are deliberately *not* errors; they
//! never reach this type.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vesper_core::errors::{Result, VesperError};
//!
//! fn register() -> Result<()> {
//!     Err(VesperError::UnknownDisposable("texture#3".into()))
//! }
//! ```

use thiserror::Error;

/// The main error type for the Vesper driver layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VesperError {
    // ========================================================================
    // Uniform Errors
    // ========================================================================
    /// A uniform write or invalidation reached past the end of the buffer.
    #[error("Uniform range out of bounds: offset {offset} + size {size} exceeds buffer size {capacity}")]
    UniformOutOfBounds {
        /// Byte offset of the requested range
        offset: usize,
        /// Length in bytes of the requested range
        size: usize,
        /// Total size of the uniform buffer
        capacity: usize,
    },

    // ========================================================================
    // Interface Block Errors
    // ========================================================================
    /// Two fields of one interface block share a name.
    #[error("Duplicate uniform field in interface block: {0}")]
    DuplicateUniformField(String),

    /// An array field was declared with zero elements.
    #[error("Uniform field declared with an empty array: {0}")]
    EmptyUniformArray(String),

    // ========================================================================
    // Disposer Errors
    // ========================================================================
    /// A disposable was created for a key that is still live.
    #[error("Disposable already registered: {0}")]
    DuplicateDisposable(String),

    /// The key's reference count already reached zero; it waits for collection.
    #[error("Disposable is condemned and awaiting collection: {0}")]
    DisposableCondemned(String),

    /// No disposable is registered under the key.
    #[error("Unknown disposable: {0}")]
    UnknownDisposable(String),
}

/// Alias for `Result<T, VesperError>`.
pub type Result<T> = std::result::Result<T, VesperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VesperError::UniformOutOfBounds {
            offset: 96,
            size: 16,
            capacity: 100,
        };
        assert_eq!(
            err.to_string(),
            "Uniform range out of bounds: offset 96 + size 16 exceeds buffer size 100"
        );

        let err = VesperError::UnknownDisposable("42".to_string());
        assert_eq!(err.to_string(), "Unknown disposable: 42");
    }
}
