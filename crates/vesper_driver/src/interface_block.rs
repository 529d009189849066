//! Interface Block Lookup
//!
//! Maps a uniform name plus array index to its byte offset inside a uniform block.
//!
//! The driver only consumes the [`InterfaceBlockLookup`] trait; shader reflection
//! normally provides the implementation. [`InterfaceBlock`] is a self-contained
//! implementation that lays its fields out with the rules of
//! [`UniformType::layout`], which is what materials and tests use when no
//! reflection data is available.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use vesper_core::errors::{Result, VesperError};
use vesper_core::layout::{BLOCK_ALIGNMENT, align_up};

use crate::uniform::UniformType;

/// Name-to-offset resolution for one uniform block.
pub trait InterfaceBlockLookup {
    /// Byte offset of element `index` of the uniform `name`, or `None` when the
    /// block does not declare it.
    fn uniform_offset(&self, name: &str, index: usize) -> Option<usize>;

    /// Total size of the block in bytes.
    fn size(&self) -> usize;
}

/// One field of an [`InterfaceBlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    name: String,
    ty: UniformType,
    count: usize,
    offset: usize,
}

impl UniformField {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    /// Number of array elements; 1 for plain fields.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Byte offset of the first element.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte offset of element `index`, if the field has that many elements.
    #[inline]
    #[must_use]
    pub fn element_offset(&self, index: usize) -> Option<usize> {
        (index < self.count).then(|| self.offset + index * self.ty.stride())
    }
}

/// A laid-out uniform block description.
#[derive(Debug, Clone, Default)]
pub struct InterfaceBlock {
    name: String,
    fields: SmallVec<[UniformField; 16]>,
    lookup: FxHashMap<String, usize>,
    size: usize,
}

impl InterfaceBlock {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> InterfaceBlockBuilder {
        InterfaceBlockBuilder::new(name)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.lookup.get(name).map(|&i| &self.fields[i])
    }
}

impl InterfaceBlockLookup for InterfaceBlock {
    fn uniform_offset(&self, name: &str, index: usize) -> Option<usize> {
        self.field(name)?.element_offset(index)
    }

    #[inline]
    fn size(&self) -> usize {
        self.size
    }
}

/// Builds an [`InterfaceBlock`] field by field.
///
/// ```rust,ignore
/// let block = InterfaceBlock::builder("MaterialParams")
///     .add("baseColor", UniformType::Float4)
///     .add("roughness", UniformType::Float)
///     .add_array("lightIndices", UniformType::Int, 4)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct InterfaceBlockBuilder {
    name: String,
    entries: SmallVec<[(String, UniformType, usize); 16]>,
}

impl InterfaceBlockBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: SmallVec::new(),
        }
    }

    /// Declares a single value.
    #[must_use]
    pub fn add(self, name: impl Into<String>, ty: UniformType) -> Self {
        self.add_array(name, ty, 1)
    }

    /// Declares an array of `count` elements.
    #[must_use]
    pub fn add_array(mut self, name: impl Into<String>, ty: UniformType, count: usize) -> Self {
        self.entries.push((name.into(), ty, count));
        self
    }

    /// Assigns offsets in declaration order.
    ///
    /// Each field starts at the next multiple of its alignment; array elements
    /// follow each other at the type's stride. The block size is rounded up to
    /// [`BLOCK_ALIGNMENT`].
    pub fn build(self) -> Result<InterfaceBlock> {
        let mut fields = SmallVec::with_capacity(self.entries.len());
        let mut lookup = FxHashMap::default();
        let mut cursor = 0;

        for (name, ty, count) in self.entries {
            if count == 0 {
                return Err(VesperError::EmptyUniformArray(name));
            }
            if lookup.contains_key(&name) {
                return Err(VesperError::DuplicateUniformField(name));
            }

            let layout = ty.layout();
            let offset = align_up(cursor, layout.alignment);
            cursor = offset + layout.stride * (count - 1) + layout.size;

            lookup.insert(name.clone(), fields.len());
            fields.push(UniformField {
                name,
                ty,
                count,
                offset,
            });
        }

        Ok(InterfaceBlock {
            name: self.name,
            fields,
            lookup,
            size: align_up(cursor, BLOCK_ALIGNMENT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> InterfaceBlock {
        InterfaceBlock::builder("Sample")
            .add("a", UniformType::Float)
            .add("b", UniformType::Float3)
            .add("c", UniformType::Float)
            .add("m", UniformType::Mat3)
            .add_array("d", UniformType::Float2, 3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_offsets_follow_layout_table() {
        let block = sample_block();
        assert_eq!(block.uniform_offset("a", 0), Some(0));
        assert_eq!(block.uniform_offset("b", 0), Some(16));
        // A scalar fits in the 4th lane of the preceding vec3.
        assert_eq!(block.uniform_offset("c", 0), Some(28));
        assert_eq!(block.uniform_offset("m", 0), Some(32));
        assert_eq!(block.uniform_offset("d", 0), Some(80));
        assert_eq!(block.uniform_offset("d", 2), Some(96));
        assert_eq!(block.size(), 112);
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let block = sample_block();
        assert_eq!(block.uniform_offset("missing", 0), None);
        assert_eq!(block.uniform_offset("d", 3), None);
        assert_eq!(block.uniform_offset("a", 1), None);
    }

    #[test]
    fn test_field_metadata() {
        let block = sample_block();
        assert_eq!(block.name(), "Sample");
        assert_eq!(block.fields().len(), 5);

        let d = block.field("d").unwrap();
        assert_eq!(d.ty(), UniformType::Float2);
        assert_eq!(d.count(), 3);
        assert_eq!(d.offset(), 80);
    }

    #[test]
    fn test_vec3_array_uses_16_byte_stride() {
        let block = InterfaceBlock::builder("Lights")
            .add_array("positions", UniformType::Float3, 4)
            .add("count", UniformType::Uint)
            .build()
            .unwrap();

        assert_eq!(block.uniform_offset("positions", 3), Some(48));
        assert_eq!(block.uniform_offset("count", 0), Some(60));
        assert_eq!(block.size(), 64);
    }

    #[test]
    fn test_rejects_duplicates_and_empty_arrays() {
        let err = InterfaceBlock::builder("Bad")
            .add("x", UniformType::Float)
            .add("x", UniformType::Float4)
            .build()
            .unwrap_err();
        assert_eq!(err, VesperError::DuplicateUniformField("x".into()));

        let err = InterfaceBlock::builder("Bad")
            .add_array("y", UniformType::Int, 0)
            .build()
            .unwrap_err();
        assert_eq!(err, VesperError::EmptyUniformArray("y".into()));
    }

    #[test]
    fn test_empty_block() {
        let block = InterfaceBlock::builder("Empty").build().unwrap();
        assert_eq!(block.size(), 0);
        assert!(block.fields().is_empty());
    }
}
