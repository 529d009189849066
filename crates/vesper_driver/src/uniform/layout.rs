//! Uniform Layout Table
//!
//! Single source of truth for how every supported value type is laid out inside a
//! uniform block. The table follows the std140-style rules the shaders expect:
//!
//! | Type                     | Size | Alignment | Array stride |
//! |--------------------------|------|-----------|--------------|
//! | bool / i32 / u32 / f32   | 4    | 4         | 4            |
//! | 2-component vector       | 8    | 8         | 8            |
//! | 3-component vector       | 12   | 16        | 16           |
//! | 4-component vector, quat | 16   | 16        | 16           |
//! | 3x3 matrix               | 48   | 16        | 48           |
//! | 4x4 matrix               | 64   | 16        | 64           |
//!
//! A 3-component vector occupies a 16-byte slot but only its first 12 bytes are
//! written, so a scalar may live in the 4th lane. A 3x3 matrix is written as three
//! 16-byte columns whose 4th float is zero.

use glam::{
    BVec2, BVec3, BVec4, IVec2, IVec3, IVec4, Mat3, Mat3A, Mat4, Quat, UVec2, UVec3, UVec4, Vec2,
    Vec3, Vec4,
};

/// Closed set of value types a uniform block can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Bool,
    Bool2,
    Bool3,
    Bool4,
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    Uint,
    Uint2,
    Uint3,
    Uint4,
    Mat3,
    Mat4,
}

/// Size, alignment and array stride of one [`UniformType`], in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLayout {
    /// Bytes written for a single value.
    pub size: usize,
    /// Required alignment of the value's offset.
    pub alignment: usize,
    /// Distance between consecutive array elements.
    pub stride: usize,
}

impl UniformLayout {
    const fn new(size: usize, alignment: usize, stride: usize) -> Self {
        Self {
            size,
            alignment,
            stride,
        }
    }
}

impl UniformType {
    #[must_use]
    pub const fn layout(self) -> UniformLayout {
        match self {
            Self::Bool | Self::Float | Self::Int | Self::Uint => UniformLayout::new(4, 4, 4),
            Self::Bool2 | Self::Float2 | Self::Int2 | Self::Uint2 => UniformLayout::new(8, 8, 8),
            Self::Bool3 | Self::Float3 | Self::Int3 | Self::Uint3 => {
                UniformLayout::new(12, 16, 16)
            }
            Self::Bool4 | Self::Float4 | Self::Int4 | Self::Uint4 => {
                UniformLayout::new(16, 16, 16)
            }
            Self::Mat3 => UniformLayout::new(48, 16, 48),
            Self::Mat4 => UniformLayout::new(64, 16, 64),
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        self.layout().size
    }

    #[inline]
    #[must_use]
    pub const fn alignment(self) -> usize {
        self.layout().alignment
    }

    #[inline]
    #[must_use]
    pub const fn stride(self) -> usize {
        self.layout().stride
    }
}

mod private {
    pub trait Sealed {}
}

/// A value that can be packed into a uniform block.
///
/// Implemented for the scalar, vector and matrix types of the layout table only.
pub trait Uniform: Copy + private::Sealed {
    const TYPE: UniformType;

    /// Writes the value into `dst`, which is exactly `Self::TYPE.size()` bytes long.
    fn pack(&self, dst: &mut [u8]);
}

/// A [`Uniform`] whose packed bytes can be read back by value.
///
/// 3x3 matrices are packed into padded columns and do not implement this trait.
pub trait UniformRead: Uniform {
    /// Reads a value from `src`, which is exactly `Self::TYPE.size()` bytes long.
    fn unpack(src: &[u8]) -> Self;
}

// Types whose natural byte representation already matches the layout table.
macro_rules! impl_pod_uniform {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Uniform for $ty {
                const TYPE: UniformType = UniformType::$variant;

                #[inline]
                fn pack(&self, dst: &mut [u8]) {
                    dst.copy_from_slice(bytemuck::bytes_of(self));
                }
            }

            impl UniformRead for $ty {
                #[inline]
                fn unpack(src: &[u8]) -> Self {
                    bytemuck::pod_read_unaligned(src)
                }
            }
        )*
    };
}

impl_pod_uniform!(
    f32 => Float,
    i32 => Int,
    u32 => Uint,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
    Quat => Float4,
    IVec2 => Int2,
    IVec3 => Int3,
    IVec4 => Int4,
    UVec2 => Uint2,
    UVec3 => Uint3,
    UVec4 => Uint4,
    Mat4 => Mat4,
);

// Booleans are 32-bit on the GPU side; each lane is stored as 0 or 1.
macro_rules! impl_bool_uniform {
    ($($ty:ty => $variant:ident as $wide:ty { $($lane:ident),+ }),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Uniform for $ty {
                const TYPE: UniformType = UniformType::$variant;

                #[inline]
                fn pack(&self, dst: &mut [u8]) {
                    <$wide>::new($(u32::from(self.$lane)),+).pack(dst);
                }
            }

            impl UniformRead for $ty {
                #[inline]
                fn unpack(src: &[u8]) -> Self {
                    let wide = <$wide>::unpack(src);
                    <$ty>::new($(wide.$lane != 0),+)
                }
            }
        )*
    };
}

impl_bool_uniform!(
    BVec2 => Bool2 as UVec2 { x, y },
    BVec3 => Bool3 as UVec3 { x, y, z },
    BVec4 => Bool4 as UVec4 { x, y, z, w },
);

impl private::Sealed for bool {}

impl Uniform for bool {
    const TYPE: UniformType = UniformType::Bool;

    #[inline]
    fn pack(&self, dst: &mut [u8]) {
        u32::from(*self).pack(dst);
    }
}

impl UniformRead for bool {
    #[inline]
    fn unpack(src: &[u8]) -> Self {
        u32::unpack(src) != 0
    }
}

impl private::Sealed for Mat3 {}

impl Uniform for Mat3 {
    const TYPE: UniformType = UniformType::Mat3;

    fn pack(&self, dst: &mut [u8]) {
        for (column, slot) in self.to_cols_array_2d().iter().zip(dst.chunks_exact_mut(16)) {
            slot[..12].copy_from_slice(bytemuck::bytes_of(column));
            slot[12..].copy_from_slice(&0.0f32.to_ne_bytes());
        }
    }
}

impl private::Sealed for Mat3A {}

impl Uniform for Mat3A {
    const TYPE: UniformType = UniformType::Mat3;

    #[inline]
    fn pack(&self, dst: &mut [u8]) {
        Mat3::from(*self).pack(dst);
    }
}
