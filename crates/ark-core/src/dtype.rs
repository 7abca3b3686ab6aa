use std::fmt;

// DType — Element types that can live in a device tensor
//
// A device tensor is an untyped byte range as far as the runtime is
// concerned. The DType attached to the handle is what lets the transfer
// engine check that a host array carries the same element type (and so the
// same element size) before any bytes move.
//
//   F16  — 16-bit IEEE half float
//   BF16 — 16-bit brain float
//   F32  — 32-bit float
//   F64  — 64-bit float
//   U8   — unsigned byte
//   U32  — unsigned 32-bit int
//   I64  — signed 64-bit int

/// Enum of all supported element data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    U8,
    U32,
    I64,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F16 => 2,
            DType::BF16 => 2,
            DType::F32 => 4,
            DType::F64 => 8,
            DType::U8 => 1,
            DType::U32 => 4,
            DType::I64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::I64 => "i64",
        };
        write!(f, "{}", s)
    }
}

// WithDType — Rust element types that a HostArray can hold
//
// `bytemuck::Pod` is what makes the byte-level transfer sound: a `&[T]` can
// be viewed as `&[u8]` (and back) without copying, which is exactly what the
// runtime's raw copy primitives consume. `Zero` fills fresh host arrays.

/// Trait implemented by Rust types that can be stored in a host array and
/// moved to or from a device tensor.
pub trait WithDType:
    bytemuck::Pod + num_traits::Zero + PartialEq + Send + Sync + fmt::Debug + 'static
{
    /// The corresponding DType enum variant.
    const DTYPE: DType;
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
}

impl WithDType for f64 {
    const DTYPE: DType = DType::F64;
}

impl WithDType for half::f16 {
    const DTYPE: DType = DType::F16;
}

impl WithDType for half::bf16 {
    const DTYPE: DType = DType::BF16;
}

impl WithDType for u8 {
    const DTYPE: DType = DType::U8;
}

impl WithDType for u32 {
    const DTYPE: DType = DType::U32;
}

impl WithDType for i64 {
    const DTYPE: DType = DType::I64;
}
