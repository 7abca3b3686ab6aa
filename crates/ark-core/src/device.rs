use std::ops::Range;

use crate::dtype::DType;
use crate::layout::Layout;
use crate::model::TensorId;
use crate::shape::Shape;

/// A handle to a tensor living in device memory.
///
/// The handle is produced by a [`Runtime`](crate::runtime::Runtime) once the
/// model has been placed on the device. It carries the base address of the
/// backing device buffer plus the element layout of the view inside it;
/// nothing here owns or frees device memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTensor {
    id: TensorId,
    addr: u64,
    dtype: DType,
    layout: Layout,
}

impl DeviceTensor {
    pub fn new(id: TensorId, addr: u64, dtype: DType, layout: Layout) -> Self {
        DeviceTensor {
            id,
            addr,
            dtype,
            layout,
        }
    }

    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Device address of the backing buffer (element 0 of the storage, not
    /// of this view).
    pub fn addr(&self) -> u64 {
        self.addr
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn elem_count(&self) -> usize {
        self.layout.elem_count()
    }

    /// Bytes moved by a full transfer of this tensor.
    pub fn byte_len(&self) -> usize {
        self.elem_count() * self.dtype.size_in_bytes()
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Device address range touched by this view, from its first element to
    /// one past its last reachable element. Empty for an empty view, `None`
    /// if the range does not fit in the address space.
    pub fn byte_range(&self) -> Option<Range<u64>> {
        let size = self.dtype.size_in_bytes() as u64;
        let byte_at = |index: u64| index.checked_mul(size)?.checked_add(self.addr);
        let start = byte_at(self.layout.offset() as u64)?;
        match self.layout.max_flat_index() {
            Some(last) => Some(start..byte_at((last as u64).checked_add(1)?)?),
            None => Some(start..start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_range_of_strided_view() {
        // [4, 6] f32 buffer at 0x1000, view = columns 2..5
        let base = Layout::contiguous(Shape::from((4, 6)));
        let view = base.narrow(1, 2, 3).unwrap();
        let t = DeviceTensor::new(TensorId(0), 0x1000, DType::F32, view);
        assert_eq!(t.byte_len(), 12 * 4);
        assert_eq!(t.byte_range(), Some(0x1000 + 8..0x1000 + (23 * 4)));
        assert!(!t.is_contiguous());
    }

    #[test]
    fn test_byte_range_dense() {
        let t = DeviceTensor::new(
            TensorId(1),
            256,
            DType::F64,
            Layout::contiguous(Shape::from((2, 2))),
        );
        assert_eq!(t.byte_range(), Some(256..256 + 32));
        assert_eq!(t.byte_len(), 32);
    }

    #[test]
    fn test_byte_range_overflow_is_none() {
        let layout = Layout::contiguous(Shape::from(4));
        let t = DeviceTensor::new(TensorId(2), u64::MAX - 8, DType::F32, layout);
        assert_eq!(t.byte_range(), None);
        let huge = Layout::new(Shape::from(2), vec![usize::MAX / 2], 0).unwrap();
        let t = DeviceTensor::new(TensorId(3), 0, DType::F64, huge);
        assert_eq!(t.byte_range(), None);
    }
}
