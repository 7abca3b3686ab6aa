use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout — How a logical shape maps onto flat storage
//
// Both sides of a transfer are described by a Layout: the host array (over
// its Vec<T>) and the device tensor (over its device buffer). All offsets
// and strides are counted in ELEMENTS; the byte view is derived by
// multiplying with the dtype size.
//
// KEY CONCEPTS:
//
// 1. **Strides**: how many elements to skip in flat storage to move one step
//    along each dimension. A dense [2,3] matrix has strides [3,1].
//
// 2. **Views**: transpose swaps strides, narrow moves the offset, step
//    multiplies a stride. None of them move data.
//
// 3. **Contiguous**: logical row-major order equals physical order with no
//    gaps. The base offset does not matter (a dense window into a larger
//    buffer is still contiguous), and neither does the stride of a
//    dimension of size 1, since it is never stepped over.
//
// 4. **Traversal order**: `strided_indices` walks the logical elements in
//    row-major order (last dimension fastest) and yields the flat storage
//    index of each. Every copy in this crate follows that order.

/// Layout describes how a tensor's logical shape maps to flat storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    /// Offset into the storage buffer where this view's data starts.
    offset: usize,
}

impl Layout {
    /// Create a new contiguous layout for the given shape (row-major).
    pub fn contiguous(shape: Shape) -> Self {
        let strides = shape.stride_contiguous();
        Layout {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a layout with explicit strides and offset.
    pub fn new(shape: Shape, strides: Vec<usize>, offset: usize) -> Result<Self> {
        if strides.len() != shape.rank() {
            return Err(Error::msg(format!(
                "layout for shape {} needs {} strides, got {}",
                shape,
                shape.rank(),
                strides.len()
            )));
        }
        Ok(Layout {
            shape,
            strides,
            offset,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Check if logical row-major order matches storage order with no gaps.
    pub fn is_contiguous(&self) -> bool {
        if self.elem_count() <= 1 {
            return true;
        }
        let mut expected = 1usize;
        for (&dim, &stride) in self.dims().iter().zip(self.strides.iter()).rev() {
            if dim == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= dim;
        }
        true
    }

    /// Flat index of the last reachable element, or `None` for an empty view.
    pub fn max_flat_index(&self) -> Option<usize> {
        if self.elem_count() == 0 {
            return None;
        }
        let mut idx = self.offset;
        for (&dim, &stride) in self.dims().iter().zip(self.strides.iter()) {
            idx += (dim - 1) * stride;
        }
        Some(idx)
    }

    /// Number of storage elements a buffer needs so that every element of
    /// this view is in bounds.
    pub fn storage_span(&self) -> usize {
        self.max_flat_index().map_or(0, |i| i + 1)
    }

    /// Transpose two dimensions. No data is copied.
    ///
    /// Example: [2, 3, 4] transpose(0, 2) → [4, 3, 2]
    ///          strides [12, 4, 1]         → [1, 4, 12]
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim0 >= rank || dim1 >= rank {
            return Err(Error::DimOutOfRange {
                dim: dim0.max(dim1),
                rank,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        let mut new_strides = self.strides.clone();
        new_dims.swap(dim0, dim1);
        new_strides.swap(dim0, dim1);
        Ok(Layout {
            shape: Shape::new(new_dims),
            strides: new_strides,
            offset: self.offset,
        })
    }

    /// Narrow (slice) along a dimension.
    ///
    /// Example: shape [4, 6], narrow(dim=1, start=2, len=3)
    /// → shape [4, 3], offset += 2 * stride[1]
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim >= rank {
            return Err(Error::DimOutOfRange { dim, rank });
        }
        let dim_size = self.shape.dims()[dim];
        if start + len > dim_size {
            return Err(Error::NarrowOutOfBounds {
                dim,
                start,
                len,
                dim_size,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        new_dims[dim] = len;
        Ok(Layout {
            shape: Shape::new(new_dims),
            strides: self.strides.clone(),
            offset: self.offset + start * self.strides[dim],
        })
    }

    /// Keep every `step`-th element along `dim`, starting at index 0.
    ///
    /// Example: shape [6] with stride [1], step(0, 2) → shape [3], stride [2]
    pub fn step(&self, dim: usize, step: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim >= rank {
            return Err(Error::DimOutOfRange { dim, rank });
        }
        if step == 0 {
            return Err(Error::msg("slice step must be positive"));
        }
        let mut new_dims = self.shape.dims().to_vec();
        let mut new_strides = self.strides.clone();
        new_dims[dim] = new_dims[dim].div_ceil(step);
        new_strides[dim] *= step;
        Ok(Layout {
            shape: Shape::new(new_dims),
            strides: new_strides,
            offset: self.offset,
        })
    }

    /// Iterator over all flat indices of this layout, in row-major logical
    /// order.
    pub fn strided_indices(&self) -> StridedIter {
        StridedIter::new(self)
    }
}

// StridedIter — Flat storage indices in traversal order
//
// For a contiguous layout this counts offset, offset+1, ...
// For a transposed or stepped layout it jumps around following the strides.

/// Iterator that yields flat storage indices for each element of a Layout.
pub struct StridedIter {
    current: Vec<usize>,
    dims: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    remaining: usize,
    started: bool,
}

impl StridedIter {
    fn new(layout: &Layout) -> Self {
        let rank = layout.rank();
        StridedIter {
            current: vec![0; rank],
            dims: layout.dims().to_vec(),
            strides: layout.strides().to_vec(),
            offset: layout.offset(),
            remaining: layout.elem_count(),
            started: false,
        }
    }

    fn flat_index(&self) -> usize {
        let mut idx = self.offset;
        for i in 0..self.current.len() {
            idx += self.current[i] * self.strides[i];
        }
        idx
    }

    /// Advance the multi-dimensional index by one (rightmost dimension first).
    fn advance(&mut self) {
        let rank = self.dims.len();
        for i in (0..rank).rev() {
            self.current[i] += 1;
            if self.current[i] < self.dims[i] {
                return;
            }
            self.current[i] = 0;
        }
    }
}

impl Iterator for StridedIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        if self.started {
            self.advance();
        }
        self.started = true;
        self.remaining -= 1;
        Some(self.flat_index())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter {}
