use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::dtype::{DType, WithDType};
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::Shape;

// HostArray — An element-typed buffer in host memory
//
// This is the host side of every transfer. Like a device tensor, it pairs
// flat storage with a Layout, so the same buffer can be seen through
// several views:
//
//   let base = HostArray::from_vec((0..6).map(|i| i as f32).collect(), 6)?;
//   let odd  = base.step(0, 2)?;     // [0, 2, 4], stride 2, same storage
//
// MEMORY MODEL:
//
//   Storage is Arc<RwLock<Vec<T>>>. Cloning a HostArray or taking a view is
//   O(1) and aliases the same Vec, so writing through a contiguous view is
//   visible through its parent. The transfer engine takes the read lock for
//   host → device and the write lock for device → host, for the duration of
//   one call only.

/// An n-dimensional, possibly strided, view over host memory.
pub struct HostArray<T: WithDType> {
    storage: Arc<RwLock<Vec<T>>>,
    layout: Layout,
}

impl<T: WithDType> Clone for HostArray<T> {
    fn clone(&self) -> Self {
        HostArray {
            storage: Arc::clone(&self.storage),
            layout: self.layout.clone(),
        }
    }
}

impl<T: WithDType> std::fmt::Debug for HostArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HostArray(shape={}, dtype={}, contiguous={})",
            self.layout.shape(),
            T::DTYPE,
            self.is_contiguous()
        )
    }
}

impl<T: WithDType> HostArray<T> {
    /// Wrap `data` as a dense row-major array of the given shape.
    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.elem_count();
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(HostArray {
            storage: Arc::new(RwLock::new(data)),
            layout: Layout::contiguous(shape),
        })
    }

    pub fn from_slice(data: &[T], shape: impl Into<Shape>) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// A dense array filled with zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        HostArray {
            storage: Arc::new(RwLock::new(vec![T::zero(); shape.elem_count()])),
            layout: Layout::contiguous(shape),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn elem_count(&self) -> usize {
        self.layout.elem_count()
    }

    pub fn elem_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    /// Number of bytes in logical order (element count × element size).
    pub fn byte_len(&self) -> usize {
        self.elem_count() * self.elem_size()
    }

    /// Whether logical row-major order matches memory order with no gaps.
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Whether `self` and `other` are views over the same host allocation.
    pub fn shares_storage(&self, other: &HostArray<T>) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    //  Views

    fn view(&self, layout: Layout) -> Self {
        HostArray {
            storage: Arc::clone(&self.storage),
            layout,
        }
    }

    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        Ok(self.view(self.layout.narrow(dim, start, len)?))
    }

    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self> {
        Ok(self.view(self.layout.transpose(dim0, dim1)?))
    }

    /// Keep every `step`-th element along `dim`.
    pub fn step(&self, dim: usize, step: usize) -> Result<Self> {
        Ok(self.view(self.layout.step(dim, step)?))
    }

    //  Copies

    /// Make an order-preserving, row-major, dense copy in fresh storage.
    ///
    /// Always allocates, even when `self` is already contiguous.
    pub fn to_contiguous(&self) -> Result<Self> {
        let data = self.to_vec()?;
        Self::from_vec(data, self.shape().clone())
    }

    /// The logical elements in row-major order.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let storage = self.read()?;
        Ok(self
            .layout
            .strided_indices()
            .map(|i| storage[i])
            .collect())
    }

    //  Raw access (used by the transfer engine)

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Vec<T>>> {
        self.storage
            .read()
            .map_err(|_| Error::LockPoisoned("host array storage"))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<T>>> {
        self.storage
            .write()
            .map_err(|_| Error::LockPoisoned("host array storage"))
    }

    /// Element range of a contiguous view inside its storage.
    pub(crate) fn dense_range(&self) -> std::ops::Range<usize> {
        let start = self.layout.offset();
        start..start + self.elem_count()
    }
}
