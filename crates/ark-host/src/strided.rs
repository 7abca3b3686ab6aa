//! Strided byte copies between a dense stream and a layout over raw storage.
//!
//! `storage` always starts at element 0 of the layout's buffer; the layout's
//! offset and strides (in elements) are scaled by `elem_size` here.

use ark_core::Layout;

/// Write the dense stream `src` into `storage` following `layout`, in
/// row-major order of the layout's logical shape.
///
/// Panics if `src` is not `layout.elem_count() * elem_size` bytes or the
/// layout reaches past the end of `storage`.
pub fn scatter(storage: &mut [u8], layout: &Layout, elem_size: usize, src: &[u8]) {
    assert_eq!(src.len(), layout.elem_count() * elem_size);
    if layout.is_contiguous() {
        let start = layout.offset() * elem_size;
        storage[start..start + src.len()].copy_from_slice(src);
        return;
    }
    for (chunk, flat) in src.chunks_exact(elem_size).zip(layout.strided_indices()) {
        let at = flat * elem_size;
        storage[at..at + elem_size].copy_from_slice(chunk);
    }
}

/// Read `layout` out of `storage` into the dense stream `dst`, in row-major
/// order of the layout's logical shape.
///
/// Panics if `dst` is not `layout.elem_count() * elem_size` bytes or the
/// layout reaches past the end of `storage`.
pub fn gather(dst: &mut [u8], storage: &[u8], layout: &Layout, elem_size: usize) {
    assert_eq!(dst.len(), layout.elem_count() * elem_size);
    if layout.is_contiguous() {
        let start = layout.offset() * elem_size;
        dst.copy_from_slice(&storage[start..start + dst.len()]);
        return;
    }
    for (chunk, flat) in dst.chunks_exact_mut(elem_size).zip(layout.strided_indices()) {
        let at = flat * elem_size;
        chunk.copy_from_slice(&storage[at..at + elem_size]);
    }
}
