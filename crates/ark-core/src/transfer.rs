use std::borrow::Cow;

use tracing::{debug, error};

use crate::device::DeviceTensor;
use crate::dtype::WithDType;
use crate::error::{Error, Result};
use crate::host::HostArray;
use crate::runtime::Runtime;

// Transfer Engine — Byte-exact copies between host arrays and device tensors
//
// Both directions walk the device tensor in row-major logical order and
// treat the host side as a dense stream of `elem_count * elem_size` bytes.
// What differs is how a non-contiguous host array is handled:
//
//   host → device   the source is only read, so a strided source is first
//                   flattened into a temporary dense copy (logged, not an
//                   error). The caller's array is never touched.
//
//   device → host   the destination is written. Substituting a dense
//                   temporary would put the result in memory the caller did
//                   not name, so a strided destination is refused with
//                   PreconditionViolation before anything moves.
//
// The destination's capacity is checked too: a host array with fewer
// elements than the device tensor is refused rather than overrun.

/// Routes host ↔ device copies through a runtime's raw copy primitives
/// after checking the host side.
#[derive(Debug, Clone, Copy)]
pub struct TransferEngine<'r> {
    runtime: &'r dyn Runtime,
}

impl<'r> TransferEngine<'r> {
    pub fn new(runtime: &'r dyn Runtime) -> Self {
        TransferEngine { runtime }
    }

    /// Copy `src` into the (possibly strided) device view `dst`.
    ///
    /// `src` must hold elements of `dst`'s dtype and exactly as many of them
    /// as `dst` has; its own layout may be anything.
    pub fn host_to_device<T: WithDType>(
        &self,
        dst: &DeviceTensor,
        src: &HostArray<T>,
    ) -> Result<()> {
        check_element_type("src", src, dst).map_err(reject)?;
        if src.elem_count() != dst.elem_count() {
            return Err(reject(Error::invalid_argument(
                "src",
                format!(
                    "host array has {} elements (shape {}) but device tensor {:?} has {} (shape {})",
                    src.elem_count(),
                    src.shape(),
                    dst.id(),
                    dst.elem_count(),
                    dst.shape()
                ),
            )));
        }

        let src = contiguous_source(src)?;
        let storage = src.read()?;
        let bytes: &[u8] = bytemuck::cast_slice(&storage[src.dense_range()]);
        debug!(
            tensor = dst.id().0,
            bytes = bytes.len(),
            dst_contiguous = dst.is_contiguous(),
            "host to device copy"
        );
        self.runtime.write_device(dst, bytes)
    }

    /// Copy the (possibly strided) device view `src` into `dst`.
    ///
    /// `dst` must hold elements of `src`'s dtype, be contiguous, and have
    /// room for at least `src.elem_count()` elements. The first
    /// `src.elem_count()` elements of `dst` are overwritten in row-major
    /// order; any further elements are left as they were.
    pub fn device_to_host<T: WithDType>(
        &self,
        dst: &mut HostArray<T>,
        src: &DeviceTensor,
    ) -> Result<()> {
        check_element_type("dst", dst, src).map_err(reject)?;
        if !dst.is_contiguous() {
            return Err(reject(Error::precondition(
                "dst",
                format!(
                    "host array (shape {}, strides {:?}) is not contiguous in memory",
                    dst.shape(),
                    dst.layout().strides()
                ),
            )));
        }
        if dst.elem_count() < src.elem_count() {
            return Err(reject(Error::precondition(
                "dst",
                format!(
                    "host array holds {} elements but device tensor {:?} has {}",
                    dst.elem_count(),
                    src.id(),
                    src.elem_count()
                ),
            )));
        }

        let start = dst.layout().offset();
        let mut storage = dst.write()?;
        let bytes: &mut [u8] =
            bytemuck::cast_slice_mut(&mut storage[start..start + src.elem_count()]);
        debug!(
            tensor = src.id().0,
            bytes = bytes.len(),
            src_contiguous = src.is_contiguous(),
            "device to host copy"
        );
        self.runtime.read_device(bytes, src)
    }
}

/// The array a host → device copy actually reads from: `src` itself when it
/// is contiguous, otherwise a fresh row-major copy of it.
pub fn contiguous_source<T: WithDType>(src: &HostArray<T>) -> Result<Cow<'_, HostArray<T>>> {
    if src.is_contiguous() {
        return Ok(Cow::Borrowed(src));
    }
    debug!(
        shape = %src.shape(),
        strides = ?src.layout().strides(),
        "src is not contiguous in memory, copying to a contiguous array"
    );
    Ok(Cow::Owned(src.to_contiguous()?))
}

fn check_element_type<T: WithDType>(
    arg: &'static str,
    host: &HostArray<T>,
    device: &DeviceTensor,
) -> Result<()> {
    if host.dtype() != device.dtype() {
        return Err(Error::invalid_argument(
            arg,
            format!(
                "expected a host array of {} elements to match device tensor {:?}, got {}",
                device.dtype(),
                device.id(),
                host.dtype()
            ),
        ));
    }
    Ok(())
}

fn reject(err: Error) -> Error {
    error!("{err}");
    err
}
