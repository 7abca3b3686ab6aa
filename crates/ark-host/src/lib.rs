// Host Runtime — A reference Runtime whose device memory is a host arena
//
// This crate implements the ark Runtime trait without an accelerator. It is
// what the executor tests run against, and a template for real backends:
//
// ARCHITECTURE:
// - Every model buffer is placed in one byte arena, aligned to
//   BUFFER_ALIGNMENT, at addresses starting from ARENA_BASE. A DeviceTensor
//   handle is (buffer address, dtype, layout), exactly as a GPU runtime
//   would hand out.
// - write_device / read_device scatter and gather a dense byte stream
//   through the tensor's strides, in row-major order. Contiguous views take
//   a single memcpy.
// - The loop-kernel lifecycle (compile → launch → run/wait → stop) is
//   tracked as a small state machine with the same usage rules a GPU loop
//   kernel enforces. There are no operators to run, so `run` only counts
//   iterations and `wait` returns at once.
//
// USAGE:
//   let rt = HostRuntime::create(&ExecutorConfig::default(), &model)?;
//   let x = rt.tensor(x_id)?;
//   rt.write_device(&x, bytes)?;

mod lifecycle;
pub mod strided;

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use ark_core::{bail, DeviceTensor, Error, ExecutorConfig, Model, Result, Runtime, TensorId};

use lifecycle::LoopKernel;
pub use lifecycle::LoopPhase;

/// Address of the first byte of the arena.
pub const ARENA_BASE: u64 = 0x1000_0000;

/// Every buffer starts on a multiple of this many bytes.
pub const BUFFER_ALIGNMENT: usize = 256;

/// Default arena capacity (1 GiB).
pub const DEFAULT_CAPACITY: usize = 1 << 30;

/// Threads per warp, used to size the loop kernel's blocks.
pub const THREADS_PER_WARP: usize = 32;

/// A [`Runtime`] that keeps device memory in a host-side byte arena.
#[derive(Debug)]
pub struct HostRuntime {
    ordinal: usize,
    model: Model,
    buffer_addrs: Vec<u64>,
    arena: Mutex<Vec<u8>>,
    kernel: Mutex<LoopKernel>,
}

impl HostRuntime {
    /// Place `model` in an arena of at most `capacity` bytes.
    pub fn with_capacity(
        config: &ExecutorConfig,
        model: &Model,
        capacity: usize,
    ) -> Result<Self> {
        let mut buffer_addrs = Vec::with_capacity(model.buffers().len());
        let mut used = 0usize;
        for buffer in model.buffers() {
            let start = used.next_multiple_of(BUFFER_ALIGNMENT);
            buffer_addrs.push(ARENA_BASE + start as u64);
            used = start + buffer.bytes;
        }
        if used > capacity {
            return Err(Error::OutOfDeviceMemory {
                requested: used,
                capacity,
            });
        }
        debug!(
            model = model.name(),
            buffers = buffer_addrs.len(),
            bytes = used,
            gpu_id = config.gpu_id,
            "placed model in host arena"
        );
        Ok(HostRuntime {
            ordinal: config.gpu_id,
            model: model.clone(),
            buffer_addrs,
            arena: Mutex::new(vec![0u8; used]),
            kernel: Mutex::new(LoopKernel::new(
                config.num_warps_per_sm * THREADS_PER_WARP,
            )),
        })
    }

    /// Total bytes of device memory in use.
    pub fn arena_len(&self) -> Result<usize> {
        Ok(self.arena()?.len())
    }

    /// Threads per block of the loop kernel.
    pub fn block_dim(&self) -> Result<usize> {
        Ok(self.kernel()?.block_dim())
    }

    /// Iterations executed since the runtime was created.
    pub fn iterations(&self) -> Result<u64> {
        Ok(self.kernel()?.iterations())
    }

    pub fn phase(&self) -> Result<LoopPhase> {
        Ok(self.kernel()?.phase())
    }

    fn arena(&self) -> Result<MutexGuard<'_, Vec<u8>>> {
        self.arena.lock().map_err(|_| Error::LockPoisoned("device arena"))
    }

    fn kernel(&self) -> Result<MutexGuard<'_, LoopKernel>> {
        self.kernel.lock().map_err(|_| Error::LockPoisoned("loop kernel"))
    }

    /// Byte offset of the tensor's buffer inside the arena, after checking
    /// that the whole view lies within the arena.
    fn arena_offset(&self, tensor: &DeviceTensor, arena_len: usize) -> Result<usize> {
        let arena_end = ARENA_BASE + arena_len as u64;
        let inside = tensor
            .byte_range()
            .filter(|r| tensor.addr() >= ARENA_BASE && r.end <= arena_end);
        if inside.is_none() {
            let span = match tensor.byte_range() {
                Some(r) => format!("{:#x}..{:#x}", r.start, r.end),
                None => format!("past the end of the address space from {:#x}", tensor.addr()),
            };
            bail!(
                "tensor {:?} spans {}, outside device memory {:#x}..{:#x}",
                tensor.id(),
                span,
                ARENA_BASE,
                arena_end
            );
        }
        Ok((tensor.addr() - ARENA_BASE) as usize)
    }
}

impl Runtime for HostRuntime {
    fn create(config: &ExecutorConfig, model: &Model) -> Result<Self> {
        Self::with_capacity(config, model, DEFAULT_CAPACITY)
    }

    fn device_name(&self) -> String {
        format!("host:{}", self.ordinal)
    }

    fn tensor(&self, id: TensorId) -> Result<DeviceTensor> {
        let decl = self.model.tensor_decl(id)?;
        Ok(DeviceTensor::new(
            id,
            self.buffer_addrs[decl.buffer.0],
            decl.dtype,
            decl.layout.clone(),
        ))
    }

    fn write_device(&self, dst: &DeviceTensor, src: &[u8]) -> Result<()> {
        if src.len() != dst.byte_len() {
            bail!(
                "write of {} bytes into tensor {:?} of {} bytes",
                src.len(),
                dst.id(),
                dst.byte_len()
            );
        }
        let mut arena = self.arena()?;
        let base = self.arena_offset(dst, arena.len())?;
        strided::scatter(
            &mut arena[base..],
            dst.layout(),
            dst.dtype().size_in_bytes(),
            src,
        );
        Ok(())
    }

    fn read_device(&self, dst: &mut [u8], src: &DeviceTensor) -> Result<()> {
        if dst.len() != src.byte_len() {
            bail!(
                "read of tensor {:?} ({} bytes) into {} bytes",
                src.id(),
                src.byte_len(),
                dst.len()
            );
        }
        let arena = self.arena()?;
        let base = self.arena_offset(src, arena.len())?;
        strided::gather(dst, &arena[base..], src.layout(), src.dtype().size_in_bytes());
        Ok(())
    }

    fn compile(&self) -> Result<()> {
        self.kernel()?.compile()
    }

    fn launch(&self) -> Result<()> {
        self.kernel()?.launch()
    }

    fn run(&self, iter: usize) -> Result<()> {
        self.kernel()?.run(iter)
    }

    fn wait(&self) -> Result<()> {
        self.kernel()?.wait()
    }

    fn stop(&self) -> Result<()> {
        self.kernel()?.stop()
    }

    fn elapsed_msec(&self) -> Result<f32> {
        self.kernel()?.elapsed_msec()
    }
}
