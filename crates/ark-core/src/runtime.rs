use std::fmt;

use crate::device::DeviceTensor;
use crate::error::{Error, Result};
use crate::model::{Model, TensorId};

// Runtime — The compiled-graph runner behind an executor
//
// Graph compilation, kernel scheduling and multi-rank coordination are the
// runtime's business. ark only needs a narrow slice of it:
//
//   - set up a context for (gpu_id, rank, world_size, model, name, warps)
//   - resolve model tensors to device handles
//   - raw byte copies between a dense host stream and a strided device view
//   - the loop-kernel lifecycle: compile → launch → run/wait → stop
//
// The Executor composes a `Box<dyn Runtime>`; everything it validates sits
// in front of these calls, so a runtime may assume the preconditions hold.

/// Context-setup parameters for one executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Device ordinal the model is placed on.
    pub gpu_id: usize,
    /// Rank of this process in the group.
    pub rank: usize,
    /// Number of ranks in the group.
    pub world_size: usize,
    /// Human-readable name of the execution context.
    pub name: String,
    /// Kernel tuning: warps launched per streaming multiprocessor.
    pub num_warps_per_sm: usize,
}

/// Default number of warps per SM for the loop kernel.
pub const DEFAULT_NUM_WARPS_PER_SM: usize = 16;

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            gpu_id: 0,
            rank: 0,
            world_size: 1,
            name: "Executor".to_string(),
            num_warps_per_sm: DEFAULT_NUM_WARPS_PER_SM,
        }
    }
}

impl ExecutorConfig {
    pub fn new(gpu_id: usize, rank: usize, world_size: usize, name: impl Into<String>) -> Self {
        Self {
            gpu_id,
            rank,
            world_size,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_gpu_id(mut self, gpu_id: usize) -> Self {
        self.gpu_id = gpu_id;
        self
    }

    /// Set rank and world size together; they are only meaningful as a pair.
    pub fn with_rank(mut self, rank: usize, world_size: usize) -> Self {
        self.rank = rank;
        self.world_size = world_size;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_num_warps_per_sm(mut self, num_warps_per_sm: usize) -> Self {
        self.num_warps_per_sm = num_warps_per_sm;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.world_size == 0 {
            return Err(Error::invalid_argument("world_size", "must be at least 1"));
        }
        if self.rank >= self.world_size {
            return Err(Error::invalid_argument(
                "rank",
                format!(
                    "rank {} is out of range for world size {}",
                    self.rank, self.world_size
                ),
            ));
        }
        if self.num_warps_per_sm == 0 {
            return Err(Error::invalid_argument(
                "num_warps_per_sm",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// The interface an execution engine exposes to an executor.
///
/// `write_device` and `read_device` are the raw copy primitives. Both move
/// exactly `dst.byte_len()` / `src.byte_len()` bytes, in row-major traversal
/// order of the device tensor's logical shape, and both block until the
/// data movement is complete from the caller's point of view.
pub trait Runtime: Send + Sync + fmt::Debug + 'static {
    /// Set up an execution context for `model`. No device I/O is expected
    /// beyond what placing the model requires.
    fn create(config: &ExecutorConfig, model: &Model) -> Result<Self>
    where
        Self: Sized;

    /// A human-readable name for the device (e.g. "host:0").
    fn device_name(&self) -> String;

    /// Resolve a model tensor to its device handle.
    fn tensor(&self, id: TensorId) -> Result<DeviceTensor>;

    //  Raw copies

    /// Scatter the dense byte stream `src` into the view `dst`.
    ///
    /// `src.len()` equals `dst.byte_len()`.
    fn write_device(&self, dst: &DeviceTensor, src: &[u8]) -> Result<()>;

    /// Gather the view `src` into the dense byte stream `dst`.
    ///
    /// `dst.len()` equals `src.byte_len()`.
    fn read_device(&self, dst: &mut [u8], src: &DeviceTensor) -> Result<()>;

    //  Loop-kernel lifecycle

    fn compile(&self) -> Result<()>;

    /// Start the loop kernel. Launching an already running kernel is a no-op.
    fn launch(&self) -> Result<()>;

    /// Queue `iter` iterations of the compiled graph.
    fn run(&self, iter: usize) -> Result<()>;

    /// Block until all queued iterations have finished.
    fn wait(&self) -> Result<()>;

    /// Wait, then shut the loop kernel down.
    fn stop(&self) -> Result<()>;

    /// Wall time between the last `launch` and `stop`, in milliseconds.
    fn elapsed_msec(&self) -> Result<f32>;
}
