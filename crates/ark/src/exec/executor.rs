// Executor — One compiled model bound to one device/rank context
//
// The executor owns the runtime that compiled the model and is the single
// door through which host data reaches the model's device tensors. All
// host ↔ device copies go through the TransferEngine, so the contiguity
// rules are enforced in one place.

use std::sync::Arc;

use tracing::info;

use ark_core::{
    bail, DeviceTensor, ExecutorConfig, HostArray, Model, Result, Runtime, TensorId,
    TransferEngine, WithDType,
};

/// Executes a compiled model and moves data between host arrays and the
/// model's device tensors.
///
/// The runtime's raw copy primitives are not reachable from outside:
///
/// ```compile_fail
/// fn raw_write(exec: &ark::Executor, t: &ark::DeviceTensor) {
///     exec.runtime().write_device(t, &[0u8; 4]).unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct Executor {
    config: ExecutorConfig,
    model: Arc<Model>,
    runtime: Box<dyn Runtime>,
}

impl Executor {
    /// Create an executor, letting runtime `R` set up the device context.
    ///
    /// ```ignore
    /// let exec = Executor::new::<HostRuntime>(ExecutorConfig::new(0, 0, 1, "main"), model)?;
    /// ```
    pub fn new<R: Runtime>(config: ExecutorConfig, model: impl Into<Arc<Model>>) -> Result<Self> {
        config.validate()?;
        let model = model.into();
        let runtime = R::create(&config, &model)?;
        Ok(Self::assemble(config, model, Box::new(runtime)))
    }

    /// Create an executor around a runtime that has already been set up.
    pub fn with_runtime(
        config: ExecutorConfig,
        model: impl Into<Arc<Model>>,
        runtime: Box<dyn Runtime>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, model.into(), runtime))
    }

    fn assemble(config: ExecutorConfig, model: Arc<Model>, runtime: Box<dyn Runtime>) -> Self {
        info!(
            name = %config.name,
            gpu_id = config.gpu_id,
            rank = config.rank,
            world_size = config.world_size,
            num_warps_per_sm = config.num_warps_per_sm,
            device = %runtime.device_name(),
            model = model.name(),
            "executor created"
        );
        Executor {
            config,
            model,
            runtime,
        }
    }

    //  Context

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn gpu_id(&self) -> usize {
        self.config.gpu_id
    }

    pub fn rank(&self) -> usize {
        self.config.rank
    }

    pub fn world_size(&self) -> usize {
        self.config.world_size
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn num_warps_per_sm(&self) -> usize {
        self.config.num_warps_per_sm
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn device_name(&self) -> String {
        self.runtime.device_name()
    }

    pub(crate) fn runtime(&self) -> &dyn Runtime {
        self.runtime.as_ref()
    }

    /// Device handle of a model tensor.
    pub fn tensor(&self, id: TensorId) -> Result<DeviceTensor> {
        self.runtime.tensor(id)
    }

    /// Device handle of the first model tensor declared under `name`.
    pub fn tensor_by_name(&self, name: &str) -> Result<DeviceTensor> {
        match self.model.find(name) {
            Some(id) => self.tensor(id),
            None => bail!("no tensor named {:?} in model {:?}", name, self.model.name()),
        }
    }

    //  Data movement

    /// Copy data from a host array to the given tensor's (possibly
    /// non-contiguous) data range on the device.
    ///
    /// A non-contiguous `src` is flattened into a temporary contiguous copy
    /// first; `src` itself is never modified.
    pub fn tensor_memcpy_host_to_device<T: WithDType>(
        &self,
        dst: &DeviceTensor,
        src: &HostArray<T>,
    ) -> Result<()> {
        TransferEngine::new(self.runtime()).host_to_device(dst, src)
    }

    /// Copy (possibly non-contiguous) data from a device tensor into a
    /// contiguous host array, in row-major order of the tensor's shape.
    ///
    /// `dst` must be contiguous and hold at least as many elements as `src`;
    /// otherwise nothing is copied and `PreconditionViolation` is returned.
    pub fn tensor_memcpy_device_to_host<T: WithDType>(
        &self,
        dst: &mut HostArray<T>,
        src: &DeviceTensor,
    ) -> Result<()> {
        TransferEngine::new(self.runtime()).device_to_host(dst, src)
    }

    //  Execution

    pub fn compile(&self) -> Result<()> {
        self.runtime.compile()
    }

    pub fn launch(&self) -> Result<()> {
        self.runtime.launch()
    }

    /// Run the compiled graph `iter` times.
    pub fn run(&self, iter: usize) -> Result<()> {
        self.runtime.run(iter)
    }

    pub fn wait(&self) -> Result<()> {
        self.runtime.wait()
    }

    pub fn stop(&self) -> Result<()> {
        self.runtime.stop()
    }

    pub fn elapsed_msec(&self) -> Result<f32> {
        self.runtime.elapsed_msec()
    }
}
