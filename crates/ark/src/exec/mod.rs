// =============================================================================
// Executor — Runs a compiled model and moves its data
// =============================================================================
//
// This module binds a Model to a device/rank context through a Runtime and
// exposes the validated host ↔ device copies:
//
//   model → Runtime::create → **Executor** → compile / launch / run / stop
//                                 └── tensor_memcpy_{host_to_device,device_to_host}
//
// USAGE:
//   let mut model = Model::new("mlp");
//   let x = model.tensor("x", (4, 8), DType::F32);
//
//   let exec = Arc::new(Executor::new::<HostRuntime>(ExecutorConfig::default(), model)?);
//   register_global_executor(Arc::clone(&exec))?;
//   exec.tensor_memcpy_host_to_device(&exec.tensor(x)?, &host_x)?;

mod executor;
mod registry;

pub use executor::Executor;
pub use registry::{
    get_global_executor, global_registry, register_global_executor, unregister_global_executor,
    ExecutorRegistry, RegistryState,
};
