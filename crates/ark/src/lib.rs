//! # ark
//!
//! Executes a compiled tensor model on a device and moves data between host
//! arrays and the model's (possibly strided) device tensors.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use ark::prelude::*;
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `ark-core` | DType, Shape, Layout, HostArray, DeviceTensor, Model, Runtime trait, TransferEngine |
//! | `ark-host` | Reference runtime with device memory in a host arena |
//! | `ark` | Executor and the global executor registry |

/// Re-export core types.
pub use ark_core::{
    contiguous_source, DType, DeviceTensor, Error, ExecutorConfig, HostArray, Layout, Model,
    Result, Runtime, Shape, TensorId, TransferEngine, WithDType, DEFAULT_NUM_WARPS_PER_SM,
};

/// Re-export the reference host runtime.
pub use ark_host::HostRuntime;

/// Executor and global executor registry.
pub mod exec;

pub use exec::{
    get_global_executor, global_registry, register_global_executor, unregister_global_executor,
    Executor, ExecutorRegistry, RegistryState,
};

/// Convenience prelude: `use ark::prelude::*;`
pub mod prelude {
    pub use crate::exec::{get_global_executor, register_global_executor, Executor};
    pub use ark_core::{
        DType, DeviceTensor, Error, ExecutorConfig, HostArray, Model, Result, Runtime, Shape,
        TensorId,
    };
    pub use ark_host::HostRuntime;
}
