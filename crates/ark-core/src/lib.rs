//! # ark-core
//!
//! Core types for moving data between host memory and a compiled model's
//! device tensors.
//!
//! This crate provides:
//! - [`DType`] / [`WithDType`] — element types and their Rust counterparts
//! - [`Shape`] / [`Layout`] — shape, strides and offset of a (possibly strided) view
//! - [`HostArray`] — element-typed host buffer with shared storage and views
//! - [`DeviceTensor`] — handle to a tensor placed in device memory
//! - [`Model`] — buffers and tensor views a runtime places on the device
//! - [`Runtime`] / [`ExecutorConfig`] — interface to the compiled-graph runner
//! - [`TransferEngine`] — validated host ↔ device copies
// - Layout: shape + strides + offset, row-major traversal
// - HostArray: Arc<RwLock<Vec<T>>> storage shared by views
// - Runtime: raw copy primitives + loop-kernel lifecycle, implemented elsewhere
// - TransferEngine: contiguity policy and precondition checks in front of Runtime

pub mod device;
pub mod dtype;
pub mod error;
pub mod host;
pub mod layout;
pub mod model;
pub mod runtime;
pub mod shape;
pub mod transfer;

pub use device::DeviceTensor;
pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use host::HostArray;
pub use layout::Layout;
pub use model::{BufferDecl, BufferId, Model, TensorDecl, TensorId};
pub use runtime::{ExecutorConfig, Runtime, DEFAULT_NUM_WARPS_PER_SM};
pub use shape::Shape;
pub use transfer::{contiguous_source, TransferEngine};
