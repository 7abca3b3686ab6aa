use crate::shape::Shape;

/// All errors that can occur within ark.
///
/// One error type is shared by every crate in the workspace. The first three
/// variants are the transfer and registry contract; the rest cover view
/// construction, the runtime and lifecycle misuse.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong kind of buffer for a transfer (element type or element count
    /// does not match the device tensor).
    #[error("invalid argument `{arg}`: {reason}")]
    InvalidArgument { arg: &'static str, reason: String },

    /// A memory-layout precondition of a transfer does not hold. The call
    /// is refused rather than worked around.
    #[error("precondition violated for `{arg}`: {reason}")]
    PreconditionViolation { arg: &'static str, reason: String },

    /// The global executor was read before one was registered.
    #[error("executor is not initialized")]
    NotInitialized,

    /// The runtime was driven out of order (e.g. `run` before `launch`).
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// Dimension index out of range for the tensor's rank.
    #[error("dimension out of range: dim {dim} for tensor with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Narrow/slice operation out of bounds.
    #[error("narrow out of bounds: dim {dim}, start {start}, len {len}, dim_size {dim_size}")]
    NarrowOutOfBounds {
        dim: usize,
        start: usize,
        len: usize,
        dim_size: usize,
    },

    /// Element count mismatch when creating from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// The model does not declare a tensor with this id.
    #[error("tensor {0} not found in model")]
    TensorNotFound(usize),

    /// The runtime could not place the model's buffers in device memory.
    #[error("out of device memory: requested {requested} bytes, capacity {capacity} bytes")]
    OutOfDeviceMemory { requested: usize, capacity: usize },

    /// A lock guarding host or runtime state was poisoned by a panic.
    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    pub fn precondition(arg: &'static str, reason: impl Into<String>) -> Self {
        Error::PreconditionViolation {
            arg,
            reason: reason.into(),
        }
    }
}

/// Convenience Result type used throughout ark.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
