use crate::bail;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::Shape;

// Model — The compiled-model description handed to a runtime
//
// Only the memory side of a model is described here: which device buffers
// exist and which tensors (dtype + layout) view them. Operators and their
// schedule belong to the runtime that compiles and runs the model.
//
//   let mut m = Model::new("mlp");
//   let x   = m.tensor("x", (4, 8), DType::F32);
//   let x_t = m.transpose(x, 0, 1)?;    // strided view over x's buffer

/// Index of a tensor declaration inside a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(pub usize);

/// Index of a device buffer inside a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// A device buffer the runtime must allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDecl {
    pub bytes: usize,
}

/// A tensor: an element-typed view into one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDecl {
    pub name: String,
    pub dtype: DType,
    pub buffer: BufferId,
    pub layout: Layout,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    buffers: Vec<BufferDecl>,
    tensors: Vec<TensorDecl>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Model {
            name: name.into(),
            buffers: Vec::new(),
            tensors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffers(&self) -> &[BufferDecl] {
        &self.buffers
    }

    pub fn tensors(&self) -> &[TensorDecl] {
        &self.tensors
    }

    pub fn tensor_decl(&self, id: TensorId) -> Result<&TensorDecl> {
        self.tensors.get(id.0).ok_or(Error::TensorNotFound(id.0))
    }

    /// Look a tensor up by name (first declaration wins).
    pub fn find(&self, name: &str) -> Option<TensorId> {
        self.tensors
            .iter()
            .position(|t| t.name == name)
            .map(TensorId)
    }

    /// Declare a dense row-major tensor backed by a new buffer.
    pub fn tensor(
        &mut self,
        name: impl Into<String>,
        shape: impl Into<Shape>,
        dtype: DType,
    ) -> TensorId {
        let layout = Layout::contiguous(shape.into());
        let buffer = BufferId(self.buffers.len());
        self.buffers.push(BufferDecl {
            bytes: layout.storage_span() * dtype.size_in_bytes(),
        });
        self.push(TensorDecl {
            name: name.into(),
            dtype,
            buffer,
            layout,
        })
    }

    /// Declare a view with an explicit layout over an existing buffer.
    ///
    /// Fails if the layout reaches past the end of the buffer.
    pub fn view(
        &mut self,
        name: impl Into<String>,
        buffer: BufferId,
        dtype: DType,
        layout: Layout,
    ) -> Result<TensorId> {
        let decl = self
            .buffers
            .get(buffer.0)
            .ok_or_else(|| Error::msg(format!("buffer {} not found in model", buffer.0)))?;
        let needed = layout.storage_span() * dtype.size_in_bytes();
        if needed > decl.bytes {
            bail!(
                "view needs {} bytes but buffer {} holds {}",
                needed,
                buffer.0,
                decl.bytes
            );
        }
        Ok(self.push(TensorDecl {
            name: name.into(),
            dtype,
            buffer,
            layout,
        }))
    }

    pub fn narrow(
        &mut self,
        base: TensorId,
        dim: usize,
        start: usize,
        len: usize,
    ) -> Result<TensorId> {
        let decl = self.tensor_decl(base)?;
        let layout = decl.layout.narrow(dim, start, len)?;
        let name = format!("{}.narrow({dim},{start},{len})", decl.name);
        Ok(self.derive(base, name, layout))
    }

    pub fn transpose(&mut self, base: TensorId, dim0: usize, dim1: usize) -> Result<TensorId> {
        let decl = self.tensor_decl(base)?;
        let layout = decl.layout.transpose(dim0, dim1)?;
        let name = format!("{}.transpose({dim0},{dim1})", decl.name);
        Ok(self.derive(base, name, layout))
    }

    pub fn step(&mut self, base: TensorId, dim: usize, step: usize) -> Result<TensorId> {
        let decl = self.tensor_decl(base)?;
        let layout = decl.layout.step(dim, step)?;
        let name = format!("{}.step({dim},{step})", decl.name);
        Ok(self.derive(base, name, layout))
    }

    // A view derived from `base` can never leave base's buffer, so no bounds
    // check is needed here.
    fn derive(&mut self, base: TensorId, name: String, layout: Layout) -> TensorId {
        let decl = &self.tensors[base.0];
        let (dtype, buffer) = (decl.dtype, decl.buffer);
        self.push(TensorDecl {
            name,
            dtype,
            buffer,
            layout,
        })
    }

    fn push(&mut self, decl: TensorDecl) -> TensorId {
        self.tensors.push(decl);
        TensorId(self.tensors.len() - 1)
    }
}
