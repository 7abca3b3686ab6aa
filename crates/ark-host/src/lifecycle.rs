use std::time::Instant;

use tracing::{debug, warn};

use ark_core::{Error, Result};

/// Where the loop kernel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Created, not yet compiled.
    Created,
    /// Compiled and ready to launch.
    Compiled,
    /// Launched and accepting `run` requests.
    Running,
    /// Stopped after a launch; may be launched again.
    Stopped,
}

/// State of the persistent loop kernel: launched once, then fed iteration
/// counts until stopped.
#[derive(Debug)]
pub(crate) struct LoopKernel {
    phase: LoopPhase,
    block_dim: usize,
    iterations: u64,
    launched_at: Option<Instant>,
    elapsed_msec: Option<f32>,
}

impl LoopKernel {
    pub(crate) fn new(block_dim: usize) -> Self {
        LoopKernel {
            phase: LoopPhase::Created,
            block_dim,
            iterations: 0,
            launched_at: None,
            elapsed_msec: None,
        }
    }

    pub(crate) fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub(crate) fn block_dim(&self) -> usize {
        self.block_dim
    }

    pub(crate) fn iterations(&self) -> u64 {
        self.iterations
    }

    pub(crate) fn compile(&mut self) -> Result<()> {
        match self.phase {
            LoopPhase::Created => {
                debug!(block_dim = self.block_dim, "compiled loop kernel");
                self.phase = LoopPhase::Compiled;
                Ok(())
            }
            LoopPhase::Running => Err(Error::InvalidUsage(
                "cannot recompile a running loop kernel".to_string(),
            )),
            LoopPhase::Compiled | LoopPhase::Stopped => Ok(()),
        }
    }

    pub(crate) fn launch(&mut self) -> Result<()> {
        match self.phase {
            LoopPhase::Created => Err(Error::InvalidUsage(
                "need to compile first before launch".to_string(),
            )),
            LoopPhase::Running => {
                warn!("ignore launching twice");
                Ok(())
            }
            LoopPhase::Compiled | LoopPhase::Stopped => {
                self.phase = LoopPhase::Running;
                self.launched_at = Some(Instant::now());
                self.elapsed_msec = None;
                Ok(())
            }
        }
    }

    pub(crate) fn run(&mut self, iter: usize) -> Result<()> {
        if self.phase != LoopPhase::Running {
            return Err(Error::InvalidUsage(format!(
                "cannot run {iter} iterations: loop kernel is {:?}, not running",
                self.phase
            )));
        }
        self.iterations += iter as u64;
        Ok(())
    }

    pub(crate) fn wait(&mut self) -> Result<()> {
        // Iterations complete inside `run`; nothing is ever in flight.
        Ok(())
    }

    pub(crate) fn stop(&mut self) -> Result<()> {
        if self.phase != LoopPhase::Running {
            return Err(Error::InvalidUsage(format!(
                "cannot stop: loop kernel is {:?}, not running",
                self.phase
            )));
        }
        self.wait()?;
        let elapsed = self
            .launched_at
            .take()
            .map_or(0.0, |t| t.elapsed().as_secs_f32() * 1000.0);
        self.elapsed_msec = Some(elapsed);
        self.phase = LoopPhase::Stopped;
        Ok(())
    }

    pub(crate) fn elapsed_msec(&self) -> Result<f32> {
        match (self.phase, self.elapsed_msec) {
            (LoopPhase::Running, _) => Err(Error::InvalidUsage(
                "need to stop the kernel first".to_string(),
            )),
            (_, Some(ms)) => Ok(ms),
            (_, None) => Err(Error::InvalidUsage(
                "loop kernel has never been launched".to_string(),
            )),
        }
    }
}
