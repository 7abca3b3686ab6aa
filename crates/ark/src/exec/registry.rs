// Registry — Where "the" executor of a process can be found
//
// Most code receives an Executor by reference. For code that cannot, an
// ExecutorRegistry holds at most one registered executor and hands out
// clones of its Arc. The process-wide global is simply one static registry.
//
// The state is an explicit enum rather than an Option, so the uninitialized
// path can be asserted directly. Registration is not arbitrated: concurrent
// registrations are serialized by the lock, and the last one wins.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{error, info};

use ark_core::{Error, Result};

use super::Executor;

/// Observable state of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    Registered,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Uninitialized,
    Registered(Arc<Executor>),
}

/// Holds at most one executor.
#[derive(Debug, Default)]
pub struct ExecutorRegistry {
    slot: RwLock<Slot>,
}

impl ExecutorRegistry {
    pub const fn new() -> Self {
        ExecutorRegistry {
            slot: RwLock::new(Slot::Uninitialized),
        }
    }

    pub fn state(&self) -> Result<RegistryState> {
        Ok(match *self.read()? {
            Slot::Uninitialized => RegistryState::Uninitialized,
            Slot::Registered(_) => RegistryState::Registered,
        })
    }

    /// Make `executor` the registered one, returning the executor it
    /// replaces, if any.
    pub fn register(&self, executor: Arc<Executor>) -> Result<Option<Arc<Executor>>> {
        info!(name = executor.name(), "registering executor");
        let previous = std::mem::replace(&mut *self.write()?, Slot::Registered(executor));
        Ok(match previous {
            Slot::Uninitialized => None,
            Slot::Registered(prev) => Some(prev),
        })
    }

    /// Clear the registry, returning the executor that was registered.
    pub fn unregister(&self) -> Result<Option<Arc<Executor>>> {
        let previous = std::mem::take(&mut *self.write()?);
        Ok(match previous {
            Slot::Uninitialized => None,
            Slot::Registered(prev) => Some(prev),
        })
    }

    /// The registered executor, or `NotInitialized`.
    pub fn get(&self) -> Result<Arc<Executor>> {
        match &*self.read()? {
            Slot::Registered(executor) => Ok(Arc::clone(executor)),
            Slot::Uninitialized => {
                error!("executor is not initialized");
                Err(Error::NotInitialized)
            }
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Slot>> {
        self.slot
            .read()
            .map_err(|_| Error::LockPoisoned("executor registry"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Slot>> {
        self.slot
            .write()
            .map_err(|_| Error::LockPoisoned("executor registry"))
    }
}

static GLOBAL_EXECUTOR: ExecutorRegistry = ExecutorRegistry::new();

/// The process-wide registry behind the `*_global_executor` functions.
pub fn global_registry() -> &'static ExecutorRegistry {
    &GLOBAL_EXECUTOR
}

/// Register `executor` as the global executor. Returns the one it replaces.
pub fn register_global_executor(executor: Arc<Executor>) -> Result<Option<Arc<Executor>>> {
    GLOBAL_EXECUTOR.register(executor)
}

/// Clear the global executor. Returns the one that was registered.
pub fn unregister_global_executor() -> Result<Option<Arc<Executor>>> {
    GLOBAL_EXECUTOR.unregister()
}

/// Get the global executor, or `NotInitialized` if none is registered.
pub fn get_global_executor() -> Result<Arc<Executor>> {
    GLOBAL_EXECUTOR.get()
}
