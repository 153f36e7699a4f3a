use std::{
    ops::{Deref, DerefMut},
    sync::Mutex,
};

use kvsearch_common::{Result, error::Error};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::QueryEngine;

/// A fixed set of engine instances shared by concurrent requests.
///
/// Each instance serves one query at a time. `lease` waits until an instance
/// is free; the lease returns it to the pool when dropped.
pub struct EnginePool {
    engines: Mutex<Vec<Box<dyn QueryEngine>>>,
    permits: Semaphore,
    size: usize,
    input_capacity: usize,
}

impl EnginePool {
    pub fn new(engines: Vec<Box<dyn QueryEngine>>) -> EnginePool {
        let size = engines.len();
        let input_capacity = engines
            .iter()
            .map(|engine| engine.input_capacity())
            .min()
            .unwrap_or(0);
        EnginePool {
            engines: Mutex::new(engines),
            permits: Semaphore::new(size),
            size,
            input_capacity,
        }
    }

    /// Builds a pool of `size` engines from a factory.
    pub fn with_factory<F>(size: usize, mut factory: F) -> Result<EnginePool>
    where
        F: FnMut() -> Result<Box<dyn QueryEngine>>,
    {
        let engines = (0..size).map(|_| factory()).collect::<Result<Vec<_>>>()?;
        Ok(EnginePool::new(engines))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Smallest input slot among the pooled engines, `0` for an empty pool.
    pub fn input_capacity(&self) -> usize {
        self.input_capacity
    }

    /// Number of engines not currently leased.
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn lease(&self) -> Result<EngineLease<'_>> {
        if self.size == 0 {
            return Err(Error::engine_failure("engine pool is empty"));
        }
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::engine_failure("engine pool is closed"))?;
        let engine = self
            .engines
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| Error::engine_failure("engine pool permit without an engine"))?;
        Ok(EngineLease {
            pool: self,
            engine: Some(engine),
            _permit: permit,
        })
    }

    fn return_engine(&self, engine: Box<dyn QueryEngine>) {
        self.engines.lock().unwrap().push(engine);
    }
}

/// Exclusive access to one pooled engine.
pub struct EngineLease<'a> {
    pool: &'a EnginePool,
    engine: Option<Box<dyn QueryEngine>>,
    _permit: SemaphorePermit<'a>,
}

impl Deref for EngineLease<'_> {
    type Target = dyn QueryEngine;

    fn deref(&self) -> &Self::Target {
        self.engine.as_deref().expect("engine present until drop")
    }
}

impl DerefMut for EngineLease<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine.as_deref_mut().expect("engine present until drop")
    }
}

impl Drop for EngineLease<'_> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            self.pool.return_engine(engine);
        }
    }
}
