//! Pool of configured interpreter instances.
//!
//! `get` pops the most recently returned instance (LIFO) or configures a new
//! one when the pool is empty; `put` hands an instance back. The lock is held
//! only for the push or pop, so a cold start on one thread never blocks other
//! callers. An instance is configured exactly once and then reused.

use crate::config::PoolConfig;
use crate::configurator::InstanceConfigurator;
use crate::error::RuntimeResult;
use crate::instance::ScriptInstance;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances configured over the pool's lifetime.
    pub created: u64,
    /// Instances currently waiting in the pool.
    pub idle: usize,
    /// Instances dropped on return because of the pool policy.
    pub dropped: u64,
}

/// Concurrency-safe cache of ready interpreter instances.
pub struct InstancePool {
    configurator: InstanceConfigurator,
    policy: PoolConfig,
    saved: Mutex<Vec<ScriptInstance>>,
    created: AtomicU64,
    dropped: AtomicU64,
}

impl InstancePool {
    /// Create an empty pool.
    pub fn new(configurator: InstanceConfigurator, policy: PoolConfig) -> Arc<Self> {
        Arc::new(Self {
            configurator,
            policy,
            saved: Mutex::new(Vec::with_capacity(10)),
            created: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    /// Take an instance, configuring a new one if none is idle.
    ///
    /// Never waits for another caller to return an instance.
    pub fn get(&self) -> RuntimeResult<ScriptInstance> {
        let reused = self.lock().pop();
        if let Some(instance) = reused {
            return Ok(instance);
        }

        let instance = self.configurator.configure()?;
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(instance)
    }

    /// Return an instance obtained from [`get`](Self::get).
    ///
    /// The caller gives up the instance. Depending on the pool policy it is
    /// kept for reuse or dropped.
    pub fn put(&self, instance: ScriptInstance) {
        if self
            .policy
            .max_uses
            .is_some_and(|max| instance.uses() >= max)
        {
            warn!(instance = instance.id(), uses = instance.uses(), "Recycling instance");
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut saved = self.lock();
        if self.policy.max_idle.is_some_and(|max| saved.len() >= max) {
            drop(saved);
            warn!(instance = instance.id(), "Pool full, dropping instance");
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        saved.push(instance);
    }

    /// Take an instance wrapped in a guard that returns it on drop.
    pub fn checkout(&self) -> RuntimeResult<PooledInstance<'_>> {
        Ok(PooledInstance {
            pool: self,
            instance: Some(self.get()?),
        })
    }

    /// Configure `count` instances ahead of time.
    ///
    /// Running this at start-up surfaces configuration defects before any
    /// request is served.
    pub fn warm(&self, count: usize) -> RuntimeResult<()> {
        let mut fresh = Vec::with_capacity(count);
        for _ in 0..count {
            fresh.push(self.configurator.configure()?);
            self.created.fetch_add(1, Ordering::Relaxed);
        }
        for instance in fresh {
            self.put(instance);
        }
        Ok(())
    }

    /// Number of idle instances.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            idle: self.idle(),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub fn configurator(&self) -> &InstanceConfigurator {
        &self.configurator
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ScriptInstance>> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An instance checked out of a pool. Returned to the pool when dropped,
/// including during unwinding.
pub struct PooledInstance<'pool> {
    pool: &'pool InstancePool,
    instance: Option<ScriptInstance>,
}

impl PooledInstance<'_> {
    /// Keep the instance instead of returning it to the pool.
    pub fn detach(mut self) -> Option<ScriptInstance> {
        self.instance.take()
    }
}

impl Deref for PooledInstance<'_> {
    type Target = ScriptInstance;

    fn deref(&self) -> &ScriptInstance {
        self.instance
            .as_ref()
            .unwrap_or_else(|| unreachable!("instance is only taken by detach or drop"))
    }
}

impl DerefMut for PooledInstance<'_> {
    fn deref_mut(&mut self) -> &mut ScriptInstance {
        self.instance
            .as_mut()
            .unwrap_or_else(|| unreachable!("instance is only taken by detach or drop"))
    }
}

impl Drop for PooledInstance<'_> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.pool.put(instance);
        }
    }
}
