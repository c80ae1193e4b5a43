//! Repeating script events.
//!
//! Each scheduled event is a tokio task that wakes on its interval, checks an
//! instance out of the pool, runs the event script on a blocking thread and
//! returns the instance. Events hold only a weak reference to the pool and
//! stop on their own once the pool is gone, removing themselves from the
//! scheduler as they go.

use crate::error::{RuntimeError, RuntimeResult};
use crate::exchange::Request;
use crate::pool::InstancePool;
use crate::services::EventScheduler;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Event scheduler backed by an [`InstancePool`].
pub struct PoolScheduler {
    pool: Weak<InstancePool>,
    this: Weak<PoolScheduler>,
    jobs: Mutex<HashMap<Uuid, AbortHandle>>,
}

impl PoolScheduler {
    /// Create a scheduler for `pool` and attach it to the pool's host context,
    /// making `events.add` usable from scripts.
    pub fn attach(pool: &Arc<InstancePool>) -> Arc<Self> {
        let scheduler = Arc::new_cyclic(|this| Self {
            pool: Arc::downgrade(pool),
            this: this.clone(),
            jobs: Mutex::new(HashMap::new()),
        });
        if !pool
            .configurator()
            .host()
            .attach_scheduler(scheduler.clone())
        {
            warn!(
                "An event scheduler was already attached; \
                 the new one only runs events scheduled on it directly"
            );
        }
        scheduler
    }

    /// Number of active events.
    pub fn active(&self) -> usize {
        self.jobs().len()
    }

    /// Cancel every event.
    pub fn shutdown(&self) {
        let mut jobs = self.jobs();
        for (id, job) in jobs.drain() {
            debug!(event = %id, "Stopping event");
            job.abort();
        }
    }

    /// Forget an event whose task ended on its own.
    fn finished(&self, id: Uuid) {
        if self.jobs().remove(&id).is_some() {
            debug!(event = %id, "Event removed");
        }
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<Uuid, AbortHandle>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventScheduler for PoolScheduler {
    fn schedule(&self, interval: Duration, script: PathBuf) -> RuntimeResult<Uuid> {
        if interval.is_zero() {
            return Err(RuntimeError::Service(
                "event interval must be greater than zero".to_string(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            RuntimeError::Service("events require a running tokio runtime".to_string())
        })?;

        let id = Uuid::new_v4();
        info!(event = %id, script = %script.display(), ?interval, "Scheduling event");
        // Held across the spawn so a task that ends at once finds its entry.
        let mut jobs = self.jobs();
        let task = runtime.spawn(run_event(
            id,
            interval,
            script,
            self.pool.clone(),
            self.this.clone(),
        ));
        jobs.insert(id, task.abort_handle());
        Ok(id)
    }

    fn cancel(&self, id: Uuid) -> bool {
        match self.jobs().remove(&id) {
            Some(job) => {
                job.abort();
                debug!(event = %id, "Event cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for PoolScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_event(
    id: Uuid,
    interval: Duration,
    script: PathBuf,
    pool: Weak<InstancePool>,
    scheduler: Weak<PoolScheduler>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(pool) = pool.upgrade() else {
            debug!(event = %id, "Pool dropped, stopping event");
            break;
        };
        let script = script.clone();
        let outcome = tokio::task::spawn_blocking(move || -> RuntimeResult<()> {
            let mut instance = pool.checkout()?;
            instance.execute_file(&script, Request::internal())?;
            Ok(())
        })
        .await;

        match outcome {
            Ok(Ok(())) => debug!(event = %id, "Event run complete"),
            Ok(Err(e)) => warn!(event = %id, "Event script failed: {}", e),
            Err(e) => warn!(event = %id, "Event task failed: {}", e),
        }
    }

    if let Some(scheduler) = scheduler.upgrade() {
        scheduler.finished(id);
    }
}
