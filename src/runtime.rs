//! Bounded request runtime for scenario runs.
//!
//! Scenario runs are CPU bound and can take a while at high iteration counts.
//! Requests are queued onto a fixed pool of named worker threads over a bounded
//! channel; a full queue is reported to the caller instead of blocking it.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ExecutionError, ForecastError, ForecastResult, ValidationError};
use crate::simulation::{ScenarioEngine, ScenarioReport, ScenarioSpec};

const POOL_NAME: &str = "scenario";

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of request workers.
    pub workers: usize,
    /// Maximum queued requests.
    pub queue_capacity: usize,
    /// Time a synchronous caller waits for a result.
    pub request_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 64,
            request_timeout_ms: 30_000,
        }
    }
}

impl RuntimeConfig {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |field: &str| ValidationError::InvalidConfig {
            field: format!("runtime.{field}"),
            reason: "must be at least 1".to_string(),
        };
        if self.workers == 0 {
            return Err(invalid("workers"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms"));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

type Reply = Sender<ForecastResult<ScenarioReport>>;

enum Job {
    Simulate {
        spec: Box<ScenarioSpec>,
        reply: Reply,
    },

    #[cfg(test)]
    Probe {
        task: Box<dyn FnOnce() -> ForecastResult<ScenarioReport> + Send>,
        reply: Reply,
    },
}

fn guarded<F>(f: F) -> ForecastResult<ScenarioReport>
where
    F: FnOnce() -> ForecastResult<ScenarioReport>,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!(%message, "scenario worker panicked");
        Err(ExecutionError::WorkerPanicked { message }.into())
    })
}

#[derive(Debug)]
struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl WorkerPool {
    fn start(workers: usize, queue_capacity: usize, engine: Arc<ScenarioEngine>) -> ForecastResult<Self> {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let engine = Arc::clone(&engine);
            let handle = thread::Builder::new()
                .name(format!("missioncast-{POOL_NAME}-{idx}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        match job {
                            Job::Simulate { spec, reply } => {
                                let _ = reply.send(guarded(|| engine.simulate(&spec)));
                            }

                            #[cfg(test)]
                            Job::Probe { task, reply } => {
                                let _ = reply.send(guarded(task));
                            }
                        }
                    }
                })
                .map_err(|e| ForecastError::internal(format!("failed to spawn worker: {e}")))?;
            handles.push(handle);
        }
        debug!(workers, queue_capacity, "scenario pool started");

        Ok(Self {
            tx,
            workers: handles,
            queue_capacity,
        })
    }

    fn try_submit(&self, job: Job) -> ForecastResult<()> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ExecutionError::QueueFull {
                pool: POOL_NAME.to_string(),
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected {
                pool: POOL_NAME.to_string(),
            }
            .into()),
        }
    }

    fn shutdown(self) {
        // Closing the channel lets workers drain queued jobs, then exit.
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

/// Handle returned by [`ScenarioRuntime::execute_async`].
pub struct ExecutionHandle {
    rx: Receiver<ForecastResult<ScenarioReport>>,
}

impl ExecutionHandle {
    /// Waits for the run to complete.
    pub fn join(self) -> ForecastResult<ScenarioReport> {
        self.rx.recv().map_err(|_| {
            ForecastError::from(ExecutionError::Disconnected {
                pool: POOL_NAME.to_string(),
            })
        })?
    }

    /// Waits for the run to complete with a timeout.
    pub fn join_timeout(self, timeout: Duration) -> ForecastResult<ScenarioReport> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ForecastError::from(ExecutionError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            }),
            RecvTimeoutError::Disconnected => ForecastError::from(ExecutionError::Disconnected {
                pool: POOL_NAME.to_string(),
            }),
        })?
    }
}

/// Worker pool that runs [`ScenarioSpec`]s through a shared engine.
#[derive(Debug)]
pub struct ScenarioRuntime {
    engine: Arc<ScenarioEngine>,
    pool: Option<WorkerPool>,
    timeout: Duration,
}

impl ScenarioRuntime {
    /// Starts the worker threads.
    pub fn new(engine: ScenarioEngine, config: &RuntimeConfig) -> ForecastResult<Self> {
        config.validate()?;
        let engine = Arc::new(engine);
        let pool = WorkerPool::start(config.workers, config.queue_capacity, Arc::clone(&engine))?;
        Ok(Self {
            engine,
            pool: Some(pool),
            timeout: config.request_timeout(),
        })
    }

    fn submit(&self, job: Job) -> ForecastResult<()> {
        match &self.pool {
            Some(pool) => pool.try_submit(job),
            None => Err(ExecutionError::Disconnected {
                pool: POOL_NAME.to_string(),
            }
            .into()),
        }
    }

    /// Queues a run and returns immediately.
    pub fn execute_async(&self, spec: ScenarioSpec) -> ForecastResult<ExecutionHandle> {
        let (tx, rx) = bounded(1);
        self.submit(Job::Simulate {
            spec: Box::new(spec),
            reply: tx,
        })?;
        Ok(ExecutionHandle { rx })
    }

    /// Queues a run and waits up to the configured request timeout.
    pub fn execute(&self, spec: ScenarioSpec) -> ForecastResult<ScenarioReport> {
        self.execute_async(spec)?.join_timeout(self.timeout)
    }

    /// Returns the shared engine.
    #[must_use]
    pub fn engine(&self) -> &ScenarioEngine {
        &self.engine
    }

    #[cfg(test)]
    fn submit_probe<F>(&self, task: F) -> ForecastResult<ExecutionHandle>
    where
        F: FnOnce() -> ForecastResult<ScenarioReport> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        self.submit(Job::Probe {
            task: Box::new(task),
            reply: tx,
        })?;
        Ok(ExecutionHandle { rx })
    }
}

impl Drop for ScenarioRuntime {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
        }
    }
}
