//! Fixed-interval scheduling of watchtower tasks.
//!
//! Every registered task gets its own loop. A cycle that fails, panics or is
//! still running when the next tick fires never affects the loop itself or
//! any other task.

use crate::error::DaemonError;
use crate::provider::Provider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One recurring watchtower duty.
///
/// A cycle must decide what to do from chain state alone: the process can
/// restart between cycles, so nothing remembered locally is trusted.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run_cycle(&self, provider: &Provider) -> Result<(), DaemonError>;
}

/// Counters for one task's loop.
#[derive(Debug, Default)]
pub struct TaskStats {
    cycles_started: AtomicU64,
    cycles_failed: AtomicU64,
    cycles_skipped: AtomicU64,
    last_run_millis: AtomicI64,
    running: AtomicBool,
}

impl TaskStats {
    fn record_start(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
        self.last_run_millis
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn cycles_started(&self) -> u64 {
        self.cycles_started.load(Ordering::Relaxed)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed.load(Ordering::Relaxed)
    }

    pub fn cycles_skipped(&self) -> u64 {
        self.cycles_skipped.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        match self.last_run_millis.load(Ordering::Relaxed) {
            0 => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub name: &'static str,
    pub interval_seconds: u64,
    pub cycles_started: u64,
    pub cycles_failed: u64,
    pub cycles_skipped: u64,
    pub running: bool,
    pub last_run: Option<DateTime<Utc>>,
}

/// Marks a cycle as in progress for as long as it is alive.
struct CycleGuard(Arc<TaskStats>);

impl CycleGuard {
    fn acquire(stats: &Arc<TaskStats>) -> Option<Self> {
        stats
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(stats.clone()))
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

pub struct TaskDescriptor {
    name: &'static str,
    interval: Duration,
    task: Arc<dyn Task>,
    stats: Arc<TaskStats>,
}

pub struct Scheduler {
    provider: Arc<Provider>,
    tasks: Vec<TaskDescriptor>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(provider: Arc<Provider>) -> Self {
        Self::with_cancellation(provider, CancellationToken::new())
    }

    pub fn with_cancellation(provider: Arc<Provider>, cancel: CancellationToken) -> Self {
        Self {
            provider,
            tasks: Vec::new(),
            cancel,
        }
    }

    pub fn register<T: Task + 'static>(&mut self, task: T, interval: Duration) -> &mut Self {
        let task: Arc<dyn Task> = Arc::new(task);
        self.tasks.push(TaskDescriptor {
            name: task.name(),
            interval,
            task,
            stats: Arc::new(TaskStats::default()),
        });
        self
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name).collect()
    }

    /// Starts one loop per registered task. The first cycle of each task runs
    /// immediately.
    pub fn spawn(self) -> SchedulerHandle {
        let mut loops = Vec::with_capacity(self.tasks.len());
        let mut stats = Vec::with_capacity(self.tasks.len());

        for descriptor in self.tasks {
            info!(task = descriptor.name, interval = ?descriptor.interval, "starting task");
            stats.push((descriptor.name, descriptor.interval, descriptor.stats.clone()));
            loops.push(tokio::spawn(run_task_loop(
                descriptor,
                self.provider.clone(),
                self.cancel.clone(),
            )));
        }

        SchedulerHandle {
            cancel: self.cancel,
            loops,
            stats,
        }
    }
}

pub struct SchedulerHandle {
    cancel: CancellationToken,
    loops: Vec<JoinHandle<()>>,
    stats: Vec<(&'static str, Duration, Arc<TaskStats>)>,
}

impl SchedulerHandle {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> Vec<TaskSnapshot> {
        self.stats
            .iter()
            .map(|(name, interval, stats)| TaskSnapshot {
                name: *name,
                interval_seconds: interval.as_secs(),
                cycles_started: stats.cycles_started(),
                cycles_failed: stats.cycles_failed(),
                cycles_skipped: stats.cycles_skipped(),
                running: stats.is_running(),
                last_run: stats.last_run(),
            })
            .collect()
    }

    pub fn task_stats(&self, name: &str) -> Option<Arc<TaskStats>> {
        self.stats
            .iter()
            .find(|(task, _, _)| *task == name)
            .map(|(_, _, stats)| stats.clone())
    }

    /// Cancels every loop and waits for in-flight cycles to stop.
    pub async fn shutdown(self) {
        info!("stopping scheduler");
        self.cancel.cancel();
        self.join().await;
    }

    /// Waits until the loops end, which only happens after cancellation.
    pub async fn join(self) {
        for handle in self.loops {
            if let Err(e) = handle.await {
                error!("task loop ended abnormally: {}", e);
            }
        }
    }
}

async fn run_task_loop(
    descriptor: TaskDescriptor,
    provider: Arc<Provider>,
    cancel: CancellationToken,
) {
    let name = descriptor.name;
    let mut ticker = tokio::time::interval(descriptor.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_cycle: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(guard) = CycleGuard::acquire(&descriptor.stats) else {
            descriptor.stats.cycles_skipped.fetch_add(1, Ordering::Relaxed);
            warn!(task = name, "previous cycle still running, skipping this interval");
            continue;
        };

        let task = descriptor.task.clone();
        let provider = provider.clone();
        let stats = descriptor.stats.clone();
        let cancel = cancel.clone();
        last_cycle = Some(tokio::spawn(async move {
            let _guard = guard;
            run_cycle(name, task, provider, stats, cancel).await;
        }));
    }

    if let Some(cycle) = last_cycle {
        let _ = cycle.await;
    }
    info!(task = name, "task stopped");
}

async fn run_cycle(
    name: &'static str,
    task: Arc<dyn Task>,
    provider: Arc<Provider>,
    stats: Arc<TaskStats>,
    cancel: CancellationToken,
) {
    stats.record_start();
    debug!(task = name, "cycle started");

    let mut cycle = tokio::spawn(async move { task.run_cycle(&provider).await });

    tokio::select! {
        _ = cancel.cancelled() => {
            cycle.abort();
            info!(task = name, "cycle cancelled");
        }
        result = &mut cycle => match result {
            Ok(Ok(())) => debug!(task = name, "cycle finished"),
            Ok(Err(e)) => {
                stats.cycles_failed.fetch_add(1, Ordering::Relaxed);
                error!(task = name, error = %e, "cycle failed");
            }
            Err(e) => {
                stats.cycles_failed.fetch_add(1, Ordering::Relaxed);
                error!(task = name, "cycle aborted: {}", e);
            }
        },
    }
}
