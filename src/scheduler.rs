//! Periodic background jobs.
//!
//! A [`Scheduler`] wraps a [`JobScheduler`] together with what the `/jobs`
//! endpoint reports for each job. It is built once at startup and shared with
//! whatever needs to inspect it. The first run of a job comes one interval
//! after it is added, and a run that comes due while the previous one is still
//! going is skipped.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

const MIN_INTERVAL: time::Duration = time::Duration::from_secs(1);

pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    /// RFC 3339 timestamp, `None` once the scheduler is stopped.
    pub next_run_time: Option<String>,
    pub trigger: String,
}

#[derive(Clone)]
struct ScheduledJob {
    id: String,
    name: String,
    interval: time::Duration,
    job_id: Uuid,
}

pub struct Scheduler {
    inner: JobScheduler,
    jobs: Mutex<Vec<ScheduledJob>>,
    stopped: Arc<AtomicBool>,
}

impl Scheduler {
    /// Builds and starts the underlying job scheduler.
    pub async fn build() -> Result<Scheduler, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        inner.start().await?;

        Ok(Scheduler {
            inner,
            jobs: Mutex::new(Vec::new()),
            stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Runs `task` every `interval`. A job with the same id replaces the
    /// previous one.
    pub async fn add_interval_job<F>(
        &self,
        id: &str,
        name: &str,
        interval: time::Duration,
        task: F,
    ) -> Result<(), JobSchedulerError>
    where
        F: Fn() -> JobFuture + Send + Sync + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let job = Job::new_repeated_async(
            interval,
            single_run(id.to_string(), Arc::clone(&self.stopped), task),
        )?;
        let job_id = self.inner.add(job).await?;

        let replaced = {
            let mut jobs = lock(&self.jobs);
            let position = jobs.iter().position(|job| job.id == id);
            let replaced = position.map(|position| jobs.remove(position));
            jobs.push(ScheduledJob {
                id: id.to_string(),
                name: name.to_string(),
                interval,
                job_id,
            });
            replaced
        };
        if let Some(replaced) = replaced {
            self.inner.remove(&replaced.job_id).await?;
        }

        tracing::info!(
            job_id = id,
            interval_secs = interval.as_secs(),
            "Scheduled job added"
        );

        Ok(())
    }

    pub async fn jobs(&self) -> Vec<JobInfo> {
        let jobs = lock(&self.jobs).clone();
        let stopped = self.stopped.load(Ordering::SeqCst);
        let mut inner = self.inner.clone();
        let mut infos = Vec::with_capacity(jobs.len());

        for job in jobs {
            let next_run_time = if stopped {
                None
            } else {
                match inner.next_tick_for_job(job.job_id).await {
                    Ok(next_tick) => next_tick.map(|time| time.to_rfc3339()),
                    Err(err) => {
                        tracing::warn!(job_id = %job.id, "Failed to read next run time: {:?}", err);
                        None
                    }
                }
            };

            infos.push(JobInfo {
                id: job.id,
                name: job.name,
                next_run_time,
                trigger: describe_interval(job.interval),
            });
        }

        infos
    }

    /// Stops every job. Jobs stay listed, without a next run time.
    pub async fn shutdown(&self) -> Result<(), JobSchedulerError> {
        self.stopped.store(true, Ordering::SeqCst);

        let mut inner = self.inner.clone();
        inner.shutdown().await?;

        tracing::info!("Scheduler stopped");

        Ok(())
    }
}

/// Wraps `task` so that it never overlaps itself and does nothing once the
/// scheduler is stopped.
fn single_run<F>(
    id: String,
    stopped: Arc<AtomicBool>,
    task: F,
) -> impl FnMut(Uuid, JobScheduler) -> JobFuture + Send + Sync + 'static
where
    F: Fn() -> JobFuture + Send + Sync + 'static,
{
    let task = Arc::new(task);
    let running = Arc::new(AtomicBool::new(false));

    move |_job_id, _scheduler| {
        let id = id.clone();
        let task = Arc::clone(&task);
        let running = Arc::clone(&running);
        let stopped = Arc::clone(&stopped);

        let run: JobFuture = Box::pin(async move {
            if stopped.load(Ordering::SeqCst) {
                return;
            }
            if running.swap(true, Ordering::SeqCst) {
                tracing::warn!(job_id = %id, "Previous run still going, skipping this one");
                return;
            }

            tracing::info!(job_id = %id, "Running scheduled job");
            (*task)().await;

            running.store(false, Ordering::SeqCst);
        });
        run
    }
}

/// Renders an interval as `interval[H:MM:SS]`.
fn describe_interval(interval: time::Duration) -> String {
    let seconds = interval.as_secs();

    format!(
        "interval[{}:{:02}:{:02}]",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
