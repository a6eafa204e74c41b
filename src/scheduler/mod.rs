pub mod tasks;

use std::future::Future;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};

/// Cron-driven housekeeping that runs beside update handling
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner })
    }

    /// Register `task` to run on `cron_expr` (six fields, seconds first).
    /// A bad expression is reported here, before the scheduler starts.
    pub async fn every<F, Fut>(&self, cron_expr: &str, name: &'static str, task: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            debug!("Running scheduled job: {}", name);
            Box::pin(task())
        })
        .with_context(|| format!("Invalid schedule {:?} for job {}", cron_expr, name))?;

        let id = self
            .inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        info!("Job '{}' ({}) scheduled with cron: {}", name, id, cron_expr);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")
    }

    /// Stop all jobs; consumes the scheduler since nothing can be added after
    pub async fn shutdown(mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}
