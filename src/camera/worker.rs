use anyhow::{bail, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Single background worker for camera operations
///
/// Jobs run one at a time, in submission order. Shutting down stops new jobs
/// from being accepted; whatever is already queued or running is left alone.
pub struct CameraWorker {
    jobs: Option<mpsc::UnboundedSender<BoxFuture<'static, ()>>>,
    handle: Option<JoinHandle<()>>,
}

impl CameraWorker {
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();

        let handle = tokio::spawn(async move {
            debug!("Camera worker started");
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!("Camera worker stopped");
        });

        Self {
            jobs: Some(tx),
            handle: Some(handle),
        }
    }

    /// Queue a job
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(jobs) = &self.jobs else {
            bail!("Camera worker is shut down");
        };

        if jobs.send(job.boxed()).is_err() {
            bail!("Camera worker is gone");
        }

        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        self.jobs.is_none()
    }

    /// Stop accepting jobs
    pub fn shutdown(&mut self) {
        if self.jobs.take().is_some() {
            info!("Camera worker shutting down");
        }
    }

    /// Shut down and wait for the queue to run dry
    pub async fn join(mut self) -> Result<()> {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.await?;
        }
        Ok(())
    }
}

impl Default for CameraWorker {
    fn default() -> Self {
        Self::new()
    }
}
