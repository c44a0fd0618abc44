//! Single-worker background export queue.
//!
//! Jobs are processed strictly in submission order. Each job runs on the
//! blocking pool and is awaited before the next one is taken, and its report
//! is delivered once through a oneshot channel.

use super::{run_batch, BatchItem, BatchReport, ExportError, ExportOptions};
use crate::watermark::{WatermarkConfig, WatermarkRenderer};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A batch handed to the worker.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub items: Vec<BatchItem>,
    pub config: WatermarkConfig,
    pub options: ExportOptions,
}

type Envelope = (ExportJob, oneshot::Sender<BatchReport>);

/// Completion handle for a submitted job.
#[derive(Debug)]
pub struct ExportHandle {
    rx: oneshot::Receiver<BatchReport>,
}

impl ExportHandle {
    /// Poll without blocking; `None` while the job is still running.
    pub fn try_result(&mut self) -> Option<Result<BatchReport, ExportError>> {
        match self.rx.try_recv() {
            Ok(report) => Some(Ok(report)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ExportError::WorkerStopped)),
        }
    }

    /// Wait for the job's report.
    pub async fn wait(self) -> Result<BatchReport, ExportError> {
        self.rx.await.map_err(|_| ExportError::WorkerStopped)
    }
}

/// Background export worker.
#[derive(Debug)]
pub struct ExportWorker {
    tx: mpsc::UnboundedSender<Envelope>,
    task: JoinHandle<()>,
}

impl ExportWorker {
    /// Start the worker loop on the current tokio runtime.
    pub fn spawn(renderer: Arc<WatermarkRenderer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

        let task = tokio::spawn(async move {
            while let Some((job, reply)) = rx.recv().await {
                let names: Vec<String> = job.items.iter().map(BatchItem::file_name).collect();
                debug!(images = names.len(), "Export job started");

                let renderer = Arc::clone(&renderer);
                let report = tokio::task::spawn_blocking(move || {
                    run_batch(&renderer, &job.items, &job.config, &job.options)
                })
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "Export job panicked");
                    BatchReport::all_failed(names)
                });

                // The submitter may have dropped its handle
                let _ = reply.send(report);
            }
            info!("Export worker stopped");
        });

        Self { tx, task }
    }

    /// Queue a job behind any already submitted.
    pub fn submit(&self, job: ExportJob) -> Result<ExportHandle, ExportError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send((job, reply))
            .map_err(|_| ExportError::WorkerStopped)?;
        Ok(ExportHandle { rx })
    }

    /// Stop accepting jobs and wait for queued ones to finish.
    pub async fn shutdown(self) -> Result<(), ExportError> {
        drop(self.tx);
        self.task
            .await
            .map_err(|e| ExportError::JobPanicked(e.to_string()))
    }
}
