// src/queue.rs
//! In-process chain queue: a bounded channel drained by a fixed worker pool.
//!
//! `submit` never waits on the chain; the HTTP handler answers as soon as the job is
//! in the channel. Each worker runs one whole chain at a time, bounded by a deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{PipelineError, Result};
use crate::pipeline::{ChainReport, Pipeline, PipelineContext};

#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub workers: usize,
    pub capacity: usize,
    pub chain_deadline: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            capacity: 64,
            chain_deadline: Duration::from_secs(60),
        }
    }
}

#[derive(Clone)]
pub struct ChainQueue {
    tx: mpsc::Sender<PipelineContext>,
}

impl ChainQueue {
    /// Spawn `cfg.workers` workers. They exit once every `ChainQueue` clone is dropped
    /// and the channel has drained.
    pub fn start(pipeline: Arc<Pipeline>, cfg: QueueConfig) -> (Self, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(cfg.capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..cfg.workers.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(worker(id, rx, pipeline, cfg.chain_deadline))
            })
            .collect();
        info!(workers = cfg.workers.max(1), capacity = cfg.capacity, "chain queue started");
        (Self { tx }, handles)
    }

    pub fn submit(&self, ctx: PipelineContext) -> Result<()> {
        self.tx.try_send(ctx).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                PipelineError::QueueUnavailable("queue is full, try again shortly".into())
            }
            mpsc::error::TrySendError::Closed(_) => {
                PipelineError::QueueUnavailable("workers have shut down".into())
            }
        })
    }
}

async fn worker(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<PipelineContext>>>,
    pipeline: Arc<Pipeline>,
    deadline: Duration,
) {
    loop {
        let next = { rx.lock().await.recv().await };
        let Some(ctx) = next else {
            info!(worker = id, "chain queue closed; worker exiting");
            return;
        };
        let site = ctx.site_id.clone();
        if let Err(e) = run_with_deadline(&pipeline, ctx, deadline).await {
            match e {
                PipelineError::DeadlineExceeded { .. } => {
                    error!(worker = id, %site, error = %e, "chain abandoned")
                }
                other => warn!(worker = id, %site, error = %other, "chain ended early"),
            }
        }
    }
}

/// Run one chain, giving up once `deadline` elapses.
pub async fn run_with_deadline(
    pipeline: &Pipeline,
    ctx: PipelineContext,
    deadline: Duration,
) -> Result<ChainReport> {
    let site = ctx.site_id.clone();
    match tokio::time::timeout(deadline, pipeline.run(ctx)).await {
        Ok(res) => res,
        Err(_) => Err(PipelineError::DeadlineExceeded {
            site,
            secs: deadline.as_secs(),
        }),
    }
}
