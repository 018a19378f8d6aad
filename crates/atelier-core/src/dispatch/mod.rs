//! Execution of transcode requests.
//!
//! A [`Dispatcher`] runs the same [`Pipeline`] in one of two modes:
//!
//! - **Inline**: on the caller's thread, inside the awaited future. This is
//!   the mode for single-threaded hosts such as `wasm32` in a browser tab.
//! - **Delegated**: on a lazily started background context so the caller's
//!   thread stays responsive. Requests are correlated by id, so concurrent
//!   callers never receive each other's results.
//!
//! Both modes return identical results and errors for identical input; a
//! panic in the pipeline becomes [`TranscodeError::ContextFailure`] either way.
//! If the background context dies, every job it owned fails with
//! [`TranscodeError::ContextFailure`] and the next request starts a new one.

mod correlator;
mod worker;

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use correlator::{JobCorrelator, JobId, Outcome};

use crate::error::TranscodeError;
use crate::pipeline::{Pipeline, TranscodeRequest, TranscodeResult};
use worker::{ContextHandle, ContextSlot, WorkerCommand};

/// Where a transcode runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionMode {
    /// On the calling thread.
    Inline,
    /// On a background context.
    Delegated,
}

impl ExecutionMode {
    /// The mode that suits the compile target.
    ///
    /// `wasm32` has no threads to delegate to, so it runs inline.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            ExecutionMode::Inline
        } else {
            ExecutionMode::Delegated
        }
    }
}

enum Execution {
    Inline,
    Delegated(Background),
}

/// Runs transcode requests in the configured [`ExecutionMode`].
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    execution: Execution,
}

impl Dispatcher {
    /// Create a dispatcher. No background context is started until the first
    /// delegated request.
    pub fn new(pipeline: Pipeline, mode: ExecutionMode) -> Self {
        let execution = match mode {
            ExecutionMode::Inline => Execution::Inline,
            ExecutionMode::Delegated => Execution::Delegated(Background::new()),
        };
        Self {
            pipeline: Arc::new(pipeline),
            execution,
        }
    }

    /// The mode requests run in.
    pub fn mode(&self) -> ExecutionMode {
        match self.execution {
            Execution::Inline => ExecutionMode::Inline,
            Execution::Delegated(_) => ExecutionMode::Delegated,
        }
    }

    /// Run `request` to completion.
    ///
    /// A panic in the pipeline surfaces as [`TranscodeError::ContextFailure`]
    /// in both modes.
    pub async fn run(&self, request: TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
        match &self.execution {
            Execution::Inline => {
                worker::run_guarded(&self.pipeline, &request).unwrap_or_else(|reason| {
                    warn!(reason = %reason, "inline transcode panicked");
                    Err(TranscodeError::ContextFailure(reason))
                })
            }
            Execution::Delegated(background) => {
                background.dispatch(&self.pipeline, request).await
            }
        }
    }

    /// Delegated jobs submitted but not yet settled. Always 0 inline.
    pub fn pending_jobs(&self) -> usize {
        match &self.execution {
            Execution::Inline => 0,
            Execution::Delegated(background) => background.correlator.pending(),
        }
    }

    /// How many background contexts have been started so far.
    pub fn contexts_started(&self) -> u64 {
        match &self.execution {
            Execution::Inline => 0,
            Execution::Delegated(background) => background.generations.load(Ordering::SeqCst),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode())
            .field("pending_jobs", &self.pending_jobs())
            .field("contexts_started", &self.contexts_started())
            .finish()
    }
}

/// State behind delegated execution.
struct Background {
    slot: Arc<ContextSlot>,
    correlator: Arc<JobCorrelator>,
    generations: AtomicU64,
}

impl Background {
    fn new() -> Self {
        Self {
            slot: Arc::new(ContextSlot::new(None)),
            correlator: Arc::new(JobCorrelator::new()),
            generations: AtomicU64::new(0),
        }
    }

    async fn dispatch(
        &self,
        pipeline: &Arc<Pipeline>,
        request: TranscodeRequest,
    ) -> Result<TranscodeResult, TranscodeError> {
        // Registration happens under the slot lock so a context that is being
        // torn down can never miss a job addressed to it.
        let (id, completion, commands) = {
            let mut slot = self.slot.lock();
            let (generation, commands) = match slot.as_ref() {
                Some(handle) => (handle.generation, handle.commands.clone()),
                None => {
                    let handle = self.start(pipeline)?;
                    let pair = (handle.generation, handle.commands.clone());
                    *slot = Some(handle);
                    pair
                }
            };
            let (id, completion) = self.correlator.register(generation);
            (id, completion, commands)
        };

        debug!(%id, "delegating transcode");
        if commands.send(WorkerCommand { id, request }).is_err() {
            self.correlator.settle(
                id,
                Err(TranscodeError::ContextFailure(
                    "background context is not accepting jobs".to_string(),
                )),
            );
        }

        completion.await.unwrap_or_else(|_| {
            Err(TranscodeError::ContextFailure(
                "background context dropped the job".to_string(),
            ))
        })
    }

    fn start(&self, pipeline: &Arc<Pipeline>) -> Result<ContextHandle, TranscodeError> {
        self.start_with(|generation| {
            worker::spawn(
                generation,
                Arc::clone(pipeline),
                Arc::clone(&self.correlator),
                Arc::downgrade(&self.slot),
            )
        })
    }

    /// Only called with the slot lock held, so the counter cannot move between
    /// the load and the store. A failed start is not counted.
    fn start_with<F>(&self, spawn: F) -> Result<ContextHandle, TranscodeError>
    where
        F: FnOnce(u64) -> io::Result<ContextHandle>,
    {
        let generation = self.generations.load(Ordering::SeqCst) + 1;
        let handle = spawn(generation).map_err(|e| {
            TranscodeError::ContextFailure(format!("could not start background context: {e}"))
        })?;

        self.generations.store(generation, Ordering::SeqCst);
        Ok(handle)
    }
}
