//! The background transcoding context.
//!
//! A context is two named threads joined by channels:
//!
//! - the worker pulls [`WorkerCommand`]s and runs the pipeline, reporting a
//!   [`WorkerEvent`] per job;
//! - the event pump turns those events into settled callers.
//!
//! A panic inside the pipeline is fatal for the context. The worker reports
//! [`WorkerEvent::Crashed`] and exits; the pump clears the shared slot so the
//! next request starts a fresh context, then fails every job still pending on
//! the dead one.

use std::any::Any;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::correlator::{JobCorrelator, JobId, Outcome};
use crate::pipeline::{Pipeline, TranscodeRequest};

/// Shared slot holding the live context, if any.
pub(crate) type ContextSlot = Mutex<Option<ContextHandle>>;

/// Message sent to the worker thread.
pub(crate) struct WorkerCommand {
    pub id: JobId,
    pub request: TranscodeRequest,
}

/// Message sent from the worker thread to the event pump.
pub(crate) enum WorkerEvent {
    /// A job finished, successfully or with a job-scoped error.
    Completed { id: JobId, outcome: Outcome },
    /// The worker hit a failure not scoped to one job and is exiting.
    Crashed { reason: String },
}

/// Handle to a running context.
pub(crate) struct ContextHandle {
    pub generation: u64,
    pub commands: mpsc::UnboundedSender<WorkerCommand>,
}

/// Start context `generation`.
///
/// The returned handle owns the only command sender; dropping it lets the
/// worker drain and exit.
pub(crate) fn spawn(
    generation: u64,
    pipeline: Arc<Pipeline>,
    correlator: Arc<JobCorrelator>,
    slot: Weak<ContextSlot>,
) -> io::Result<ContextHandle> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    thread::Builder::new()
        .name(format!("transcode-worker-{generation}"))
        .spawn(move || run_worker(generation, &pipeline, command_rx, event_tx))?;

    thread::Builder::new()
        .name(format!("transcode-events-{generation}"))
        .spawn(move || pump_events(generation, event_rx, &correlator, &slot))?;

    info!(generation, "started background transcode context");

    Ok(ContextHandle {
        generation,
        commands: command_tx,
    })
}

fn run_worker(
    generation: u64,
    pipeline: &Pipeline,
    mut commands: mpsc::UnboundedReceiver<WorkerCommand>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    while let Some(WorkerCommand { id, request }) = commands.blocking_recv() {
        debug!(generation, %id, bytes = request.source.len(), "worker picked up job");

        let event = match run_guarded(pipeline, &request) {
            Ok(outcome) => WorkerEvent::Completed { id, outcome },
            Err(reason) => WorkerEvent::Crashed { reason },
        };
        let crashed = matches!(event, WorkerEvent::Crashed { .. });

        if events.send(event).is_err() || crashed {
            break;
        }
    }
    debug!(generation, "worker exiting");
}

fn pump_events(
    generation: u64,
    mut events: mpsc::UnboundedReceiver<WorkerEvent>,
    correlator: &JobCorrelator,
    slot: &Weak<ContextSlot>,
) {
    let reason = loop {
        match events.blocking_recv() {
            Some(WorkerEvent::Completed { id, outcome }) => {
                correlator.settle(id, outcome);
            }
            Some(WorkerEvent::Crashed { reason }) => break reason,
            None => break "background worker stopped".to_string(),
        }
    };

    // Clearing the slot and failing the generation happen under the slot lock,
    // so no new job can be registered against this context in between.
    let Some(slot) = slot.upgrade() else {
        correlator.fail_generation(generation, &reason);
        return;
    };
    let mut current = slot.lock();
    if current.as_ref().is_some_and(|h| h.generation == generation) {
        *current = None;
    }
    let failed = correlator.fail_generation(generation, &reason);
    drop(current);

    if failed > 0 {
        error!(generation, failed, reason = %reason, "background transcode context lost");
    } else {
        debug!(generation, reason = %reason, "background transcode context closed");
    }
}

/// Run the pipeline, turning a panic into its message.
pub(crate) fn run_guarded(
    pipeline: &Pipeline,
    request: &TranscodeRequest,
) -> Result<Outcome, String> {
    catch_unwind(AssertUnwindSafe(|| pipeline.run(request)))
        .map_err(|payload| panic_reason(payload.as_ref()))
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("transcode panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("transcode panicked: {message}")
    } else {
        "transcode panicked".to_string()
    }
}
