//! Job correlation between callers and the background context.
//!
//! Every delegated request gets a fresh [`JobId`] and a one-shot completion
//! channel. The background context reports back with the id only; the
//! correlator looks the id up and settles the matching caller. Entries are
//! removed from the map before their channel is used, so a job can be
//! settled at most once.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::TranscodeError;
use crate::pipeline::TranscodeResult;

/// Outcome delivered to a waiting caller.
pub type Outcome = Result<TranscodeResult, TranscodeError>;

/// Opaque identifier of one delegated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

struct PendingJob {
    /// Which background context the job was sent to.
    generation: u64,
    completion: oneshot::Sender<Outcome>,
}

/// Pending-result map keyed by [`JobId`].
pub struct JobCorrelator {
    next_id: AtomicU64,
    pending: Mutex<HashMap<JobId, PendingJob>>,
}

impl JobCorrelator {
    /// Create an empty correlator.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate an id for a job headed to context `generation` and return
    /// the receiver its caller awaits.
    pub fn register(&self, generation: u64) -> (JobId, oneshot::Receiver<Outcome>) {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (completion, receiver) = oneshot::channel();

        let previous = self.pending.lock().insert(
            id,
            PendingJob {
                generation,
                completion,
            },
        );
        debug_assert!(previous.is_none(), "job id {id} registered twice");

        (id, receiver)
    }

    /// Settle job `id` with `outcome`.
    ///
    /// Returns `false` for an unknown id (already settled, or never issued);
    /// that case is ignored.
    pub fn settle(&self, id: JobId, outcome: Outcome) -> bool {
        let Some(job) = self.pending.lock().remove(&id) else {
            debug!(%id, "ignoring completion for unknown job");
            return false;
        };

        if job.completion.send(outcome).is_err() {
            debug!(%id, "caller stopped waiting before the job finished");
        }
        true
    }

    /// Fail every job sent to context `generation` with
    /// [`TranscodeError::ContextFailure`]. Returns how many were failed.
    pub fn fail_generation(&self, generation: u64, reason: &str) -> usize {
        let failed: Vec<(JobId, PendingJob)> = {
            let mut pending = self.pending.lock();
            let ids: Vec<JobId> = pending
                .iter()
                .filter(|(_, job)| job.generation == generation)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove(&id).map(|job| (id, job)))
                .collect()
        };

        let count = failed.len();
        for (id, job) in failed {
            warn!(%id, generation, reason, "failing job after background context loss");
            let _ = job
                .completion
                .send(Err(TranscodeError::ContextFailure(reason.to_string())));
        }
        count
    }

    /// Number of jobs awaiting settlement.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for JobCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobCorrelator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCorrelator")
            .field("pending", &self.pending())
            .finish()
    }
}
