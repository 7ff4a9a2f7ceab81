//! Single-job motion sequencer.
//!
//! A [`MotionSequencer`] spawns one worker thread that owns the boxed
//! [`ArmDriver`] for its whole life.  Submissions go through a depth-1
//! mailbox guarded by a mutex and condition variable: [`submit`] blocks
//! while a job is installed or executing, then installs its own job and
//! returns without waiting for completion.  Jobs from one caller therefore
//! execute in submission order, and at most one motion is ever in flight.
//!
//! [`submit`]: MotionSequencer::submit

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use candytron_hal::{ArmDriver, MoveOutcome};
use candytron_poses::PoseStore;
use candytron_types::{CandyError, MotionJob, MotionOp};
use chrono::Utc;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct Mailbox {
    /// The installed-but-not-finished job.  `Some` only between install and
    /// worker pickup.
    slot: Option<MotionJob>,
    /// Set at install time, cleared when the worker finishes the job.
    busy: bool,
    shutdown: bool,
}

impl Mailbox {
    fn idle(&self) -> bool {
        !self.busy && self.slot.is_none()
    }
}

/// Serializes all physical arm operations through one worker thread.
///
/// Dropping the sequencer waits for the in-flight job, then stops and joins
/// the worker, so the arm is never abandoned mid-motion.
pub struct MotionSequencer {
    shared: Arc<(Mutex<Mailbox>, Condvar)>,
    worker: Option<JoinHandle<()>>,
}

impl MotionSequencer {
    /// Start the worker thread and hand it ownership of the arm driver.
    pub fn new(arm: Box<dyn ArmDriver>) -> Self {
        let shared = Arc::new((Mutex::new(Mailbox::default()), Condvar::new()));
        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_loop(worker_shared, arm));
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Install `job` into the single-job slot, blocking while the worker is
    /// mid-job.  Returns once the job is installed, not once it completes;
    /// pair with [`wait_until_idle`][Self::wait_until_idle] when completion
    /// matters.
    pub fn submit(&self, job: MotionJob) {
        let (mailbox, idle_or_taken) = &*self.shared;
        let mut mb = mailbox.lock().expect("motion mailbox poisoned");
        while !mb.idle() {
            mb = idle_or_taken.wait(mb).expect("motion mailbox poisoned");
        }
        debug!(job_id = %job.id, "motion job installed");
        mb.slot = Some(job);
        mb.busy = true;
        idle_or_taken.notify_all();
    }

    /// Block until the worker has no installed or executing job.
    pub fn wait_until_idle(&self) {
        let (mailbox, idle_or_taken) = &*self.shared;
        let mut mb = mailbox.lock().expect("motion mailbox poisoned");
        while !mb.idle() {
            mb = idle_or_taken.wait(mb).expect("motion mailbox poisoned");
        }
    }

    /// Resolve both position names through `store` and submit a
    /// pick-and-place that returns home afterwards.
    ///
    /// Success means the job was accepted, not that the physical move
    /// succeeded; completion is asynchronous.
    ///
    /// # Errors
    ///
    /// [`CandyError::UnresolvedTag`] when either name resolves to no pose.
    /// Nothing is submitted and the worker is untouched.
    pub fn move_between(
        &self,
        store: &PoseStore,
        src: &str,
        dst: &str,
    ) -> Result<(), CandyError> {
        let source = store.lookup(src).ok_or_else(|| CandyError::UnresolvedTag {
            name: src.to_string(),
        })?;
        let destination = store.lookup(dst).ok_or_else(|| CandyError::UnresolvedTag {
            name: dst.to_string(),
        })?;
        info!(src, dst, "pick-and-place accepted");
        self.submit(MotionJob::pick_and_place(source, destination, true));
        Ok(())
    }

    /// Submit a move to the arm's safe rest pose.
    pub fn move_home(&self) {
        self.submit(MotionJob::home());
    }
}

impl Drop for MotionSequencer {
    fn drop(&mut self) {
        let (mailbox, idle_or_taken) = &*self.shared;
        if let Ok(mut mb) = mailbox.lock() {
            while !mb.idle() {
                match idle_or_taken.wait(mb) {
                    Ok(guard) => mb = guard,
                    Err(_) => return,
                }
            }
            mb.shutdown = true;
            idle_or_taken.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: Arc<(Mutex<Mailbox>, Condvar)>, mut arm: Box<dyn ArmDriver>) {
    let (mailbox, idle_or_taken) = &*shared;
    loop {
        let job = {
            let mut mb = mailbox.lock().expect("motion mailbox poisoned");
            loop {
                if mb.shutdown {
                    return;
                }
                if let Some(job) = mb.slot.take() {
                    break job;
                }
                mb = idle_or_taken.wait(mb).expect("motion mailbox poisoned");
            }
        };

        let queued_ms = (Utc::now() - job.submitted_at).num_milliseconds();
        debug!(job_id = %job.id, queued_ms, "motion job picked up");
        execute(arm.as_mut(), job);

        let mut mb = mailbox.lock().expect("motion mailbox poisoned");
        mb.busy = false;
        idle_or_taken.notify_all();
    }
}

/// Run one job to completion on the worker thread.
///
/// Driver failures are recovered here and never propagate: a collision is
/// cleared and followed by a forced home move so the arm ends in a known
/// safe state, and any other fault is logged for operator visibility.
fn execute(arm: &mut dyn ArmDriver, job: MotionJob) {
    match job.op {
        MotionOp::Home => {
            info!(job_id = %job.id, arm = arm.id(), "moving arm to home pose");
            arm.move_home();
        }
        MotionOp::Move {
            source,
            destination,
            return_home_after,
        } => {
            let mut go_home = return_home_after;
            match arm.pick_and_place(&source, &destination) {
                MoveOutcome::Completed => {
                    debug!(job_id = %job.id, %source, %destination, "pick-and-place completed");
                }
                MoveOutcome::Collision => {
                    warn!(
                        job_id = %job.id,
                        arm = arm.id(),
                        "collision during pick-and-place, clearing and returning home"
                    );
                    arm.clear_collision();
                    go_home = true;
                }
                MoveOutcome::Fault(details) => {
                    error!(job_id = %job.id, arm = arm.id(), details = %details, "arm driver fault");
                }
            }
            if go_home {
                arm.move_home();
            }
        }
    }
}
