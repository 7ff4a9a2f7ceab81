//! In-process simulation drivers for headless runs, CI, and tests.
//!
//! [`SimDetector`] replays scripted detection frames, including the canned
//! exhibition fixtures used when no camera is attached.  [`SimArm`] records
//! every operation it is asked to perform and can be scripted to fail a
//! specific pick-and-place with a collision or a fault.
//!
//! # Example
//!
//! ```rust
//! use candytron_hal::sim::{SimArm, SimDetector};
//! use candytron_hal::{ArmDriver, MoveOutcome, ObjectDetector};
//! use candytron_types::Pose;
//!
//! let mut detector = SimDetector::exhibition("table_yolo");
//! // First frame: the four calibration corners.
//! assert_eq!(detector.detect().unwrap().len(), 4);
//!
//! let mut arm = SimArm::new("ned2");
//! let a = Pose::from_components([0.2, 0.1, 0.13, 0.0, 1.57, 0.0]);
//! let b = Pose::from_components([0.3, -0.1, 0.13, 0.0, 1.57, 0.0]);
//! assert_eq!(arm.pick_and_place(&a, &b), MoveOutcome::Completed);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use candytron_types::{CandyError, Detection, Pose};

use crate::arm::{ArmDriver, MoveOutcome};
use crate::detector::ObjectDetector;

/// Rest pose of the simulated arm, matching the Ned2 factory home pose.
pub const SIM_HOME_POSE: Pose = Pose {
    x: 0.1340,
    y: -0.0001,
    z: 0.1649,
    roll: 0.002,
    pitch: 1.006,
    yaw: -0.001,
};

// ────────────────────────────────────────────────────────────────────────────
// Canned exhibition frames
// ────────────────────────────────────────────────────────────────────────────

/// Four well-separated corner candies, one per table corner.  Feeding this
/// frame to the calibrator yields the exhibition table grid.
pub fn calibration_fixture() -> Vec<Detection> {
    vec![
        Detection::new("Refreshers", 465.0, 43.0),
        Detection::new("Riesen", 465.0, 432.0),
        Detection::new("Plopp", 193.0, 43.0),
        Detection::new("Pearnut", 190.6651, 432.0),
    ]
}

/// A populated exhibition table as one noisy detector frame: eleven candies,
/// several of them off-cell far enough to be discarded by tag matching.
pub fn table_fixture() -> Vec<Detection> {
    vec![
        Detection::new("Riesen", 608.4746, 261.0399),
        Detection::new("Pearnut", 190.6651, 281.6597),
        Detection::new("Geisha", 324.3160, 287.9541),
        Detection::new("Dumle", 331.5356, 43.3107),
        Detection::new("VanillaFudge", 328.1843, 159.3306),
        Detection::new("Riesen", 463.4600, 432.1105),
        Detection::new("Refreshers", 461.0807, 162.0085),
        Detection::new("Riesen", 316.5636, 432.8765),
        Detection::new("Refreshers", 567.1455, 74.4779),
        Detection::new("Plopp", 197.7049, 161.3752),
        Detection::new("Refreshers", 466.4943, 293.8249),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated detector
// ────────────────────────────────────────────────────────────────────────────

/// A detector that replays pre-recorded frames instead of running inference.
pub struct SimDetector {
    id: String,
    frames: VecDeque<Vec<Detection>>,
    /// Frame returned forever once the scripted sequence is exhausted.
    fallback: Option<Vec<Detection>>,
}

impl SimDetector {
    /// Play `frames` in order, then fail with
    /// [`CandyError::DetectorUnavailable`] once they run out.
    pub fn scripted(id: impl Into<String>, frames: Vec<Vec<Detection>>) -> Self {
        Self {
            id: id.into(),
            frames: frames.into(),
            fallback: None,
        }
    }

    /// Return the same `frame` on every capture.
    pub fn fixed(id: impl Into<String>, frame: Vec<Detection>) -> Self {
        Self {
            id: id.into(),
            frames: VecDeque::new(),
            fallback: Some(frame),
        }
    }

    /// The offline exhibition script: one [`calibration_fixture`] frame,
    /// then [`table_fixture`] forever.
    pub fn exhibition(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            frames: VecDeque::from(vec![calibration_fixture()]),
            fallback: Some(table_fixture()),
        }
    }
}

impl ObjectDetector for SimDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(&mut self) -> Result<Vec<Detection>, CandyError> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(frame);
        }
        match &self.fallback {
            Some(frame) => Ok(frame.clone()),
            None => Err(CandyError::DetectorUnavailable {
                details: "scripted frame sequence exhausted".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated arm
// ────────────────────────────────────────────────────────────────────────────

/// One operation the simulated arm was asked to perform, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmOp {
    /// A pick-and-place attempt, recorded whether or not it succeeded.
    PickAndPlace { source: Pose, destination: Pose },
    /// A move to the home pose.
    Home,
}

/// Shared, cloneable view of a [`SimArm`]'s operation log.
///
/// Clone a handle before boxing the arm into the sequencer, then assert on
/// [`snapshot`][Self::snapshot] from the test thread.
#[derive(Clone, Default)]
pub struct ArmLog(Arc<Mutex<Vec<ArmOp>>>);

impl ArmLog {
    /// A copy of every operation recorded so far.
    pub fn snapshot(&self) -> Vec<ArmOp> {
        self.0.lock().expect("arm log lock poisoned").clone()
    }

    fn record(&self, op: ArmOp) {
        self.0.lock().expect("arm log lock poisoned").push(op);
    }
}

/// How a scripted pick-and-place attempt should fail.
#[derive(Debug, Clone)]
pub enum ScriptedFailure {
    Collision,
    Fault(String),
}

/// A simulated arm that records operations and tracks the collision flag.
pub struct SimArm {
    id: String,
    current: Pose,
    collision: bool,
    attempts: usize,
    failures: HashMap<usize, ScriptedFailure>,
    move_latency: Option<Duration>,
    log: ArmLog,
}

impl SimArm {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current: SIM_HOME_POSE,
            collision: false,
            attempts: 0,
            failures: HashMap::new(),
            move_latency: None,
            log: ArmLog::default(),
        }
    }

    /// Fail the `nth` pick-and-place (1-based) with a collision, setting the
    /// collision flag like the real driver does.
    pub fn with_collision_on(mut self, nth: usize) -> Self {
        self.failures.insert(nth, ScriptedFailure::Collision);
        self
    }

    /// Fail the `nth` pick-and-place (1-based) with a driver fault.
    pub fn with_fault_on(mut self, nth: usize, details: impl Into<String>) -> Self {
        self.failures.insert(nth, ScriptedFailure::Fault(details.into()));
        self
    }

    /// Sleep inside every pick-and-place to model physical motion time and
    /// widen race windows in concurrency tests.
    pub fn with_move_latency(mut self, latency: Duration) -> Self {
        self.move_latency = Some(latency);
        self
    }

    /// A shared handle to this arm's operation log.
    pub fn log(&self) -> ArmLog {
        self.log.clone()
    }

    /// Where the arm currently is.
    pub fn current_pose(&self) -> Pose {
        self.current
    }
}

impl ArmDriver for SimArm {
    fn id(&self) -> &str {
        &self.id
    }

    fn pick_and_place(&mut self, source: &Pose, destination: &Pose) -> MoveOutcome {
        self.attempts += 1;
        self.log.record(ArmOp::PickAndPlace {
            source: *source,
            destination: *destination,
        });
        if let Some(latency) = self.move_latency {
            std::thread::sleep(latency);
        }
        match self.failures.remove(&self.attempts) {
            Some(ScriptedFailure::Collision) => {
                self.collision = true;
                MoveOutcome::Collision
            }
            Some(ScriptedFailure::Fault(details)) => MoveOutcome::Fault(details),
            None => {
                self.current = *destination;
                MoveOutcome::Completed
            }
        }
    }

    fn move_home(&mut self) {
        self.log.record(ArmOp::Home);
        self.current = SIM_HOME_POSE;
    }

    fn collision_detected(&self) -> bool {
        self.collision
    }

    fn clear_collision(&mut self) {
        self.collision = false;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f64) -> Pose {
        Pose::from_components([x, 0.0, 0.13, 0.0, 1.57, 0.0])
    }

    #[test]
    fn scripted_detector_plays_frames_then_fails() {
        let mut det = SimDetector::scripted(
            "sim",
            vec![
                vec![Detection::new("Riesen", 1.0, 2.0)],
                vec![],
            ],
        );
        assert_eq!(det.detect().unwrap().len(), 1);
        assert_eq!(det.detect().unwrap().len(), 0);
        assert!(matches!(
            det.detect(),
            Err(CandyError::DetectorUnavailable { .. })
        ));
    }

    #[test]
    fn fixed_detector_repeats_its_frame() {
        let mut det = SimDetector::fixed("sim", table_fixture());
        for _ in 0..3 {
            assert_eq!(det.detect().unwrap().len(), 11);
        }
    }

    #[test]
    fn exhibition_detector_starts_with_corners() {
        let mut det = SimDetector::exhibition("sim");
        assert_eq!(det.detect().unwrap().len(), 4);
        assert_eq!(det.detect().unwrap().len(), 11);
        assert_eq!(det.detect().unwrap().len(), 11);
    }

    #[test]
    fn sim_arm_records_operations_in_order() {
        let mut arm = SimArm::new("ned2");
        let log = arm.log();
        assert_eq!(arm.pick_and_place(&pose(0.2), &pose(0.3)), MoveOutcome::Completed);
        arm.move_home();

        let ops = log.snapshot();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], ArmOp::PickAndPlace { .. }));
        assert_eq!(ops[1], ArmOp::Home);
        assert_eq!(arm.current_pose(), SIM_HOME_POSE);
    }

    #[test]
    fn scripted_collision_sets_flag_until_cleared() {
        let mut arm = SimArm::new("ned2").with_collision_on(1);
        assert_eq!(arm.pick_and_place(&pose(0.2), &pose(0.3)), MoveOutcome::Collision);
        assert!(arm.collision_detected());
        arm.clear_collision();
        assert!(!arm.collision_detected());
        // The failure script only covers the first attempt.
        assert_eq!(arm.pick_and_place(&pose(0.2), &pose(0.3)), MoveOutcome::Completed);
    }

    #[test]
    fn scripted_fault_reports_details_without_collision() {
        let mut arm = SimArm::new("ned2").with_fault_on(1, "gripper jammed");
        match arm.pick_and_place(&pose(0.2), &pose(0.3)) {
            MoveOutcome::Fault(details) => assert_eq!(details, "gripper jammed"),
            other => panic!("expected fault, got {other:?}"),
        }
        assert!(!arm.collision_detected());
    }

    #[test]
    fn completed_move_updates_current_pose() {
        let mut arm = SimArm::new("ned2");
        let dst = pose(0.3);
        arm.pick_and_place(&pose(0.2), &dst);
        assert_eq!(arm.current_pose(), dst);
    }
}
