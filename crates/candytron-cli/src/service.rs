//! `CandyService` – the tool-facing facade over the coordination core.
//!
//! Owns the detector, the current calibration, the pose store, and the
//! motion sequencer, and exposes the three operations the surrounding
//! system calls: calibrate, get the current scene, and move between two
//! named positions.  Library-level errors become plain booleans here; the
//! caller's recovery for a failed calibration is to retry, and a rejected
//! move needs no more detail than "not accepted".

use candytron_hal::ObjectDetector;
use candytron_motion::MotionSequencer;
use candytron_poses::PoseStore;
use candytron_types::{GridTag, SceneSnapshot};
use candytron_vision::{CalibratedGrid, SceneResolver};
use rand::seq::SliceRandom;
use tracing::{info, warn};

pub struct CandyService {
    detector: Box<dyn ObjectDetector>,
    resolver: SceneResolver,
    grid: Option<CalibratedGrid>,
    poses: PoseStore,
    sequencer: MotionSequencer,
}

impl CandyService {
    pub fn new(
        detector: Box<dyn ObjectDetector>,
        sequencer: MotionSequencer,
        poses: PoseStore,
    ) -> Self {
        Self {
            detector,
            resolver: SceneResolver::default(),
            grid: None,
            poses,
            sequencer,
        }
    }

    /// Calibrate the table grid from one detector sample.
    ///
    /// On failure the previous grid, if any, stays installed and `false` is
    /// returned; the caller retries.
    pub fn calibrate(&mut self, rows: u32, cols: u32) -> bool {
        let corners = self.resolver.resolve_once(self.detector.as_mut());
        match CalibratedGrid::from_corners(&corners, rows, cols) {
            Ok(grid) => {
                info!(
                    rows,
                    cols,
                    tolerance_sq = grid.match_tolerance_sq(),
                    "table grid calibrated"
                );
                self.grid = Some(grid);
                true
            }
            Err(e) => {
                warn!(error = %e, "calibration failed");
                false
            }
        }
    }

    /// Retry [`calibrate`][Self::calibrate] up to `attempts` times.
    pub fn calibrate_with_retries(&mut self, rows: u32, cols: u32, attempts: u32) -> bool {
        for _ in 0..attempts {
            if self.calibrate(rows, cols) {
                return true;
            }
        }
        false
    }

    pub fn is_calibrated(&self) -> bool {
        self.grid.is_some()
    }

    /// The current voted occupancy snapshot; empty before calibration.
    pub fn scene(&mut self) -> SceneSnapshot {
        match &self.grid {
            Some(grid) => self.resolver.resolve(self.detector.as_mut(), grid),
            None => {
                warn!("scene requested before calibration");
                SceneSnapshot::new()
            }
        }
    }

    /// Ask the sequencer to move an object between two named positions.
    /// `true` means the job was accepted, not that the move has completed.
    pub fn move_between(&self, src: &str, dst: &str) -> bool {
        match self.sequencer.move_between(&self.poses, src, dst) {
            Ok(()) => true,
            Err(e) => {
                warn!(src, dst, error = %e, "move rejected");
                false
            }
        }
    }

    /// Demonstrate the arm by moving a random occupied cell's candy to a
    /// random empty cell.  Returns the chosen pair, or `None` when the table
    /// has no occupied or no empty cell, or the move was rejected.
    pub fn demo_move(&mut self) -> Option<(GridTag, GridTag)> {
        let snapshot = self.scene();
        let grid = self.grid.as_ref()?;
        let occupied: Vec<GridTag> = snapshot.keys().copied().collect();
        let empty: Vec<GridTag> = grid
            .tags()
            .filter(|tag| !snapshot.contains_key(tag))
            .collect();

        let mut rng = rand::thread_rng();
        let src = occupied.choose(&mut rng).copied()?;
        let dst = empty.choose(&mut rng).copied()?;
        if self.move_between(&src.to_string(), &dst.to_string()) {
            Some((src, dst))
        } else {
            None
        }
    }

    /// Send the arm to its safe rest pose.
    pub fn move_home(&self) {
        self.sequencer.move_home();
    }

    /// Block until the arm worker has no job installed or executing.
    pub fn wait_until_idle(&self) {
        self.sequencer.wait_until_idle();
    }

    pub fn pose_store(&self) -> &PoseStore {
        &self.poses
    }
}
