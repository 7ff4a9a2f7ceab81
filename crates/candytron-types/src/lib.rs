use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of one cell in the calibrated table grid, e.g. `B3`.
///
/// The column letter is assigned left to right in image space (`A`, `B`, …)
/// and the row number bottom to top (`1`, `2`, …).  Image y grows downward,
/// so row 1 is the row with the *largest* y coordinate.
///
/// Tags order column-major (`A1, A2, …, B1, …`) so listings group by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridTag {
    col: u8,
    row: u32,
}

impl GridTag {
    /// Build a tag from a zero-based column index and a one-based row number.
    pub fn new(col: u8, row: u32) -> Self {
        debug_assert!(col < 26, "column index beyond the A-Z alphabet");
        debug_assert!(row >= 1, "row numbers start at 1");
        Self { col, row }
    }

    /// Zero-based column index (`A` = 0).
    pub fn col(&self) -> u8 {
        self.col
    }

    /// One-based row number.
    pub fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for GridTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.col) as char, self.row)
    }
}

impl FromStr for GridTag {
    type Err = CandyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || CandyError::InvalidTag { raw: raw.to_string() };
        let mut chars = raw.chars();
        let col = match chars.next() {
            Some(c @ 'A'..='Z') => c as u8 - b'A',
            _ => return Err(invalid()),
        };
        let row: u32 = chars.as_str().parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(Self { col, row })
    }
}

// Tags serialize as their display form ("B3") so they can key snapshot maps
// in structured logs and wire formats.
impl Serialize for GridTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GridTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One raw object detection in image-pixel coordinates.
///
/// Produced by an object-detector driver and consumed immediately by the
/// scene resolver; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector-defined category, e.g. `"Riesen"`.  Open vocabulary.
    pub label: String,
    /// Bounding-box center x in pixels.
    pub x: f64,
    /// Bounding-box center y in pixels.
    pub y: f64,
}

impl Detection {
    pub fn new(label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y,
        }
    }
}

/// The voted occupancy state of the table: one label per occupied grid cell.
///
/// Rebuilt from scratch on every resolution pass.  Cells that received no
/// votes are absent from the map, not present with an empty value.
pub type SceneSnapshot = BTreeMap<GridTag, String>;

/// Six-component rigid-body pose: position in meters, orientation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Pose {
    /// Build a pose from `[x, y, z, roll, pitch, yaw]`.
    pub fn from_components(c: [f64; 6]) -> Self {
        Self {
            x: c[0],
            y: c[1],
            z: c[2],
            roll: c[3],
            pitch: c[4],
            yaw: c[5],
        }
    }

    /// The pose as `[x, y, z, roll, pitch, yaw]`, the persisted layout.
    pub fn components(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.roll, self.pitch, self.yaw]
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose(x={:.4}, y={:.4}, z={:.4}, roll={:.3}, pitch={:.3}, yaw={:.3})",
            self.x, self.y, self.z, self.roll, self.pitch, self.yaw
        )
    }
}

/// The arm operation a [`MotionJob`] asks the worker to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MotionOp {
    /// Move the arm to its fixed safe rest pose.
    Home,
    /// Pick the object at `source` and place it at `destination`.
    Move {
        source: Pose,
        destination: Pose,
        /// Issue a home move after the pick-and-place completes.  Collision
        /// recovery forces a home move regardless of this flag.
        return_home_after: bool,
    },
}

/// A unit of arm work submitted to the single-job motion sequencer.
///
/// The id and submission timestamp correlate worker log lines with the
/// submitting call site.  Ownership of an executing job belongs exclusively
/// to the worker; the submitter never retains it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionJob {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub op: MotionOp,
}

impl MotionJob {
    /// A job that returns the arm to its home pose.
    pub fn home() -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            op: MotionOp::Home,
        }
    }

    /// A pick-and-place job between two resolved poses.
    pub fn pick_and_place(source: Pose, destination: Pose, return_home_after: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            op: MotionOp::Move {
                source,
                destination,
                return_home_after,
            },
        }
    }
}

/// Global error type spanning calibration geometry, pose resolution, and
/// hardware driver failures.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum CandyError {
    #[error("Calibration expects exactly 4 corner observations, got {count}")]
    WrongObservationCount { count: usize },

    #[error("A {rows}x{cols} grid cannot be interpolated from 4 corners; both dimensions must be at least 2")]
    DegenerateGrid { rows: u32, cols: u32 },

    #[error("Corner observations must be at 4 distinct image locations")]
    DegenerateCorners,

    #[error("{cols} columns exceed the A-Z tag alphabet")]
    TooManyColumns { cols: u32 },

    #[error("Invalid grid tag '{raw}'")]
    InvalidTag { raw: String },

    #[error("No pose known for '{name}'")]
    UnresolvedTag { name: String },

    #[error("Arm driver fault: {details}")]
    DriverFault { details: String },

    #[error("Object detector unavailable: {details}")]
    DetectorUnavailable { details: String },

    #[error("Pose store failure: {details}")]
    PoseStore { details: String },
}
