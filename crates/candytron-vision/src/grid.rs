//! Grid calibration from four observed corner candies.
//!
//! The operator places one candy in each corner of the working area; the
//! detector reports their centroids, and [`CalibratedGrid::from_corners`]
//! interpolates every cell center between them.  Image y grows downward
//! while row numbers grow upward on the table, so the corner with the
//! smaller y within a left/right pair is the *top* corner.

use std::collections::BTreeMap;

use candytron_types::{CandyError, Detection, GridTag};
use tracing::debug;

/// A named lookup table of cell centers, built once per calibration run.
///
/// Replaced wholesale on recalibration, never mutated cell by cell; a reader
/// holding a previous grid keeps seeing a fully consistent snapshot.
#[derive(Debug, Clone)]
pub struct CalibratedGrid {
    rows: u32,
    cols: u32,
    positions: BTreeMap<GridTag, (f64, f64)>,
    match_tolerance_sq: f64,
}

impl CalibratedGrid {
    /// Interpolate a `rows x cols` grid from exactly four corner detections.
    ///
    /// The corners may arrive in any order: the two smallest x coordinates
    /// form the left pair and the remaining two the right pair, and within
    /// each pair the smaller y is the top corner.
    ///
    /// # Errors
    ///
    /// - [`CandyError::WrongObservationCount`] unless exactly 4 corners are given.
    /// - [`CandyError::DegenerateGrid`] when either dimension is below 2.
    /// - [`CandyError::TooManyColumns`] when `cols` exceeds the `A`-`Z` alphabet.
    /// - [`CandyError::DegenerateCorners`] when two corners share an image location.
    pub fn from_corners(
        corners: &[Detection],
        rows: u32,
        cols: u32,
    ) -> Result<Self, CandyError> {
        if corners.len() != 4 {
            return Err(CandyError::WrongObservationCount {
                count: corners.len(),
            });
        }
        if rows < 2 || cols < 2 {
            return Err(CandyError::DegenerateGrid { rows, cols });
        }
        if cols > 26 {
            return Err(CandyError::TooManyColumns { cols });
        }

        let mut pts: Vec<(f64, f64)> = corners.iter().map(|d| (d.x, d.y)).collect();
        for a in 0..pts.len() {
            for b in (a + 1)..pts.len() {
                if (pts[a].0 - pts[b].0).abs() < f64::EPSILON
                    && (pts[a].1 - pts[b].1).abs() < f64::EPSILON
                {
                    return Err(CandyError::DegenerateCorners);
                }
            }
        }

        pts.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (tl, bl) = order_pair(pts[0], pts[1]);
        let (tr, br) = order_pair(pts[2], pts[3]);

        let rn = (rows - 1) as f64;
        let cn = (cols - 1) as f64;
        let mut positions = BTreeMap::new();
        for i in 0..rows {
            for j in 0..cols {
                let wt = i as f64;
                let wb = rn - wt;
                let wr = j as f64;
                let wl = cn - wr;
                let x = (bl.0 * wb * wl + br.0 * wb * wr + tl.0 * wt * wl + tr.0 * wt * wr)
                    / (rn * cn);
                let y = (bl.1 * wb * wl + br.1 * wb * wr + tl.1 * wt * wl + tr.1 * wt * wr)
                    / (rn * cn);
                positions.insert(GridTag::new(j as u8, i + 1), (x, y));
            }
        }

        // Matching radius is half the tighter of the two average cell
        // spacings, so a detection roughly between two cells matches neither.
        let col_spacing = ((tr.0 + br.0) - (tl.0 + bl.0)) / 2.0 / cn;
        let row_spacing = ((bl.1 + br.1) - (tl.1 + tr.1)) / 2.0 / rn;
        let radius = col_spacing.min(row_spacing) / 2.0;
        let match_tolerance_sq = radius * radius;

        debug!(
            rows,
            cols,
            cells = positions.len(),
            tolerance_sq = match_tolerance_sq,
            "grid calibrated"
        );

        Ok(Self {
            rows,
            cols,
            positions,
            match_tolerance_sq,
        })
    }

    /// The tag whose cell center is closest to `(x, y)` and strictly within
    /// the matching tolerance, or `None` when no cell qualifies.
    pub fn nearest_tag(&self, x: f64, y: f64) -> Option<GridTag> {
        let mut best = self.match_tolerance_sq;
        let mut found = None;
        for (tag, &(px, py)) in &self.positions {
            let dist_sq = (px - x).powi(2) + (py - y).powi(2);
            if dist_sq < best {
                best = dist_sq;
                found = Some(*tag);
            }
        }
        found
    }

    /// Center coordinates of `tag`, if it belongs to this grid.
    pub fn position(&self, tag: &GridTag) -> Option<(f64, f64)> {
        self.positions.get(tag).copied()
    }

    /// Every tag of this grid in column-major order.
    pub fn tags(&self) -> impl Iterator<Item = GridTag> + '_ {
        self.positions.keys().copied()
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Squared matching radius used by [`nearest_tag`][Self::nearest_tag].
    pub fn match_tolerance_sq(&self) -> f64 {
        self.match_tolerance_sq
    }
}

/// Split a left or right corner pair into `(top, bottom)` by image y.
fn order_pair(a: (f64, f64), b: (f64, f64)) -> ((f64, f64), (f64, f64)) {
    if a.1 < b.1 { (a, b) } else { (b, a) }
}
