//! Scene resolution: repeated noisy detector samples reduced to one label
//! per occupied grid cell by majority vote.

use std::collections::BTreeMap;

use candytron_types::{Detection, GridTag, SceneSnapshot};
use candytron_hal::ObjectDetector;
use tracing::{debug, warn};

use crate::grid::CalibratedGrid;

/// Number of independent detector samples folded into one snapshot.
pub const SAMPLE_COUNT: usize = 5;

/// Reduces repeated detector frames to a stable [`SceneSnapshot`].
///
/// The resolver has no error return: a failed capture is logged and treated
/// as an empty sample.  Availability policy lives at the boundary; callers
/// choose a fixture detector for offline operation, and the resolver never
/// retries beyond its fixed voting pass.
pub struct SceneResolver {
    samples: usize,
}

impl Default for SceneResolver {
    fn default() -> Self {
        Self::new(SAMPLE_COUNT)
    }
}

impl SceneResolver {
    pub fn new(samples: usize) -> Self {
        Self { samples }
    }

    /// One raw detector sample; a capture failure yields an empty frame.
    pub fn resolve_once(&self, detector: &mut dyn ObjectDetector) -> Vec<Detection> {
        match detector.detect() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(detector = detector.id(), error = %e, "detection sample failed");
                Vec::new()
            }
        }
    }

    /// Sample the detector [`samples`](Self::new) times and vote each grid
    /// cell's label.
    ///
    /// Detections outside the tolerance of every cell are discarded.  Per
    /// cell the label with the most votes wins; on a tie the label first
    /// encountered during accumulation wins.  Cells with zero votes are
    /// absent from the snapshot.
    pub fn resolve(
        &self,
        detector: &mut dyn ObjectDetector,
        grid: &CalibratedGrid,
    ) -> SceneSnapshot {
        // Per tag, vote counts in first-encountered label order.
        let mut votes: BTreeMap<GridTag, Vec<(String, u32)>> = BTreeMap::new();
        for _ in 0..self.samples {
            for det in self.resolve_once(detector) {
                let Some(tag) = grid.nearest_tag(det.x, det.y) else {
                    continue;
                };
                let tally = votes.entry(tag).or_default();
                match tally.iter_mut().find(|(label, _)| *label == det.label) {
                    Some((_, count)) => *count += 1,
                    None => tally.push((det.label, 1)),
                }
            }
        }

        let mut snapshot = SceneSnapshot::new();
        for (tag, tally) in votes {
            let mut winner: Option<(String, u32)> = None;
            for (label, count) in tally {
                match &winner {
                    Some((_, best)) if count <= *best => {}
                    _ => winner = Some((label, count)),
                }
            }
            if let Some((label, count)) = winner {
                debug!(tag = %tag, label = %label, votes = count, "cell resolved");
                snapshot.insert(tag, label);
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candytron_hal::sim::SimDetector;

    fn rect_grid() -> CalibratedGrid {
        let corners = vec![
            Detection::new("Refreshers", 300.0, 0.0),
            Detection::new("Riesen", 300.0, 400.0),
            Detection::new("Plopp", 0.0, 0.0),
            Detection::new("Pearnut", 0.0, 400.0),
        ];
        CalibratedGrid::from_corners(&corners, 3, 4).unwrap()
    }

    fn at_a1(label: &str) -> Detection {
        Detection::new(label, 5.0, 395.0)
    }

    #[test]
    fn majority_vote_assigns_the_most_seen_label() {
        let grid = rect_grid();
        let frames = vec![
            vec![at_a1("Riesen")],
            vec![at_a1("Riesen")],
            vec![at_a1("Plopp")],
            vec![at_a1("Riesen")],
            vec![at_a1("Plopp")],
        ];
        let mut det = SimDetector::scripted("sim", frames);
        let scene = SceneResolver::default().resolve(&mut det, &grid);
        assert_eq!(scene.get(&"A1".parse().unwrap()).map(String::as_str), Some("Riesen"));
    }

    #[test]
    fn vote_tie_keeps_the_first_encountered_label() {
        let grid = rect_grid();
        let frames = vec![
            vec![at_a1("Riesen")],
            vec![at_a1("Plopp")],
            vec![at_a1("Riesen")],
            vec![at_a1("Plopp")],
            vec![],
        ];
        let mut det = SimDetector::scripted("sim", frames);
        let scene = SceneResolver::default().resolve(&mut det, &grid);
        assert_eq!(scene.get(&"A1".parse().unwrap()).map(String::as_str), Some("Riesen"));
    }

    #[test]
    fn zero_vote_cells_are_absent() {
        let grid = rect_grid();
        let frames = vec![vec![at_a1("Riesen")], vec![], vec![], vec![], vec![]];
        let mut det = SimDetector::scripted("sim", frames);
        let scene = SceneResolver::default().resolve(&mut det, &grid);
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains_key(&"B1".parse().unwrap()));
    }

    #[test]
    fn detections_outside_every_tolerance_are_discarded() {
        let grid = rect_grid();
        // Midway between A1 and B1, and far off the table entirely.
        let stray = vec![
            Detection::new("Geisha", 50.0, 400.0),
            Detection::new("Geisha", 900.0, 900.0),
        ];
        let frames = vec![stray.clone(), stray.clone(), stray.clone(), stray.clone(), stray];
        let mut det = SimDetector::scripted("sim", frames);
        let scene = SceneResolver::default().resolve(&mut det, &grid);
        assert!(scene.is_empty());
    }

    #[test]
    fn capture_failures_count_as_empty_samples() {
        let grid = rect_grid();
        // Two good frames, then the script runs dry and detect() errors.
        let frames = vec![vec![at_a1("Riesen")], vec![at_a1("Riesen")]];
        let mut det = SimDetector::scripted("sim", frames);
        let scene = SceneResolver::default().resolve(&mut det, &grid);
        assert_eq!(scene.get(&"A1".parse().unwrap()).map(String::as_str), Some("Riesen"));
    }

    #[test]
    fn resolve_once_swallows_detector_errors() {
        let mut det = SimDetector::scripted("sim", vec![]);
        let frame = SceneResolver::default().resolve_once(&mut det);
        assert!(frame.is_empty());
    }

    #[test]
    fn snapshot_is_rebuilt_from_scratch_each_pass() {
        let grid = rect_grid();
        let mut det = SimDetector::scripted(
            "sim",
            vec![
                // First pass sees A1 occupied, second pass sees nothing.
                vec![at_a1("Riesen")],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
            ],
        );
        let resolver = SceneResolver::default();
        let first = resolver.resolve(&mut det, &grid);
        assert_eq!(first.len(), 1);
        let second = resolver.resolve(&mut det, &grid);
        assert!(second.is_empty(), "stale entries must not survive a pass");
    }
}
