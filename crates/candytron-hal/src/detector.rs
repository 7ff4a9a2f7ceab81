//! Generic `ObjectDetector` trait for scene-sampling vision hardware.

use candytron_types::{CandyError, Detection};

/// A vision pipeline that samples the table and reports what it sees.
///
/// Centroid coordinates are in the same image-pixel space used for grid
/// calibration.  The label vocabulary is open and detector-defined.
pub trait ObjectDetector: Send + Sync {
    /// Stable identifier for this detector, e.g. `"table_yolo"`.
    fn id(&self) -> &str;

    /// Capture one frame and return every detection in it, unordered.
    ///
    /// # Errors
    ///
    /// Returns [`CandyError::DetectorUnavailable`] when a frame cannot be
    /// captured (device disconnected, inference pipeline down).
    fn detect(&mut self) -> Result<Vec<Detection>, CandyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDetector {
        id: String,
    }

    impl ObjectDetector for MockDetector {
        fn id(&self) -> &str {
            &self.id
        }

        fn detect(&mut self) -> Result<Vec<Detection>, CandyError> {
            Ok(vec![Detection::new("Riesen", 12.0, 34.0)])
        }
    }

    #[test]
    fn mock_detector_detects() {
        let mut det = MockDetector {
            id: "table_yolo".to_string(),
        };
        assert_eq!(det.id(), "table_yolo");
        let frame = det.detect().unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].label, "Riesen");
    }
}
