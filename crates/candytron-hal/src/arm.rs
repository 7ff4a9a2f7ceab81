//! Generic `ArmDriver` trait for the physical pick-and-place arm.
//!
//! The motion sequencer owns exactly one boxed driver and is the only caller;
//! the trait therefore only needs `Send`, not `Sync`.

use candytron_types::Pose;

/// How a single pick-and-place attempt ended.
///
/// Collision is a first-class outcome rather than a generic fault because it
/// is the one condition with a dedicated recovery path: clear the flag, then
/// return to the home pose.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The object was picked and placed.
    Completed,
    /// The arm hit something mid-move; the driver's collision flag is set.
    Collision,
    /// Any other driver-level failure, with the driver's own description.
    Fault(String),
}

/// A pick-and-place robot arm.
pub trait ArmDriver: Send {
    /// Stable identifier for this arm, e.g. `"ned2"`.
    fn id(&self) -> &str;

    /// Pick the object at `source` and place it at `destination`.
    ///
    /// Blocks for the physical duration of the motion.  Not cancellable; the
    /// only recovery primitive after a [`MoveOutcome::Collision`] is
    /// [`clear_collision`][Self::clear_collision] followed by
    /// [`move_home`][Self::move_home].
    fn pick_and_place(&mut self, source: &Pose, destination: &Pose) -> MoveOutcome;

    /// Move the arm to its fixed safe rest pose.
    fn move_home(&mut self);

    /// Whether the driver's collision flag is currently set.
    fn collision_detected(&self) -> bool;

    /// Clear the collision flag so the arm accepts motion commands again.
    fn clear_collision(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use candytron_types::Pose;

    struct MockArm {
        id: String,
        moves: u32,
        collision: bool,
    }

    impl ArmDriver for MockArm {
        fn id(&self) -> &str {
            &self.id
        }

        fn pick_and_place(&mut self, _source: &Pose, _destination: &Pose) -> MoveOutcome {
            self.moves += 1;
            MoveOutcome::Completed
        }

        fn move_home(&mut self) {}

        fn collision_detected(&self) -> bool {
            self.collision
        }

        fn clear_collision(&mut self) {
            self.collision = false;
        }
    }

    #[test]
    fn mock_arm_completes_moves() {
        let mut arm = MockArm {
            id: "ned2".to_string(),
            moves: 0,
            collision: false,
        };
        let a = Pose::from_components([0.2, 0.1, 0.13, 0.0, 1.57, 0.0]);
        let b = Pose::from_components([0.3, -0.1, 0.13, 0.0, 1.57, 0.0]);
        assert_eq!(arm.pick_and_place(&a, &b), MoveOutcome::Completed);
        assert_eq!(arm.moves, 1);
        assert!(!arm.collision_detected());
    }
}
