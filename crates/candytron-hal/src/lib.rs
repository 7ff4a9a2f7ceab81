//! `candytron-hal` – Hardware Abstraction Layer.
//!
//! The two capability boundaries the coordination core talks through.
//! Production drivers (a YOLO-backed camera pipeline, the Niryo Ned2 client)
//! live outside this repository; everything here is the trait surface plus
//! simulation drivers for headless runs and tests.
//!
//! # Modules
//!
//! - [`detector`] – [`ObjectDetector`][detector::ObjectDetector]: samples the
//!   scene and returns labelled centroids in image-pixel coordinates.
//! - [`arm`] – [`ArmDriver`][arm::ArmDriver]: pick-and-place and home moves
//!   with a collision flag, reporting each move as a tagged
//!   [`MoveOutcome`][arm::MoveOutcome].
//! - [`sim`] – [`SimDetector`][sim::SimDetector] and [`SimArm`][sim::SimArm]:
//!   scriptable stand-ins that replay canned exhibition frames and record
//!   every arm operation for assertions.

pub mod arm;
pub mod detector;
pub mod sim;

pub use arm::{ArmDriver, MoveOutcome};
pub use detector::ObjectDetector;
