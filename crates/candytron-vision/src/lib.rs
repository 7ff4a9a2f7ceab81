//! `candytron-vision` – table geometry and scene understanding.
//!
//! Turns four observed reference candies into a named grid of table
//! positions, and repeated noisy detector frames into a stable per-cell
//! occupancy map.
//!
//! # Modules
//!
//! - [`grid`] – [`CalibratedGrid`][grid::CalibratedGrid]: bilinear
//!   interpolation of cell centers from four corner observations, plus
//!   nearest-tag matching with a spacing-derived tolerance.
//! - [`scene`] – [`SceneResolver`][scene::SceneResolver]: samples the
//!   detector a fixed number of times and reduces the votes to one label per
//!   occupied cell.

pub mod grid;
pub mod scene;

pub use grid::CalibratedGrid;
pub use scene::{SceneResolver, SAMPLE_COUNT};
