//! `candytron-motion` – serialized execution of physical arm moves.
//!
//! Exactly one background worker owns the arm driver and executes every
//! motion, strictly one at a time.  Two simultaneous motions on one physical
//! arm are a hazard, not merely a bug, so serialization is structural: the
//! worker is the only code that ever touches the driver.
//!
//! # Modules
//!
//! - [`sequencer`] – [`MotionSequencer`][sequencer::MotionSequencer]: a
//!   depth-1 mailbox in front of a dedicated worker thread, with collision
//!   recovery and a return-to-home policy after moves.

pub mod sequencer;

pub use sequencer::MotionSequencer;
