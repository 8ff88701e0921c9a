//! Two-foot locomotion on top of `footfall-foot`.
//!
//! [`LocomotionRig`] owns a left and a right [`FootSolver`](footfall_foot::FootSolver),
//! feeds them speed-keyed step geometry from a [`GaitProfile`], and alternates
//! which foot updates first. [`CycledRig`] drives the same feet from pose
//! cyclers instead. Both return a [`RigReport`] per tick whose digest is
//! stable across identical runs.

pub mod gait;
pub mod config;
pub mod rig;
pub mod cycled;

pub use gait::{GaitProfile, GaitSample};
pub use config::{RigConfig, RigConfigError};
pub use rig::{LocomotionRig, RigReport, Side};
pub use cycled::{CycledGait, CycledRig};
