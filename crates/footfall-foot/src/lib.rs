//! Terrain-aware placement for a single foot.
//!
//! [`FootSolver`] decides when a foot lifts, searches the terrain for a
//! foothold, swings the effector along an arc that steps over barriers, and
//! plants it with a ground check. It can also be driven by a pose cycler
//! (see [`FootSolver::step_cycled`]). Failures never abort a tick: they are
//! recorded in the foot's [`DiagnosticLedger`] and logged through `tracing`.

pub mod params;
pub mod config;
pub mod diag;
pub mod search;
pub mod solver;
pub mod swing;
pub mod cycled;

pub use params::{StepParameters, StepValues, STEP_PARAM_EPS};
pub use config::{FootConfig, GroundCheck};
pub use diag::{Diagnostic, DiagnosticEntry, DiagnosticLedger};
pub use search::{RankKey, SearchError, SearchFrame};
pub use solver::{FootContext, FootDebug, FootOutput, FootPhase, FootSolver, ROTATION_UPDATE_DEG, TURN_FORCE_DEG};
pub use swing::{arc_point, splice_origin};
