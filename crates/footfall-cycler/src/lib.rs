pub mod error;
pub mod cycle;
pub mod pose_cycler;
pub mod multi;
pub mod meld;

pub use error::CyclerError;
pub use cycle::{Cycle, wrap01};
pub use pose_cycler::{PoseCycler, PoseCyclerDesc};
pub use multi::MultiPoseCycler;
pub use meld::CyclerMeld;
