use thiserror::Error;
use crate::pose::Space;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoseError {
    #[error("cannot convert a {from:?} pose to {to:?} space without a space anchor")]
    NoSpaceAnchor { from: Space, to: Space },
    #[error("cannot blend a {lhs:?} pose with a {rhs:?} pose without a space anchor")]
    IncompatibleSpaces { lhs: Space, rhs: Space },
}
