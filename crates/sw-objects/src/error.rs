//! Tree/object errors (spec §4.1, §7), hand-written in the journal/uplink
//! style used by the lower half of this workspace.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No factory is registered for the requested `ObjectCode`.
    FactoryMiss(String),
    /// The registered type's declared parent code doesn't match the
    /// location being created at.
    ParentMismatch { expected: Option<String>, actual: Option<String> },
    /// A non-obsolete sibling already occupies this `(ObjectCode, id)` slot.
    DuplicateId { object_code: String, id: String },
    /// `rename` target collides with a live (non-obsolete) sibling.
    RenameConflict { object_code: String, new_id: String },
    /// Operation referenced a `NodeId` that no longer exists in the arena.
    NotFound,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::FactoryMiss(code) => write!(f, "no factory registered for object code {code:?}"),
            TreeError::ParentMismatch { expected, actual } => write!(
                f,
                "parent code mismatch: type declares {expected:?}, tree location is {actual:?}"
            ),
            TreeError::DuplicateId { object_code, id } => {
                write!(f, "duplicate sibling id {id:?} for object code {object_code:?}")
            }
            TreeError::RenameConflict { object_code, new_id } => {
                write!(f, "rename target {new_id:?} already live for object code {object_code:?}")
            }
            TreeError::NotFound => write!(f, "object not found in tree"),
        }
    }
}

impl std::error::Error for TreeError {}
