//! Wire protocol between the client and the remote sync service.
//!
//! One exchange per session: the client posts its manifest (and, when
//! pushing, its signatures) as form fields; the remote answers with JSON.

pub mod change;
pub mod encoding;
pub mod request;
pub mod response;

pub use change::{ChangeKind, ChangeOperation};
pub use request::{SignatureMap, SyncRequest};
pub use response::parse_response;

use crate::utils::ValidationError;
use std::fmt;
use std::str::FromStr;

/// Which side of the sync receives changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Remote to local (`f`)
    #[default]
    Pull,
    /// Local to remote (`b`)
    Push,
}

impl Direction {
    pub fn as_wire(self) -> &'static str {
        match self {
            Direction::Pull => "f",
            Direction::Push => "b",
        }
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f" => Ok(Direction::Pull),
            "b" => Ok(Direction::Push),
            other => Err(ValidationError::Direction(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Pull => write!(f, "pull"),
            Direction::Push => write!(f, "push"),
        }
    }
}
