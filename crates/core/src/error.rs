//! Error types for tqec-pack.

use crate::geometry::Axis;
use thiserror::Error;

/// Result type alias for tqec-pack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or compacting modules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The input document is missing fields or is structurally inconsistent.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A geometry operation was called with arguments that violate its contract.
    #[error("Invalid geometry operation: {0}")]
    InvalidGeometryOperation(String),

    /// A sequence-triple encoding could not be turned into coordinates.
    #[error("Infeasible placement: {0}")]
    InfeasiblePlacement(String),

    /// A quarter turn would move frame nodes off their parity lattice.
    #[error("Rotation of module {module} about {axis} rejected by parity check")]
    RotationRejected {
        /// Module that refused the rotation.
        module: i64,
        /// Requested rotation axis.
        axis: Axis,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Returns true for errors the search recovers from by rejecting the candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InfeasiblePlacement(_) | Error::RotationRejected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_variants() {
        assert!(Error::InfeasiblePlacement("cycle".into()).is_recoverable());
        assert!(Error::RotationRejected {
            module: 3,
            axis: Axis::Z
        }
        .is_recoverable());
        assert!(!Error::MalformedInput("missing id".into()).is_recoverable());
        assert!(!Error::ConfigError("cooling rate".into()).is_recoverable());
    }

    #[test]
    fn test_rotation_message() {
        let err = Error::RotationRejected {
            module: 7,
            axis: Axis::X,
        };
        assert_eq!(
            err.to_string(),
            "Rotation of module 7 about X rejected by parity check"
        );
    }
}
