use core::fmt;

/// Errors reported when building a world or inserting a body.
///
/// Everything is validated up front; `step` itself cannot fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldError {
    /// A body description was rejected (bad size, mass, friction, or a non-finite pose).
    InvalidBody {
        /// What was wrong with the description
        reason: &'static str,
    },
    /// A configuration value is out of range.
    InvalidConfiguration {
        /// What was wrong with the configuration
        reason: &'static str,
    },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBody { reason } => write!(f, "invalid body: {reason}"),
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for WorldError {}
