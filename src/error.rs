//! Error types
//!
//! Invalid input is rejected at the control surface so the physics step
//! never sees a value that would turn the state non-finite.

use thiserror::Error;

/// Result alias for fallible simulation operations
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// NaN or infinity supplied for a parameter
    #[error("{parameter} must be a finite number")]
    NonFinite { parameter: &'static str },

    /// Finite value outside the physically meaningful range
    #[error("{parameter} = {value} is out of range (expected {expected})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("unknown display mode '{0}'")]
    UnknownDisplayMode(String),

    /// The host refused a frame request
    #[error("frame scheduling failed: {0}")]
    Host(String),

    /// Settings document could not be parsed
    #[error("invalid settings: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_parameter() {
        let err = SimError::OutOfRange {
            parameter: "mass",
            value: -1.0,
            expected: "> 0",
        };
        assert_eq!(err.to_string(), "mass = -1 is out of range (expected > 0)");

        let err = SimError::NonFinite { parameter: "angle" };
        assert_eq!(err.to_string(), "angle must be a finite number");
    }

    #[test]
    fn test_config_error_from_json() {
        let err: SimError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SimError::Config(_)));
    }
}
