//! Error types for kvhost core.

use crate::factory::ConstructionState;
use crate::platform::HostPlatform;
use crate::provider::UnsupportedReason;
use thiserror::Error;

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Result type for instance creation, generic over the engine's error.
pub type InstanceResult<T, E> = Result<T, InstanceError<E>>;

/// A caller-supplied configuration was rejected.
///
/// The caller recovers by fixing the input. Messages never contain key
/// material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The instance id was the empty string.
    #[error("instance id must not be empty")]
    EmptyId,

    /// The encryption key is longer than the engine accepts.
    #[error("encryption key is {len} bytes, at most {max} bytes are allowed")]
    EncryptionKeyTooLong {
        /// Key length in bytes.
        len: usize,
        /// Maximum allowed length in bytes.
        max: usize,
    },
}

/// No storage engine exists on this host.
///
/// Expected on some platforms (browser builds); treat it as a normal
/// branch rather than a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("storage engine unavailable on this host ({reason})")]
pub struct UnsupportedPlatformError {
    /// Why negotiation failed.
    pub reason: UnsupportedReason,
}

impl UnsupportedPlatformError {
    /// The capability that was missing.
    pub const CAPABILITY: &'static str = "storage engine";

    /// Creates an error for the given negotiation outcome.
    #[must_use]
    pub const fn new(reason: UnsupportedReason) -> Self {
        Self { reason }
    }

    /// Returns the name of the missing capability.
    #[must_use]
    pub const fn capability(&self) -> &'static str {
        Self::CAPABILITY
    }

    /// Returns the host platform negotiation ran on.
    #[must_use]
    pub const fn platform(&self) -> HostPlatform {
        self.reason.platform()
    }
}

/// A construction attempt was asked to take an edge its state machine
/// does not have. Indicates a bug, not bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal construction transition from {from} to {to}")]
pub struct InvalidTransition {
    /// State the attempt was in.
    pub from: ConstructionState,
    /// State that was requested.
    pub to: ConstructionState,
}

/// Errors from [`InstanceFactory`](crate::InstanceFactory).
///
/// Engine errors are carried as-is in [`InstanceError::Engine`] so callers
/// keep the engine's own diagnostics (corruption, permission, key mismatch).
#[derive(Debug, Error)]
pub enum InstanceError<E>
where
    E: std::error::Error + 'static,
{
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// No engine is available on this host.
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatformError),

    /// The engine failed to open the instance.
    #[error(transparent)]
    Engine(E),

    /// The construction state machine was driven along an illegal edge.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl<E> InstanceError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns true if creation failed because the host has no engine.
    #[must_use]
    pub fn is_unsupported_platform(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform(_))
    }

    /// Returns true if the configuration was rejected.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns the engine's error, if the engine failed.
    #[must_use]
    pub fn engine_error(&self) -> Option<&E> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }

    /// Unwraps the engine's error, if the engine failed.
    pub fn into_engine_error(self) -> Option<E> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn unsupported_names_capability() {
        let err = UnsupportedPlatformError::new(UnsupportedReason::NoNativeEngine {
            platform: HostPlatform::Browser,
        });
        assert_eq!(err.capability(), "storage engine");
        assert_eq!(err.platform(), HostPlatform::Browser);
        assert!(err
            .to_string()
            .starts_with("storage engine unavailable on this host"));
    }

    #[test]
    fn engine_error_is_transparent() {
        let inner = io::Error::new(io::ErrorKind::PermissionDenied, "no access to /data");
        let err: InstanceError<io::Error> = InstanceError::Engine(inner);

        assert_eq!(err.to_string(), "no access to /data");
        assert_eq!(
            err.engine_error().map(io::Error::kind),
            Some(io::ErrorKind::PermissionDenied)
        );
        assert!(!err.is_unsupported_platform());
    }

    #[test]
    fn configuration_error_converts() {
        let err: InstanceError<io::Error> = ConfigurationError::EmptyId.into();
        assert!(err.is_configuration());
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "invalid configuration: instance id must not be empty"
        );
    }
}
