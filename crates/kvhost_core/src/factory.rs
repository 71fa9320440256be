//! Storage instance construction.
//!
//! Every construction attempt walks a small state machine:
//!
//! ```text
//! Uninitialized -> Validating -> Negotiating -> Ready
//!                       |             |
//!                       +--> Failed <-+
//! ```
//!
//! `Ready` and `Failed` are terminal. A new attempt always starts over at
//! `Uninitialized`; nothing is cached between attempts and nothing is
//! retried.

use crate::config::{Configuration, NormalizedConfiguration};
use crate::engine::{OpenRequest, StorageEngine};
use crate::error::{InstanceError, InstanceResult, InvalidTransition, UnsupportedPlatformError};
use crate::provider::{EngineProvider, EngineSupport};
use std::fmt;
use tracing::{debug, trace, warn};

/// Handle type produced by a provider's engine.
pub type ProvidedHandle<P> = <<P as EngineProvider>::Engine as StorageEngine>::Handle;

/// Error type produced by a provider's engine.
pub type ProvidedError<P> = <<P as EngineProvider>::Engine as StorageEngine>::Error;

/// State of one construction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionState {
    /// Nothing has happened yet.
    Uninitialized,
    /// The configuration is being validated.
    Validating,
    /// An engine is being negotiated and opened.
    Negotiating,
    /// The instance handle was produced.
    Ready,
    /// The attempt failed.
    Failed,
}

impl ConstructionState {
    /// Returns true for `Ready` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Returns true if `next` may follow `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Validating)
                | (Self::Validating, Self::Negotiating | Self::Failed)
                | (Self::Negotiating, Self::Ready | Self::Failed)
        )
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Validating => "validating",
            Self::Negotiating => "negotiating",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConstructionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The path one construction attempt took through [`ConstructionState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionAttempt {
    history: Vec<ConstructionState>,
}

impl ConstructionAttempt {
    /// Starts a fresh attempt in `Uninitialized`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![ConstructionState::Uninitialized],
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ConstructionState {
        self.history
            .last()
            .copied()
            .unwrap_or(ConstructionState::Uninitialized)
    }

    /// Returns every state visited, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ConstructionState] {
        &self.history
    }

    /// Returns true if the attempt produced a handle.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == ConstructionState::Ready
    }

    /// Returns true if the attempt failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state() == ConstructionState::Failed
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] if the edge is not part of the state
    /// machine; the attempt is left unchanged.
    pub fn advance(&mut self, next: ConstructionState) -> Result<(), InvalidTransition> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(InvalidTransition {
                from: current,
                to: next,
            });
        }
        trace!(from = %current, to = %next, "construction state transition");
        self.history.push(next);
        Ok(())
    }
}

impl Default for ConstructionAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds storage instances from configurations.
///
/// # Example
///
/// ```rust,ignore
/// use kvhost_core::{Configuration, InstanceFactory, PlatformEngineProvider};
///
/// let factory = InstanceFactory::new(PlatformEngineProvider::detect(engine));
/// if !factory.is_supported() {
///     // fall back before touching storage
/// }
/// let storage = factory.create(Configuration::new().with_id("global-app-storage"))?;
/// ```
#[derive(Debug)]
pub struct InstanceFactory<P> {
    provider: P,
}

impl<P: EngineProvider> InstanceFactory<P> {
    /// Creates a factory backed by `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns true if the provider currently negotiates an engine.
    pub fn is_supported(&self) -> bool {
        is_storage_supported(&self.provider)
    }

    /// Validates `config`, negotiates an engine and opens the instance.
    ///
    /// # Errors
    ///
    /// - [`InstanceError::Configuration`] if validation fails; no engine
    ///   call is made
    /// - [`InstanceError::UnsupportedPlatform`] if negotiation fails; no
    ///   engine call is made
    /// - [`InstanceError::Engine`] with the engine's error if opening fails
    pub fn create(
        &self,
        config: Configuration,
    ) -> InstanceResult<ProvidedHandle<P>, ProvidedError<P>> {
        self.create_traced(config).1
    }

    /// Like [`create`](Self::create), also returning the states visited.
    pub fn create_traced(
        &self,
        config: Configuration,
    ) -> (
        ConstructionAttempt,
        InstanceResult<ProvidedHandle<P>, ProvidedError<P>>,
    ) {
        let mut attempt = ConstructionAttempt::new();
        let result = self.construct(&mut attempt, config);
        (attempt, result)
    }

    /// Opens an instance for a configuration validated earlier.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create), minus validation failures.
    pub fn create_normalized(
        &self,
        config: &NormalizedConfiguration,
    ) -> InstanceResult<ProvidedHandle<P>, ProvidedError<P>> {
        let mut attempt = ConstructionAttempt::new();
        attempt.advance(ConstructionState::Validating)?;
        self.open(&mut attempt, config)
    }

    fn construct(
        &self,
        attempt: &mut ConstructionAttempt,
        config: Configuration,
    ) -> InstanceResult<ProvidedHandle<P>, ProvidedError<P>> {
        attempt.advance(ConstructionState::Validating)?;
        let config = match config.validate() {
            Ok(config) => config,
            Err(err) => {
                attempt.advance(ConstructionState::Failed)?;
                return Err(err.into());
            }
        };
        self.open(attempt, &config)
    }

    fn open(
        &self,
        attempt: &mut ConstructionAttempt,
        config: &NormalizedConfiguration,
    ) -> InstanceResult<ProvidedHandle<P>, ProvidedError<P>> {
        attempt.advance(ConstructionState::Negotiating)?;
        let instance = config.instance_key();

        let capability = match self.provider.negotiate() {
            EngineSupport::Supported(capability) => capability,
            EngineSupport::Unsupported(reason) => {
                attempt.advance(ConstructionState::Failed)?;
                warn!(%instance, %reason, "storage engine unavailable");
                return Err(UnsupportedPlatformError::new(reason).into());
            }
        };

        match capability.open_instance(&OpenRequest::new(config)) {
            Ok(handle) => {
                attempt.advance(ConstructionState::Ready)?;
                debug!(
                    %instance,
                    mode = %config.mode(),
                    encrypted = config.is_encrypted(),
                    read_only = config.read_only(),
                    "storage instance ready"
                );
                Ok(handle)
            }
            Err(err) => {
                attempt.advance(ConstructionState::Failed)?;
                debug!(%instance, error = %err, "engine failed to open instance");
                Err(InstanceError::Engine(err))
            }
        }
    }
}

/// Returns true if `provider` negotiates an engine.
///
/// Lets callers on restricted hosts branch before any storage call.
pub fn is_storage_supported<P: EngineProvider>(provider: &P) -> bool {
    provider.negotiate().is_supported()
}
