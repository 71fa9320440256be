//! Engine capability negotiation.
//!
//! An [`EngineProvider`] answers one question: can a storage engine be used
//! on this host? The answer is an [`EngineSupport`] value, never a panic
//! and never a null handle. Negotiation opens nothing and allocates no
//! files, so it can be repeated and its result thrown away.

use crate::engine::{OpenRequest, StorageEngine};
use crate::error::UnsupportedPlatformError;
use crate::platform::HostPlatform;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Why no engine is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// The host cannot run a native engine at all (browser builds).
    NoNativeEngine {
        /// The host platform.
        platform: HostPlatform,
    },
    /// An engine is linked in but reported that it cannot run here.
    ProbeFailed {
        /// The host platform.
        platform: HostPlatform,
    },
}

impl UnsupportedReason {
    /// Returns the platform negotiation ran on.
    #[must_use]
    pub const fn platform(&self) -> HostPlatform {
        match self {
            Self::NoNativeEngine { platform } | Self::ProbeFailed { platform } => *platform,
        }
    }
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNativeEngine { platform } => {
                write!(f, "no native engine exists on {platform}")
            }
            Self::ProbeFailed { platform } => {
                write!(f, "engine support probe failed on {platform}")
            }
        }
    }
}

/// Proof that an engine is usable on this host.
///
/// Only obtainable from a successful negotiation; it is the only way to
/// reach [`StorageEngine::open_instance`] through this crate.
pub struct EngineCapability<E> {
    engine: Arc<E>,
}

impl<E: StorageEngine> EngineCapability<E> {
    pub(crate) fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Opens an instance on the negotiated engine.
    ///
    /// # Errors
    ///
    /// Returns the engine's error unchanged.
    pub fn open_instance(&self, request: &OpenRequest<'_>) -> Result<E::Handle, E::Error> {
        self.engine.open_instance(request)
    }
}

impl<E> Clone for EngineCapability<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E> fmt::Debug for EngineCapability<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineCapability").finish_non_exhaustive()
    }
}

/// Outcome of capability negotiation.
pub enum EngineSupport<E> {
    /// An engine is available.
    Supported(EngineCapability<E>),
    /// No engine is available; callers should take their fallback path.
    Unsupported(UnsupportedReason),
}

impl<E> EngineSupport<E> {
    /// Returns true if an engine is available.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    /// Returns the reason, if unsupported.
    #[must_use]
    pub fn unsupported_reason(&self) -> Option<UnsupportedReason> {
        match self {
            Self::Supported(_) => None,
            Self::Unsupported(reason) => Some(*reason),
        }
    }

    /// Converts into a `Result`, naming the missing capability on failure.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedPlatformError`] if no engine is available.
    pub fn into_result(self) -> Result<EngineCapability<E>, UnsupportedPlatformError> {
        match self {
            Self::Supported(capability) => Ok(capability),
            Self::Unsupported(reason) => Err(UnsupportedPlatformError::new(reason)),
        }
    }
}

impl<E> fmt::Debug for EngineSupport<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supported(capability) => f.debug_tuple("Supported").field(capability).finish(),
            Self::Unsupported(reason) => f.debug_tuple("Unsupported").field(reason).finish(),
        }
    }
}

/// Negotiates access to a storage engine for the current host.
///
/// Implementations must be total and side-effect free: no partial
/// initialization, no file allocation.
pub trait EngineProvider {
    /// The engine handed out on success.
    type Engine: StorageEngine;

    /// Determines whether an engine is available.
    fn negotiate(&self) -> EngineSupport<Self::Engine>;
}

/// Provider for native builds that link an engine.
///
/// Browser hosts are rejected without asking the engine anything; native
/// hosts are supported when [`StorageEngine::probe_support`] says so.
pub struct PlatformEngineProvider<E> {
    engine: Arc<E>,
    platform: HostPlatform,
}

impl<E: StorageEngine> PlatformEngineProvider<E> {
    /// Creates a provider for the platform this crate was compiled for.
    pub fn detect(engine: E) -> Self {
        Self::from_shared(Arc::new(engine), HostPlatform::current())
    }

    /// Creates a provider for an explicit platform.
    pub fn with_platform(engine: E, platform: HostPlatform) -> Self {
        Self::from_shared(Arc::new(engine), platform)
    }

    /// Creates a provider around an engine that is shared elsewhere.
    pub fn from_shared(engine: Arc<E>, platform: HostPlatform) -> Self {
        Self { engine, platform }
    }

    /// Returns the platform this provider negotiates for.
    #[must_use]
    pub fn platform(&self) -> HostPlatform {
        self.platform
    }
}

impl<E: StorageEngine> EngineProvider for PlatformEngineProvider<E> {
    type Engine = E;

    fn negotiate(&self) -> EngineSupport<E> {
        if !self.platform.has_native_engine() {
            debug!(platform = %self.platform, "no native engine on this platform");
            return EngineSupport::Unsupported(UnsupportedReason::NoNativeEngine {
                platform: self.platform,
            });
        }

        if !self.engine.probe_support() {
            debug!(platform = %self.platform, "storage engine probe failed");
            return EngineSupport::Unsupported(UnsupportedReason::ProbeFailed {
                platform: self.platform,
            });
        }

        debug!(platform = %self.platform, "storage engine available");
        EngineSupport::Supported(EngineCapability::new(Arc::clone(&self.engine)))
    }
}

impl<E> fmt::Debug for PlatformEngineProvider<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformEngineProvider")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

/// Provider for builds with no engine at all.
///
/// Always reports [`UnsupportedReason::NoNativeEngine`]. The type
/// parameter only fixes the engine type callers would otherwise receive,
/// so code written against a real engine compiles unchanged.
pub struct UnavailableEngineProvider<E> {
    platform: HostPlatform,
    _engine: PhantomData<fn() -> E>,
}

impl<E> UnavailableEngineProvider<E> {
    /// Creates a provider for the platform this crate was compiled for.
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(HostPlatform::current())
    }

    /// Creates a provider for an explicit platform.
    #[must_use]
    pub fn with_platform(platform: HostPlatform) -> Self {
        Self {
            platform,
            _engine: PhantomData,
        }
    }
}

impl<E> Default for UnavailableEngineProvider<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: StorageEngine> EngineProvider for UnavailableEngineProvider<E> {
    type Engine = E;

    fn negotiate(&self) -> EngineSupport<E> {
        EngineSupport::Unsupported(UnsupportedReason::NoNativeEngine {
            platform: self.platform,
        })
    }
}

impl<E> fmt::Debug for UnavailableEngineProvider<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnavailableEngineProvider")
            .field("platform", &self.platform)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ProbeEngine {
        supported: bool,
        probes: AtomicUsize,
    }

    impl ProbeEngine {
        fn new(supported: bool) -> Self {
            Self {
                supported,
                probes: AtomicUsize::new(0),
            }
        }
    }

    impl StorageEngine for ProbeEngine {
        type Handle = ();
        type Error = Infallible;

        fn probe_support(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.supported
        }

        fn open_instance(&self, _request: &OpenRequest<'_>) -> Result<(), Infallible> {
            Ok(())
        }
    }

    const NATIVE: HostPlatform = HostPlatform::Native { os: "linux" };

    #[test]
    fn native_with_supported_engine() {
        let provider = PlatformEngineProvider::with_platform(ProbeEngine::new(true), NATIVE);
        assert!(provider.negotiate().is_supported());
    }

    #[test]
    fn native_with_failing_probe() {
        let provider = PlatformEngineProvider::with_platform(ProbeEngine::new(false), NATIVE);
        assert_eq!(
            provider.negotiate().unsupported_reason(),
            Some(UnsupportedReason::ProbeFailed { platform: NATIVE })
        );
    }

    #[test]
    fn browser_skips_probe() {
        let engine = Arc::new(ProbeEngine::new(true));
        let provider =
            PlatformEngineProvider::from_shared(Arc::clone(&engine), HostPlatform::Browser);

        let support = provider.negotiate();
        assert_eq!(
            support.unsupported_reason(),
            Some(UnsupportedReason::NoNativeEngine {
                platform: HostPlatform::Browser
            })
        );
        assert_eq!(engine.probes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn negotiation_is_repeatable() {
        let engine = Arc::new(ProbeEngine::new(true));
        let provider = PlatformEngineProvider::from_shared(Arc::clone(&engine), NATIVE);

        for _ in 0..3 {
            assert!(provider.negotiate().is_supported());
        }
        assert_eq!(engine.probes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unavailable_provider_never_supports() {
        let provider = UnavailableEngineProvider::<ProbeEngine>::with_platform(NATIVE);
        let err = provider.negotiate().into_result().unwrap_err();
        assert_eq!(err.platform(), NATIVE);
    }
}
