//! Host platform detection.

use std::fmt;

/// The environment this build runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPlatform {
    /// A native application process.
    Native {
        /// Operating system name as reported by `std::env::consts::OS`.
        os: &'static str,
    },
    /// A browser-hosted WebAssembly environment.
    Browser,
}

impl HostPlatform {
    /// Returns the platform this crate was compiled for.
    ///
    /// `wasm32-unknown-unknown` is treated as a browser; every other
    /// target is native.
    #[must_use]
    pub const fn current() -> Self {
        #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
        {
            HostPlatform::Browser
        }
        #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
        {
            HostPlatform::Native {
                os: std::env::consts::OS,
            }
        }
    }

    /// Returns true if a native storage engine can exist on this platform.
    #[must_use]
    pub const fn has_native_engine(self) -> bool {
        matches!(self, HostPlatform::Native { .. })
    }

    /// Returns a short platform name (`"browser"` or the OS name).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            HostPlatform::Native { os } => os,
            HostPlatform::Browser => "browser",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPlatform::Native { os } => write!(f, "native ({os})"),
            HostPlatform::Browser => f.write_str("browser"),
        }
    }
}
