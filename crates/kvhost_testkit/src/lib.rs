//! # kvhost Testkit
//!
//! Test utilities for kvhost.
//!
//! This crate provides:
//! - [`RecordingEngine`], a fake engine that counts and records calls
//! - [`MemoryEngine`], an in-process engine with shared-instance semantics
//! - Fixtures for building factories on a chosen host platform
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kvhost_testkit::prelude::*;
//!
//! #[test]
//! fn unsupported_host_never_reaches_engine() {
//!     let (engine, factory) = recording_factory(BROWSER);
//!     assert!(factory.create(Configuration::new()).is_err());
//!     assert_eq!(engine.open_calls(), 0);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod engines;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engines::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use kvhost_core::{Configuration, HostPlatform, Mode};
}

pub use engines::*;
pub use fixtures::*;
pub use generators::*;
