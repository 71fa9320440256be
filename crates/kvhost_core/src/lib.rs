//! # kvhost Core
//!
//! Configuration contract and engine capability negotiation for embedded
//! key-value storage instances.
//!
//! This crate does not store anything itself. The storage engine (page
//! layout, durability, encryption, cross-process coordination) is an
//! external collaborator reached through the [`StorageEngine`] trait.
//! What lives here:
//!
//! - [`Configuration`] and its validation into a [`NormalizedConfiguration`]
//! - [`HostPlatform`] detection
//! - [`EngineProvider`] capability negotiation returning [`EngineSupport`]
//! - [`InstanceFactory`], which ties the two together
//!
//! ## Example
//!
//! ```rust,ignore
//! use kvhost_core::{Configuration, InstanceFactory, PlatformEngineProvider};
//!
//! let factory = InstanceFactory::new(PlatformEngineProvider::detect(engine));
//! let storage = factory.create(Configuration::new().with_id("user-42"))?;
//! ```
//!
//! On hosts without a native engine, `create` fails with
//! [`InstanceError::UnsupportedPlatform`] instead of handing back a
//! handle that silently drops writes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod platform;
pub mod provider;

pub use config::{
    validate, Configuration, EncryptionKey, InstanceKey, Mode, NormalizedConfiguration,
    DEFAULT_INSTANCE_ID, MAX_ENCRYPTION_KEY_LEN,
};
pub use engine::{OpenRequest, StorageEngine};
pub use error::{
    ConfigResult, ConfigurationError, InstanceError, InstanceResult, InvalidTransition,
    UnsupportedPlatformError,
};
pub use factory::{
    is_storage_supported, ConstructionAttempt, ConstructionState, InstanceFactory, ProvidedError,
    ProvidedHandle,
};
pub use platform::HostPlatform;
pub use provider::{
    EngineCapability, EngineProvider, EngineSupport, PlatformEngineProvider,
    UnavailableEngineProvider, UnsupportedReason,
};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
