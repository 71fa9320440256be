//! Boundary toward the external storage engine.
//!
//! The engine owns everything this crate does not: file layout,
//! durability, encryption, cross-process consistency, and enforcement of
//! the read-only flag. This module only describes the calls made into it.

use crate::config::{InstanceKey, Mode, NormalizedConfiguration};
use std::path::Path;
use std::sync::Arc;

/// The native key-value storage engine.
///
/// # Contract
///
/// - `probe_support` is cheap and side-effect free.
/// - `open_instance` with equal [`OpenRequest::key`]s returns handles that
///   observe the same underlying storage.
/// - With [`Mode::MultiProcess`] the engine keeps concurrent openers in
///   other processes consistent; with [`Mode::SingleProcess`] it may
///   assume exclusive ownership.
/// - With `read_only` set the engine rejects every mutation.
pub trait StorageEngine: Send + Sync {
    /// Handle to an open instance.
    type Handle;

    /// Engine-defined failure (corruption, permission denied, key
    /// mismatch against persisted data).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns true if the engine can run on this host.
    fn probe_support(&self) -> bool;

    /// Opens (or attaches to) the instance described by `request`.
    ///
    /// # Errors
    ///
    /// Returns the engine's own error; it is passed to the caller unchanged.
    fn open_instance(&self, request: &OpenRequest<'_>) -> Result<Self::Handle, Self::Error>;
}

impl<E: StorageEngine + ?Sized> StorageEngine for Arc<E> {
    type Handle = E::Handle;
    type Error = E::Error;

    fn probe_support(&self) -> bool {
        (**self).probe_support()
    }

    fn open_instance(&self, request: &OpenRequest<'_>) -> Result<Self::Handle, Self::Error> {
        (**self).open_instance(request)
    }
}

/// Arguments of one `open_instance` call.
///
/// Borrowed from a [`NormalizedConfiguration`], so an engine can never
/// receive an unvalidated id or an oversized key.
#[derive(Debug, Clone, Copy)]
pub struct OpenRequest<'a> {
    config: &'a NormalizedConfiguration,
}

impl<'a> OpenRequest<'a> {
    /// Creates a request for a validated configuration.
    #[must_use]
    pub fn new(config: &'a NormalizedConfiguration) -> Self {
        Self { config }
    }

    /// Returns the instance id.
    #[must_use]
    pub fn id(&self) -> &'a str {
        self.config.id()
    }

    /// Returns the root directory; `None` means the engine's default.
    #[must_use]
    pub fn path(&self) -> Option<&'a Path> {
        self.config.path()
    }

    /// Returns the raw key bytes, if the instance is encrypted.
    #[must_use]
    pub fn encryption_key(&self) -> Option<&'a [u8]> {
        self.config.encryption_key().map(|key| key.as_bytes())
    }

    /// Returns the process mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.config.mode()
    }

    /// Returns whether the engine must reject mutations.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.config.read_only()
    }

    /// Returns the storage location being opened.
    #[must_use]
    pub fn key(&self) -> InstanceKey {
        self.config.instance_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    #[test]
    fn request_exposes_normalized_fields() {
        let config = Configuration::new()
            .with_id("req")
            .with_path("/var/kv")
            .with_encryption_key("k")
            .with_read_only(true)
            .validate()
            .unwrap();
        let request = OpenRequest::new(&config);

        assert_eq!(request.id(), "req");
        assert_eq!(request.path(), Some(Path::new("/var/kv")));
        assert_eq!(request.encryption_key(), Some(&b"k"[..]));
        assert_eq!(request.mode(), Mode::SingleProcess);
        assert!(request.read_only());
        assert_eq!(request.key(), config.instance_key());
    }
}
