//! Storage instance configuration.
//!
//! A [`Configuration`] is what a caller asks for. Every field is optional;
//! [`validate`] checks it and applies defaults, producing a
//! [`NormalizedConfiguration`] that is the only form the engine ever sees.

use crate::error::{ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Instance id used when the caller does not supply one.
pub const DEFAULT_INSTANCE_ID: &str = "mmkv.default";

/// Maximum encryption key length, in bytes.
pub const MAX_ENCRYPTION_KEY_LEN: usize = 16;

/// Process-sharing intent of a storage instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// The instance is only used from this process.
    #[default]
    SingleProcess,
    /// The instance may be opened concurrently by other processes
    /// (app extensions, background services) sharing the same location.
    MultiProcess,
}

impl Mode {
    /// Returns true if the engine has to coordinate across processes.
    #[must_use]
    pub const fn requires_cross_process_coordination(self) -> bool {
        matches!(self, Mode::MultiProcess)
    }

    /// Returns the canonical name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::SingleProcess => "SINGLE_PROCESS",
            Mode::MultiProcess => "MULTI_PROCESS",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symmetric key material handed to the engine.
///
/// The key is opaque to this crate. It is never printed, never serialized,
/// and its memory is zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct EncryptionKey {
    secret: String,
}

impl EncryptionKey {
    /// Wraps caller-supplied key material.
    ///
    /// No length check happens here; that is part of [`validate`].
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns the raw UTF-8 length of the key in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secret.len()
    }

    /// Returns true if the key is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }

    /// Returns the raw key bytes.
    ///
    /// # Security
    ///
    /// Don't log or persist the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Identity of one storage location: the `(id, path)` pair.
///
/// Two normalized configurations with equal keys address the same storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    id: String,
    path: Option<PathBuf>,
}

impl InstanceKey {
    /// Creates a key from an id and an optional root directory.
    pub fn new(id: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path,
        }
    }

    /// Returns the instance id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the root directory override, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}@{}", self.id, path.display()),
            None => f.write_str(&self.id),
        }
    }
}

/// A request to open one storage instance.
///
/// Build it with the `with_*` methods, then hand it to
/// [`InstanceFactory::create`](crate::InstanceFactory::create). Fields
/// left unset fall back to their defaults during validation.
///
/// Can also be read from JSON using the field names `id`, `path`,
/// `encryptionKey`, `mode` and `readOnly`.
///
/// # Example
///
/// ```rust
/// use kvhost_core::{Configuration, Mode};
///
/// let config = Configuration::new()
///     .with_id("user-42-storage")
///     .with_mode(Mode::MultiProcess);
///
/// let normalized = config.validate().unwrap();
/// assert_eq!(normalized.id(), "user-42-storage");
/// assert!(!normalized.read_only());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    id: Option<String>,
    path: Option<PathBuf>,
    encryption_key: Option<EncryptionKey>,
    mode: Option<Mode>,
    read_only: Option<bool>,
}

impl Configuration {
    /// Creates an empty configuration; every field takes its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instance id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the root directory. Without one the engine picks its own
    /// default location.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the encryption key.
    #[must_use]
    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(EncryptionKey::new(key));
        self
    }

    /// Sets the process mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets whether the instance rejects mutations.
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    /// Fills every field left unset in `self` from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Configuration) -> Self {
        Self {
            id: self.id.or(fallback.id),
            path: self.path.or(fallback.path),
            encryption_key: self.encryption_key.or(fallback.encryption_key),
            mode: self.mode.or(fallback.mode),
            read_only: self.read_only.or(fallback.read_only),
        }
    }

    /// Returns the requested id, if set.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the requested root directory, if set.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the encryption key, if set.
    #[must_use]
    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.encryption_key.as_ref()
    }

    /// Returns the requested mode, if set.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Returns the requested read-only flag, if set.
    #[must_use]
    pub fn read_only(&self) -> Option<bool> {
        self.read_only
    }

    /// Validates this configuration. See [`validate`].
    pub fn validate(self) -> ConfigResult<NormalizedConfiguration> {
        validate(self)
    }
}

/// A validated configuration with all defaults applied.
///
/// Only [`validate`] produces values of this type, so holding one means
/// the id is non-empty and the key fits in [`MAX_ENCRYPTION_KEY_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedConfiguration {
    id: String,
    path: Option<PathBuf>,
    encryption_key: Option<EncryptionKey>,
    mode: Mode,
    read_only: bool,
}

impl NormalizedConfiguration {
    /// Returns the instance id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the root directory override, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the encryption key, if any.
    #[must_use]
    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.encryption_key.as_ref()
    }

    /// Returns true if an encryption key is present.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.encryption_key.is_some()
    }

    /// Returns the process mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns whether mutations must be rejected.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the storage location this configuration addresses.
    #[must_use]
    pub fn instance_key(&self) -> InstanceKey {
        InstanceKey::new(self.id.clone(), self.path.clone())
    }
}

impl From<NormalizedConfiguration> for Configuration {
    fn from(config: NormalizedConfiguration) -> Self {
        let NormalizedConfiguration {
            id,
            path,
            encryption_key,
            mode,
            read_only,
        } = config;
        Self {
            id: Some(id),
            path,
            encryption_key,
            mode: Some(mode),
            read_only: Some(read_only),
        }
    }
}

/// Validates a configuration and applies defaults.
///
/// - an absent id becomes [`DEFAULT_INSTANCE_ID`]
/// - an absent mode becomes [`Mode::SingleProcess`]
/// - an absent read-only flag becomes `false`
///
/// Input is never corrected: an empty id or an oversized key is an error.
///
/// # Errors
///
/// - [`ConfigurationError::EmptyId`] if the id is the empty string
/// - [`ConfigurationError::EncryptionKeyTooLong`] if the key is longer than
///   [`MAX_ENCRYPTION_KEY_LEN`] bytes (bytes, not characters)
pub fn validate(config: Configuration) -> ConfigResult<NormalizedConfiguration> {
    let Configuration {
        id,
        path,
        encryption_key,
        mode,
        read_only,
    } = config;

    let id = match id {
        Some(id) if id.is_empty() => {
            debug!("rejected configuration with empty id");
            return Err(ConfigurationError::EmptyId);
        }
        Some(id) => id,
        None => DEFAULT_INSTANCE_ID.to_string(),
    };

    if let Some(key) = &encryption_key {
        if key.len() > MAX_ENCRYPTION_KEY_LEN {
            debug!(instance = %id, key_len = key.len(), "rejected oversized encryption key");
            return Err(ConfigurationError::EncryptionKeyTooLong {
                len: key.len(),
                max: MAX_ENCRYPTION_KEY_LEN,
            });
        }
    }

    let normalized = NormalizedConfiguration {
        id,
        path,
        encryption_key,
        mode: mode.unwrap_or_default(),
        read_only: read_only.unwrap_or(false),
    };

    debug!(
        instance = %normalized.instance_key(),
        mode = %normalized.mode,
        encrypted = normalized.is_encrypted(),
        read_only = normalized.read_only,
        "configuration validated"
    );

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_gets_defaults() {
        let config = Configuration::new().validate().unwrap();
        assert_eq!(config.id(), DEFAULT_INSTANCE_ID);
        assert_eq!(config.mode(), Mode::SingleProcess);
        assert!(config.path().is_none());
        assert!(config.encryption_key().is_none());
        assert!(!config.read_only());
    }

    #[test]
    fn id_only_configuration() {
        let config = Configuration::new().with_id("user-42").validate().unwrap();
        assert_eq!(config.id(), "user-42");
        assert_eq!(config.mode(), Mode::SingleProcess);
        assert!(config.path().is_none());
        assert!(!config.is_encrypted());
        assert!(!config.read_only());
    }

    #[test]
    fn empty_id_rejected() {
        let result = Configuration::new().with_id("").validate();
        assert_eq!(result, Err(ConfigurationError::EmptyId));
    }

    #[test]
    fn whitespace_id_is_kept_verbatim() {
        let config = Configuration::new().with_id(" ").validate().unwrap();
        assert_eq!(config.id(), " ");
    }

    #[test]
    fn sixteen_byte_key_accepted() {
        let config = Configuration::new()
            .with_id("s")
            .with_encryption_key("0123456789abcdef")
            .validate()
            .unwrap();
        assert_eq!(config.encryption_key().unwrap().len(), 16);
    }

    #[test]
    fn seventeen_byte_key_rejected() {
        let result = Configuration::new()
            .with_id("s")
            .with_encryption_key("0123456789abcdefg")
            .validate();
        assert_eq!(
            result,
            Err(ConfigurationError::EncryptionKeyTooLong { len: 17, max: 16 })
        );
    }

    #[test]
    fn key_length_counts_bytes_not_chars() {
        // 9 characters, 18 bytes
        let key = "ééééééééé";
        assert_eq!(key.chars().count(), 9);

        let result = Configuration::new().with_encryption_key(key).validate();
        assert_eq!(
            result,
            Err(ConfigurationError::EncryptionKeyTooLong { len: 18, max: 16 })
        );
    }

    #[test]
    fn empty_key_is_forwarded_as_is() {
        let config = Configuration::new()
            .with_encryption_key("")
            .validate()
            .unwrap();
        assert!(config.encryption_key().unwrap().is_empty());
    }

    #[test]
    fn validation_is_idempotent() {
        let first = Configuration::new()
            .with_id("idempotent")
            .with_path("/tmp/kv")
            .with_encryption_key("secret")
            .with_mode(Mode::MultiProcess)
            .with_read_only(true)
            .validate()
            .unwrap();

        let second = Configuration::from(first.clone()).validate().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn explicit_default_id_matches_absent_id() {
        let implicit = Configuration::new().validate().unwrap();
        let explicit = Configuration::new()
            .with_id(DEFAULT_INSTANCE_ID)
            .validate()
            .unwrap();
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn or_prefers_own_fields() {
        let base = Configuration::new()
            .with_id("file-id")
            .with_mode(Mode::MultiProcess);
        let merged = Configuration::new().with_id("flag-id").or(base);

        assert_eq!(merged.id(), Some("flag-id"));
        assert_eq!(merged.mode(), Some(Mode::MultiProcess));
        assert_eq!(merged.read_only(), None);
    }

    #[test]
    fn instance_key_display() {
        let key = InstanceKey::new("app", None);
        assert_eq!(key.to_string(), "app");

        let key = InstanceKey::new("app", Some(PathBuf::from("/data/kv")));
        assert_eq!(key.to_string(), "app@/data/kv");
    }

    #[test]
    fn instance_key_ignores_optional_fields() {
        let a = Configuration::new().with_id("a").validate().unwrap();
        let b = Configuration::new()
            .with_id("a")
            .with_read_only(true)
            .with_mode(Mode::MultiProcess)
            .validate()
            .unwrap();
        assert_eq!(a.instance_key(), b.instance_key());
    }

    #[test]
    fn debug_redacts_key() {
        let config = Configuration::new().with_encryption_key("hunter2");
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("[REDACTED]"));

        let normalized = config.validate().unwrap();
        assert!(!format!("{normalized:?}").contains("hunter2"));
    }

    #[test]
    fn error_message_does_not_leak_key() {
        let err = Configuration::new()
            .with_encryption_key("a-very-long-secret-key")
            .validate()
            .unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn mode_names() {
        assert_eq!(Mode::default(), Mode::SingleProcess);
        assert_eq!(Mode::SingleProcess.to_string(), "SINGLE_PROCESS");
        assert_eq!(Mode::MultiProcess.to_string(), "MULTI_PROCESS");
        assert!(Mode::MultiProcess.requires_cross_process_coordination());
        assert!(!Mode::SingleProcess.requires_cross_process_coordination());
    }
}
