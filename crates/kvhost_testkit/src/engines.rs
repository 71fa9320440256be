//! Fake storage engines.
//!
//! Neither engine persists anything to disk. [`RecordingEngine`] exists to
//! observe what the factory asks for; [`MemoryEngine`] models the parts of
//! the engine contract that callers depend on (shared instances per
//! location, read-only enforcement, key mismatch on reopen).

use kvhost_core::{InstanceKey, Mode, OpenRequest, StorageEngine};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the fake engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FakeEngineError {
    /// Opening the location was not permitted.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Persisted data could not be read.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The key does not match the one the instance was created with.
    #[error("encryption key does not match persisted data for {0}")]
    KeyMismatch(String),

    /// A mutation was attempted on a read-only handle.
    #[error("instance {0} is read-only")]
    ReadOnly(String),
}

/// Owned copy of an [`OpenRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOpen {
    /// Instance id.
    pub id: String,
    /// Root directory override.
    pub path: Option<PathBuf>,
    /// Raw key bytes.
    pub encryption_key: Option<Vec<u8>>,
    /// Process mode.
    pub mode: Mode,
    /// Read-only flag.
    pub read_only: bool,
}

impl RecordedOpen {
    fn capture(request: &OpenRequest<'_>) -> Self {
        Self {
            id: request.id().to_string(),
            path: request.path().map(PathBuf::from),
            encryption_key: request.encryption_key().map(<[u8]>::to_vec),
            mode: request.mode(),
            read_only: request.read_only(),
        }
    }

    /// Returns the storage location this open addressed.
    #[must_use]
    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.id.clone(), self.path.clone())
    }
}

/// Handle returned by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedHandle {
    /// Location that was opened.
    pub key: InstanceKey,
    /// Zero-based index of the open call that produced this handle.
    pub sequence: usize,
}

/// An engine that records every call made to it.
///
/// # Example
///
/// ```rust
/// use kvhost_testkit::RecordingEngine;
///
/// let engine = RecordingEngine::unsupported();
/// assert_eq!(engine.open_calls(), 0);
/// ```
#[derive(Debug)]
pub struct RecordingEngine {
    supported: AtomicBool,
    probe_calls: AtomicUsize,
    open_calls: AtomicUsize,
    failure: Mutex<Option<FakeEngineError>>,
    opens: Mutex<Vec<RecordedOpen>>,
}

impl RecordingEngine {
    /// Creates an engine whose probe succeeds.
    #[must_use]
    pub fn supported() -> Self {
        Self::with_support(true)
    }

    /// Creates an engine whose probe fails.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::with_support(false)
    }

    fn with_support(supported: bool) -> Self {
        Self {
            supported: AtomicBool::new(supported),
            probe_calls: AtomicUsize::new(0),
            open_calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
            opens: Mutex::new(Vec::new()),
        }
    }

    /// Changes what `probe_support` reports.
    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    /// Makes every following `open_instance` fail with `error`.
    pub fn fail_with(&self, error: FakeEngineError) {
        *self.failure.lock() = Some(error);
    }

    /// Number of `probe_support` calls so far.
    #[must_use]
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Number of `open_instance` calls so far.
    #[must_use]
    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    #[must_use]
    pub fn opens(&self) -> Vec<RecordedOpen> {
        self.opens.lock().clone()
    }
}

impl StorageEngine for RecordingEngine {
    type Handle = RecordedHandle;
    type Error = FakeEngineError;

    fn probe_support(&self) -> bool {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.supported.load(Ordering::SeqCst)
    }

    fn open_instance(&self, request: &OpenRequest<'_>) -> Result<RecordedHandle, FakeEngineError> {
        let sequence = self.open_calls.fetch_add(1, Ordering::SeqCst);
        self.opens.lock().push(RecordedOpen::capture(request));

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        Ok(RecordedHandle {
            key: request.key(),
            sequence,
        })
    }
}

#[derive(Debug)]
struct SharedInstance {
    encryption_key: Option<Vec<u8>>,
    data: RwLock<HashMap<String, Vec<u8>>>,
}

/// An in-process engine with one shared instance per [`InstanceKey`].
///
/// Reopening a location returns a handle onto the same map; a different
/// path or id gets a separate one. The key an instance was first opened
/// with must be supplied on every reopen.
#[derive(Debug)]
pub struct MemoryEngine {
    supported: bool,
    instances: RwLock<HashMap<InstanceKey, Arc<SharedInstance>>>,
    open_calls: AtomicUsize,
}

impl MemoryEngine {
    /// Creates an empty engine whose probe succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            supported: true,
            instances: RwLock::new(HashMap::new()),
            open_calls: AtomicUsize::new(0),
        }
    }

    /// Creates an empty engine whose probe fails.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Number of distinct locations opened so far.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.read().len()
    }

    /// Number of `open_instance` calls so far.
    #[must_use]
    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for MemoryEngine {
    type Handle = MemoryHandle;
    type Error = FakeEngineError;

    fn probe_support(&self) -> bool {
        self.supported
    }

    fn open_instance(&self, request: &OpenRequest<'_>) -> Result<MemoryHandle, FakeEngineError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        let key = request.key();
        let supplied = request.encryption_key().map(<[u8]>::to_vec);

        let shared = {
            let mut instances = self.instances.write();
            Arc::clone(instances.entry(key.clone()).or_insert_with(|| {
                Arc::new(SharedInstance {
                    encryption_key: supplied.clone(),
                    data: RwLock::new(HashMap::new()),
                })
            }))
        };

        if shared.encryption_key != supplied {
            return Err(FakeEngineError::KeyMismatch(key.to_string()));
        }

        Ok(MemoryHandle {
            key,
            mode: request.mode(),
            read_only: request.read_only(),
            shared,
        })
    }
}

/// Handle onto a [`MemoryEngine`] instance.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    key: InstanceKey,
    mode: Mode,
    read_only: bool,
    shared: Arc<SharedInstance>,
}

impl MemoryHandle {
    /// Returns the location this handle is attached to.
    #[must_use]
    pub fn key(&self) -> &InstanceKey {
        &self.key
    }

    /// Returns the mode the handle was opened with.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns whether this handle rejects mutations.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Reads a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.shared.data.read().get(key).cloned()
    }

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns [`FakeEngineError::ReadOnly`] on a read-only handle.
    pub fn set(&self, key: &str, value: &[u8]) -> Result<(), FakeEngineError> {
        if self.read_only {
            return Err(FakeEngineError::ReadOnly(self.key.to_string()));
        }
        self.shared
            .data
            .write()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    /// Returns true if both handles observe the same storage.
    #[must_use]
    pub fn shares_storage_with(&self, other: &MemoryHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvhost_core::Configuration;

    fn open(engine: &MemoryEngine, config: Configuration) -> Result<MemoryHandle, FakeEngineError> {
        let config = config.validate().unwrap();
        engine.open_instance(&OpenRequest::new(&config))
    }

    #[test]
    fn recording_engine_counts_calls() {
        let engine = RecordingEngine::supported();
        assert!(engine.probe_support());
        assert_eq!(engine.probe_calls(), 1);

        let config = Configuration::new().with_id("rec").validate().unwrap();
        let handle = engine.open_instance(&OpenRequest::new(&config)).unwrap();
        assert_eq!(handle.sequence, 0);
        assert_eq!(engine.open_calls(), 1);
        assert_eq!(engine.opens()[0].id, "rec");
    }

    #[test]
    fn recording_engine_failure_injection() {
        let engine = RecordingEngine::supported();
        engine.fail_with(FakeEngineError::Corrupted("bad page".into()));

        let config = Configuration::new().validate().unwrap();
        let result = engine.open_instance(&OpenRequest::new(&config));
        assert_eq!(result, Err(FakeEngineError::Corrupted("bad page".into())));
        assert_eq!(engine.open_calls(), 1);
    }

    #[test]
    fn memory_engine_shares_per_location() {
        let engine = MemoryEngine::new();
        let a = open(&engine, Configuration::new().with_id("a")).unwrap();
        let b = open(&engine, Configuration::new().with_id("a")).unwrap();
        let other = open(
            &engine,
            Configuration::new().with_id("a").with_path("/elsewhere"),
        )
        .unwrap();

        a.set("k", b"v").unwrap();
        assert_eq!(b.get("k"), Some(b"v".to_vec()));
        assert!(a.shares_storage_with(&b));
        assert!(!a.shares_storage_with(&other));
        assert_eq!(other.get("k"), None);
        assert_eq!(engine.instance_count(), 2);
    }

    #[test]
    fn memory_engine_read_only() {
        let engine = MemoryEngine::new();
        let handle = open(&engine, Configuration::new().with_read_only(true)).unwrap();
        assert!(matches!(
            handle.set("k", b"v"),
            Err(FakeEngineError::ReadOnly(_))
        ));
    }

    #[test]
    fn memory_engine_key_mismatch() {
        let engine = MemoryEngine::new();
        let first = Configuration::new().with_id("enc").with_encryption_key("one");
        open(&engine, first).unwrap();

        let second = Configuration::new().with_id("enc").with_encryption_key("two");
        let result = open(&engine, second);
        assert!(matches!(result, Err(FakeEngineError::KeyMismatch(_))));
    }
}
