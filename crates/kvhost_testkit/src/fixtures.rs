//! Factory fixtures.
//!
//! Build factories pinned to a host platform so tests behave the same on
//! every machine they run on.

use crate::engines::{MemoryEngine, RecordingEngine};
use kvhost_core::{HostPlatform, InstanceFactory, PlatformEngineProvider, StorageEngine};
use std::sync::Arc;

/// A native host used by fixtures.
pub const NATIVE: HostPlatform = HostPlatform::Native { os: "testos" };

/// A browser host used by fixtures.
pub const BROWSER: HostPlatform = HostPlatform::Browser;

/// Factory type produced by the fixtures.
pub type TestFactory<E> = InstanceFactory<PlatformEngineProvider<E>>;

/// Builds a factory around a shared engine on the given platform.
pub fn factory_for<E: StorageEngine>(engine: Arc<E>, platform: HostPlatform) -> TestFactory<E> {
    InstanceFactory::new(PlatformEngineProvider::from_shared(engine, platform))
}

/// Returns a supported [`RecordingEngine`] and a factory using it.
pub fn recording_factory(
    platform: HostPlatform,
) -> (Arc<RecordingEngine>, TestFactory<RecordingEngine>) {
    let engine = Arc::new(RecordingEngine::supported());
    let factory = factory_for(Arc::clone(&engine), platform);
    (engine, factory)
}

/// Returns a [`MemoryEngine`] and a native factory using it.
pub fn memory_factory() -> (Arc<MemoryEngine>, TestFactory<MemoryEngine>) {
    let engine = Arc::new(MemoryEngine::new());
    let factory = factory_for(Arc::clone(&engine), NATIVE);
    (engine, factory)
}

/// Returns an ASCII key of exactly `len` bytes.
#[must_use]
pub fn ascii_key(len: usize) -> String {
    "k".repeat(len)
}
