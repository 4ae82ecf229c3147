//! Deterministic snapshot encoding for I/O devices.
//!
//! The snapshot format uses a small tag-length-value (TLV) encoding to provide:
//! - deterministic byte output (canonical tag ordering)
//! - explicit versioning (major/minor) at both format and device level
//! - strict field sets: a device rejects tags it does not know for the version it is loading

mod version;

pub use version::{
    SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
    SNAPSHOT_FORMAT_VERSION, SNAPSHOT_MAGIC,
};

/// Snapshotting contract for emulated I/O devices.
///
/// Implementations must keep `DEVICE_ID` stable forever. New fields are added by bumping the
/// device minor version; loaders must default any field that predates the incoming version.
pub trait IoSnapshot {
    const DEVICE_ID: [u8; 4];
    const DEVICE_VERSION: SnapshotVersion;

    fn save_state(&self) -> Vec<u8>;
    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()>;
}
