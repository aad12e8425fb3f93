//! The on-disk entry record.

use dirstore::{BlockId, Offset, NAME_MAX};

/// One record in a directory's entry log.
///
/// Records are stored back-to-back; the byte length of a directory is
/// always a multiple of [`ENTRY_SIZE`].  There is no count field - the
/// end of the log is where a full record can no longer be read.
#[repr(C)]
pub(crate) struct RawEntry {
    /// The block of the referenced object's header.
    pub target: BlockId,
    /// NUL-terminated name.
    pub name: [u8; NAME_MAX + 1],
    /// Tombstone flag - zero marks a free slot.
    pub in_use: u8,
}

/// Size of one record on disk.
pub const ENTRY_SIZE: Offset = core::mem::size_of::<RawEntry>() as Offset;

/// Offset of the tombstone flag inside a record.
pub(crate) const IN_USE_OFS: Offset = core::mem::offset_of!(RawEntry, in_use) as Offset;

impl RawEntry {
    /// Build an in-use record.  The name must fit.
    pub fn new(name: &[u8], target: BlockId) -> Self {
        let mut buf = [0u8; NAME_MAX + 1];
        buf[..name.len()].copy_from_slice(name);
        Self {
            target,
            name: buf,
            in_use: 1,
        }
    }

    /// The name without its padding.
    pub fn name(&self) -> &[u8] {
        let n = self.name.iter().position(|c| *c == 0).unwrap_or(self.name.len());
        &self.name[..n]
    }
}
