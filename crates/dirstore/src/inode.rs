//! The inode collaborator contract.
//!
//! The inode layer owns blocks, extents and free-space accounting.  This
//! layer only requires byte-addressed access plus reference-counted
//! open/close semantics, expressed here as two traits.

use crate::{BlockId, Error, Offset, Read, Write};

/// One open storage object.
///
/// Cloning a handle reopens the object - the store keeps a reference
/// count per object.  Dropping the last handle closes it and reclaims
/// the object if [`Inode::mark_removed`] was called before.
pub trait Inode: Read + Write + Clone {
    /// The block holding the object's header.
    fn id(&self) -> BlockId;

    /// Is the content a directory-entry log?
    fn is_dir(&self) -> bool;

    /// Schedule the object for reclamation once the last handle is dropped.
    fn mark_removed(&self);
}

/// A store of inodes addressed by block.
pub trait InodeStore {
    /// The handle type for open objects.
    type Handle: Inode;

    /// Create a new object of `size` bytes in the given block.
    ///
    /// The content starts zero-filled.  Creating an already existing
    /// block is an error.
    fn create(&self, id: BlockId, size: Offset, is_dir: bool) -> Result<(), Error>;

    /// Open an existing object.  An absent object is `None`, not an error.
    fn open(&self, id: BlockId) -> Result<Option<Self::Handle>, Error>;
}
