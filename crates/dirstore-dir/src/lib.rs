//! A mutable, name-indexed entry table inside one directory inode.
//!
//! The table is a flat log of fixed-size records.  Removal tombstones a
//! record in place; insertion reuses the first tombstoned slot before
//! growing the log.  Names are matched byte-exact.
#![no_std]

use dirstore::{
    check, msg2err, BlockId, Error, Inode, InodeStore, Offset, PartialReadError, Read, ReadExt,
    Write, WriteExt, NAME_MAX, ROOT_BLOCK, ROOT_ENTRIES,
};

mod entry;
pub use entry::ENTRY_SIZE;
use entry::{RawEntry, IN_USE_OFS};

/// An entry reported by enumeration.
#[derive(Debug)]
pub struct DirEntry {
    /// The block of the referenced object's header.
    pub id: BlockId,
    /// The byte offset of the record inside the log.
    pub offset: Offset,
    /// The full length of the name, even if the buffer was shorter.
    pub nlen: usize,
}

/// One open directory.
///
/// Owns its backing inode handle; dropping the directory closes it.
pub struct Dir<H: Inode> {
    inode: H,
    /// Enumeration cursor, only moved by [`Dir::read_next`].
    pos: Offset,
}

/// Create a directory with room for `entries` records in the given block.
pub fn create<S: InodeStore>(store: &S, id: BlockId, entries: u64) -> Result<(), Error> {
    store.create(id, entries * ENTRY_SIZE, true)
}

/// Create the root directory with its initial capacity.
pub fn format<S: InodeStore>(store: &S) -> Result<(), Error> {
    create(store, ROOT_BLOCK, ROOT_ENTRIES)
}

impl<H: Inode> Dir<H> {
    /// Open a directory, taking ownership of the handle.
    ///
    /// Fails on a non-directory inode; the handle is dropped and thereby
    /// closed in that case.
    pub fn open(inode: H) -> Result<Self, Error> {
        if !inode.is_dir() {
            return Err(msg2err!("not a directory"));
        }
        Ok(Self { inode, pos: 0 })
    }

    /// Open the root directory.
    pub fn open_root<S: InodeStore<Handle = H>>(store: &S) -> Result<Self, Error> {
        let inode = store.open(ROOT_BLOCK)?.ok_or_else(|| msg2err!("no root directory"))?;
        Self::open(inode)
    }

    /// An independent handle to the same directory with a fresh cursor.
    pub fn reopen(&self) -> Self {
        Self {
            inode: self.inode.clone(),
            pos: 0,
        }
    }

    /// The block this directory lives in.
    pub fn id(&self) -> BlockId {
        self.inode.id()
    }

    /// Read the record at the offset.  The end of the log is `None`.
    fn read_entry(&self, ofs: Offset) -> Result<Option<RawEntry>, Error> {
        match (&self.inode as &dyn Read).read_object(ofs) {
            Ok(x) => Ok(Some(x)),
            Err(x) if x.is::<PartialReadError>() => Ok(None),
            Err(x) => Err(x),
        }
    }

    /// Find the in-use record with the given name and its offset.
    fn find(&self, name: &[u8]) -> Result<Option<(RawEntry, Offset)>, Error> {
        let mut ofs = 0;
        while let Some(e) = self.read_entry(ofs)? {
            if e.in_use != 0 && e.name() == name {
                return Ok(Some((e, ofs)));
            }
            ofs += ENTRY_SIZE;
        }
        Ok(None)
    }

    /// Look up a name.  Absence is `None`, not an error.
    pub fn lookup(&self, name: &[u8]) -> Result<Option<BlockId>, Error> {
        Ok(self.find(name)?.map(|(e, _)| e.target))
    }

    /// Add an entry pointing to `target`.
    ///
    /// Fails on an empty or over-long name and on a name already in use,
    /// all without touching the log.  A tombstoned slot is reused before
    /// the log grows.
    pub fn add(&self, name: &[u8], target: BlockId) -> Result<(), Error> {
        if name.is_empty() || name.len() > NAME_MAX {
            return Err(msg2err!("invalid name"));
        }
        if self.find(name)?.is_some() {
            return Err(msg2err!("name exists"));
        }

        // The first free slot wins.  Without one the scan stops at the
        // end of the log and the write below extends it.
        let mut ofs = 0;
        while let Some(e) = self.read_entry(ofs)? {
            if e.in_use == 0 {
                break;
            }
            ofs += ENTRY_SIZE;
        }
        (&self.inode as &dyn Write).write_object(ofs, RawEntry::new(name, target))
    }

    /// Remove the entry with the given name and its object.
    ///
    /// Two-phase: the target is opened first, so an entry whose object is
    /// unreachable is never tombstoned.  Only the flag byte of the record
    /// is rewritten.  The object itself is reclaimed by the store once
    /// the last handle to it drops.
    pub fn remove<S: InodeStore<Handle = H>>(&self, store: &S, name: &[u8]) -> Result<(), Error> {
        let (e, ofs) = self.find(name)?.ok_or_else(|| msg2err!("not found"))?;
        let target = store.open(e.target)?.ok_or_else(|| msg2err!("target vanished"))?;
        check!((&self.inode as &dyn Write).write_exact(ofs + IN_USE_OFS, &[0]));
        target.mark_removed();
        Ok(())
    }

    /// Return the next real entry, filling `name` with up to `nlen` bytes.
    ///
    /// Skips tombstones and the "." and ".." pseudo-entries.  The cursor
    /// advances over every record; `None` marks the end of the log.
    /// Restarting requires a [`Dir::reopen`].
    pub fn read_next(&mut self, name: &mut [u8]) -> Result<Option<DirEntry>, Error> {
        while let Some(e) = self.read_entry(self.pos)? {
            let offset = self.pos;
            self.pos += ENTRY_SIZE;
            if e.in_use == 0 || e.name() == b"." || e.name() == b".." {
                continue;
            }
            let nlen = e.name().len();
            let n = core::cmp::min(nlen, name.len());
            name[..n].copy_from_slice(&e.name()[..n]);
            return Ok(Some(DirEntry { id: e.target, offset, nlen }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirstore_memory::MemStore;

    fn fresh() -> MemStore {
        let store = MemStore::new();
        format(&store).unwrap();
        store
    }

    #[test]
    fn add_then_lookup() {
        let store = fresh();
        let root = Dir::open_root(&store).unwrap();
        assert!(root.lookup(b"foo").unwrap().is_none());
        store.create(5, 0, false).unwrap();
        root.add(b"foo", 5).unwrap();
        assert_eq!(root.lookup(b"foo").unwrap(), Some(5));
    }

    #[test]
    fn name_validation() {
        let store = fresh();
        let root = Dir::open_root(&store).unwrap();
        assert!(root.add(b"", 5).is_err());
        assert!(root.add(&[b'x'; NAME_MAX + 1], 5).is_err());
        assert!(root.add(&[b'x'; NAME_MAX], 5).is_ok());
    }

    #[test]
    fn duplicate_add_fails() {
        let store = fresh();
        let root = Dir::open_root(&store).unwrap();
        root.add(b"foo", 5).unwrap();
        assert!(root.add(b"foo", 6).is_err());
        assert_eq!(root.lookup(b"foo").unwrap(), Some(5));
    }

    #[test]
    fn names_are_case_sensitive() {
        let store = fresh();
        let root = Dir::open_root(&store).unwrap();
        root.add(b"Foo", 5).unwrap();
        assert!(root.lookup(b"foo").unwrap().is_none());
    }

    #[test]
    fn remove_needs_reachable_target() {
        let store = fresh();
        let root = Dir::open_root(&store).unwrap();
        assert!(root.remove(&store, b"foo").is_err());

        // entry without a backing object - must stay in place
        root.add(b"ghost", 99).unwrap();
        assert!(root.remove(&store, b"ghost").is_err());
        assert_eq!(root.lookup(b"ghost").unwrap(), Some(99));
    }

    #[test]
    fn remove_then_lookup() {
        let store = fresh();
        let root = Dir::open_root(&store).unwrap();
        store.create(5, 0, false).unwrap();
        root.add(b"foo", 5).unwrap();
        root.remove(&store, b"foo").unwrap();
        assert!(root.lookup(b"foo").unwrap().is_none());
        assert!(!store.exists(5));
    }

    #[test]
    fn open_plain_file_fails() {
        let store = fresh();
        store.create(5, 0, false).unwrap();
        let inode = store.open(5).unwrap().unwrap();
        assert!(Dir::open(inode).is_err());
        // the handle was dropped by the failed open
        store.open(5).unwrap().unwrap().mark_removed();
        assert!(!store.exists(5));
    }

    #[test]
    fn reopen_restarts_enumeration() {
        let store = fresh();
        let mut root = Dir::open_root(&store).unwrap();
        root.add(b"a", 2).unwrap();
        let mut buf = [0u8; NAME_MAX];
        assert!(root.read_next(&mut buf).unwrap().is_some());
        assert!(root.read_next(&mut buf).unwrap().is_none());
        let mut again = root.reopen();
        assert!(again.read_next(&mut buf).unwrap().is_some());
    }
}
