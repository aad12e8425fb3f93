//! An in-memory inode store.
//!
//! Implements the reference-counted open/close contract of
//! [`dirstore::InodeStore`] on a map of byte vectors.  Used by the tests
//! and the example shell; an optional per-object size limit makes the
//! short-write failure paths reachable.
#![no_std]
extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use dirstore::{msg2err, BlockId, Error, Inode, InodeStore, Offset, Read, Write};

/// One storage object.
struct Node {
    bytes: Vec<u8>,
    is_dir: bool,
    /// Open handles, including clones.
    opens: usize,
    /// Reclaim once `opens` drops to zero.
    removed: bool,
}

struct Inner {
    nodes: BTreeMap<BlockId, Node>,
    /// Per-object size limit in bytes.
    limit: usize,
}

/// A reference-counted in-memory inode store.
pub struct MemStore(Rc<RefCell<Inner>>);

impl MemStore {
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// Limit every object to `limit` bytes, so running out of space can
    /// be provoked in tests.
    pub fn with_limit(limit: usize) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            nodes: BTreeMap::new(),
            limit,
        })))
    }

    /// Does the block hold a live object?
    pub fn exists(&self, id: BlockId) -> bool {
        self.0.borrow().nodes.contains_key(&id)
    }

    /// Current byte size of an object.
    pub fn size_of(&self, id: BlockId) -> Option<usize> {
        self.0.borrow().nodes.get(&id).map(|n| n.bytes.len())
    }

    /// Copy of an object's content.
    pub fn content_of(&self, id: BlockId) -> Option<Vec<u8>> {
        self.0.borrow().nodes.get(&id).map(|n| n.bytes.clone())
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeStore for MemStore {
    type Handle = MemInode;

    fn create(&self, id: BlockId, size: Offset, is_dir: bool) -> Result<(), Error> {
        let mut inner = self.0.borrow_mut();
        if size > inner.limit as Offset {
            return Err(msg2err!("no space"));
        }
        if inner.nodes.contains_key(&id) {
            return Err(msg2err!("block in use"));
        }
        inner.nodes.insert(
            id,
            Node {
                bytes: vec![0; size as usize],
                is_dir,
                opens: 0,
                removed: false,
            },
        );
        Ok(())
    }

    fn open(&self, id: BlockId) -> Result<Option<MemInode>, Error> {
        let mut inner = self.0.borrow_mut();
        let Some(node) = inner.nodes.get_mut(&id) else {
            return Ok(None);
        };
        // an object on its way out is no longer reachable
        if node.removed {
            return Ok(None);
        }
        node.opens += 1;
        Ok(Some(MemInode {
            store: self.0.clone(),
            id,
        }))
    }
}

/// An open handle to one object.
pub struct MemInode {
    store: Rc<RefCell<Inner>>,
    id: BlockId,
}

impl Clone for MemInode {
    fn clone(&self) -> Self {
        if let Some(node) = self.store.borrow_mut().nodes.get_mut(&self.id) {
            node.opens += 1;
        }
        Self {
            store: self.store.clone(),
            id: self.id,
        }
    }
}

impl Drop for MemInode {
    fn drop(&mut self) {
        let mut inner = self.store.borrow_mut();
        let Some(node) = inner.nodes.get_mut(&self.id) else {
            return;
        };
        node.opens -= 1;
        if node.opens == 0 && node.removed {
            inner.nodes.remove(&self.id);
        }
    }
}

impl Read for MemInode {
    fn read_bytes(&self, offset: Offset, buf: &mut [u8]) -> Result<usize, Error> {
        let inner = self.store.borrow();
        let node = inner.nodes.get(&self.id).ok_or_else(|| msg2err!("stale handle"))?;
        if offset >= node.bytes.len() as Offset {
            return Ok(0);
        }
        let ofs = offset as usize;
        let n = core::cmp::min(buf.len(), node.bytes.len() - ofs);
        buf[..n].copy_from_slice(&node.bytes[ofs..ofs + n]);
        Ok(n)
    }
}

impl Write for MemInode {
    fn write_bytes(&self, offset: Offset, buf: &[u8]) -> Result<usize, Error> {
        let mut inner = self.store.borrow_mut();
        let limit = inner.limit;
        let node = inner.nodes.get_mut(&self.id).ok_or_else(|| msg2err!("stale handle"))?;
        if offset >= limit as Offset {
            return Ok(0);
        }
        let ofs = offset as usize;
        let n = core::cmp::min(buf.len(), limit - ofs);
        if ofs + n > node.bytes.len() {
            node.bytes.resize(ofs + n, 0);
        }
        node.bytes[ofs..ofs + n].copy_from_slice(&buf[..n]);
        Ok(n)
    }
}

impl Inode for MemInode {
    fn id(&self) -> BlockId {
        self.id
    }

    fn is_dir(&self) -> bool {
        self.store.borrow().nodes.get(&self.id).map_or(false, |n| n.is_dir)
    }

    fn mark_removed(&self) {
        if let Some(node) = self.store.borrow_mut().nodes.get_mut(&self.id) {
            node.removed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_reopen() {
        let store = MemStore::new();
        store.create(7, 16, false).unwrap();
        assert!(store.create(7, 16, false).is_err());
        let a = store.open(7).unwrap().unwrap();
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert!(store.open(8).unwrap().is_none());
    }

    #[test]
    fn removal_waits_for_last_handle() {
        let store = MemStore::new();
        store.create(7, 16, false).unwrap();
        let a = store.open(7).unwrap().unwrap();
        let b = a.clone();
        a.mark_removed();
        assert!(store.open(7).unwrap().is_none());
        drop(a);
        assert!(store.exists(7));
        drop(b);
        assert!(!store.exists(7));
    }

    #[test]
    fn writes_extend_until_the_limit() {
        let store = MemStore::with_limit(4);
        store.create(7, 0, false).unwrap();
        let a = store.open(7).unwrap().unwrap();
        assert_eq!(a.write_bytes(0, b"xyzzy").unwrap(), 4);
        assert_eq!(a.write_bytes(4, b"!").unwrap(), 0);
        assert_eq!(store.size_of(7), Some(4));
    }

    #[test]
    fn short_read_at_the_end() {
        let store = MemStore::new();
        store.create(7, 3, false).unwrap();
        let a = store.open(7).unwrap().unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(a.read_bytes(0, &mut buf).unwrap(), 3);
        assert_eq!(a.read_bytes(3, &mut buf).unwrap(), 0);
    }
}
