//! Hierarchical path resolution.
//!
//! Paths are byte strings with `/` separators.  A leading separator makes
//! the path absolute; otherwise resolution starts at the context's
//! current working directory, defaulting to the root.  Components borrow
//! the input - nothing is copied.
#![no_std]

use dirstore::{msg2err, BlockId, Error, Inode, InodeStore, NAME_MAX};
use dirstore_dir::Dir;

/// The resolution context, holding the caller's current working directory.
///
/// Resolution reopens the directory, so the caller's handle and its
/// cursor stay untouched.
pub struct Context<'a, H: Inode> {
    cwd: Option<&'a Dir<H>>,
}

impl<'a, H: Inode> Context<'a, H> {
    /// Resolve from the root directory.
    pub fn root() -> Self {
        Self { cwd: None }
    }

    /// Resolve from the given working directory.
    pub fn new(cwd: &'a Dir<H>) -> Self {
        Self { cwd: Some(cwd) }
    }
}

impl<H: Inode> Default for Context<'_, H> {
    fn default() -> Self {
        Self::root()
    }
}

/// Select the start directory and consume the leading separator.
fn start<'p, S: InodeStore>(
    store: &S,
    ctx: &Context<'_, S::Handle>,
    path: &'p [u8],
) -> Result<(Dir<S::Handle>, &'p [u8]), Error> {
    if let Some(rest) = path.strip_prefix(b"/") {
        return Ok((Dir::open_root(store)?, rest));
    }
    let dir = match ctx.cwd {
        Some(d) => d.reopen(),
        None => Dir::open_root(store)?,
    };
    Ok((dir, path))
}

/// Open the block as the next directory of a walk.
///
/// A missing object or a plain file is not-found, not an error.
fn enter<S: InodeStore>(store: &S, id: BlockId) -> Result<Option<Dir<S::Handle>>, Error> {
    let Some(inode) = store.open(id)? else {
        return Ok(None);
    };
    if !inode.is_dir() {
        return Ok(None);
    }
    Ok(Some(Dir::open(inode)?))
}

/// The non-empty components of a path, in order.
fn components(path: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    path.split(|c| *c == b'/').filter(|c| !c.is_empty())
}

/// Resolve a path to the block it designates.
///
/// `""` and `"/"` resolve to the start directory itself.  Any missing or
/// non-directory component on the way is `None`.  Every directory opened
/// during the walk is released again, on failure paths as well.
pub fn resolve<S: InodeStore>(
    store: &S,
    ctx: &Context<'_, S::Handle>,
    path: &[u8],
) -> Result<Option<BlockId>, Error> {
    let (mut dir, rest) = start(store, ctx, path)?;
    let mut parts = components(rest);
    let Some(mut cur) = parts.next() else {
        return Ok(Some(dir.id()));
    };
    for next in parts {
        let Some(id) = dir.lookup(cur)? else {
            return Ok(None);
        };
        let Some(child) = enter(store, id)? else {
            return Ok(None);
        };
        dir = child;
        cur = next;
    }
    dir.lookup(cur)
}

/// Split a path into the parent directory and the final component.
///
/// The final component is returned verbatim and need not exist yet -
/// creation and rename start from exactly this pair.  An empty path or an
/// over-long intermediate name is an error; a missing intermediate
/// directory is `None`, like in [`resolve`].
pub fn split<'p, S: InodeStore>(
    store: &S,
    ctx: &Context<'_, S::Handle>,
    path: &'p [u8],
) -> Result<Option<(BlockId, &'p [u8])>, Error> {
    let (mut dir, rest) = start(store, ctx, path)?;
    let mut parts = components(rest);
    let Some(mut cur) = parts.next() else {
        return Err(msg2err!("empty path"));
    };
    for next in parts {
        if cur.len() > NAME_MAX {
            return Err(msg2err!("name too long"));
        }
        let Some(id) = dir.lookup(cur)? else {
            return Ok(None);
        };
        let Some(child) = enter(store, id)? else {
            return Ok(None);
        };
        dir = child;
        cur = next;
    }
    Ok(Some((dir.id(), cur)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirstore_memory::MemStore;

    /// root(1) / a(2) / b(3) / c(4), plus a plain file f(5) in the root.
    fn sample() -> MemStore {
        let store = MemStore::new();
        dirstore_dir::format(&store).unwrap();
        let root = Dir::open_root(&store).unwrap();
        dirstore_dir::create(&store, 2, 4).unwrap();
        root.add(b"a", 2).unwrap();
        let a = Dir::open(store.open(2).unwrap().unwrap()).unwrap();
        dirstore_dir::create(&store, 3, 4).unwrap();
        a.add(b"b", 3).unwrap();
        let b = Dir::open(store.open(3).unwrap().unwrap()).unwrap();
        store.create(4, 0, false).unwrap();
        b.add(b"c", 4).unwrap();
        store.create(5, 0, false).unwrap();
        root.add(b"f", 5).unwrap();
        store
    }

    #[test]
    fn absolute_walk() {
        let store = sample();
        let ctx = Context::root();
        assert_eq!(resolve(&store, &ctx, b"/a/b/c").unwrap(), Some(4));
        assert_eq!(resolve(&store, &ctx, b"/a/b").unwrap(), Some(3));
        assert_eq!(resolve(&store, &ctx, b"/a//b///c").unwrap(), Some(4));
    }

    #[test]
    fn relative_from_root_equals_absolute() {
        let store = sample();
        let ctx = Context::root();
        assert_eq!(
            resolve(&store, &ctx, b"a/b/c").unwrap(),
            resolve(&store, &ctx, b"/a/b/c").unwrap()
        );
    }

    #[test]
    fn relative_from_cwd() {
        let store = sample();
        let a = Dir::open(store.open(2).unwrap().unwrap()).unwrap();
        let ctx = Context::new(&a);
        assert_eq!(resolve(&store, &ctx, b"b/c").unwrap(), Some(4));
        // absolute paths ignore the working directory
        assert_eq!(resolve(&store, &ctx, b"/a").unwrap(), Some(2));
    }

    #[test]
    fn empty_path_is_the_start_directory() {
        let store = sample();
        let ctx = Context::root();
        assert_eq!(resolve(&store, &ctx, b"").unwrap(), Some(dirstore::ROOT_BLOCK));
        assert_eq!(resolve(&store, &ctx, b"/").unwrap(), Some(dirstore::ROOT_BLOCK));
        let a = Dir::open(store.open(2).unwrap().unwrap()).unwrap();
        assert_eq!(resolve(&store, &Context::new(&a), b"").unwrap(), Some(2));
    }

    #[test]
    fn missing_components() {
        let store = sample();
        let ctx = Context::root();
        assert_eq!(resolve(&store, &ctx, b"/nope").unwrap(), None);
        assert_eq!(resolve(&store, &ctx, b"/nope/b").unwrap(), None);
        // a plain file cannot be walked through
        assert_eq!(resolve(&store, &ctx, b"/f/x").unwrap(), None);
    }

    #[test]
    fn split_existing_and_fresh_finals() {
        let store = sample();
        let ctx = Context::root();
        assert_eq!(split(&store, &ctx, b"/a/b/c").unwrap(), Some((3, &b"c"[..])));
        assert_eq!(split(&store, &ctx, b"/a/b/newfile").unwrap(), Some((3, &b"newfile"[..])));
        assert_eq!(split(&store, &ctx, b"/top").unwrap(), Some((dirstore::ROOT_BLOCK, &b"top"[..])));
    }

    #[test]
    fn split_failures() {
        let store = sample();
        let ctx = Context::root();
        assert!(split(&store, &ctx, b"").is_err());
        assert!(split(&store, &ctx, b"/").is_err());
        assert_eq!(split(&store, &ctx, b"/nope/newfile").unwrap(), None);
        assert_eq!(split(&store, &ctx, b"/f/newfile").unwrap(), None);

        // "<long>/x" - the intermediate name is over-long
        let mut path = [b'x'; NAME_MAX + 3];
        path[NAME_MAX + 1] = b'/';
        assert!(split(&store, &ctx, &path).is_err());

        // an over-long final component is handed out verbatim
        let long = [b'y'; NAME_MAX + 1];
        assert_eq!(
            split(&store, &ctx, &long).unwrap(),
            Some((dirstore::ROOT_BLOCK, &long[..]))
        );
    }
}
