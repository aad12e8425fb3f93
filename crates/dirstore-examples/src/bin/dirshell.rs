//! An interactive shell over an in-memory dirstore volume.
//!
//! Reads one command per line from stdin:
//!
//! - `mkdir PATH` / `touch PATH` - create a directory or a file
//! - `ls [PATH]`                 - list a directory
//! - `rm PATH`                   - remove an entry and its object
//! - `cd PATH`                   - change the working directory
//! - `stat PATH`                 - print the block a path resolves to
//! - `exit`

use dirstore::{msg2err, BlockId, Error, Inode, InodeStore, NAME_MAX, ROOT_BLOCK};
use dirstore_dir::Dir;
use dirstore_memory::{MemInode, MemStore};
use dirstore_path::{resolve, split, Context};
use gumdrop::Options;
use std::io::{BufRead, Write};

#[derive(Debug, Options)]
struct CommandOptions {
    /// Print the help message.
    help: bool,

    /// Entry capacity of newly created directories.
    #[options(default = "16", meta = "N")]
    capacity: u64,

    /// Limit every object to this many bytes. Zero means unlimited.
    #[options(meta = "N")]
    limit: usize,
}

struct Shell {
    store: MemStore,
    /// The working directory. Absent means root.
    cwd: Option<Dir<MemInode>>,
    next_id: BlockId,
    capacity: u64,
}

fn open_dir(store: &MemStore, id: BlockId) -> Result<Dir<MemInode>, Error> {
    let inode = store.open(id)?.ok_or_else(|| msg2err!("no such directory"))?;
    Dir::open(inode)
}

impl Shell {
    fn ctx(&self) -> Context<'_, MemInode> {
        match &self.cwd {
            Some(d) => Context::new(d),
            None => Context::root(),
        }
    }

    fn fresh_id(&mut self) -> BlockId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create an object and link it under the split path.
    fn create_at(&mut self, path: &str, dir: bool) -> Result<(), Error> {
        let ctx = self.ctx();
        let Some((parent_id, name)) = split(&self.store, &ctx, path.as_bytes())? else {
            return Err(msg2err!("no such directory"));
        };
        let id = self.fresh_id();
        if dir {
            dirstore_dir::create(&self.store, id, self.capacity)?;
        } else {
            self.store.create(id, 0, false)?;
        }
        let parent = open_dir(&self.store, parent_id)?;
        if let Err(e) = parent.add(name, id) {
            // unlink the fresh object again
            if let Some(h) = self.store.open(id)? {
                h.mark_removed();
            }
            return Err(e);
        }
        if dir {
            let child = open_dir(&self.store, id)?;
            child.add(b".", id)?;
            child.add(b"..", parent_id)?;
        }
        Ok(())
    }

    fn ls(&self, path: &str) -> Result<(), Error> {
        let Some(id) = resolve(&self.store, &self.ctx(), path.as_bytes())? else {
            return Err(msg2err!("not found"));
        };
        let mut dir = open_dir(&self.store, id)?;
        let mut name = [0u8; NAME_MAX];
        while let Some(e) = dir.read_next(&mut name)? {
            println!("{:>4}  {}", e.id, String::from_utf8_lossy(&name[..e.nlen]));
        }
        Ok(())
    }

    fn rm(&self, path: &str) -> Result<(), Error> {
        let Some((parent_id, name)) = split(&self.store, &self.ctx(), path.as_bytes())? else {
            return Err(msg2err!("no such directory"));
        };
        let parent = open_dir(&self.store, parent_id)?;
        parent.remove(&self.store, name)
    }

    fn cd(&mut self, path: &str) -> Result<(), Error> {
        let ctx = self.ctx();
        let Some(id) = resolve(&self.store, &ctx, path.as_bytes())? else {
            return Err(msg2err!("not found"));
        };
        self.cwd = Some(open_dir(&self.store, id)?);
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<(), Error> {
        match resolve(&self.store, &self.ctx(), path.as_bytes())? {
            Some(id) => println!("{path} -> block {id}"),
            None => println!("{path} -> not found"),
        }
        Ok(())
    }
}

fn main() -> Result<(), Error> {
    let opts = CommandOptions::parse_args_default_or_exit();
    let store = match opts.limit {
        0 => MemStore::new(),
        n => MemStore::with_limit(n),
    };
    dirstore_dir::format(&store)?;
    let mut shell = Shell {
        store,
        cwd: None,
        next_id: ROOT_BLOCK + 1,
        capacity: opts.capacity,
    };

    let tty = unsafe { libc::isatty(0) } == 1;
    let stdin = std::io::stdin();
    loop {
        if tty {
            print!("dirstore> ");
            std::io::stdout().flush()?;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else { continue };
        let arg = words.next().unwrap_or("");
        let res = match cmd {
            "mkdir" => shell.create_at(arg, true),
            "touch" => shell.create_at(arg, false),
            "ls" => shell.ls(arg),
            "rm" => shell.rm(arg),
            "cd" => shell.cd(arg),
            "stat" => shell.stat(arg),
            "exit" => break,
            _ => Err(msg2err!("unknown command")),
        };
        if let Err(e) = res {
            println!("error: {e}");
        }
    }
    Ok(())
}
