//! The dirstore interfaces.
#![no_std]

/// Offset in the underlying storage.
pub type Offset = u64;

/// Identifier of a storage-block header.
pub type BlockId = u64;

/// Error of the directory layer.
pub type Error = anyhow::Error;

/// The well-known block holding the root directory.
pub const ROOT_BLOCK: BlockId = 1;

/// The maximum length of an entry name in bytes.
pub const NAME_MAX: usize = 30;

/// Number of entries the root directory is created with at format time.
pub const ROOT_ENTRIES: u64 = 16;

mod inode;
mod io;

pub use inode::*;
pub use io::*;

/// Check for errors including the location as context.
#[macro_export]
macro_rules! check {
    ($v: expr) => { $v.map_err(|e| e.context($crate::ErrorCtx((file!(), line!()))))? }
}

/// Convert into an error type including the context.
#[macro_export]
macro_rules! msg2err {
    ($v: expr) => { Error::msg($v).context($crate::ErrorCtx((file!(), line!()))) }
}

/// A container for file! and line! Error context
pub struct ErrorCtx(pub (&'static str, u32));
impl core::fmt::Display for ErrorCtx {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(fmt, "{}:{}", self.0.0, self.0.1)
    }
}
