//! Byte-addressed reading and writing.
use crate::{Error, Offset};
use core::mem::MaybeUninit;

/// Read from a certain offset into a buffer.
pub trait Read {
    /// Read into some byte buffer. Returning zero means EOF.
    ///
    /// A short read only happens at the end of the content.
    fn read_bytes(&self, offset: Offset, buf: &mut [u8]) -> Result<usize, Error>;
}

/// Write to a certain offset from a buffer.
pub trait Write {
    /// Write some byte buffer. Writing beyond the end extends the content.
    fn write_bytes(&self, offset: Offset, buf: &[u8]) -> Result<usize, Error>;
}

/// Extension methods to make implementations easier.
pub trait ReadExt {
    /// Fill the buffer.
    fn read_exact(&self, offset: Offset, buf: &mut [u8]) -> Result<(), Error>;

    /// Read a whole object.
    fn read_object<T: Sized>(&self, offset: Offset) -> Result<T, Error>;
}

/// Extension methods for writers.
pub trait WriteExt {
    /// Write the whole buffer.
    fn write_exact(&self, offset: Offset, buf: &[u8]) -> Result<(), Error>;

    /// Write a whole object.
    fn write_object<T: Sized>(&self, offset: Offset, obj: T) -> Result<(), Error>;
}

impl ReadExt for &dyn Read {
    fn read_exact(&self, offset: Offset, buf: &mut [u8]) -> Result<(), Error> {
        let mut n = 0;
        while n != buf.len() {
            match self.read_bytes(offset + n as Offset, &mut buf[n..])? {
                0 => return Err(Error::msg(PartialReadError)),
                c => n += c,
            }
        }
        Ok(())
    }

    fn read_object<T: Sized>(&self, offset: Offset) -> Result<T, Error> {
        let mut res = MaybeUninit::uninit();
        let buf = unsafe { core::slice::from_raw_parts_mut(res.as_mut_ptr() as *mut u8, core::mem::size_of::<T>()) };

        self.read_exact(offset, buf)?;
        Ok(unsafe { res.assume_init() })
    }
}

impl WriteExt for &dyn Write {
    fn write_exact(&self, offset: Offset, buf: &[u8]) -> Result<(), Error> {
        let mut done = 0;
        while done != buf.len() {
            match self.write_bytes(offset + done as Offset, &buf[done..])? {
                0 => return Err(Error::msg(PartialWriteError)),
                n => done += n,
            }
        }
        Ok(())
    }

    fn write_object<T: Sized>(&self, offset: Offset, obj: T) -> Result<(), Error> {
        let buf = unsafe { core::slice::from_raw_parts(&obj as *const T as *const u8, core::mem::size_of::<T>()) };
        self.write_exact(offset, buf)
    }
}

/// An exact read could only be partially done.
#[derive(Debug)]
pub struct PartialReadError;

impl core::fmt::Display for PartialReadError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(fmt, "{:?}", self)
    }
}

/// An exact write could only be partially done.
#[derive(Debug)]
pub struct PartialWriteError;

impl core::fmt::Display for PartialWriteError {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(fmt, "{:?}", self)
    }
}
