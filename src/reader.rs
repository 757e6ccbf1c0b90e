use paste::paste;
use std::str;

use crate::error::{Error, Result};

/// Bounds checked little endian cursor over a borrowed BSON buffer.
///
/// Everything handed out borrows from the underlying slice, nothing is copied.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    buffer: &'a [u8],
    index: usize,
    /// Offset of `buffer[0]` inside the outermost document, for error reports.
    base: usize,
}

macro_rules! read_byte_impl {
    ($($t:ident),*) => {
        $(paste! {
            pub fn [<read_ $t>] (&mut self) -> Result<$t> {
                let bytes = self.read_bytes(std::mem::size_of::<$t>())?;
                let mut a = [0u8; std::mem::size_of::<$t>()];
                a.copy_from_slice(bytes);
                Ok($t::from_le_bytes(a))
            }
        })*
    };
}

impl<'a> Reader<'a> {
    pub fn new(buffer: &'a [u8], base: usize) -> Self {
        Reader {
            buffer,
            index: 0,
            base,
        }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.index
    }

    /// Index of the next unread byte inside the borrowed slice.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Bytes consumed since `start`, a value previously returned by `position`.
    pub fn since(&self, start: usize) -> &'a [u8] {
        &self.buffer[start..self.index]
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.index
    }

    pub fn error(&self, reason: &'static str) -> Error {
        Error::malformed(self.offset(), reason)
    }

    read_byte_impl!(u8, i32, i64, u64, f64);

    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(self.error("unexpected end of buffer"));
        }
        let bytes = &self.buffer[self.index..self.index + length];
        self.index += length;
        Ok(bytes)
    }

    /// Reads a sequence of bytes until find a '\0' then return it as str
    pub fn read_cstring(&mut self) -> Result<&'a str> {
        let rest = &self.buffer[self.index..];
        let end = match rest.iter().position(|b| *b == 0) {
            Some(end) => end,
            None => return Err(self.error("unterminated cstring")),
        };
        let s = str::from_utf8(&rest[..end]).map_err(|_| self.error("cstring is not utf-8"))?;
        // Plus 1 because we don't need the '\0' string terminator
        self.index += end + 1;
        Ok(s)
    }

    /// Reads an `int32` length prefixed string, the prefix counts the '\0'.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let at = self.offset();
        let size = self.read_i32()?;
        if size < 1 {
            return Err(Error::malformed(at, "string length must be at least one"));
        }
        let bytes = self.read_bytes(size as usize)?;
        let (text, nul) = bytes.split_at(bytes.len() - 1);
        if nul[0] != 0 {
            return Err(Error::malformed(at, "string is not nul terminated"));
        }
        str::from_utf8(text).map_err(|_| Error::malformed(at, "string is not utf-8"))
    }

    /// Reads a whole embedded document (length prefix included) without
    /// looking at its elements.
    pub fn read_document_bytes(&mut self) -> Result<&'a [u8]> {
        let at = self.offset();
        let rest = &self.buffer[self.index..];
        let size = frame_len(rest, at)?;
        self.read_bytes(size)
    }
}

/// Checks the outer frame of a document: a sane length prefix that fits in
/// `bytes` and points at a `\0` terminator. Returns the declared length.
pub(crate) fn frame_len(bytes: &[u8], base: usize) -> Result<usize> {
    if bytes.len() < 5 {
        return Err(Error::malformed(base, "document shorter than five bytes"));
    }
    let size = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if size < 5 {
        return Err(Error::malformed(base, "document length below minimum"));
    }
    let size = size as usize;
    if size > bytes.len() {
        return Err(Error::malformed(base, "document length exceeds buffer"));
    }
    if bytes[size - 1] != 0 {
        return Err(Error::malformed(base + size - 1, "document is not nul terminated"));
    }
    Ok(size)
}
