use paste::paste;

use crate::error::{Error, Result};

/// Largest size a BSON length prefix can describe.
pub const MAX_LEN: usize = i32::MAX as usize;

/// `len` as a length prefix. Fails instead of wrapping past `i32::MAX`.
pub fn length_prefix(len: usize) -> Result<i32> {
    if len > MAX_LEN {
        return Err(Error::InvalidState("value too large"));
    }
    Ok(len as i32)
}

/// Growable byte buffer the builder writes BSON into.
///
/// Besides plain appends it knows how to patch a little endian length
/// prefix back into an earlier position, which is how documents get their
/// size once they are closed.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    inner: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer { inner: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Buffer {
            inner: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    pub fn extend_from_slice(&mut self, slice: &[u8]) {
        self.inner.extend_from_slice(slice);
    }

    /// Extends the buffer repeating the same byte `val` a
    /// certain amount of `times`
    pub fn extend_repeating(&mut self, val: u8, times: usize) {
        self.inner.resize(self.inner.len() + times, val);
    }

    /// Writes `s` followed by its `\0` terminator.
    pub fn write_cstring(&mut self, s: &str) {
        self.inner.extend_from_slice(s.as_bytes());
        self.inner.push(0x00);
    }

    /// Writes a length prefixed string, the length counts the trailing `\0`.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let len = length_prefix(s.len().saturating_add(1))?;
        self.write_i32(len);
        self.write_cstring(s);
        Ok(())
    }

    /// Overwrites the four bytes at `index` with `value` in little endian.
    pub fn patch_i32(&mut self, index: usize, value: i32) {
        self.inner[index..index + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Drops everything written after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Mutable access to the last `len` bytes.
    pub fn tail_mut(&mut self, len: usize) -> &mut [u8] {
        let start = self.inner.len() - len;
        &mut self.inner[start..]
    }

    pub fn to_vec(self) -> Vec<u8> {
        self.inner
    }
}

macro_rules! write_impl {
    ($($t:ident),*) => {
        impl Buffer {
            $(paste! {
                pub fn [<write_ $t>] (&mut self, value: $t) {
                    self.extend_from_slice(&value.to_le_bytes()[..]);
                }
            })*
        }
    };
}

write_impl!(u8, u32, i32, u64, i64, f64);

impl std::ops::Index<usize> for Buffer {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index]
    }
}

impl std::ops::IndexMut<usize> for Buffer {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.inner[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_data() {
        let mut buf = Buffer::new();
        assert_eq!(buf.len(), 0);

        let d = &[0, 1, 2, 3, 4, 5][..];
        buf.extend_from_slice(d);
        assert_eq!(buf.len(), 6);

        let v = buf.to_vec();
        assert_eq!(v, d.to_vec());
    }

    #[test]
    fn write_little_endian() {
        let mut buf = Buffer::new();
        buf.write_i32(0x0102_0304);
        buf.write_u8(0xFF);
        assert_eq!(buf.as_slice(), &[0x04, 0x03, 0x02, 0x01, 0xFF]);
    }

    #[test]
    fn patch_length_prefix() {
        let mut buf = Buffer::new();
        buf.write_i32(0);
        buf.write_cstring("abc");
        let len = buf.len() as i32;
        buf.patch_i32(0, len);
        assert_eq!(buf.as_slice(), &[8, 0, 0, 0, b'a', b'b', b'c', 0]);
    }

    #[test]
    fn string_counts_terminator() {
        let mut buf = Buffer::new();
        buf.write_string("world").unwrap();
        assert_eq!(buf.as_slice(), b"\x06\x00\x00\x00world\x00");
    }

    #[test]
    fn length_prefix_bounds() {
        assert_eq!(length_prefix(0), Ok(0));
        assert_eq!(length_prefix(MAX_LEN), Ok(i32::MAX));
        assert!(length_prefix(MAX_LEN + 1).is_err());
        assert!(length_prefix(usize::MAX).is_err());
    }

    #[test]
    fn repeat_and_tail() {
        let mut buf = Buffer::with_capacity(8);
        buf.write_u8(7);
        buf.extend_repeating(0, 3);
        buf.tail_mut(3).copy_from_slice(&[1, 2, 3]);
        assert_eq!(buf.as_slice(), &[7, 1, 2, 3]);
        buf.truncate(1);
        assert_eq!(buf[0], 7);
        assert_eq!(buf.len(), 1);
    }
}
