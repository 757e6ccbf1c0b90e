//! Runtime checked builder state machine.
//!
//! [`Core`] writes straight into a [`Buffer`]. Every opened document or array
//! pushes a frame remembering where its length prefix lives; closing the frame
//! writes the terminator and patches that prefix. Operations that do not fit
//! the current frame fail before touching the buffer, so whatever a `Core`
//! holds is always the prefix of a well formed document.

use tracing::debug;

use crate::array::{ArrayValue, ArrayView};
use crate::buffer::{length_prefix, Buffer, MAX_LEN};
use crate::document::{DocumentValue, DocumentView};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::types::{BinarySubtype, Bson, Type};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Kind {
    Document,
    Array,
}

#[derive(Clone, Debug)]
struct Frame {
    kind: Kind,
    /// Position of the length prefix.
    start: usize,
    /// Position of the type byte written by a key that still waits for its
    /// value. Only used by document frames.
    pending: Option<usize>,
    /// Next array key. Only used by array frames.
    next_index: usize,
}

impl Frame {
    fn new(kind: Kind, start: usize) -> Self {
        Frame {
            kind,
            start,
            pending: None,
            next_index: 0,
        }
    }
}

/// Anything that can be appended as a value.
pub trait Append {
    fn append_to(self, core: &mut Core) -> Result<()>;
}

impl<'v, T: Into<Bson<'v>>> Append for T {
    fn append_to(self, core: &mut Core) -> Result<()> {
        core.append_bson(&self.into())
    }
}

/// Low level builder for a single root document or array.
///
/// ```rust
/// use bsondoc::builder::Core;
///
/// let mut core = Core::new_document();
/// core.key_view("hello")?.append("world")?;
/// let doc = core.extract_document()?;
/// assert_eq!(doc.as_bytes().len(), 22);
/// # Ok::<(), bsondoc::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Core {
    out: Buffer,
    stack: Vec<Frame>,
    root: Kind,
    /// The root is terminated and its length is up to date.
    sealed: bool,
    extracted: bool,
}

// End the frame starting at `start`
macro_rules! done {
    ($o:expr, $start:expr) => {{
        let start = $start;
        let len = length_prefix($o.len() + 1 - start)?;
        $o.write_u8(0x00);
        $o.patch_i32(start, len);
    }};
}

impl Core {
    fn with_root(root: Kind) -> Self {
        let mut out = Buffer::with_capacity(64);
        out.write_i32(0);
        Core {
            out,
            stack: vec![Frame::new(root, 0)],
            root,
            sealed: false,
            extracted: false,
        }
    }

    pub fn new_document() -> Self {
        Core::with_root(Kind::Document)
    }

    pub fn new_array() -> Self {
        Core::with_root(Kind::Array)
    }

    /// Number of open frames, the root included. Zero once extracted.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn reject(&self, what: &'static str) -> Error {
        debug!(what, depth = self.stack.len(), "rejected builder operation");
        Error::InvalidState(what)
    }

    fn top(&self) -> Result<&Frame> {
        if self.extracted {
            return Err(Error::Extracted);
        }
        self.stack.last().ok_or(Error::Extracted)
    }

    /// Checks there is a slot for a value in the current frame.
    fn check_value(&self) -> Result<()> {
        let top = self.top()?;
        if top.kind == Kind::Document && top.pending.is_none() {
            return Err(self.reject("value appended without a key"));
        }
        Ok(())
    }

    fn check_close(&self, kind: Kind) -> Result<()> {
        let top = self.top()?;
        if self.stack.len() < 2 {
            return Err(self.reject("nothing open to close"));
        }
        if top.kind != kind {
            return Err(match kind {
                Kind::Document => self.reject("closing a document while an array is open"),
                Kind::Array => self.reject("closing an array while a document is open"),
            });
        }
        if top.pending.is_some() {
            return Err(self.reject("closing a frame with a key waiting for its value"));
        }
        Ok(())
    }

    fn check_finished(&self, kind: Kind) -> Result<()> {
        let top = self.top()?;
        if self.root != kind {
            return Err(match kind {
                Kind::Document => self.reject("root is an array"),
                Kind::Array => self.reject("root is a document"),
            });
        }
        if self.stack.len() > 1 {
            return Err(self.reject("sub-document or sub-array still open"));
        }
        if top.pending.is_some() {
            return Err(self.reject("key waiting for its value"));
        }
        Ok(())
    }

    /// Fails unless `extra` more bytes, plus one terminator per open frame,
    /// still fit the root's length prefix.
    fn check_room(&self, extra: usize) -> Result<()> {
        let total = self
            .out
            .len()
            .saturating_add(extra)
            .saturating_add(self.stack.len());
        if total > MAX_LEN {
            return Err(self.reject("value too large"));
        }
        Ok(())
    }

    /// Bytes `begin_value` writes before the payload.
    fn header_len(&self) -> usize {
        match self.stack.last() {
            Some(top) if top.kind == Kind::Array => array_header_len(top.next_index),
            _ => 0,
        }
    }

    fn unseal(&mut self) {
        if self.sealed {
            self.out.truncate(self.out.len() - 1);
            self.sealed = false;
        }
    }

    fn seal(&mut self) -> Result<()> {
        if !self.sealed {
            done!(self.out, 0);
            self.sealed = true;
        }
        Ok(())
    }

    /// Writes the element header for a value of type `ty`. The caller checked
    /// the slot with `check_value`.
    fn begin_value(&mut self, ty: Type) -> Result<()> {
        self.unseal();
        let out = &mut self.out;
        let top = self.stack.last_mut().ok_or(Error::Extracted)?;
        match top.kind {
            Kind::Document => {
                let at = top.pending.take().ok_or(Error::InvalidState("no pending key"))?;
                out[at] = ty as u8;
            }
            Kind::Array => {
                let mut key = itoa::Buffer::new();
                out.write_u8(ty as u8);
                out.write_cstring(key.format(top.next_index));
                top.next_index += 1;
            }
        }
        Ok(())
    }

    /// Starts a new element named `key` in the current document.
    pub fn key_view(&mut self, key: &str) -> Result<&mut Self> {
        let top = self.top()?;
        if top.kind == Kind::Array {
            return Err(self.reject("keys are generated inside arrays"));
        }
        if top.pending.is_some() {
            return Err(self.reject("previous key has no value yet"));
        }
        if key.as_bytes().contains(&0) {
            debug!(key, "rejected key with interior nul");
            return Err(Error::InvalidKey);
        }
        self.check_room(key.len().saturating_add(2))?;
        self.unseal();
        let at = self.out.len();
        // placeholder tag, patched once the value type is known
        self.out.write_u8(Type::Null as u8);
        self.out.write_cstring(key);
        if let Some(top) = self.stack.last_mut() {
            top.pending = Some(at);
        }
        Ok(self)
    }

    /// Same as [`key_view`](Self::key_view) for keys built at runtime.
    pub fn key_owned(&mut self, key: impl AsRef<str>) -> Result<&mut Self> {
        self.key_view(key.as_ref())
    }

    /// Appends a value under the pending key, or as the next array element.
    pub fn append(&mut self, value: impl Append) -> Result<&mut Self> {
        value.append_to(self)?;
        Ok(self)
    }

    pub(crate) fn append_bson(&mut self, value: &Bson<'_>) -> Result<()> {
        self.check_value()?;
        check_payload(value)?;
        self.check_room(self.header_len().saturating_add(payload_len(value)))?;
        self.begin_value(value.element_type())?;
        write_payload(&mut self.out, value)
    }

    fn open(&mut self, kind: Kind) -> Result<&mut Self> {
        self.check_value()?;
        let ty = match kind {
            Kind::Document => Type::Document,
            Kind::Array => Type::Array,
        };
        self.check_room(self.header_len() + 5)?;
        self.begin_value(ty)?;
        let start = self.out.len();
        self.out.write_i32(0);
        self.stack.push(Frame::new(kind, start));
        Ok(self)
    }

    pub fn open_document(&mut self) -> Result<&mut Self> {
        self.open(Kind::Document)
    }

    pub fn open_array(&mut self) -> Result<&mut Self> {
        self.open(Kind::Array)
    }

    fn close(&mut self, kind: Kind) -> Result<&mut Self> {
        self.check_close(kind)?;
        let start = self.top()?.start;
        done!(self.out, start);
        self.stack.pop();
        Ok(self)
    }

    pub fn close_document(&mut self) -> Result<&mut Self> {
        self.close(Kind::Document)
    }

    pub fn close_array(&mut self) -> Result<&mut Self> {
        self.close(Kind::Array)
    }

    /// Copies every element of `view` into the current frame. Inside an
    /// array the copied elements are renumbered.
    pub fn concatenate(&mut self, view: DocumentView<'_>) -> Result<&mut Self> {
        let top = self.top()?;
        if top.pending.is_some() {
            return Err(self.reject("cannot concatenate after a key"));
        }
        let (kind, next_index) = (top.kind, top.next_index);
        // nothing is written unless the whole view decodes and fits
        let elements = view.iter().collect::<Result<Vec<Element>>>()?;
        let extra = elements.iter().enumerate().fold(0usize, |n, (i, element)| {
            let len = match kind {
                Kind::Document => element.raw().len(),
                Kind::Array => array_header_len(next_index + i) + element.payload().len(),
            };
            n.saturating_add(len)
        });
        self.check_room(extra)?;

        self.unseal();
        match kind {
            Kind::Document => {
                for element in &elements {
                    self.out.extend_from_slice(element.raw());
                }
            }
            Kind::Array => {
                for element in &elements {
                    self.begin_value(element.element_type())?;
                    self.out.extend_from_slice(element.payload());
                }
            }
        }
        Ok(self)
    }

    /// Appends a binary value of `len` zeroed bytes and hands the payload out
    /// for the caller to fill.
    pub fn append_binary_alloc(&mut self, subtype: BinarySubtype, len: usize) -> Result<&mut [u8]> {
        self.check_value()?;
        let needed = binary_header_len(subtype).saturating_add(len);
        self.check_room(self.header_len().saturating_add(needed))?;
        self.begin_value(Type::Binary)?;
        write_binary_header(&mut self.out, subtype, len)?;
        self.out.extend_repeating(0, len);
        Ok(self.out.tail_mut(len))
    }

    /// Borrows the finished root document.
    pub fn view_document(&mut self) -> Result<DocumentView<'_>> {
        self.check_finished(Kind::Document)?;
        self.seal()?;
        Ok(DocumentView::from_checked(self.out.as_slice()))
    }

    /// Borrows the finished root array.
    pub fn view_array(&mut self) -> Result<ArrayView<'_>> {
        self.check_finished(Kind::Array)?;
        self.seal()?;
        Ok(ArrayView::from_checked(self.out.as_slice()))
    }

    fn extract(&mut self, kind: Kind) -> Result<Vec<u8>> {
        self.check_finished(kind)?;
        self.seal()?;
        let out = std::mem::take(&mut self.out);
        self.stack.clear();
        self.extracted = true;
        Ok(out.to_vec())
    }

    /// Moves the finished root document out. The builder is unusable
    /// afterwards.
    pub fn extract_document(&mut self) -> Result<DocumentValue> {
        self.extract(Kind::Document).map(DocumentValue::from_checked)
    }

    /// Moves the finished root array out. The builder is unusable afterwards.
    pub fn extract_array(&mut self) -> Result<ArrayValue> {
        self.extract(Kind::Array).map(ArrayValue::from_checked)
    }

    /// Drops everything appended so far, keeping the root kind.
    pub fn clear(&mut self) -> Result<&mut Self> {
        if self.extracted {
            return Err(Error::Extracted);
        }
        self.out.clear();
        self.out.write_i32(0);
        self.stack.clear();
        self.stack.push(Frame::new(self.root, 0));
        self.sealed = false;
        Ok(self)
    }
}

fn check_payload(value: &Bson<'_>) -> Result<()> {
    match value {
        Bson::Regex(r) => {
            if r.regex.as_bytes().contains(&0) || r.options.as_bytes().contains(&0) {
                debug!("rejected regex with interior nul");
                return Err(Error::InvalidString);
            }
        }
        Bson::Oid(o) if !o.value.is_valid() => return Err(Error::InvalidOid),
        Bson::DbPointer(p) if !p.value.is_valid() => return Err(Error::InvalidOid),
        _ => {}
    }
    Ok(())
}

/// Type byte, then the array index as a cstring.
fn array_header_len(index: usize) -> usize {
    2 + itoa::Buffer::new().format(index).len()
}

fn binary_header_len(subtype: BinarySubtype) -> usize {
    match subtype {
        BinarySubtype::BinaryDeprecated => 9,
        _ => 5,
    }
}

/// Encoded size of the payload of `value`, saturating.
fn payload_len(value: &Bson<'_>) -> usize {
    let string = |s: &str| s.len().saturating_add(5);
    match value {
        Bson::Double(_) | Bson::Date(_) | Bson::Timestamp(_) | Bson::Int64(_) => 8,
        Bson::String(v) => string(&v.value),
        Bson::Code(v) => string(&v.code),
        Bson::Symbol(v) => string(&v.symbol),
        Bson::Document(v) => v.value.len(),
        Bson::Array(v) => v.value.len(),
        Bson::Binary(v) => binary_header_len(v.subtype).saturating_add(v.bytes.len()),
        Bson::Undefined(_) | Bson::Null(_) | Bson::MinKey(_) | Bson::MaxKey(_) => 0,
        Bson::Oid(_) => 12,
        Bson::Bool(_) => 1,
        Bson::Regex(v) => v.regex.len().saturating_add(v.options.len()).saturating_add(2),
        Bson::DbPointer(v) => string(&v.collection).saturating_add(12),
        Bson::CodeWScope(v) => string(&v.code).saturating_add(4).saturating_add(v.scope.len()),
        Bson::Int32(_) => 4,
        Bson::Decimal128(_) => 16,
    }
}

fn write_binary_header(out: &mut Buffer, subtype: BinarySubtype, len: usize) -> Result<()> {
    if subtype == BinarySubtype::BinaryDeprecated {
        let outer = length_prefix(len.saturating_add(4))?;
        out.write_i32(outer);
        out.write_u8(subtype.into());
        out.write_i32(len as i32);
    } else {
        out.write_i32(length_prefix(len)?);
        out.write_u8(subtype.into());
    }
    Ok(())
}

fn write_oid(out: &mut Buffer, oid: &crate::oid::Oid) {
    match oid.bytes() {
        Some(bytes) => out.extend_from_slice(&bytes[..]),
        None => out.extend_repeating(0, 12),
    }
}

/// Writes the payload of `value`, the element header is already there.
fn write_payload(out: &mut Buffer, value: &Bson<'_>) -> Result<()> {
    match value {
        Bson::Double(v) => out.write_f64(v.value),
        Bson::String(v) => out.write_string(&v.value)?,
        Bson::Document(v) => out.extend_from_slice(v.value.as_bytes()),
        Bson::Array(v) => out.extend_from_slice(v.value.as_bytes()),
        Bson::Binary(v) => {
            write_binary_header(out, v.subtype, v.bytes.len())?;
            out.extend_from_slice(v.bytes);
        }
        Bson::Undefined(_) | Bson::Null(_) | Bson::MinKey(_) | Bson::MaxKey(_) => {}
        Bson::Oid(v) => write_oid(out, &v.value),
        Bson::Bool(v) => out.write_u8(v.value as u8),
        Bson::Date(v) => out.write_i64(v.value),
        Bson::Regex(v) => {
            // options are stored sorted
            let mut options: Vec<char> = v.options.chars().collect();
            options.sort_unstable();
            out.write_cstring(&v.regex);
            out.write_cstring(&options.into_iter().collect::<String>());
        }
        Bson::DbPointer(v) => {
            out.write_string(&v.collection)?;
            write_oid(out, &v.value);
        }
        Bson::Code(v) => out.write_string(&v.code)?,
        Bson::Symbol(v) => out.write_string(&v.symbol)?,
        Bson::CodeWScope(v) => {
            out.write_i32(length_prefix(payload_len(value))?);
            out.write_string(&v.code)?;
            out.extend_from_slice(v.scope.as_bytes());
        }
        Bson::Int32(v) => out.write_i32(v.value),
        Bson::Timestamp(v) => out.write_u64(v.to_u64()),
        Bson::Int64(v) => out.write_i64(v.value),
        Bson::Decimal128(v) => out.extend_from_slice(&v.to_bytes()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    #[test]
    fn hello_world() {
        let mut core = Core::new_document();
        core.key_view("hello").unwrap().append("world").unwrap();
        let doc = core.extract_document().unwrap();
        assert_eq!(
            doc.as_bytes(),
            b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00"
        );
    }

    #[test]
    fn empty_roots() {
        let mut core = Core::new_document();
        assert_eq!(core.view_document().unwrap().as_bytes(), &[5, 0, 0, 0, 0]);
        let mut core = Core::new_array();
        assert_eq!(core.extract_array().unwrap().as_bytes(), &[5, 0, 0, 0, 0]);
    }

    #[test]
    fn view_then_append() {
        let mut core = Core::new_document();
        core.key_view("a").unwrap().append(1).unwrap();
        let first = core.view_document().unwrap().to_owned_value();
        core.key_view("b").unwrap().append(2).unwrap();
        let view = core.view_document().unwrap();
        assert_eq!(first.view().iter().count(), 1);
        assert_eq!(view.iter().count(), 2);
        assert_eq!(view.get("b").unwrap().get_int32().unwrap().value, 2);
    }

    #[test]
    fn nested_frames() {
        let mut core = Core::new_document();
        core.key_view("d").unwrap().open_document().unwrap();
        core.key_view("x").unwrap().append(true).unwrap();
        core.close_document().unwrap();
        core.key_view("a").unwrap().open_array().unwrap();
        core.append(1.5).unwrap().append(None::<i32>).unwrap();
        core.close_array().unwrap();
        assert_eq!(core.depth(), 1);

        let doc = core.extract_document().unwrap();
        let view = doc.view();
        assert!(view.get("d").unwrap().get("x").unwrap().get_bool().unwrap().value);
        let a = view.get("a").unwrap().get_array().unwrap().value;
        assert_eq!(a.get(0).unwrap().get_double().unwrap().value, 1.5);
        assert_eq!(a.get(1).unwrap().element_type(), Type::Null);
        assert!(a.get(2).unwrap().is_eod());
    }

    #[test]
    fn rejected_operations_write_nothing() {
        let mut core = Core::new_document();
        core.key_view("a").unwrap().append(1).unwrap();
        let before = core.view_document().unwrap().as_bytes().to_vec();

        assert!(matches!(core.append(2), Err(Error::InvalidState(_))));
        assert!(matches!(core.close_document(), Err(Error::InvalidState(_))));
        assert!(matches!(core.close_array(), Err(Error::InvalidState(_))));
        assert_eq!(core.key_view("b\0c").err(), Some(Error::InvalidKey));
        assert_eq!(core.view_document().unwrap().as_bytes(), &before[..]);
    }

    #[test]
    fn regex_and_oid_payloads() {
        let mut core = Core::new_document();
        core.key_view("r").unwrap();
        let bad = BRegex::new("a\0b", "");
        assert_eq!(core.append(bad).err(), Some(Error::InvalidString));
        assert_eq!(
            core.append(crate::oid::Oid::default()).err(),
            Some(Error::InvalidOid)
        );
        core.append(BRegex::new("^a", "xi")).unwrap();
        let view = core.view_document().unwrap();
        let regex = view.get("r").unwrap().get_regex().unwrap();
        assert_eq!(regex.options, "ix");
    }

    #[test]
    fn binary_alloc() {
        let mut core = Core::new_document();
        core.key_view("bin").unwrap();
        let bytes = core.append_binary_alloc(BinarySubtype::Generic, 3).unwrap();
        assert_eq!(bytes, &[0, 0, 0]);
        bytes.copy_from_slice(b"abc");
        let view = core.view_document().unwrap();
        let bin = view.get("bin").unwrap().get_binary().unwrap();
        assert_eq!(bin.bytes, b"abc");
    }

    #[test]
    fn old_binary_subtype() {
        let mut core = Core::new_document();
        core.key_view("b").unwrap().append(BBinary {
            subtype: BinarySubtype::BinaryDeprecated,
            bytes: b"xy",
        }).unwrap();
        let view = core.view_document().unwrap();
        let element = view.get("b").unwrap();
        assert_eq!(&element.payload()[..9], &[6, 0, 0, 0, 2, 2, 0, 0, 0]);
        assert_eq!(element.get_binary().unwrap().bytes, b"xy");
    }

    #[test]
    fn oversized_values_are_rejected() {
        let mut core = Core::new_array();
        core.append(1).unwrap();
        let before = core.view_array().unwrap().as_bytes().to_vec();

        for len in [usize::MAX, MAX_LEN, MAX_LEN - 8] {
            assert_eq!(
                core.append_binary_alloc(BinarySubtype::Generic, len).err(),
                Some(Error::InvalidState("value too large"))
            );
        }
        assert!(core
            .append_binary_alloc(BinarySubtype::BinaryDeprecated, MAX_LEN - 4)
            .is_err());

        // nothing was written and the next index is unchanged
        assert_eq!(core.view_array().unwrap().as_bytes(), &before[..]);
        core.append(2).unwrap();
        assert_eq!(core.view_array().unwrap().get(1).unwrap().get_int32().unwrap().value, 2);
    }

    #[test]
    fn payload_sizes_match_encoding() {
        let scope = crate::doc! { "x": 1 }.unwrap();
        let values: Vec<Bson> = vec![
            "text".into(),
            BCode::new("f()").into(),
            BRegex::new("a+", "i").into(),
            BCodeWScope {
                code: "x".into(),
                scope: scope.view(),
            }
            .into(),
            BBinary {
                subtype: BinarySubtype::BinaryDeprecated,
                bytes: b"xy",
            }
            .into(),
        ];
        for value in &values {
            let mut out = Buffer::new();
            write_payload(&mut out, value).unwrap();
            assert_eq!(payload_len(value), out.len(), "{:?}", value);
        }
    }

    #[test]
    fn extracted_is_terminal() {
        let mut core = Core::new_array();
        core.append("x").unwrap();
        core.extract_array().unwrap();
        assert_eq!(core.depth(), 0);
        assert_eq!(core.append(1).err(), Some(Error::Extracted));
        assert_eq!(core.clear().err(), Some(Error::Extracted));
        assert_eq!(core.view_array().err(), Some(Error::Extracted));
    }
}
