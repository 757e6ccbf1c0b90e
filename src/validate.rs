//! Eager validation of a whole document.
//!
//! Views only check their frame and decode elements as they are visited.
//! [`validate`] walks everything once, nested documents, arrays and
//! code-with-scope scopes included, so later traversals cannot fail.

use tracing::debug;

use crate::document::DocumentView;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::reader::{frame_len, Reader};
use crate::types::{Bson, Type};

/// Deepest nesting of documents, arrays and scopes below the root that
/// [`validate`] accepts, as libbson does.
pub const MAX_DEPTH: usize = 100;

/// Options for [`validate`].
///
/// Structure is always checked, as is UTF-8 of keys and string values since
/// both are handed out as `&str`. The default checks nothing more.
///
/// ```rust
/// use bsondoc::validate::{validate, Validator};
///
/// let bytes = b"\x11\x00\x00\x00\x10$where\x00\x01\x00\x00\x00\x00";
/// assert!(validate(bytes, &Validator::default()).is_ok());
/// assert!(validate(bytes, &Validator::new().check_dollar_keys(true)).is_err());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Validator {
    utf8: bool,
    utf8_allow_null: bool,
    empty_keys: bool,
    dot_keys: bool,
    dollar_keys: bool,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    /// Reject string values holding a `\0`.
    pub fn check_utf8(mut self, on: bool) -> Self {
        self.utf8 = on;
        self
    }

    /// With `check_utf8`, let `\0` through after all.
    pub fn check_utf8_allow_null(mut self, on: bool) -> Self {
        self.utf8_allow_null = on;
        self
    }

    /// Reject empty keys.
    pub fn check_empty_keys(mut self, on: bool) -> Self {
        self.empty_keys = on;
        self
    }

    /// Reject keys containing `.`.
    pub fn check_dot_keys(mut self, on: bool) -> Self {
        self.dot_keys = on;
        self
    }

    /// Reject keys starting with `$`.
    pub fn check_dollar_keys(mut self, on: bool) -> Self {
        self.dollar_keys = on;
        self
    }

    fn check_key(&self, element: &Element) -> Result<()> {
        let key = element.key();
        let reason = if self.empty_keys && key.is_empty() {
            "empty key"
        } else if self.dot_keys && key.contains('.') {
            "key contains a dot"
        } else if self.dollar_keys && key.starts_with('$') {
            "key starts with a dollar sign"
        } else {
            return Ok(());
        };
        Err(Error::malformed(element.start(), reason))
    }

    fn check_text(&self, element: &Element, text: &str) -> Result<()> {
        if self.utf8 && !self.utf8_allow_null && text.contains('\0') {
            return Err(Error::malformed(element.offset(), "string contains a nul byte"));
        }
        Ok(())
    }
}

/// Checks every byte of `data` and returns the view on success. Errors carry
/// the offset of the first offending byte.
///
/// Documents nested more than [`MAX_DEPTH`] levels are rejected.
pub fn validate<'a>(data: &'a [u8], validator: &Validator) -> Result<DocumentView<'a>> {
    let view = DocumentView::new(data)?;
    walk(data, 0, validator, Type::Document, 0).map_err(|err| {
        debug!(%err, "document failed validation");
        err
    })?;
    Ok(view)
}

/// Walks the document at `bytes`, which starts `base` bytes into the
/// outermost one and `depth` levels below it.
fn walk(bytes: &[u8], base: usize, validator: &Validator, kind: Type, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::malformed(base, "document nested too deeply"));
    }
    let size = frame_len(bytes, base)?;
    let mut reader = Reader::new(&bytes[4..size - 1], base + 4);

    while reader.remaining() > 0 {
        let element = Element::read(&mut reader)?;
        if kind == Type::Document {
            validator.check_key(&element)?;
        }
        match element.value()? {
            Bson::String(s) => validator.check_text(&element, &s.value)?,
            Bson::Code(c) => validator.check_text(&element, &c.code)?,
            Bson::Symbol(s) => validator.check_text(&element, &s.symbol)?,
            Bson::Document(_) => {
                walk(element.payload(), element.offset(), validator, Type::Document, depth + 1)?
            }
            Bson::Array(_) => {
                walk(element.payload(), element.offset(), validator, Type::Array, depth + 1)?
            }
            Bson::CodeWScope(c) => {
                validator.check_text(&element, &c.code)?;
                // total length, code length, code, terminator
                let at = element.offset() + 8 + c.code.len() + 1;
                walk(c.scope.as_bytes(), at, validator, Type::Document, depth + 1)?;
            }
            _ => {}
        }
    }
    Ok(())
}
