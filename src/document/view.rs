use std::fmt;
use std::iter::FusedIterator;

use tracing::debug;

use crate::document::DocumentValue;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::reader::{frame_len, Reader};
use crate::string::StringOrLiteral;
use crate::types::{Bson, Type};

/// `{}`
static EMPTY: [u8; 5] = [5, 0, 0, 0, 0];

/// Read only, zero copy view over an encoded document.
///
/// Construction only checks the frame (length prefix and terminator).
/// Elements are decoded while iterating, so a corrupt buffer shows up as an
/// `Err` item the first time a traversal reaches the bad bytes. Use
/// [`validate`](crate::validate::validate) to check everything up front.
///
/// The default view is the empty document.
#[derive(Copy, Clone)]
pub struct DocumentView<'a> {
    data: &'a [u8],
}

impl<'a> DocumentView<'a> {
    /// Wraps `data`, which must hold exactly one document.
    ///
    /// ```rust
    /// use bsondoc::document::DocumentView;
    ///
    /// let bytes = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";
    /// let doc = DocumentView::new(bytes).unwrap();
    /// let hello = doc.get("hello").unwrap().get_string().unwrap();
    /// assert_eq!(hello.value, "world");
    /// ```
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let size = frame_len(data, 0)?;
        if size != data.len() {
            debug!(size, len = data.len(), "document length does not match buffer");
            return Err(Error::malformed(0, "trailing bytes after document"));
        }
        Ok(DocumentView { data })
    }

    /// The frame of `data` was checked already.
    pub(crate) fn from_checked(data: &'a [u8]) -> Self {
        DocumentView { data }
    }

    /// Encoded bytes, length prefix and terminator included.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` when the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.len() == 5
    }

    pub fn iter(&self) -> Iter<'a> {
        Iter {
            reader: Reader::new(&self.data[4..self.data.len() - 1], 4),
            done: false,
        }
    }

    /// First element named `key`, or `None`.
    pub fn find(&self, key: &str) -> Result<Option<Element<'a>>> {
        for element in self.iter() {
            let element = element?;
            if element.key() == key {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// First element named `key`, or the EOD element when there is none.
    pub fn get(&self, key: &str) -> Result<Element<'a>> {
        Ok(self.find(key)?.unwrap_or_else(Element::eod))
    }

    pub fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }

    /// Copies the bytes into an owned value.
    pub fn to_owned_value(&self) -> DocumentValue {
        DocumentValue::from_view(*self)
    }
}

impl<'a> Default for DocumentView<'a> {
    fn default() -> Self {
        DocumentView { data: &EMPTY }
    }
}

impl<'a> IntoIterator for DocumentView<'a> {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl<'a, 'b> IntoIterator for &'b DocumentView<'a> {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Forward iterator over the elements of a document.
///
/// Yields one `Err` and then stops when it runs into corrupt bytes.
#[derive(Clone)]
pub struct Iter<'a> {
    reader: Reader<'a>,
    done: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.remaining() == 0 {
            return None;
        }
        match Element::read(&mut self.reader) {
            Ok(element) => Some(Ok(element)),
            Err(err) => {
                debug!(%err, "stopping iteration over malformed document");
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<'a> FusedIterator for Iter<'a> {}

/// The document an element nests, with the code of a code-with-scope.
fn nested<'a>(element: &Element<'a>) -> Option<Result<(StringOrLiteral<'a>, DocumentView<'a>)>> {
    match element.element_type() {
        Type::Document | Type::Array => {
            let view = DocumentView::new(element.payload());
            Some(view.map(|view| (StringOrLiteral::default(), view)))
        }
        Type::CodeWScope => Some(element.get_codewscope().map(|c| (c.code, c.scope))),
        _ => None,
    }
}

/// Deep structural equality: same keys, types and values in the same order.
///
/// Nested documents go on an explicit stack, so depth costs heap rather
/// than call stack.
impl<'a, 'b> PartialEq<DocumentView<'b>> for DocumentView<'a> {
    fn eq(&self, other: &DocumentView<'b>) -> bool {
        let mut stack = vec![(self.iter(), other.iter())];
        loop {
            let (a, b) = match stack.last_mut() {
                None => return true,
                Some((left, right)) => match (left.next(), right.next()) {
                    (None, None) => {
                        stack.pop();
                        continue;
                    }
                    (Some(Ok(a)), Some(Ok(b))) => (a, b),
                    _ => return false,
                },
            };
            if a.raw() == b.raw() {
                continue;
            }
            if a.key().as_str() != b.key().as_str() || a.element_type() != b.element_type() {
                return false;
            }
            match (nested(&a), nested(&b)) {
                (Some(Ok((x_code, x))), Some(Ok((y_code, y)))) if x_code.as_str() == y_code.as_str() => {
                    stack.push((x.iter(), y.iter()));
                }
                (None, None) if a == b => {}
                _ => return false,
            }
        }
    }
}

/// Nesting `Debug` prints before eliding the rest.
const DEBUG_DEPTH: usize = 32;

/// `Debug` for a document or array `depth` levels below the one being
/// formatted.
pub(crate) struct Nested<'a> {
    pub(crate) view: DocumentView<'a>,
    pub(crate) array: bool,
    pub(crate) depth: usize,
}

impl<'a> Nested<'a> {
    fn child(&self, element: &Element<'a>) -> Entry<'a> {
        let inner = |view, array| Nested {
            view,
            array,
            depth: self.depth + 1,
        };
        match element.value() {
            Ok(Bson::Document(d)) => Entry::Nested(inner(d.value, false)),
            Ok(Bson::Array(a)) => Entry::Nested(inner(a.value.as_document(), true)),
            Ok(Bson::CodeWScope(c)) => Entry::Scope(c.code, inner(c.scope, false)),
            Ok(value) => Entry::Value(value),
            Err(_) => Entry::Malformed,
        }
    }
}

enum Entry<'a> {
    Nested(Nested<'a>),
    Scope(StringOrLiteral<'a>, Nested<'a>),
    Value(Bson<'a>),
    Malformed,
}

impl<'a> fmt::Debug for Entry<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Entry::Nested(n) => fmt::Debug::fmt(n, f),
            Entry::Scope(code, scope) => f
                .debug_struct("BCodeWScope")
                .field("code", code)
                .field("scope", scope)
                .finish(),
            Entry::Value(v) => fmt::Debug::fmt(v, f),
            Entry::Malformed => f.write_str("<malformed>"),
        }
    }
}

impl<'a> fmt::Debug for Nested<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.depth >= DEBUG_DEPTH {
            return f.write_str(if self.array { "[..]" } else { "{..}" });
        }
        if self.array {
            let mut list = f.debug_list();
            for element in self.view.iter() {
                match element {
                    Ok(e) => list.entry(&self.child(&e)),
                    Err(_) => list.entry(&Entry::Malformed),
                };
            }
            list.finish()
        } else {
            let mut map = f.debug_map();
            for element in self.view.iter() {
                match element {
                    Ok(e) => map.entry(&e.key(), &self.child(&e)),
                    Err(_) => map.entry(&"<malformed>", &()),
                };
            }
            map.finish()
        }
    }
}

impl<'a> fmt::Debug for DocumentView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nested = Nested {
            view: *self,
            array: false,
            depth: 0,
        };
        fmt::Debug::fmt(&nested, f)
    }
}
