use std::fmt;

use crate::array::ArrayValue;
use crate::document::{DocumentView, Iter, Nested};
use crate::element::Element;
use crate::error::Result;
use crate::types::Bson;

/// Read only view over an encoded array.
///
/// Shares the document machinery, indexes are looked up by their decimal
/// key with a linear scan.
#[derive(Copy, Clone, Default)]
pub struct ArrayView<'a> {
    doc: DocumentView<'a>,
}

impl<'a> ArrayView<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Ok(ArrayView {
            doc: DocumentView::new(data)?,
        })
    }

    pub(crate) fn from_checked(data: &'a [u8]) -> Self {
        ArrayView {
            doc: DocumentView::from_checked(data),
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.doc.as_bytes()
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.doc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Number of elements, walking the whole array.
    pub fn len_elements(&self) -> Result<usize> {
        let mut count = 0;
        for element in self.doc.iter() {
            element?;
            count += 1;
        }
        Ok(count)
    }

    /// The same bytes seen as a document.
    pub fn as_document(&self) -> DocumentView<'a> {
        self.doc
    }

    pub fn iter(&self) -> Iter<'a> {
        self.doc.iter()
    }

    /// Decoded values in order.
    pub fn values(&self) -> impl Iterator<Item = Result<Bson<'a>>> + 'a {
        self.doc.iter().map(|e| e.and_then(|e| e.value()))
    }

    /// Element stored under the key `index`, or the EOD element.
    pub fn get(&self, index: usize) -> Result<Element<'a>> {
        let mut key = itoa::Buffer::new();
        self.doc.get(key.format(index))
    }

    pub fn to_owned_value(&self) -> ArrayValue {
        ArrayValue::from_view(*self)
    }
}

impl<'a> IntoIterator for ArrayView<'a> {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl<'a, 'b> PartialEq<ArrayView<'b>> for ArrayView<'a> {
    fn eq(&self, other: &ArrayView<'b>) -> bool {
        self.doc == other.doc
    }
}

impl<'a> fmt::Debug for ArrayView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nested = Nested {
            view: self.doc,
            array: true,
            depth: 0,
        };
        fmt::Debug::fmt(&nested, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    // ["w", "x"]
    const WX: &[u8] = b"\x17\x00\x00\x00\x020\x00\x02\x00\x00\x00w\x00\x021\x00\x02\x00\x00\x00x\x00\x00";

    #[test]
    fn index_lookup() {
        let array = ArrayView::new(WX).unwrap();
        assert_eq!(array.get(0).unwrap().get_string().unwrap().value, "w");
        assert_eq!(array.get(1).unwrap().get_string().unwrap().value, "x");
        assert_eq!(array.get(2).unwrap().element_type(), Type::Eod);
    }

    #[test]
    fn values() {
        let array = ArrayView::new(WX).unwrap();
        let values: Vec<_> = array.values().map(|v| v.unwrap()).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].as_str(), Some("x"));
    }
}
