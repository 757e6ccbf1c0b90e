use std::convert::TryFrom;
use std::fmt;

use crate::array::ArrayView;
use crate::document::DocumentValue;
use crate::error::{Error, Result};

/// An owned, heap allocated array.
#[derive(Clone, Default, PartialEq)]
pub struct ArrayValue {
    inner: DocumentValue,
}

impl ArrayValue {
    pub(crate) fn from_checked(data: Vec<u8>) -> Self {
        ArrayValue {
            inner: DocumentValue::from_checked(data),
        }
    }

    /// Copies the bytes of `view`.
    pub fn from_view(view: ArrayView<'_>) -> Self {
        ArrayValue {
            inner: DocumentValue::from_view(view.as_document()),
        }
    }

    pub fn view(&self) -> ArrayView<'_> {
        ArrayView::from_checked(self.inner.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Releases the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_bytes()
    }
}

impl TryFrom<Vec<u8>> for ArrayValue {
    type Error = Error;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        Ok(ArrayValue {
            inner: DocumentValue::try_from(data)?,
        })
    }
}

impl<'a> PartialEq<ArrayView<'a>> for ArrayValue {
    fn eq(&self, other: &ArrayView<'a>) -> bool {
        self.view() == *other
    }
}

impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}
