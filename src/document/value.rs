use std::convert::TryFrom;
use std::fmt;

use crate::document::DocumentView;
use crate::error::{Error, Result};

/// An owned, heap allocated document.
///
/// Cloning copies the bytes. Views handed out by [`view`](Self::view)
/// borrow from the value and cannot outlive it.
#[derive(Clone)]
pub struct DocumentValue {
    data: Box<[u8]>,
}

impl DocumentValue {
    /// Takes over a buffer whose frame is already known to be valid.
    pub(crate) fn from_checked(data: Vec<u8>) -> Self {
        DocumentValue {
            data: data.into_boxed_slice(),
        }
    }

    /// Copies the bytes of `view`.
    pub fn from_view(view: DocumentView<'_>) -> Self {
        DocumentValue {
            data: view.as_bytes().into(),
        }
    }

    pub fn view(&self) -> DocumentView<'_> {
        DocumentView::from_checked(&self.data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Releases the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_vec()
    }
}

impl Default for DocumentValue {
    fn default() -> Self {
        DocumentValue::from_view(DocumentView::default())
    }
}

impl TryFrom<Vec<u8>> for DocumentValue {
    type Error = Error;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        DocumentView::new(&data)?;
        Ok(DocumentValue::from_checked(data))
    }
}

impl<'a> From<DocumentView<'a>> for DocumentValue {
    fn from(view: DocumentView<'a>) -> Self {
        DocumentValue::from_view(view)
    }
}

impl PartialEq for DocumentValue {
    fn eq(&self, other: &DocumentValue) -> bool {
        self.view() == other.view()
    }
}

impl<'a> PartialEq<DocumentView<'a>> for DocumentValue {
    fn eq(&self, other: &DocumentView<'a>) -> bool {
        self.view() == *other
    }
}

impl fmt::Debug for DocumentValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}
