//! Fluent builder whose method chain is checked by the compiler.
//!
//! Each context only exposes the calls legal at that point: a document
//! context takes keys, a value context takes exactly one value, an array
//! context takes values. The type parameter `B` is the context to return to
//! once the current frame closes. At the root it is [`Root`], which has no
//! [`Context`] impl, so closing the root does not compile.
//!
//! ```rust
//! use bsondoc::builder::stream;
//!
//! let mut doc = stream::Document::new();
//! doc.key("name")?.append("bson")?
//!     .key("tags")?.open_array()?
//!         .append("fast")?
//!         .append("small")?
//!     .close_array()?
//!     .key("meta")?.open_document()?
//!         .key("version")?.append(1)?
//!     .close_document()?;
//!
//! let value = doc.extract()?;
//! let tags = value.view().get("tags")?.get_array()?.value;
//! assert_eq!(tags.get(1)?.get_string()?.value, "small");
//! # Ok::<(), bsondoc::Error>(())
//! ```

use std::marker::PhantomData;

use crate::array::{ArrayValue, ArrayView};
use crate::builder::core::{Append, Core};
use crate::document::{DocumentValue, DocumentView};
use crate::error::Result;

/// Parent of the outermost context. Nothing can close into it.
pub enum Root {}

/// A context a closed frame can return to.
pub trait Context<'a>: Sized {
    fn wrap(core: &'a mut Core) -> Self;
}

/// Inside a document, waiting for a key.
pub struct KeyContext<'a, B = Root> {
    core: &'a mut Core,
    parent: PhantomData<B>,
}

/// After a key, waiting for its value.
pub struct ValueContext<'a, B = Root> {
    core: &'a mut Core,
    parent: PhantomData<B>,
}

/// Inside an array, waiting for values.
pub struct ArrayContext<'a, B = Root> {
    core: &'a mut Core,
    parent: PhantomData<B>,
}

impl<'a, B> Context<'a> for KeyContext<'a, B> {
    fn wrap(core: &'a mut Core) -> Self {
        KeyContext {
            core,
            parent: PhantomData,
        }
    }
}

impl<'a, B> Context<'a> for ValueContext<'a, B> {
    fn wrap(core: &'a mut Core) -> Self {
        ValueContext {
            core,
            parent: PhantomData,
        }
    }
}

impl<'a, B> Context<'a> for ArrayContext<'a, B> {
    fn wrap(core: &'a mut Core) -> Self {
        ArrayContext {
            core,
            parent: PhantomData,
        }
    }
}

impl<'a, B> KeyContext<'a, B> {
    pub fn key(self, key: &str) -> Result<ValueContext<'a, B>> {
        self.core.key_view(key)?;
        Ok(ValueContext::wrap(self.core))
    }

    /// Copies all elements of `view` into this document.
    pub fn concatenate(self, view: DocumentView<'_>) -> Result<Self> {
        self.core.concatenate(view)?;
        Ok(self)
    }

    pub fn close_document(self) -> Result<B>
    where
        B: Context<'a>,
    {
        self.core.close_document()?;
        Ok(B::wrap(self.core))
    }
}

impl<'a, B> ValueContext<'a, B> {
    pub fn append(self, value: impl Append) -> Result<KeyContext<'a, B>> {
        self.core.append(value)?;
        Ok(KeyContext::wrap(self.core))
    }

    pub fn open_document(self) -> Result<KeyContext<'a, KeyContext<'a, B>>> {
        self.core.open_document()?;
        Ok(KeyContext::wrap(self.core))
    }

    pub fn open_array(self) -> Result<ArrayContext<'a, KeyContext<'a, B>>> {
        self.core.open_array()?;
        Ok(ArrayContext::wrap(self.core))
    }
}

impl<'a, B> ArrayContext<'a, B> {
    pub fn append(self, value: impl Append) -> Result<Self> {
        self.core.append(value)?;
        Ok(self)
    }

    /// Copies all elements of `view`, renumbered, into this array.
    pub fn concatenate(self, view: DocumentView<'_>) -> Result<Self> {
        self.core.concatenate(view)?;
        Ok(self)
    }

    pub fn open_document(self) -> Result<KeyContext<'a, ArrayContext<'a, B>>> {
        self.core.open_document()?;
        Ok(KeyContext::wrap(self.core))
    }

    pub fn open_array(self) -> Result<ArrayContext<'a, ArrayContext<'a, B>>> {
        self.core.open_array()?;
        Ok(ArrayContext::wrap(self.core))
    }

    pub fn close_array(self) -> Result<B>
    where
        B: Context<'a>,
    {
        self.core.close_array()?;
        Ok(B::wrap(self.core))
    }
}

/// Root of a streamed document.
#[derive(Debug)]
pub struct Document {
    core: Core,
}

impl Document {
    pub fn new() -> Self {
        Document {
            core: Core::new_document(),
        }
    }

    /// Starts the next element.
    pub fn key(&mut self, key: &str) -> Result<ValueContext<'_>> {
        KeyContext::wrap(&mut self.core).key(key)
    }

    /// Root context, for chains that start with something other than a key.
    pub fn context(&mut self) -> KeyContext<'_> {
        KeyContext::wrap(&mut self.core)
    }

    pub fn view(&mut self) -> Result<DocumentView<'_>> {
        self.core.view_document()
    }

    pub fn extract(mut self) -> Result<DocumentValue> {
        self.core.extract_document()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.core.clear().map(|_| ())
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

/// Root of a streamed array.
#[derive(Debug)]
pub struct Array {
    core: Core,
}

impl Array {
    pub fn new() -> Self {
        Array {
            core: Core::new_array(),
        }
    }

    pub fn append(&mut self, value: impl Append) -> Result<ArrayContext<'_>> {
        ArrayContext::wrap(&mut self.core).append(value)
    }

    pub fn context(&mut self) -> ArrayContext<'_> {
        ArrayContext::wrap(&mut self.core)
    }

    pub fn view(&mut self) -> Result<ArrayView<'_>> {
        self.core.view_array()
    }

    pub fn extract(mut self) -> Result<ArrayValue> {
        self.core.extract_array()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.core.clear().map(|_| ())
    }
}

impl Default for Array {
    fn default() -> Self {
        Array::new()
    }
}
