//! Builder taking `key, value` pairs, with closures for nested frames.
//!
//! ```rust
//! use bsondoc::builder::basic;
//!
//! let mut doc = basic::Document::new();
//! doc.append("a", 1)?
//!     .sub_document("b", |b| {
//!         b.append("c", "d")?;
//!         Ok(())
//!     })?
//!     .sub_array("e", |e| {
//!         e.append(true)?.append(2.5)?;
//!         Ok(())
//!     })?;
//!
//! let value = doc.extract()?;
//! assert_eq!(value.view().get("b")?.get("c")?.get_string()?.value, "d");
//! # Ok::<(), bsondoc::Error>(())
//! ```
//!
//! The [`doc!`](crate::doc!) and [`array!`](crate::array!) macros expand to
//! the same calls.

use crate::array::{ArrayValue, ArrayView};
use crate::builder::core::{Append, Core};
use crate::document::{DocumentValue, DocumentView};
use crate::error::Result;

/// Document frame handed to a `sub_document` closure.
pub struct SubDocument<'a> {
    core: &'a mut Core,
}

/// Array frame handed to a `sub_array` closure.
pub struct SubArray<'a> {
    core: &'a mut Core,
}

impl<'a> SubDocument<'a> {
    pub fn append(&mut self, key: &str, value: impl Append) -> Result<&mut Self> {
        self.core.key_view(key)?.append(value)?;
        Ok(self)
    }

    pub fn sub_document<F>(&mut self, key: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument) -> Result<()>,
    {
        self.core.key_view(key)?.open_document()?;
        f(&mut SubDocument { core: self.core })?;
        self.core.close_document()?;
        Ok(self)
    }

    pub fn sub_array<F>(&mut self, key: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray) -> Result<()>,
    {
        self.core.key_view(key)?.open_array()?;
        f(&mut SubArray { core: self.core })?;
        self.core.close_array()?;
        Ok(self)
    }

    pub fn concatenate(&mut self, view: DocumentView<'_>) -> Result<&mut Self> {
        self.core.concatenate(view)?;
        Ok(self)
    }
}

impl<'a> SubArray<'a> {
    pub fn append(&mut self, value: impl Append) -> Result<&mut Self> {
        self.core.append(value)?;
        Ok(self)
    }

    pub fn sub_document<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument) -> Result<()>,
    {
        self.core.open_document()?;
        f(&mut SubDocument { core: self.core })?;
        self.core.close_document()?;
        Ok(self)
    }

    pub fn sub_array<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray) -> Result<()>,
    {
        self.core.open_array()?;
        f(&mut SubArray { core: self.core })?;
        self.core.close_array()?;
        Ok(self)
    }

    pub fn concatenate(&mut self, view: DocumentView<'_>) -> Result<&mut Self> {
        self.core.concatenate(view)?;
        Ok(self)
    }
}

/// Owning root document builder.
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

    fn frame(&mut self) -> SubDocument<'_> {
        SubDocument {
            core: &mut self.core,
        }
    }

    pub fn append(&mut self, key: &str, value: impl Append) -> Result<&mut Self> {
        self.frame().append(key, value)?;
        Ok(self)
    }

    pub fn sub_document<F>(&mut self, key: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument) -> Result<()>,
    {
        self.frame().sub_document(key, f)?;
        Ok(self)
    }

    pub fn sub_array<F>(&mut self, key: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray) -> Result<()>,
    {
        self.frame().sub_array(key, f)?;
        Ok(self)
    }

    pub fn concatenate(&mut self, view: DocumentView<'_>) -> Result<&mut Self> {
        self.frame().concatenate(view)?;
        Ok(self)
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

/// Owning root array builder.
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

    fn frame(&mut self) -> SubArray<'_> {
        SubArray {
            core: &mut self.core,
        }
    }

    pub fn append(&mut self, value: impl Append) -> Result<&mut Self> {
        self.frame().append(value)?;
        Ok(self)
    }

    pub fn sub_document<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument) -> Result<()>,
    {
        self.frame().sub_document(f)?;
        Ok(self)
    }

    pub fn sub_array<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray) -> Result<()>,
    {
        self.frame().sub_array(f)?;
        Ok(self)
    }

    pub fn concatenate(&mut self, view: DocumentView<'_>) -> Result<&mut Self> {
        self.frame().concatenate(view)?;
        Ok(self)
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

/// Builds a [`DocumentValue`](crate::document::DocumentValue).
///
/// Values are expressions, `{ ... }` for a nested document or `[ ... ]` for
/// a nested array. Keys are string literals.
///
/// ```rust
/// use bsondoc::doc;
///
/// let name = String::from("bson");
/// let value = doc! {
///     "name": name,
///     "size": { "min": 5, "max": i32::MAX },
///     "tags": ["a", { "b": true }, []],
/// }?;
/// assert_eq!(value.view().get("size")?.get("min")?.get_int32()?.value, 5);
/// # Ok::<(), bsondoc::Error>(())
/// ```
#[macro_export]
macro_rules! doc {
    ($($body:tt)*) => {
        (|| -> $crate::Result<$crate::document::DocumentValue> {
            #[allow(unused_mut)]
            let mut __doc = $crate::builder::basic::Document::new();
            $crate::__doc_fields!(__doc; $($body)*);
            __doc.extract()
        })()
    };
}

/// Builds an [`ArrayValue`](crate::array::ArrayValue), see [`doc!`].
#[macro_export]
macro_rules! array {
    ($($body:tt)*) => {
        (|| -> $crate::Result<$crate::array::ArrayValue> {
            #[allow(unused_mut)]
            let mut __array = $crate::builder::basic::Array::new();
            $crate::__array_items!(__array; $($body)*);
            __array.extract()
        })()
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __doc_fields {
    ($d:ident;) => {};
    ($d:ident; $key:literal : { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $d.sub_document($key, |__sub| {
            $crate::__doc_fields!(__sub; $($inner)*);
            Ok(())
        })?;
        $crate::__doc_fields!($d; $($($rest)*)?);
    };
    ($d:ident; $key:literal : [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $d.sub_array($key, |__sub| {
            $crate::__array_items!(__sub; $($inner)*);
            Ok(())
        })?;
        $crate::__doc_fields!($d; $($($rest)*)?);
    };
    ($d:ident; $key:literal : $value:expr $(, $($rest:tt)*)?) => {
        $d.append($key, $value)?;
        $crate::__doc_fields!($d; $($($rest)*)?);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __array_items {
    ($a:ident;) => {};
    ($a:ident; { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $a.sub_document(|__sub| {
            $crate::__doc_fields!(__sub; $($inner)*);
            Ok(())
        })?;
        $crate::__array_items!($a; $($($rest)*)?);
    };
    ($a:ident; [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $a.sub_array(|__sub| {
            $crate::__array_items!(__sub; $($inner)*);
            Ok(())
        })?;
        $crate::__array_items!($a; $($($rest)*)?);
    };
    ($a:ident; $value:expr $(, $($rest:tt)*)?) => {
        $a.append($value)?;
        $crate::__array_items!($a; $($($rest)*)?);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Type;

    #[test]
    fn closures() {
        let mut doc = Document::new();
        doc.append("a", 1i64)
            .unwrap()
            .sub_array("list", |list| {
                list.append(1)?.sub_document(|d| {
                    d.append("x", "y")?;
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        let value = doc.extract().unwrap();
        let view = value.view();
        assert_eq!(view.get("a").unwrap().element_type(), Type::Int64);
        let x = view.get("list").unwrap().at(1).unwrap().get("x").unwrap();
        assert_eq!(x.get_string().unwrap().value, "y");
    }

    #[test]
    fn closure_error_propagates() {
        let mut doc = Document::new();
        let err = doc
            .sub_document("d", |d| {
                d.append("bad\0key", 1)?;
                Ok(())
            })
            .err();
        assert_eq!(err, Some(Error::InvalidKey));
        // the sub-document is still open
        assert!(doc.view().is_err());
        doc.clear().unwrap();
        assert!(doc.view().unwrap().is_empty());
    }

    #[test]
    fn macros() {
        let n = 3;
        let value = crate::doc! {
            "n": n,
            "neg": -1,
            "nested": { "deep": { "x": "y" } },
            "list": [1, "two", [3], { "four": 4 }],
            "empty": {},
        }
        .unwrap();
        let view = value.view();
        assert_eq!(view.get("neg").unwrap().get_int32().unwrap().value, -1);
        let list = view.get("list").unwrap().get_array().unwrap().value;
        assert_eq!(list.len_elements().unwrap(), 4);
        assert_eq!(list.get(2).unwrap().at(0).unwrap().get_int32().unwrap().value, 3);
        assert!(view.get("empty").unwrap().get_document().unwrap().value.is_empty());

        let array = crate::array![1, 2.0, None::<i32>].unwrap();
        assert_eq!(array.view().len_elements().unwrap(), 3);
        assert_eq!(crate::array![].unwrap().as_bytes(), &[5, 0, 0, 0, 0]);
    }
}
