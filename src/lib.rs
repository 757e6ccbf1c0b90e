//! # Reading
//!
//! ```rust
//! use bsondoc::DocumentView;
//!
//! fn main() -> bsondoc::Result<()> {
//!     let bytes = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";
//!     let doc = DocumentView::new(bytes)?;
//!
//!     for element in doc {
//!         let element = element?;
//!         println!("{} = {:?}", element.key(), element.value()?);
//!     }
//!
//!     assert!(doc.get("missing")?.is_eod());
//!     Ok(())
//! }
//! ```
//!
//! # Building
//!
//! ```rust
//! use bsondoc::{doc, Oid};
//!
//! fn main() -> bsondoc::Result<()> {
//!     let id = Oid::new();
//!     let value = doc! {
//!         "_id": id,
//!         "name": "reminiscent of libbson",
//!         "tags": ["zero", "copy"],
//!     }?;
//!
//!     let view = value.view();
//!     assert_eq!(view.get("_id")?.get_oid()?.value, id);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/bsondoc/0.1.0")]
#![allow(clippy::needless_doctest_main, clippy::new_without_default)]

mod error;
mod reader;

pub mod array;
pub mod buffer;
pub mod builder;
pub mod document;
pub mod element;
pub mod oid;
pub mod string;
pub mod types;
pub mod validate;

pub use crate::array::{ArrayValue, ArrayView};
pub use crate::document::{DocumentValue, DocumentView};
pub use crate::element::Element;
pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::string::StringOrLiteral;
pub use crate::types::{BinarySubtype, Bson, BsonType, Type};
pub use crate::validate::{validate, Validator};
