//! BSON documents: borrowed views and owned values.

mod value;
mod view;

pub use self::value::DocumentValue;
pub use self::view::{DocumentView, Iter};
pub(crate) use self::view::Nested;
