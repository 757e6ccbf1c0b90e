//! BSON arrays: documents keyed "0", "1", "2", ...

mod value;
mod view;

pub use self::value::ArrayValue;
pub use self::view::ArrayView;
