//! Builders that can only produce well formed BSON.
//!
//! [`Core`] is the runtime checked state machine. [`stream`] and [`basic`]
//! are friendlier front ends on top of it.

pub mod basic;
pub mod core;
pub mod stream;

pub use self::core::{Append, Core};
