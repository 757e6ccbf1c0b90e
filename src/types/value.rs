use super::*;
use crate::array::{ArrayValue, ArrayView};
use crate::document::{DocumentValue, DocumentView};
use crate::oid::Oid;
use crate::string::StringOrLiteral;

/// Any BSON value, borrowing from the buffer it was read from.
#[derive(Clone, Debug, PartialEq)]
pub enum Bson<'a> {
    Double(BDouble),
    String(BString<'a>),
    Document(BDocument<'a>),
    Array(BArray<'a>),
    Binary(BBinary<'a>),
    Undefined(BUndefined),
    Oid(BOid),
    Bool(BBool),
    Date(BDate),
    Null(BNull),
    Regex(BRegex<'a>),
    DbPointer(BDbPointer<'a>),
    Code(BCode<'a>),
    Symbol(BSymbol<'a>),
    CodeWScope(BCodeWScope<'a>),
    Int32(BInt32),
    Timestamp(BTimestamp),
    Int64(BInt64),
    Decimal128(BDecimal128),
    MinKey(BMinKey),
    MaxKey(BMaxKey),
}

impl<'a> Bson<'a> {
    pub fn element_type(&self) -> Type {
        match self {
            Bson::Double(_) => Type::Double,
            Bson::String(_) => Type::String,
            Bson::Document(_) => Type::Document,
            Bson::Array(_) => Type::Array,
            Bson::Binary(_) => Type::Binary,
            Bson::Undefined(_) => Type::Undefined,
            Bson::Oid(_) => Type::Oid,
            Bson::Bool(_) => Type::Bool,
            Bson::Date(_) => Type::Date,
            Bson::Null(_) => Type::Null,
            Bson::Regex(_) => Type::Regex,
            Bson::DbPointer(_) => Type::DbPointer,
            Bson::Code(_) => Type::Code,
            Bson::Symbol(_) => Type::Symbol,
            Bson::CodeWScope(_) => Type::CodeWScope,
            Bson::Int32(_) => Type::Int32,
            Bson::Timestamp(_) => Type::Timestamp,
            Bson::Int64(_) => Type::Int64,
            Bson::Decimal128(_) => Type::Decimal128,
            Bson::MinKey(_) => Type::MinKey,
            Bson::MaxKey(_) => Type::MaxKey,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s.value.as_str()),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(n) => Some(n.value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int64(n) => Some(n.value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(n) => Some(n.value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Bool(b) => Some(b.value),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<DocumentView<'a>> {
        match self {
            Bson::Document(d) => Some(d.value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<ArrayView<'a>> {
        match self {
            Bson::Array(a) => Some(a.value),
            _ => None,
        }
    }
}

macro_rules! bson_from {
    ($($variant:ident($t:ty)),* $(,)?) => {
        $(impl<'a> From<$t> for Bson<'a> {
            fn from(v: $t) -> Self {
                Bson::$variant(v)
            }
        })*
    };
}

bson_from! {
    Double(BDouble),
    String(BString<'a>),
    Document(BDocument<'a>),
    Array(BArray<'a>),
    Binary(BBinary<'a>),
    Undefined(BUndefined),
    Oid(BOid),
    Bool(BBool),
    Date(BDate),
    Null(BNull),
    Regex(BRegex<'a>),
    DbPointer(BDbPointer<'a>),
    Code(BCode<'a>),
    Symbol(BSymbol<'a>),
    CodeWScope(BCodeWScope<'a>),
    Int32(BInt32),
    Timestamp(BTimestamp),
    Int64(BInt64),
    Decimal128(BDecimal128),
    MinKey(BMinKey),
    MaxKey(BMaxKey),
}

macro_rules! bson_from_native {
    ($($t:ty => |$v:ident| $e:expr),* $(,)?) => {
        $(impl<'a> From<$t> for Bson<'a> {
            fn from($v: $t) -> Self {
                $e
            }
        })*
    };
}

// Native integers narrower than 32 bits widen to int32, unsigned 32 bit
// integers need an int64. Nothing narrows.
bson_from_native! {
    f64 => |v| Bson::Double(BDouble { value: v }),
    f32 => |v| Bson::Double(BDouble { value: v as f64 }),
    bool => |v| Bson::Bool(BBool { value: v }),
    i8 => |v| Bson::Int32(BInt32 { value: v as i32 }),
    i16 => |v| Bson::Int32(BInt32 { value: v as i32 }),
    i32 => |v| Bson::Int32(BInt32 { value: v }),
    u8 => |v| Bson::Int32(BInt32 { value: v as i32 }),
    u16 => |v| Bson::Int32(BInt32 { value: v as i32 }),
    u32 => |v| Bson::Int64(BInt64 { value: v as i64 }),
    i64 => |v| Bson::Int64(BInt64 { value: v }),
    &'a str => |v| Bson::String(BString::new(v)),
    &'a String => |v| Bson::String(BString::new(v.as_str())),
    String => |v| Bson::String(BString::new(v)),
    StringOrLiteral<'a> => |v| Bson::String(BString { value: v }),
    Oid => |v| Bson::Oid(BOid { value: v }),
    DocumentView<'a> => |v| Bson::Document(BDocument { value: v }),
    ArrayView<'a> => |v| Bson::Array(BArray { value: v }),
    &'a DocumentValue => |v| Bson::Document(BDocument { value: v.view() }),
    &'a ArrayValue => |v| Bson::Array(BArray { value: v.view() }),
}

/// `None` is appended as null.
impl<'a, T: Into<Bson<'a>>> From<Option<T>> for Bson<'a> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Bson::Null(BNull),
        }
    }
}
