//! BSON type tags and one value struct per tag.
//!
//! The structs carry exactly the payload the wire format defines for their
//! tag and borrow their text and bytes from the document they were decoded
//! from. [`Bson`] is the sum of all of them.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::array::ArrayView;
use crate::document::DocumentView;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::string::StringOrLiteral;

mod value;
pub use self::value::Bson;

/// Wire format type tag of an element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Type {
    /// Not a wire type: marks a missing element.
    Eod = 0x00,
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Undefined = 0x06,
    Oid = 0x07,
    Bool = 0x08,
    Date = 0x09,
    Null = 0x0A,
    Regex = 0x0B,
    DbPointer = 0x0C,
    Code = 0x0D,
    Symbol = 0x0E,
    CodeWScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl Type {
    /// Maps a wire byte to its tag, `None` for unknown bytes and for `0x00`.
    pub fn from_u8(tag: u8) -> Option<Type> {
        let ty = match tag {
            0x01 => Type::Double,
            0x02 => Type::String,
            0x03 => Type::Document,
            0x04 => Type::Array,
            0x05 => Type::Binary,
            0x06 => Type::Undefined,
            0x07 => Type::Oid,
            0x08 => Type::Bool,
            0x09 => Type::Date,
            0x0A => Type::Null,
            0x0B => Type::Regex,
            0x0C => Type::DbPointer,
            0x0D => Type::Code,
            0x0E => Type::Symbol,
            0x0F => Type::CodeWScope,
            0x10 => Type::Int32,
            0x11 => Type::Timestamp,
            0x12 => Type::Int64,
            0x13 => Type::Decimal128,
            0x7F => Type::MaxKey,
            0xFF => Type::MinKey,
            _ => return None,
        };
        Some(ty)
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Eod => "eod",
            Type::Double => "double",
            Type::String => "string",
            Type::Document => "document",
            Type::Array => "array",
            Type::Binary => "binary",
            Type::Undefined => "undefined",
            Type::Oid => "oid",
            Type::Bool => "bool",
            Type::Date => "date",
            Type::Null => "null",
            Type::Regex => "regex",
            Type::DbPointer => "dbpointer",
            Type::Code => "code",
            Type::Symbol => "symbol",
            Type::CodeWScope => "codewscope",
            Type::Int32 => "int32",
            Type::Timestamp => "timestamp",
            Type::Int64 => "int64",
            Type::Decimal128 => "decimal128",
            Type::MaxKey => "maxkey",
            Type::MinKey => "minkey",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of payload stored in a binary element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    Generic,
    Function,
    BinaryDeprecated,
    UuidDeprecated,
    Uuid,
    Md5,
    Encrypted,
    Column,
    Sensitive,
    Vector,
    /// `0x0A..=0x7F`, not assigned yet.
    Reserved(u8),
    /// `0x80..=0xFF`.
    UserDefined(u8),
}

impl From<u8> for BinarySubtype {
    fn from(byte: u8) -> Self {
        match byte {
            0x00 => BinarySubtype::Generic,
            0x01 => BinarySubtype::Function,
            0x02 => BinarySubtype::BinaryDeprecated,
            0x03 => BinarySubtype::UuidDeprecated,
            0x04 => BinarySubtype::Uuid,
            0x05 => BinarySubtype::Md5,
            0x06 => BinarySubtype::Encrypted,
            0x07 => BinarySubtype::Column,
            0x08 => BinarySubtype::Sensitive,
            0x09 => BinarySubtype::Vector,
            0x80..=0xFF => BinarySubtype::UserDefined(byte),
            _ => BinarySubtype::Reserved(byte),
        }
    }
}

impl From<BinarySubtype> for u8 {
    fn from(subtype: BinarySubtype) -> u8 {
        match subtype {
            BinarySubtype::Generic => 0x00,
            BinarySubtype::Function => 0x01,
            BinarySubtype::BinaryDeprecated => 0x02,
            BinarySubtype::UuidDeprecated => 0x03,
            BinarySubtype::Uuid => 0x04,
            BinarySubtype::Md5 => 0x05,
            BinarySubtype::Encrypted => 0x06,
            BinarySubtype::Column => 0x07,
            BinarySubtype::Sensitive => 0x08,
            BinarySubtype::Vector => 0x09,
            BinarySubtype::Reserved(b) | BinarySubtype::UserDefined(b) => b,
        }
    }
}

/// Associates a value struct with its wire tag.
pub trait BsonType {
    const TYPE_ID: Type;
}

macro_rules! type_id {
    ($($t:ident => $tag:ident),* $(,)?) => {
        $(impl BsonType for $t<'_> {
            const TYPE_ID: Type = Type::$tag;
        })*
    };
    ($(($t:ident => $tag:ident)),* $(,)?) => {
        $(impl BsonType for $t {
            const TYPE_ID: Type = Type::$tag;
        })*
    };
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BDouble {
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BString<'a> {
    pub value: StringOrLiteral<'a>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BDocument<'a> {
    pub value: DocumentView<'a>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BArray<'a> {
    pub value: ArrayView<'a>,
}

/// Binary payload. Two empty payloads compare equal whatever their subtype.
#[derive(Copy, Clone, Debug)]
pub struct BBinary<'a> {
    pub subtype: BinarySubtype,
    pub bytes: &'a [u8],
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BUndefined;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BOid {
    pub value: Oid,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BBool {
    pub value: bool,
}

/// Milliseconds since the unix epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BDate {
    pub value: i64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BNull;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BRegex<'a> {
    pub regex: StringOrLiteral<'a>,
    pub options: StringOrLiteral<'a>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BDbPointer<'a> {
    pub collection: StringOrLiteral<'a>,
    pub value: Oid,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BCode<'a> {
    pub code: StringOrLiteral<'a>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BSymbol<'a> {
    pub symbol: StringOrLiteral<'a>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BCodeWScope<'a> {
    pub code: StringOrLiteral<'a>,
    pub scope: DocumentView<'a>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BInt32 {
    pub value: i32,
}

/// Replication timestamp, stored on the wire as `increment | timestamp << 32`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BTimestamp {
    pub increment: u32,
    pub timestamp: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BInt64 {
    pub value: i64,
}

/// IEEE 754-2008 128 bit decimal, kept as its two raw halves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BDecimal128 {
    pub high: u64,
    pub low: u64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BMinKey;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BMaxKey;

type_id! {
    BString => String,
    BDocument => Document,
    BArray => Array,
    BBinary => Binary,
    BRegex => Regex,
    BDbPointer => DbPointer,
    BCode => Code,
    BSymbol => Symbol,
    BCodeWScope => CodeWScope,
}

type_id! {
    (BDouble => Double),
    (BUndefined => Undefined),
    (BOid => Oid),
    (BBool => Bool),
    (BDate => Date),
    (BNull => Null),
    (BInt32 => Int32),
    (BTimestamp => Timestamp),
    (BInt64 => Int64),
    (BDecimal128 => Decimal128),
    (BMinKey => MinKey),
    (BMaxKey => MaxKey),
}

impl<'a> PartialEq for BBinary<'a> {
    fn eq(&self, other: &Self) -> bool {
        if self.bytes.is_empty() || other.bytes.is_empty() {
            return self.bytes.is_empty() && other.bytes.is_empty();
        }
        self.subtype == other.subtype && self.bytes == other.bytes
    }
}

impl<'a> BString<'a> {
    pub fn new(value: impl Into<StringOrLiteral<'a>>) -> Self {
        BString {
            value: value.into(),
        }
    }
}

impl<'a> BRegex<'a> {
    pub fn new(regex: impl Into<StringOrLiteral<'a>>, options: impl Into<StringOrLiteral<'a>>) -> Self {
        BRegex {
            regex: regex.into(),
            options: options.into(),
        }
    }
}

impl<'a> BCode<'a> {
    pub fn new(code: impl Into<StringOrLiteral<'a>>) -> Self {
        BCode { code: code.into() }
    }
}

impl<'a> BSymbol<'a> {
    pub fn new(symbol: impl Into<StringOrLiteral<'a>>) -> Self {
        BSymbol {
            symbol: symbol.into(),
        }
    }
}

impl BDate {
    pub fn now() -> Self {
        BDate::from(SystemTime::now())
    }

    /// Converts back to a `SystemTime`, `None` when it does not fit.
    pub fn to_system_time(self) -> Option<SystemTime> {
        if self.value >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_millis(self.value as u64))
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_millis(self.value.unsigned_abs()))
        }
    }
}

impl From<SystemTime> for BDate {
    fn from(time: SystemTime) -> Self {
        let value = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_millis() as i64,
            Err(before) => -(before.duration().as_millis() as i64),
        };
        BDate { value }
    }
}

impl BTimestamp {
    pub(crate) fn from_u64(raw: u64) -> Self {
        BTimestamp {
            increment: raw as u32,
            timestamp: (raw >> 32) as u32,
        }
    }

    pub(crate) fn to_u64(self) -> u64 {
        (self.timestamp as u64) << 32 | self.increment as u64
    }
}

impl BDecimal128 {
    pub fn new(high: u64, low: u64) -> Self {
        BDecimal128 { high, low }
    }

    /// Wire layout: low half first, both little endian.
    pub fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.low.to_le_bytes());
        out[8..].copy_from_slice(&self.high.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        low.copy_from_slice(&bytes[..8]);
        high.copy_from_slice(&bytes[8..]);
        BDecimal128 {
            high: u64::from_le_bytes(high),
            low: u64::from_le_bytes(low),
        }
    }
}

/// Fails with `TypeMismatch` unless `actual` is the tag of `T`.
pub(crate) fn expect_type<T: BsonType>(actual: Type) -> Result<()> {
    if actual == T::TYPE_ID {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: T::TYPE_ID,
            actual,
        })
    }
}
