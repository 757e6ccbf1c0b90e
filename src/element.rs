//! One key/value pair inside a document buffer.

use std::fmt;

use crate::array::ArrayView;
use crate::document::DocumentView;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::reader::Reader;
use crate::string::StringOrLiteral;
use crate::types::*;

/// A borrowed element: its tag, its key and the bytes of its payload.
///
/// Lookups that find nothing hand out the EOD element, whose
/// [`element_type`](Element::element_type) is [`Type::Eod`] and whose typed
/// getters all fail.
#[derive(Copy, Clone)]
pub struct Element<'a> {
    ty: Type,
    key: &'a str,
    raw: &'a [u8],
    payload: &'a [u8],
    /// Offset of `payload` inside the document it was read from.
    offset: usize,
}

impl<'a> Element<'a> {
    /// The "not found" element.
    pub const fn eod() -> Self {
        Element {
            ty: Type::Eod,
            key: "",
            raw: &[],
            payload: &[],
            offset: 0,
        }
    }

    /// Reads the element starting at the reader position and moves past it.
    pub(crate) fn read(r: &mut Reader<'a>) -> Result<Self> {
        let start = r.position();
        let at = r.offset();
        let tag = r.read_u8()?;
        let ty = match Type::from_u8(tag) {
            Some(ty) if ty != Type::Eod => ty,
            _ => return Err(Error::malformed(at, "unknown element type")),
        };
        let key = r.read_cstring()?;
        let offset = r.offset();
        let payload_start = r.position();

        match ty {
            Type::Double | Type::Date | Type::Int64 | Type::Timestamp => {
                r.read_bytes(8)?;
            }
            Type::String | Type::Code | Type::Symbol => {
                r.read_string()?;
            }
            Type::Document | Type::Array => {
                r.read_document_bytes()?;
            }
            Type::Binary => {
                let size = r.read_i32()?;
                if size < 0 {
                    return Err(Error::malformed(offset, "negative binary length"));
                }
                r.read_u8()?;
                r.read_bytes(size as usize)?;
            }
            Type::Undefined | Type::Null | Type::MinKey | Type::MaxKey => {}
            Type::Oid => {
                r.read_bytes(12)?;
            }
            Type::Bool => {
                r.read_bytes(1)?;
            }
            Type::Regex => {
                r.read_cstring()?;
                r.read_cstring()?;
            }
            Type::DbPointer => {
                r.read_string()?;
                r.read_bytes(12)?;
            }
            Type::CodeWScope => {
                let size = r.read_i32()?;
                // length itself, an empty string and an empty scope
                if size < 14 {
                    return Err(Error::malformed(offset, "code with scope too short"));
                }
                r.read_bytes(size as usize - 4)?;
            }
            Type::Int32 => {
                r.read_bytes(4)?;
            }
            Type::Decimal128 => {
                r.read_bytes(16)?;
            }
            Type::Eod => {}
        }

        Ok(Element {
            ty,
            key,
            raw: r.since(start),
            payload: r.since(payload_start),
            offset,
        })
    }

    pub fn element_type(&self) -> Type {
        self.ty
    }

    /// The key, borrowed from the document buffer.
    pub fn key(&self) -> StringOrLiteral<'a> {
        StringOrLiteral::borrowed(self.key)
    }

    /// `true` for the "not found" element.
    pub fn is_eod(&self) -> bool {
        self.ty == Type::Eod
    }

    /// Tag, key and payload exactly as encoded.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Encoded payload, without tag and key.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Offset of the payload inside the outermost document being read.
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the type byte inside the outermost document being read.
    pub(crate) fn start(&self) -> usize {
        self.offset - (self.raw.len() - self.payload.len())
    }

    fn reader<T: BsonType>(&self) -> Result<Reader<'a>> {
        expect_type::<T>(self.ty)?;
        Ok(Reader::new(self.payload, self.offset))
    }

    pub fn get_double(&self) -> Result<BDouble> {
        let value = self.reader::<BDouble>()?.read_f64()?;
        Ok(BDouble { value })
    }

    pub fn get_string(&self) -> Result<BString<'a>> {
        let value = self.reader::<BString>()?.read_string()?;
        Ok(BString::new(value))
    }

    pub fn get_document(&self) -> Result<BDocument<'a>> {
        self.reader::<BDocument>()?;
        Ok(BDocument {
            value: DocumentView::new(self.payload)?,
        })
    }

    pub fn get_array(&self) -> Result<BArray<'a>> {
        self.reader::<BArray>()?;
        Ok(BArray {
            value: ArrayView::new(self.payload)?,
        })
    }

    pub fn get_binary(&self) -> Result<BBinary<'a>> {
        let mut r = self.reader::<BBinary>()?;
        let size = r.read_i32()? as usize;
        let subtype = BinarySubtype::from(r.read_u8()?);
        let mut bytes = r.read_bytes(size)?;
        // the old binary sub-type repeats the payload length
        if subtype == BinarySubtype::BinaryDeprecated && size >= 4 {
            let inner = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            if inner < 0 || inner as usize != size - 4 {
                return Err(Error::malformed(self.offset, "old binary length mismatch"));
            }
            bytes = &bytes[4..];
        }
        Ok(BBinary { subtype, bytes })
    }

    pub fn get_undefined(&self) -> Result<BUndefined> {
        self.reader::<BUndefined>()?;
        Ok(BUndefined)
    }

    pub fn get_oid(&self) -> Result<BOid> {
        let bytes = self.reader::<BOid>()?.read_bytes(12)?;
        Ok(BOid {
            value: Oid::from_bytes(bytes),
        })
    }

    pub fn get_bool(&self) -> Result<BBool> {
        let mut r = self.reader::<BBool>()?;
        let value = match r.read_u8()? {
            0 => false,
            1 => true,
            _ => return Err(Error::malformed(self.offset, "boolean is neither 0 nor 1")),
        };
        Ok(BBool { value })
    }

    pub fn get_date(&self) -> Result<BDate> {
        let value = self.reader::<BDate>()?.read_i64()?;
        Ok(BDate { value })
    }

    pub fn get_null(&self) -> Result<BNull> {
        self.reader::<BNull>()?;
        Ok(BNull)
    }

    pub fn get_regex(&self) -> Result<BRegex<'a>> {
        let mut r = self.reader::<BRegex>()?;
        let regex = r.read_cstring()?;
        let options = r.read_cstring()?;
        Ok(BRegex::new(regex, options))
    }

    pub fn get_dbpointer(&self) -> Result<BDbPointer<'a>> {
        let mut r = self.reader::<BDbPointer>()?;
        let collection = r.read_string()?;
        let value = Oid::from_bytes(r.read_bytes(12)?);
        Ok(BDbPointer {
            collection: collection.into(),
            value,
        })
    }

    pub fn get_code(&self) -> Result<BCode<'a>> {
        let code = self.reader::<BCode>()?.read_string()?;
        Ok(BCode::new(code))
    }

    pub fn get_symbol(&self) -> Result<BSymbol<'a>> {
        let symbol = self.reader::<BSymbol>()?.read_string()?;
        Ok(BSymbol::new(symbol))
    }

    pub fn get_codewscope(&self) -> Result<BCodeWScope<'a>> {
        let mut r = self.reader::<BCodeWScope>()?;
        r.read_i32()?;
        let code = r.read_string()?;
        let scope = r.read_document_bytes()?;
        if r.remaining() != 0 {
            return Err(r.error("code with scope length mismatch"));
        }
        Ok(BCodeWScope {
            code: code.into(),
            scope: DocumentView::new(scope)?,
        })
    }

    pub fn get_int32(&self) -> Result<BInt32> {
        let value = self.reader::<BInt32>()?.read_i32()?;
        Ok(BInt32 { value })
    }

    pub fn get_timestamp(&self) -> Result<BTimestamp> {
        let raw = self.reader::<BTimestamp>()?.read_u64()?;
        Ok(BTimestamp::from_u64(raw))
    }

    pub fn get_int64(&self) -> Result<BInt64> {
        let value = self.reader::<BInt64>()?.read_i64()?;
        Ok(BInt64 { value })
    }

    pub fn get_decimal128(&self) -> Result<BDecimal128> {
        let mut r = self.reader::<BDecimal128>()?;
        let low = r.read_u64()?;
        let high = r.read_u64()?;
        Ok(BDecimal128 { high, low })
    }

    pub fn get_minkey(&self) -> Result<BMinKey> {
        self.reader::<BMinKey>()?;
        Ok(BMinKey)
    }

    pub fn get_maxkey(&self) -> Result<BMaxKey> {
        self.reader::<BMaxKey>()?;
        Ok(BMaxKey)
    }

    /// Decodes the payload whatever its type. Fails only for corrupt payloads
    /// and for the EOD element, which reports a mismatch against `Null`.
    pub fn value(&self) -> Result<Bson<'a>> {
        let value = match self.ty {
            Type::Double => self.get_double()?.into(),
            Type::String => self.get_string()?.into(),
            Type::Document => self.get_document()?.into(),
            Type::Array => self.get_array()?.into(),
            Type::Binary => self.get_binary()?.into(),
            Type::Undefined => BUndefined.into(),
            Type::Oid => self.get_oid()?.into(),
            Type::Bool => self.get_bool()?.into(),
            Type::Date => self.get_date()?.into(),
            Type::Null => BNull.into(),
            Type::Regex => self.get_regex()?.into(),
            Type::DbPointer => self.get_dbpointer()?.into(),
            Type::Code => self.get_code()?.into(),
            Type::Symbol => self.get_symbol()?.into(),
            Type::CodeWScope => self.get_codewscope()?.into(),
            Type::Int32 => self.get_int32()?.into(),
            Type::Timestamp => self.get_timestamp()?.into(),
            Type::Int64 => self.get_int64()?.into(),
            Type::Decimal128 => self.get_decimal128()?.into(),
            Type::MinKey => BMinKey.into(),
            Type::MaxKey => BMaxKey.into(),
            Type::Eod => {
                return Err(Error::TypeMismatch {
                    expected: Type::Null,
                    actual: Type::Eod,
                })
            }
        };
        Ok(value)
    }

    /// Looks `key` up when this element is a document or an array, the EOD
    /// element otherwise.
    pub fn get(&self, key: &str) -> Result<Element<'a>> {
        match self.ty {
            Type::Document | Type::Array => DocumentView::new(self.payload)?.get(key),
            _ => Ok(Element::eod()),
        }
    }

    /// Looks `index` up when this element is an array or a document, the EOD
    /// element otherwise.
    pub fn at(&self, index: usize) -> Result<Element<'a>> {
        match self.ty {
            Type::Document | Type::Array => ArrayView::new(self.payload)?.get(index),
            _ => Ok(Element::eod()),
        }
    }
}

impl<'a> PartialEq for Element<'a> {
    fn eq(&self, other: &Self) -> bool {
        if self.key != other.key || self.ty != other.ty {
            return false;
        }
        match (self.value(), other.value()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.raw == other.raw,
        }
    }
}

impl<'a> fmt::Debug for Element<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("key", &self.key).field("type", &self.ty);
        match self.value() {
            Ok(v) => s.field("value", &v),
            Err(_) => s.field("raw", &self.raw),
        };
        s.finish()
    }
}
