use std::borrow::{Borrow, Cow};
use std::fmt;
use std::ops::Deref;

/// Text that either borrows from somewhere else (a literal, or the bytes of
/// a document being read) or owns a heap `String`.
///
/// Building from a `&str` never allocates; cloning an owned value copies
/// it. Keys and string payloads decoded from a view are always borrowed.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringOrLiteral<'a>(Cow<'a, str>);

impl<'a> StringOrLiteral<'a> {
    pub const fn borrowed(s: &'a str) -> Self {
        StringOrLiteral(Cow::Borrowed(s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when no allocation backs this text.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.0, Cow::Borrowed(_))
    }

    /// Detaches from the borrowed buffer, copying if needed.
    pub fn into_owned(self) -> StringOrLiteral<'static> {
        StringOrLiteral(Cow::Owned(self.0.into_owned()))
    }
}

impl<'a> Deref for StringOrLiteral<'a> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<'a> AsRef<str> for StringOrLiteral<'a> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'a> Borrow<str> for StringOrLiteral<'a> {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for StringOrLiteral<'a> {
    fn from(s: &'a str) -> Self {
        StringOrLiteral(Cow::Borrowed(s))
    }
}

impl<'a> From<String> for StringOrLiteral<'a> {
    fn from(s: String) -> Self {
        StringOrLiteral(Cow::Owned(s))
    }
}

impl<'a> From<Cow<'a, str>> for StringOrLiteral<'a> {
    fn from(s: Cow<'a, str>) -> Self {
        StringOrLiteral(s)
    }
}

impl<'a> PartialEq<str> for StringOrLiteral<'a> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<'a, 'b> PartialEq<&'b str> for StringOrLiteral<'a> {
    fn eq(&self, other: &&'b str) -> bool {
        self.as_str() == *other
    }
}

impl<'a> fmt::Debug for StringOrLiteral<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<'a> fmt::Display for StringOrLiteral<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
