use derive_more::{Debug, Deref};

use crate::ValidationError;

/// A UTF-8 string that fits in a single-byte length prefix.
#[derive(Clone, Debug, PartialEq, Eq, Deref)]
pub struct Text(String);

impl Text {
    /// Creates a new [`Text`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StringTooLong`] if the string is longer than 255 bytes.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.len() > u8::MAX as usize {
            return Err(ValidationError::StringTooLong(s.len()));
        }
        Ok(Self(s))
    }
}

/// A value waiting in the outbound map.
#[derive(Debug)]
pub enum Datum {
    /// Nothing.
    Empty,
    /// A single byte.
    Byte(u8),
    /// A boolean, written as a single byte.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// A length-prefixed string.
    Text(Text),
    /// Elements concatenated.
    Seq(Vec<Datum>),
    /// A value produced at flush time.
    #[debug("Lazy")]
    Lazy(Box<dyn FnOnce() -> Datum + Send>),
}

impl Datum {
    /// Creates a lazily evaluated datum.
    pub fn lazy(f: impl FnOnce() -> Datum + Send + 'static) -> Self {
        Self::Lazy(Box::new(f))
    }

    /// Appends the wire representation to `buf`.
    pub fn write_to(self, buf: &mut Vec<u8>) {
        match self {
            Datum::Empty => {}
            Datum::Byte(v) => buf.push(v),
            Datum::Bool(v) => buf.push(v as u8),
            Datum::Bytes(v) => buf.extend_from_slice(&v),
            Datum::Text(v) => {
                buf.push(v.len() as u8);
                buf.extend_from_slice(v.as_bytes());
            }
            Datum::Seq(v) => v.into_iter().for_each(|d| d.write_to(buf)),
            Datum::Lazy(f) => f().write_to(buf),
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }
}

impl From<u8> for Datum {
    fn from(value: u8) -> Self {
        Datum::Byte(value)
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Bool(value)
    }
}

impl From<Vec<u8>> for Datum {
    fn from(value: Vec<u8>) -> Self {
        Datum::Bytes(value)
    }
}

impl From<Text> for Datum {
    fn from(value: Text) -> Self {
        Datum::Text(value)
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(value: Option<T>) -> Self {
        value.map_or(Datum::Empty, Into::into)
    }
}
