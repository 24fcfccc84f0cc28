//! NBT tag types.

use std::collections::BTreeMap;
use std::fmt;

/// A compound tag: map of name -> tag.
///
/// Sorted so that serialization is byte-for-byte reproducible.
pub type NbtCompound = BTreeMap<String, NbtTag>;

/// A named root compound (the root always has a name, often empty string).
#[derive(Debug, Clone, PartialEq)]
pub struct NbtRoot {
    pub name: String,
    pub compound: NbtCompound,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, compound: NbtCompound) -> Self {
        Self {
            name: name.into(),
            compound,
        }
    }

    /// Root with an empty name, the common case for chunk records.
    pub fn unnamed(compound: NbtCompound) -> Self {
        Self::new("", compound)
    }
}

/// Represents any NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtTag>),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    /// Returns the numeric tag type ID (0-12). TAG_End is 0 but not representable here.
    pub fn tag_type_id(&self) -> u8 {
        match self {
            NbtTag::Byte(_) => 1,
            NbtTag::Short(_) => 2,
            NbtTag::Int(_) => 3,
            NbtTag::Long(_) => 4,
            NbtTag::Float(_) => 5,
            NbtTag::Double(_) => 6,
            NbtTag::ByteArray(_) => 7,
            NbtTag::String(_) => 8,
            NbtTag::List(_) => 9,
            NbtTag::Compound(_) => 10,
            NbtTag::IntArray(_) => 11,
            NbtTag::LongArray(_) => 12,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            NbtTag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            NbtTag::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            NbtTag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            NbtTag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            NbtTag::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            NbtTag::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integral tag widened to `i64`. Both formats are loose about
    /// which width they use for the same field across versions.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            NbtTag::Byte(v) => Some(*v as i64),
            NbtTag::Short(v) => Some(*v as i64),
            NbtTag::Int(v) => Some(*v as i64),
            NbtTag::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric tag widened to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            NbtTag::Float(v) => Some(*v as f64),
            NbtTag::Double(v) => Some(*v),
            other => other.as_integer().map(|v| v as f64),
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            NbtTag::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            NbtTag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut NbtCompound> {
        match self {
            NbtTag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NbtTag]> {
        match self {
            NbtTag::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<NbtTag>> {
        match self {
            NbtTag::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            NbtTag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            NbtTag::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            NbtTag::LongArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for NbtTag {
    fn from(v: bool) -> Self {
        NbtTag::Byte(v as i8)
    }
}

impl From<i8> for NbtTag {
    fn from(v: i8) -> Self {
        NbtTag::Byte(v)
    }
}

impl From<i16> for NbtTag {
    fn from(v: i16) -> Self {
        NbtTag::Short(v)
    }
}

impl From<i32> for NbtTag {
    fn from(v: i32) -> Self {
        NbtTag::Int(v)
    }
}

impl From<i64> for NbtTag {
    fn from(v: i64) -> Self {
        NbtTag::Long(v)
    }
}

impl From<f32> for NbtTag {
    fn from(v: f32) -> Self {
        NbtTag::Float(v)
    }
}

impl From<f64> for NbtTag {
    fn from(v: f64) -> Self {
        NbtTag::Double(v)
    }
}

impl From<&str> for NbtTag {
    fn from(v: &str) -> Self {
        NbtTag::String(v.to_string())
    }
}

impl From<String> for NbtTag {
    fn from(v: String) -> Self {
        NbtTag::String(v)
    }
}

impl From<NbtCompound> for NbtTag {
    fn from(v: NbtCompound) -> Self {
        NbtTag::Compound(v)
    }
}

/// Typed lookups on a compound, so call sites read
/// `c.get_int("x")` instead of `c.get("x").and_then(|t| t.as_int())`.
pub trait CompoundExt {
    fn get_byte(&self, key: &str) -> Option<i8>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_short(&self, key: &str) -> Option<i16>;
    fn get_int(&self, key: &str) -> Option<i32>;
    fn get_long(&self, key: &str) -> Option<i64>;
    fn get_float(&self, key: &str) -> Option<f32>;
    fn get_double(&self, key: &str) -> Option<f64>;
    fn get_integer(&self, key: &str) -> Option<i64>;
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_compound(&self, key: &str) -> Option<&NbtCompound>;
    fn get_list(&self, key: &str) -> Option<&[NbtTag]>;
    fn get_int_array(&self, key: &str) -> Option<&[i32]>;
    fn get_long_array(&self, key: &str) -> Option<&[i64]>;
    fn put(&mut self, key: &str, value: impl Into<NbtTag>);
}

impl CompoundExt for NbtCompound {
    fn get_byte(&self, key: &str) -> Option<i8> {
        self.get(key).and_then(|t| t.as_byte())
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|t| t.as_integer()).map(|v| v != 0)
    }

    fn get_short(&self, key: &str) -> Option<i16> {
        self.get(key).and_then(|t| t.as_short())
    }

    fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|t| t.as_int())
    }

    fn get_long(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|t| t.as_long())
    }

    fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(|t| t.as_float())
    }

    fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|t| t.as_double())
    }

    fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|t| t.as_integer())
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|t| t.as_string())
    }

    fn get_compound(&self, key: &str) -> Option<&NbtCompound> {
        self.get(key).and_then(|t| t.as_compound())
    }

    fn get_list(&self, key: &str) -> Option<&[NbtTag]> {
        self.get(key).and_then(|t| t.as_list())
    }

    fn get_int_array(&self, key: &str) -> Option<&[i32]> {
        self.get(key).and_then(|t| t.as_int_array())
    }

    fn get_long_array(&self, key: &str) -> Option<&[i64]> {
        self.get(key).and_then(|t| t.as_long_array())
    }

    fn put(&mut self, key: &str, value: impl Into<NbtTag>) {
        self.insert(key.to_string(), value.into());
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtTag::Byte(v) => write!(f, "{v}b"),
            NbtTag::Short(v) => write!(f, "{v}s"),
            NbtTag::Int(v) => write!(f, "{v}"),
            NbtTag::Long(v) => write!(f, "{v}L"),
            NbtTag::Float(v) => write!(f, "{v}f"),
            NbtTag::Double(v) => write!(f, "{v}d"),
            NbtTag::ByteArray(v) => write!(f, "[B; {} elements]", v.len()),
            NbtTag::String(v) => write!(f, "\"{v}\""),
            NbtTag::List(v) => write!(f, "[{} elements]", v.len()),
            NbtTag::Compound(v) => write!(f, "{{{} entries}}", v.len()),
            NbtTag::IntArray(v) => write!(f, "[I; {} elements]", v.len()),
            NbtTag::LongArray(v) => write!(f, "[L; {} elements]", v.len()),
        }
    }
}
