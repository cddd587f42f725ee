use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Names the dynamic type of a stored value.
///
/// A non-empty store remembers the tag of its first value and rejects writes
/// carrying any other tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Create a tag from a static name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The tag's name.
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A value that can report its dynamic type.
///
/// Ordinary Rust types return one constant tag, which makes a type mismatch
/// impossible for stores of that type. Sum types such as [`Value`] return a
/// tag per variant and get the runtime check.
pub trait Tagged {
    fn type_tag(&self) -> TypeTag;
}

macro_rules! constant_tag {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Tagged for $ty {
                fn type_tag(&self) -> TypeTag {
                    TypeTag::new($name)
                }
            }
        )*
    };
}

constant_tag! {
    String => "string",
    &'static str => "string",
    i64 => "i64",
    u64 => "u64",
    i32 => "i32",
    u32 => "u32",
    f64 => "f64",
    bool => "bool",
    char => "char",
    Vec<u8> => "bytes",
}

/// A dynamically typed value.
///
/// A store of `Value` accepts whichever variant arrives first and then only
/// that variant until the store is emptied again.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl Tagged for Value {
    fn type_tag(&self) -> TypeTag {
        match self {
            Self::Str(_) => TypeTag::new("string"),
            Self::Int(_) => TypeTag::new("int"),
            Self::Float(_) => TypeTag::new("float"),
            Self::Bool(_) => TypeTag::new("bool"),
            Self::Bytes(_) => TypeTag::new("bytes"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

/// Admit `value` into a store whose fixed type is `fixed`, fixing it if the
/// store is empty.
pub(crate) fn admit<V: Tagged>(fixed: &mut Option<TypeTag>, value: &V) -> StoreResult<()> {
    let found = value.type_tag();
    match *fixed {
        None => {
            *fixed = Some(found);
            Ok(())
        }
        Some(expected) if expected == found => Ok(()),
        Some(expected) => Err(StoreError::TypeMismatch { expected, found }),
    }
}

/// Whether `value` has the store's fixed type. An empty store matches nothing.
pub(crate) fn matches_fixed<V: Tagged>(fixed: Option<TypeTag>, value: &V) -> bool {
    fixed == Some(value.type_tag())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_tags_follow_variant() {
        assert_eq!(Value::from("a").type_tag(), Value::from("b").type_tag());
        assert_ne!(Value::from("a").type_tag(), Value::from(1_i64).type_tag());
        assert_ne!(Value::from(1_i64).type_tag(), Value::from(1.0).type_tag());
    }

    #[test]
    fn plain_types_have_constant_tags() {
        assert_eq!(String::from("x").type_tag(), String::new().type_tag());
        assert_eq!("x".type_tag(), String::new().type_tag());
        assert_eq!(7_i64.type_tag().name(), "i64");
    }

    #[test]
    fn admit_fixes_then_enforces() {
        let mut fixed = None;
        admit(&mut fixed, &Value::from("alice")).unwrap();
        assert_eq!(fixed, Some(TypeTag::new("string")));
        admit(&mut fixed, &Value::from("bob")).unwrap();

        let err = admit(&mut fixed, &Value::from(42_i64)).unwrap_err();
        assert_eq!(
            err,
            StoreError::TypeMismatch {
                expected: TypeTag::new("string"),
                found: TypeTag::new("int"),
            }
        );
        assert_eq!(fixed, Some(TypeTag::new("string")));
    }

    #[test]
    fn empty_store_matches_nothing() {
        assert!(!matches_fixed(None, &Value::from("x")));
        assert!(matches_fixed(Some(TypeTag::new("int")), &Value::from(3_i64)));
    }

    #[test]
    fn display() {
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(-4_i64).to_string(), "-4");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(b"a\n".to_vec()).to_string(), "b\"a\\n\"");
        assert_eq!(TypeTag::new("note").to_string(), "note");
    }
}
