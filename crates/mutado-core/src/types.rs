//! Structural type model for Mutado data shapes
//!
//! Paths are typed against these descriptors at configuration time, long
//! before any data value is seen. The descriptors are structural: two object
//! types are interchangeable when their name and fields match, which lets
//! them participate in edge identity.

use std::fmt;
use serde::Serialize;

use crate::{Error, Result};

/// Static type of a point in a data model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    /// The null/unit type
    Null,
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    String,
    /// Homogeneous array with an element type
    Array(Box<DataType>),
    /// Named object with declared fields
    Object(ObjectType),
    /// Keyed container accessed through an indexer
    Dictionary {
        key: Box<DataType>,
        value: Box<DataType>,
    },
}

/// A named object type with an ordered field list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectType {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

/// One declared field of an object type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: DataType,
}

/// Constant indexer parameter, part of edge identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Key {
    Int(i64),
    String(String),
    Bool(bool),
}

/// Constant expression value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl DataType {
    /// Build an object type from a name and (field, type) pairs
    pub fn object(name: impl Into<String>, fields: Vec<(&str, DataType)>) -> Self {
        DataType::Object(ObjectType {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        })
    }

    /// Build an array type over an element type
    pub fn array(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    /// Build a dictionary type
    pub fn dictionary(key: DataType, value: DataType) -> Self {
        DataType::Dictionary {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// The element type, when this is an array
    pub fn element(&self) -> Option<&DataType> {
        match self {
            DataType::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Look up a declared field type, when this is an object
    pub fn field(&self, name: &str) -> Result<&DataType> {
        match self {
            DataType::Object(object) => object
                .fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| &f.ty)
                .ok_or_else(|| Error::UnknownMember {
                    object: object.name.clone(),
                    member: name.to_string(),
                }),
            other => Err(Error::UnknownMember {
                object: other.to_string(),
                member: name.to_string(),
            }),
        }
    }

    /// The value type reachable through the indexer, when this carries one
    pub fn indexer_value(&self) -> Result<&DataType> {
        match self {
            DataType::Dictionary { value, .. } => Ok(value),
            other => Err(Error::MissingIndexer {
                ty: other.to_string(),
            }),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

impl Literal {
    /// The static type of this constant
    pub fn type_of(&self) -> DataType {
        match self {
            Literal::Null => DataType::Null,
            Literal::Bool(_) => DataType::Bool,
            Literal::Int(_) => DataType::Int,
            Literal::Float(_) => DataType::Float,
            Literal::String(_) => DataType::String,
        }
    }

    /// Convert into a runtime JSON value
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Literal::Null => serde_json::Value::Null,
            Literal::Bool(b) => serde_json::Value::Bool(*b),
            Literal::Int(i) => serde_json::Value::from(*i),
            Literal::Float(x) => serde_json::Value::from(*x),
            Literal::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Fold into a constant indexer key, when representable as one
    pub fn to_key(&self) -> Option<Key> {
        match self {
            Literal::Int(i) => Some(Key::Int(*i)),
            Literal::String(s) => Some(Key::String(s.clone())),
            Literal::Bool(b) => Some(Key::Bool(*b)),
            Literal::Null | Literal::Float(_) => None,
        }
    }
}

impl Key {
    /// Widen back into a literal
    pub fn to_literal(&self) -> Literal {
        match self {
            Key::Int(i) => Literal::Int(*i),
            Key::String(s) => Literal::String(s.clone()),
            Key::Bool(b) => Literal::Bool(*b),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "null"),
            DataType::Bool => write!(f, "bool"),
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::String => write!(f, "string"),
            DataType::Array(element) => write!(f, "{}[]", element),
            DataType::Object(object) => write!(f, "{}", object.name),
            DataType::Dictionary { key, value } => write!(f, "dict<{}, {}>", key, value),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::String(s) => write!(f, "'{}'", s),
            Key::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_type() -> DataType {
        DataType::object(
            "Order",
            vec![
                ("number", DataType::String),
                ("lines", DataType::array(DataType::object(
                    "Line",
                    vec![("quantity", DataType::Int)],
                ))),
            ],
        )
    }

    #[test]
    fn test_field_lookup() {
        let ty = order_type();
        assert_eq!(ty.field("number").unwrap(), &DataType::String);
        assert!(ty.field("lines").unwrap().is_array());
    }

    #[test]
    fn test_unknown_member_is_fatal() {
        let ty = order_type();
        let err = ty.field("missing").unwrap_err();
        assert!(err.to_string().contains("Order"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_indexer_requires_dictionary() {
        let dict = DataType::dictionary(DataType::String, DataType::Int);
        assert_eq!(dict.indexer_value().unwrap(), &DataType::Int);
        assert!(DataType::String.indexer_value().is_err());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(order_type(), order_type());
        assert_ne!(order_type(), DataType::object("Order", vec![]));
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::array(DataType::Int).to_string(), "int[]");
        assert_eq!(order_type().to_string(), "Order");
        assert_eq!(Literal::String("x".into()).to_string(), "'x'");
        assert_eq!(Key::Int(3).to_string(), "3");
    }
}
