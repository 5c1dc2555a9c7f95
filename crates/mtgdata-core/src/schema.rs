//! Storage-level schema types. Pure data; no Arrow dependency here.
//!
//! Schemas are derived from record descriptors (see `record.rs`) and are
//! what the cache layer persists next to the columns. Column order is part
//! of the schema's identity.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::{hash_serde, Hash256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int32,
    Float32,
    Utf8,
    /// Ordered sequence of the inner type.
    List(Box<DataType>),
    /// Nested record, flattened into a named sub-schema.
    Struct(Vec<Field>),
}

impl DataType {
    pub fn list(inner: DataType) -> Self {
        DataType::List(Box::new(inner))
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Int32 => write!(f, "int32"),
            DataType::Float32 => write!(f, "float32"),
            DataType::Utf8 => write!(f, "string"),
            DataType::List(inner) => write!(f, "sequence<{inner}>"),
            DataType::Struct(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.data_type)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stable digest of names, types, and order.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(self)
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", DataType::Struct(self.fields.clone()))
    }
}
