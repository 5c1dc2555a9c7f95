//! Declarative record descriptors and schema derivation.
//!
//! Every record type stored in a dataset declares its fields exactly once,
//! as a static `RecordDesc`. The storage `Schema` is derived from that
//! descriptor, so column names, kinds, and order cannot drift from what the
//! cache layer persists.
//!
//! Derivation rules:
//! - `Optional(k)` unwraps to `k`; absent values are stored as `Scalar::Null`.
//! - `Sequence(k)` maps to `DataType::List(k)`.
//! - `Record(desc)` recurses and becomes a `DataType::Struct` sub-schema.
//! - Anything else fails with `Error::UnsupportedKind`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::schema::{DataType, Field, Schema};

/// Declared kind of a record field.
#[derive(Debug, Clone)]
pub enum Kind {
    Utf8,
    Int32,
    Float32,
    Optional(Box<Kind>),
    Sequence(Box<Kind>),
    Record(&'static RecordDesc),
    // Declarable, but the storage layer has no column kind for these.
    Boolean,
    Int64,
    Float64,
}

impl Kind {
    pub fn optional(inner: Kind) -> Self {
        Kind::Optional(Box::new(inner))
    }

    pub fn sequence(inner: Kind) -> Self {
        Kind::Sequence(Box::new(inner))
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Utf8 => write!(f, "string"),
            Kind::Int32 => write!(f, "int32"),
            Kind::Float32 => write!(f, "float32"),
            Kind::Optional(inner) => write!(f, "optional<{inner}>"),
            Kind::Sequence(inner) => write!(f, "sequence<{inner}>"),
            Kind::Record(desc) => write!(f, "record<{}>", desc.name),
            Kind::Boolean => write!(f, "bool"),
            Kind::Int64 => write!(f, "int64"),
            Kind::Float64 => write!(f, "float64"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDesc {
    pub name: &'static str,
    pub kind: Kind,
    /// Names the field may carry in raw upstream records.
    pub aliases: Vec<&'static str>,
}

impl FieldDesc {
    pub fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            aliases: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: &'static str) -> Self {
        self.aliases.push(alias);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordDesc {
    pub name: &'static str,
    pub fields: Vec<FieldDesc>,
}

impl RecordDesc {
    pub fn new(name: &'static str, fields: Vec<FieldDesc>) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `(alias, canonical)` pairs in declaration order.
    pub fn aliases(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.fields
            .iter()
            .flat_map(|f| f.aliases.iter().map(move |a| (*a, f.name)))
    }
}

/// A record type that can be stored as a row of a columnar dataset.
///
/// Implementors return a static descriptor whose field names match the
/// type's serde field names.
pub trait Record: Serialize + DeserializeOwned {
    fn describe() -> &'static RecordDesc;

    fn schema() -> Result<Schema> {
        derive_schema(Self::describe())
    }
}

/// Derive the storage schema for a record descriptor.
pub fn derive_schema(desc: &RecordDesc) -> Result<Schema> {
    let fields = derive_fields(desc)?;
    Ok(Schema::new(fields))
}

fn derive_fields(desc: &RecordDesc) -> Result<Vec<Field>> {
    desc.fields
        .iter()
        .map(|f| Ok(Field::new(f.name, data_type_of(f.name, &f.kind)?)))
        .collect()
}

fn data_type_of(field: &str, kind: &Kind) -> Result<DataType> {
    match kind {
        Kind::Utf8 => Ok(DataType::Utf8),
        Kind::Int32 => Ok(DataType::Int32),
        Kind::Float32 => Ok(DataType::Float32),
        Kind::Optional(inner) => data_type_of(field, inner),
        Kind::Sequence(inner) => Ok(DataType::list(data_type_of(field, inner)?)),
        Kind::Record(desc) => Ok(DataType::Struct(derive_fields(desc)?)),
        other => Err(Error::UnsupportedKind {
            field: field.to_string(),
            kind: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static PARTIAL: Lazy<RecordDesc> = Lazy::new(|| {
        RecordDesc::new(
            "Partial",
            vec![
                FieldDesc::new("name", Kind::Utf8),
                FieldDesc::new("mana_value", Kind::optional(Kind::Int32)).alias("manaValue"),
                FieldDesc::new("types", Kind::sequence(Kind::Utf8)),
            ],
        )
    });

    static FACE: Lazy<RecordDesc> = Lazy::new(|| {
        RecordDesc::new(
            "Face",
            vec![
                FieldDesc::new("name", Kind::Utf8),
                FieldDesc::new("rating", Kind::optional(Kind::Float32)),
            ],
        )
    });

    static SPLIT: Lazy<RecordDesc> = Lazy::new(|| {
        RecordDesc::new(
            "Split",
            vec![
                FieldDesc::new("name", Kind::Utf8),
                FieldDesc::new("front", Kind::Record(&FACE)),
                FieldDesc::new("faces", Kind::sequence(Kind::Record(&FACE))),
            ],
        )
    });

    #[test]
    fn test_optional_unwraps_and_sequence_maps_to_list() {
        let schema = derive_schema(&PARTIAL).unwrap();
        assert_eq!(
            schema,
            Schema::new(vec![
                Field::new("name", DataType::Utf8),
                Field::new("mana_value", DataType::Int32),
                Field::new("types", DataType::list(DataType::Utf8)),
            ])
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_schema(&PARTIAL).unwrap();
        for _ in 0..5 {
            let b = derive_schema(&PARTIAL).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        }
    }

    #[test]
    fn test_nested_records_become_structs() {
        let schema = derive_schema(&SPLIT).unwrap();
        let face = DataType::Struct(vec![
            Field::new("name", DataType::Utf8),
            Field::new("rating", DataType::Float32),
        ]);
        assert_eq!(schema.fields[1].data_type, face);
        assert_eq!(schema.fields[2].data_type, DataType::list(face));
    }

    #[test]
    fn test_unsupported_kind_is_rejected() {
        let desc = RecordDesc::new(
            "Bad",
            vec![
                FieldDesc::new("name", Kind::Utf8),
                FieldDesc::new("foil", Kind::optional(Kind::Boolean)),
            ],
        );
        match derive_schema(&desc) {
            Err(Error::UnsupportedKind { field, kind }) => {
                assert_eq!(field, "foil");
                assert_eq!(kind, "bool");
            }
            other => panic!("expected UnsupportedKind, got {other:?}"),
        }
    }

    #[test]
    fn test_aliases_in_declaration_order() {
        let pairs: Vec<_> = PARTIAL.aliases().collect();
        assert_eq!(pairs, vec![("manaValue", "mana_value")]);
        assert!(PARTIAL.field("types").is_some());
    }
}
