//! Wire field extraction: map tagged record fields to wire schema fields.
//!
//! Only fields explicitly annotated with a wire tag reach the wire. The tag
//! is declared in attribute metadata under [`TAG_METADATA_KEY`]; anything
//! else stays part of the logical attribute tree but is excluded from the
//! generated message. A tagged field whose type has no wire scalar mapping
//! is a fault, not a silent drop: emitting a mis-typed field would corrupt
//! the wire contract.

use crate::design::{as_record, Attribute, Primitive, Type, TypeArena};
use heck::ToSnakeCase;
use serde::Serialize;

/// Reserved metadata key carrying a field's wire tag. The first value must
/// parse as a non-negative integer; otherwise the field has no tag.
pub const TAG_METADATA_KEY: &str = "rpc:tag";

/// One field of a generated wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    pub type_name: String,
    pub tag: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("message {message}: field {field}: type {type_name} has no wire mapping")]
    UnsupportedType {
        message: String,
        field: String,
        type_name: String,
    },
    #[error("message {message}: field {field}: duplicate wire tag {tag}")]
    DuplicateTag {
        message: String,
        field: String,
        tag: u64,
    },
}

/// Wire tag declared on the attribute, if any. A value that does not parse
/// is treated as "no tag", not as an error.
pub fn wire_tag(attr: &Attribute) -> Option<u64> {
    attr.metadata
        .get(TAG_METADATA_KEY)?
        .first()?
        .parse()
        .ok()
}

/// Wire scalar type name for a primitive kind.
pub fn wire_native_type_name(p: Primitive) -> &'static str {
    match p {
        Primitive::Bool => "bool",
        Primitive::Int32 => "int32",
        Primitive::Int64 => "int64",
        Primitive::UInt32 => "uint32",
        Primitive::UInt64 => "uint64",
        Primitive::Float32 => "float",
        Primitive::Float64 => "double",
        Primitive::String => "string",
        Primitive::Bytes => "bytes",
    }
}

/// Wire type name of an attribute. `None` for anything that is not a
/// primitive; callers turn that into [`WireError::UnsupportedType`].
pub fn wire_type_name(attr: &Attribute) -> Option<&'static str> {
    match attr.ty {
        Type::Primitive(p) => Some(wire_native_type_name(p)),
        _ => None,
    }
}

/// Extract the wire fields of a finalized request/response attribute.
///
/// A record yields one field per tagged record field, in declared order. A
/// non-record (bare scalar derived straight from a payload/result) with a
/// tag on the attribute itself yields one synthetic field named after the
/// owning message.
pub fn extract_fields(
    arena: &TypeArena,
    owner: &str,
    attr: &Attribute,
) -> Result<Vec<FieldSchema>, WireError> {
    let mut out: Vec<FieldSchema> = Vec::new();
    if let Some(rec) = as_record(arena, &attr.ty) {
        for field in &rec.fields {
            let Some(tag) = wire_tag(&field.attribute) else {
                // Untagged fields never reach the wire.
                continue;
            };
            let Some(type_name) = wire_type_name(&field.attribute) else {
                return Err(WireError::UnsupportedType {
                    message: owner.to_string(),
                    field: field.name.clone(),
                    type_name: describe(arena, &field.attribute.ty),
                });
            };
            if out.iter().any(|f| f.tag == tag) {
                return Err(WireError::DuplicateTag {
                    message: owner.to_string(),
                    field: field.name.clone(),
                    tag,
                });
            }
            out.push(FieldSchema {
                name: field.name.to_snake_case(),
                type_name: type_name.to_string(),
                tag,
            });
        }
    } else if let Some(tag) = wire_tag(attr) {
        let synthetic = format!("{}Field", owner);
        let Some(type_name) = wire_type_name(attr) else {
            return Err(WireError::UnsupportedType {
                message: owner.to_string(),
                field: synthetic,
                type_name: describe(arena, &attr.ty),
            });
        };
        out.push(FieldSchema {
            name: synthetic.to_snake_case(),
            type_name: type_name.to_string(),
            tag,
        });
    }
    Ok(out)
}

fn describe(arena: &TypeArena, ty: &Type) -> String {
    match ty {
        Type::Empty => "empty".to_string(),
        Type::Primitive(p) => wire_native_type_name(*p).to_string(),
        Type::Named(id) => arena.name(*id).to_string(),
        Type::Record(_) => "record".to_string(),
        Type::Sequence(_) => "sequence".to_string(),
        Type::Map { .. } => "map".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{Field, Record};

    fn tagged(mut attr: Attribute, tag: &str) -> Attribute {
        attr.metadata
            .insert(TAG_METADATA_KEY.to_string(), vec![tag.to_string()]);
        attr
    }

    fn int32() -> Attribute {
        Attribute::new(Type::Primitive(Primitive::Int32))
    }

    fn record(fields: Vec<(&str, Attribute)>) -> Attribute {
        Attribute::new(Type::Record(Record {
            fields: fields
                .into_iter()
                .map(|(name, attribute)| Field {
                    name: name.to_string(),
                    attribute,
                })
                .collect(),
        }))
    }

    #[test]
    fn only_tagged_fields_are_extracted() {
        let arena = TypeArena::new();
        let attr = record(vec![
            ("a", tagged(int32(), "1")),
            ("b", int32()),
            ("c", tagged(int32(), "2")),
        ]);

        let fields = extract_fields(&arena, "AddRequest", &attr).expect("extract");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], FieldSchema {
            name: "a".to_string(),
            type_name: "int32".to_string(),
            tag: 1,
        });
        assert_eq!(fields[1].name, "c");
        assert_eq!(fields[1].tag, 2);
    }

    #[test]
    fn unparsable_tag_means_no_tag() {
        let arena = TypeArena::new();
        let attr = record(vec![("a", tagged(int32(), "not-a-number"))]);
        let fields = extract_fields(&arena, "AddRequest", &attr).expect("extract");
        assert!(fields.is_empty());
    }

    #[test]
    fn field_names_are_snake_cased() {
        let arena = TypeArena::new();
        let attr = record(vec![("accountID", tagged(int32(), "3"))]);
        let fields = extract_fields(&arena, "LookupRequest", &attr).expect("extract");
        assert_eq!(fields[0].name, "account_id");
    }

    #[test]
    fn bare_scalar_gets_a_synthetic_field() {
        let arena = TypeArena::new();
        let attr = tagged(int32(), "1");
        let fields = extract_fields(&arena, "AddResponse", &attr).expect("extract");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "add_response_field");
        assert_eq!(fields[0].type_name, "int32");
        assert_eq!(fields[0].tag, 1);
    }

    #[test]
    fn untagged_bare_scalar_yields_nothing() {
        let arena = TypeArena::new();
        let fields = extract_fields(&arena, "AddResponse", &int32()).expect("extract");
        assert!(fields.is_empty());
    }

    #[test]
    fn empty_attribute_yields_nothing() {
        let arena = TypeArena::new();
        let attr = Attribute::new(Type::Empty);
        let fields = extract_fields(&arena, "PingRequest", &attr).expect("extract");
        assert!(fields.is_empty());
    }

    #[test]
    fn non_scalar_field_is_a_fault() {
        let mut arena = TypeArena::new();
        let operand = arena.intern("Operand", record(vec![("value", int32())]));
        let attr = record(vec![(
            "left",
            tagged(Attribute::new(Type::Named(operand)), "1"),
        )]);

        let err = extract_fields(&arena, "AddRequest", &attr).unwrap_err();
        match err {
            WireError::UnsupportedType {
                message,
                field,
                type_name,
            } => {
                assert_eq!(message, "AddRequest");
                assert_eq!(field, "left");
                assert_eq!(type_name, "Operand");
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_tag_is_a_fault() {
        let arena = TypeArena::new();
        let attr = record(vec![
            ("a", tagged(int32(), "1")),
            ("b", tagged(int32(), "1")),
        ]);

        let err = extract_fields(&arena, "AddRequest", &attr).unwrap_err();
        assert!(matches!(err, WireError::DuplicateTag { tag: 1, .. }));
    }

    #[test]
    fn sequence_response_with_tag_is_a_fault() {
        let arena = TypeArena::new();
        let attr = tagged(
            Attribute::new(Type::Sequence(Box::new(int32()))),
            "1",
        );
        let err = extract_fields(&arena, "ListResponse", &attr).unwrap_err();
        assert!(matches!(err, WireError::UnsupportedType { .. }));
    }
}
