//! Design tree: types, attributes, and the named-type arena.
//!
//! The design tree is produced by an external front end and consumed read-only
//! by the deriver: every rewrite happens on a duplicate. Named (user) types
//! live in a [`TypeArena`] and are addressed by stable [`NamedId`] indices, so
//! self-referential and mutually-referential types are expressible and
//! renaming a derived copy never touches the shared original.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Wire-representable scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Bool,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Bytes,
}

/// Stable handle to a named type in a [`TypeArena`].
///
/// Handles are only minted by the arena that owns the node; an id is valid for
/// that arena's whole lifetime (nodes are never removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedId(usize);

/// A named (user) type: a renamable identity over one underlying attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedNode {
    pub name: String,
    pub attribute: Attribute,
}

/// Arena holding every named type of a design, plus the derived copies created
/// during a generation pass. Append-only: existing nodes are never removed, so
/// the design stays valid while derivation adds renamed duplicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeArena {
    nodes: Vec<NamedNode>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named type and return its handle.
    pub fn intern(&mut self, name: impl Into<String>, attribute: Attribute) -> NamedId {
        let id = NamedId(self.nodes.len());
        self.nodes.push(NamedNode {
            name: name.into(),
            attribute,
        });
        id
    }

    /// Add a named type with an `Empty` body, to be bound later. This is how a
    /// cycle is closed: reserve the id, build a body that references it, bind.
    pub fn reserve(&mut self, name: impl Into<String>) -> NamedId {
        self.intern(name, Attribute::default())
    }

    /// Replace the body of a reserved node.
    pub fn bind(&mut self, id: NamedId, attribute: Attribute) {
        self.nodes[id.0].attribute = attribute;
    }

    pub fn node(&self, id: NamedId) -> &NamedNode {
        &self.nodes[id.0]
    }

    pub fn name(&self, id: NamedId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn attribute(&self, id: NamedId) -> &Attribute {
        &self.nodes[id.0].attribute
    }

    pub(crate) fn rename(&mut self, id: NamedId, name: String) {
        self.nodes[id.0].name = name;
    }

    /// Number of named types held (design-time plus derived copies).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A data type. `Empty` is the explicit absence marker: an [`Attribute`]
/// always has a type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    #[default]
    Empty,
    Primitive(Primitive),
    Named(NamedId),
    Record(Record),
    Sequence(Box<Attribute>),
    Map {
        key: Box<Attribute>,
        elem: Box<Attribute>,
    },
}

/// Ordered-field record. Field order is declaration order and is preserved
/// through derivation and extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: Vec<Field>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Attribute> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.attribute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub attribute: Attribute,
}

/// Validation rules carried on an attribute. Opaque to this engine: rules are
/// copied around during derivation, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

/// A typed, annotated node in the design tree.
///
/// Metadata is scoped to the node that declared it: duplication copies it,
/// but merge/enrichment never propagates it between nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type", default)]
    pub ty: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Vec<String>>,
}

impl Attribute {
    pub fn new(ty: Type) -> Self {
        Attribute {
            ty,
            ..Default::default()
        }
    }

    /// Deep copy. Every named type reachable from `self` gets a fresh arena
    /// node; sharing and cycles inside the copy are preserved through an
    /// old-id to new-id map. The original nodes are untouched, which is what
    /// makes renaming the copy safe.
    pub fn duplicate(&self, arena: &mut TypeArena) -> Attribute {
        let mut copies = HashMap::new();
        dup_attribute(self, arena, &mut copies)
    }
}

fn dup_attribute(
    attr: &Attribute,
    arena: &mut TypeArena,
    copies: &mut HashMap<NamedId, NamedId>,
) -> Attribute {
    Attribute {
        ty: dup_type(&attr.ty, arena, copies),
        description: attr.description.clone(),
        docs: attr.docs.clone(),
        validation: attr.validation.clone(),
        default_value: attr.default_value.clone(),
        examples: attr.examples.clone(),
        metadata: attr.metadata.clone(),
    }
}

fn dup_type(ty: &Type, arena: &mut TypeArena, copies: &mut HashMap<NamedId, NamedId>) -> Type {
    match ty {
        Type::Empty => Type::Empty,
        Type::Primitive(p) => Type::Primitive(*p),
        Type::Named(id) => {
            if let Some(copy) = copies.get(id) {
                return Type::Named(*copy);
            }
            // Reserve before walking the body so a cycle back to this node
            // resolves to the reserved copy instead of recursing forever.
            let copy = arena.reserve(arena.name(*id).to_string());
            copies.insert(*id, copy);
            let body = arena.attribute(*id).clone();
            let body = dup_attribute(&body, arena, copies);
            arena.bind(copy, body);
            Type::Named(copy)
        }
        Type::Record(rec) => Type::Record(Record {
            fields: rec
                .fields
                .iter()
                .map(|f| Field {
                    name: f.name.clone(),
                    attribute: dup_attribute(&f.attribute, arena, copies),
                })
                .collect(),
        }),
        Type::Sequence(elem) => Type::Sequence(Box::new(dup_attribute(elem, arena, copies))),
        Type::Map { key, elem } => Type::Map {
            key: Box::new(dup_attribute(key, arena, copies)),
            elem: Box::new(dup_attribute(elem, arena, copies)),
        },
    }
}

/// Resolve a type to its record shape, looking through named types.
/// Returns `None` for scalars, sequences, maps and `Empty` (and for a named
/// cycle that never reaches a record).
pub fn as_record<'a>(arena: &'a TypeArena, ty: &'a Type) -> Option<&'a Record> {
    let mut seen = HashSet::new();
    let mut cur = ty;
    loop {
        match cur {
            Type::Record(rec) => return Some(rec),
            Type::Named(id) => {
                if !seen.insert(*id) {
                    return None;
                }
                cur = &arena.attribute(*id).ty;
            }
            _ => return None,
        }
    }
}

/// Whether the type resolves to a record.
pub fn is_record(arena: &TypeArena, ty: &Type) -> bool {
    as_record(arena, ty).is_some()
}

/// Structural equality of two attributes under one arena: named types compare
/// by name and body rather than by handle, so two independent duplicates of
/// the same tree compare equal. Cycles are handled by assuming equality for a
/// named pair already under comparison.
pub fn structural_eq(arena: &TypeArena, a: &Attribute, b: &Attribute) -> bool {
    let mut seen = HashSet::new();
    attr_eq(arena, a, b, &mut seen)
}

fn attr_eq(
    arena: &TypeArena,
    a: &Attribute,
    b: &Attribute,
    seen: &mut HashSet<(NamedId, NamedId)>,
) -> bool {
    a.description == b.description
        && a.docs == b.docs
        && a.validation == b.validation
        && a.default_value == b.default_value
        && a.examples == b.examples
        && a.metadata == b.metadata
        && type_eq(arena, &a.ty, &b.ty, seen)
}

fn type_eq(arena: &TypeArena, a: &Type, b: &Type, seen: &mut HashSet<(NamedId, NamedId)>) -> bool {
    match (a, b) {
        (Type::Empty, Type::Empty) => true,
        (Type::Primitive(x), Type::Primitive(y)) => x == y,
        (Type::Named(x), Type::Named(y)) => {
            if arena.name(*x) != arena.name(*y) {
                return false;
            }
            if !seen.insert((*x, *y)) {
                return true;
            }
            attr_eq(arena, arena.attribute(*x), arena.attribute(*y), seen)
        }
        (Type::Record(ra), Type::Record(rb)) => {
            ra.fields.len() == rb.fields.len()
                && ra
                    .fields
                    .iter()
                    .zip(&rb.fields)
                    .all(|(fa, fb)| fa.name == fb.name && attr_eq(arena, &fa.attribute, &fb.attribute, seen))
        }
        (Type::Sequence(ea), Type::Sequence(eb)) => attr_eq(arena, ea, eb, seen),
        (
            Type::Map { key: ka, elem: ea },
            Type::Map { key: kb, elem: eb },
        ) => attr_eq(arena, ka, kb, seen) && attr_eq(arena, ea, eb, seen),
        _ => false,
    }
}

/// A validated design: the named-type arena plus the declared services.
/// This is the interface boundary to the excluded front end; the generator
/// binary reads it as a serde document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    #[serde(default)]
    pub types: TypeArena,
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
}

impl Design {
    pub fn service(&self, name: &str) -> Option<&ServiceDecl> {
        self.services.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

/// A declared method: payload/result from the front end, plus the optional
/// user-authored request/response message shapes. When present, those shapes
/// are the deriver's targets and stay authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub payload: Attribute,
    #[serde(default)]
    pub result: Attribute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Attribute>,
}
