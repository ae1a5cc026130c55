//! Request/response schema derivation.
//!
//! Every endpoint needs a concrete request and response message. When the
//! design author spelled one out, that shape is authoritative and is only
//! *enriched* from the method's payload/result; when they did not, one is
//! derived by duplicating the payload/result tree and renaming it. Renaming
//! is what lets two derivation sites (the request and response side of one
//! endpoint, or two endpoints) share a design-time type without their
//! generated messages colliding.
//!
//! ## Shape of the algorithm
//!
//! [`derive`] has four branches:
//!
//! 1. **Target present** — clone the target, fill each of its record fields'
//!    unset properties from the same-named source field. A target field may
//!    carry an alias (`"out:o"`); the part before `:` links it to its source.
//! 2. **Target absent, source not a record** — duplicate the source, rename
//!    its identity (if named) to `name`, append `suffix` to nested named
//!    types.
//! 3. **Target absent, source a record that normalizes to nothing** — the
//!    endpoint has no body: return an `Empty`-typed attribute.
//! 4. **Target absent, source a non-empty record** — wrap a duplicate of the
//!    normalized record in a fresh named type `name`, append `suffix` to
//!    named types reachable from the body.
//!
//! ## Renaming and cycles
//!
//! [`append_suffix`] threads an explicit visited set through the whole
//! traversal. A named type already in the set is skipped, which bounds
//! recursion on self-referential and mutually-referential type graphs and
//! guarantees each distinct named type is renamed exactly once per
//! derivation. Duplication always precedes renaming, so the shared
//! design-time tree keeps its original identities.

use crate::design::{as_record, Attribute, NamedId, Record, Type, TypeArena};
use std::collections::HashSet;

/// Separator between a target field's declared name and its alias segment.
pub const ALIAS_SEPARATOR: char = ':';

/// Derive a finalized request/response attribute for one endpoint side.
///
/// `name` is the full message identity for this side (e.g. `AddRequest`);
/// `suffix` is the side marker appended to nested named types (`Request` /
/// `Response`). The source tree is never mutated.
pub fn derive(
    arena: &mut TypeArena,
    target: Option<&Attribute>,
    source: &Attribute,
    name: &str,
    suffix: &str,
) -> Attribute {
    if let Some(target) = target {
        return enrich_target(arena, target, source);
    }

    let Some((carrier, normalized)) = record_source(arena, source) else {
        // Bare scalar, sequence or map.
        let out = source.duplicate(arena);
        rename_root(arena, &out.ty, name, suffix);
        return out;
    };

    if normalized.fields.is_empty() {
        return Attribute::new(Type::Empty);
    }

    let body = Attribute {
        ty: Type::Record(normalized),
        ..carrier
    }
    .duplicate(arena);
    let validation = body.validation.clone();
    let examples = body.examples.clone();

    let id = arena.intern(name, body);
    let mut visited = HashSet::new();
    visited.insert(id);
    let body_ty = arena.attribute(id).ty.clone();
    append_suffix(arena, &body_ty, suffix, &mut visited);

    Attribute {
        ty: Type::Named(id),
        validation,
        examples,
        ..Default::default()
    }
}

/// Append `suffix` to the identity of every named type reachable from `ty`
/// that is not already in `visited`. The same set is threaded through the
/// whole walk: that is the cycle guard, and it also keeps a type shared by
/// several fields from being renamed more than once.
pub fn append_suffix(
    arena: &mut TypeArena,
    ty: &Type,
    suffix: &str,
    visited: &mut HashSet<NamedId>,
) {
    match ty {
        Type::Named(id) => {
            if !visited.insert(*id) {
                return;
            }
            let renamed = format!("{}{}", arena.name(*id), suffix);
            arena.rename(*id, renamed);
            let body_ty = arena.attribute(*id).ty.clone();
            append_suffix(arena, &body_ty, suffix, visited);
        }
        Type::Record(rec) => {
            for field in &rec.fields {
                append_suffix(arena, &field.attribute.ty, suffix, visited);
            }
        }
        Type::Sequence(elem) => append_suffix(arena, &elem.ty, suffix, visited),
        Type::Map { key, elem } => {
            append_suffix(arena, &key.ty, suffix, visited);
            append_suffix(arena, &elem.ty, suffix, visited);
        }
        Type::Primitive(_) | Type::Empty => {}
    }
}

/// Branch 1: the target shape wins; only unset properties are filled in.
fn enrich_target(arena: &TypeArena, target: &Attribute, source: &Attribute) -> Attribute {
    let mut out = target.clone();
    let Type::Record(rec) = &mut out.ty else {
        return out;
    };
    let source_record = as_record(arena, &source.ty);
    for field in &mut rec.fields {
        let base = field
            .name
            .split(ALIAS_SEPARATOR)
            .next()
            .unwrap_or(field.name.as_str());
        let counterpart = match source_record {
            Some(srec) => srec.field(base),
            None => Some(source),
        };
        match counterpart {
            Some(patt) => enrich_attribute(&mut field.attribute, patt),
            None => {
                // Shape mismatch is not an error: the field stays as authored.
                tracing::debug!(field = %field.name, "no source counterpart, field left unenriched");
            }
        }
    }
    out
}

/// Fill the unset properties of `att` from `patt`. Metadata is never
/// propagated; an already-set property is never overwritten.
fn enrich_attribute(att: &mut Attribute, patt: &Attribute) {
    if patt.ty == Type::Empty {
        return;
    }
    if att.ty == Type::Empty {
        att.ty = patt.ty.clone();
    }
    if att.description.is_none() {
        att.description = patt.description.clone();
    }
    if att.docs.is_none() {
        att.docs = patt.docs.clone();
    }
    if att.validation.is_none() {
        att.validation = patt.validation.clone();
    }
    if att.default_value.is_none() {
        att.default_value = patt.default_value.clone();
    }
    if att.examples.is_empty() {
        att.examples = patt.examples.clone();
    }
}

/// Branch 2 renaming: a named root takes `name` itself and seeds the visited
/// set, so a cycle back to the root cannot rename it a second time; unnamed
/// composites just get the suffix pushed through them.
fn rename_root(arena: &mut TypeArena, ty: &Type, name: &str, suffix: &str) {
    let mut visited = HashSet::new();
    match ty {
        Type::Named(id) => {
            arena.rename(*id, name.to_string());
            visited.insert(*id);
            let body_ty = arena.attribute(*id).ty.clone();
            append_suffix(arena, &body_ty, suffix, &mut visited);
        }
        Type::Record(_) | Type::Sequence(_) | Type::Map { .. } => {
            append_suffix(arena, ty, suffix, &mut visited);
        }
        Type::Primitive(_) | Type::Empty => {}
    }
}

/// Resolve the source to its record shape: a clone of the attribute that
/// directly carries the record (the source itself, or the body of the named
/// type wrapping it) plus the normalized fields. `None` when the source is
/// not a record.
fn record_source(arena: &TypeArena, source: &Attribute) -> Option<(Attribute, Record)> {
    let mut seen = HashSet::new();
    let mut cur = source;
    loop {
        match &cur.ty {
            Type::Record(rec) => return Some((cur.clone(), normalize(rec))),
            Type::Named(id) => {
                if !seen.insert(*id) {
                    return None;
                }
                cur = arena.attribute(*id);
            }
            _ => return None,
        }
    }
}

/// Drop structurally vacuous fields: a record of placeholders collapses to
/// empty instead of producing a degenerate message.
fn normalize(rec: &Record) -> Record {
    Record {
        fields: rec
            .fields
            .iter()
            .filter(|f| f.attribute.ty != Type::Empty)
            .cloned()
            .collect(),
    }
}
