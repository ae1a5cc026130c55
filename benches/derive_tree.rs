//! Benchmark: schema derivation and field extraction over wide, deep and
//! cyclic design trees. Derivation appends duplicated nodes to the arena, so
//! each iteration works on a fresh clone of the base arena (clone cost is
//! part of the measured loop, same for every strategy).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wireschema::{
    derive, extract_fields, Attribute, Field, Primitive, Record, Type, TypeArena, TAG_METADATA_KEY,
};

fn tagged_int32(tag: u64) -> Attribute {
    let mut attr = Attribute::new(Type::Primitive(Primitive::Int32));
    attr.metadata
        .insert(TAG_METADATA_KEY.to_string(), vec![tag.to_string()]);
    attr
}

fn record(fields: Vec<(String, Attribute)>) -> Attribute {
    Attribute::new(Type::Record(Record {
        fields: fields
            .into_iter()
            .map(|(name, attribute)| Field { name, attribute })
            .collect(),
    }))
}

/// Flat record with `n` tagged scalar fields.
fn wide_payload(n: u64) -> (TypeArena, Attribute) {
    let fields = (1..=n)
        .map(|i| (format!("field_{}", i), tagged_int32(i)))
        .collect();
    (TypeArena::new(), record(fields))
}

/// Chain of named types: T1 { next: T2 }, ..., Tdepth { value: int32 }.
fn deep_payload(depth: usize) -> (TypeArena, Attribute) {
    let mut arena = TypeArena::new();
    let mut inner = arena.intern(
        format!("Level{}", depth),
        record(vec![("value".to_string(), tagged_int32(1))]),
    );
    for level in (1..depth).rev() {
        inner = arena.intern(
            format!("Level{}", level),
            record(vec![(
                "next".to_string(),
                Attribute::new(Type::Named(inner)),
            )]),
        );
    }
    let payload = record(vec![("root".to_string(), Attribute::new(Type::Named(inner)))]);
    (arena, payload)
}

/// Ring of named types: N0 -> N1 -> ... -> N0.
fn cyclic_payload(n: usize) -> (TypeArena, Attribute) {
    let mut arena = TypeArena::new();
    let ids: Vec<_> = (0..n).map(|i| arena.reserve(format!("Ring{}", i))).collect();
    for (i, id) in ids.iter().enumerate() {
        let next = ids[(i + 1) % n];
        arena.bind(
            *id,
            record(vec![(
                "next".to_string(),
                Attribute::new(Type::Named(next)),
            )]),
        );
    }
    let payload = record(vec![("head".to_string(), Attribute::new(Type::Named(ids[0])))]);
    (arena, payload)
}

fn bench_derive_tree(c: &mut Criterion) {
    let (wide_arena, wide) = wide_payload(256);
    c.bench_function("derive_wide_256_fields", |b| {
        b.iter(|| {
            let mut arena = wide_arena.clone();
            let request = derive(&mut arena, None, black_box(&wide), "WideRequest", "Request");
            black_box(request)
        });
    });

    c.bench_function("derive_extract_wide_256_fields", |b| {
        b.iter(|| {
            let mut arena = wide_arena.clone();
            let request = derive(&mut arena, None, black_box(&wide), "WideRequest", "Request");
            let fields = extract_fields(&arena, "WideRequest", &request).expect("extract");
            black_box(fields)
        });
    });

    let (deep_arena, deep) = deep_payload(64);
    c.bench_function("derive_deep_64_levels", |b| {
        b.iter(|| {
            let mut arena = deep_arena.clone();
            let request = derive(&mut arena, None, black_box(&deep), "DeepRequest", "Request");
            black_box(request)
        });
    });

    let (ring_arena, ring) = cyclic_payload(32);
    c.bench_function("derive_cyclic_ring_32", |b| {
        b.iter(|| {
            let mut arena = ring_arena.clone();
            let request = derive(&mut arena, None, black_box(&ring), "RingRequest", "Request");
            black_box(request)
        });
    });
}

criterion_group!(benches, bench_derive_tree);
criterion_main!(benches);
