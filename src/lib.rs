//! # wireschema — transport schema derivation and wire-schema emission
//!
//! Given an abstract service design (a tree of named, typed attributes
//! describing method payloads and results), wireschema derives concrete
//! request/response message schemas, assigns them collision-free names,
//! extracts wire-format field layouts, and emits one textual `.proto`
//! document per service.
//!
//! ## Pipeline
//!
//! - **Design tree** ([`design`]): types (primitives, records, sequences,
//!   maps, named types in an arena) and attributes carrying descriptions,
//!   validation rules and metadata.
//! - **Derivation** ([`derive`]): merge a user-authored message shape with
//!   the payload/result, or duplicate and rename the payload/result into a
//!   fresh message type. Renaming is cycle-safe and never touches the shared
//!   design tree.
//! - **Field extraction** ([`wire`]): only fields tagged with `rpc:tag`
//!   metadata reach the wire; a tagged non-scalar is a loud fault.
//! - **Registry** ([`registry`]): per-service schema data, computed once and
//!   memoized for the generation pass.
//! - **Emission** ([`emit`]): deterministic rendering plus the
//!   `gen/grpc/<service>/<service>.proto` file layout.
//!
//! ## Example
//!
//! ```
//! use wireschema::{
//!     Attribute, Design, Field, MethodDecl, Primitive, Record, ServiceDecl,
//!     ServicesData, Type, TypeArena, TAG_METADATA_KEY,
//! };
//!
//! let mut tagged = Attribute::new(Type::Primitive(Primitive::Int32));
//! tagged.metadata.insert(TAG_METADATA_KEY.to_string(), vec!["1".to_string()]);
//!
//! let mut design = Design {
//!     types: TypeArena::new(),
//!     services: vec![ServiceDecl {
//!         name: "calc".to_string(),
//!         description: None,
//!         methods: vec![MethodDecl {
//!             name: "add".to_string(),
//!             description: None,
//!             payload: Attribute::new(Type::Record(Record {
//!                 fields: vec![Field { name: "a".to_string(), attribute: tagged.clone() }],
//!             })),
//!             result: tagged,
//!             request: None,
//!             response: None,
//!         }],
//!     }],
//! };
//!
//! let mut registry = ServicesData::new();
//! let schema = registry.get(&mut design, "calc").unwrap().unwrap();
//! assert_eq!(schema.endpoints[0].request_message, "AddRequest");
//! ```

pub mod derive;
pub mod design;
pub mod emit;
pub mod registry;
pub mod wire;

pub use derive::{append_suffix, derive, ALIAS_SEPARATOR};
pub use design::{
    as_record, is_record, structural_eq, Attribute, Design, Field, MethodDecl, NamedId, NamedNode,
    Primitive, Record, ServiceDecl, Type, TypeArena, Validation,
};
pub use emit::{header, proto_files, render, write_files, OutputFile};
pub use registry::{EndpointSchema, GenError, MessageSchema, ServiceSchema, ServicesData};
pub use wire::{
    extract_fields, wire_native_type_name, wire_tag, wire_type_name, FieldSchema, WireError,
    TAG_METADATA_KEY,
};
