//! Memoized per-service schema computation.
//!
//! [`ServicesData`] is the generation pass's registry: the first lookup for a
//! service drives derivation and field extraction for every endpoint, later
//! lookups return the cached result. The registry is explicit state owned by
//! the generation driver (no ambient singleton); `&mut self` is what
//! serializes writers, so at-most-once computation per key holds even when a
//! host shards independent services across workers.

use crate::derive::derive;
use crate::design::{Attribute, Design, ServiceDecl, Type, TypeArena};
use crate::wire::{extract_fields, FieldSchema, WireError};
use heck::ToUpperCamelCase;
use serde::Serialize;
use std::collections::HashMap;

/// Fatal generation fault, carrying enough context to locate the offending
/// declaration (service, endpoint, then message/field inside the wire error).
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("service {service:?} endpoint {endpoint:?}: {source}")]
    Endpoint {
        service: String,
        endpoint: String,
        #[source]
        source: WireError,
    },
}

/// Computed schema data for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSchema {
    /// Identifier-safe (UpperCamelCase) service name.
    pub name: String,
    pub description: Option<String>,
    pub endpoints: Vec<EndpointSchema>,
    /// Request/response messages for every endpoint, in endpoint order.
    pub messages: Vec<MessageSchema>,
}

/// One endpoint with its finalized request/response attributes. Both are
/// computed exactly once, when the owning service's schema is first looked
/// up, and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSchema {
    pub name: String,
    pub description: Option<String>,
    pub request: Attribute,
    pub response: Attribute,
    pub request_message: String,
    pub response_message: String,
}

/// A generated wire message. Nested messages render recursively inside their
/// parent block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSchema {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldSchema>,
    pub nested: Vec<MessageSchema>,
}

/// Registry mapping service name to computed schema data.
#[derive(Debug, Default)]
pub struct ServicesData {
    services: HashMap<String, ServiceSchema>,
}

impl ServicesData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema data for the named service, computing it on first access.
    /// `Ok(None)` means the design declares no such service: nothing to
    /// generate, not a fault.
    pub fn get(
        &mut self,
        design: &mut Design,
        name: &str,
    ) -> Result<Option<&ServiceSchema>, GenError> {
        if !self.services.contains_key(name) {
            let Design { types, services } = design;
            let Some(svc) = services.iter().find(|s| s.name == name) else {
                return Ok(None);
            };
            let schema = analyze(types, svc)?;
            tracing::debug!(service = %name, endpoints = schema.endpoints.len(), "computed wire schema");
            self.services.insert(name.to_string(), schema);
        }
        Ok(self.services.get(name))
    }
}

/// Derive and extract everything needed to render the given service.
fn analyze(arena: &mut TypeArena, svc: &ServiceDecl) -> Result<ServiceSchema, GenError> {
    let mut endpoints = Vec::with_capacity(svc.methods.len());
    let mut messages = Vec::with_capacity(svc.methods.len() * 2);
    for method in &svc.methods {
        let method_name = method.name.to_upper_camel_case();

        let request = derive(
            arena,
            method.request.as_ref(),
            &method.payload,
            &format!("{}Request", method_name),
            "Request",
        );
        let response = derive(
            arena,
            method.response.as_ref(),
            &method.result,
            &format!("{}Response", method_name),
            "Response",
        );

        let request_message = message_name(arena, &request, &method_name, "Request");
        let response_message = message_name(arena, &response, &method_name, "Response");

        messages.push(build_message(
            arena,
            &svc.name,
            &method.name,
            &request_message,
            &request,
        )?);
        messages.push(build_message(
            arena,
            &svc.name,
            &method.name,
            &response_message,
            &response,
        )?);

        endpoints.push(EndpointSchema {
            name: method_name,
            description: method.description.clone(),
            request,
            response,
            request_message,
            response_message,
        });
    }
    Ok(ServiceSchema {
        name: svc.name.to_upper_camel_case(),
        description: svc.description.clone(),
        endpoints,
        messages,
    })
}

/// A named derived attribute is the message; anything else (bare scalar,
/// collapsed empty body) takes the method name plus side suffix.
fn message_name(arena: &TypeArena, attr: &Attribute, method: &str, suffix: &str) -> String {
    match &attr.ty {
        Type::Named(id) => arena.name(*id).to_upper_camel_case(),
        _ => format!("{}{}", method, suffix),
    }
}

fn build_message(
    arena: &TypeArena,
    service: &str,
    endpoint: &str,
    name: &str,
    attr: &Attribute,
) -> Result<MessageSchema, GenError> {
    let fields = extract_fields(arena, name, attr).map_err(|source| GenError::Endpoint {
        service: service.to_string(),
        endpoint: endpoint.to_string(),
        source,
    })?;
    Ok(MessageSchema {
        name: name.to_string(),
        description: attr.description.clone(),
        fields,
        nested: Vec::new(),
    })
}
