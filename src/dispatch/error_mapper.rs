//! Fault to error payload mapping.
//!
//! # Responsibilities
//! - Pick the status code for a fault
//! - Find the operation's declared response for that status
//! - Build the declared error type with the fault's message
//!
//! # Design Decisions
//! - Error types are looked up as `"{api}/{Type}"` in the service registry
//! - A declared response without a schema gets a bare message envelope
//! - Every failure here is reported as a `Fault` so the dispatcher can
//!   fall back; nothing is raised past it

use axum::http::StatusCode;
use serde_json::Value;

use crate::dispatch::Fault;
use crate::routing::Operation;
use crate::services::{MessageResponse, ServiceRegistry};

/// A resolved error response.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    pub status: StatusCode,
    pub document: Value,
}

/// Maps faults onto an operation's declared responses.
pub struct ErrorMapper<'a> {
    api: &'a str,
    services: &'a ServiceRegistry,
    default_status: u16,
}

impl<'a> ErrorMapper<'a> {
    pub fn new(api: &'a str, services: &'a ServiceRegistry, default_status: u16) -> Self {
        Self {
            api,
            services,
            default_status,
        }
    }

    /// The fault's carried code, or the default.
    pub fn status_for(&self, fault: &Fault) -> u16 {
        fault.status().unwrap_or(self.default_status)
    }

    pub fn map(&self, fault: &Fault, operation: &Operation) -> Result<ErrorPayload, Fault> {
        let code = self.status_for(fault);
        let spec = operation
            .response(code)
            .ok_or(Fault::MissingResponseDefinition(code))?;
        let status =
            StatusCode::from_u16(code).map_err(|_| Fault::MissingResponseDefinition(code))?;

        let message = fault.to_string();
        let document = match &spec.schema_ref {
            Some(schema) => {
                let name = schema.type_name();
                match self.services.error_payload(self.api, name, &message) {
                    Some(Ok(document)) => document,
                    Some(Err(e)) => return Err(Fault::Serialization(e.to_string())),
                    None => return Err(Fault::UnknownSchema(format!("{}/{}", self.api, name))),
                }
            }
            None => serde_json::to_value(MessageResponse { message })
                .map_err(|e| Fault::Serialization(e.to_string()))?,
        };

        Ok(ErrorPayload { status, document })
    }
}
