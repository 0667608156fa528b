//! Parameter binding.
//!
//! # Responsibilities
//! - Produce one argument per declared parameter, in declaration order
//! - Coerce path captures and query values to their declared types
//! - Apply collection-format semantics to array query values
//! - Decode and construct body values
//!
//! # Design Decisions
//! - Path values come from the per-request `MatchContext`, looked up by
//!   placeholder position; the operation is never written to
//! - Missing or malformed optional query values bind as `Null`
//! - Malformed path values are errors
//! - `header` and `formData` locations fail with `NotImplemented` rather
//!   than being skipped, so positional arguments never shift

use crate::binding::arguments::{Argument, Arguments};
use crate::codec::{self, Codec};
use crate::dispatch::Fault;
use crate::http::ApiRequest;
use crate::routing::{CollectionFormat, Location, MatchContext, Operation, Parameter, ParameterType};
use crate::services::ServiceRegistry;

/// Binds request data to an operation's declared parameters.
pub struct ParameterBinder<'a> {
    services: &'a ServiceRegistry,
    codec: &'a dyn Codec,
}

impl<'a> ParameterBinder<'a> {
    pub fn new(services: &'a ServiceRegistry, codec: &'a dyn Codec) -> Self {
        Self { services, codec }
    }

    /// Bind every parameter of `operation`, stopping at the first failure.
    pub fn bind(
        &self,
        operation: &Operation,
        context: &MatchContext,
        request: &ApiRequest,
    ) -> Result<Arguments, Fault> {
        let mut values = Vec::with_capacity(operation.parameters().len());

        for param in operation.parameters() {
            let value = match &param.location {
                Location::Path => bind_path(operation, context, param)?,
                Location::Query => bind_query(request, param)?,
                Location::Body => self.bind_body(request, param)?,
                Location::Header | Location::FormData => {
                    return Err(Fault::NotImplemented {
                        location: param.location.to_string(),
                        name: param.name.clone(),
                    })
                }
                Location::Other(location) => {
                    return Err(Fault::UnsupportedParameterLocation(location.clone()))
                }
            };
            values.push(value);
        }

        Ok(Arguments::new(values))
    }

    fn bind_body(&self, request: &ApiRequest, param: &Parameter) -> Result<Argument, Fault> {
        if let Some(schema) = &param.schema_ref {
            if !self.services.has_type(schema.type_name()) {
                return Err(Fault::UnknownSchema(schema.type_name().to_string()));
            }
        }

        let media_type = codec::essence(request.content_type());
        let document = self.codec.decode(request.body(), &media_type)?;

        let Some(schema) = &param.schema_ref else {
            return Ok(Argument::Object(Box::new(document)));
        };

        match self.services.construct(schema.type_name(), document) {
            Some(Ok(instance)) => Ok(Argument::Object(instance)),
            Some(Err(e)) => Err(Fault::Serialization(format!(
                "body does not match {}: {e}",
                schema.type_name()
            ))),
            None => Err(Fault::UnknownSchema(schema.type_name().to_string())),
        }
    }
}

fn bind_path(
    operation: &Operation,
    context: &MatchContext,
    param: &Parameter,
) -> Result<Argument, Fault> {
    let value = operation
        .matcher()
        .placeholder_index(&param.name)
        .and_then(|index| context.get(index))
        .ok_or_else(|| Fault::UnboundPathParameter(param.name.clone()))?;

    match param.param_type {
        ParameterType::Integer => value
            .parse::<i64>()
            .map(Argument::Integer)
            .map_err(|_| invalid(param, value)),
        ParameterType::Float => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Argument::Float)
            .ok_or_else(|| invalid(param, value)),
        _ => Ok(Argument::String(value.to_string())),
    }
}

fn bind_query(request: &ApiRequest, param: &Parameter) -> Result<Argument, Fault> {
    match &param.param_type {
        ParameterType::String => Ok(request
            .param(&param.name)
            .map(|v| Argument::String(v.to_string()))
            .unwrap_or(Argument::Null)),
        ParameterType::Integer => Ok(request
            .param(&param.name)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(Argument::Integer)
            .unwrap_or(Argument::Null)),
        ParameterType::Float => Ok(request
            .param(&param.name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .map(Argument::Float)
            .unwrap_or(Argument::Null)),
        ParameterType::Array => bind_array(request, param),
        other => Err(Fault::UnsupportedParameterType {
            name: param.name.clone(),
            location: param.location.to_string(),
            param_type: other.to_string(),
        }),
    }
}

fn bind_array(request: &ApiRequest, param: &Parameter) -> Result<Argument, Fault> {
    match &param.collection_format {
        CollectionFormat::Csv => {
            let values = request
                .param(&param.name)
                .filter(|v| !v.is_empty())
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default();
            Ok(Argument::List(values))
        }
        CollectionFormat::Multi => Ok(Argument::List(
            request
                .param_values(&param.name)
                .into_iter()
                .map(sanitize)
                .collect(),
        )),
        CollectionFormat::Other(format) => {
            Err(Fault::UnsupportedCollectionFormat(format.clone()))
        }
    }
}

fn invalid(param: &Parameter, value: &str) -> Fault {
    Fault::InvalidArgument {
        name: param.name.clone(),
        value: value.to_string(),
        expected: param.param_type.to_string(),
    }
}

/// Strip markup tags and NUL bytes, encode quotes.
pub fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;

    for c in value.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '\0' => {}
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }

    out
}
