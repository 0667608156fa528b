//! Serde shapes for operation descriptors.
//!
//! Field names follow OpenAPI 2.0 where one exists (`in`, `type`,
//! `collectionFormat`, `$ref`), so documents can be written by hand or
//! exported from existing tooling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A whole API document: an ordered list of operations.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiDocument {
    /// Informational title.
    pub title: Option<String>,

    /// Operations in registration order.
    pub operations: Vec<OperationDescriptor>,
}

/// One routable endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    /// HTTP method, any case.
    pub method: String,

    /// Path template with `{name}` placeholders.
    pub path: String,

    /// Identifier for logs and metrics.
    #[serde(default)]
    pub operation_id: Option<String>,

    /// Handler this operation is bound to.
    pub handler: HandlerDescriptor,

    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,

    /// Declared responses keyed by status code.
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseDescriptor>,

    /// Media types the operation can produce.
    #[serde(default)]
    pub produces: Vec<String>,
}

/// Reference to a registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HandlerDescriptor {
    /// Service lookup name.
    pub service: String,

    /// Method name on the service.
    pub method: String,
}

/// One parameter specification.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,

    /// `path`, `query`, `header`, `body` or `formData`.
    #[serde(rename = "in")]
    pub location: String,

    /// `string`, `integer`, `float`, `array` or `object`.
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,

    /// `csv` or `multi`, arrays only.
    #[serde(default)]
    pub collection_format: Option<String>,

    /// Body schema.
    #[serde(default)]
    pub schema: Option<SchemaDescriptor>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: Option<String>,
}

/// Schema reference, e.g. `{"$ref": "#/definitions/Pet"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaDescriptor {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// A declared response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseDescriptor {
    pub description: String,
    pub schema: Option<SchemaDescriptor>,
    pub headers: BTreeMap<String, HeaderDescriptor>,
}

/// Informational response header.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderDescriptor {
    #[serde(rename = "type")]
    pub header_type: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_document() {
        let json = r##"{
            "title": "Pets",
            "operations": [{
                "method": "GET",
                "path": "/pets/{id}",
                "operationId": "getPet",
                "handler": { "service": "pets", "method": "get" },
                "parameters": [
                    { "name": "id", "in": "path", "type": "integer", "required": true },
                    { "name": "tags", "in": "query", "type": "array", "collectionFormat": "csv" }
                ],
                "responses": {
                    "200": { "description": "A pet", "schema": { "$ref": "#/definitions/Pet" } },
                    "404": { "description": "Not found", "schema": { "$ref": "#/definitions/NotFound" } }
                },
                "produces": ["application/json"]
            }]
        }"##;

        let doc: ApiDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.operations.len(), 1);

        let op = &doc.operations[0];
        assert_eq!(op.operation_id.as_deref(), Some("getPet"));
        assert_eq!(op.parameters[0].location, "path");
        assert_eq!(op.parameters[1].collection_format.as_deref(), Some("csv"));
        assert_eq!(
            op.responses["404"].schema.as_ref().unwrap().reference,
            "#/definitions/NotFound"
        );
    }

    #[test]
    fn test_parse_toml_document() {
        let doc: ApiDocument = toml::from_str(
            r##"
            [[operations]]
            method = "post"
            path = "/pets"
            produces = ["application/json"]
            handler = { service = "pets", method = "create" }

            [[operations.parameters]]
            name = "pet"
            in = "body"
            schema = { "$ref" = "#/definitions/Pet" }

            [operations.responses.201]
            description = "Created"
            "##,
        )
        .unwrap();

        let op = &doc.operations[0];
        assert_eq!(op.method, "post");
        assert_eq!(op.parameters[0].param_type, None);
        assert!(op.responses.contains_key("201"));
    }
}
