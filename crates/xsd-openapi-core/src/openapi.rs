//! OpenAPI 3.0 rendering of a [`Document`].
//!
//! Produces an in-memory `serde_json::Value`; choosing a text encoding is up
//! to the caller.
//!
//! | Output model            | OpenAPI                                         |
//! |-------------------------|-------------------------------------------------|
//! | `Reference`             | `$ref: #/components/schemas/<name>`             |
//! | `VariantSet`            | `oneOf` (optional sets add a "no branch" arm)   |
//! | several sets on object  | `allOf` of `oneOf`s                             |
//! | exclusive `Bound`       | boolean `exclusiveMinimum` / `exclusiveMaximum` |
//! | attribute property      | `xml: { attribute: true }`                      |
//! | nillable property       | `nullable: true`                                |

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::schema::{
    ArraySchema, Constraints, Document, ObjectSchema, Primitive, ScalarSchema, SchemaObject,
    VariantSet,
};

const SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Document-level settings of the rendered OpenAPI document.
///
/// Fields are serialized in `kebab-case`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OpenApiOptions {
    /// `info.title`; derived from the target namespace when absent.
    pub title: Option<String>,
    /// `info.version`.
    pub version: String,
    /// `info.description`; derived from the target namespace when absent.
    pub description: Option<String>,
    /// The `openapi` version string.
    pub openapi: String,
}

impl Default for OpenApiOptions {
    fn default() -> Self {
        Self {
            title: None,
            version: "1.0.0".to_string(),
            description: None,
            openapi: "3.0.3".to_string(),
        }
    }
}

/// Title derived from a namespace: its last path segment, title-cased.
///
/// ```
/// use xsd_openapi_core::openapi::default_title;
/// assert_eq!(default_title(Some("http://example.com/purchase-order")), "Purchase Order");
/// assert_eq!(default_title(Some("urn:acme:billing")), "Urn Acme Billing");
/// assert_eq!(default_title(None), "Generated API");
/// ```
pub fn default_title(namespace: Option<&str>) -> String {
    let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) else {
        return "Generated API".to_string();
    };
    let words = if namespace.contains('/') {
        namespace
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(namespace)
            .replace('-', " ")
    } else {
        namespace.replace(':', " ")
    };
    words
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn default_description(namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("API generated from XSD schema: {ns}"),
        _ => "API generated from XSD schema".to_string(),
    }
}

/// Render `document` as an OpenAPI 3.0 document.
pub fn to_openapi(document: &Document, options: &OpenApiOptions) -> Value {
    let namespace = document.target_namespace.as_deref();

    let mut schemas = Map::new();
    for (name, schema) in &document.registry {
        let mut rendered = render(schema);
        if let (Value::Object(map), SchemaObject::Object(_)) = (&mut rendered, schema) {
            let mut xml = Map::new();
            xml.insert("name".to_string(), json!(name.as_str()));
            if let Some(ns) = namespace {
                xml.insert("namespace".to_string(), json!(ns));
            }
            map.insert("xml".to_string(), Value::Object(xml));
        }
        schemas.insert(name.to_string(), rendered);
    }

    let roots: Vec<Value> = document
        .roots
        .iter()
        .map(|name| json!({ "$ref": format!("{SCHEMA_PREFIX}{name}") }))
        .collect();

    json!({
        "openapi": options.openapi,
        "info": {
            "title": options.title.clone().unwrap_or_else(|| default_title(namespace)),
            "version": options.version,
            "description": options
                .description
                .clone()
                .unwrap_or_else(|| default_description(namespace)),
        },
        "paths": {},
        "components": { "schemas": schemas },
        "x-roots": roots,
    })
}

// ---------------------------------------------------------------------------
// Schema rendering
// ---------------------------------------------------------------------------

fn render(schema: &SchemaObject) -> Value {
    match schema {
        SchemaObject::Reference { target } => json!({ "$ref": format!("{SCHEMA_PREFIX}{target}") }),
        SchemaObject::Object(object) => Value::Object(render_object(object)),
        SchemaObject::Array(array) => render_array(array),
        SchemaObject::VariantSet(set) => Value::Object(render_set(set)),
        SchemaObject::Scalar(scalar) => render_scalar(scalar),
    }
}

fn render_object(object: &ObjectSchema) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("type".to_string(), json!("object"));
    if let Some(description) = &object.description {
        out.insert("description".to_string(), json!(description));
    }

    if !object.properties.is_empty() {
        let mut properties = Map::new();
        for (name, schema) in &object.properties {
            let mut siblings = Map::new();
            if object.attributes.contains(name) {
                siblings.insert("xml".to_string(), json!({ "attribute": true }));
            }
            if object.nillable.contains(name) {
                siblings.insert("nullable".to_string(), json!(true));
            }
            properties.insert(name.clone(), with_siblings(render(schema), siblings));
        }
        out.insert("properties".to_string(), Value::Object(properties));
    }
    if !object.required.is_empty() {
        out.insert("required".to_string(), json!(object.required));
    }

    match object.variant_sets.as_slice() {
        [] => {}
        [set] => out.extend(render_set(set)),
        sets => {
            let all: Vec<Value> = sets.iter().map(|set| Value::Object(render_set(set))).collect();
            out.insert("allOf".to_string(), Value::Array(all));
        }
    }
    out
}

fn render_set(set: &VariantSet) -> Map<String, Value> {
    let mut variants: Vec<Value> = set.variants.iter().map(render).collect();
    if set.optional {
        // no branch present: none of the branches' required members appear
        let branches: Vec<Value> = set
            .variants
            .iter()
            .filter_map(SchemaObject::as_object)
            .filter(|object| !object.required.is_empty())
            .map(|object| json!({ "required": object.required }))
            .collect();
        if !branches.is_empty() {
            variants.push(json!({ "not": { "anyOf": branches } }));
        }
    }
    let mut out = Map::new();
    out.insert("oneOf".to_string(), Value::Array(variants));
    out
}

fn render_array(array: &ArraySchema) -> Value {
    let mut out = Map::new();
    out.insert("type".to_string(), json!("array"));
    out.insert("items".to_string(), render(&array.items));
    if array.min_items > 0 {
        out.insert("minItems".to_string(), json!(array.min_items));
    }
    if let Some(max) = array.max_items {
        out.insert("maxItems".to_string(), json!(max));
    }
    Value::Object(out)
}

fn render_scalar(scalar: &ScalarSchema) -> Value {
    let mut out = Map::new();
    if scalar.primitive != Primitive::Opaque {
        out.insert("type".to_string(), json!(scalar.primitive.as_str()));
    }
    if let Some(format) = &scalar.format {
        out.insert("format".to_string(), json!(format));
    }
    if let Some(description) = &scalar.description {
        out.insert("description".to_string(), json!(description));
    }
    render_constraints(&scalar.constraints, &mut out);
    Value::Object(out)
}

fn render_constraints(c: &Constraints, out: &mut Map<String, Value>) {
    if let Some(min) = c.min_length {
        out.insert("minLength".to_string(), json!(min));
    }
    if let Some(max) = c.max_length {
        out.insert("maxLength".to_string(), json!(max));
    }
    if let Some(pattern) = &c.pattern {
        out.insert("pattern".to_string(), json!(pattern));
    }
    if let Some(min) = &c.minimum {
        out.insert("minimum".to_string(), number(min.value));
        if min.exclusive {
            out.insert("exclusiveMinimum".to_string(), json!(true));
        }
    }
    if let Some(max) = &c.maximum {
        out.insert("maximum".to_string(), number(max.value));
        if max.exclusive {
            out.insert("exclusiveMaximum".to_string(), json!(true));
        }
    }
    if let Some(values) = &c.enumeration {
        out.insert("enum".to_string(), json!(values));
    }
    if let Some(total) = c.total_digits {
        out.insert("x-total-digits".to_string(), json!(total));
    }
    if let Some(fraction) = c.fraction_digits {
        out.insert("x-fraction-digits".to_string(), json!(fraction));
    }
}

/// Integral bounds render without a fractional part.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// Attach keywords beside a rendered schema; `$ref` cannot carry siblings in
/// OpenAPI 3.0, so references are wrapped in `allOf`.
fn with_siblings(schema: Value, siblings: Map<String, Value>) -> Value {
    if siblings.is_empty() {
        return schema;
    }
    match schema {
        Value::Object(mut map) if !map.contains_key("$ref") => {
            map.extend(siblings);
            Value::Object(map)
        }
        other => {
            let mut wrapper = Map::new();
            wrapper.insert("allOf".to_string(), json!([other]));
            wrapper.extend(siblings);
            Value::Object(wrapper)
        }
    }
}
