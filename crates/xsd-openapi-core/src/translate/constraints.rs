//! Constraint translation: built-in datatypes, facets, atomic and union types.
//!
//! Facets map onto scalar [`Constraints`] one-to-one where the output model
//! has a keyword for them. `totalDigits` also tightens the numeric bounds to
//! the range it can represent; `fractionDigits` is carried as a hint only.
//! Anything without a defined translation is an unsupported construct, never
//! silently dropped.

use serde_json::{Number, Value};

use crate::context::ConversionContext;
use crate::error::ConvertError;
use crate::graph::{local_name, AtomicType, Facets, TypeRef, UnionType};
use crate::schema::{Bound, Constraints, Primitive, ScalarSchema, SchemaObject, VariantSet};

use super::inheritance::narrow_scalar;

// ---------------------------------------------------------------------------
// Built-in datatypes
// ---------------------------------------------------------------------------

/// Scalar schema of an XSD built-in datatype, including the value-space
/// bounds the type implies.
pub(crate) fn builtin_scalar(name: &str, path: &str) -> Result<ScalarSchema, ConvertError> {
    let string = || ScalarSchema::new(Primitive::String);
    let integer = |min: Option<f64>, max: Option<f64>| {
        let mut scalar = ScalarSchema::new(Primitive::Integer);
        scalar.constraints.minimum = min.map(Bound::inclusive);
        scalar.constraints.maximum = max.map(Bound::inclusive);
        scalar
    };

    let scalar = match local_name(name) {
        "string" | "normalizedString" | "token" | "language" | "Name" | "NCName" | "ID"
        | "IDREF" | "IDREFS" | "ENTITY" | "ENTITIES" | "NMTOKEN" | "NMTOKENS" | "QName"
        | "NOTATION" | "duration" | "gYearMonth" | "gYear" | "gMonthDay" | "gDay" | "gMonth"
        | "anySimpleType" => string(),

        "decimal" => ScalarSchema::new(Primitive::Number),
        "float" => ScalarSchema::new(Primitive::Number).with_format("float"),
        "double" => ScalarSchema::new(Primitive::Number).with_format("double"),

        "integer" => integer(None, None),
        "nonPositiveInteger" => integer(None, Some(0.0)),
        "negativeInteger" => integer(None, Some(-1.0)),
        "nonNegativeInteger" => integer(Some(0.0), None),
        "positiveInteger" => integer(Some(1.0), None),
        "long" => integer(None, None).with_format("int64"),
        "int" => integer(Some(i32::MIN as f64), Some(i32::MAX as f64)).with_format("int32"),
        "short" => integer(Some(i16::MIN as f64), Some(i16::MAX as f64)),
        "byte" => integer(Some(i8::MIN as f64), Some(i8::MAX as f64)),
        "unsignedLong" => integer(Some(0.0), None),
        "unsignedInt" => integer(Some(0.0), Some(u32::MAX as f64)),
        "unsignedShort" => integer(Some(0.0), Some(u16::MAX as f64)),
        "unsignedByte" => integer(Some(0.0), Some(u8::MAX as f64)),

        "dateTime" => string().with_format("date-time"),
        "date" => string().with_format("date"),
        "time" => string().with_format("time"),

        "boolean" => ScalarSchema::new(Primitive::Boolean),
        "base64Binary" => string().with_format("byte"),
        "hexBinary" => string().with_format("binary"),
        "anyURI" => string().with_format("uri"),

        "anyType" => ScalarSchema::new(Primitive::Opaque),

        other => {
            return Err(ConvertError::unsupported(
                path,
                format!("unrecognized built-in datatype '{other}'"),
            ))
        }
    };
    Ok(scalar)
}

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

/// Constraints stated by `facets` alone, for a value of `primitive`.
pub(crate) fn facet_constraints(
    facets: &Facets,
    primitive: Primitive,
    path: &str,
) -> Result<Constraints, ConvertError> {
    let has_length = facets.length.is_some()
        || facets.min_length.is_some()
        || facets.max_length.is_some();
    let has_bounds = facets.min_inclusive.is_some()
        || facets.max_inclusive.is_some()
        || facets.min_exclusive.is_some()
        || facets.max_exclusive.is_some();
    let has_digits = facets.total_digits.is_some() || facets.fraction_digits.is_some();

    if has_length && !matches!(primitive, Primitive::String | Primitive::Opaque) {
        return Err(ConvertError::unsupported(
            path,
            format!("length facets on a {} value", primitive.as_str()),
        ));
    }
    if (has_bounds || has_digits) && !primitive.is_numeric() {
        return Err(ConvertError::unsupported(
            path,
            format!("numeric facets on a {} value", primitive.as_str()),
        ));
    }
    if let (Some(length), Some(min)) = (facets.length, facets.min_length) {
        if length != min {
            return Err(ConvertError::narrowing(path, "length conflicts with minLength"));
        }
    }
    if let (Some(length), Some(max)) = (facets.length, facets.max_length) {
        if length != max {
            return Err(ConvertError::narrowing(path, "length conflicts with maxLength"));
        }
    }

    let enumeration = if facets.enumeration.is_empty() {
        None
    } else {
        Some(
            facets
                .enumeration
                .iter()
                .map(|lexical| typed_value(lexical, primitive, path))
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(Constraints {
        min_length: facets.min_length.or(facets.length),
        max_length: facets.max_length.or(facets.length),
        pattern: facets.pattern.clone(),
        minimum: tighter_lower(
            facets.min_inclusive.map(Bound::inclusive),
            facets.min_exclusive.map(Bound::exclusive),
        ),
        maximum: tighter_upper(
            facets.max_inclusive.map(Bound::inclusive),
            facets.max_exclusive.map(Bound::exclusive),
        ),
        enumeration,
        total_digits: facets.total_digits,
        fraction_digits: facets.fraction_digits,
    })
}

pub(crate) fn tighter_lower(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.looser_lower_than(&b) { b } else { a }),
        (a, b) => a.or(b),
    }
}

pub(crate) fn tighter_upper(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a.looser_upper_than(&b) { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Intersect the numeric bounds with the range `totalDigits` can represent.
///
/// Digit counts too large for an `f64` range leave the bounds untouched.
pub(crate) fn apply_total_digits(constraints: &mut Constraints) {
    let Some(total) = constraints.total_digits else {
        return;
    };
    let fraction = constraints.fraction_digits.unwrap_or(0).min(total);
    let (Ok(integral), Ok(fraction)) = (i32::try_from(total - fraction), i32::try_from(fraction))
    else {
        return;
    };
    let limit = 10f64.powi(integral) - 10f64.powi(-fraction);
    if !limit.is_finite() {
        return;
    }
    constraints.minimum = tighter_lower(constraints.minimum, Some(Bound::inclusive(-limit)));
    constraints.maximum = tighter_upper(constraints.maximum, Some(Bound::inclusive(limit)));
}

/// Type a lexical enumeration value according to the primitive.
///
/// The special floating-point literals `INF`, `-INF` and `NaN` have no JSON
/// number form and are kept as strings.
fn typed_value(lexical: &str, primitive: Primitive, path: &str) -> Result<Value, ConvertError> {
    let invalid = || {
        ConvertError::unsupported(
            path,
            format!(
                "enumeration value '{lexical}' is not a valid {}",
                primitive.as_str()
            ),
        )
    };
    let trimmed = lexical.trim();
    match primitive {
        Primitive::String | Primitive::Opaque => Ok(Value::String(lexical.to_string())),
        Primitive::Integer => trimmed
            .trim_start_matches('+')
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid()),
        Primitive::Number if matches!(trimmed, "INF" | "+INF" | "-INF" | "NaN") => {
            Ok(Value::String(trimmed.to_string()))
        }
        Primitive::Number => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        Primitive::Boolean => match trimmed {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
    }
}

// ---------------------------------------------------------------------------
// Atomic and union types
// ---------------------------------------------------------------------------

/// Translate an atomic type: its base value narrowed by its own facets.
pub(crate) fn translate_atomic(
    cx: &mut ConversionContext<'_>,
    atomic: &AtomicType,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    match base_value(cx, &atomic.base, path)? {
        SchemaObject::Scalar(base) => {
            let own = ScalarSchema {
                constraints: facet_constraints(&atomic.facets, base.primitive, path)?,
                ..ScalarSchema::new(base.primitive)
            };
            Ok(SchemaObject::Scalar(narrow_scalar(cx, &base, &own, path)?))
        }
        other if atomic.facets.is_empty() => Ok(other),
        _ => Err(ConvertError::unsupported(
            path,
            "facets restricting a union type",
        )),
    }
}

/// Translate a union type into a variant set of its members.
pub(crate) fn translate_union(
    cx: &mut ConversionContext<'_>,
    union: &UnionType,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    let mut variants = union
        .members
        .iter()
        .map(|member| super::reference(cx, member, path))
        .collect::<Result<Vec<_>, _>>()?;
    match variants.len() {
        0 => Err(ConvertError::unsupported(path, "union type without member types")),
        1 => Ok(variants.remove(0)),
        _ => Ok(SchemaObject::VariantSet(VariantSet {
            variants,
            optional: false,
        })),
    }
}

/// The value schema an atomic type restricts, with references to named
/// atomic types replaced by their translated content.
fn base_value(
    cx: &mut ConversionContext<'_>,
    base: &TypeRef,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    let graph = cx.graph();
    let node = match base {
        TypeRef::Builtin(name) => return Ok(SchemaObject::Scalar(builtin_scalar(name, path)?)),
        other => graph.resolve(other, path)?.1,
    };
    if !node.is_atomic() {
        return Err(ConvertError::unsupported(
            path,
            format!("atomic type derived from structured type '{base}'"),
        ));
    }
    match super::reference(cx, base, path)? {
        SchemaObject::Reference { target } => match cx.registered(&target) {
            Some(schema) => Ok(without_description(schema.clone())),
            None => Err(ConvertError::unsupported(
                path,
                format!("circular type derivation through '{target}'"),
            )),
        },
        inline => Ok(without_description(inline)),
    }
}

fn without_description(mut schema: SchemaObject) -> SchemaObject {
    if let SchemaObject::Scalar(scalar) = &mut schema {
        scalar.description = None;
    }
    schema
}
