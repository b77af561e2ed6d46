//! Inheritance resolution: extension and restriction of a base type.
//!
//! The base is always entered through the registry (so a base chain gets
//! the same cycle protection as member references) and its translated shape
//! is copied, never shared. A base that is still being translated (its
//! members lead back to the derived type) has its shape computed from its
//! node. A base chain that loops back on itself is rejected.

use serde_json::Value;

use crate::context::{ConversionContext, Identity};
use crate::error::ConvertError;
use crate::graph::{Derivation, StructuredType, TypeRef};
use crate::schema::{
    ArraySchema, Constraints, ObjectSchema, Primitive, ScalarSchema, SchemaName, SchemaObject,
};

use super::constraints::{apply_total_digits, builtin_scalar};
use super::structure::own_shape;

/// What a structured type derives from.
enum BaseShape {
    /// A structured base, copied.
    Object(ObjectSchema),
    /// An atomic base: the derived type has simple content.
    Value(SchemaObject),
}

/// Translate a structured type with a base type.
pub(crate) fn derive(
    cx: &mut ConversionContext<'_>,
    structured: &StructuredType,
    base: &TypeRef,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    let base_shape = base_shape(cx, base, path)?;
    let own = own_shape(cx, structured, path)?;

    let object = match (structured.derivation, base_shape) {
        (Derivation::Extension, BaseShape::Object(base)) => extend(base, own, path)?,
        (Derivation::Extension, BaseShape::Value(value)) => {
            if own.is_empty() {
                return Ok(value);
            }
            simple_content(cx, value, own, path)?
        }
        (Derivation::Restriction, BaseShape::Object(base)) => restrict(cx, base, own, path)?,
        (Derivation::Restriction, BaseShape::Value(_)) => {
            return Err(ConvertError::unsupported(
                path,
                format!("structured restriction of atomic type '{base}'"),
            ))
        }
    };
    Ok(SchemaObject::Object(object))
}

fn base_shape(
    cx: &mut ConversionContext<'_>,
    base: &TypeRef,
    path: &str,
) -> Result<BaseShape, ConvertError> {
    if let TypeRef::Builtin(name) = base {
        return Ok(BaseShape::Value(SchemaObject::Scalar(builtin_scalar(name, path)?)));
    }
    let graph = cx.graph();
    let (id, node) = graph.resolve(base, path)?;
    if node.is_atomic() {
        return Ok(BaseShape::Value(super::reference(cx, base, path)?));
    }

    let name = super::type_reference(cx, id, path)?;
    if let Some(schema) = cx.registered(&name) {
        return Ok(shape_of(schema.clone()));
    }

    // The base is still being translated further up the stack because one of
    // its members leads back here. Compute its shape from the node instead,
    // unless the base chain loops.
    if graph.derives_from(id, id) {
        return Err(ConvertError::unsupported(
            path,
            format!("circular type derivation through '{name}'"),
        ));
    }
    tracing::debug!(base = %name, "computing shape of in-progress base");
    cx.nested(path, |cx| super::translate_type(cx, node, path)).map(shape_of)
}

fn shape_of(schema: SchemaObject) -> BaseShape {
    match schema {
        SchemaObject::Object(object) => BaseShape::Object(ObjectSchema {
            description: None,
            ..object
        }),
        SchemaObject::VariantSet(set) => BaseShape::Object(set.into()),
        // opaque placeholder of a failed base
        other => BaseShape::Value(other),
    }
}

// ---------------------------------------------------------------------------
// Extension
// ---------------------------------------------------------------------------

/// Base members ∪ own members; an own member replaces a base member of the
/// same name. Required sets are unioned.
fn extend(mut base: ObjectSchema, own: ObjectSchema, path: &str) -> Result<ObjectSchema, ConvertError> {
    tracing::debug!(path = %path, own = own.properties.len(), "extending base");
    for (name, schema) in own.properties {
        base.properties.insert(name, schema);
    }
    for name in &own.required {
        base.require(name);
    }
    base.variant_sets.extend(own.variant_sets);
    for name in &own.attributes {
        base.mark_attribute(name);
    }
    for name in &own.nillable {
        base.mark_nillable(name);
    }
    Ok(base)
}

/// Structured type extending an atomic type: the value moves into the text
/// property and the attributes sit beside it.
fn simple_content(
    cx: &ConversionContext<'_>,
    value: SchemaObject,
    own: ObjectSchema,
    path: &str,
) -> Result<ObjectSchema, ConvertError> {
    if own.properties.len() != own.attributes.len() || !own.variant_sets.is_empty() {
        return Err(ConvertError::unsupported(
            path,
            "element content extending an atomic type",
        ));
    }
    let text = &cx.options().text_property;
    if own.properties.contains_key(text) {
        return Err(ConvertError::unsupported(
            path,
            format!("attribute '{text}' clashes with the text property"),
        ));
    }
    let mut object = ObjectSchema::default();
    object.properties.insert(text.clone(), value);
    object.require(text);
    extend(object, own, path)
}

// ---------------------------------------------------------------------------
// Restriction
// ---------------------------------------------------------------------------

/// Start from the base shape and narrow every member the type restates.
fn restrict(
    cx: &mut ConversionContext<'_>,
    mut base: ObjectSchema,
    own: ObjectSchema,
    path: &str,
) -> Result<ObjectSchema, ConvertError> {
    for (name, schema) in own.properties {
        let member_path = format!("{path}/{name}");
        let Some(inherited) = base.properties.get(&name) else {
            return Err(ConvertError::narrowing(
                &member_path,
                format!("member '{name}' is not declared by the base type"),
            ));
        };
        let required = own.required.contains(&name);
        if base.is_required(&name) && !required {
            return Err(ConvertError::narrowing(
                &member_path,
                format!("required member '{name}' cannot become optional"),
            ));
        }
        let narrowed = narrow_member(cx, inherited, &schema, &member_path)?;
        base.properties.insert(name.clone(), narrowed);
        if required {
            base.require(&name);
        }
    }
    if !own.variant_sets.is_empty() {
        base.variant_sets = own.variant_sets;
    }
    for name in &own.nillable {
        base.mark_nillable(name);
    }
    Ok(base)
}

fn narrow_member(
    cx: &mut ConversionContext<'_>,
    base: &SchemaObject,
    own: &SchemaObject,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    match (base, own) {
        (SchemaObject::Scalar(base), SchemaObject::Scalar(own)) => {
            Ok(SchemaObject::Scalar(narrow_scalar(cx, base, own, path)?))
        }
        (SchemaObject::Array(base), SchemaObject::Array(own)) => {
            if own.min_items < base.min_items {
                return Err(ConvertError::narrowing(path, "minOccurs lowered below the base"));
            }
            if let Some(base_max) = base.max_items {
                if own.max_items.map_or(true, |max| max > base_max) {
                    return Err(ConvertError::narrowing(path, "maxOccurs raised above the base"));
                }
            }
            Ok(SchemaObject::Array(ArraySchema {
                items: Box::new(narrow_member(cx, &base.items, &own.items, path)?),
                min_items: own.min_items,
                max_items: own.max_items,
            }))
        }
        (SchemaObject::Array(base), single) => {
            if base.min_items > 1 {
                return Err(ConvertError::narrowing(path, "minOccurs lowered below the base"));
            }
            narrow_member(cx, &base.items, single, path)
        }
        (_, SchemaObject::Array(_)) => Err(ConvertError::narrowing(
            path,
            "single-valued member restated as repeated",
        )),
        // anyType, or the placeholder of a failed base
        (SchemaObject::Scalar(base), own) if base.primitive == Primitive::Opaque => Ok(own.clone()),
        (
            SchemaObject::Reference { target: base_target },
            SchemaObject::Reference { target: own_target },
        ) => {
            if base_target == own_target || named_derives_from(cx, own_target, base_target) {
                return Ok(own.clone());
            }
            // Unrelated atomic types are fine as long as the restated value
            // space sits inside the base's.
            match (registered_scalar(cx, base_target), registered_scalar(cx, own_target)) {
                (Some(base), Some(restated)) => {
                    check_restated_scalar(cx, &base, &restated, path)?;
                    Ok(own.clone())
                }
                _ => Err(ConvertError::narrowing(
                    path,
                    format!("'{own_target}' does not derive from '{base_target}'"),
                )),
            }
        }
        (SchemaObject::Reference { target }, SchemaObject::Scalar(restated)) => {
            match registered_scalar(cx, target) {
                Some(base) => Ok(SchemaObject::Scalar(narrow_scalar(cx, &base, restated, path)?)),
                None => Err(ConvertError::narrowing(
                    path,
                    format!("member of type '{target}' restated as a simple value"),
                )),
            }
        }
        (SchemaObject::Scalar(base), SchemaObject::Reference { target }) => {
            match registered_scalar(cx, target) {
                Some(restated) => {
                    check_restated_scalar(cx, base, &restated, path)?;
                    Ok(own.clone())
                }
                None => Err(ConvertError::narrowing(
                    path,
                    format!("simple-valued member restated as '{target}'"),
                )),
            }
        }
        (base, own) if std::mem::discriminant(base) == std::mem::discriminant(own) => {
            Ok(own.clone())
        }
        _ => Err(ConvertError::narrowing(
            path,
            "member restated with a different kind of schema",
        )),
    }
}

/// A member restated by reference keeps only the restated type's own
/// constraints, so narrowing the base by it must not add any.
fn check_restated_scalar(
    cx: &mut ConversionContext<'_>,
    base: &ScalarSchema,
    restated: &ScalarSchema,
    path: &str,
) -> Result<(), ConvertError> {
    let narrowed = narrow_scalar(cx, base, restated, path)?;
    let mut expected = restated.constraints.clone();
    apply_total_digits(&mut expected);
    if narrowed.constraints != expected {
        return Err(ConvertError::narrowing(path, "restated type is wider than the base"));
    }
    Ok(())
}

/// Whether the type registered as `name` has `ancestor` in its base chain.
fn named_derives_from(
    cx: &ConversionContext<'_>,
    name: &SchemaName,
    ancestor: &SchemaName,
) -> bool {
    match (cx.owners.get(name), cx.owners.get(ancestor)) {
        (Some(Identity::Type(id)), Some(Identity::Type(ancestor))) => {
            cx.graph().derives_from(*id, *ancestor)
        }
        _ => false,
    }
}

/// The finished scalar registered as `name`, without its documentation.
fn registered_scalar(cx: &ConversionContext<'_>, name: &SchemaName) -> Option<ScalarSchema> {
    match cx.registered(name) {
        Some(SchemaObject::Scalar(scalar)) => Some(ScalarSchema {
            description: None,
            ..scalar.clone()
        }),
        _ => None,
    }
}

/// Narrow a base scalar by a restated one.
///
/// Length, bounds and digit counts may only tighten; a restated enumeration
/// must stay inside the base's value space; a pattern replaces the base's.
pub(crate) fn narrow_scalar(
    cx: &mut ConversionContext<'_>,
    base: &ScalarSchema,
    own: &ScalarSchema,
    path: &str,
) -> Result<ScalarSchema, ConvertError> {
    let primitive = match (base.primitive, own.primitive) {
        (Primitive::Opaque, own) => own,
        (base, own) if base == own => own,
        (Primitive::Number, Primitive::Integer) => Primitive::Integer,
        (base, own) => {
            return Err(ConvertError::narrowing(
                path,
                format!("cannot narrow {} to {}", base.as_str(), own.as_str()),
            ))
        }
    };

    let mut constraints = tighten(cx, &base.constraints, &own.constraints, path)?;
    apply_total_digits(&mut constraints);
    check_consistent(&constraints, path)?;

    Ok(ScalarSchema {
        primitive,
        format: own.format.clone().or_else(|| base.format.clone()),
        constraints,
        description: own.description.clone().or_else(|| base.description.clone()),
    })
}

fn tighten(
    cx: &mut ConversionContext<'_>,
    base: &Constraints,
    own: &Constraints,
    path: &str,
) -> Result<Constraints, ConvertError> {
    let widened = |facet: &str| -> Result<Constraints, ConvertError> {
        Err(ConvertError::narrowing(path, format!("{facet} widens the base")))
    };

    if let (Some(b), Some(o)) = (base.min_length, own.min_length) {
        if o < b {
            return widened("minLength");
        }
    }
    if let (Some(b), Some(o)) = (base.max_length, own.max_length) {
        if o > b {
            return widened("maxLength");
        }
    }
    if let (Some(b), Some(o)) = (&base.minimum, &own.minimum) {
        if o.looser_lower_than(b) {
            return widened("lower bound");
        }
    }
    if let (Some(b), Some(o)) = (&base.maximum, &own.maximum) {
        if o.looser_upper_than(b) {
            return widened("upper bound");
        }
    }
    if let (Some(b), Some(o)) = (base.total_digits, own.total_digits) {
        if o > b {
            return widened("totalDigits");
        }
    }
    if let (Some(b), Some(o)) = (base.fraction_digits, own.fraction_digits) {
        if o > b {
            return widened("fractionDigits");
        }
    }

    let enumeration = match (&base.enumeration, &own.enumeration) {
        (Some(allowed), Some(values)) => {
            if let Some(outside) = values.iter().find(|v| !allowed.iter().any(|a| same_value(a, v))) {
                return Err(ConvertError::narrowing(
                    path,
                    format!("enumeration value {outside} is outside the base enumeration"),
                ));
            }
            Some(values.clone())
        }
        (None, Some(values)) => {
            for value in values {
                if !admits(cx, base, value) {
                    return Err(ConvertError::narrowing(
                        path,
                        format!("enumeration value {value} is outside the base value space"),
                    ));
                }
            }
            Some(values.clone())
        }
        (base_values, None) => base_values.clone(),
    };

    Ok(Constraints {
        min_length: own.min_length.or(base.min_length),
        max_length: own.max_length.or(base.max_length),
        pattern: own.pattern.clone().or_else(|| base.pattern.clone()),
        minimum: own.minimum.or(base.minimum),
        maximum: own.maximum.or(base.maximum),
        enumeration,
        total_digits: own.total_digits.or(base.total_digits),
        fraction_digits: own.fraction_digits.or(base.fraction_digits),
    })
}

fn check_consistent(constraints: &Constraints, path: &str) -> Result<(), ConvertError> {
    if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length) {
        if min > max {
            return Err(ConvertError::narrowing(
                path,
                format!("minLength {min} exceeds maxLength {max}"),
            ));
        }
    }
    if let (Some(min), Some(max)) = (&constraints.minimum, &constraints.maximum) {
        let empty = min.value > max.value
            || (min.value == max.value && (min.exclusive || max.exclusive));
        if empty {
            return Err(ConvertError::narrowing(
                path,
                format!("bounds {} and {} admit no value", min.value, max.value),
            ));
        }
    }
    Ok(())
}

/// Whether `value` satisfies the bounds, lengths and pattern of `base`.
///
/// A pattern the regex engine cannot compile is not checked.
fn admits(cx: &mut ConversionContext<'_>, base: &Constraints, value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            let Some(v) = n.as_f64() else {
                return false;
            };
            base.minimum.map_or(true, |min| min.admits_above(v))
                && base.maximum.map_or(true, |max| max.admits_below(v))
        }
        Value::String(s) => {
            let len = s.chars().count() as u64;
            base.min_length.map_or(true, |min| len >= min)
                && base.max_length.map_or(true, |max| len <= max)
                && base.pattern.as_deref().map_or(true, |pattern| {
                    cx.full_match_regex(pattern).map_or(true, |re| re.is_match(s))
                })
        }
        _ => true,
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
