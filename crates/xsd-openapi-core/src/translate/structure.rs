//! Structural translation: content models and attributes → object shapes.
//!
//! Each member of an ordered or unordered group becomes one property. A
//! nested group is not a type of its own; its members are merged flat into
//! the enclosing object with the group's occurrence folded into theirs.
//! Alternation groups become variant sets (see [`super::choice`]).

use crate::context::ConversionContext;
use crate::error::ConvertError;
use crate::graph::{
    local_name, AttributeDecl, ContentModel, ElementParticle, Occurs, Particle, StructuredType,
    TypeRef,
};
use crate::schema::{ArraySchema, ObjectSchema, SchemaObject};

use super::choice::translate_choice;

/// Translate a structured type without a base.
///
/// A content model that is itself an alternation, with no attributes beside
/// it, yields a bare variant set.
pub(crate) fn translate_structured(
    cx: &mut ConversionContext<'_>,
    structured: &StructuredType,
    path: &str,
) -> Result<SchemaObject, ConvertError> {
    if let (Some(ContentModel::Choice(particles)), true) =
        (&structured.content, structured.attributes.is_empty())
    {
        return Ok(SchemaObject::VariantSet(translate_choice(cx, particles, path)?));
    }
    Ok(SchemaObject::Object(own_shape(cx, structured, path)?))
}

/// Object shape of a type's own content and attributes, ignoring its base.
pub(crate) fn own_shape(
    cx: &mut ConversionContext<'_>,
    structured: &StructuredType,
    path: &str,
) -> Result<ObjectSchema, ConvertError> {
    let mut object = ObjectSchema::default();
    if let Some(model) = &structured.content {
        merge_model(cx, &mut object, model, Occurs::ONCE, path)?;
    }
    add_attributes(cx, &mut object, &structured.attributes, path)?;
    Ok(object)
}

/// Merge one particle, whose effective bounds are `occurs`, into `object`.
pub(crate) fn merge_particle(
    cx: &mut ConversionContext<'_>,
    object: &mut ObjectSchema,
    particle: &Particle,
    occurs: Occurs,
    path: &str,
) -> Result<(), ConvertError> {
    match particle {
        Particle::Element(element) => add_member(cx, object, element, occurs, path),
        Particle::Group(group) => {
            cx.nested(path, |cx| merge_model(cx, object, &group.model, occurs, path))
        }
    }
}

/// Bounds of a particle, rejecting `min > max`.
pub(crate) fn checked_occurs(particle: &Particle, path: &str) -> Result<Occurs, ConvertError> {
    let occurs = particle.occurrence();
    if !occurs.is_consistent() {
        return Err(ConvertError::unsupported(
            path,
            format!("minOccurs {} greater than maxOccurs", occurs.min),
        ));
    }
    Ok(occurs)
}

fn merge_model(
    cx: &mut ConversionContext<'_>,
    object: &mut ObjectSchema,
    model: &ContentModel,
    outer: Occurs,
    path: &str,
) -> Result<(), ConvertError> {
    match model {
        ContentModel::Sequence(particles) | ContentModel::All(particles) => {
            for particle in particles {
                let occurs = checked_occurs(particle, path)?.within(outer);
                if occurs.is_prohibited() {
                    continue;
                }
                merge_particle(cx, object, particle, occurs, path)?;
            }
        }
        ContentModel::Choice(particles) if outer.is_repeated() => {
            // any branch may appear any number of times, in any mix
            let branch = Occurs {
                min: 0,
                max: outer.max,
            };
            for particle in particles {
                let occurs = checked_occurs(particle, path)?.within(branch);
                if occurs.is_prohibited() {
                    continue;
                }
                merge_particle(cx, object, particle, occurs, path)?;
            }
        }
        ContentModel::Choice(particles) => {
            let mut set = translate_choice(cx, particles, path)?;
            if outer.is_optional() {
                set.optional = true;
            }
            object.variant_sets.push(set);
        }
    }
    Ok(())
}

fn add_member(
    cx: &mut ConversionContext<'_>,
    object: &mut ObjectSchema,
    element: &ElementParticle,
    occurs: Occurs,
    path: &str,
) -> Result<(), ConvertError> {
    let name = local_name(&element.name);
    let member_path = format!("{path}/{name}");
    if object.properties.contains_key(name) {
        return Err(ConvertError::unsupported(
            &member_path,
            format!("duplicate member '{name}'"),
        ));
    }

    let mut schema = super::reference(cx, &element.type_ref, &member_path)?;
    schema.describe(element.documentation.as_deref());
    if occurs.is_repeated() {
        schema = SchemaObject::Array(ArraySchema {
            items: Box::new(schema),
            min_items: occurs.min,
            max_items: occurs.max.bound(),
        });
    }

    object.properties.insert(name.to_string(), schema);
    if !occurs.is_optional() {
        object.require(name);
    }
    if element.nillable {
        object.mark_nillable(name);
    }
    Ok(())
}

fn add_attributes(
    cx: &mut ConversionContext<'_>,
    object: &mut ObjectSchema,
    attributes: &[AttributeDecl],
    path: &str,
) -> Result<(), ConvertError> {
    for attribute in attributes {
        let name = local_name(&attribute.name);
        let attribute_path = format!("{path}/@{name}");
        if object.properties.contains_key(name) {
            return Err(ConvertError::unsupported(
                &attribute_path,
                format!("duplicate member '{name}'"),
            ));
        }
        if !matches!(attribute.type_ref, TypeRef::Builtin(_)) {
            let (_, node) = cx.graph().resolve(&attribute.type_ref, &attribute_path)?;
            if !node.is_atomic() {
                return Err(ConvertError::unsupported(
                    &attribute_path,
                    format!("attribute of structured type '{}'", attribute.type_ref),
                ));
            }
        }

        let mut schema = super::reference(cx, &attribute.type_ref, &attribute_path)?;
        schema.describe(attribute.documentation.as_deref());
        object.properties.insert(name.to_string(), schema);
        if attribute.required {
            object.require(name);
        }
        object.mark_attribute(name);
    }
    Ok(())
}
