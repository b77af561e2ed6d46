//! Choice transformation: alternation groups → variant sets.
//!
//! Each direct branch of an alternation becomes one variant object holding
//! only that branch's members, all required within it. A branch that is
//! itself an alternation (and not repeated) is spliced into the parent set,
//! so `choice{choice{A, B}, C}` yields `{A}, {B}, {C}`. An alternation
//! reached through a sequence branch stays a nested variant set on that
//! branch's object.

use crate::context::ConversionContext;
use crate::error::ConvertError;
use crate::graph::{ContentModel, Occurs, Particle};
use crate::schema::{ObjectSchema, SchemaObject, VariantSet};

use super::structure::{checked_occurs, merge_particle};

/// Translate the branches of an alternation group.
pub(crate) fn translate_choice(
    cx: &mut ConversionContext<'_>,
    particles: &[Particle],
    path: &str,
) -> Result<VariantSet, ConvertError> {
    let mut set = VariantSet::default();
    collect_variants(cx, particles, &mut set, path)?;
    if set.len() < 2 {
        return Err(ConvertError::unsupported(
            path,
            format!("alternation with {} branch(es)", set.len()),
        ));
    }
    tracing::debug!(path = %path, variants = set.len(), optional = set.optional, "translated alternation");
    Ok(set)
}

fn collect_variants(
    cx: &mut ConversionContext<'_>,
    particles: &[Particle],
    set: &mut VariantSet,
    path: &str,
) -> Result<(), ConvertError> {
    for particle in particles {
        let occurs = checked_occurs(particle, path)?;
        if occurs.is_prohibited() {
            continue;
        }
        if occurs.is_optional() {
            set.optional = true;
        }

        if let Particle::Group(group) = particle {
            if let (ContentModel::Choice(inner), false) = (&group.model, occurs.is_repeated()) {
                cx.nested(path, |cx| collect_variants(cx, inner, set, path))?;
                continue;
            }
        }

        // within its own branch, the particle is present
        let present = Occurs {
            min: occurs.min.max(1),
            max: occurs.max,
        };
        let mut variant = ObjectSchema::default();
        merge_particle(cx, &mut variant, particle, present, path)?;
        set.variants.push(SchemaObject::Object(variant));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::graph::{MaxOccurs, TypeGraph, TypeRef};
    use pretty_assertions::assert_eq;

    fn element(name: &str) -> Particle {
        Particle::element(name, TypeRef::builtin("string"))
    }

    fn choice(particles: Vec<Particle>) -> Result<VariantSet, ConvertError> {
        let graph = TypeGraph::new();
        let options = ConvertOptions::default();
        let mut cx = ConversionContext::new(&graph, &options);
        translate_choice(&mut cx, &particles, "T")
    }

    fn variant_keys(set: &VariantSet) -> Vec<Vec<String>> {
        set.variants
            .iter()
            .map(|v| v.as_object().unwrap().properties.keys().cloned().collect())
            .collect()
    }

    #[test]
    fn test_two_branches() {
        let set = choice(vec![element("a"), element("b")]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set.optional);
        for variant in &set.variants {
            let object = variant.as_object().unwrap();
            assert_eq!(object.properties.len(), 1);
            assert_eq!(object.required.len(), 1);
        }
    }

    #[test]
    fn test_direct_nested_choice_is_spliced() {
        let set = choice(vec![
            Particle::group(ContentModel::choice(vec![element("a"), element("b")])),
            element("c"),
        ])
        .unwrap();
        assert_eq!(
            variant_keys(&set),
            vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn test_choice_inside_sequence_branch_stays_nested() {
        let set = choice(vec![
            Particle::group(ContentModel::sequence(vec![
                element("head"),
                Particle::group(ContentModel::choice(vec![element("a"), element("b")])),
            ])),
            element("c"),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        let first = set.variants[0].as_object().unwrap();
        assert_eq!(first.required, vec!["head"]);
        assert_eq!(first.variant_sets.len(), 1);
        assert_eq!(first.variant_sets[0].len(), 2);
    }

    #[test]
    fn test_optional_branch_marks_set_optional() {
        let set = choice(vec![element("a").optional(), element("b")]).unwrap();
        assert!(set.optional);
        let first = set.variants[0].as_object().unwrap();
        assert_eq!(first.required, vec!["a"]);
    }

    #[test]
    fn test_repeated_branch_is_an_array() {
        let set = choice(vec![element("a").occurs(1, MaxOccurs::Bounded(4)), element("b")]).unwrap();
        let first = set.variants[0].as_object().unwrap();
        assert!(matches!(first.properties["a"], SchemaObject::Array(_)));
        assert_eq!(first.required, vec!["a"]);
    }

    #[test]
    fn test_degenerate_alternation() {
        assert!(matches!(
            choice(vec![element("only")]),
            Err(ConvertError::UnsupportedConstruct { .. })
        ));
        assert!(choice(vec![]).is_err());
        assert!(choice(vec![element("a"), element("b").occurs(0, MaxOccurs::Bounded(0))]).is_err());
    }
}
