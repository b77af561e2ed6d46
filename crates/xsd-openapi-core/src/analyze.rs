//! Summary statistics of a type graph, without converting it.

use serde::Serialize;

use crate::graph::{ContentModel, Derivation, Particle, TypeGraph, TypeKind, TypeName};

/// What a type graph declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GraphInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    /// Named atomic types, in declaration order.
    pub atomic_types: Vec<String>,
    pub union_types: Vec<String>,
    pub structured_types: Vec<String>,
    pub anonymous_types: usize,
    /// Global element names.
    pub elements: Vec<String>,
    /// Alternation groups anywhere in a content model, nested ones included.
    pub choice_groups: usize,
    pub extensions: usize,
    pub restrictions: usize,
}

/// Count and list what `graph` declares.
pub fn analyze(graph: &TypeGraph) -> GraphInfo {
    let mut info = GraphInfo {
        target_namespace: graph.target_namespace.clone(),
        ..GraphInfo::default()
    };

    for (_, node) in graph.types() {
        let name = match &node.name {
            TypeName::Qualified(name) => Some(name.clone()),
            TypeName::Anonymous { .. } => {
                info.anonymous_types += 1;
                None
            }
        };
        match &node.kind {
            TypeKind::Atomic(_) => info.atomic_types.extend(name),
            TypeKind::Union(_) => info.union_types.extend(name),
            TypeKind::Structured(structured) => {
                info.structured_types.extend(name);
                if structured.base.is_some() {
                    match structured.derivation {
                        Derivation::Extension => info.extensions += 1,
                        Derivation::Restriction => info.restrictions += 1,
                    }
                }
                if let Some(model) = &structured.content {
                    info.choice_groups += count_choices(model);
                }
            }
        }
    }

    info.elements = graph.elements().map(|(_, el)| el.name.clone()).collect();
    info
}

fn count_choices(model: &ContentModel) -> usize {
    let own = usize::from(model.is_alternation());
    own + model
        .particles()
        .iter()
        .map(|particle| match particle {
            Particle::Group(group) => count_choices(&group.model),
            Particle::Element(_) => 0,
        })
        .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ElementDecl, Facets, StructuredType, TypeNode, TypeRef};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_analyze_counts() {
        let mut graph = TypeGraph::new().with_target_namespace("urn:shop");
        graph.add_type(TypeNode::atomic("Sku", TypeRef::builtin("string"), Facets::default()));
        graph.add_type(TypeNode::union(
            "Ref",
            vec![TypeRef::builtin("int"), TypeRef::named("Sku")],
        ));
        graph.add_type(TypeNode::structured(
            "Line",
            StructuredType::new(ContentModel::choice(vec![
                Particle::element("sku", TypeRef::named("Sku")),
                Particle::group(ContentModel::choice(vec![
                    Particle::element("a", TypeRef::builtin("string")),
                    Particle::element("b", TypeRef::builtin("string")),
                ])),
            ])),
        ));
        graph.add_type(TypeNode::structured(
            "SpecialLine",
            StructuredType::default().extending(TypeRef::named("Line")),
        ));
        graph.add_type(TypeNode::anonymous(
            "Line/sku",
            TypeKind::Atomic(crate::graph::AtomicType {
                base: TypeRef::builtin("string"),
                facets: Facets::default(),
            }),
        ));
        graph.add_element(ElementDecl::new("line", TypeRef::named("Line")));

        let info = analyze(&graph);
        assert_eq!(info.target_namespace.as_deref(), Some("urn:shop"));
        assert_eq!(info.atomic_types, vec!["Sku"]);
        assert_eq!(info.union_types, vec!["Ref"]);
        assert_eq!(info.structured_types, vec!["Line", "SpecialLine"]);
        assert_eq!(info.anonymous_types, 1);
        assert_eq!(info.elements, vec!["line"]);
        assert_eq!(info.choice_groups, 2);
        assert_eq!((info.extensions, info.restrictions), (1, 0));
    }
}
