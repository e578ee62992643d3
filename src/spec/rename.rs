//! The alpha-renamer.
//!
//! Total, fail-fast, injective label substitution across every
//! structural location a label name can appear: givens, unknowns, a
//! path condition's `labelRight`, and every flavor of projection label
//! (including inside nested specifications). Needed because inversion
//! (`crate::runtime::inverter`) introduces a fresh given in place of an
//! existing label and must not collide with the rest of the
//! specification's names.

use std::collections::BTreeSet;

use crate::errors::{FactError, FactResult};
use crate::spec::ast::{
    Condition, ExistentialCondition, Given, Label, Match, NestedSpecification, PathCondition,
    Projection, ProjectionShape, Specification,
};

/// `mapping`: old name -> new name. Must be injective, and no image may
/// collide with any label in `spec` that the mapping does not itself
/// rename.
pub fn rename(
    spec: &Specification,
    mapping: &std::collections::BTreeMap<String, String>,
) -> FactResult<Specification> {
    let mut images = BTreeSet::new();
    for new_name in mapping.values() {
        if !images.insert(new_name.clone()) {
            return Err(FactError::invalid_specification(format!(
                "rename mapping is not injective: '{new_name}' is the image of more than one label"
            )));
        }
    }

    for name in collect_all_label_names(spec) {
        if !mapping.contains_key(&name) && images.contains(&name) {
            return Err(FactError::invalid_specification_at(
                format!("rename image '{name}' collides with an unmapped label"),
                name,
            ));
        }
    }

    Ok(rename_specification(spec, mapping))
}

fn sub(name: &str, mapping: &std::collections::BTreeMap<String, String>) -> String {
    mapping.get(name).cloned().unwrap_or_else(|| name.to_string())
}

fn rename_label(label: &Label, mapping: &std::collections::BTreeMap<String, String>) -> Label {
    Label {
        name: sub(&label.name, mapping),
        fact_type: label.fact_type.clone(),
    }
}

fn rename_specification(
    spec: &Specification,
    mapping: &std::collections::BTreeMap<String, String>,
) -> Specification {
    Specification {
        given: spec
            .given
            .iter()
            .map(|g| rename_given(g, mapping))
            .collect(),
        matches: spec
            .matches
            .iter()
            .map(|m| rename_match(m, mapping))
            .collect(),
        projection: rename_projection(&spec.projection, mapping),
    }
}

fn rename_given(given: &Given, mapping: &std::collections::BTreeMap<String, String>) -> Given {
    Given {
        label: rename_label(&given.label, mapping),
        conditions: given
            .conditions
            .iter()
            .map(|c| rename_condition(c, mapping))
            .collect(),
    }
}

fn rename_match(m: &Match, mapping: &std::collections::BTreeMap<String, String>) -> Match {
    Match {
        unknown: rename_label(&m.unknown, mapping),
        conditions: m
            .conditions
            .iter()
            .map(|c| rename_condition(c, mapping))
            .collect(),
    }
}

fn rename_condition(c: &Condition, mapping: &std::collections::BTreeMap<String, String>) -> Condition {
    match c {
        Condition::Path(p) => Condition::Path(rename_path(p, mapping)),
        Condition::Existential(e) => Condition::Existential(ExistentialCondition {
            exists: e.exists,
            matches: e.matches.iter().map(|m| rename_match(m, mapping)).collect(),
        }),
    }
}

fn rename_path(p: &PathCondition, mapping: &std::collections::BTreeMap<String, String>) -> PathCondition {
    PathCondition {
        roles_left: p.roles_left.clone(),
        label_right: sub(&p.label_right, mapping),
        roles_right: p.roles_right.clone(),
    }
}

fn rename_projection(
    p: &Projection,
    mapping: &std::collections::BTreeMap<String, String>,
) -> Projection {
    match p {
        Projection::Singular(shape) => Projection::Singular(rename_shape(shape, mapping)),
        Projection::Composite(components) => Projection::Composite(
            components
                .iter()
                .map(|(name, shape)| (name.clone(), rename_shape(shape, mapping)))
                .collect(),
        ),
    }
}

fn rename_shape(
    shape: &ProjectionShape,
    mapping: &std::collections::BTreeMap<String, String>,
) -> ProjectionShape {
    match shape {
        ProjectionShape::Fact(label) => ProjectionShape::Fact(sub(label, mapping)),
        ProjectionShape::Field(label, field) => {
            ProjectionShape::Field(sub(label, mapping), field.clone())
        }
        ProjectionShape::Hash(label) => ProjectionShape::Hash(sub(label, mapping)),
        ProjectionShape::Nested(nested) => ProjectionShape::Nested(Box::new(NestedSpecification {
            matches: nested.matches.iter().map(|m| rename_match(m, mapping)).collect(),
            projection: rename_projection(&nested.projection, mapping),
        })),
    }
}

fn collect_all_label_names(spec: &Specification) -> Vec<String> {
    let mut names = Vec::new();
    for g in &spec.given {
        names.push(g.label.name.clone());
        collect_condition_names(&g.conditions, &mut names);
    }
    collect_match_names(&spec.matches, &mut names);
    collect_projection_names(&spec.projection, &mut names);
    names
}

fn collect_match_names(matches: &[Match], names: &mut Vec<String>) {
    for m in matches {
        names.push(m.unknown.name.clone());
        collect_condition_names(&m.conditions, names);
    }
}

fn collect_condition_names(conditions: &[Condition], names: &mut Vec<String>) {
    for c in conditions {
        if let Condition::Existential(e) = c {
            collect_match_names(&e.matches, names);
        }
    }
}

fn collect_projection_names(p: &Projection, names: &mut Vec<String>) {
    match p {
        Projection::Singular(shape) => collect_shape_names(shape, names),
        Projection::Composite(components) => {
            for (_, shape) in components {
                collect_shape_names(shape, names);
            }
        }
    }
}

fn collect_shape_names(shape: &ProjectionShape, names: &mut Vec<String>) {
    if let ProjectionShape::Nested(nested) = shape {
        collect_match_names(&nested.matches, names);
        collect_projection_names(&nested.projection, names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parser::parse_specification;

    fn sample() -> Specification {
        parse_specification("(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1").unwrap()
    }

    #[test]
    fn renames_given_unknown_and_path_right() {
        let mut mapping = std::collections::BTreeMap::new();
        mapping.insert("p1".to_string(), "company".to_string());
        mapping.insert("u1".to_string(), "office".to_string());

        let renamed = rename(&sample(), &mapping).unwrap();
        assert_eq!(renamed.given[0].label.name, "company");
        assert_eq!(renamed.matches[0].unknown.name, "office");
        match &renamed.matches[0].conditions[0] {
            Condition::Path(p) => assert_eq!(p.label_right, "company"),
            _ => panic!("expected path condition"),
        }
    }

    #[test]
    fn rename_then_inverse_rename_is_identity() {
        let mut mapping = std::collections::BTreeMap::new();
        mapping.insert("p1".to_string(), "company".to_string());
        mapping.insert("u1".to_string(), "office".to_string());
        let mut inverse = std::collections::BTreeMap::new();
        inverse.insert("company".to_string(), "p1".to_string());
        inverse.insert("office".to_string(), "u1".to_string());

        let original = sample();
        let renamed = rename(&original, &mapping).unwrap();
        let back = rename(&renamed, &inverse).unwrap();
        assert_eq!(original, back);
    }

    #[test]
    fn non_injective_mapping_is_rejected() {
        let mut mapping = std::collections::BTreeMap::new();
        mapping.insert("p1".to_string(), "shared".to_string());
        mapping.insert("u1".to_string(), "shared".to_string());
        assert!(rename(&sample(), &mapping).is_err());
    }

    #[test]
    fn collision_with_unmapped_label_is_rejected() {
        let mut mapping = std::collections::BTreeMap::new();
        mapping.insert("p1".to_string(), "u1".to_string());
        assert!(rename(&sample(), &mapping).is_err());
    }
}
