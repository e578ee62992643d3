//! The inverter.
//!
//! Given a specification `S`, produce a set of *inverted specifications*:
//! each has as its single given the fact being written (bound to an
//! unknown originally introduced somewhere in `S`) and re-derives the
//! original givens (and the projection-producing labels) by walking the
//! same path conditions `S` used, in reverse.
//!
//! **Scope.** The chain-tracing implemented here follows each unknown's
//! immediate parent (the label its leading path condition references)
//! back up to a given, one hop at a time — this covers every
//! specification in this crate's worked examples, where a match's
//! ancestry back to its given(s) is a simple chain. A specification
//! whose unknowns are reachable from more than one given along
//! independent branches (so that inverting from one unknown cannot
//! re-derive *every* given) is a documented simplification; see
//! `DESIGN.md`.

use std::collections::BTreeMap;

use crate::errors::FactResult;
use crate::spec::ast::{Condition, Given, Label, Match, PathCondition, Projection, ProjectionShape, Specification};

/// One inverted specification: `given` is the root (the newly-written
/// fact's label); `spec` re-derives the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Inversion {
    pub given: Label,
    pub spec: Specification,
}

pub fn invert(spec: &Specification) -> FactResult<Vec<Inversion>> {
    let types = collect_label_types(spec);
    let parents = build_parent_map(&spec.matches);
    let given_names: std::collections::BTreeSet<String> =
        spec.given.iter().map(|g| g.label.name.clone()).collect();

    let mut inversions = Vec::new();

    for m in &spec.matches {
        if let Some(leading) = m.leading_path() {
            inversions.push(build_inversion(
                &m.unknown,
                leading,
                &parents,
                &given_names,
                &types,
                &spec.projection,
            ));
        }

        for c in &m.conditions[1..] {
            if let Condition::Existential(e) = c {
                if !e.exists {
                    // A negative existential's nested match becoming
                    // satisfied is what *cancels* a previously-produced
                    // row; invert from its unknown too, with the same
                    // projection (the row it cancels is the same shape).
                    for nested in &e.matches {
                        if let Some(nested_leading) = nested.leading_path() {
                            inversions.push(build_inversion(
                                &nested.unknown,
                                nested_leading,
                                &parents,
                                &given_names,
                                &types,
                                &spec.projection,
                            ));
                        }
                    }
                }
            }
        }
    }

    inversions.extend(invert_nested_projections(&spec.projection, &types, &parents, &given_names));

    tracing::debug!(inversions = inversions.len(), "derived inverted specifications");
    Ok(inversions)
}

fn build_inversion(
    root_unknown: &Label,
    leading_path: &PathCondition,
    parents: &BTreeMap<String, PathCondition>,
    given_names: &std::collections::BTreeSet<String>,
    types: &BTreeMap<String, String>,
    projection: &Projection,
) -> Inversion {
    let mut matches = Vec::new();
    let mut current_name = root_unknown.name.clone();
    let mut current_path = leading_path.clone();

    loop {
        let (derived_name, inverted_path) = invert_single_hop(&current_name, &current_path);
        let derived_type = types.get(&derived_name).cloned().unwrap_or_default();
        matches.push(Match {
            unknown: Label::new(derived_name.clone(), derived_type),
            conditions: vec![Condition::Path(inverted_path)],
        });

        if given_names.contains(&derived_name) {
            break;
        }
        match parents.get(&derived_name) {
            Some(parent_path) => {
                current_name = derived_name;
                current_path = parent_path.clone();
            }
            None => break,
        }
    }

    Inversion {
        given: root_unknown.clone(),
        spec: Specification {
            given: vec![Given {
                label: root_unknown.clone(),
                conditions: vec![],
            }],
            matches,
            projection: projection.clone(),
        },
    }
}

/// Invert one path-condition hop: walking from `unknown_name`'s bound
/// reference to `path.label_right` becomes walking from
/// `path.label_right` to `unknown_name`, with the role chain reversed in
/// the sense that `rolesLeft`/`rolesRight` swap sides.
fn invert_single_hop(unknown_name: &str, path: &PathCondition) -> (String, PathCondition) {
    let derived_name = path.label_right.clone();
    let inverted = PathCondition {
        roles_left: path.roles_right.clone(),
        label_right: unknown_name.to_string(),
        roles_right: path.roles_left.clone(),
    };
    (derived_name, inverted)
}

fn build_parent_map(matches: &[Match]) -> BTreeMap<String, PathCondition> {
    let mut parents = BTreeMap::new();
    collect_parents(matches, &mut parents);
    parents
}

fn collect_parents(matches: &[Match], parents: &mut BTreeMap<String, PathCondition>) {
    for m in matches {
        if let Some(leading) = m.leading_path() {
            parents.insert(m.unknown.name.clone(), leading.clone());
        }
        for c in &m.conditions {
            if let Condition::Existential(e) = c {
                collect_parents(&e.matches, parents);
            }
        }
    }
}

fn collect_label_types(spec: &Specification) -> BTreeMap<String, String> {
    let mut types = BTreeMap::new();
    for g in &spec.given {
        types.insert(g.label.name.clone(), g.label.fact_type.clone());
    }
    fn walk(matches: &[Match], types: &mut BTreeMap<String, String>) {
        for m in matches {
            types.insert(m.unknown.name.clone(), m.unknown.fact_type.clone());
            for c in &m.conditions {
                if let Condition::Existential(e) = c {
                    walk(&e.matches, types);
                }
            }
        }
    }
    walk(&spec.matches, &mut types);
    types
}

/// Propagate inversion into nested specifications carried by a composite
/// projection. Any outer label a nested match's path condition
/// references (but does not itself introduce) is treated as a synthetic
/// given of a standalone specification built from the nested
/// matches/projection, and inverted recursively.
fn invert_nested_projections(
    projection: &Projection,
    outer_types: &BTreeMap<String, String>,
    outer_parents: &BTreeMap<String, PathCondition>,
    outer_given_names: &std::collections::BTreeSet<String>,
) -> Vec<Inversion> {
    let mut out = Vec::new();
    let shapes: Vec<&ProjectionShape> = match projection {
        Projection::Singular(shape) => vec![shape],
        Projection::Composite(components) => components.iter().map(|(_, s)| s).collect(),
    };

    for shape in shapes {
        if let ProjectionShape::Nested(nested) = shape {
            let local_names: std::collections::BTreeSet<String> =
                nested.matches.iter().map(|m| m.unknown.name.clone()).collect();

            let mut synthetic_given = Vec::new();
            for m in &nested.matches {
                if let Some(leading) = m.leading_path() {
                    if !local_names.contains(&leading.label_right) {
                        if let Some(t) = outer_types.get(&leading.label_right) {
                            synthetic_given.push(Given {
                                label: Label::new(leading.label_right.clone(), t.clone()),
                                conditions: vec![],
                            });
                        }
                    }
                }
            }
            synthetic_given.dedup_by(|a, b| a.label.name == b.label.name);

            if !synthetic_given.is_empty() {
                let synthetic_spec = Specification {
                    given: synthetic_given,
                    matches: nested.matches.clone(),
                    projection: nested.projection.clone(),
                };
                if let Ok(inner) = invert(&synthetic_spec) {
                    out.extend(inner);
                }
            }

            out.extend(invert_nested_projections(
                &nested.projection,
                outer_types,
                outer_parents,
                outer_given_names,
            ));
        }
    }

    out
}
