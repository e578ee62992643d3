//! The connectivity validator.
//!
//! A specification's givens and unknowns form a graph: each path
//! condition is an edge between the enclosing match's unknown and the
//! label it references. A specification is rejected if that graph is
//! not fully connected — an unknown (or given) unreachable from the
//! rest of the specification can never be constrained by the query and
//! almost certainly indicates a typo rather than an intentional cross
//! product.
//!
//! Implemented as union-find over label names, in the style of
//! `crate::sorter`'s batch-keyed maps: deterministic, no iteration-order
//! dependence on a `HashMap`.

use std::collections::BTreeMap;

use crate::errors::{FactError, FactResult};
use crate::spec::ast::{Condition, Match, Specification};

pub fn validate_connectivity(spec: &Specification) -> FactResult<()> {
    let mut uf = UnionFind::default();

    for given in &spec.given {
        uf.insert(&given.label.name);
    }
    collect_matches(&spec.matches, &mut uf)?;

    let labels = uf.labels();
    if labels.len() <= 1 {
        return Ok(());
    }

    let root = uf.find(&labels[0]);
    for label in &labels[1..] {
        if uf.find(label) != root {
            return Err(FactError::invalid_specification_at(
                format!(
                    "specification is disconnected: label '{label}' is not reachable from the rest of the specification"
                ),
                label.clone(),
            ));
        }
    }
    Ok(())
}

fn collect_matches(matches: &[Match], uf: &mut UnionFind) -> FactResult<()> {
    for m in matches {
        uf.insert(&m.unknown.name);
        for condition in &m.conditions {
            match condition {
                Condition::Path(path) => {
                    if !uf.contains(&path.label_right) {
                        return Err(FactError::invalid_specification_at(
                            format!(
                                "path condition references undeclared label '{}'",
                                path.label_right
                            ),
                            path.label_right.clone(),
                        ));
                    }
                    uf.union(&m.unknown.name, &path.label_right);
                }
                Condition::Existential(existential) => {
                    collect_matches(&existential.matches, uf)?;
                }
            }
        }
    }
    Ok(())
}

#[derive(Default)]
struct UnionFind {
    parent: BTreeMap<String, String>,
}

impl UnionFind {
    fn insert(&mut self, label: &str) {
        self.parent
            .entry(label.to_string())
            .or_insert_with(|| label.to_string());
    }

    fn contains(&self, label: &str) -> bool {
        self.parent.contains_key(label)
    }

    fn labels(&self) -> Vec<String> {
        self.parent.keys().cloned().collect()
    }

    fn find(&mut self, label: &str) -> String {
        let parent = self
            .parent
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string());
        if parent == label {
            parent
        } else {
            let root = self.find(&parent);
            self.parent.insert(label.to_string(), root.clone());
            root
        }
    }

    fn union(&mut self, a: &str, b: &str) {
        self.insert(a);
        self.insert(b);
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ast::{Given, Label, PathCondition, Projection, ProjectionShape, RoleStep};

    fn connected_spec() -> Specification {
        Specification {
            given: vec![Given {
                label: Label::new("p1", "Company"),
                conditions: vec![],
            }],
            matches: vec![Match {
                unknown: Label::new("u1", "Office"),
                conditions: vec![Condition::Path(PathCondition {
                    roles_left: vec![RoleStep::new("company", "Company")],
                    label_right: "p1".to_string(),
                    roles_right: vec![],
                })],
            }],
            projection: Projection::Singular(ProjectionShape::Fact("u1".to_string())),
        }
    }

    #[test]
    fn connected_specification_passes() {
        assert!(validate_connectivity(&connected_spec()).is_ok());
    }

    #[test]
    fn disconnected_given_is_rejected() {
        let mut spec = connected_spec();
        spec.given.push(Given {
            label: Label::new("p2", "Company"),
            conditions: vec![],
        });
        let err = validate_connectivity(&spec).unwrap_err();
        assert!(matches!(err, FactError::InvalidSpecification { .. }));
    }

    #[test]
    fn undeclared_label_reference_is_rejected() {
        let mut spec = connected_spec();
        if let Condition::Path(p) = &mut spec.matches[0].conditions[0] {
            p.label_right = "ghost".to_string();
        }
        let err = validate_connectivity(&spec).unwrap_err();
        assert!(matches!(err, FactError::InvalidSpecification { .. }));
    }

    #[test]
    fn nested_existential_match_connects_into_same_graph() {
        let mut spec = connected_spec();
        spec.matches[0].conditions.push(Condition::Existential(
            crate::spec::ast::ExistentialCondition {
                exists: false,
                matches: vec![Match {
                    unknown: Label::new("u2", "Closure"),
                    conditions: vec![Condition::Path(PathCondition {
                        roles_left: vec![RoleStep::new("office", "Office")],
                        label_right: "u1".to_string(),
                        roles_right: vec![],
                    })],
                }],
            },
        ));
        assert!(validate_connectivity(&spec).is_ok());
    }
}
