//! The skeleton builder.
//!
//! A skeleton is the positional, label-erased normal form of a
//! specification: facts become 1-based indices in source-encounter
//! order, path conditions become predecessor/successor edge pairs, and
//! existential conditions become a recursive tree of nested edges. Two
//! specifications that differ only in label spelling (alpha-equivalent
//! specifications, see `crate::spec::rename`) reduce to byte-identical
//! skeletons, which is what lets the feed cache (`crate::runtime::feed`)
//! key on a skeleton hash rather than on specification text.

use crate::determinism::hashing::encode_string;
use crate::errors::{FactError, FactResult};
use crate::spec::ast::{Condition, Label, Match, PathCondition, Specification};

use std::collections::BTreeMap;

/// One predecessor→successor hop, labelled by role. `edge_index` is
/// unique across the whole skeleton, including edges nested inside
/// `not_exists_conditions` at any depth — it is the stable identity an
/// inverter or feed decomposer anchors a newly-written fact's role to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub predecessor_fact_index: usize,
    pub successor_fact_index: usize,
    pub role: String,
    pub edge_index: usize,
}

/// One existential condition, reduced to its own sub-skeleton: the
/// edges its nested matches introduce, plus any existential conditions
/// nested inside those matches, recursively. `exists` carries the
/// positive/negative sense; the type keeps the `notExists` name for the
/// recursive shape since a negated existential is the form the runner
/// and inverter special-case most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotExistsCondition {
    pub exists: bool,
    pub edges: Vec<Edge>,
    pub children: Vec<NotExistsCondition>,
}

/// The positional normal form of a specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    /// Fact type at each 1-based fact index (`facts[0]` is fact index 1).
    pub facts: Vec<String>,
    /// Fact indices of the givens, in given order.
    pub inputs: Vec<usize>,
    /// Top-level path-condition edges (outside any existential).
    pub edges: Vec<Edge>,
    /// Existential conditions attached to top-level matches, in source
    /// order.
    pub not_exists_conditions: Vec<NotExistsCondition>,
    /// Fact indices of the top-level unknowns — the shape of one output
    /// row before projection is applied.
    pub outputs: Vec<usize>,
}

/// Reduce a specification to its skeleton.
///
/// Assumes `spec` has already passed connectivity validation; a
/// disconnected specification can still be reduced (skeleton
/// construction never fails on its own), but the runner and feed
/// decomposer are not meant to operate on one.
pub fn build_skeleton(spec: &Specification) -> FactResult<Skeleton> {
    let mut builder = Builder::default();

    let inputs: Vec<usize> = spec
        .given
        .iter()
        .map(|g| builder.fact_index_for_label(&g.label))
        .collect();

    let mut edges = Vec::new();
    let mut not_exists_conditions = Vec::new();
    let mut outputs = Vec::new();

    for m in &spec.matches {
        let unknown_index = builder.fact_index_for_label(&m.unknown);
        outputs.push(unknown_index);
        builder.build_match_conditions(m, unknown_index, &mut edges, &mut not_exists_conditions)?;
    }

    let skeleton = Skeleton {
        facts: builder.facts,
        inputs,
        edges,
        not_exists_conditions,
        outputs,
    };
    tracing::debug!(
        facts = skeleton.facts.len(),
        edges = skeleton.edges.len(),
        "built specification skeleton"
    );
    Ok(skeleton)
}

/// Canonically encode a skeleton to the byte string the feed cache
/// hashes (`crate::runtime::feed::feed_hash`). Reuses
/// `determinism::hashing`'s string escape table so two alpha-equivalent
/// specifications — which reduce to equal `Skeleton` values — also
/// produce byte-identical encodings, rather than depending on `Debug`'s
/// unspecified formatting.
pub fn canonical_string(skeleton: &Skeleton) -> String {
    let mut out = String::new();
    out.push('{');
    out.push_str("\"facts\":[");
    for (i, f) in skeleton.facts.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_string(f, &mut out);
    }
    out.push_str("],\"inputs\":");
    encode_usize_list(&skeleton.inputs, &mut out);
    out.push_str(",\"edges\":[");
    for (i, e) in skeleton.edges.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_edge(e, &mut out);
    }
    out.push_str("],\"notExists\":[");
    for (i, n) in skeleton.not_exists_conditions.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_not_exists(n, &mut out);
    }
    out.push_str("],\"outputs\":");
    encode_usize_list(&skeleton.outputs, &mut out);
    out.push('}');
    out
}

fn encode_usize_list(values: &[usize], out: &mut String) {
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
}

fn encode_edge(edge: &Edge, out: &mut String) {
    out.push('{');
    out.push_str("\"predecessor\":");
    out.push_str(&edge.predecessor_fact_index.to_string());
    out.push_str(",\"successor\":");
    out.push_str(&edge.successor_fact_index.to_string());
    out.push_str(",\"role\":");
    encode_string(&edge.role, out);
    out.push_str(",\"edgeIndex\":");
    out.push_str(&edge.edge_index.to_string());
    out.push('}');
}

fn encode_not_exists(condition: &NotExistsCondition, out: &mut String) {
    out.push('{');
    out.push_str("\"exists\":");
    out.push_str(if condition.exists { "true" } else { "false" });
    out.push_str(",\"edges\":[");
    for (i, e) in condition.edges.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_edge(e, out);
    }
    out.push_str("],\"children\":[");
    for (i, c) in condition.children.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_not_exists(c, out);
    }
    out.push_str("]}");
}

#[derive(Default)]
struct Builder {
    facts: Vec<String>,
    names: BTreeMap<String, usize>,
    next_edge_index: usize,
}

impl Builder {
    fn fact_index_for_label(&mut self, label: &Label) -> usize {
        if let Some(&i) = self.names.get(&label.name) {
            return i;
        }
        self.facts.push(label.fact_type.clone());
        let idx = self.facts.len();
        self.names.insert(label.name.clone(), idx);
        idx
    }

    fn fact_index_for_name(&self, name: &str) -> FactResult<usize> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| FactError::internal(format!("unresolved label in skeleton: {name}")))
    }

    fn anon_fact_index(&mut self, fact_type: &str) -> usize {
        self.facts.push(fact_type.to_string());
        self.facts.len()
    }

    fn make_edge(&mut self, predecessor_fact_index: usize, successor_fact_index: usize, role: &str) -> Edge {
        let edge_index = self.next_edge_index;
        self.next_edge_index += 1;
        Edge {
            predecessor_fact_index,
            successor_fact_index,
            role: role.to_string(),
            edge_index,
        }
    }

    /// Build the edges for one match's conditions and append them to
    /// `edges` (the enclosing scope's top-level edge list), recursing
    /// into `not_exists` for nested existential conditions.
    fn build_match_conditions(
        &mut self,
        m: &Match,
        unknown_index: usize,
        edges: &mut Vec<Edge>,
        not_exists: &mut Vec<NotExistsCondition>,
    ) -> FactResult<()> {
        for condition in &m.conditions {
            match condition {
                Condition::Path(path) => {
                    edges.extend(self.build_path_edges(path, unknown_index)?);
                }
                Condition::Existential(existential) => {
                    let mut nested_edges = Vec::new();
                    let mut nested_children = Vec::new();
                    for nested_match in &existential.matches {
                        let nested_unknown = self.fact_index_for_label(&nested_match.unknown);
                        self.build_match_conditions(
                            nested_match,
                            nested_unknown,
                            &mut nested_edges,
                            &mut nested_children,
                        )?;
                    }
                    not_exists.push(NotExistsCondition {
                        exists: existential.exists,
                        edges: nested_edges,
                        children: nested_children,
                    });
                }
            }
        }
        Ok(())
    }

    /// Reduce one path condition to a chain of edges ending at
    /// `unknown_index`.
    ///
    /// First walk `roles_right` as predecessor hops starting from
    /// `label_right`'s fact (each hop's destination is a predecessor of
    /// the current fact, so the edge's predecessor/successor pair is
    /// `(new fact, current fact)`). Then walk `roles_left` in reverse as
    /// successor hops (each hop's destination is a successor of the
    /// current fact along that role, so the pair is `(current fact, new
    /// fact)`): for original index `i` (0-based, counting outward from
    /// the unknown), the role name is `roles_left[i].role` and the
    /// destination type when walked backward is `roles_left[i - 1]`'s
    /// type, or the unknown's own type when `i == 0`.
    fn build_path_edges(&mut self, path: &PathCondition, unknown_index: usize) -> FactResult<Vec<Edge>> {
        let mut edges = Vec::new();
        let mut current = self.fact_index_for_name(&path.label_right)?;

        for step in &path.roles_right {
            let next = self.anon_fact_index(&step.fact_type);
            edges.push(self.make_edge(next, current, &step.role));
            current = next;
        }

        let n = path.roles_left.len();
        for i in (0..n).rev() {
            let step = &path.roles_left[i];
            let next = if i == 0 {
                unknown_index
            } else {
                self.anon_fact_index(&path.roles_left[i - 1].fact_type)
            };
            edges.push(self.make_edge(current, next, &step.role));
            current = next;
        }

        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ast::{Given, Projection, ProjectionShape, RoleStep};

    fn simple_spec() -> Specification {
        // given p1: Company
        // match u1: Office [u1->company:Company = p1]
        // => fact u1
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
    fn builds_expected_shape() {
        let skeleton = build_skeleton(&simple_spec()).unwrap();
        assert_eq!(skeleton.facts, vec!["Company".to_string(), "Office".to_string()]);
        assert_eq!(skeleton.inputs, vec![1]);
        assert_eq!(skeleton.outputs, vec![2]);
        assert_eq!(skeleton.edges.len(), 1);
        assert_eq!(skeleton.edges[0].predecessor_fact_index, 1);
        assert_eq!(skeleton.edges[0].successor_fact_index, 2);
        assert_eq!(skeleton.edges[0].role, "company");
    }

    #[test]
    fn canonical_string_is_stable_and_alpha_invariant() {
        let a = simple_spec();
        let mut b = simple_spec();
        b.given[0].label.name = "company".to_string();
        b.matches[0].unknown.name = "office".to_string();
        b.matches[0].conditions[0] = Condition::Path(PathCondition {
            roles_left: vec![RoleStep::new("company", "Company")],
            label_right: "company".to_string(),
            roles_right: vec![],
        });
        b.projection = Projection::Singular(ProjectionShape::Fact("office".to_string()));

        let sk_a = build_skeleton(&a).unwrap();
        let sk_b = build_skeleton(&b).unwrap();
        assert_eq!(canonical_string(&sk_a), canonical_string(&sk_b));
        assert_eq!(canonical_string(&sk_a), canonical_string(&sk_a));
    }

    #[test]
    fn alpha_equivalent_specs_reduce_identically() {
        let a = simple_spec();
        let mut b = simple_spec();
        b.given[0].label.name = "company".to_string();
        b.matches[0].unknown.name = "office".to_string();
        b.matches[0].conditions[0] = Condition::Path(PathCondition {
            roles_left: vec![RoleStep::new("company", "Company")],
            label_right: "company".to_string(),
            roles_right: vec![],
        });
        b.projection = Projection::Singular(ProjectionShape::Fact("office".to_string()));

        let sk_a = build_skeleton(&a).unwrap();
        let sk_b = build_skeleton(&b).unwrap();
        assert_eq!(sk_a, sk_b);
    }

    #[test]
    fn multi_hop_path_chains_through_anonymous_facts() {
        // match u1: Office [u1->company:Company->parent:Company = p1]
        let spec = Specification {
            given: vec![Given {
                label: Label::new("p1", "Company"),
                conditions: vec![],
            }],
            matches: vec![Match {
                unknown: Label::new("u1", "Office"),
                conditions: vec![Condition::Path(PathCondition {
                    roles_left: vec![
                        RoleStep::new("company", "Company"),
                        RoleStep::new("parent", "Company"),
                    ],
                    label_right: "p1".to_string(),
                    roles_right: vec![],
                })],
            }],
            projection: Projection::Singular(ProjectionShape::Fact("u1".to_string())),
        };

        let skeleton = build_skeleton(&spec).unwrap();
        // facts: [Company(p1)=1, Company(anon)=2, Office(u1)=3]
        assert_eq!(skeleton.facts.len(), 3);
        assert_eq!(skeleton.edges.len(), 2);
        // p1(1) --parent--> anon(2)
        assert_eq!(skeleton.edges[0].predecessor_fact_index, 1);
        assert_eq!(skeleton.edges[0].successor_fact_index, 2);
        assert_eq!(skeleton.edges[0].role, "parent");
        // anon(2) --company--> u1(3)
        assert_eq!(skeleton.edges[1].predecessor_fact_index, 2);
        assert_eq!(skeleton.edges[1].successor_fact_index, 3);
        assert_eq!(skeleton.edges[1].role, "company");
    }

    #[test]
    fn existential_edges_are_not_top_level() {
        // match u1: Office [u1->company:Company = p1, !E { match u2: Closure [u2->office:Office = u1] }]
        let spec = Specification {
            given: vec![Given {
                label: Label::new("p1", "Company"),
                conditions: vec![],
            }],
            matches: vec![Match {
                unknown: Label::new("u1", "Office"),
                conditions: vec![
                    Condition::Path(PathCondition {
                        roles_left: vec![RoleStep::new("company", "Company")],
                        label_right: "p1".to_string(),
                        roles_right: vec![],
                    }),
                    Condition::Existential(crate::spec::ast::ExistentialCondition {
                        exists: false,
                        matches: vec![Match {
                            unknown: Label::new("u2", "Closure"),
                            conditions: vec![Condition::Path(PathCondition {
                                roles_left: vec![RoleStep::new("office", "Office")],
                                label_right: "u1".to_string(),
                                roles_right: vec![],
                            })],
                        }],
                    }),
                ],
            }],
            projection: Projection::Singular(ProjectionShape::Fact("u1".to_string())),
        };

        let skeleton = build_skeleton(&spec).unwrap();
        assert_eq!(skeleton.edges.len(), 1);
        assert_eq!(skeleton.not_exists_conditions.len(), 1);
        let nec = &skeleton.not_exists_conditions[0];
        assert!(!nec.exists);
        assert_eq!(nec.edges.len(), 1);
        assert_eq!(nec.edges[0].role, "office");
        // Edge indices are globally unique across the nesting.
        assert_ne!(skeleton.edges[0].edge_index, nec.edges[0].edge_index);
    }
}
