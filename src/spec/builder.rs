//! A typed fluent builder for specifications.
//!
//! The descriptive-string form is the normative external representation
//! of a specification; this builder is a host-language convenience that
//! must reduce to it. `build()` assembles an AST from the builder calls
//! and then round-trips it through the printer and parser — so a
//! specification constructed with the builder is validated exactly the
//! same way a parsed one is, and can never silently diverge from what
//! the descriptive-string grammar allows.

use crate::errors::FactResult;
use crate::spec::ast::{
    Condition, ExistentialCondition, Given, Label, Match, PathCondition, Projection,
    ProjectionShape, RoleStep, Specification,
};
use crate::spec::printer::print_specification;

#[derive(Debug, Default, Clone)]
pub struct SpecificationBuilder {
    given: Vec<Given>,
    matches: Vec<Match>,
    projection: Option<Projection>,
}

impl SpecificationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn given(mut self, name: impl Into<String>, fact_type: impl Into<String>) -> Self {
        self.given.push(Given {
            label: Label::new(name, fact_type),
            conditions: Vec::new(),
        });
        self
    }

    pub fn given_with_conditions(
        mut self,
        name: impl Into<String>,
        fact_type: impl Into<String>,
        conditions: Vec<Condition>,
    ) -> Self {
        self.given.push(Given {
            label: Label::new(name, fact_type),
            conditions,
        });
        self
    }

    pub fn match_unknown(
        mut self,
        name: impl Into<String>,
        fact_type: impl Into<String>,
        conditions: Vec<Condition>,
    ) -> Self {
        self.matches.push(Match {
            unknown: Label::new(name, fact_type),
            conditions,
        });
        self
    }

    pub fn project_fact(mut self, label: impl Into<String>) -> Self {
        self.projection = Some(Projection::Singular(ProjectionShape::Fact(label.into())));
        self
    }

    pub fn project_field(mut self, label: impl Into<String>, field: impl Into<String>) -> Self {
        self.projection = Some(Projection::Singular(ProjectionShape::Field(
            label.into(),
            field.into(),
        )));
        self
    }

    pub fn project_hash(mut self, label: impl Into<String>) -> Self {
        self.projection = Some(Projection::Singular(ProjectionShape::Hash(label.into())));
        self
    }

    pub fn project_composite(mut self, components: Vec<(String, ProjectionShape)>) -> Self {
        self.projection = Some(Projection::Composite(components));
        self
    }

    /// Assemble the AST and validate it by round-tripping through the
    /// printer and the real parser.
    pub fn build(self) -> FactResult<Specification> {
        let spec = Specification {
            given: self.given,
            matches: self.matches,
            projection: self.projection.unwrap_or(Projection::Composite(vec![])),
        };
        let text = print_specification(&spec);
        crate::spec::parser::parse_specification(&text)
    }

    /// Like `build`, but returns the canonical descriptive-string form
    /// rather than the AST.
    pub fn build_text(self) -> FactResult<String> {
        let spec = self.build()?;
        Ok(print_specification(&spec))
    }
}

/// Helper for constructing a path condition's role chain: `->role:type`
/// repeated, in the order they would appear in the descriptive string.
pub fn roles(steps: &[(&str, &str)]) -> Vec<RoleStep> {
    steps
        .iter()
        .map(|(role, fact_type)| RoleStep::new(*role, *fact_type))
        .collect()
}

pub fn path_condition(
    roles_left: Vec<RoleStep>,
    label_right: impl Into<String>,
    roles_right: Vec<RoleStep>,
) -> Condition {
    Condition::Path(PathCondition {
        roles_left,
        label_right: label_right.into(),
        roles_right,
    })
}

pub fn exists(matches: Vec<Match>) -> Condition {
    Condition::Existential(ExistentialCondition { exists: true, matches })
}

pub fn not_exists(matches: Vec<Match>) -> Condition {
    Condition::Existential(ExistentialCondition { exists: false, matches })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_simple_successor_query() {
        let spec = SpecificationBuilder::new()
            .given("p1", "Company")
            .match_unknown(
                "u1",
                "Office",
                vec![path_condition(roles(&[("company", "Company")]), "p1", vec![])],
            )
            .project_fact("u1")
            .build()
            .unwrap();

        let reparsed =
            crate::spec::parser::parse_specification("(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1")
                .unwrap();
        assert_eq!(spec, reparsed);
    }

    #[test]
    fn builder_rejects_disconnected_specification() {
        let result = SpecificationBuilder::new()
            .given("a", "A")
            .given("b", "B")
            .project_fact("a")
            .build();
        assert!(result.is_err());
    }
}
