//! The specification AST.
//!
//! A `Specification` is a triple `(given, matches, projection)`. This
//! module is pure data plus the handful of structural predicates the
//! rest of the crate (parser, connectivity validator, skeleton builder,
//! runner, inverter, feed decomposer, alpha-renamer) all walk.

/// A named, typed slot bound somewhere in a specification: a given or an
/// unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub fact_type: String,
}

impl Label {
    pub fn new(name: impl Into<String>, fact_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fact_type: fact_type.into(),
        }
    }
}

/// One step of a role chain: `"->" ident ":" type` in the descriptive
/// string grammar — walk predecessor role `role`, arriving at a fact of
/// type `fact_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleStep {
    pub role: String,
    pub fact_type: String,
}

impl RoleStep {
    pub fn new(role: impl Into<String>, fact_type: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            fact_type: fact_type.into(),
        }
    }
}

/// A path condition: `(rolesLeft, labelRight, rolesRight)`.
///
/// The left label is always the enclosing match's unknown — the parser
/// checks this (grammar rule "Path left identifier equals the enclosing
/// match's unknown") but does not store it, since it is never anything
/// else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCondition {
    pub roles_left: Vec<RoleStep>,
    pub label_right: String,
    pub roles_right: Vec<RoleStep>,
}

/// An existential condition: keep the row iff the nested matches yield
/// >=1 row (`exists: true`) or 0 rows (`exists: false`).
#[derive(Debug, Clone, PartialEq)]
pub struct ExistentialCondition {
    pub exists: bool,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Path(PathCondition),
    Existential(ExistentialCondition),
}

pub fn is_path_condition(c: &Condition) -> bool {
    matches!(c, Condition::Path(_))
}

pub fn is_existential_condition(c: &Condition) -> bool {
    matches!(c, Condition::Existential(_))
}

/// One given: an input parameter bound by the caller, plus optional
/// existential conditions filtering the given itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Given {
    pub label: Label,
    pub conditions: Vec<Condition>,
}

/// One match: an unknown to be found, plus a non-empty, ordered
/// sequence of conditions whose first element is always a path
/// condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub unknown: Label,
    pub conditions: Vec<Condition>,
}

impl Match {
    /// The match's leading path condition. Parsing and validation
    /// guarantee this exists; callers elsewhere in the crate may
    /// `.expect()` it on an already-validated specification.
    pub fn leading_path(&self) -> Option<&PathCondition> {
        self.conditions.first().and_then(|c| match c {
            Condition::Path(p) => Some(p),
            _ => None,
        })
    }
}

/// One shape a projection (or a named component of a composite
/// projection) can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionShape {
    /// Hydrate the full fact bound to this label.
    Fact(String),
    /// Project a single field of the fact bound to this label.
    Field(String, String),
    /// Project the content hash of the fact bound to this label.
    Hash(String),
    /// Recursively run a nested specification against the current row's
    /// bindings (no `given` of its own — it reuses labels already in
    /// scope).
    Nested(Box<NestedSpecification>),
}

/// A nested specification used inside a composite projection component:
/// matches plus a projection, evaluated against the enclosing row's
/// bindings rather than a fresh `given`.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedSpecification {
    pub matches: Vec<Match>,
    pub projection: Projection,
}

/// A specification's output shape: either one unnamed shape (a singular
/// projection) or an ordered list of named components (a composite
/// projection).
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Singular(ProjectionShape),
    Composite(Vec<(String, ProjectionShape)>),
}

/// A specification: `(given, matches, projection)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub given: Vec<Given>,
    pub matches: Vec<Match>,
    pub projection: Projection,
}

impl Specification {
    /// All labels introduced by `given`, in order.
    pub fn given_labels(&self) -> Vec<&Label> {
        self.given.iter().map(|g| &g.label).collect()
    }

    /// All labels introduced by top-level `matches`, in order.
    pub fn unknown_labels(&self) -> Vec<&Label> {
        self.matches.iter().map(|m| &m.unknown).collect()
    }
}

/// A path condition is the degenerate, guaranteed-single-row shape
/// exactly when it walks zero successor steps (`roles_left` empty) but
/// at least one predecessor step (`roles_right` non-empty): with no
/// successor hop, the AST carries no static evidence that the walk could
/// ever yield more than one fact, so (conservatively, since the AST does
/// not annotate role arity) this shape is treated as the one
/// "deterministic" — single-valued — case. A path with a non-empty
/// `roles_left` always includes a successor hop, which is inherently
/// one-to-many, so it is never deterministic; a fully empty path
/// (`roles_left` and `roles_right` both empty — a bare equality to an
/// already-bound label) is likewise always single-valued.
pub fn is_deterministic_path(cond: &PathCondition) -> bool {
    !(cond.roles_left.is_empty() && !cond.roles_right.is_empty())
}

/// A specification (or feed sub-specification) is deterministic iff
/// every path condition it contains, at any nesting depth inside
/// existentials, is deterministic. Feed decomposition uses this to drop
/// feeds that can never produce more than a single, already-known row.
pub fn is_deterministic(spec: &Specification) -> bool {
    matches_are_deterministic(&spec.matches)
}

pub(crate) fn matches_are_deterministic(matches: &[Match]) -> bool {
    matches.iter().all(|m| {
        m.conditions.iter().all(|c| match c {
            Condition::Path(p) => is_deterministic_path(p),
            Condition::Existential(e) => matches_are_deterministic(&e.matches),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(roles_left: Vec<&str>, label_right: &str, roles_right: Vec<&str>) -> PathCondition {
        PathCondition {
            roles_left: roles_left
                .into_iter()
                .map(|r| RoleStep::new(r, "T"))
                .collect(),
            label_right: label_right.to_string(),
            roles_right: roles_right
                .into_iter()
                .map(|r| RoleStep::new(r, "T"))
                .collect(),
        }
    }

    #[test]
    fn empty_left_nonempty_right_is_deterministic() {
        let p = path(vec![], "p1", vec!["company"]);
        assert!(is_deterministic_path(&p));
    }

    #[test]
    fn nonempty_left_is_not_deterministic() {
        let p = path(vec!["company"], "p1", vec![]);
        assert!(!is_deterministic_path(&p));
    }

    #[test]
    fn fully_empty_path_is_deterministic() {
        let p = path(vec![], "p1", vec![]);
        assert!(is_deterministic_path(&p));
    }

    #[test]
    fn predicate_helpers() {
        let c = Condition::Path(path(vec![], "p1", vec![]));
        assert!(is_path_condition(&c));
        assert!(!is_existential_condition(&c));
    }
}
