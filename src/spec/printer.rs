//! The descriptive-string pretty-printer.
//!
//! The inverse of `crate::spec::parser::parse_specification` up to
//! whitespace normalization: `parse(print(spec)) == spec` for any
//! `spec` that parsing could have produced.

use crate::spec::ast::{Condition, Given, Match, Projection, ProjectionShape, RoleStep, Specification};

pub fn print_specification(spec: &Specification) -> String {
    let mut out = String::new();
    print_given(&spec.given, &mut out);
    out.push(' ');
    print_matches(&spec.matches, &mut out);
    if !matches!(&spec.projection, Projection::Composite(c) if c.is_empty()) {
        out.push(' ');
        print_projection(&spec.projection, &mut out);
    }
    out
}

fn print_given(given: &[Given], out: &mut String) {
    out.push('(');
    for (i, g) in given.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&g.label.name);
        out.push(':');
        out.push_str(&g.label.fact_type);
        if !g.conditions.is_empty() {
            out.push_str(" [");
            for c in &g.conditions {
                out.push(' ');
                print_condition(c, &g.label.name, out);
            }
            out.push_str(" ]");
        }
    }
    out.push(')');
}

fn print_matches(matches: &[Match], out: &mut String) {
    out.push_str("{ ");
    for m in matches {
        print_match(m, out);
        out.push(' ');
    }
    out.push('}');
}

fn print_match(m: &Match, out: &mut String) {
    out.push_str(&m.unknown.name);
    out.push(':');
    out.push_str(&m.unknown.fact_type);
    out.push_str(" [");
    for c in &m.conditions {
        out.push(' ');
        print_condition(c, &m.unknown.name, out);
    }
    out.push_str(" ]");
}

/// `left_name` is the enclosing label's name — the match's unknown, or
/// the given's own name when printing a given's existential conditions.
/// `PathCondition` does not store its left identifier (see
/// `crate::spec::ast`): it is always the enclosing scope's label, so the
/// printer reconstructs it from context rather than reading it back off
/// the AST node.
fn print_condition(c: &Condition, left_name: &str, out: &mut String) {
    match c {
        Condition::Path(p) => {
            out.push_str(left_name);
            print_roles(&p.roles_left, out);
            out.push_str(" = ");
            out.push_str(&p.label_right);
            print_roles(&p.roles_right, out);
        }
        Condition::Existential(e) => {
            if !e.exists {
                out.push('!');
            }
            out.push('E');
            out.push(' ');
            print_matches(&e.matches, out);
        }
    }
}

fn print_roles(roles: &[RoleStep], out: &mut String) {
    for r in roles {
        out.push_str("->");
        out.push_str(&r.role);
        out.push(':');
        out.push_str(&r.fact_type);
    }
}

fn print_projection(p: &Projection, out: &mut String) {
    out.push_str("=> ");
    match p {
        Projection::Singular(shape) => print_projection_shape(shape, out),
        Projection::Composite(components) => {
            out.push_str("{ ");
            for (name, shape) in components {
                out.push_str(name);
                out.push_str(" = ");
                print_projection_shape(shape, out);
                out.push_str(", ");
            }
            out.push('}');
        }
    }
}

fn print_projection_shape(shape: &ProjectionShape, out: &mut String) {
    match shape {
        ProjectionShape::Fact(label) => out.push_str(label),
        ProjectionShape::Field(label, field) => {
            out.push_str(label);
            out.push('.');
            out.push_str(field);
        }
        ProjectionShape::Hash(label) => {
            out.push('#');
            out.push_str(label);
        }
        ProjectionShape::Nested(nested) => {
            print_matches(&nested.matches, out);
            out.push(' ');
            print_projection(&nested.projection, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parser::parse_specification;

    #[test]
    fn prints_and_reparses_simple_query() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1",
        )
        .unwrap();
        let printed = print_specification(&spec);
        let reparsed = parse_specification(&printed).unwrap();
        assert_eq!(spec, reparsed);
    }

    #[test]
    fn prints_and_reparses_negative_existential() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 !E { u2: Office.Closed [ u2->office:Office = u1 ] } ] } => u1",
        )
        .unwrap();
        let printed = print_specification(&spec);
        let reparsed = parse_specification(&printed).unwrap();
        assert_eq!(spec, reparsed);
    }

    #[test]
    fn prints_and_reparses_composite_projection() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => { name = u1.identifier, digest = #u1 }",
        )
        .unwrap();
        let printed = print_specification(&spec);
        let reparsed = parse_specification(&printed).unwrap();
        assert_eq!(spec, reparsed);
    }
}
