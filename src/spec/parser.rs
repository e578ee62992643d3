//! The descriptive-string parser.
//!
//! A hand-written lexer plus a recursive-descent parser over the core
//! grammar:
//!
//! ```text
//! spec        := given matches projection?
//! given       := "(" label ("," label)* ")"
//! label       := ident ":" type ( "[" condition+ "]" )?
//! matches     := "{" match* "}"
//! match       := label "[" condition+ "]"
//! condition   := path | "E" matches | "!" "E" matches
//! path        := ident roles "=" ident roles
//! roles       := ( "->" ident ":" type )*
//! projection  := "=>" ( component | "{" component* "}" )
//! component   := ident "=" ( matches projection | "#" ident | ident ( "." ident )? )
//! ```
//!
//! The grammar's `component` production always carries a leading `ident
//! "="`, but a *singular* projection (`=> u1`) has no name to bind. We
//! parse the shared `matches projection | "#" ident | ident ("."
//! ident)?` alternative as `ProjectionShape` on its own, reusing it both
//! bare (singular) and named (one composite component).
//!
//! Structural validation rules 1-7 run after a full AST is parsed: rules
//! enforceable locally (match non-emptiness, leading path condition) are
//! checked inline during parsing; the remainder (label uniqueness,
//! right-hand scope resolution, role type-chain termination,
//! connectivity) run as a post-pass over the completed AST, since they
//! require information — the full label table — that is not available
//! until parsing finishes.

use std::collections::BTreeMap;

use crate::config::LimitsConfig;
use crate::errors::{FactError, FactResult};
use crate::spec::ast::{
    is_path_condition, Condition, ExistentialCondition, Given, Label, Match, NestedSpecification,
    PathCondition, Projection, ProjectionShape, RoleStep, Specification,
};
use crate::spec::connectivity::validate_connectivity;

/// Parse `text` under the default resource limits (`LimitsConfig::default`).
pub fn parse_specification(text: &str) -> FactResult<Specification> {
    parse_specification_with_limits(text, &LimitsConfig::default())
}

/// Parse `text`, rejecting input that exceeds `limits`: source size,
/// existential nesting depth, and nested-projection depth are all
/// recursion/size guards against pathological input rather than
/// semantic rules, so they're configurable instead of hardcoded.
pub fn parse_specification_with_limits(text: &str, limits: &LimitsConfig) -> FactResult<Specification> {
    tracing::trace!(bytes = text.len(), "parsing descriptive-string specification");
    if text.len() > limits.max_parse_bytes {
        return Err(FactError::invalid_syntax(
            format!(
                "descriptive-string source is {} bytes, exceeding the configured limit of {}",
                text.len(),
                limits.max_parse_bytes
            ),
            0,
        ));
    }
    let tokens = lex(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        len: text.len(),
        max_existential_depth: limits.max_existential_depth,
        max_projection_depth: limits.max_projection_depth,
        existential_depth: 0,
        projection_depth: 0,
    };
    let spec = parser.parse_spec()?;
    parser.expect_eof()?;
    validate_specification(&spec)?;
    tracing::trace!(
        given = spec.given.len(),
        matches = spec.matches.len(),
        "parsed and validated specification"
    );
    Ok(spec)
}

// ---------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Equals,
    Arrow,
    FatArrow,
    Bang,
    Hash,
    Dot,
    Ident(String),
}

fn lex(text: &str) -> FactResult<Vec<(Tok, usize)>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        match c {
            '(' => {
                out.push((Tok::LParen, start));
                i += 1;
            }
            ')' => {
                out.push((Tok::RParen, start));
                i += 1;
            }
            '{' => {
                out.push((Tok::LBrace, start));
                i += 1;
            }
            '}' => {
                out.push((Tok::RBrace, start));
                i += 1;
            }
            '[' => {
                out.push((Tok::LBracket, start));
                i += 1;
            }
            ']' => {
                out.push((Tok::RBracket, start));
                i += 1;
            }
            ',' => {
                out.push((Tok::Comma, start));
                i += 1;
            }
            ':' => {
                out.push((Tok::Colon, start));
                i += 1;
            }
            '!' => {
                out.push((Tok::Bang, start));
                i += 1;
            }
            '#' => {
                out.push((Tok::Hash, start));
                i += 1;
            }
            '.' => {
                out.push((Tok::Dot, start));
                i += 1;
            }
            '-' if bytes.get(i + 1) == Some(&b'>') => {
                out.push((Tok::Arrow, start));
                i += 2;
            }
            '=' if bytes.get(i + 1) == Some(&b'>') => {
                out.push((Tok::FatArrow, start));
                i += 2;
            }
            '=' => {
                out.push((Tok::Equals, start));
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut j = i + 1;
                while j < bytes.len() {
                    let cj = bytes[j] as char;
                    if cj.is_ascii_alphanumeric() || cj == '_' {
                        j += 1;
                    } else {
                        break;
                    }
                }
                out.push((Tok::Ident(text[i..j].to_string()), start));
                i = j;
            }
            other => {
                return Err(FactError::invalid_syntax(
                    format!("unexpected character '{other}'"),
                    start,
                ));
            }
        }
    }

    Ok(out)
}

// ---------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------

struct Parser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
    len: usize,
    max_existential_depth: usize,
    max_projection_depth: usize,
    existential_depth: usize,
    projection_depth: usize,
}

impl Parser {
    fn current_offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, o)| *o).unwrap_or(self.len)
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, delta: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + delta).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, tok: &Tok) -> bool {
        self.peek() == Some(tok)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.at(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Tok) -> FactResult<()> {
        let offset = self.current_offset();
        if self.eat(&tok) {
            Ok(())
        } else {
            Err(FactError::invalid_syntax(
                format!("expected {tok:?}, found {:?}", self.peek()),
                offset,
            ))
        }
    }

    fn expect_eof(&mut self) -> FactResult<()> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(FactError::invalid_syntax(
                "unexpected trailing input",
                self.current_offset(),
            ))
        }
    }

    fn expect_ident(&mut self) -> FactResult<String> {
        let offset = self.current_offset();
        match self.advance() {
            Some(Tok::Ident(name)) => Ok(name),
            other => Err(FactError::invalid_syntax(
                format!("expected identifier, found {other:?}"),
                offset,
            )),
        }
    }

    fn at_keyword_e(&self) -> bool {
        matches!(self.peek(), Some(Tok::Ident(s)) if s == "E")
    }

    /// `type := ident ("." ident)*`, joined back into one dotted string.
    fn parse_type(&mut self) -> FactResult<String> {
        let mut s = self.expect_ident()?;
        while self.at(&Tok::Dot) {
            self.advance();
            let next = self.expect_ident()?;
            s.push('.');
            s.push_str(&next);
        }
        Ok(s)
    }

    fn parse_label_core(&mut self) -> FactResult<Label> {
        let name = self.expect_ident()?;
        self.expect(Tok::Colon)?;
        let fact_type = self.parse_type()?;
        Ok(Label::new(name, fact_type))
    }

    fn parse_spec(&mut self) -> FactResult<Specification> {
        let given = self.parse_given()?;
        let matches = self.parse_top_level_matches()?;
        let projection = if self.at(&Tok::FatArrow) {
            self.parse_projection()?
        } else {
            Projection::Composite(vec![])
        };
        Ok(Specification { given, matches, projection })
    }

    fn parse_given(&mut self) -> FactResult<Vec<Given>> {
        let open_offset = self.current_offset();
        self.expect(Tok::LParen)?;
        let mut givens = Vec::new();
        if !self.at(&Tok::RParen) {
            loop {
                givens.push(self.parse_given_label()?);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
        }
        self.expect(Tok::RParen)?;
        if givens.is_empty() {
            return Err(FactError::invalid_syntax(
                "specification must declare at least one given",
                open_offset,
            ));
        }
        Ok(givens)
    }

    fn parse_given_label(&mut self) -> FactResult<Given> {
        let label = self.parse_label_core()?;
        let mut conditions = Vec::new();
        if self.eat(&Tok::LBracket) {
            while !self.at(&Tok::RBracket) {
                let offset = self.current_offset();
                let condition = self.parse_condition(&label.name)?;
                if !crate::spec::ast::is_existential_condition(&condition) {
                    return Err(FactError::invalid_syntax(
                        "a given's own conditions must be existential",
                        offset,
                    ));
                }
                conditions.push(condition);
            }
            self.expect(Tok::RBracket)?;
        }
        Ok(Given { label, conditions })
    }

    fn parse_matches(&mut self) -> FactResult<Vec<Match>> {
        self.expect(Tok::LBrace)?;
        let mut matches = Vec::new();
        while !self.at(&Tok::RBrace) {
            matches.push(self.parse_match()?);
        }
        self.expect(Tok::RBrace)?;
        Ok(matches)
    }

    /// Like `parse_matches`, but for the specification's own top-level
    /// match list, which must declare at least one match. Nested match
    /// lists (existential conditions, projection sub-specifications)
    /// are unrestricted — an existential with no matches or a nested
    /// projection pulling in nothing is a degenerate but structurally
    /// valid query, not the case this rule names.
    fn parse_top_level_matches(&mut self) -> FactResult<Vec<Match>> {
        let matches = self.parse_matches()?;
        if matches.is_empty() {
            return Err(FactError::invalid_specification(
                "specification must declare at least one top-level match",
            ));
        }
        Ok(matches)
    }

    fn parse_match(&mut self) -> FactResult<Match> {
        let offset = self.current_offset();
        let unknown = self.parse_label_core()?;
        self.expect(Tok::LBracket)?;
        let mut conditions = Vec::new();
        while !self.at(&Tok::RBracket) {
            conditions.push(self.parse_condition(&unknown.name)?);
        }
        self.expect(Tok::RBracket)?;

        if conditions.is_empty() {
            return Err(FactError::invalid_syntax(
                "a match must have at least one condition",
                offset,
            ));
        }
        if !is_path_condition(&conditions[0]) {
            return Err(FactError::invalid_syntax(
                "a match's first condition must be a path condition",
                offset,
            ));
        }
        Ok(Match { unknown, conditions })
    }

    fn parse_condition(&mut self, expected_left: &str) -> FactResult<Condition> {
        if self.at(&Tok::Bang) {
            self.advance();
            if !self.at_keyword_e() {
                return Err(FactError::invalid_syntax(
                    "expected 'E' after '!'",
                    self.current_offset(),
                ));
            }
            self.advance();
            let matches = self.parse_nested_existential_matches()?;
            return Ok(Condition::Existential(ExistentialCondition { exists: false, matches }));
        }

        if self.at_keyword_e() && matches!(self.peek_at(1), Some(Tok::LBrace)) {
            self.advance();
            let matches = self.parse_nested_existential_matches()?;
            return Ok(Condition::Existential(ExistentialCondition { exists: true, matches }));
        }

        let path = self.parse_path(expected_left)?;
        Ok(Condition::Path(path))
    }

    /// Parse one existential condition's nested match list, enforcing
    /// `max_existential_depth` around the recursive descent (existential
    /// conditions can themselves contain existential conditions).
    fn parse_nested_existential_matches(&mut self) -> FactResult<Vec<Match>> {
        let offset = self.current_offset();
        if self.existential_depth >= self.max_existential_depth {
            return Err(FactError::invalid_syntax(
                format!(
                    "existential nesting depth exceeds the configured limit of {}",
                    self.max_existential_depth
                ),
                offset,
            ));
        }
        self.existential_depth += 1;
        let matches = self.parse_matches();
        self.existential_depth -= 1;
        matches
    }

    fn parse_path(&mut self, expected_left: &str) -> FactResult<PathCondition> {
        let offset = self.current_offset();
        let left_ident = self.expect_ident()?;
        if left_ident != expected_left {
            return Err(FactError::invalid_syntax(
                format!(
                    "path's left identifier '{left_ident}' must equal the enclosing match's unknown '{expected_left}'"
                ),
                offset,
            ));
        }
        let roles_left = self.parse_roles()?;
        self.expect(Tok::Equals)?;
        let label_right = self.expect_ident()?;
        let roles_right = self.parse_roles()?;
        Ok(PathCondition { roles_left, label_right, roles_right })
    }

    fn parse_roles(&mut self) -> FactResult<Vec<RoleStep>> {
        let mut roles = Vec::new();
        while self.eat(&Tok::Arrow) {
            let role = self.expect_ident()?;
            self.expect(Tok::Colon)?;
            let fact_type = self.parse_type()?;
            roles.push(RoleStep::new(role, fact_type));
        }
        Ok(roles)
    }

    fn parse_projection(&mut self) -> FactResult<Projection> {
        self.expect(Tok::FatArrow)?;
        if self.eat(&Tok::LBrace) {
            let mut components = Vec::new();
            while !self.at(&Tok::RBrace) {
                let name = self.expect_ident()?;
                self.expect(Tok::Equals)?;
                let shape = self.parse_projection_shape()?;
                components.push((name, shape));
                self.eat(&Tok::Comma);
            }
            self.expect(Tok::RBrace)?;
            Ok(Projection::Composite(components))
        } else {
            Ok(Projection::Singular(self.parse_projection_shape()?))
        }
    }

    fn parse_projection_shape(&mut self) -> FactResult<ProjectionShape> {
        if self.at(&Tok::LBrace) {
            let (matches, projection) = self.parse_nested_projection_body()?;
            return Ok(ProjectionShape::Nested(Box::new(NestedSpecification {
                matches,
                projection,
            })));
        }
        if self.eat(&Tok::Hash) {
            let label = self.expect_ident()?;
            return Ok(ProjectionShape::Hash(label));
        }
        let label = self.expect_ident()?;
        if self.eat(&Tok::Dot) {
            let field = self.expect_ident()?;
            Ok(ProjectionShape::Field(label, field))
        } else {
            Ok(ProjectionShape::Fact(label))
        }
    }

    /// Parse a nested projection's match list and inner projection,
    /// enforcing `max_projection_depth` around the recursive descent
    /// (a nested projection's own shapes may themselves be nested).
    fn parse_nested_projection_body(&mut self) -> FactResult<(Vec<Match>, Projection)> {
        let offset = self.current_offset();
        if self.projection_depth >= self.max_projection_depth {
            return Err(FactError::invalid_syntax(
                format!(
                    "nested projection depth exceeds the configured limit of {}",
                    self.max_projection_depth
                ),
                offset,
            ));
        }
        self.projection_depth += 1;
        let result = (|| {
            let matches = self.parse_matches()?;
            let projection = self.parse_projection()?;
            Ok((matches, projection))
        })();
        self.projection_depth -= 1;
        result
    }
}

// ---------------------------------------------------------------------
// Post-parse structural validation (rules 1, 5, 3, 6, 7)
// ---------------------------------------------------------------------

fn validate_specification(spec: &Specification) -> FactResult<()> {
    let mut given_names = std::collections::BTreeSet::new();
    for g in &spec.given {
        if !given_names.insert(g.label.name.clone()) {
            return Err(FactError::invalid_specification_at(
                "duplicate given name",
                g.label.name.clone(),
            ));
        }
    }

    let mut all_names = std::collections::BTreeSet::new();
    for name in &given_names {
        all_names.insert(name.clone());
    }
    check_unique_labels_in_matches(&spec.matches, &mut all_names)?;

    let types = collect_label_types(spec);

    let mut scope: Vec<String> = spec.given.iter().map(|g| g.label.name.clone()).collect();
    check_scope_and_types(&spec.matches, &mut scope, &types)?;

    validate_connectivity(spec)?;
    Ok(())
}

fn check_unique_labels_in_matches(
    matches: &[Match],
    seen: &mut std::collections::BTreeSet<String>,
) -> FactResult<()> {
    for m in matches {
        if !seen.insert(m.unknown.name.clone()) {
            return Err(FactError::invalid_specification_at(
                "duplicate label name",
                m.unknown.name.clone(),
            ));
        }
        for c in &m.conditions {
            if let Condition::Existential(e) = c {
                check_unique_labels_in_matches(&e.matches, seen)?;
            }
        }
    }
    Ok(())
}

fn collect_label_types(spec: &Specification) -> BTreeMap<String, String> {
    let mut types = BTreeMap::new();
    for g in &spec.given {
        types.insert(g.label.name.clone(), g.label.fact_type.clone());
    }
    collect_match_types(&spec.matches, &mut types);
    types
}

fn collect_match_types(matches: &[Match], types: &mut BTreeMap<String, String>) {
    for m in matches {
        types.insert(m.unknown.name.clone(), m.unknown.fact_type.clone());
        for c in &m.conditions {
            if let Condition::Existential(e) = c {
                collect_match_types(&e.matches, types);
            }
        }
    }
}

/// Rule 3 (right identifier already in scope) and rule 6 (role
/// type-chain termination) for every path condition, at every nesting
/// depth. `scope` grows as sibling matches are processed and is cloned
/// (not shared) across an existential's nested matches, so labels
/// declared inside one existential branch are not visible to another.
fn check_scope_and_types(
    matches: &[Match],
    scope: &mut Vec<String>,
    types: &BTreeMap<String, String>,
) -> FactResult<()> {
    for m in matches {
        for c in &m.conditions {
            if let Condition::Path(path) = c {
                if !scope.contains(&path.label_right) {
                    return Err(FactError::invalid_specification_at(
                        format!(
                            "label '{}' is not in scope at this point in the specification",
                            path.label_right
                        ),
                        path.label_right.clone(),
                    ));
                }
                check_role_type_chain(path, &m.unknown.fact_type, types)?;
            }
        }
        scope.push(m.unknown.name.clone());
        for c in &m.conditions {
            if let Condition::Existential(e) = c {
                let mut nested_scope = scope.clone();
                check_scope_and_types(&e.matches, &mut nested_scope, types)?;
            }
        }
    }
    Ok(())
}

fn check_role_type_chain(
    path: &PathCondition,
    unknown_type: &str,
    types: &BTreeMap<String, String>,
) -> FactResult<()> {
    let left_terminal = path
        .roles_left
        .last()
        .map(|r| r.fact_type.as_str())
        .unwrap_or(unknown_type);

    let right_base = types
        .get(&path.label_right)
        .map(|s| s.as_str())
        .unwrap_or("");
    let right_terminal = path
        .roles_right
        .last()
        .map(|r| r.fact_type.as_str())
        .unwrap_or(right_base);

    if left_terminal != right_terminal {
        return Err(FactError::invalid_specification_at(
            format!(
                "path's role type chain does not terminate at the same type on both sides ('{left_terminal}' vs '{right_terminal}')"
            ),
            path.label_right.clone(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ast::ProjectionShape;

    #[test]
    fn parses_simple_successor_query() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1";
        let spec = parse_specification(text).unwrap();
        assert_eq!(spec.given.len(), 1);
        assert_eq!(spec.matches.len(), 1);
        assert!(matches!(
            spec.projection,
            Projection::Singular(ProjectionShape::Fact(ref l)) if l == "u1"
        ));
    }

    #[test]
    fn parses_negative_existential() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 !E { u2: Office.Closed [ u2->office:Office = u1 ] } ] } => u1";
        let spec = parse_specification(text).unwrap();
        assert_eq!(spec.matches[0].conditions.len(), 2);
        match &spec.matches[0].conditions[1] {
            Condition::Existential(e) => {
                assert!(!e.exists);
                assert_eq!(e.matches.len(), 1);
            }
            _ => panic!("expected existential condition"),
        }
    }

    #[test]
    fn parses_positive_existential() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 E { u2: Office.Closed [ u2->office:Office = u1 ] } ] } => u1";
        let spec = parse_specification(text).unwrap();
        match &spec.matches[0].conditions[1] {
            Condition::Existential(e) => assert!(e.exists),
            _ => panic!("expected existential condition"),
        }
    }

    #[test]
    fn parses_composite_projection_with_field_and_hash() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => { name = u1.identifier, digest = #u1, full = u1 }";
        let spec = parse_specification(text).unwrap();
        match &spec.projection {
            Projection::Composite(components) => {
                assert_eq!(components.len(), 3);
                assert!(matches!(&components[0].1, ProjectionShape::Field(l, f) if l == "u1" && f == "identifier"));
                assert!(matches!(&components[1].1, ProjectionShape::Hash(l) if l == "u1"));
                assert!(matches!(&components[2].1, ProjectionShape::Fact(l) if l == "u1"));
            }
            _ => panic!("expected composite projection"),
        }
    }

    #[test]
    fn empty_match_list_with_no_connection_is_rejected() {
        // (a: A, b: B) { } => a -- two givens, no matches. Empty top-level
        // match lists are rejected before connectivity is even checked.
        let text = "(a: A, b: B) { } => a";
        let err = parse_specification(text).unwrap_err();
        assert!(matches!(err, FactError::InvalidSpecification { .. }));
    }

    #[test]
    fn empty_top_level_match_list_is_rejected_even_with_a_single_given() {
        // A single given has no disconnection to trip on, so this
        // exercises the empty-match-list rule on its own.
        let text = "(r: MyApp.Root) { } => r";
        let err = parse_specification(text).unwrap_err();
        assert!(matches!(err, FactError::InvalidSpecification { .. }));
    }

    #[test]
    fn no_givens_is_rejected() {
        let text = "() { } => a";
        let err = parse_specification(text).unwrap_err();
        assert!(matches!(err, FactError::InvalidSyntax { .. }));
    }

    #[test]
    fn match_requiring_leading_path_condition_rejects_leading_existential() {
        let text = "(p1: Company) { u1: Office [ E { u2: Office.Closed [ u2->office:Office = u1 ] } ] } => u1";
        let err = parse_specification(text).unwrap_err();
        assert!(matches!(err, FactError::InvalidSyntax { .. }));
    }

    #[test]
    fn undeclared_right_hand_label_is_rejected() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = ghost ] } => u1";
        let err = parse_specification(text).unwrap_err();
        assert!(matches!(err, FactError::InvalidSpecification { .. }));
    }

    #[test]
    fn mismatched_role_type_chain_is_rejected() {
        // u1 is Office but its path chain claims to terminate at Department,
        // while p1's side terminates at Company.
        let text = "(p1: Company) { u1: Office [ u1->company:Department = p1 ] } => u1";
        let err = parse_specification(text).unwrap_err();
        assert!(matches!(err, FactError::InvalidSpecification { .. }));
    }

    #[test]
    fn oversized_source_is_rejected_by_max_parse_bytes() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1";
        let limits = crate::config::LimitsConfig { max_parse_bytes: 4, ..Default::default() };
        let err = parse_specification_with_limits(text, &limits).unwrap_err();
        assert!(matches!(err, FactError::InvalidSyntax { .. }));
    }

    #[test]
    fn existential_nesting_past_the_configured_limit_is_rejected() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 E { u2: A [ u2->x:Company = u1 E { u3: B [ u3->y:Office = u2 ] } ] } ] } => u1";
        let limits = crate::config::LimitsConfig { max_existential_depth: 1, ..Default::default() };
        let err = parse_specification_with_limits(text, &limits).unwrap_err();
        assert!(matches!(err, FactError::InvalidSyntax { .. }));
    }

    #[test]
    fn nested_projection_past_the_configured_limit_is_rejected() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => { a = { v1: Office [ v1->company:Company = p1 ] } => { b = { v2: Office [ v2->company:Company = p1 ] } => v2 } }";
        let limits = crate::config::LimitsConfig { max_projection_depth: 1, ..Default::default() };
        let err = parse_specification_with_limits(text, &limits).unwrap_err();
        assert!(matches!(err, FactError::InvalidSyntax { .. }));
    }

    #[test]
    fn parser_then_printer_then_parser_round_trips() {
        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1";
        let spec = parse_specification(text).unwrap();
        let printed = crate::spec::printer::print_specification(&spec);
        let reparsed = parse_specification(&printed).unwrap();
        assert_eq!(spec, reparsed);
    }
}
