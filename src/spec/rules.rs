//! Rule blocks: `authorization`, `distribution`, `purge`.
//!
//! These top-level blocks are parsed into structured rule sets but are
//! never evaluated here — evaluation is a server-side concern outside
//! this crate's scope. Each block is independent and may appear in any
//! order, any number of times, in the source text; parsed rule sets from
//! multiple blocks of the same kind are concatenated in source order.

use crate::errors::{FactError, FactResult};
use crate::spec::ast::Specification;
use crate::spec::parser::parse_specification;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationRule {
    /// `any Type` — every fact of this type is readable.
    Any(String),
    /// `no Type` — no fact of this type is ever readable by this rule.
    No(String),
    /// An embedded specification whose single given's type is the
    /// guarded type.
    BySpecification(Specification),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DistributionTarget {
    Everyone,
    Specification(Specification),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRule {
    pub share: Specification,
    pub with: DistributionTarget,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    pub authorization: Vec<AuthorizationRule>,
    pub distribution: Vec<DistributionRule>,
    pub purge: Vec<Specification>,
}

/// Parse every `authorization`/`distribution`/`purge` block found in
/// `text`, in any order, concatenating same-kind blocks in source order.
pub fn parse_rule_blocks(text: &str) -> FactResult<RuleSet> {
    let mut rules = RuleSet::default();
    let mut cursor = 0usize;

    while let Some((keyword, start)) = next_block_keyword(text, cursor) {
        let (body, body_start, end) = extract_braced_block(text, start + keyword.len())?;
        match keyword {
            "authorization" => {
                for stmt in split_top_level_lines(&body) {
                    rules
                        .authorization
                        .push(parse_authorization_statement(&stmt, body_start)?);
                }
            }
            "distribution" => {
                for stmt in split_top_level_lines(&body) {
                    rules.distribution.push(parse_distribution_statement(&stmt)?);
                }
            }
            "purge" => {
                for stmt in split_top_level_lines(&body) {
                    rules.purge.push(parse_specification(&stmt)?);
                }
            }
            _ => unreachable!(),
        }
        cursor = end;
    }

    Ok(rules)
}

fn next_block_keyword(text: &str, from: usize) -> Option<(&'static str, usize)> {
    const KEYWORDS: [&str; 3] = ["authorization", "distribution", "purge"];
    let rest = &text[from..];
    let mut best: Option<(&'static str, usize)> = None;
    for kw in KEYWORDS {
        if let Some(pos) = find_word(rest, kw) {
            let abs = from + pos;
            if best.map(|(_, b)| abs < b).unwrap_or(true) {
                best = Some((kw, abs));
            }
        }
    }
    best
}

fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let wlen = word.len();
    let mut i = 0;
    while i + wlen <= bytes.len() {
        if &haystack[i..i + wlen] == word {
            let before_ok = i == 0 || !(bytes[i - 1] as char).is_ascii_alphanumeric();
            let after_ok = i + wlen == bytes.len() || !(bytes[i + wlen] as char).is_ascii_alphanumeric();
            if before_ok && after_ok {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Starting just after a block keyword, find the opening `{` and its
/// matching `}`. Returns `(inner_text, inner_start_offset, offset_after_close_brace)`.
fn extract_braced_block(text: &str, from: usize) -> FactResult<(String, usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() && (bytes[i] as char).is_whitespace() {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'{' {
        return Err(FactError::invalid_syntax("expected '{' after rule block keyword", i));
    }
    let open = i;
    let mut depth = 0i32;
    let mut j = open;
    loop {
        if j >= bytes.len() {
            return Err(FactError::invalid_syntax("unterminated rule block", open));
        }
        match bytes[j] as char {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        j += 1;
    }
    let inner = text[open + 1..j].to_string();
    Ok((inner, open + 1, j + 1))
}

/// Split on newlines only at bracket-nesting depth 0, so an embedded
/// specification's own `{ }`/`( )`/`[ ]` are never mistaken for a
/// statement boundary.
fn split_top_level_lines(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '{' | '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            '}' | ')' | ']' => {
                depth -= 1;
                current.push(c);
            }
            '\n' if depth == 0 => {
                let trimmed = current.trim().to_string();
                if !trimmed.is_empty() {
                    out.push(trimmed);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
    out
}

fn parse_authorization_statement(stmt: &str, _offset: usize) -> FactResult<AuthorizationRule> {
    if let Some(rest) = stmt.strip_prefix("any ") {
        return Ok(AuthorizationRule::Any(rest.trim().to_string()));
    }
    if let Some(rest) = stmt.strip_prefix("no ") {
        return Ok(AuthorizationRule::No(rest.trim().to_string()));
    }
    Ok(AuthorizationRule::BySpecification(parse_specification(stmt)?))
}

fn parse_distribution_statement(stmt: &str) -> FactResult<DistributionRule> {
    let rest = stmt
        .strip_prefix("share ")
        .ok_or_else(|| FactError::invalid_syntax("distribution rule must start with 'share'", 0))?;

    let (spec_text, target_text) = split_at_top_level_with(rest)
        .ok_or_else(|| FactError::invalid_syntax("distribution rule missing 'with'", 0))?;

    let share = parse_specification(spec_text.trim())?;
    let target_text = target_text.trim();
    let with = if target_text == "everyone" {
        DistributionTarget::Everyone
    } else {
        DistributionTarget::Specification(parse_specification(target_text)?)
    };
    Ok(DistributionRule { share, with })
}

fn split_at_top_level_with(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] as char {
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            _ => {}
        }
        if depth == 0 && s[i..].starts_with(" with ") {
            return Some((&s[..i], &s[i + " with ".len()..]));
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authorization_block() {
        let text = "authorization {\nany MyApp.Root\nno MyApp.Secret\n}";
        let rules = parse_rule_blocks(text).unwrap();
        assert_eq!(rules.authorization.len(), 2);
        assert_eq!(rules.authorization[0], AuthorizationRule::Any("MyApp.Root".to_string()));
        assert_eq!(rules.authorization[1], AuthorizationRule::No("MyApp.Secret".to_string()));
    }

    #[test]
    fn parses_authorization_block_with_embedded_specification() {
        let text = "authorization {\n(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1\n}";
        let rules = parse_rule_blocks(text).unwrap();
        assert_eq!(rules.authorization.len(), 1);
        assert!(matches!(rules.authorization[0], AuthorizationRule::BySpecification(_)));
    }

    #[test]
    fn parses_distribution_block_with_everyone() {
        let text = "distribution {\nshare (p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1 with everyone\n}";
        let rules = parse_rule_blocks(text).unwrap();
        assert_eq!(rules.distribution.len(), 1);
        assert_eq!(rules.distribution[0].with, DistributionTarget::Everyone);
    }

    #[test]
    fn parses_purge_block() {
        let text = "purge {\n(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1\n}";
        let rules = parse_rule_blocks(text).unwrap();
        assert_eq!(rules.purge.len(), 1);
    }

    #[test]
    fn parses_multiple_blocks_in_any_order() {
        let text = "purge {\n(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1\n}\nauthorization {\nany MyApp.Root\n}";
        let rules = parse_rule_blocks(text).unwrap();
        assert_eq!(rules.purge.len(), 1);
        assert_eq!(rules.authorization.len(), 1);
    }
}
