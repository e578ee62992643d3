//! The feed decomposer and cache.
//!
//! A specification describes a full query, but a long-lived subscriber
//! needs to know which *individual new facts* would extend or retract
//! its result set. A feed is one such sub-specification: an anchor
//! ("start", one of the facts bound further up the chain) plus the
//! prefix of matches a newly-arriving fact of the anchor's type would
//! need to satisfy to produce a new row. Decomposing a specification
//! into its feeds is what lets a storage layer turn "run this query" into
//! "watch these narrow triggers."
//!
//! Feeds are deduplicated and cached by a hash of `(start, skeleton)` —
//! two specifications that reduce to the same skeleton from the same
//! anchor need exactly one feed between them, regardless of label
//! spelling (see `crate::spec::skeleton`).

use std::collections::BTreeMap;

use crate::errors::{FactError, FactResult};
use crate::model::fact::FactReference;
use crate::spec::ast::{is_deterministic, Projection, ProjectionShape, Specification};
use crate::spec::skeleton::{build_skeleton, canonical_string};

use crate::determinism::hashing::{encode_reference, hash_bytes_base64};

/// One feed: the concrete fact each given is bound to when this feed was
/// decomposed, plus the sub-specification a storage layer runs from
/// those facts to detect newly-relevant rows. `start` binds each
/// skeleton input to a concrete fact reference, in given order — it is
/// not an ordinal, so two feeds anchored at two different concrete facts
/// never collide even when their sub-specifications are structurally
/// identical.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub start: Vec<FactReference>,
    pub spec: Specification,
}

/// Decompose `spec` into its feeds: one feed per
/// non-deterministic prefix of the top-level matches, plus feeds for
/// matches nested inside existential conditions and inside nested
/// specifications carried by composite projection components.
///
/// `start` binds each of `spec.given`, in order, to the concrete fact it
/// resolves to at decomposition time; every feed produced (including
/// nested ones) carries this same binding, since all of them run from
/// the same anchor facts.
///
/// Deterministic prefixes (`crate::spec::ast::is_deterministic`) are
/// dropped — a prefix that can never yield more than the one
/// already-known row needs no incremental trigger.
pub fn decompose_feeds(spec: &Specification, start: &[FactReference]) -> FactResult<Vec<Feed>> {
    if start.len() != spec.given.len() {
        return Err(FactError::internal(format!(
            "feed decomposition given {} starting references for a specification with {} givens",
            start.len(),
            spec.given.len()
        )));
    }

    let mut feeds = Vec::new();

    for end in 1..=spec.matches.len() {
        let candidate = Specification {
            given: spec.given.clone(),
            matches: spec.matches[..end].to_vec(),
            projection: Projection::Singular(ProjectionShape::Fact(
                spec.matches[end - 1].unknown.name.clone(),
            )),
        };
        if is_deterministic(&candidate) {
            continue;
        }
        feeds.push(Feed { start: start.to_vec(), spec: candidate });
    }

    for m in &spec.matches {
        for c in &m.conditions {
            if let crate::spec::ast::Condition::Existential(e) = c {
                let nested_spec = Specification {
                    given: spec.given.clone(),
                    matches: e.matches.clone(),
                    projection: Projection::Singular(ProjectionShape::Fact(
                        e.matches
                            .last()
                            .map(|m| m.unknown.name.clone())
                            .unwrap_or_default(),
                    )),
                };
                feeds.extend(decompose_feeds(&nested_spec, start)?);
            }
        }
    }

    feeds.extend(decompose_projection_feeds(&spec.projection, spec, start)?);

    Ok(feeds)
}

/// Feeds contributed by nested specifications inside a composite
/// projection: each nested specification's matches are decomposed the
/// same way, anchored at whichever outer given(s) the enclosing
/// specification already carries.
fn decompose_projection_feeds(
    projection: &Projection,
    outer: &Specification,
    start: &[FactReference],
) -> FactResult<Vec<Feed>> {
    let mut feeds = Vec::new();
    let shapes: Vec<&ProjectionShape> = match projection {
        Projection::Singular(shape) => vec![shape],
        Projection::Composite(components) => components.iter().map(|(_, s)| s).collect(),
    };

    for shape in shapes {
        if let ProjectionShape::Nested(nested) = shape {
            let nested_spec = Specification {
                given: outer.given.clone(),
                matches: nested.matches.clone(),
                projection: nested.projection.clone(),
            };
            feeds.extend(decompose_feeds(&nested_spec, start)?);
        }
    }

    Ok(feeds)
}

/// Hash a feed's `(start, skeleton)` pair to its cache key, encoding both
/// through the same canonical string form `determinism::hashing` uses
/// for fact hashing rather than `Debug`'s unspecified formatting — two
/// feeds with the same concrete bindings and the same skeleton always
/// land on the same hash, and no two feeds with different bindings
/// collide.
pub fn feed_hash(feed: &Feed) -> FactResult<String> {
    let skeleton = build_skeleton(&feed.spec)?;
    let mut canonical = String::new();
    canonical.push_str("{\"start\":[");
    for (i, r) in feed.start.iter().enumerate() {
        if i > 0 {
            canonical.push(',');
        }
        encode_reference(r, &mut canonical);
    }
    canonical.push_str("],\"skeleton\":");
    canonical.push_str(&canonical_string(&skeleton));
    canonical.push('}');
    Ok(hash_bytes_base64(canonical.as_bytes()))
}

/// A monotone, append-only cache from feed hash to feed. Entries are
/// never overwritten or removed: once a feed hash has been registered,
/// its definition is fixed for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct FeedCache {
    entries: BTreeMap<String, Feed>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompose `spec` anchored at `start` and register every feed not
    /// already present. Returns the hashes of all feeds belonging to
    /// `spec`, whether newly inserted or previously cached, in
    /// decomposition order.
    pub fn register(&mut self, spec: &Specification, start: &[FactReference]) -> FactResult<Vec<String>> {
        let feeds = decompose_feeds(spec, start)?;
        let mut hashes = Vec::with_capacity(feeds.len());
        for feed in feeds {
            let hash = feed_hash(&feed)?;
            if !self.entries.contains_key(&hash) {
                tracing::debug!(feed_hash = %hash, starts = feed.start.len(), "registering new feed");
                self.entries.insert(hash.clone(), feed);
            }
            hashes.push(hash);
        }
        Ok(hashes)
    }

    pub fn get(&self, hash: &str) -> Option<&Feed> {
        self.entries.get(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::parser::parse_specification;

    fn company_start() -> Vec<FactReference> {
        vec![FactReference::new("Company", "C")]
    }

    #[test]
    fn simple_query_yields_one_feed() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1",
        )
        .unwrap();
        let start = company_start();
        let feeds = decompose_feeds(&spec, &start).unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].start, start);
    }

    #[test]
    fn mismatched_start_length_is_rejected() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1",
        )
        .unwrap();
        let err = decompose_feeds(&spec, &[]).unwrap_err();
        assert!(matches!(err, FactError::Internal { .. }));
    }

    #[test]
    fn negative_existential_contributes_additional_feed() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 !E { u2: Office.Closed [ u2->office:Office = u1 ] } ] } => u1",
        )
        .unwrap();
        let feeds = decompose_feeds(&spec, &company_start()).unwrap();
        assert_eq!(feeds.len(), 2);
    }

    #[test]
    fn two_distinct_anchors_yield_distinct_feed_hashes() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1",
        )
        .unwrap();
        let feed_a = &decompose_feeds(&spec, &[FactReference::new("Company", "C1")]).unwrap()[0];
        let feed_b = &decompose_feeds(&spec, &[FactReference::new("Company", "C2")]).unwrap()[0];
        assert_ne!(feed_hash(feed_a).unwrap(), feed_hash(feed_b).unwrap());
    }

    #[test]
    fn feed_cache_is_idempotent_and_append_only() {
        let spec = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1",
        )
        .unwrap();
        let start = company_start();
        let mut cache = FeedCache::new();
        let first = cache.register(&spec, &start).unwrap();
        let count_after_first = cache.len();
        let second = cache.register(&spec, &start).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), count_after_first);
    }

    #[test]
    fn feed_hash_is_stable_across_alpha_renaming() {
        let a = parse_specification(
            "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1",
        )
        .unwrap();
        let mut mapping = std::collections::BTreeMap::new();
        mapping.insert("p1".to_string(), "company1".to_string());
        mapping.insert("u1".to_string(), "office1".to_string());
        let b = crate::spec::rename::rename(&a, &mapping).unwrap();

        let start = company_start();
        let fa = &decompose_feeds(&a, &start).unwrap()[0];
        let fb = &decompose_feeds(&b, &start).unwrap()[0];
        assert_eq!(feed_hash(fa).unwrap(), feed_hash(fb).unwrap());
    }
}
