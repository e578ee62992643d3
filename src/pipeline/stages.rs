//! Built-in pipeline stages: the generic "text in, runnable artifact
//! out" steps shared by every producer that embeds this crate.
//!
//! Included stages:
//! - `ParseSpecificationStage` — descriptive string -> `Specification`
//!   (parsing already runs structural validation rules 1, 3, 5, 6, 7;
//!   see `crate::spec::parser`)
//! - `ParseRuleBlocksStage` — descriptive string -> `RuleSet`
//! - `BuildSkeletonStage` — `Specification` -> `Skeleton`
//! - `RegisterFeedsStage` — `Specification` -> the feed hashes newly
//!   registered or already cached for it
//!
//! Plugin-specific or I/O-performing stages (storage reads/writes,
//! network transports) live outside this crate.

use std::sync::Mutex;

use crate::errors::{FactError, FactResult};
use crate::model::fact::FactReference;
use crate::pipeline::{PipelineContext, PipelineData, Stage};
use crate::runtime::feed::FeedCache;
use crate::spec::ast::Specification;
use crate::spec::parser::parse_specification;
use crate::spec::rules::parse_rule_blocks;
use crate::spec::skeleton::build_skeleton;

/// Read each given's concrete anchor fact from `ctx.params`, keyed
/// `"given.{name}" -> "{type}:{hash}"`. A caller that wants
/// `RegisterFeedsStage` to decompose feeds for a specification must set
/// one param per given before running the pipeline.
fn start_from_context(ctx: &PipelineContext, spec: &Specification) -> FactResult<Vec<FactReference>> {
    spec.given
        .iter()
        .map(|g| {
            let key = format!("given.{}", g.label.name);
            let value = ctx.get_param(&key).ok_or_else(|| {
                FactError::internal(format!("missing pipeline param \"{key}\" for given \"{}\"", g.label.name))
            })?;
            let (fact_type, hash) = value.split_once(':').ok_or_else(|| {
                FactError::internal(format!("pipeline param \"{key}\" must be \"type:hash\", got \"{value}\""))
            })?;
            Ok(FactReference::new(fact_type, hash))
        })
        .collect()
}

pub struct ParseSpecificationStage {
    id: String,
}

impl ParseSpecificationStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for ParseSpecificationStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> FactResult<PipelineData> {
        match input {
            PipelineData::Text(text) => {
                let spec = parse_specification(&text)?;
                ctx.push_info("parse.succeeded", format!("parsed {} given(s)", spec.given.len()));
                Ok(PipelineData::Specification(spec))
            }
            other => Err(FactError::internal(format!(
                "expected PipelineData::Text, got {other:?}"
            ))),
        }
    }
}

pub struct ParseRuleBlocksStage {
    id: String,
}

impl ParseRuleBlocksStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for ParseRuleBlocksStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> FactResult<PipelineData> {
        match input {
            PipelineData::Text(text) => {
                let rules = parse_rule_blocks(&text)?;
                ctx.push_info(
                    "rules.parsed",
                    format!(
                        "{} authorization, {} distribution rule(s)",
                        rules.authorization.len(),
                        rules.distribution.len()
                    ),
                );
                Ok(PipelineData::RuleSet(rules))
            }
            other => Err(FactError::internal(format!(
                "expected PipelineData::Text, got {other:?}"
            ))),
        }
    }
}

pub struct BuildSkeletonStage {
    id: String,
}

impl BuildSkeletonStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Stage for BuildSkeletonStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> FactResult<PipelineData> {
        match input {
            PipelineData::Specification(spec) => {
                let skeleton = build_skeleton(&spec)?;
                ctx.push_info(
                    "skeleton.built",
                    format!("{} fact(s), {} top-level edge(s)", skeleton.facts.len(), skeleton.edges.len()),
                );
                Ok(PipelineData::Skeleton(skeleton))
            }
            other => Err(FactError::internal(format!(
                "expected PipelineData::Specification, got {other:?}"
            ))),
        }
    }
}

/// Decomposes a specification into feeds and registers them in an
/// internally owned, monotone `FeedCache`. The cache's contents persist
/// across `run` calls on the same stage instance — `Stage::run` takes
/// `&self`, so the cache is guarded by a `Mutex` rather than requiring
/// `&mut self`.
pub struct RegisterFeedsStage {
    id: String,
    cache: Mutex<FeedCache>,
}

impl RegisterFeedsStage {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cache: Mutex::new(FeedCache::new()),
        }
    }

    pub fn cached_feed_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

impl Stage for RegisterFeedsStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> FactResult<PipelineData> {
        match input {
            PipelineData::Specification(spec) => {
                let start = start_from_context(ctx, &spec)?;
                let mut cache = self.cache.lock().unwrap();
                let hashes = cache.register(&spec, &start)?;
                ctx.push_info("feed.registered", format!("{} feed(s)", hashes.len()));
                Ok(PipelineData::FeedHashes(hashes))
            }
            other => Err(FactError::internal(format!(
                "expected PipelineData::Specification, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, PipelineContext};

    #[test]
    fn parse_then_skeleton_round_trips_given_count() {
        let mut p = Pipeline::new();
        p.push_stage(ParseSpecificationStage::new("parse"));
        p.push_stage(BuildSkeletonStage::new("skeleton"));
        let report = p
            .run(
                PipelineContext::default(),
                PipelineData::Text(
                    "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1".to_string(),
                ),
            )
            .unwrap();
        let skeleton = report.require_skeleton().unwrap();
        assert_eq!(skeleton.inputs.len(), 1);
    }

    #[test]
    fn register_feeds_stage_is_idempotent_across_runs() {
        let mut p = Pipeline::new();
        p.push_stage(ParseSpecificationStage::new("parse"));
        p.push_stage(RegisterFeedsStage::new("feeds"));

        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1".to_string();

        let mut ctx1 = PipelineContext::default();
        ctx1.set_param("given.p1", "Company:C1");
        let r1 = p.run(ctx1, PipelineData::Text(text.clone())).unwrap();

        let mut ctx2 = PipelineContext::default();
        ctx2.set_param("given.p1", "Company:C1");
        let r2 = p.run(ctx2, PipelineData::Text(text)).unwrap();

        assert_eq!(r1.require_feed_hashes().unwrap(), r2.require_feed_hashes().unwrap());
    }

    #[test]
    fn register_feeds_stage_requires_a_param_per_given() {
        let mut p = Pipeline::new();
        p.push_stage(ParseSpecificationStage::new("parse"));
        p.push_stage(RegisterFeedsStage::new("feeds"));

        let text = "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1".to_string();
        let err = p.run(PipelineContext::default(), PipelineData::Text(text)).unwrap_err();
        assert!(matches!(err, FactError::Internal { .. }));
    }

    #[test]
    fn rule_blocks_stage_parses_authorization_and_distribution() {
        let mut p = Pipeline::new();
        p.push_stage(ParseRuleBlocksStage::new("rules"));
        let text = r#"
            authorization {
                any Company
            }
        "#
        .to_string();
        let report = p.run(PipelineContext::default(), PipelineData::Text(text)).unwrap();
        match report.output {
            PipelineData::RuleSet(rules) => assert_eq!(rules.authorization.len(), 1),
            other => panic!("expected PipelineData::RuleSet, got {other:?}"),
        }
    }
}
