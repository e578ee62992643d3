//! A generic compilation pipeline tying the specification language
//! together: parse descriptive-string text, validate connectivity,
//! reduce to a skeleton, and register feeds.
//!
//! Multiple producers (a CLI front-end, an API service, a storage
//! backend's subscription manager) all need the same sequence of
//! "turn this descriptive string into something runnable" steps. Rather
//! than duplicate that sequence, this module defines a small `Stage`
//! trait and a `Pipeline` that runs a fixed list of them in order,
//! threading a `PipelineContext` (diagnostics, caller-supplied params)
//! alongside the data.
//!
//! This crate does no I/O of its own: concrete storage/transport
//! backends compose these stages with their own I/O-performing stages.

use std::collections::BTreeMap;

use crate::errors::{FactError, FactResult};

pub mod stages;

/// A stable identifier for a pipeline stage, dot-namespaced:
/// `parse.descriptive_string`, `spec.validate_connectivity`,
/// `spec.build_skeleton`, `feed.register`.
pub type StageId = String;

#[derive(Debug, Clone, Copy)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct PipelineDiagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub message: String,
}

/// Context threaded through every stage: caller-supplied parameters
/// plus the diagnostics collected along the way. Carries no clock and
/// no randomness — this crate's pipeline is as deterministic as the
/// rest of it.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub params: BTreeMap<String, String>,
    pub diagnostics: Vec<PipelineDiagnostic>,
}

impl PipelineContext {
    pub fn push_info(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(PipelineDiagnostic {
            level: DiagnosticLevel::Info,
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn push_warning(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(PipelineDiagnostic {
            level: DiagnosticLevel::Warning,
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn push_error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(PipelineDiagnostic {
            level: DiagnosticLevel::Error,
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn set_param(&mut self, k: impl Into<String>, v: impl Into<String>) {
        self.params.insert(k.into(), v.into());
    }

    pub fn get_param(&self, k: &str) -> Option<&str> {
        self.params.get(k).map(|s| s.as_str())
    }
}

/// A stage input/output carrier. Kept as a small, explicit enum rather
/// than `Box<dyn Any>` so a mismatched stage order is a clear
/// `Internal` error instead of a downcast panic.
#[derive(Debug, Clone)]
pub enum PipelineData {
    None,
    Text(String),
    Specification(crate::spec::ast::Specification),
    Skeleton(crate::spec::skeleton::Skeleton),
    FeedHashes(Vec<String>),
    RuleSet(crate::spec::rules::RuleSet),
}

/// A pipeline stage. Stages are deterministic: no system clock, no
/// randomness, no I/O. A stage that needs caller-supplied context reads
/// it from `PipelineContext::params`.
pub trait Stage {
    fn id(&self) -> &str;
    fn run(&self, ctx: &mut PipelineContext, input: PipelineData) -> FactResult<PipelineData>;
}

/// An ordered list of stages run in sequence.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage + Send + Sync>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn push_stage<S: Stage + Send + Sync + 'static>(&mut self, s: S) -> &mut Self {
        self.stages.push(Box::new(s));
        self
    }

    pub fn stages(&self) -> usize {
        self.stages.len()
    }

    pub fn run(&self, mut ctx: PipelineContext, input: PipelineData) -> FactResult<PipelineReport> {
        let mut data = input;

        for st in &self.stages {
            ctx.push_info("pipeline.stage.start", format!("starting stage {}", st.id()));
            data = st.run(&mut ctx, data)?;
            ctx.push_info("pipeline.stage.end", format!("completed stage {}", st.id()));
        }

        Ok(PipelineReport {
            output: data,
            diagnostics: ctx.diagnostics,
        })
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub output: PipelineData,
    pub diagnostics: Vec<PipelineDiagnostic>,
}

impl PipelineReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.level, DiagnosticLevel::Error))
    }

    pub fn require_specification(self) -> FactResult<crate::spec::ast::Specification> {
        match self.output {
            PipelineData::Specification(s) => Ok(s),
            other => Err(FactError::internal(format!(
                "expected PipelineData::Specification, got {other:?}"
            ))),
        }
    }

    pub fn require_skeleton(self) -> FactResult<crate::spec::skeleton::Skeleton> {
        match self.output {
            PipelineData::Skeleton(s) => Ok(s),
            other => Err(FactError::internal(format!(
                "expected PipelineData::Skeleton, got {other:?}"
            ))),
        }
    }

    pub fn require_feed_hashes(self) -> FactResult<Vec<String>> {
        match self.output {
            PipelineData::FeedHashes(h) => Ok(h),
            other => Err(FactError::internal(format!(
                "expected PipelineData::FeedHashes, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::{BuildSkeletonStage, ParseSpecificationStage, RegisterFeedsStage};

    #[test]
    fn pipeline_runs_parse_skeleton_and_feeds_in_sequence() {
        let mut p = Pipeline::new();
        p.push_stage(ParseSpecificationStage::new("parse.descriptive_string"));
        p.push_stage(BuildSkeletonStage::new("spec.build_skeleton"));

        let report = p
            .run(
                PipelineContext::default(),
                PipelineData::Text(
                    "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1".to_string(),
                ),
            )
            .unwrap();
        assert!(!report.has_errors());
        let skeleton = report.require_skeleton().unwrap();
        assert_eq!(skeleton.facts.len(), 2);

        let mut feed_pipeline = Pipeline::new();
        feed_pipeline.push_stage(ParseSpecificationStage::new("parse.descriptive_string"));
        feed_pipeline.push_stage(RegisterFeedsStage::new("feed.register"));
        let mut feed_ctx = PipelineContext::default();
        feed_ctx.set_param("given.p1", "Company:C1");
        let feed_report = feed_pipeline
            .run(
                feed_ctx,
                PipelineData::Text(
                    "(p1: Company) { u1: Office [ u1->company:Company = p1 ] } => u1".to_string(),
                ),
            )
            .unwrap();
        let hashes = feed_report.require_feed_hashes().unwrap();
        assert_eq!(hashes.len(), 1);
    }

    #[test]
    fn mismatched_stage_order_is_an_internal_error() {
        let mut p = Pipeline::new();
        p.push_stage(BuildSkeletonStage::new("spec.build_skeleton"));
        let err = p.run(PipelineContext::default(), PipelineData::Text("x".to_string())).unwrap_err();
        assert!(matches!(err, FactError::Internal { .. }));
    }
}
