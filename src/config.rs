//! Configuration structures for factgraph-core.
//!
//! This module defines explicit configuration objects, constructed and
//! passed in by the caller rather than loaded from disk or environment.
//! `LimitsConfig` is consulted directly by
//! `crate::spec::parser::parse_specification_with_limits` (source size,
//! existential nesting depth, nested-projection depth); `RunnerConfig`
//! is consulted directly by `crate::runtime::runner::run_with_config`
//! (a cap on rows a single run may emit). `HashingConfig` documents the
//! digest algorithm a higher-level component should assign when it
//! constructs a `FactRecord`'s hash — `determinism::hashing::hash_fact`
//! itself always uses SHA-512, so there is nothing left for this crate
//! to branch on yet, but the type exists so callers have one place to
//! name the algorithm they're committing to.
//!
//! The core crate itself does not read environment variables or the
//! system clock. All configuration must be provided explicitly by the
//! caller to preserve determinism.

use crate::errors::{FactError, FactResult};

/// Global configuration container.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub hashing: HashingConfig,
    pub limits: LimitsConfig,
    pub runner: RunnerConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            hashing: HashingConfig::default(),
            limits: LimitsConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

/// Hashing-related configuration.
#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub algorithm: HashAlgorithm,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha512,
        }
    }
}

/// Supported hash algorithms for fact content addressing.
///
/// `Sha512` is the only algorithm with a stable on-disk/wire identity
/// today; the enum exists so the contract reads the same way as the
/// hashing config of other deterministic-encoding crates, and so a
/// future algorithm can be added without breaking callers matching on
/// this type exhaustively through `as_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha512 => "sha512",
        }
    }

    pub fn parse(s: &str) -> FactResult<Self> {
        match s {
            "sha512" => Ok(Self::Sha512),
            _ => Err(FactError::invalid_fact(format!(
                "unsupported hash algorithm: {s}"
            ))),
        }
    }
}

/// Resource and recursion limits for the parser, skeleton builder, and
/// runner. These are guards against pathological input, not tuning
/// knobs that change semantics.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum number of bytes of descriptive-string source the parser
    /// will accept.
    pub max_parse_bytes: usize,
    /// Maximum nesting depth of existential conditions (`E { ... }`
    /// inside `E { ... }`).
    pub max_existential_depth: usize,
    /// Maximum nesting depth of composite projections containing nested
    /// specifications.
    pub max_projection_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_parse_bytes: 1024 * 1024,
            max_existential_depth: 64,
            max_projection_depth: 64,
        }
    }
}

/// Runner-specific limits.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Optional cap on rows a single `read` call may emit. `None` means
    /// unbounded. Exceeding the cap is an `Internal` error, never a
    /// silent truncation.
    pub max_rows: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_rows: None }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &CoreConfig) -> FactResult<()> {
    if cfg.limits.max_parse_bytes == 0 {
        return Err(FactError::invalid_fact(
            "max_parse_bytes must be greater than zero",
        ));
    }

    if cfg.limits.max_existential_depth == 0 {
        return Err(FactError::invalid_fact(
            "max_existential_depth must be greater than zero",
        ));
    }

    if cfg.limits.max_projection_depth == 0 {
        return Err(FactError::invalid_fact(
            "max_projection_depth must be greater than zero",
        ));
    }

    if let Some(0) = cfg.runner.max_rows {
        return Err(FactError::invalid_fact(
            "max_rows, if set, must be greater than zero",
        ));
    }

    Ok(())
}
