//! The specification runner.
//!
//! `run(source, spec, start)` evaluates a specification against any
//! `FactSource`, producing the flat cross-product of bindings the
//! matches define, in match-definition order, each with its projected
//! value.

use std::collections::BTreeMap;

use crate::config::RunnerConfig;
use crate::errors::{FactError, FactResult};
use crate::model::fact::FactReference;
use crate::runtime::source::FactSource;
use crate::runtime::value::Value;
use crate::spec::ast::{Condition, ExistentialCondition, Match, PathCondition, Projection, ProjectionShape, Specification};

pub type Tuple = BTreeMap<String, FactReference>;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedResult {
    pub tuple: Tuple,
    pub result: Value,
}

/// Evaluate `spec` against `source` under the default runner
/// configuration (`RunnerConfig::default`, i.e. no row cap), binding the
/// givens to `start` in declared order.
pub async fn run(
    source: &dyn FactSource,
    spec: &Specification,
    start: &[FactReference],
) -> FactResult<Vec<ProjectedResult>> {
    run_with_config(source, spec, start, &RunnerConfig::default()).await
}

/// Evaluate `spec` against `source`, enforcing `config.max_rows`: if the
/// match cross-product would emit more rows than the cap, the run fails
/// with an `Internal` error rather than silently truncating the result.
pub async fn run_with_config(
    source: &dyn FactSource,
    spec: &Specification,
    start: &[FactReference],
    config: &RunnerConfig,
) -> FactResult<Vec<ProjectedResult>> {
    if start.len() != spec.given.len() {
        return Err(FactError::internal(
            "start length does not match the specification's number of givens",
        ));
    }

    let mut seed = Tuple::new();
    for (given, reference) in spec.given.iter().zip(start.iter()) {
        match source.find_fact(reference).await? {
            None => return Ok(Vec::new()),
            Some(record) if record.fact_type != given.label.fact_type => return Ok(Vec::new()),
            Some(_) => {}
        }
        seed.insert(given.label.name.clone(), reference.clone());
    }

    for given in &spec.given {
        for condition in &given.conditions {
            if let Condition::Existential(existential) = condition {
                if !check_existential(source, existential, &seed).await? {
                    return Ok(Vec::new());
                }
            }
        }
    }

    let rows = run_matches(source, &spec.matches, seed).await?;

    if let Some(max_rows) = config.max_rows {
        if rows.len() > max_rows {
            return Err(FactError::internal(format!(
                "run produced {} row(s), exceeding the configured limit of {max_rows}",
                rows.len()
            )));
        }
    }

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let value = project(source, &spec.projection, &row).await?;
        results.push(ProjectedResult { tuple: row, result: value });
    }
    Ok(results)
}

/// Run a sequence of matches against a seed binding, producing the
/// cross-product of rows they define. Shared by the top-level run, by
/// existential-condition evaluation, and by nested-specification
/// projections — all three are "run these matches starting from this
/// binding" in spec terms.
pub(crate) async fn run_matches(
    source: &dyn FactSource,
    matches: &[Match],
    seed: Tuple,
) -> FactResult<Vec<Tuple>> {
    let mut rows = vec![seed];

    for m in matches {
        let leading = m
            .leading_path()
            .expect("validated specification: a match's first condition is always a path");

        let mut new_rows = Vec::new();
        for row in &rows {
            let candidates = walk_path(source, leading, row, &m.unknown.fact_type).await?;
            for candidate in candidates {
                let mut extended = row.clone();
                extended.insert(m.unknown.name.clone(), candidate);
                new_rows.push(extended);
            }
        }
        tracing::trace!(unknown = %m.unknown.name, rows = new_rows.len(), "matched unknown");
        rows = new_rows;

        for condition in &m.conditions[1..] {
            rows = filter_rows(source, condition, rows, &m.unknown).await?;
        }
    }

    Ok(rows)
}

async fn filter_rows(
    source: &dyn FactSource,
    condition: &Condition,
    rows: Vec<Tuple>,
    unknown: &crate::spec::ast::Label,
) -> FactResult<Vec<Tuple>> {
    match condition {
        Condition::Path(path) => {
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                let candidates = walk_path(source, path, &row, &unknown.fact_type).await?;
                let bound = row.get(&unknown.name).ok_or_else(|| {
                    FactError::internal(format!("unknown '{}' unbound during filter", unknown.name))
                })?;
                if candidates.contains(bound) {
                    kept.push(row);
                }
            }
            Ok(kept)
        }
        Condition::Existential(existential) => {
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if check_existential(source, existential, &row).await? {
                    kept.push(row);
                }
            }
            Ok(kept)
        }
    }
}

async fn check_existential(
    source: &dyn FactSource,
    existential: &ExistentialCondition,
    row: &Tuple,
) -> FactResult<bool> {
    let nested_rows = run_matches(source, &existential.matches, row.clone()).await?;
    Ok(!nested_rows.is_empty() == existential.exists)
}

/// Walk one path condition's role chain starting from the current
/// binding, per §4.H.1: first `roles_right` as predecessor steps from
/// `label_right`'s bound reference, then the reverse of `roles_left` as
/// successor steps, landing on candidate references of `unknown_type`.
async fn walk_path(
    source: &dyn FactSource,
    path: &PathCondition,
    row: &Tuple,
    unknown_type: &str,
) -> FactResult<Vec<FactReference>> {
    let start_ref = row.get(&path.label_right).cloned().ok_or_else(|| {
        FactError::internal(format!(
            "label '{}' is not bound while walking a path condition",
            path.label_right
        ))
    })?;

    let mut current: Vec<FactReference> = vec![start_ref];
    for step in &path.roles_right {
        let mut next = Vec::new();
        for reference in &current {
            next.extend(
                source
                    .get_predecessors(reference, &step.role, &step.fact_type)
                    .await?,
            );
        }
        current = next;
    }

    let n = path.roles_left.len();
    for i in (0..n).rev() {
        let step = &path.roles_left[i];
        let successor_type: &str = if i == 0 {
            unknown_type
        } else {
            &path.roles_left[i - 1].fact_type
        };
        let mut next = Vec::new();
        for reference in &current {
            next.extend(
                source
                    .get_successors(reference, &step.role, successor_type)
                    .await?,
            );
        }
        current = next;
    }

    current.retain(|r| r.fact_type == unknown_type);
    Ok(current)
}

async fn project(source: &dyn FactSource, projection: &Projection, row: &Tuple) -> FactResult<Value> {
    match projection {
        Projection::Singular(shape) => project_shape(source, shape, row).await,
        Projection::Composite(components) => {
            let mut object = Vec::with_capacity(components.len());
            for (name, shape) in components {
                object.push((name.clone(), project_shape(source, shape, row).await?));
            }
            Ok(Value::Object(object))
        }
    }
}

async fn project_shape(source: &dyn FactSource, shape: &ProjectionShape, row: &Tuple) -> FactResult<Value> {
    match shape {
        ProjectionShape::Fact(label) => {
            let reference = lookup(row, label)?;
            let tree = source.hydrate(reference).await?;
            Ok(Value::Fact(Box::new(tree)))
        }
        ProjectionShape::Field(label, field) => {
            let reference = lookup(row, label)?;
            let record = source.find_fact(reference).await?.ok_or_else(|| {
                FactError::internal(format!(
                    "field projection of '{label}' but the bound fact no longer resolves"
                ))
            })?;
            // Open question resolution: a missing field projects as
            // `Value::Null` rather than raising.
            Ok(record.fields.get(field).map(Value::from).unwrap_or(Value::Null))
        }
        ProjectionShape::Hash(label) => {
            let reference = lookup(row, label)?;
            Ok(Value::Str(reference.hash.clone()))
        }
        ProjectionShape::Nested(nested) => {
            let nested_rows = run_matches(source, &nested.matches, row.clone()).await?;
            let mut items = Vec::with_capacity(nested_rows.len());
            for nested_row in nested_rows {
                items.push(project(source, &nested.projection, &nested_row).await?);
            }
            Ok(Value::List(items))
        }
    }
}

fn lookup<'a>(row: &'a Tuple, label: &str) -> FactResult<&'a FactReference> {
    row.get(label)
        .ok_or_else(|| FactError::internal(format!("projection references unbound label '{label}'")))
}
