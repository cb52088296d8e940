//! Conversion of `BenchmarkTools.save` exports into benches.
//!
//! The export is `[versions, [group, ...]]` where every group is
//! `["BenchmarkGroup", {"data": {...}, "tags": [...]}]` and leaves are
//! `["TrialEstimate", {"time": .., "gctime": .., "memory": .., "allocs": .., "params": ["Parameters", {..}]}]`.

use crate::extra::JuliaExtra;
use crate::schema::Bench;
use serde_json::{Map, Value};
use thiserror::Error;

pub const TOOL: &str = "julia";

#[derive(Error, Debug)]
pub enum JuliaError {
    #[error("output is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("expected `[versions, groups]` at the top level")]
    NotAnExport,
    #[error("{path}: malformed {kind}")]
    Malformed { path: String, kind: &'static str },
    #[error("{path}: unexpected Julia benchmark type `{kind}`")]
    UnexpectedType { path: String, kind: String },
    #[error("{path}: missing or invalid field `{field}`")]
    Field { path: String, field: &'static str },
    #[error("export contains no measurements")]
    Empty,
}

pub fn extract(output: &str) -> Result<Vec<Bench>, JuliaError> {
    let value: Value = serde_json::from_str(output)?;
    extract_value(&value)
}

pub fn extract_value(output: &Value) -> Result<Vec<Bench>, JuliaError> {
    let groups = output
        .as_array()
        .and_then(|top| top.get(1))
        .and_then(Value::as_array)
        .ok_or(JuliaError::NotAnExport)?;

    let mut benches = Vec::new();
    for group in groups {
        walk_group(group, &mut Vec::new(), &mut benches)?;
    }

    if benches.is_empty() {
        return Err(JuliaError::Empty);
    }
    Ok(benches)
}

fn walk_group<'a>(
    group: &'a Value,
    labels: &mut Vec<&'a str>,
    benches: &mut Vec<Bench>,
) -> Result<(), JuliaError> {
    let (_, body) = tagged(group, labels)?;
    let data = body
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| JuliaError::Malformed {
            path: labels.join("/"),
            kind: "BenchmarkGroup",
        })?;

    for (key, value) in iteration_order(data) {
        labels.push(key);
        let (kind, body) = tagged(value, labels)?;
        match kind {
            "BenchmarkGroup" => walk_group(value, labels, benches)?,
            "TrialEstimate" => benches.push(trial_estimate(body, labels)?),
            other => {
                return Err(JuliaError::UnexpectedType {
                    path: labels.join("/"),
                    kind: other.to_string(),
                })
            }
        }
        labels.pop();
    }

    Ok(())
}

/// Keys in JavaScript property order: array-index keys ascending, then the
/// rest as they appear in the document.
fn iteration_order(data: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let (mut indices, names): (Vec<_>, Vec<_>) =
        data.iter().partition(|(key, _)| array_index(key).is_some());
    indices.sort_by_key(|(key, _)| array_index(key));
    indices.extend(names);
    indices
}

fn array_index(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|index| *index != u32::MAX && index.to_string() == key)
}

/// Splits a `["Type", {..}]` pair.
fn tagged<'a>(
    value: &'a Value,
    labels: &[&str],
) -> Result<(&'a str, &'a Map<String, Value>), JuliaError> {
    let malformed = || JuliaError::Malformed {
        path: labels.join("/"),
        kind: "tagged value",
    };
    let pair = value.as_array().filter(|a| a.len() == 2).ok_or_else(malformed)?;
    let kind = pair[0].as_str().ok_or_else(malformed)?;
    let body = pair[1].as_object().ok_or_else(malformed)?;
    Ok((kind, body))
}

fn trial_estimate(body: &Map<String, Value>, labels: &[&str]) -> Result<Bench, JuliaError> {
    let path = labels.join("/");
    let missing = |field| JuliaError::Field {
        path: path.clone(),
        field,
    };

    let time = body
        .get("time")
        .and_then(Value::as_f64)
        .ok_or_else(|| missing("time"))?;
    let gctime = body
        .get("gctime")
        .and_then(Value::as_f64)
        .filter(|gctime| *gctime >= 0.0)
        .ok_or_else(|| missing("gctime"))?;
    let memory = body
        .get("memory")
        .and_then(Value::as_u64)
        .ok_or_else(|| missing("memory"))?;
    let allocs = body
        .get("allocs")
        .and_then(Value::as_u64)
        .ok_or_else(|| missing("allocs"))?;
    let params = body
        .get("params")
        .and_then(Value::as_array)
        .and_then(|pair| pair.get(1))
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| missing("params"))?;

    let extra = JuliaExtra {
        gctime,
        memory,
        allocs,
        params,
    };

    Ok(Bench {
        name: path,
        value: time,
        unit: "ns".to_string(),
        range: None,
        extra: Some(extra.to_string()),
    })
}
