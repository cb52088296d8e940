//! The `extra` text attached to Julia measurements:
//!
//! ```text
//! gctime=0
//! memory=10040808
//! allocs=113709
//! params={"gctrial":true,"samples":10000,...}
//! ```

use crate::number;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtraError {
    #[error("line {line}: expected `{expected}=`, found {found:?}")]
    UnexpectedKey {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("missing `{0}` line")]
    MissingLine(&'static str),
    #[error("unexpected trailing content: {0:?}")]
    TrailingContent(String),
    #[error("`{key}` is not a valid number: {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("gctime must be a non-negative number, got {0}")]
    NegativeGcTime(f64),
    #[error("params is not a JSON object")]
    ParamsNotObject,
    #[error("params is not valid JSON: {0}")]
    ParamsJson(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JuliaExtra {
    /// Nanoseconds spent in garbage collection.
    pub gctime: f64,
    /// Bytes allocated.
    pub memory: u64,
    pub allocs: u64,
    pub params: Map<String, Value>,
}

impl JuliaExtra {
    pub fn parse(text: &str) -> Result<Self, ExtraError> {
        let mut lines = text.split('\n');

        let gctime = field(&mut lines, 1, "gctime")?;
        let gctime = gctime
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ExtraError::InvalidNumber {
                key: "gctime",
                value: gctime.to_string(),
            })?;
        if gctime < 0.0 {
            return Err(ExtraError::NegativeGcTime(gctime));
        }

        let memory = integer(field(&mut lines, 2, "memory")?, "memory")?;
        let allocs = integer(field(&mut lines, 3, "allocs")?, "allocs")?;

        let params = field(&mut lines, 4, "params")?;
        let params = match serde_json::from_str::<Value>(params) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(ExtraError::ParamsNotObject),
            Err(e) => return Err(ExtraError::ParamsJson(e.to_string())),
        };

        let rest: Vec<&str> = lines.collect();
        if rest.iter().any(|line| !line.trim().is_empty()) {
            return Err(ExtraError::TrailingContent(rest.join("\n")));
        }

        Ok(Self {
            gctime,
            memory,
            allocs,
            params,
        })
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

impl fmt::Display for JuliaExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = number::normalize(Value::Object(self.params.clone()));
        write!(
            f,
            "gctime={}\nmemory={}\nallocs={}\nparams={}",
            number::format_js(self.gctime),
            self.memory,
            self.allocs,
            params
        )
    }
}

fn field<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    line: usize,
    key: &'static str,
) -> Result<&'a str, ExtraError> {
    let text = lines.next().ok_or(ExtraError::MissingLine(key))?;
    match text.split_once('=') {
        Some((found, value)) if found == key => Ok(value.trim()),
        _ => Err(ExtraError::UnexpectedKey {
            line,
            expected: key,
            found: text.to_string(),
        }),
    }
}

fn integer(value: &str, key: &'static str) -> Result<u64, ExtraError> {
    value.parse::<u64>().map_err(|_| ExtraError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "gctime=0\nmemory=10040808\nallocs=113709\nparams={\"gctrial\":true,\"time_tolerance\":0.05,\"evals_set\":false,\"samples\":10000,\"evals\":1,\"gcsample\":false,\"seconds\":5,\"overhead\":0,\"memory_tolerance\":0.01}";

    #[test]
    fn parses_sample() {
        let extra = JuliaExtra::parse(SAMPLE).unwrap();

        assert_eq!(extra.gctime, 0.0);
        assert_eq!(extra.memory, 10_040_808);
        assert_eq!(extra.allocs, 113_709);
        assert_eq!(extra.param("samples"), Some(&Value::from(10000)));
        assert_eq!(extra.param("gctrial"), Some(&Value::Bool(true)));
        assert_eq!(extra.params.len(), 9);
    }

    #[test]
    fn renders_back_to_the_same_text() {
        let extra = JuliaExtra::parse(SAMPLE).unwrap();
        assert_eq!(extra.to_string(), SAMPLE);
    }

    #[test]
    fn fractional_gctime_is_kept() {
        let text = "gctime=1234.5\nmemory=1\nallocs=1\nparams={}";
        let extra = JuliaExtra::parse(text).unwrap();

        assert_eq!(extra.gctime, 1234.5);
        assert_eq!(extra.to_string(), text);
    }

    #[test]
    fn rejects_negative_gctime() {
        let err = JuliaExtra::parse("gctime=-1\nmemory=1\nallocs=1\nparams={}").unwrap_err();
        assert_eq!(err, ExtraError::NegativeGcTime(-1.0));
    }

    #[test]
    fn rejects_out_of_order_fields() {
        let err = JuliaExtra::parse("memory=1\ngctime=0\nallocs=1\nparams={}").unwrap_err();
        assert!(matches!(
            err,
            ExtraError::UnexpectedKey {
                line: 1,
                expected: "gctime",
                ..
            }
        ));
    }

    #[test]
    fn rejects_truncated_text() {
        let err = JuliaExtra::parse("gctime=0\nmemory=1").unwrap_err();
        assert_eq!(err, ExtraError::MissingLine("allocs"));
    }

    #[test]
    fn rejects_non_object_params() {
        let err = JuliaExtra::parse("gctime=0\nmemory=1\nallocs=1\nparams=[1]").unwrap_err();
        assert_eq!(err, ExtraError::ParamsNotObject);

        let err = JuliaExtra::parse("gctime=0\nmemory=1\nallocs=1\nparams={").unwrap_err();
        assert!(matches!(err, ExtraError::ParamsJson(_)));
    }

    #[test]
    fn rejects_bad_counters() {
        let err = JuliaExtra::parse("gctime=0\nmemory=lots\nallocs=1\nparams={}").unwrap_err();
        assert_eq!(
            err,
            ExtraError::InvalidNumber {
                key: "memory",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn rejects_trailing_lines() {
        let err = JuliaExtra::parse("gctime=0\nmemory=1\nallocs=1\nparams={}\nmore=1").unwrap_err();
        assert!(matches!(err, ExtraError::TrailingContent(_)));
    }
}
