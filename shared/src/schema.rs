use crate::extra::{ExtraError, JuliaExtra};
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// Root of `data.js`, keyed by suite name in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkData {
    pub last_update: u64,
    pub repo_url: String,
    pub entries: IndexMap<String, Vec<Entry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub commit: Commit,
    pub date: u64,
    pub tool: String,
    pub benches: Vec<Bench>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub author: Person,
    pub committer: Person,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bench {
    pub name: String,
    #[serde(serialize_with = "crate::number::serialize_js")]
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

pub const PENDING_PREFIX: &str = "pending/";

/// An entry staged by the collector, waiting to be appended to `suite`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub suite: String,
    pub entry: Entry,
}

impl BenchmarkData {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: 0,
            repo_url: repo_url.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn suite(&self, name: &str) -> Option<&[Entry]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Most recent `date` over every suite.
    pub fn latest_date(&self) -> Option<u64> {
        self.entries
            .values()
            .flat_map(|entries| entries.iter().map(|entry| entry.date))
            .max()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl PendingEntry {
    /// Object key the entry is staged under.
    pub fn key(&self) -> String {
        format!("{}{}", PENDING_PREFIX, self.relative_path())
    }

    pub fn relative_path(&self) -> String {
        format!("{}/{}.json", self.suite, self.entry.commit.id)
    }
}

impl Entry {
    pub fn bench(&self, name: &str) -> Option<&Bench> {
        self.benches.iter().find(|bench| bench.name == name)
    }
}

impl Bench {
    /// Decodes `extra` as a Julia measurement. `None` when there is no extra.
    pub fn julia_extra(&self) -> Option<Result<JuliaExtra, ExtraError>> {
        self.extra.as_deref().map(JuliaExtra::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench(name: &str, value: f64) -> Bench {
        Bench {
            name: name.to_string(),
            value,
            unit: "ns".to_string(),
            range: None,
            extra: None,
        }
    }

    #[test]
    fn latest_date_spans_all_suites() {
        let mut data = BenchmarkData::new("https://example.com/repo");
        assert_eq!(data.latest_date(), None);

        let entry = |date: u64| Entry {
            commit: Commit {
                author: Person {
                    email: None,
                    name: "a".into(),
                    username: None,
                },
                committer: Person {
                    email: None,
                    name: "a".into(),
                    username: None,
                },
                distinct: None,
                id: format!("{date}"),
                message: String::new(),
                timestamp: None,
                tree_id: None,
                url: String::new(),
            },
            date,
            tool: "julia".into(),
            benches: vec![bench("factorize/1", 1.0)],
        };

        data.entries.insert("a".into(), vec![entry(5), entry(9)]);
        data.entries.insert("b".into(), vec![entry(7)]);

        assert_eq!(data.latest_date(), Some(9));
        assert_eq!(data.entry_count(), 3);
        assert_eq!(data.suite("b").map(<[Entry]>::len), Some(1));
        assert!(data.suite("c").is_none());
    }

    #[test]
    fn pending_key_groups_by_suite() {
        let json = r#"{
            "suite": "Benchmark",
            "entry": {
                "commit": {
                    "author": {"name": "n"},
                    "committer": {"name": "n"},
                    "id": "ec749b68",
                    "message": "m",
                    "url": "u"
                },
                "date": 1,
                "tool": "julia",
                "benches": []
            }
        }"#;
        let pending: PendingEntry = serde_json::from_str(json).unwrap();

        assert_eq!(pending.key(), "pending/Benchmark/ec749b68.json");
        assert_eq!(pending.relative_path(), "Benchmark/ec749b68.json");
    }

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_string(&bench("x", 3.0)).unwrap();
        assert_eq!(json, r#"{"name":"x","value":3,"unit":"ns"}"#);
    }

    #[test]
    fn bench_lookup_by_name() {
        let json = r#"{
            "commit": {
                "author": {"name": "n"},
                "committer": {"name": "n"},
                "id": "abc",
                "message": "m",
                "url": "u"
            },
            "date": 1,
            "tool": "julia",
            "benches": [{"name": "factorize/1", "value": 2.5, "unit": "ns"}]
        }"#;
        let entry: Entry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.bench("factorize/1").map(|b| b.value), Some(2.5));
        assert!(entry.bench("factorize/2").is_none());
        assert!(entry.benches[0].julia_extra().is_none());
    }
}
