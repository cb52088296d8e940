use anyhow::{Context, Result};
use shared::PendingEntry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Every `*.json` pending entry below `dir`. Files that fail to parse are
/// reported and left where they are.
pub fn load_pending(dir: &Path) -> Vec<(PathBuf, PendingEntry)> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .filter_map(|e| match load_entry(e.path()) {
            Ok(pending) => Some((e.into_path(), pending)),
            Err(error) => {
                warn!("Skipping {}: {:#}", e.path().display(), error);
                None
            }
        })
        .collect()
}

fn load_entry(path: &Path) -> Result<PendingEntry> {
    let entry = fs::read_to_string(path)?;
    let entry = serde_json::from_str(&entry).context("not a pending entry")?;

    Ok(entry)
}

pub fn write_entry(dir: &Path, pending: &PendingEntry) -> Result<PathBuf> {
    let path = dir.join(pending.relative_path());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(pending)?)?;

    Ok(path)
}

pub fn remove_all(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Bench, Commit, Entry, Person};

    fn pending(id: &str) -> PendingEntry {
        let person = Person {
            email: None,
            name: "n".into(),
            username: None,
        };
        PendingEntry {
            suite: "Benchmark".into(),
            entry: Entry {
                commit: Commit {
                    author: person.clone(),
                    committer: person,
                    distinct: None,
                    id: id.into(),
                    message: String::new(),
                    timestamp: None,
                    tree_id: None,
                    url: String::new(),
                },
                date: 1,
                tool: "julia".into(),
                benches: vec![Bench {
                    name: "factorize/1".into(),
                    value: 1.0,
                    unit: "ns".into(),
                    range: None,
                    extra: None,
                }],
            },
        }
    }

    #[test]
    fn walks_nested_directories_and_skips_junk() {
        let dir = std::env::temp_dir().join(format!("benchctl-pending-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let first = write_entry(&dir, &pending("a")).unwrap();
        let second = write_entry(&dir, &pending("b")).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        fs::write(dir.join("broken.json"), "{").unwrap();

        let loaded = load_pending(&dir);

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].0, first);
        assert_eq!(loaded[1].1.entry.commit.id, "b");
        assert_eq!(second, dir.join("Benchmark").join("b.json"));

        remove_all(&[first, second]).unwrap();
        assert!(load_pending(&dir).is_empty());
        assert!(dir.join("broken.json").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
