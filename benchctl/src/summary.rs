use chrono::{TimeZone, Utc};
use shared::{Bench, BenchmarkData, Entry};
use std::fmt::Write;

pub fn render(data: &BenchmarkData, suite: Option<&str>) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} (last update {})",
        data.repo_url,
        format_millis(data.last_update)
    );

    for (name, entries) in &data.entries {
        if suite.is_some_and(|suite| suite != name.as_str()) {
            continue;
        }

        let _ = writeln!(out, "\n{} ({} entries)", name, entries.len());
        for entry in entries {
            render_entry(&mut out, entry);
        }
    }

    out
}

fn render_entry(out: &mut String, entry: &Entry) {
    let id: String = entry.commit.id.chars().take(8).collect();
    let message = entry.commit.message.lines().next().unwrap_or_default();

    let _ = writeln!(
        out,
        "  {} {} {} [{}]",
        id,
        format_millis(entry.date),
        message,
        entry.tool
    );
    for bench in &entry.benches {
        let _ = writeln!(out, "    {}", render_bench(bench));
    }
}

fn render_bench(bench: &Bench) -> String {
    let mut line = format!("{}: {} {}", bench.name, bench.value, bench.unit);

    if let Some(range) = &bench.range {
        let _ = write!(line, " ({range})");
    }

    match bench.julia_extra() {
        Some(Ok(extra)) => {
            let _ = write!(
                line,
                " | gc {} ns | {} bytes | {} allocs",
                extra.gctime, extra.memory, extra.allocs
            );
        }
        Some(Err(_)) | None => {}
    }

    line
}

fn format_millis(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .map(|date| date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../shared/tests/fixtures/data.js");

    #[test]
    fn renders_sample() {
        let data = shared::data_js::parse(SAMPLE).unwrap();

        assert_eq!(
            render(&data, None),
            "https://github.com/MPF-Optimization-Laboratory/BlockTensorFactorization.jl (last update 2025-11-18 18:57:52 UTC)\n\
             \n\
             Benchmark (1 entries)\n  \
             ec749b68 2025-11-18 18:57:51 UTC add missing reference to Pkg [julia]\n    \
             factorize/1: 15497440.5 ns | gc 0 ns | 10040808 bytes | 113709 allocs\n"
        );
    }

    #[test]
    fn filters_by_suite() {
        let data = shared::data_js::parse(SAMPLE).unwrap();
        let out = render(&data, Some("Nightly"));

        assert!(!out.contains("factorize/1"));
    }

    #[test]
    fn shows_range_for_custom_tools() {
        let bench = Bench {
            name: "ops".into(),
            value: 12.5,
            unit: "ops/s".into(),
            range: Some("± 0.3".into()),
            extra: Some("free form".into()),
        };

        assert_eq!(render_bench(&bench), "ops: 12.5 ops/s (± 0.3)");
    }
}
