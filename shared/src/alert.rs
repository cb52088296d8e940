use crate::schema::Entry;
use std::fmt;

pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Tools whose measurements improve as they grow (throughput rather than time).
pub fn bigger_is_better(tool: &str) -> bool {
    matches!(tool, "benchmarkjs" | "pytest" | "customBiggerIsBetter")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    pub name: String,
    pub previous: f64,
    pub current: f64,
    pub unit: String,
    /// How many times worse `current` is than `previous`.
    pub ratio: f64,
}

impl fmt::Display for Regression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} -> {} {} ({:.2}x)",
            self.name, self.previous, self.unit, self.current, self.unit, self.ratio
        )
    }
}

/// Benches of `current` that got worse than in `previous` by more than `threshold`.
pub fn compare(previous: &Entry, current: &Entry, threshold: f64) -> Vec<Regression> {
    let bigger = bigger_is_better(&current.tool);

    current
        .benches
        .iter()
        .filter_map(|bench| {
            let before = previous.bench(&bench.name)?;
            let ratio = if bigger {
                before.value / bench.value
            } else {
                bench.value / before.value
            };

            (ratio.is_finite() && ratio > threshold).then(|| Regression {
                name: bench.name.clone(),
                previous: before.value,
                current: bench.value,
                unit: bench.unit.clone(),
                ratio,
            })
        })
        .collect()
}
