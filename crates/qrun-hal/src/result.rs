//! Execution results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Measurement counts keyed by bit-string.
///
/// Bit-strings put the highest classical bit first, so character `i` from
/// the right is clbit `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Occurrences of `bitstring`, zero if never observed.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outcomes in bit-string order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Outcomes ordered by descending count, ties by bit-string.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// The most frequent outcome.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.sorted().into_iter().next()
    }

    /// Outcome probabilities.
    pub fn probabilities(&self) -> BTreeMap<String, f64> {
        let total = self.total_shots();
        if total == 0 {
            return BTreeMap::new();
        }
        self.0
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total as f64))
            .collect()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (bitstring, count) in iter {
            counts.insert(bitstring, count);
        }
        counts
    }
}

/// One statevector entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amplitude {
    /// Basis state, highest qubit first.
    pub basis: String,
    pub re: f64,
    pub im: f64,
}

impl Amplitude {
    /// Probability of the basis state.
    pub fn probability(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts.
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Execution time reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Final amplitudes, for backends that expose them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statevector: Option<Vec<Amplitude>>,
}

impl ExecutionResult {
    /// Create a result from counts.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
            statevector: None,
        }
    }

    /// Attach the execution time.
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Attach the final statevector.
    pub fn with_statevector(mut self, amplitudes: Vec<Amplitude>) -> Self {
        self.statevector = Some(amplitudes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut counts = Counts::new();
        counts.insert("00", 500);
        counts.insert("11", 500);
        counts.insert("00", 24);

        assert_eq!(counts.get("00"), 524);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total_shots(), 1024);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_counts_sorted() {
        let counts: Counts = [("01".to_string(), 3), ("10".to_string(), 7), ("00".to_string(), 3)]
            .into_iter()
            .collect();

        assert_eq!(counts.sorted(), vec![("10", 7), ("00", 3), ("01", 3)]);
        assert_eq!(counts.most_frequent(), Some(("10", 7)));
    }

    #[test]
    fn test_probabilities() {
        let mut counts = Counts::new();
        counts.insert("0", 1);
        counts.insert("1", 3);
        let probs = counts.probabilities();
        assert!((probs["1"] - 0.75).abs() < 1e-12);
        assert!(Counts::new().probabilities().is_empty());
    }

    #[test]
    fn test_result_json() {
        let mut counts = Counts::new();
        counts.insert("11", 4);
        let result = ExecutionResult::new(counts, 4).with_execution_time(12);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["counts"]["11"], 4);
        assert_eq!(json["execution_time_ms"], 12);
        assert!(json.get("statevector").is_none());
    }
}
