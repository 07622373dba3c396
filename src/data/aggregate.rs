use std::collections::HashMap;

use super::model::Observation;

// ---------------------------------------------------------------------------
// GroupSummary – derived statistics of one group
// ---------------------------------------------------------------------------

/// Count, mean, sample standard deviation and standard error of one group.
///
/// NaN is a legitimate value here: a single observation has no sample
/// standard deviation, and non-finite inputs propagate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (N − 1 denominator).
    pub stddev: f64,
    /// `stddev / count`.
    pub sem: f64,
}

impl GroupSummary {
    /// Compute the summary of a slice of values.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        let n = count as f64;
        let mean = if count == 0 {
            f64::NAN
        } else {
            values.iter().sum::<f64>() / n
        };
        let stddev = if count < 2 {
            f64::NAN
        } else {
            let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (ss / (n - 1.0)).sqrt()
        };
        let sem = if count == 0 { f64::NAN } else { stddev / n };

        Self {
            count,
            mean,
            stddev,
            sem,
        }
    }

    /// Whether the spread statistics are undefined (fewer than two values).
    pub fn is_degenerate(&self) -> bool {
        self.count < 2
    }
}

// ---------------------------------------------------------------------------
// Group / Aggregation
// ---------------------------------------------------------------------------

/// One group: its label, raw values in input order, and summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    pub values: Vec<f64>,
    pub summary: GroupSummary,
}

/// All groups of a table, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    groups: Vec<Group>,
}

impl Aggregation {
    /// Groups in first-appearance order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partition observations by group label and summarise each group.
///
/// Groups are discovered in first-appearance order and keep that order;
/// each group's values stay in input order.
pub fn aggregate<'a, I>(observations: I) -> Aggregation
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut labels: Vec<String> = Vec::new();
    let mut values: Vec<Vec<f64>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for obs in observations {
        let slot = match index.get(obs.group.as_str()) {
            Some(&i) => i,
            None => {
                let i = labels.len();
                index.insert(obs.group.clone(), i);
                labels.push(obs.group.clone());
                values.push(Vec::new());
                i
            }
        };
        values[slot].push(obs.value);
    }

    let groups = labels
        .into_iter()
        .zip(values)
        .map(|(label, values)| {
            let summary = GroupSummary::from_values(&values);
            Group {
                label,
                values,
                summary,
            }
        })
        .collect();

    Aggregation { groups }
}
