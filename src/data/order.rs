use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::aggregate::{Aggregation, Group};
use crate::error::Error;

// ---------------------------------------------------------------------------
// Display order of groups along the categorical axis
// ---------------------------------------------------------------------------

/// How groups are laid out on the categorical axis.
///
/// The resulting sequence is placed bottom-to-top: its first group sits at
/// position 1, the lowest violin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupOrder {
    /// First-seen group at the bottom.
    FirstAppearance,
    /// First-seen group at the top.
    #[default]
    Reversed,
    /// Labels sorted A→Z, bottom-to-top.
    Alphabetical,
    /// Smallest mean at the bottom.
    MeanAscending,
    /// Largest mean at the bottom.
    MeanDescending,
}

impl GroupOrder {
    pub const ALL: [GroupOrder; 5] = [
        GroupOrder::FirstAppearance,
        GroupOrder::Reversed,
        GroupOrder::Alphabetical,
        GroupOrder::MeanAscending,
        GroupOrder::MeanDescending,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GroupOrder::FirstAppearance => "first-appearance",
            GroupOrder::Reversed => "reversed",
            GroupOrder::Alphabetical => "alphabetical",
            GroupOrder::MeanAscending => "mean-ascending",
            GroupOrder::MeanDescending => "mean-descending",
        }
    }
}

impl fmt::Display for GroupOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupOrder::ALL
            .into_iter()
            .find(|o| o.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = GroupOrder::ALL.iter().map(|o| o.name()).collect();
                Error::InvalidArgument(format!(
                    "unknown group order '{s}', expected one of: {}",
                    names.join(", ")
                ))
            })
    }
}

/// Return indices into `aggregation.groups()` in display order.
///
/// Mean-based orders put groups with an undefined (NaN) mean last and break
/// ties by first appearance.
pub fn ordered_indices(aggregation: &Aggregation, order: GroupOrder) -> Vec<usize> {
    let groups = aggregation.groups();
    let mut indices: Vec<usize> = (0..groups.len()).collect();
    let mean = |i: usize| groups[i].summary.mean;

    match order {
        GroupOrder::FirstAppearance => {}
        GroupOrder::Reversed => indices.reverse(),
        GroupOrder::Alphabetical => indices.sort_by(|&a, &b| groups[a].label.cmp(&groups[b].label)),
        GroupOrder::MeanAscending => indices.sort_by(|&a, &b| nan_last(mean(a), mean(b), false)),
        GroupOrder::MeanDescending => indices.sort_by(|&a, &b| nan_last(mean(a), mean(b), true)),
    }
    indices
}

/// Groups in display order.
pub fn ordered_groups(aggregation: &Aggregation, order: GroupOrder) -> Vec<&Group> {
    ordered_indices(aggregation, order)
        .into_iter()
        .map(|i| &aggregation.groups()[i])
        .collect()
}

fn nan_last(a: f64, b: f64, descending: bool) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) if descending => b.total_cmp(&a),
        (false, false) => a.total_cmp(&b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::aggregate;
    use crate::data::model::Observation;

    fn sample() -> Aggregation {
        let rows: Vec<Observation> = [
            ("Wren", 3.0),
            ("Finch", 9.0),
            ("Wren", 5.0),
            ("Bat", f64::NAN),
            ("Ant", 1.0),
        ]
        .iter()
        .map(|&(g, v)| Observation::new(g, "", v))
        .collect();
        aggregate(&rows)
    }

    fn labels(agg: &Aggregation, order: GroupOrder) -> Vec<&str> {
        ordered_groups(agg, order)
            .into_iter()
            .map(|g| g.label.as_str())
            .collect()
    }

    #[test]
    fn each_order_yields_expected_sequence() {
        let agg = sample();
        assert_eq!(
            labels(&agg, GroupOrder::FirstAppearance),
            ["Wren", "Finch", "Bat", "Ant"]
        );
        assert_eq!(labels(&agg, GroupOrder::Reversed), ["Ant", "Bat", "Finch", "Wren"]);
        assert_eq!(
            labels(&agg, GroupOrder::Alphabetical),
            ["Ant", "Bat", "Finch", "Wren"]
        );
        assert_eq!(
            labels(&agg, GroupOrder::MeanAscending),
            ["Ant", "Wren", "Finch", "Bat"]
        );
        assert_eq!(
            labels(&agg, GroupOrder::MeanDescending),
            ["Finch", "Wren", "Ant", "Bat"]
        );
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Reversed".parse::<GroupOrder>().unwrap(), GroupOrder::Reversed);
        assert_eq!(
            " mean-descending ".parse::<GroupOrder>().unwrap(),
            GroupOrder::MeanDescending
        );
        assert!(matches!(
            "sideways".parse::<GroupOrder>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_aggregation_orders_to_nothing() {
        let agg = Aggregation::default();
        assert!(ordered_indices(&agg, GroupOrder::Reversed).is_empty());
    }
}
