use std::fmt;

// ---------------------------------------------------------------------------
// Observation – one row of the source table
// ---------------------------------------------------------------------------

/// A single measurement: which group it belongs to, which individual it was
/// taken from, and the measured value.
///
/// The individual id is carried for display only; grouping and statistics
/// ignore it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub group: String,
    pub individual: String,
    pub value: f64,
}

impl Observation {
    pub fn new(group: impl Into<String>, individual: impl Into<String>, value: f64) -> Self {
        Self {
            group: group.into(),
            individual: individual.into(),
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnNames – the three header cells
// ---------------------------------------------------------------------------

/// Header names as found in the file (trimmed).
///
/// Exported spreadsheets tend to carry stray whitespace or escape characters
/// in their headers, so the names are read from the file rather than
/// assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub group: String,
    pub individual: String,
    pub value: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            group: "Species".to_string(),
            individual: "Individual".to_string(),
            value: "Peak_Power".to_string(),
        }
    }
}

impl ColumnNames {
    /// Build from raw header cells, trimming whitespace and control characters.
    pub fn from_headers(group: &str, individual: &str, value: &str) -> Self {
        fn clean(s: &str) -> String {
            s.trim_matches(|c: char| c.is_whitespace() || c.is_control() || c == '\u{feff}')
                .to_string()
        }
        Self {
            group: clean(group),
            individual: clean(individual),
            value: clean(value),
        }
    }
}

impl fmt::Display for ColumnNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.group, self.individual, self.value)
    }
}

// ---------------------------------------------------------------------------
// ObservationTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The parsed input: header names plus rows in file order.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    pub columns: ColumnNames,
    pub rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(columns: ColumnNames, rows: Vec<Observation>) -> Self {
        Self { columns, rows }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows, for previews.
    pub fn head(&self, n: usize) -> &[Observation] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Count of rows whose value is not finite.
    pub fn non_finite_count(&self) -> usize {
        self.rows.iter().filter(|o| !o.value.is_finite()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_cleaned() {
        let names = ColumnNames::from_headers("\u{feff}Species ", "\tIndividual", "Peak_Power\r");
        assert_eq!(names.group, "Species");
        assert_eq!(names.individual, "Individual");
        assert_eq!(names.value, "Peak_Power");
        assert_eq!(names.to_string(), "Species, Individual, Peak_Power");
    }

    #[test]
    fn head_is_clamped_to_length() {
        let table = ObservationTable::new(
            ColumnNames::default(),
            vec![Observation::new("A", "1", 1.0), Observation::new("B", "2", f64::NAN)],
        );
        assert_eq!(table.head(5).len(), 2);
        assert_eq!(table.head(1)[0].group, "A");
        assert_eq!(table.non_finite_count(), 1);
    }
}
