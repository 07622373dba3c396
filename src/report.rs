//! Console summaries of the loaded data.
//!
//! Each table is returned as a [`comfy_table::Table`] and printed by
//! [`print`], so the cells can be checked without capturing stdout.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};

use crate::color::to_hex;
use crate::data::aggregate::Aggregation;
use crate::data::model::ObservationTable;
use crate::state::FigureData;

/// Print every summary table to stdout.
pub fn print(table: &ObservationTable, aggregation: &Aggregation, fig: &FigureData, head_rows: usize) {
    println!("{}", columns(table));
    println!("{}", head(table, head_rows));
    println!("{}", info(table, aggregation));
    println!("{}", group_stats(aggregation));
    println!("Legend:\n{}", legend(fig));
}

/// Number formatting shared by the tables; NaN prints as `NaN`.
fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.6}")
    }
}

fn new_table(header: Vec<Cell>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(header);
    table
}

fn align_right(table: &mut Table, columns: impl IntoIterator<Item = usize>) {
    for i in columns {
        if let Some(column) = table.column_mut(i) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn columns(table: &ObservationTable) -> String {
    format!("Columns: {}", table.columns)
}

/// The first `n` rows, with the header names as column titles.
pub fn head(table: &ObservationTable, n: usize) -> Table {
    let cols = &table.columns;
    let mut out = new_table(vec![
        Cell::new(""),
        Cell::new(&cols.group),
        Cell::new(&cols.individual),
        Cell::new(&cols.value),
    ]);
    for (i, o) in table.head(n).iter().enumerate() {
        out.add_row(vec![
            Cell::new(i),
            Cell::new(&o.group),
            Cell::new(&o.individual),
            Cell::new(fmt_value(o.value)),
        ]);
    }
    align_right(&mut out, [0, 3]);
    out
}

pub fn info(table: &ObservationTable, aggregation: &Aggregation) -> String {
    format!(
        "Rows: {}\nGroups: {}\nNon-finite values: {}",
        table.len(),
        aggregation.len(),
        table.non_finite_count()
    )
}

/// Count, mean, standard deviation and standard error of each group, in
/// first-appearance order.
pub fn group_stats(aggregation: &Aggregation) -> Table {
    let mut out = new_table(
        ["group", "count", "mean", "std", "sem"]
            .into_iter()
            .map(Cell::new)
            .collect(),
    );
    for group in aggregation.groups() {
        let s = &group.summary;
        out.add_row(vec![
            Cell::new(&group.label),
            Cell::new(s.count),
            Cell::new(fmt_value(s.mean)),
            Cell::new(fmt_value(s.stddev)),
            Cell::new(fmt_value(s.sem)),
        ]);
    }
    align_right(&mut out, 1..5);
    out
}

/// Colour and marker assigned to each group, top row first as drawn.
pub fn legend(fig: &FigureData) -> Table {
    let mut out = new_table(
        ["row", "group", "n", "body", "points", "marker"]
            .into_iter()
            .map(Cell::new)
            .collect(),
    );
    for series in fig.series.iter().rev() {
        out.add_row(vec![
            Cell::new(series.position),
            Cell::new(&series.label),
            Cell::new(series.summary.count),
            Cell::new(to_hex(series.style.body)),
            Cell::new(to_hex(series.style.points)),
            Cell::new(series.style.marker.name()),
        ]);
    }
    align_right(&mut out, [0, 2]);
    out
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::Config;
    use crate::data::aggregate::aggregate;
    use crate::data::model::{ColumnNames, Observation};

    fn table() -> ObservationTable {
        ObservationTable::new(
            ColumnNames::default(),
            vec![
                Observation::new("Hummingbird", "h1", 140.0),
                Observation::new("Hummingbird", "h2", 150.0),
                Observation::new("Bat", "b1", 60.0),
                Observation::new("Moth", "m1", f64::NAN),
            ],
        )
    }

    fn cells(table: &Table, row: usize) -> Vec<String> {
        table.row(row).unwrap().cell_iter().map(|c| c.content()).collect()
    }

    fn header(table: &Table) -> Vec<String> {
        table.header().unwrap().cell_iter().map(|c| c.content()).collect()
    }

    #[test]
    fn head_lists_header_and_rows() {
        let out = head(&table(), 2);
        assert_eq!(header(&out), ["", "Species", "Individual", "Peak_Power"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(cells(&out, 0), ["0", "Hummingbird", "h1", "140.000000"]);
        assert_eq!(cells(&out, 1)[3], "150.000000");
        assert!(out.to_string().contains("Hummingbird"));
    }

    #[test]
    fn info_counts_rows_groups_and_missing() {
        let t = table();
        let out = info(&t, &aggregate(&t.rows));
        assert_eq!(out, "Rows: 4\nGroups: 3\nNon-finite values: 1");
    }

    #[test]
    fn group_stats_show_nan_for_single_values() {
        let t = table();
        let out = group_stats(&aggregate(&t.rows));
        assert_eq!(out.row_count(), 3);
        // stddev 7.071068, sem = stddev / count
        assert_eq!(
            cells(&out, 0),
            ["Hummingbird", "2", "145.000000", "7.071068", "3.535534"]
        );
        let bat = cells(&out, 1);
        assert_eq!(bat[0], "Bat");
        assert_eq!(bat[3], "NaN");
        assert_eq!(bat[4], "NaN");
    }

    #[test]
    fn legend_lists_top_row_first() {
        let t = table();
        let agg = aggregate(&t.rows);
        let fig =
            FigureData::build(&agg, &Config::default(), &mut StdRng::seed_from_u64(1)).unwrap();
        let out = legend(&fig);
        assert_eq!(out.row_count(), 3);
        // default order is reversed, so the first group is drawn on top
        let top = cells(&out, 0);
        assert_eq!(top[..3], ["3", "Hummingbird", "2"]);
        assert_eq!(top[5], "diamond");
        assert_eq!(cells(&out, 2), ["1", "Moth", "1", "#B9DC3D", "#4473B0", "circle"]);
    }
}
