use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ColumnNames, Observation, ObservationTable};
use crate::error::{Error, Result};

/// Number of columns every input layout must provide: group, individual, value.
const EXPECTED_COLUMNS: usize = 3;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an observation table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.tsv` / `.tab` / `.txt` – tab-separated, header `group, individual, value`
/// * `.csv`                  – the same columns, comma-separated (a tab
///                              separated header is read as tab-separated)
/// * `.json`                 – `[{ "Species": "...", "Individual": "...", "Peak_Power": 1.0 }, ...]`
/// * `.parquet` / `.pq`      – first three columns of the file
///
/// Any other extension is read as tab-separated, which is what the
/// measurement exports use regardless of what they are named.
pub fn load_file(path: &Path) -> Result<ObservationTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_delimited(path, sniff_delimiter(path)?),
        _ => load_delimited(path, b'\t'),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::parse(path, format!("cannot open file: {e}")),
    })
}

/// Delimiter of a `.csv` file: tab when the header has tabs but no commas,
/// otherwise comma. Spreadsheet exports often save tab-separated text under
/// a `.csv` name.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let mut header = String::new();
    io::BufReader::new(open(path)?)
        .read_line(&mut header)
        .map_err(|e| Error::parse(path, format!("reading header: {e}")))?;
    Ok(if header.contains('\t') && !header.contains(',') {
        b'\t'
    } else {
        b','
    })
}

/// Parse a value cell. Empty cells become NaN, like a missing value in a
/// dataframe; anything else must be a number.
fn parse_value(cell: &str, path: &Path, row: usize) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|_| Error::parse(path, format!("row {row}: '{cell}' is not a number")))
}

// ---------------------------------------------------------------------------
// Delimited text loader (TSV / CSV)
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<ObservationTable> {
    let file = open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| Error::parse(path, format!("reading header: {e}")))?
        .clone();
    if headers.len() != EXPECTED_COLUMNS {
        return Err(Error::parse(
            path,
            format!(
                "expected {EXPECTED_COLUMNS} columns (group, individual, value), found {}",
                headers.len()
            ),
        ));
    }
    let columns = ColumnNames::from_headers(&headers[0], &headers[1], &headers[2]);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| Error::parse(path, format!("row {row_no}: {e}")))?;
        let value = parse_value(&record[2], path, row_no)?;
        rows.push(Observation::new(record[0].trim(), record[1].trim(), value));
    }

    Ok(ObservationTable::new(columns, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Species": "Hummingbird", "Individual": "h1", "Peak_Power": 143.2 },
///   ...
/// ]
/// ```
///
/// Column names are taken from the keys of the first record, in document
/// order.
fn load_json(path: &Path) -> Result<ObservationTable> {
    let file = open(path)?;
    let root: JsonValue = serde_json::from_reader(io::BufReader::new(file))
        .map_err(|e| Error::parse(path, format!("parsing JSON: {e}")))?;

    let records = root
        .as_array()
        .ok_or_else(|| Error::parse(path, "expected top-level JSON array"))?;

    let Some(first) = records.first() else {
        return Ok(ObservationTable::new(ColumnNames::default(), Vec::new()));
    };
    let keys: Vec<String> = first
        .as_object()
        .ok_or_else(|| Error::parse(path, "row 0 is not a JSON object"))?
        .keys()
        .cloned()
        .collect();
    if keys.len() != EXPECTED_COLUMNS {
        return Err(Error::parse(
            path,
            format!("expected {EXPECTED_COLUMNS} keys per record, found {}", keys.len()),
        ));
    }
    let columns = ColumnNames::from_headers(&keys[0], &keys[1], &keys[2]);

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| Error::parse(path, format!("row {i} is not a JSON object")))?;
        let field = |key: &str| {
            obj.get(key)
                .ok_or_else(|| Error::parse(path, format!("row {i}: missing '{key}'")))
        };

        let group = json_to_label(field(keys[0].as_str())?);
        let individual = json_to_label(field(keys[1].as_str())?);
        let value = match field(keys[2].as_str())? {
            JsonValue::Null => f64::NAN,
            JsonValue::String(s) => parse_value(s, path, i)?,
            other => other
                .as_f64()
                .ok_or_else(|| Error::parse(path, format!("row {i}: value is not a number")))?,
        };
        rows.push(Observation::new(group, individual, value));
    }

    Ok(ObservationTable::new(columns, rows))
}

fn json_to_label(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding observations.
///
/// Expected schema: at least three columns, of which the first three are
/// used in order:
/// - group: Utf8 / LargeUtf8 (integers are formatted as labels)
/// - individual: Utf8 / LargeUtf8 / integer
/// - value: Float64 / Float32 / Int64 / Int32 (nulls read as NaN)
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<ObservationTable> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::parse(path, format!("reading parquet metadata: {e}")))?;
    let reader = builder
        .build()
        .map_err(|e| Error::parse(path, format!("building parquet reader: {e}")))?;

    let mut columns = None;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch =
            batch_result.map_err(|e| Error::parse(path, format!("reading record batch: {e}")))?;
        let schema = batch.schema();
        if schema.fields().len() < EXPECTED_COLUMNS {
            return Err(Error::parse(
                path,
                format!(
                    "expected {EXPECTED_COLUMNS} columns, found {}",
                    schema.fields().len()
                ),
            ));
        }
        if columns.is_none() {
            let name = |i: usize| schema.field(i).name().clone();
            columns = Some(ColumnNames::from_headers(&name(0), &name(1), &name(2)));
        }

        let group_col = batch.column(0);
        let id_col = batch.column(1);
        let value_col = batch.column(2);
        for row in 0..batch.num_rows() {
            let group = extract_label(group_col, row)
                .map_err(|msg| Error::parse(path, format!("row {row}: {msg}")))?;
            let individual = extract_label(id_col, row)
                .map_err(|msg| Error::parse(path, format!("row {row}: {msg}")))?;
            let value = extract_value(value_col, row)
                .map_err(|msg| Error::parse(path, format!("row {row}: {msg}")))?;
            rows.push(Observation::new(group, individual, value));
        }
    }

    Ok(ObservationTable::new(columns.unwrap_or_default(), rows))
}

// -- Parquet / Arrow helpers --

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> std::result::Result<&'a T, String> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| format!("unexpected array type {:?}", col.data_type()))
}

/// Extract a label (group or individual) from an Arrow column.
fn extract_label(col: &Arc<dyn Array>, row: usize) -> std::result::Result<String, String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    let label = match col.data_type() {
        DataType::Utf8 => downcast::<StringArray>(col)?.value(row).trim().to_string(),
        DataType::LargeUtf8 => downcast::<LargeStringArray>(col)?.value(row).trim().to_string(),
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row).to_string(),
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row).to_string(),
        other => return Err(format!("label column has unsupported type {other:?}")),
    };
    Ok(label)
}

/// Extract a numeric value from an Arrow column; nulls read as NaN.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> std::result::Result<f64, String> {
    if col.is_null(row) {
        return Ok(f64::NAN);
    }
    let value = match col.data_type() {
        DataType::Float64 => downcast::<Float64Array>(col)?.value(row),
        DataType::Float32 => f64::from(downcast::<Float32Array>(col)?.value(row)),
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row) as f64,
        DataType::Int32 => f64::from(downcast::<Int32Array>(col)?.value(row)),
        other => return Err(format!("value column has unsupported type {other:?}")),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_tab_separated_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv.txt",
            "Species \tIndividual\tPeak_Power\nA\t1\t10\nA\t2\t12\nB\t1\t5.5\n",
        );

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns.group, "Species");
        assert_eq!(table.columns.value, "Peak_Power");
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[2], Observation::new("B", "1", 5.5));
    }

    #[test]
    fn tab_separated_file_named_csv_is_sniffed() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "Species\tIndividual\tPeak_Power\nA\t1\t10\n");

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns.individual, "Individual");
        assert_eq!(table.rows, vec![Observation::new("A", "1", 10.0)]);
    }

    #[test]
    fn loads_comma_separated_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "g,id,v\nX,a,1.5\nY,b,\n");

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].value, 1.5);
        assert!(table.rows[1].value.is_nan());
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_file(&dir.path().join("nope.tsv")).unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn wrong_column_count_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "two.tsv", "Species\tPeak_Power\nA\t1\n");

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, Error::InputParse { .. }));
    }

    #[test]
    fn ragged_row_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ragged.tsv", "S\tI\tP\nA\t1\t2\nB\t3\n");

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, Error::InputParse { .. }));
    }

    #[test]
    fn non_numeric_value_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.tsv", "S\tI\tP\nA\t1\tfast\n");

        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("'fast' is not a number"), "{err}");
    }

    #[test]
    fn loads_json_records() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[
                {"Species": "A", "Individual": 1, "Peak_Power": 10},
                {"Species": "B", "Individual": 2, "Peak_Power": null}
            ]"#,
        );

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns.individual, "Individual");
        assert_eq!(table.rows[0], Observation::new("A", "1", 10.0));
        assert!(table.rows[1].value.is_nan());
    }

    #[test]
    fn loads_parquet_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Species", DataType::Utf8, false),
            Field::new("Individual", DataType::Int64, false),
            Field::new("Peak_Power", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["A", "A", "B"])),
                Arc::new(Int64Array::from(vec![1, 2, 1])),
                Arc::new(Float64Array::from(vec![Some(10.0), Some(12.0), None])),
            ],
        )
        .unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns.group, "Species");
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1], Observation::new("A", "2", 12.0));
        assert!(table.rows[2].value.is_nan());
    }
}
