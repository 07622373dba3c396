use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Write a synthetic peak-power table for trying out rusty-violin.
///
/// The output is tab-separated unless the path ends in `.parquet`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Output file
    #[arg(default_value = "sample_data.tsv")]
    output: PathBuf,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// (species, individuals, mean W/kg, standard deviation)
const SPECIES: [(&str, usize, f64, f64); 4] = [
    ("Hummingbird", 12, 152.0, 14.0),
    ("Swift", 9, 118.0, 11.0),
    ("Bat", 10, 74.0, 9.0),
    ("Hawkmoth", 8, 46.0, 7.0),
];

struct Row {
    species: String,
    individual: String,
    peak_power: f64,
}

fn generate(seed: u64) -> anyhow::Result<Vec<Row>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for (species, count, mean, sd) in SPECIES {
        let dist = Normal::new(mean, sd).map_err(|e| anyhow!("{species}: {e}"))?;
        let prefix = species.chars().next().unwrap_or('x').to_ascii_lowercase();
        for i in 1..=count {
            rows.push(Row {
                species: species.to_string(),
                individual: format!("{prefix}{i}"),
                // one decimal, like the lab exports
                peak_power: (dist.sample(&mut rng).max(0.0) * 10.0).round() / 10.0,
            });
        }
    }
    Ok(rows)
}

fn write_tsv(path: &Path, rows: &[Row]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    writer.write_record(["Species", "Individual", "Peak_Power"])?;
    for row in rows {
        writer.write_record([
            row.species.as_str(),
            row.individual.as_str(),
            row.peak_power.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> anyhow::Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Species", DataType::Utf8, false),
        Field::new("Individual", DataType::Utf8, false),
        Field::new("Peak_Power", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.species.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.individual.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.peak_power))),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let rows = generate(args.seed)?;

    let is_parquet = args
        .output
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&args.output, &rows)
    } else {
        write_tsv(&args.output, &rows)
    }
    .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} observations of {} species to {}",
        rows.len(),
        SPECIES.len(),
        args.output.display()
    );
    Ok(())
}
