/// Data layer: core types, loading, grouping, ordering and densities.
///
/// Architecture:
/// ```text
///  .tsv / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ObservationTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group by label → Aggregation (first-appearance order)
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  order    │  display order of groups → ordered indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ density   │  KDE per group → ViolinStats
///   └──────────┘
/// ```

pub mod aggregate;
pub mod density;
pub mod loader;
pub mod model;
pub mod order;
