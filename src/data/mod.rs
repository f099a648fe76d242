/// Data layer: scalar arrays, atlases, loading, and validation.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv / .txt
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<f64>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ validate  │  length + hemisphere → Option<Hemisphere>
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ parcellation  │  atlas sizes, unilateral → bilateral padding
///   └──────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod parcellation;
pub mod validate;
