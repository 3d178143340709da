/// Data layer: core types, loading, caching, filtering and export.
///
/// Architecture:
/// ```text
///  temperatura.csv        vegetacion.geojson
///        │                       │
///        ▼                       ▼
///   ┌──────────┐  parse once  ┌──────────┐
///   │  loader   │────────────▶│  cache    │  ClimateDataset, Vec<VegetationFeature>
///   └──────────┘              └──────────┘
///                                  │
///                                  ▼
///   ┌──────────┐            ┌──────────────┐
///   │  filter   │◀──────────│ ClimateView   │  borrowed, ordered subsequence
///   └──────────┘            └──────────────┘
///        │
///        ▼
///   stats (describe table) · export (CSV bytes)
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod vegetation;
