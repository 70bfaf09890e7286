/// Standard-observer layer: the CIE colour-matching tables.
///
/// Architecture:
/// ```text
///  data/<standard>.csv  (embedded at compile time)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse CSV → CmfTable, once per standard
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ CmfTable  │  Vec<CmfSample>, strictly increasing wavelengths
///   └──────────┘
/// ```
///
/// Tables are read-only after load and shared through `Arc`.

pub mod loader;
pub mod model;

pub use loader::{get_cmf_table, table};
pub use model::{CmfSample, CmfTable, Standard};
