//! Data sources other than a catalog file.
//!
//! - `synthetic`: seeded synthetic aftershock catalogs (`omori simulate`)

pub mod synthetic;

pub use synthetic::{SyntheticCatalog, generate_catalog, write_catalog_csv};
