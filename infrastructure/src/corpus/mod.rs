//! Original corpus sources

mod seed;

pub use seed::{SeedError, SeedRecord, bootstrap_seed, load_seed_file};
