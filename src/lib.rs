//! `depforge` — scan a repository, infer the dependencies it actually
//! needs, and reconcile them into an auditable per-subdirectory map.
//!
//! # Flow
//! 1. Materialize the repository reference ([`materializer`]).
//! 2. Probe the result cache by content fingerprint ([`cache`]).
//! 3. Partition the tree into tagged subdirectories ([`detector`]).
//! 4. Extract imports and declared configs per subdirectory ([`analyzer`]).
//! 5. Resolve: declared merge → classification → transitive expansion →
//!    reconciliation → registry resolution → deprecation sweep
//!    ([`resolver`], fed by [`classifier`], [`rules`], [`registry`]).
//! 6. Render the report ([`report`]) and store the result in the cache.

pub mod analyzer;
pub mod cache;
pub mod classifier;
pub mod cli;
pub mod detector;
pub mod error;
pub mod materializer;
pub mod models;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod rules;
