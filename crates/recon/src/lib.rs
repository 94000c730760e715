//! `vinrec-recon`: VIN-keyed inventory reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded CDK, D2C2 and removed-vehicle
//! tables, returns the merged, classified and ordered report.
//! No CLI or filesystem dependencies.

pub mod assemble;
pub mod config;
pub mod criteria;
pub mod currency;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod export;
pub mod join;
pub mod model;
pub mod normalize;
pub mod removal;
pub mod schema;
pub mod table;

pub use config::{CriteriaRules, DuplicatePolicy, JoinOptions, KeyTransform, ReconConfig, ReconOptions};
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use model::{MergedRecord, RawTable, ReconInput, ReconReport, ReconSummary};
pub use schema::SourceKind;
