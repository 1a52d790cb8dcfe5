//! Order report pipeline: load a CSV of shop orders, normalize the
//! `Created at` timestamps, and compute the headline averages, a monthly
//! series and per-state shipment counts (optionally joined to state
//! boundaries for a choropleth).

pub mod config;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod process;
pub mod report;

pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use process::OrderAggregator;
pub use report::{build_report, GeoJoin, Report};
