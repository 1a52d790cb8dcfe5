// src/report/mod.rs
pub mod render;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::geo::{join_states, Boundaries, RegionShipments, RenderHints};
use crate::ingest::OrderTable;
use crate::process::{MonthlyAggregate, MonthlyMode, OrderAggregator, ScalarMetrics, StateAggregate};
use serde::Serialize;
use tracing::{info, warn};

/// The raw head of the upload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Preview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Outcome of the state stage, which may fail on its own.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StateSection {
    Disabled,
    Failed {
        message: String,
        #[serde(skip)]
        error: ReportError,
    },
    Ready {
        aggregates: Vec<StateAggregate>,
        /// Present when a boundary dataset was supplied.
        #[serde(skip_serializing_if = "Option::is_none")]
        regions: Option<Vec<RegionShipments>>,
    },
}

impl StateSection {
    fn failed(error: ReportError) -> Self {
        StateSection::Failed {
            message: error.to_string(),
            error,
        }
    }

    pub fn error(&self) -> Option<&ReportError> {
        match self {
            StateSection::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The joined map regions, or why there are none to draw.
    pub fn regions(&self) -> std::result::Result<&[RegionShipments], &'static str> {
        match self {
            StateSection::Ready { regions: Some(r), .. } => Ok(r),
            StateSection::Ready { regions: None, .. } => Err("no geo section configured"),
            StateSection::Failed { .. } => Err("state aggregation failed"),
            StateSection::Disabled => Err("state aggregation disabled"),
        }
    }
}

/// Everything the presentation layer renders for one upload.
#[derive(Debug, Serialize)]
pub struct Report {
    pub order_count: usize,
    pub preview: Preview,
    pub scalars: ScalarMetrics,
    pub monthly_mode: MonthlyMode,
    /// Chronological; the last month may be partial.
    pub monthly: Vec<MonthlyAggregate>,
    pub states: StateSection,
}

/// Extra input for the state stage beyond the orders themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJoin<'a> {
    pub boundaries: Option<&'a Boundaries>,
    pub hints: Option<&'a RenderHints>,
}

/// Run every stage over one upload.
///
/// Timestamp, scalar and monthly failures abort the whole report. The state
/// stage runs last and its failure is kept in [`Report::states`], so the
/// sections already computed still render.
#[tracing::instrument(level = "info", skip_all, fields(rows = table.len()))]
pub fn build_report(table: &OrderTable, config: &ReportConfig, geo: GeoJoin<'_>) -> Result<Report> {
    let aggregator = OrderAggregator::from_config(config)?;

    let orders = aggregator.parse_timestamps(table)?;
    let scalars = aggregator.scalar_metrics(&orders)?;
    let monthly = aggregator.monthly_series(&orders)?;
    info!(months = monthly.len(), "computed overall and monthly metrics");

    let states = if !config.states.enabled {
        StateSection::Disabled
    } else {
        match aggregator.state_aggregates(&orders) {
            Ok(aggregates) => {
                let regions = geo.boundaries.map(|b| {
                    let default_hints = RenderHints::default();
                    join_states(b, &aggregates, geo.hints.unwrap_or(&default_hints))
                });
                StateSection::Ready { aggregates, regions }
            }
            Err(e) => {
                warn!(error = %e, "state section unavailable");
                StateSection::failed(e)
            }
        }
    };

    Ok(Report {
        order_count: orders.len(),
        preview: Preview {
            headers: table.headers.clone(),
            rows: table.head.clone(),
        },
        scalars,
        monthly_mode: aggregator.monthly_mode,
        monthly,
        states,
    })
}
