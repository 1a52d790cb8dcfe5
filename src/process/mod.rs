// src/process/mod.rs
pub mod date_parser;
pub mod metrics;
pub mod month;
pub mod monthly;
pub mod states;

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::ingest::{Column, Columns, OrderTable};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub use date_parser::{parse_created_at, TimestampGrammar};
pub use metrics::{compute_scalar_metrics, ScalarMetrics};
pub use month::MonthKey;
pub use monthly::{monthly_series, MonthlyAggregate, MonthlyMode};
pub use states::{state_aggregates, StateAggregate, StateCode, StateCodes};

/// An order whose `Created at` has been parsed and bucketed.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedOrder {
    pub line: u64,
    pub created_at: DateTime<Utc>,
    pub month: MonthKey,
    pub line_item_quantity: Option<f64>,
    pub total: Option<f64>,
    pub billing_province: Option<String>,
}

/// Normalized orders plus the schema they came from, so later stages can
/// still report absent columns.
#[derive(Debug, Clone, Default)]
pub struct NormalizedOrders {
    pub columns: Columns,
    pub orders: Vec<NormalizedOrder>,
}

impl NormalizedOrders {
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Parse every `Created at` value. The first bad row fails the whole table.
#[tracing::instrument(level = "info", skip(table), fields(rows = table.len()))]
pub fn parse_timestamps(table: &OrderTable, grammar: TimestampGrammar) -> Result<NormalizedOrders> {
    table.columns.require(Column::CreatedAt)?;

    let mut orders = Vec::with_capacity(table.len());
    for r in &table.records {
        let created_at = parse_created_at(&r.created_at, grammar).map_err(|fault| {
            warn!(line = r.line, value = %r.created_at, ?fault, "rejecting timestamp");
            ReportError::timestamp(r.line, &r.created_at, fault)
        })?;
        orders.push(NormalizedOrder {
            line: r.line,
            month: MonthKey::of(&created_at),
            created_at,
            line_item_quantity: r.line_item_quantity,
            total: r.total,
            billing_province: r.billing_province.clone(),
        });
    }

    info!(orders = orders.len(), "normalized timestamps");
    Ok(NormalizedOrders {
        columns: table.columns,
        orders,
    })
}

/// One configured aggregation pipeline.
///
/// The timestamp grammar, monthly mode and state allow-list cover what used
/// to be separate report variants.
#[derive(Debug, Clone, Default)]
pub struct OrderAggregator {
    pub grammar: TimestampGrammar,
    pub monthly_mode: MonthlyMode,
    pub state_codes: StateCodes,
}

impl OrderAggregator {
    pub fn new(grammar: TimestampGrammar, monthly_mode: MonthlyMode, state_codes: StateCodes) -> Self {
        Self {
            grammar,
            monthly_mode,
            state_codes,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Result<Self> {
        Ok(Self::new(
            config.timestamp_grammar,
            config.monthly_mode,
            config.state_codes()?,
        ))
    }

    pub fn parse_timestamps(&self, table: &OrderTable) -> Result<NormalizedOrders> {
        parse_timestamps(table, self.grammar)
    }

    pub fn scalar_metrics(&self, orders: &NormalizedOrders) -> Result<ScalarMetrics> {
        compute_scalar_metrics(orders)
    }

    pub fn monthly_series(&self, orders: &NormalizedOrders) -> Result<Vec<MonthlyAggregate>> {
        monthly_series(orders, self.monthly_mode)
    }

    pub fn state_aggregates(&self, orders: &NormalizedOrders) -> Result<Vec<StateAggregate>> {
        state_aggregates(orders, &self.state_codes)
    }
}
