use crate::error::Result;
use crate::ingest::Column;
use crate::process::{metrics::Mean, month::MonthKey, NormalizedOrders};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which per-month value the line chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyMode {
    /// Mean of `Total` per month.
    #[default]
    AverageValue,
    /// Number of orders per month.
    Count,
}

impl MonthlyMode {
    pub fn label(&self) -> &'static str {
        match self {
            MonthlyMode::AverageValue => "Average Order Value",
            MonthlyMode::Count => "Order Count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: MonthKey,
    pub order_count: usize,
    /// NaN when the month has no `Total` values (or the column is absent).
    pub average_order_value: f64,
}

impl MonthlyAggregate {
    pub fn value(&self, mode: MonthlyMode) -> f64 {
        match mode {
            MonthlyMode::AverageValue => self.average_order_value,
            MonthlyMode::Count => self.order_count as f64,
        }
    }
}

/// Group orders by month, ascending. The newest month may be partial.
pub fn monthly_series(orders: &NormalizedOrders, mode: MonthlyMode) -> Result<Vec<MonthlyAggregate>> {
    if mode == MonthlyMode::AverageValue {
        orders.columns.require(Column::Total)?;
    }

    let mut buckets: BTreeMap<MonthKey, (usize, Mean)> = BTreeMap::new();
    for o in &orders.orders {
        let (count, mean) = buckets.entry(o.month).or_default();
        *count += 1;
        mean.push(o.total);
    }

    Ok(buckets
        .into_iter()
        .map(|(month, (order_count, mean))| MonthlyAggregate {
            month,
            order_count,
            average_order_value: mean.value(),
        })
        .collect())
}
