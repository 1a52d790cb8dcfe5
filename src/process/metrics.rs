use crate::error::Result;
use crate::ingest::Column;
use crate::process::NormalizedOrders;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Running mean that skips missing values. Empty -> NaN.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    pub(crate) fn push(&mut self, v: Option<f64>) {
        if let Some(v) = v.filter(|v| !v.is_nan()) {
            self.sum += v;
            self.n += 1;
        }
    }

    pub(crate) fn value(&self) -> f64 {
        if self.n == 0 {
            f64::NAN
        } else {
            self.sum / self.n as f64
        }
    }
}

/// The three headline numbers. NaN means "cannot display".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalarMetrics {
    pub avg_items_per_order: f64,
    pub avg_order_value: f64,
    pub avg_orders_per_month: f64,
}

/// Averages over every order; orders per month is total orders over
/// distinct months present.
pub fn compute_scalar_metrics(orders: &NormalizedOrders) -> Result<ScalarMetrics> {
    orders.columns.require(Column::LineitemQuantity)?;
    orders.columns.require(Column::Total)?;

    let mut items = Mean::default();
    let mut value = Mean::default();
    let mut months = HashSet::new();
    for o in &orders.orders {
        items.push(o.line_item_quantity);
        value.push(o.total);
        months.insert(o.month);
    }

    let avg_orders_per_month = if months.is_empty() {
        f64::NAN
    } else {
        orders.len() as f64 / months.len() as f64
    };
    debug!(orders = orders.len(), months = months.len(), "scalar metrics");

    Ok(ScalarMetrics {
        avg_items_per_order: items.value(),
        avg_order_value: value.value(),
        avg_orders_per_month,
    })
}
