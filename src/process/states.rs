use crate::error::{ReportError, Result};
use crate::ingest::Column;
use crate::process::NormalizedOrders;
use serde::{Serialize, Serializer};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use tracing::{debug, info};

/// The 50 US state codes.
pub const US_STATE_CODES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

/// Two uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateCode(String);

impl StateCode {
    /// Uppercases and trims `raw`; `None` unless two ASCII letters remain.
    pub fn normalize(raw: &str) -> Option<Self> {
        let s = raw.trim().to_ascii_uppercase();
        (s.len() == 2 && s.bytes().all(|b| b.is_ascii_uppercase())).then_some(StateCode(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StateCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Allow-list of recognized billing-province codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCodes(BTreeSet<StateCode>);

impl Default for StateCodes {
    fn default() -> Self {
        Self::us_states()
    }
}

impl StateCodes {
    pub fn us_states() -> Self {
        Self(
            US_STATE_CODES
                .iter()
                .filter_map(|c| StateCode::normalize(c))
                .collect(),
        )
    }

    /// Build a custom allow-list; every entry must be a two-letter code.
    pub fn from_codes<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in codes {
            let raw = raw.as_ref();
            let code = StateCode::normalize(raw).ok_or_else(|| {
                ReportError::Unclassified(format!("invalid state code {:?} in allow-list", raw))
            })?;
            set.insert(code);
        }
        Ok(Self(set))
    }

    /// The recognized code for a raw province value, if any.
    pub fn recognize(&self, raw: &str) -> Option<&StateCode> {
        let code = StateCode::normalize(raw)?;
        self.0.get(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAggregate {
    pub state_code: StateCode,
    pub shipment_count: usize,
    /// `shipment_count / max(shipment_count)`, in [0, 1].
    pub normalized_count: f64,
}

/// Count shipments per recognized state, sorted by code.
///
/// Orders whose province is blank or not on the allow-list are left out here
/// but still count for the overall and monthly metrics.
#[tracing::instrument(level = "info", skip_all, fields(orders = orders.len()))]
pub fn state_aggregates(
    orders: &NormalizedOrders,
    recognized: &StateCodes,
) -> Result<Vec<StateAggregate>> {
    orders.columns.require(Column::BillingProvince)?;

    let mut counts: BTreeMap<&StateCode, usize> = BTreeMap::new();
    let mut dropped = 0usize;
    for o in &orders.orders {
        match o
            .billing_province
            .as_deref()
            .and_then(|p| recognized.recognize(p))
        {
            Some(code) => *counts.entry(code).or_default() += 1,
            None => dropped += 1,
        }
    }
    debug!(dropped, "orders without a recognized state");

    let Some(max) = counts.values().copied().max() else {
        return Err(ReportError::NoStateData);
    };
    info!(states = counts.len(), max, "aggregated shipments by state");

    Ok(counts
        .into_iter()
        .map(|(code, n)| StateAggregate {
            state_code: code.clone(),
            shipment_count: n,
            normalized_count: n as f64 / max as f64,
        })
        .collect())
}
