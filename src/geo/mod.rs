// src/geo/mod.rs
use crate::error::{ReportError, Result};
use crate::process::{StateAggregate, StateCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashMap, fs::File, io::Read, path::Path};
use tracing::{debug, info, warn};

/// Map styling derived from `normalized_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderHints {
    /// Extrusion height for the busiest state.
    pub max_elevation: f64,
    /// RGBA fill at `normalized_count == 0`.
    pub low_color: [u8; 4],
    /// RGBA fill at `normalized_count == 1`.
    pub high_color: [u8; 4],
}

impl Default for RenderHints {
    fn default() -> Self {
        Self {
            max_elevation: 100_000.0,
            low_color: [255, 255, 178, 160],
            high_color: [189, 0, 38, 220],
        }
    }
}

impl RenderHints {
    pub fn fill_color(&self, normalized: f64) -> [u8; 4] {
        let t = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
        let mut out = [0u8; 4];
        for (i, c) in out.iter_mut().enumerate() {
            let lo = self.low_color[i] as f64;
            let hi = self.high_color[i] as f64;
            *c = (lo + (hi - lo) * t).round() as u8;
        }
        out
    }

    pub fn elevation(&self, normalized: f64) -> f64 {
        if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0) * self.max_elevation
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(default)]
    properties: Map<String, Value>,
    geometry: Value,
}

/// One boundary polygon, keyed by its state identifier.
#[derive(Debug, Clone)]
pub struct Boundary {
    /// Uppercased join key.
    pub key: String,
    pub name: Option<String>,
    feature: Feature,
}

/// A geographic boundary dataset (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Default)]
pub struct Boundaries {
    regions: Vec<Boundary>,
}

fn key_of(feature: &Feature, key_property: Option<&str>) -> Option<String> {
    let raw = match key_property {
        Some(prop) => feature.properties.get(prop)?,
        None => feature.id.as_ref()?,
    };
    match raw {
        Value::String(s) => Some(s.trim().to_ascii_uppercase()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Boundaries {
    /// Parse a FeatureCollection. Features without a usable key are skipped.
    pub fn from_geojson<R: Read>(reader: R, key_property: Option<&str>) -> Result<Self> {
        let fc: FeatureCollection = serde_json::from_reader(reader)?;
        if fc.kind != "FeatureCollection" {
            return Err(ReportError::Unclassified(format!(
                "boundary dataset must be a FeatureCollection, got {:?}",
                fc.kind
            )));
        }

        let mut regions = Vec::with_capacity(fc.features.len());
        for feature in fc.features {
            let Some(key) = key_of(&feature, key_property) else {
                warn!(?key_property, "skipping boundary feature without a key");
                continue;
            };
            let name = feature
                .properties
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string);
            regions.push(Boundary { key, name, feature });
        }
        info!(regions = regions.len(), "loaded boundaries");
        Ok(Self { regions })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, key_property: Option<&str>) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            ReportError::Unclassified(format!(
                "cannot open boundaries {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_geojson(file, key_property)
    }

    pub fn regions(&self) -> &[Boundary] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// One boundary region after the join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionShipments {
    pub key: String,
    pub name: Option<String>,
    pub shipment_count: usize,
    pub normalized_count: f64,
    pub fill_color: [u8; 4],
    pub elevation: f64,
}

/// Left join of the state table onto the boundary set.
///
/// Every boundary region appears once, in dataset order; regions with no
/// orders get a zero count. States without a boundary are dropped. Unlike the
/// plain state table, this output includes zero-filled regions.
pub fn join_states(
    boundaries: &Boundaries,
    aggregates: &[StateAggregate],
    hints: &RenderHints,
) -> Vec<RegionShipments> {
    let by_code: HashMap<&str, &StateAggregate> = aggregates
        .iter()
        .map(|a| (a.state_code.as_str(), a))
        .collect();

    let regions: Vec<RegionShipments> = boundaries
        .regions
        .iter()
        .map(|b| {
            let (count, normalized) = by_code
                .get(b.key.as_str())
                .map(|a| (a.shipment_count, a.normalized_count))
                .unwrap_or((0, 0.0));
            RegionShipments {
                key: b.key.clone(),
                name: b.name.clone(),
                shipment_count: count,
                normalized_count: normalized,
                fill_color: hints.fill_color(normalized),
                elevation: hints.elevation(normalized),
            }
        })
        .collect();

    let unmatched: Vec<&StateCode> = aggregates
        .iter()
        .filter(|a| !boundaries.regions.iter().any(|b| b.key == a.state_code.as_str()))
        .map(|a| &a.state_code)
        .collect();
    if !unmatched.is_empty() {
        debug!(?unmatched, "states without a boundary region");
    }
    regions
}

/// The boundary dataset with join results merged into each feature's
/// properties, ready for a choropleth renderer.
pub fn to_feature_collection(boundaries: &Boundaries, regions: &[RegionShipments]) -> Value {
    let by_key: HashMap<&str, &RegionShipments> =
        regions.iter().map(|r| (r.key.as_str(), r)).collect();

    let features: Vec<Value> = boundaries
        .regions
        .iter()
        .filter_map(|b| {
            let r = by_key.get(b.key.as_str())?;
            let mut feature = b.feature.clone();
            let props = &mut feature.properties;
            props.insert("shipment_count".into(), Value::from(r.shipment_count));
            props.insert("normalized_count".into(), Value::from(r.normalized_count));
            props.insert("fill_color".into(), Value::from(r.fill_color.to_vec()));
            props.insert("elevation".into(), Value::from(r.elevation));
            match serde_json::to_value(feature) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(key = %b.key, error = %e, "dropping boundary feature from output");
                    None
                }
            }
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
