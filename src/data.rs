//! Data transformer: GeoJSON feature collection to a flat table of city rows.
//!
//! Invalid features are dropped silently; a missing or malformed document is
//! the caller's problem (see `assets`), not this module's.

use crate::config::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Square meters to square miles.
pub const SQ_METERS_TO_SQ_MILES: f64 = 0.00000038610215855;

/// A GeoJSON feature collection. Geometry is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A single feature with its property bag
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// One row of the chart table.
///
/// Serialized with the field names the chart specification encodes
/// (`geoid`, `name`, `pop`, `aland_m2`, `density`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRow {
    pub geoid: String,
    pub name: String,
    #[serde(rename = "pop")]
    pub population: f64,
    #[serde(rename = "aland_m2")]
    pub area_m2: f64,
    /// People per square mile
    pub density: f64,
}

impl CityRow {
    /// Build a row from raw values, computing density.
    pub fn new(geoid: impl Into<String>, name: impl Into<String>, population: f64, area_m2: f64) -> Self {
        Self {
            geoid: geoid.into(),
            name: name.into(),
            population,
            area_m2,
            density: population / (area_m2 * SQ_METERS_TO_SQ_MILES),
        }
    }
}

/// Convert every valid feature into a `CityRow`, preserving input order.
pub fn transform(collection: &FeatureCollection, fields: &FieldMap) -> Vec<CityRow> {
    collection
        .features
        .iter()
        .filter_map(|feature| row_from_properties(feature.properties.as_ref()?, fields))
        .collect()
}

fn row_from_properties(props: &Map<String, Value>, fields: &FieldMap) -> Option<CityRow> {
    let geoid = truthy_text(props.get(&fields.id)?)?;
    let name = truthy_text(props.get(&fields.name)?)?;
    let population = finite_number(props.get(&fields.population)?)?;
    let area_m2 = finite_number(props.get(&fields.area)?)?;
    Some(CityRow::new(geoid, name, population, area_m2))
}

// Identifiers are sometimes numeric in census exports.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn finite_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Sort rows by population (descending) and keep the first `n`.
///
/// The sort is stable, so equal populations keep their input order.
pub fn top_n(mut rows: Vec<CityRow>, n: usize) -> Vec<CityRow> {
    rows.sort_by(|a, b| b.population.total_cmp(&a.population));
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(features: Value) -> FeatureCollection {
        serde_json::from_value(json!({ "type": "FeatureCollection", "features": features })).unwrap()
    }

    fn feature(geoid: Value, name: Value, pop: Value, aland: Value) -> Value {
        json!({
            "type": "Feature",
            "properties": { "GEOID": geoid, "NAME": name, "Total_Pop": pop, "ALAND": aland },
            "geometry": null
        })
    }

    #[test]
    fn density_uses_square_mile_conversion() {
        let row = CityRow::new("1", "Square", 100000.0, 259000000.0);
        let expected = 1000.0;
        assert!((row.density - expected).abs() / expected < 0.005, "density {}", row.density);
        assert_eq!(row.density, 100000.0 / (259000000.0 * 0.00000038610215855));
    }

    #[test]
    fn invalid_features_are_dropped() {
        let fc = collection(json!([
            feature(json!("0820000"), json!("Denver"), json!(715522), json!(396_000_000)),
            feature(json!(""), json!("NoId"), json!(10), json!(10)),
            feature(json!("1"), json!(null), json!(10), json!(10)),
            feature(json!("2"), json!("NoPop"), json!(null), json!(10)),
            feature(json!("3"), json!("BadArea"), json!(10), json!("abc")),
            { "type": "Feature", "properties": null },
            { "type": "Feature" },
            feature(json!("4"), json!("Textual"), json!("1200"), json!(" 5000 ")),
        ]));

        let rows = transform(&fc, &FieldMap::default());
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Denver", "Textual"]);
        assert_eq!(rows[1].population, 1200.0);
        assert_eq!(rows[1].area_m2, 5000.0);
    }

    #[test]
    fn numeric_geoid_is_accepted() {
        let fc = collection(json!([feature(json!(8_020_000), json!("Denver"), json!(5), json!(7))]));
        let rows = transform(&fc, &FieldMap::default());
        assert_eq!(rows[0].geoid, "8020000");
    }

    #[test]
    fn custom_field_names() {
        let fc = collection(json!([{ "properties": { "id": "a", "city": "A", "people": 3, "land": 9 } }]));
        let fields = FieldMap {
            id: "id".into(),
            name: "city".into(),
            population: "people".into(),
            area: "land".into(),
        };
        assert_eq!(transform(&fc, &fields).len(), 1);
    }

    #[test]
    fn top_n_matches_brute_force() {
        let pops = [
            12.0, 5.0, 99.0, 41.0, 7.0, 63.0, 18.0, 2.0, 77.0, 30.0, 54.0, 8.0, 91.0, 26.0, 45.0, 3.0, 69.0, 11.0,
            84.0, 37.0,
        ];
        let rows: Vec<_> = pops
            .iter()
            .enumerate()
            .map(|(i, p)| CityRow::new(i.to_string(), format!("c{}", i), *p, 1.0))
            .collect();

        let top = top_n(rows.clone(), 15);
        assert_eq!(top.len(), 15);
        assert!(top.windows(2).all(|w| w[0].population >= w[1].population));

        let mut expected: Vec<f64> = pops.to_vec();
        expected.sort_by(|a, b| b.partial_cmp(a).unwrap());
        expected.truncate(15);
        let got: Vec<f64> = top.iter().map(|r| r.population).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn top_n_is_stable_on_ties() {
        let rows = vec![
            CityRow::new("a", "A", 10.0, 1.0),
            CityRow::new("b", "B", 20.0, 1.0),
            CityRow::new("c", "C", 10.0, 1.0),
        ];
        let ids: Vec<_> = top_n(rows, 15).into_iter().map(|r| r.geoid).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn rows_serialize_with_chart_field_names() {
        let v = serde_json::to_value(CityRow::new("g", "N", 1.0, 2.0)).unwrap();
        assert!(v.get("pop").is_some());
        assert!(v.get("aland_m2").is_some());
        assert!(v.get("geoid").is_some());
    }
}
