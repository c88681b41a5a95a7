/*!
Region feed ingestion.

Feeds are GeoJSON `FeatureCollection`s published by different sources, so the
same property shows up under several names. Every alias is resolved here;
nothing downstream looks at raw property names.
*/

use geo::{LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zipcover_structures::RegionCode;

use crate::error::{SpatialError, SpatialResult};

const CODE_KEYS: &[&str] = &["zip", "ZIP_CODE", "zip_code", "ZIP"];
const LABEL_KEYS: &[&str] = &["city", "PO_NAME", "po_name", "name"];
const ADMIN_KEYS: &[&str] = &["STATE", "state"];

/// One feature with its properties already normalized
///
/// `code` is not validated here; the catalog decides what to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFeature {
    pub code: String,
    pub label: String,
    pub admin_area: String,
    /// `None` when the feature had no usable Polygon/MultiPolygon geometry
    pub geometry: Option<MultiPolygon<f64>>,
}

/// Outcome of loading several feeds
#[derive(Debug, Default)]
pub struct FeedLoadReport {
    pub features: Vec<FeedFeature>,
    pub loaded_feeds: Vec<PathBuf>,
    /// Feeds that could not be read or parsed, with the reason
    pub failed_feeds: Vec<(PathBuf, String)>,
}

impl FeedLoadReport {
    pub fn has_failures(&self) -> bool {
        !self.failed_feeds.is_empty()
    }
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

/// Parse a GeoJSON `FeatureCollection`
///
/// # Errors
///
/// Returns `SpatialError::MalformedFeed` if the text is not JSON or not a
/// `FeatureCollection`. Individual features with bad geometry are kept with
/// `geometry: None`.
pub fn parse_feed(json: &str) -> SpatialResult<Vec<FeedFeature>> {
    let raw: RawCollection = serde_json::from_str(json)?;
    if raw.kind != "FeatureCollection" {
        return Err(SpatialError::MalformedFeed(format!(
            "expected FeatureCollection, found {}",
            raw.kind
        )));
    }

    let features: Vec<FeedFeature> = raw.features.into_iter().map(normalize_feature).collect();
    debug!(target: "zipcover-spatial", "Parsed {} feed features", features.len());
    Ok(features)
}

/// Read and parse a feed file
pub fn read_feed(path: impl AsRef<Path>) -> SpatialResult<Vec<FeedFeature>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SpatialError::FeedIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feed(&text)
}

/// Load several feeds, keeping whatever could be read
///
/// A feed that fails is logged once at warn level and listed in
/// `failed_feeds`; the others still contribute their features.
pub fn load_feeds<P: AsRef<Path>>(paths: &[P]) -> FeedLoadReport {
    let mut report = FeedLoadReport::default();

    for path in paths {
        let path = path.as_ref();
        match read_feed(path) {
            Ok(features) => {
                info!(
                    target: "zipcover-spatial",
                    "Loaded {} features from {}",
                    features.len(),
                    path.display()
                );
                report.features.extend(features);
                report.loaded_feeds.push(path.to_path_buf());
            }
            Err(e) => {
                warn!(target: "zipcover-spatial", "⚠️ Region feed {} unavailable: {}", path.display(), e);
                report.failed_feeds.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    report
}

fn normalize_feature(raw: RawFeature) -> FeedFeature {
    let props = raw.properties.unwrap_or_default();
    FeedFeature {
        code: first_code(&props),
        label: first_text(&props, LABEL_KEYS),
        admin_area: first_text(&props, ADMIN_KEYS),
        geometry: raw.geometry.and_then(convert_geometry),
    }
}

/// First alias holding a non-empty value; numbers are zero-padded
fn first_code(props: &Map<String, Value>) -> String {
    for key in CODE_KEYS {
        let text = match props.get(*key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => number_to_code(n),
            _ => String::new(),
        };
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}

fn number_to_code(n: &serde_json::Number) -> String {
    let value = n
        .as_u64()
        .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64));
    match value {
        Some(v) => RegionCode::from_number(v)
            .map(String::from)
            .unwrap_or_else(|_| v.to_string()),
        None => n.to_string(),
    }
}

fn first_text(props: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| props.get(*key))
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn convert_geometry(value: Value) -> Option<MultiPolygon<f64>> {
    let polygons = match serde_json::from_value::<RawGeometry>(value).ok()? {
        RawGeometry::Polygon { coordinates } => vec![convert_polygon(coordinates)?],
        RawGeometry::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .map(convert_polygon)
            .collect::<Option<Vec<_>>>()?,
        RawGeometry::Unsupported => return None,
    };
    Some(MultiPolygon::new(polygons))
}

fn convert_polygon(rings: Vec<Vec<Vec<f64>>>) -> Option<Polygon<f64>> {
    let mut rings = rings.into_iter().map(convert_ring);
    let exterior = rings.next()??;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

// Extra ordinates (altitude) are dropped
fn convert_ring(positions: Vec<Vec<f64>>) -> Option<LineString<f64>> {
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(LineString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FEED: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"ZIP_CODE": "60452", "PO_NAME": "Oak Forest", "state": "IL"},
             "geometry": {"type": "Polygon", "coordinates": [[[-87.8,41.58],[-87.75,41.58],[-87.75,41.63],[-87.8,41.63],[-87.8,41.58]]]}},
            {"type": "Feature",
             "properties": {"zip": 1001, "city": "Agawam", "STATE": "MA"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[-72.6,42.0,12.5],[-72.5,42.0,12.5],[-72.5,42.1,12.5],[-72.6,42.0,12.5]]]]}},
            {"type": "Feature",
             "properties": {"zip": "", "ZIP_CODE": "46307"},
             "geometry": {"type": "Point", "coordinates": [-87.3, 41.4]}},
            {"type": "Feature", "properties": null, "geometry": null}
        ]
    }"#;

    #[test]
    fn test_aliases_normalized() {
        let features = parse_feed(FEED).unwrap();
        assert_eq!(features.len(), 4);

        assert_eq!(features[0].code, "60452");
        assert_eq!(features[0].label, "Oak Forest");
        assert_eq!(features[0].admin_area, "IL");

        assert_eq!(features[1].code, "01001");
        assert_eq!(features[1].label, "Agawam");
        assert_eq!(features[1].admin_area, "MA");

        // empty `zip` falls through to the next alias
        assert_eq!(features[2].code, "46307");
        assert_eq!(features[3].code, "");
    }

    #[test]
    fn test_numeric_codes() {
        let num = |v: serde_json::Value| match v {
            Value::Number(n) => number_to_code(&n),
            _ => unreachable!(),
        };
        assert_eq!(num(serde_json::json!(501)), "00501");
        assert_eq!(num(serde_json::json!(60452.0)), "60452");
        // out of range stays as written and is rejected later by the catalog
        assert_eq!(num(serde_json::json!(123456)), "123456");
        assert_eq!(num(serde_json::json!(12.5)), "12.5");
    }

    #[test]
    fn test_geometry_kinds() {
        let features = parse_feed(FEED).unwrap();
        assert_eq!(features[0].geometry.as_ref().map(|g| g.0.len()), Some(1));
        assert_eq!(features[1].geometry.as_ref().map(|g| g.0.len()), Some(1));
        assert!(features[2].geometry.is_none());
        assert!(features[3].geometry.is_none());
    }

    #[test]
    fn test_rejects_non_collection() {
        assert!(matches!(
            parse_feed(r#"{"type": "Feature", "features": []}"#),
            Err(SpatialError::MalformedFeed(_))
        ));
        assert!(parse_feed("not json").is_err());
    }

    #[test]
    fn test_load_feeds_keeps_partial_data() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        good.write_all(FEED.as_bytes()).unwrap();
        let missing = PathBuf::from("/nonexistent/zipcover/feed.geojson");

        let report = load_feeds(&[good.path().to_path_buf(), missing.clone()]);
        assert_eq!(report.features.len(), 4);
        assert_eq!(report.loaded_feeds.len(), 1);
        assert_eq!(report.failed_feeds.len(), 1);
        assert_eq!(report.failed_feeds[0].0, missing);
        assert!(report.has_failures());
    }
}
