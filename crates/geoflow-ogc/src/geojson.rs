//! GeoJSON feature collection reprojection.

use serde_json::{json, Value};
use tracing::debug;

use crate::client::OgcClient;
use crate::error::{OgcError, Result};
use crate::srs::{parse_epsg, transform_point};

/// SRID assumed when a collection declares no `crs`.
const DEFAULT_SRID: i32 = 4326;

/// Reproject every geometry of a feature collection to `to_srid`.
///
/// The source SRID is read from `crs.properties.name`; a collection without a
/// `crs` member is taken to be EPSG:4326 and gets one. A collection already in
/// the target SRID is returned unchanged.
pub fn transform_geojson(mut collection: Value, to_srid: i32) -> Result<Value> {
    if !collection.is_object() {
        return Err(OgcError::unparseable("GeoJSON", "expected an object"));
    }

    let crs_name = collection
        .pointer("/crs/properties/name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let from_srid = match &crs_name {
        Some(name) => parse_epsg(name)
            .ok_or_else(|| OgcError::unparseable("GeoJSON", format!("crs name '{name}'")))?,
        None => {
            collection["crs"] = crs_block(DEFAULT_SRID);
            DEFAULT_SRID
        }
    };

    if from_srid == to_srid {
        return Ok(collection);
    }

    if let Some(features) = collection.get_mut("features").and_then(Value::as_array_mut) {
        for feature in features {
            if let Some(geometry) = feature.get_mut("geometry") {
                transform_geometry(geometry, from_srid, to_srid)?;
            }
        }
    }

    if let Some(name) = crs_name {
        let renamed = name.replacen(&from_srid.to_string(), &to_srid.to_string(), 1);
        collection["crs"]["properties"]["name"] = Value::String(renamed);
    } else {
        collection["crs"] = crs_block(to_srid);
    }

    debug!(from_srid, to_srid, "reprojected feature collection");
    Ok(collection)
}

/// Fetch a feature collection and reproject it.
///
/// Returns `Ok(None)` when the document cannot be fetched.
pub async fn fetch_and_transform(
    client: &OgcClient,
    url: &str,
    to_srid: i32,
) -> Result<Option<Value>> {
    let Some(body) = client.fetch(url).await else {
        return Ok(None);
    };
    let collection: Value = serde_json::from_str(&body)
        .map_err(|e| OgcError::unparseable("GeoJSON", e.to_string()))?;
    transform_geojson(collection, to_srid).map(Some)
}

/// The `crs` member naming an EPSG code.
pub fn crs_block(srid: i32) -> Value {
    json!({
        "type": "name",
        "properties": { "name": format!("urn:ogc:def:crs:EPSG::{srid}") }
    })
}

fn transform_geometry(geometry: &mut Value, from: i32, to: i32) -> Result<()> {
    if let Some(members) = geometry.get_mut("geometries").and_then(Value::as_array_mut) {
        for member in members {
            transform_geometry(member, from, to)?;
        }
        return Ok(());
    }
    if let Some(coordinates) = geometry.get_mut("coordinates") {
        transform_coordinates(coordinates, from, to)?;
    }
    Ok(())
}

/// Walk nested coordinate arrays down to positions.
fn transform_coordinates(value: &mut Value, from: i32, to: i32) -> Result<()> {
    let Some(items) = value.as_array_mut() else {
        return Ok(());
    };

    let is_position = items.len() >= 2 && items.iter().all(Value::is_number);
    if !is_position {
        for item in items {
            transform_coordinates(item, from, to)?;
        }
        return Ok(());
    }

    let x = items[0].as_f64().unwrap_or_default();
    let y = items[1].as_f64().unwrap_or_default();
    let [tx, ty] = transform_point([x, y], from, to)?;
    items[0] = json!(tx);
    items[1] = json!(ty);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(crs: Option<&str>) -> Value {
        let mut value = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [33.0, 0.0]}},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                }}
            ]
        });
        if let Some(name) = crs {
            value["crs"] = json!({"type": "name", "properties": {"name": name}});
        }
        value
    }

    #[test]
    fn test_same_srid_is_unchanged() {
        let input = collection(Some("urn:ogc:def:crs:EPSG::3857"));
        let output = transform_geojson(input.clone(), 3857).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_missing_crs_defaults_to_wgs84() {
        let output = transform_geojson(collection(None), 3857).unwrap();
        assert_eq!(output["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::3857");
        let x = output["features"][0]["geometry"]["coordinates"][0]
            .as_f64()
            .unwrap();
        assert!((x - 3_673_543.2).abs() < 1.0);
    }

    #[test]
    fn test_nested_coordinates_transformed() {
        let output = transform_geojson(collection(Some("EPSG:4326")), 3857).unwrap();
        assert_eq!(output["crs"]["properties"]["name"], "EPSG:3857");
        let ring = &output["features"][1]["geometry"]["coordinates"][0];
        let corner = ring[2][0].as_f64().unwrap();
        assert!((corner - 111_319.49).abs() < 0.01);
    }

    #[test]
    fn test_geometry_collection() {
        let mut input = collection(Some("EPSG:4326"));
        input["features"][0]["geometry"] = json!({
            "type": "GeometryCollection",
            "geometries": [{"type": "Point", "coordinates": [1.0, 0.0]}]
        });
        let output = transform_geojson(input, 3857).unwrap();
        let x = output["features"][0]["geometry"]["geometries"][0]["coordinates"][0]
            .as_f64()
            .unwrap();
        assert!((x - 111_319.49).abs() < 0.01);
    }

    #[test]
    fn test_unsupported_target() {
        let err = transform_geojson(collection(Some("EPSG:4326")), 2056).unwrap_err();
        assert!(matches!(err, OgcError::UnsupportedSrid(2056)));
    }
}
