use chrono::NaiveDate;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use log::info;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::municipality::{Boundary, Municipality};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn boundary_geometry(boundary: &Boundary) -> geojson::Geometry {
    let value = match boundary {
        Boundary::Polygon(polygon) => geojson::Value::from(polygon),
        Boundary::MultiPolygon(multi) => geojson::Value::from(multi),
    };
    geojson::Geometry::new(value)
}

/// Feature with `name`, plus `firstVisit` and `planned` only when set.
pub fn municipality_feature(municipality: &Municipality) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), JsonValue::from(municipality.name.clone()));
    if let Some(date) = municipality.first_visit {
        properties.insert(
            "firstVisit".to_string(),
            JsonValue::from(date.format(DATE_FORMAT).to_string()),
        );
    }
    if municipality.planned {
        properties.insert("planned".to_string(), JsonValue::Bool(true));
    }

    Feature {
        bbox: None,
        geometry: Some(boundary_geometry(&municipality.boundary)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn feature_collection(municipalities: &[Municipality]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: municipalities.iter().map(municipality_feature).collect(),
        foreign_members: None,
    }
}

/// Writes the municipalities as a GeoJSON FeatureCollection, replacing any existing file.
pub fn write_feature_collection(municipalities: &[Municipality], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let geojson = GeoJson::from(feature_collection(municipalities));
    fs::write(output_path, geojson.to_string()).map_err(|e| Error::io(output_path, e))?;

    info!(
        "✓ Wrote {} municipalities to {}",
        municipalities.len(),
        output_path.display()
    );
    Ok(())
}

/// A feature as read back from an emitted collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFeature {
    pub name: String,
    pub first_visit: Option<NaiveDate>,
    pub planned: bool,
    pub geometry: geo::Geometry<f64>,
}

pub fn read_feature_collection(path: &Path) -> Result<Vec<EmittedFeature>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| Error::parse(path, e.to_string()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(Error::parse(path, "expected a FeatureCollection"));
    };

    collection
        .features
        .into_iter()
        .map(|feature| emitted_feature(feature, path))
        .collect()
}

fn emitted_feature(feature: Feature, path: &Path) -> Result<EmittedFeature> {
    let properties = feature.properties.unwrap_or_default();

    let name = properties
        .get("name")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();

    let first_visit = match properties.get("firstVisit").and_then(JsonValue::as_str) {
        Some(text) => Some(NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
            Error::parse(path, format!("invalid firstVisit '{}': {}", text, e))
        })?),
        None => None,
    };

    let planned = properties
        .get("planned")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);

    let geometry = feature
        .geometry
        .ok_or_else(|| Error::parse(path, format!("feature '{}' has no geometry", name)))?;
    let geometry = geo::Geometry::<f64>::try_from(geometry.value)
        .map_err(|e| Error::parse(path, e.to_string()))?;

    Ok(EmittedFeature {
        name,
        first_visit,
        planned,
        geometry,
    })
}
