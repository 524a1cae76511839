use anyhow::{anyhow, Context, Result};
use geo::{MultiPolygon, Simplify};
use rayon::prelude::*;
use shapefile::dbase::{FieldValue, Record};
use shapefile::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const STATE_COLUMN: &str = "STATEFP";
pub const NAME_COLUMN: &str = "NAME";

#[derive(Debug, Clone)]
pub struct CountyGeometry {
    pub state_fp: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

pub fn load_counties(path: &Path, tolerance: f64) -> Result<Vec<CountyGeometry>> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Input geometry file has no extension"))?;

    let mut counties = match extension.as_str() {
        "shp" => load_shapefile(path)?,
        "json" | "geojson" => load_geojson(path)?,
        _ => return Err(anyhow!("Unsupported geometry format: {}", extension)),
    };

    if tolerance > 0.0 {
        simplify_all(&mut counties, tolerance);
    }

    tracing::info!("Loaded {} county geometries from {:?}", counties.len(), path);
    Ok(counties)
}

pub fn simplify_all(counties: &mut [CountyGeometry], tolerance: f64) {
    counties.par_iter_mut().for_each(|county| {
        county.geometry = county.geometry.simplify(&tolerance);
    });
}

fn character_field(record: &Record, column: &str) -> Result<Option<String>> {
    match record.get(column) {
        Some(FieldValue::Character(Some(s))) => Ok(Some(s.trim().to_string())),
        Some(FieldValue::Character(None)) => Ok(None),
        Some(_) => Err(anyhow!("Shapefile column '{}' must be a string", column)),
        None => Err(anyhow!("Column '{}' not found in Shapefile", column)),
    }
}

fn load_shapefile(path: &Path) -> Result<Vec<CountyGeometry>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut counties = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result
            .with_context(|| format!("Malformed Shapefile: {:?}", path))?;

        let (Some(state_fp), Some(name)) = (
            character_field(&record, STATE_COLUMN)?,
            character_field(&record, NAME_COLUMN)?,
        ) else {
            continue;
        };

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => continue,
        };

        counties.push(CountyGeometry { state_fp, name, geometry });
    }

    Ok(counties)
}

fn load_geojson(path: &Path) -> Result<Vec<CountyGeometry>> {
    use geojson::GeoJson;

    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut counties = Vec::new();

    for feature in collection.features {
        let property = |column: &str| {
            feature.properties.as_ref()
                .and_then(|props| props.get(column))
                .and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
        };
        let (Some(state_fp), Some(name)) = (property(STATE_COLUMN), property(NAME_COLUMN)) else {
            continue;
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let value: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;
                match value {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue,
                }
            }
            None => continue,
        };

        counties.push(CountyGeometry { state_fp, name, geometry });
    }

    Ok(counties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::dbase::{FieldName, TableWriterBuilder};
    use shapefile::{Point, Polygon, PolygonRing};
    use std::fs;

    const COUNTIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"STATEFP": "06", "NAME": "Los Angeles"},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [-118.9, 33.7], [-118.5, 33.70001], [-117.6, 33.7],
                    [-117.6, 34.8], [-118.9, 34.8], [-118.9, 33.7]
                ]]}
            },
            {
                "type": "Feature",
                "properties": {"STATEFP": "41", "NAME": "Washington"},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[
                    [-123.5, 45.3], [-122.7, 45.3], [-122.7, 45.8], [-123.5, 45.8], [-123.5, 45.3]
                ]]]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": "No State"},
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
            }
        ]
    }"#;

    #[test]
    fn geojson_counties_are_loaded_and_simplified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counties.geojson");
        fs::write(&path, COUNTIES).unwrap();

        let counties = load_counties(&path, 0.01).unwrap();
        assert_eq!(counties.len(), 2);
        assert_eq!(counties[0].state_fp, "06");
        assert_eq!(counties[0].name, "Los Angeles");
        assert_eq!(counties[1].geometry.0.len(), 1);

        // The near-collinear vertex on the southern edge is dropped.
        assert_eq!(counties[0].geometry.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counties.kml");
        fs::write(&path, "").unwrap();
        assert!(load_counties(&path, 0.0).is_err());
    }

    #[test]
    fn missing_shapefile_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_counties(&dir.path().join("counties.shp"), 0.01).is_err());
    }

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, y),
            Point::new(x, y + size),
            Point::new(x + size, y + size),
            Point::new(x + size, y),
            Point::new(x, y),
        ]))
    }

    fn record(state_fp: FieldValue, name: Option<&str>) -> Record {
        let mut record = Record::default();
        record.insert(STATE_COLUMN.to_string(), state_fp);
        record.insert(NAME_COLUMN.to_string(), FieldValue::Character(name.map(String::from)));
        record
    }

    #[test]
    fn shapefile_counties_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counties.shp");
        {
            let table = TableWriterBuilder::new()
                .add_character_field(FieldName::try_from(STATE_COLUMN).unwrap(), 2)
                .add_character_field(FieldName::try_from(NAME_COLUMN).unwrap(), 50);
            let mut writer = shapefile::Writer::from_path(&path, table).unwrap();
            let la = record(FieldValue::Character(Some("06".to_string())), Some("Los Angeles"));
            writer.write_shape_and_record(&square(-118.9, 33.7, 1.1), &la).unwrap();
            // Unnamed rows are dropped.
            let unnamed = record(FieldValue::Character(Some("06".to_string())), None);
            writer.write_shape_and_record(&square(-120.0, 35.0, 0.5), &unnamed).unwrap();
        }

        let counties = load_counties(&path, 0.0).unwrap();
        assert_eq!(counties.len(), 1);
        assert_eq!(counties[0].state_fp, "06");
        assert_eq!(counties[0].name, "Los Angeles");
        assert_eq!(counties[0].geometry.0.len(), 1);
        assert_eq!(counties[0].geometry.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn numeric_state_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counties.shp");
        {
            let table = TableWriterBuilder::new()
                .add_numeric_field(FieldName::try_from(STATE_COLUMN).unwrap(), 2, 0)
                .add_character_field(FieldName::try_from(NAME_COLUMN).unwrap(), 50);
            let mut writer = shapefile::Writer::from_path(&path, table).unwrap();
            let la = record(FieldValue::Numeric(Some(6.0)), Some("Los Angeles"));
            writer.write_shape_and_record(&square(-118.9, 33.7, 1.1), &la).unwrap();
        }

        let err = load_counties(&path, 0.0).unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }
}
