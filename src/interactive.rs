use crate::join::JoinedCounty;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const CENTER: [f64; 2] = [37.8, -96.9];
const ZOOM: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct CountyLayer {
    pub name: String,
    pub state_name: String,
    pub count: usize,
    pub tooltip: String,
    pub geometry: Geometry,
}

pub fn tooltip(county: &str, state: &str, count: usize) -> String {
    format!("{}, {} - Houses found: {}", county, state, count)
}

pub fn build_layers(joined: &[JoinedCounty<'_>]) -> Vec<CountyLayer> {
    joined
        .iter()
        .map(|j| CountyLayer {
            name: j.geometry.name.clone(),
            state_name: j.state_name.to_string(),
            count: j.count,
            tooltip: tooltip(&j.geometry.name, j.state_name, j.count),
            geometry: Geometry::new(geojson::Value::from(&j.geometry.geometry)),
        })
        .collect()
}

pub fn to_feature_collection(layers: &[CountyLayer]) -> FeatureCollection {
    let features = layers
        .iter()
        .map(|layer| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), JsonValue::from(layer.name.clone()));
            properties.insert("state".to_string(), JsonValue::from(layer.state_name.clone()));
            properties.insert("count".to_string(), JsonValue::from(layer.count));
            properties.insert("tooltip".to_string(), JsonValue::from(layer.tooltip.clone()));
            Feature {
                bbox: None,
                geometry: Some(layer.geometry.clone()),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn map_script(collection: &FeatureCollection, max_count: usize) -> Result<String> {
    // `</` inside inline script data would close the tag early.
    let data = serde_json::to_string(collection)
        .context("Failed to serialize county layers")?
        .replace("</", "<\\/");

    Ok(format!(
        r#"var map = L.map('map').setView([{lat}, {lon}], {zoom});
L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    maxZoom: 18,
    attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
var maxCount = {max_count};
var counties = {data};
L.geoJSON(counties, {{
    style: function (feature) {{
        var c = feature.properties.count;
        return {{
            color: '#555',
            weight: 0.5,
            fillColor: '#e34a33',
            fillOpacity: maxCount > 0 ? 0.1 + 0.7 * (c / maxCount) : 0.1
        }};
    }},
    onEachFeature: function (feature, layer) {{
        layer.bindTooltip(feature.properties.tooltip);
    }}
}}).addTo(map);
"#,
        lat = CENTER[0],
        lon = CENTER[1],
        zoom = ZOOM,
        max_count = max_count,
        data = data,
    ))
}

pub fn render_document(layers: &[CountyLayer], title: &str) -> Result<Markup> {
    let max_count = layers.iter().map(|l| l.count).max().unwrap_or(0);
    let script = map_script(&to_feature_collection(layers), max_count)?;

    Ok(html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(LEAFLET_CSS);
                style { (PreEscaped("html, body, #map { height: 100%; margin: 0; }")) }
            }
            body {
                div id="map" {}
                script src=(LEAFLET_JS) {}
                script { (PreEscaped(script)) }
            }
        }
    })
}

pub fn write_map(path: &Path, layers: &[CountyLayer], title: &str) -> Result<()> {
    let document = render_document(layers, title)?;
    fs::write(path, document.into_string())
        .with_context(|| format!("Failed to write map: {:?}", path))?;
    tracing::info!("Wrote {} county layers to {:?}", layers.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SearchOutcome;
    use crate::geometry::CountyGeometry;
    use crate::join::join_counts;
    use crate::types::CountyKey;
    use geo::{polygon, MultiPolygon};

    fn square(state_fp: &str, name: &str, x: f64) -> CountyGeometry {
        CountyGeometry {
            state_fp: state_fp.to_string(),
            name: name.to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: 30.0),
                (x: x + 1.0, y: 30.0),
                (x: x + 1.0, y: 31.0),
                (x: x, y: 31.0),
            ]]),
        }
    }

    fn layers() -> Vec<CountyLayer> {
        let mut outcome = SearchOutcome::default();
        outcome.counts.insert(CountyKey::new("California", "Los Angeles"), 7);
        let counties = vec![
            square("06", "Los Angeles", -118.0),
            square("06", "Kern", -119.0),
            square("99", "Nowhere", -100.0),
        ];
        build_layers(&join_counts(&outcome, &counties))
    }

    #[test]
    fn every_geometry_becomes_a_layer() {
        let layers = layers();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].tooltip, "Los Angeles, California - Houses found: 7");
        assert_eq!(layers[1].tooltip, "Kern, California - Houses found: 0");
        assert_eq!(layers[2].tooltip, "Nowhere, Unknown - Houses found: 0");
    }

    #[test]
    fn feature_collection_carries_counts() {
        let collection = to_feature_collection(&layers());
        assert_eq!(collection.features.len(), 3);
        let props = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props["count"], JsonValue::from(7));
        assert_eq!(props["state"], JsonValue::from("California"));
    }

    #[test]
    fn document_embeds_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.html");
        write_map(&path, &layers(), "Listings by county").unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Listings by county</title>"));
        assert!(html.contains("Kern, California - Houses found: 0"));
        assert!(html.contains("var maxCount = 7;"));
        assert!(html.contains(LEAFLET_JS));
    }

    #[test]
    fn script_data_cannot_close_the_tag() {
        let mut layers = layers();
        layers[0].tooltip = "</script><b>".to_string();
        let html = render_document(&layers, "t").unwrap().into_string();
        assert!(!html.contains("</script><b>"));
    }
}
