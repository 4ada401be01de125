//! Sérialisation des attributs et géométries en JSON / GeoJSON

use geojson::{GeoJson, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::types::Properties;

/// Texte GeoJSON d'une géométrie absente
pub const EMPTY_OBJECT: &str = "{}";

/// Convertit des attributs en objet JSON (toutes les valeurs sont des chaînes)
pub fn properties_to_json(props: &Properties) -> JsonValue {
    let map: Map<String, JsonValue> = props
        .iter()
        .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
        .collect();
    JsonValue::Object(map)
}

/// Texte JSON compact des attributs
pub fn properties_to_string(props: &Properties) -> String {
    properties_to_json(props).to_string()
}

/// Texte GeoJSON d'une géométrie, `{}` si absente.
///
/// Les coordonnées gardent la précision complète d'un `f64`.
pub fn geometry_to_json(geometry: Option<&Geometry>) -> String {
    match geometry {
        Some(geom) => geom.to_string(),
        None => EMPTY_OBJECT.to_string(),
    }
}

/// Parse un texte GeoJSON en géométrie.
///
/// Retourne `None` pour un texte vide, `{}` ou tout objet qui n'est pas une
/// géométrie.
pub fn geometry_from_json(text: &str) -> Option<Geometry> {
    let text = text.trim();
    if text.is_empty() || text == EMPTY_OBJECT {
        return None;
    }
    match text.parse::<GeoJson>() {
        Ok(GeoJson::Geometry(geom)) => Some(geom),
        _ => None,
    }
}

/// Construit un point 2D, ou 3D si `z` est fourni
pub fn point(x: f64, y: f64, z: Option<f64>) -> Geometry {
    let mut position = vec![x, y];
    position.extend(z);
    Geometry::new(Value::Point(position))
}

/// Troisième coordonnée d'un point, si présente
pub fn point_z(geometry: &Geometry) -> Option<f64> {
    match &geometry.value {
        Value::Point(position) => position.get(2).copied(),
        _ => None,
    }
}
