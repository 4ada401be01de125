//! Types de données pour le crate s57

use std::collections::btree_map;
use std::collections::BTreeMap;

use geojson::Geometry;

/// Attributs d'un enregistrement S-57 (clé -> valeur), triés par clé.
///
/// Une valeur vide n'est jamais stockée : un attribut vide et un attribut
/// absent sont indiscernables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insère un attribut. Retourne `false` si la valeur est vide (ignorée).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() {
            return false;
        }
        self.0.insert(key.into(), value);
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Première valeur présente parmi plusieurs noms d'attribut
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

/// Métadonnées d'une carte (une par fichier .000)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartInfo {
    /// Nom unique de la carte (DSID_DSNM, sinon nom du fichier sans extension)
    pub name: String,

    /// Dénominateur d'échelle (DSPM_CSCL), 0 si inconnu
    pub scale: i32,

    /// Nom du fichier source
    pub file_name: String,

    /// Date de mise à jour (DSID_UADT)
    pub updated: String,

    /// Date d'édition (DSID_ISDT)
    pub issued: String,

    /// Zoom calculé depuis l'échelle, 0 si l'échelle est inconnue
    pub zoom: i32,

    /// Emprise de la carte (M_COVR) en EPSG:4326
    pub coverage: Option<Geometry>,

    /// Attributs du DSID
    pub dsid_properties: Properties,

    /// Attributs de la couverture M_COVR
    pub chart_text: Properties,
}

/// Une feature S-57 prête à être persistée
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Nom de la couche source (ex: "SOUNDG", "BOYLAT")
    pub layer: String,

    /// Géométrie en EPSG:4326
    pub geometry: Option<Geometry>,

    /// Attributs non vides
    pub properties: Properties,

    /// Zoom minimal de visibilité
    pub min_z: i32,

    /// Zoom maximal de visibilité
    pub max_z: i32,

    /// Références LNAM vers les objets liés (ordre source)
    pub lnam_refs: Vec<String>,
}
