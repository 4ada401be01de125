//! Sources de données vectorielles
//!
//! Le format binaire S-57 (ISO 8211) n'est pas décodé ici : une source
//! expose des couches, des enregistrements avec leurs attributs, et des
//! géométries déjà reprojetées en EPSG:4326.

#[cfg(feature = "gdal")]
pub mod gdal;
pub mod memory;

use std::path::Path;

use geojson::Geometry;

use crate::S57Error;

pub use memory::MemorySource;

/// Valeur brute d'un attribut
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Champ jamais renseigné
    Unset,
    /// Champ explicitement nul
    Null,
    /// Valeur scalaire sous sa forme texte
    Value(String),
    /// Liste de chaînes (ex: LNAM_REFS)
    List(Vec<String>),
}

impl FieldValue {
    /// Représentation texte, `None` si non renseigné, nul ou vide.
    ///
    /// Les listes suivent la forme texte d'OGR : `(2:a,b)`.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            FieldValue::Unset | FieldValue::Null => return None,
            FieldValue::Value(v) => v.clone(),
            FieldValue::List(items) if items.is_empty() => return None,
            FieldValue::List(items) => format!("({}:{})", items.len(), items.join(",")),
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// Un enregistrement d'une couche
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Attributs dans l'ordre de définition de la couche
    pub fields: Vec<(String, FieldValue)>,

    /// Géométrie en EPSG:4326
    pub geometry: Option<Geometry>,
}

impl Record {
    pub fn new(geometry: Option<Geometry>) -> Self {
        Self {
            fields: Vec::new(),
            geometry,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Accès en lecture à un jeu de données vectoriel
pub trait VectorSource {
    /// Noms des couches, dans l'ordre de la source
    fn layer_names(&self) -> Vec<String>;

    /// Enregistrements d'une couche, `None` si la couche n'existe pas
    fn records(&self, layer: &str) -> Option<Vec<Record>>;
}

/// Backend de lecture des fichiers compilé (`None` : source en mémoire seulement)
pub const BACKEND: Option<&str> = if cfg!(feature = "gdal") { Some("gdal") } else { None };

/// Ouvre un fichier de carte avec le backend compilé
#[cfg(feature = "gdal")]
pub fn open(path: &Path) -> Result<Box<dyn VectorSource>, S57Error> {
    Ok(Box::new(gdal::GdalSource::open(path)?))
}

/// Ouvre un fichier de carte avec le backend compilé
#[cfg(not(feature = "gdal"))]
pub fn open(path: &Path) -> Result<Box<dyn VectorSource>, S57Error> {
    if !path.is_file() {
        return Err(S57Error::open(path.display().to_string(), "no such file"));
    }
    Err(S57Error::NoBackend)
}
