//! Lecture d'une carte S-57 : métadonnées, couverture et features

use std::path::{Path, PathBuf};

use geojson::Geometry;
use tracing::{debug, warn};

use crate::codec::point_z;
use crate::policy::{LayerPolicy, COVERAGE_LAYER, DSID_LAYER};
use crate::source::{self, Record, VectorSource};
use crate::types::{ChartInfo, Feature, Properties};
use crate::zoom::{find_zoom, parse_leading_int, z_range};
use crate::S57Error;

/// Noms possibles des attributs DSID (nom OGR préfixé, puis nom court)
const NAME_FIELDS: [&str; 2] = ["DSID_DSNM", "DSNM"];
const SCALE_FIELDS: [&str; 1] = ["DSPM_CSCL"];
const UPDATED_FIELDS: [&str; 2] = ["DSID_UADT", "UADT"];
const ISSUED_FIELDS: [&str; 2] = ["DSID_ISDT", "ISDT"];

const SCAMIN: &str = "SCAMIN";
const SCAMAX: &str = "SCAMAX";
const LNAM_REFS: &str = "LNAM_REFS";

/// Une carte S-57 ouverte.
///
/// Un échec d'ouverture ne lève pas d'erreur : le lecteur reste dans l'état
/// fermé et tous les accesseurs retournent des valeurs vides. Vérifier
/// [`ChartReader::is_open`] avant d'exploiter les résultats.
pub struct ChartReader {
    path: PathBuf,
    source: Option<Box<dyn VectorSource>>,
    open_error: Option<S57Error>,
    policy: LayerPolicy,
}

impl ChartReader {
    /// Ouvre un fichier .000 avec le backend compilé
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match source::open(path) {
            Ok(source) => Self::with_source(path, Some(source), None),
            Err(e) => {
                debug!(path = %path.display(), "Chart not opened: {e}");
                Self::with_source(path, None, Some(e))
            }
        }
    }

    /// Lecteur adossé à une source déjà ouverte
    pub fn from_source(path: impl AsRef<Path>, source: impl VectorSource + 'static) -> Self {
        Self::with_source(path.as_ref(), Some(Box::new(source)), None)
    }

    /// Lecteur dans l'état fermé
    pub fn closed(path: impl AsRef<Path>, error: S57Error) -> Self {
        Self::with_source(path.as_ref(), None, Some(error))
    }

    fn with_source(
        path: &Path,
        source: Option<Box<dyn VectorSource>>,
        open_error: Option<S57Error>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
            open_error,
            policy: LayerPolicy::default(),
        }
    }

    /// Remplace la politique de couches
    pub fn with_policy(mut self, policy: LayerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Raison de l'échec d'ouverture, si le lecteur est fermé
    pub fn open_error(&self) -> Option<&S57Error> {
        self.open_error.as_ref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &LayerPolicy {
        &self.policy
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.source
            .as_ref()
            .map(|s| s.layer_names())
            .unwrap_or_default()
    }

    /// Premier enregistrement d'une couche
    fn first_record(&self, layer: &str) -> Option<Record> {
        self.source.as_ref()?.records(layer)?.into_iter().next()
    }

    /// Attributs du DSID (identification du jeu de données)
    pub fn dsid_properties(&self) -> Properties {
        self.first_record(DSID_LAYER)
            .map(|r| extract_properties(&r))
            .unwrap_or_default()
    }

    /// Attributs de la couverture M_COVR
    pub fn coverage_properties(&self) -> Properties {
        self.first_record(COVERAGE_LAYER)
            .map(|r| extract_properties(&r))
            .unwrap_or_default()
    }

    /// Géométrie de la couverture M_COVR
    pub fn coverage(&self) -> Option<Geometry> {
        self.first_record(COVERAGE_LAYER)?.geometry
    }

    /// Métadonnées de la carte
    pub fn chart_info(&self) -> ChartInfo {
        if !self.is_open() {
            return ChartInfo::default();
        }

        let dsid = self.dsid_properties();

        let name = dsid
            .get_any(&NAME_FIELDS)
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(&self.path));
        let scale = dsid.get_any(&SCALE_FIELDS).map(parse_leading_int).unwrap_or(0);
        let zoom = if scale > 0 { find_zoom(scale) } else { 0 };

        ChartInfo {
            name,
            scale,
            file_name: file_name(&self.path),
            updated: dsid.get_any(&UPDATED_FIELDS).unwrap_or_default().to_string(),
            issued: dsid.get_any(&ISSUED_FIELDS).unwrap_or_default().to_string(),
            zoom,
            coverage: self.coverage(),
            chart_text: self.coverage_properties(),
            dsid_properties: dsid,
        }
    }

    /// Features d'une couche (vide pour une couche exclue)
    pub fn layer_features(&self, layer: &str) -> Vec<Feature> {
        let Some(source) = self.source.as_ref() else {
            return Vec::new();
        };
        if self.policy.is_excluded(layer) {
            return Vec::new();
        }
        let Some(records) = source.records(layer) else {
            return Vec::new();
        };

        let total = records.len();
        let features: Vec<Feature> = records
            .into_iter()
            .filter_map(|record| self.build_feature(layer, record))
            .collect();

        if features.len() < total {
            debug!(
                layer,
                skipped = total - features.len(),
                "Records without geometry skipped"
            );
        }

        features
    }

    /// Toutes les features, couche par couche dans l'ordre de la source
    pub fn all_features(&self) -> Vec<Feature> {
        let mut all = Vec::new();
        self.for_each_feature(|f| all.push(f));
        all
    }

    /// Parcourt les features sans les accumuler
    pub fn for_each_feature<F: FnMut(Feature)>(&self, mut callback: F) {
        for layer in self.layer_names() {
            if self.policy.is_excluded(&layer) {
                continue;
            }
            for feature in self.layer_features(&layer) {
                callback(feature);
            }
        }
    }

    fn build_feature(&self, layer: &str, record: Record) -> Option<Feature> {
        let mut properties = extract_properties(&record);

        if let Some(rule) = self.policy.depth_rule(layer) {
            if let Some(depth) = record.geometry.as_ref().and_then(point_z) {
                properties.insert(rule.attribute.clone(), rule.format(depth));
            }
        }

        let scamin = properties.get(SCAMIN).map(parse_leading_int).unwrap_or(0);
        let scamax = properties.get(SCAMAX).map(parse_leading_int).unwrap_or(0);
        let (min_z, max_z) = z_range(scamin, scamax);

        let lnam_refs = record
            .field(LNAM_REFS)
            .and_then(|v| v.as_list())
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let geometry = record.geometry?;

        Some(Feature {
            layer: layer.to_string(),
            geometry: Some(geometry),
            properties,
            min_z,
            max_z,
            lnam_refs,
        })
    }
}

impl std::fmt::Debug for ChartReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartReader")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("open_error", &self.open_error)
            .finish()
    }
}

/// Attributs renseignés d'un enregistrement (non nuls, non vides)
pub fn extract_properties(record: &Record) -> Properties {
    let mut props = Properties::new();
    for (name, value) in &record.fields {
        if let Some(text) = value.as_text() {
            props.insert(name.clone(), text);
        }
    }
    props
}

fn file_stem(path: &Path) -> String {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem.to_string(),
        None => {
            warn!(path = %path.display(), "Chart path has no file stem");
            String::new()
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
