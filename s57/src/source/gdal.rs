//! Backend GDAL/OGR (pilote S-57)

use std::path::Path;
use std::sync::Once;

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::{FieldValue as OgrFieldValue, Geometry as OgrGeometry, LayerAccess};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use tracing::{debug, trace, warn};

use super::{FieldValue, Record, VectorSource};
use crate::codec::geometry_from_json;
use crate::S57Error;

/// Options du pilote S-57 : pas de primitives, références LNAM, mises à
/// jour .001+ appliquées, multipoints de sondes éclatés avec profondeur en Z.
pub const S57_OPTIONS: &str = "RETURN_PRIMITIVES=OFF,\
RETURN_LINKAGES=OFF,\
LNAM_REFS=ON,\
UPDATES=APPLY,\
SPLIT_MULTIPOINT=ON,\
RECODE_BY_DSSI=ON,\
ADD_SOUNDG_DEPTH=ON";

static INIT: Once = Once::new();

/// Initialisation unique de GDAL pour le processus.
///
/// Appelée à chaque ouverture ; seul le premier appel fait le travail.
pub fn init() {
    INIT.call_once(|| {
        DriverManager::register_all();
        if let Err(e) = gdal::config::set_config_option("OGR_S57_OPTIONS", S57_OPTIONS) {
            warn!("Failed to set OGR_S57_OPTIONS: {e}");
        }
        debug!(options = S57_OPTIONS, "GDAL initialized");
    });
}

/// Jeu de données S-57 ouvert en lecture seule
pub struct GdalSource {
    dataset: Dataset,
    wgs84: SpatialRef,
}

impl GdalSource {
    pub fn open(path: &Path) -> Result<Self, S57Error> {
        init();

        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_READONLY,
            ..Default::default()
        };
        let dataset = Dataset::open_ex(path, options)
            .map_err(|e| S57Error::open(path.display().to_string(), e.to_string()))?;

        let mut wgs84 =
            SpatialRef::from_epsg(4326).map_err(|e| S57Error::Backend(e.to_string()))?;
        wgs84.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        Ok(Self { dataset, wgs84 })
    }

    /// Convertit une géométrie OGR en GeoJSON EPSG:4326
    fn to_wgs84(&self, geometry: &OgrGeometry) -> Result<geojson::Geometry, S57Error> {
        let json = match geometry.spatial_ref() {
            Some(srs) if srs != self.wgs84 => {
                let transform = CoordTransform::new(&srs, &self.wgs84)
                    .map_err(|e| S57Error::Geometry(e.to_string()))?;
                geometry
                    .transform(&transform)
                    .and_then(|g| g.json())
                    .map_err(|e| S57Error::Geometry(e.to_string()))?
            }
            _ => geometry
                .json()
                .map_err(|e| S57Error::Geometry(e.to_string()))?,
        };

        geometry_from_json(&json)
            .ok_or_else(|| S57Error::Geometry(format!("not a GeoJSON geometry: {json}")))
    }
}

impl VectorSource for GdalSource {
    fn layer_names(&self) -> Vec<String> {
        self.dataset.layers().map(|layer| layer.name()).collect()
    }

    fn records(&self, layer_name: &str) -> Option<Vec<Record>> {
        let mut layer = self.dataset.layer_by_name(layer_name).ok()?;
        layer.reset_feature_reading();

        let mut records = Vec::new();
        for feature in layer.features() {
            let fields = feature
                .fields()
                .map(|(name, value)| (name, convert_field(value)))
                .collect();

            let geometry = feature.geometry().and_then(|g| match self.to_wgs84(g) {
                Ok(geom) => Some(geom),
                Err(e) => {
                    warn!(layer = layer_name, "Dropping geometry: {e}");
                    None
                }
            });

            records.push(Record { fields, geometry });
        }

        trace!(layer = layer_name, records = records.len(), "Layer read");
        Some(records)
    }
}

/// Convertit une valeur OGR (`None` = non renseigné ou nul)
fn convert_field(value: Option<OgrFieldValue>) -> FieldValue {
    let Some(value) = value else {
        return FieldValue::Null;
    };

    #[allow(unreachable_patterns)]
    match value {
        OgrFieldValue::StringValue(s) => FieldValue::Value(s),
        OgrFieldValue::IntegerValue(i) => FieldValue::Value(i.to_string()),
        OgrFieldValue::Integer64Value(i) => FieldValue::Value(i.to_string()),
        OgrFieldValue::RealValue(r) => FieldValue::Value(r.to_string()),
        OgrFieldValue::DateValue(d) => FieldValue::Value(d.to_string()),
        OgrFieldValue::DateTimeValue(dt) => FieldValue::Value(dt.to_string()),
        OgrFieldValue::StringListValue(items) => FieldValue::List(items),
        OgrFieldValue::IntegerListValue(items) => {
            FieldValue::List(items.iter().map(ToString::to_string).collect())
        }
        OgrFieldValue::Integer64ListValue(items) => {
            FieldValue::List(items.iter().map(ToString::to_string).collect())
        }
        OgrFieldValue::RealListValue(items) => {
            FieldValue::List(items.iter().map(ToString::to_string).collect())
        }
        _ => FieldValue::Unset,
    }
}
