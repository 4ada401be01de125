//! # s57
//!
//! Lecture des cartes marines électroniques S-57 (cellules ENC `.000`).
//!
//! ## Features
//!
//! - Métadonnées de carte (DSID) et emprise (M_COVR) en EPSG:4326
//! - Extraction des features par couche, hors couches de topologie
//! - Plage de zoom par feature calculée depuis SCAMIN/SCAMAX
//! - Profondeur des sondes (SOUNDG) dérivée de la coordonnée Z
//! - Backend GDAL/OGR derrière la feature cargo `gdal`, source en mémoire sinon
//!
//! ## Usage
//!
//! ```rust,ignore
//! use s57::ChartReader;
//!
//! let chart = ChartReader::open("US5MA1SK.000");
//! if chart.is_open() {
//!     let info = chart.chart_info();
//!     println!("{} (1:{}) zoom {}", info.name, info.scale, info.zoom);
//!     for feature in chart.all_features() {
//!         println!("{} z{}-{}", feature.layer, feature.min_z, feature.max_z);
//!     }
//! }
//! ```

pub mod codec;
pub mod error;
pub mod policy;
pub mod reader;
pub mod source;
pub mod types;
pub mod zoom;

pub use error::S57Error;
pub use policy::{DepthRule, LayerPolicy};
pub use reader::ChartReader;
pub use source::{FieldValue, MemorySource, Record, VectorSource};
pub use types::{ChartInfo, Feature, Properties};
pub use zoom::{find_zoom, z_range};
