//! # s57-pg
//!
//! Import de cartes marines S-57 vers PostgreSQL/PostGIS.
//!
//! ## Features
//!
//! - Tables `charts` et `features` en EPSG:4326, propriétés en JSONB
//! - Plage de zoom par feature (`int4range`) et références LNAM indexées
//! - Ré-import d'une carte = remplacement (suppression puis insertion)
//! - Insertion des features par lots transactionnels
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # Initialiser le schéma
//! s57-pg --init-schema -d postgresql://localhost/njord
//!
//! # Importer un répertoire de cellules
//! s57-pg /charts -r -d postgresql://localhost/njord
//!
//! # Métadonnées d'une carte (sans base de données)
//! s57-pg US5MA1SK.000 --info
//! ```

pub mod config;
pub mod ingest;
pub mod report;
pub mod store;

pub use config::PolicyConfig;
pub use ingest::{discover, IngestError, Ingestor, ProcessingResult, Statistics};
pub use report::{ImportStatus, IngestReport};
pub use store::{ChartStore, DatabaseConfig, PgStore};
