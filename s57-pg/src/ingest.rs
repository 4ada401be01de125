//! Ingestion des cartes S-57 : découverte des fichiers et import fichier par fichier
//!
//! Chaque fichier suit la séquence : ouverture, remplacement de la carte
//! existante, insertion de la carte puis des features par lots. Une erreur
//! sur un fichier est consignée dans son [`ProcessingResult`] et le
//! traitement continue avec le fichier suivant.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use s57::{ChartReader, LayerPolicy};

use crate::config::{PolicyConfig, DEFAULT_BATCH_SIZE};
use crate::store::ChartStore;

/// Extension des cellules ENC de base
pub const CHART_EXTENSION: &str = "000";

/// Nombre de workers par défaut (accepté, non utilisé : une seule connexion)
pub const DEFAULT_WORKERS: usize = 4;

/// Échec du traitement d'un fichier
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestError {
    /// Fichier illisible ou format non supporté
    #[error("Failed to open file: {reason}")]
    Open { reason: String },

    /// Suppression ou insertion de la carte refusée
    #[error("Failed to write chart {chart}: {reason}")]
    ChartWrite { chart: String, reason: String },

    /// Lot de features en échec ; les lots précédents restent en base
    #[error("Failed to insert features (batch {batch}, {committed} already committed): {reason}")]
    FeatureBatch {
        batch: usize,
        committed: usize,
        reason: String,
    },
}

/// Résultat du traitement d'un fichier
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub file_name: String,
    pub chart_name: String,
    pub feature_count: usize,
    /// Nombre de features par couche
    pub layers: BTreeMap<String, usize>,
    pub error: Option<IngestError>,
}

impl ProcessingResult {
    fn failed(mut self, error: IngestError) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Message d'erreur affichable (vide en cas de succès)
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
    }
}

/// Compteurs cumulés sur une série de fichiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub files_processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Features des fichiers importés avec succès uniquement
    pub total_features: usize,
}

impl Statistics {
    fn record(&mut self, result: &ProcessingResult) {
        self.files_processed += 1;
        if result.success {
            self.successful += 1;
            self.total_features += result.feature_count;
        } else {
            self.failed += 1;
        }
    }
}

/// Ouverture d'une carte à partir de son chemin
pub type Opener = Box<dyn Fn(&Path) -> ChartReader>;

/// Rappel de progression `(courant, total, nom du fichier)`
pub type ProgressCallback = Box<dyn FnMut(usize, usize, &str)>;

/// Liste les cellules `.000` d'un fichier ou d'un répertoire, triées.
///
/// Un chemin inexistant donne une liste vide.
pub fn discover(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(if is_chart_file(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !path.is_dir() {
        return Ok(Vec::new());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
    {
        let entry = entry.with_context(|| format!("Failed to read {}", path.display()))?;
        if entry.file_type().is_file() && is_chart_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_chart_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == CHART_EXTENSION)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Import séquentiel de cartes vers un [`ChartStore`]
pub struct Ingestor<S: ChartStore> {
    store: S,
    opener: Opener,
    policy: LayerPolicy,
    batch_size: usize,
    workers: usize,
    progress: Option<ProgressCallback>,
    stats: Statistics,
}

impl<S: ChartStore> Ingestor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            opener: Box::new(|path: &Path| ChartReader::open(path)),
            policy: LayerPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            progress: None,
            stats: Statistics::default(),
        }
    }

    /// Remplace la fonction d'ouverture des cartes
    pub fn with_opener(mut self, opener: impl Fn(&Path) -> ChartReader + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    /// Applique une configuration (politique de couches et taille des lots)
    pub fn with_config(mut self, config: &PolicyConfig) -> Self {
        self.policy = config.layer_policy();
        self.batch_size = config.batch_size.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Nombre de workers demandé ; l'import reste séquentiel
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, callback: impl FnMut(usize, usize, &str) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Importe un fichier (remplace la carte de même nom si elle existe)
    pub async fn process_file(&mut self, path: &Path) -> ProcessingResult {
        let mut result = ProcessingResult {
            file_name: display_name(path),
            ..Default::default()
        };

        let reader = (self.opener)(path).with_policy(self.policy.clone());
        if !reader.is_open() {
            let reason = reader
                .open_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Failed to open file".to_string());
            return result.failed(IngestError::Open { reason });
        }

        let chart = reader.chart_info();
        result.chart_name = chart.name.clone();
        debug!(chart = %chart.name, scale = chart.scale, zoom = chart.zoom, "Processing chart");

        let chart_write = |e: anyhow::Error| IngestError::ChartWrite {
            chart: chart.name.clone(),
            reason: format!("{e:#}"),
        };

        match self.store.chart_exists(&chart.name).await {
            Ok(true) => {
                debug!(chart = %chart.name, "Replacing existing chart");
                if let Err(e) = self.store.delete_chart(&chart.name).await {
                    return result.failed(chart_write(e));
                }
            }
            Ok(false) => {}
            Err(e) => return result.failed(chart_write(e)),
        }

        let chart_id = match self.store.insert_chart(&chart).await {
            Ok(id) => id,
            Err(e) => return result.failed(chart_write(e)),
        };

        let features = reader.all_features();
        debug!(chart = %chart.name, features = features.len(), "Features extracted");

        for (index, batch) in features.chunks(self.batch_size).enumerate() {
            if let Err(e) = self.store.insert_features(chart_id, batch).await {
                return result.failed(IngestError::FeatureBatch {
                    batch: index + 1,
                    committed: index * self.batch_size,
                    reason: format!("{e:#}"),
                });
            }
        }

        for feature in &features {
            *result.layers.entry(feature.layer.clone()).or_default() += 1;
        }
        result.feature_count = features.len();
        result.success = true;
        result
    }

    /// Importe une série de fichiers dans l'ordre donné
    pub async fn process_files(&mut self, paths: &[PathBuf]) -> Vec<ProcessingResult> {
        let total = paths.len();
        let mut results = Vec::with_capacity(total);

        for (index, path) in paths.iter().enumerate() {
            let result = self.process_file(path).await;
            self.stats.record(&result);

            if result.success {
                info!(
                    file = %result.file_name,
                    chart = %result.chart_name,
                    features = result.feature_count,
                    "Chart imported"
                );
            } else {
                warn!(file = %result.file_name, "Failed: {}", result.error_message());
            }

            if let Some(progress) = self.progress.as_mut() {
                progress(index + 1, total, &result.file_name);
            }
            results.push(result);
        }

        results
    }
}
