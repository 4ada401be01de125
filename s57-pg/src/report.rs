//! Rapport d'import
//!
//! Ce module collecte les résultats par fichier et les restitue sur la
//! console ou en JSON.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::ingest::ProcessingResult;

/// Statut global de l'import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    /// Tous les fichiers importés
    Success,
    /// Une partie des fichiers en échec
    PartialSuccess,
    /// Aucun fichier importé
    Failed,
}

/// Fichier en échec
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    /// Nom de la carte, si le fichier a pu être ouvert
    pub chart_name: Option<String>,
    pub message: String,
}

/// Rapport complet d'import
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Chemin d'entrée
    pub input: String,
    /// Durée de l'import
    pub duration_secs: f64,
    /// Statut global
    pub status: ImportStatus,

    /// Nombre de fichiers traités
    pub files_processed: usize,
    pub files_succeeded: usize,
    pub files_failed: usize,
    /// Features des fichiers importés avec succès
    pub total_features: usize,

    /// Features par couche (fichiers importés uniquement)
    pub by_layer: BTreeMap<String, usize>,

    /// Cartes importées
    pub charts: Vec<String>,
    /// Liste des échecs
    pub failures: Vec<FailedFile>,
}

impl Default for IngestReport {
    fn default() -> Self {
        Self {
            input: String::new(),
            duration_secs: 0.0,
            status: ImportStatus::Success,
            files_processed: 0,
            files_succeeded: 0,
            files_failed: 0,
            total_features: 0,
            by_layer: BTreeMap::new(),
            charts: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl IngestReport {
    /// Crée un nouveau rapport pour un chemin d'entrée
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            ..Default::default()
        }
    }

    /// Construit le rapport à partir des résultats par fichier
    pub fn from_results(input: &str, results: &[ProcessingResult], duration: Duration) -> Self {
        let mut report = Self::new(input);
        for result in results {
            report.record(result);
        }
        report.set_duration(duration);
        report.finalize();
        report
    }

    /// Enregistre le résultat d'un fichier
    pub fn record(&mut self, result: &ProcessingResult) {
        self.files_processed += 1;

        if result.success {
            self.files_succeeded += 1;
            self.total_features += result.feature_count;
            self.charts.push(result.chart_name.clone());
            for (layer, count) in &result.layers {
                *self.by_layer.entry(layer.clone()).or_default() += count;
            }
        } else {
            self.files_failed += 1;
            self.failures.push(FailedFile {
                file_name: result.file_name.clone(),
                chart_name: (!result.chart_name.is_empty()).then(|| result.chart_name.clone()),
                message: result.error_message(),
            });
        }
    }

    /// Définit la durée de l'import
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = match (self.files_succeeded, self.files_failed) {
            (_, 0) => ImportStatus::Success,
            (0, _) => ImportStatus::Failed,
            _ => ImportStatus::PartialSuccess,
        };
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        print!("{}", self.render());
    }

    fn render(&self) -> String {
        use std::fmt::Write;

        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "INGEST REPORT - {}", self.input);
        let _ = writeln!(out, "{rule}");

        let _ = writeln!(out, "\nStatus: {:?}", self.status);
        let _ = writeln!(out, "Duration: {:.2}s", self.duration_secs);

        let _ = writeln!(out, "\n--- SUMMARY ---");
        let _ = writeln!(out, "Files processed: {}", self.files_processed);
        let _ = writeln!(out, "Successful:      {}", self.files_succeeded);
        let _ = writeln!(out, "Failed:          {}", self.files_failed);
        let _ = writeln!(out, "Total features:  {}", self.total_features);

        if !self.by_layer.is_empty() {
            let _ = writeln!(out, "\n--- BY LAYER ---");
            for (layer, count) in &self.by_layer {
                let _ = writeln!(out, "  {}: {}", layer, count);
            }
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out, "\n--- FAILED FILES ({}) ---", self.failures.len());
            for f in self.failures.iter().take(20) {
                let _ = writeln!(out, "  {}: {}", f.file_name, f.message);
            }
            if self.failures.len() > 20 {
                let _ = writeln!(out, "  ... and {} more", self.failures.len() - 20);
            }
        }

        let _ = writeln!(out, "\n{rule}");
        out
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} files: {} succeeded, {} failed, {} features",
            self.files_processed, self.files_succeeded, self.files_failed, self.total_features
        )
    }
}
