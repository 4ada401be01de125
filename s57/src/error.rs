//! Types d'erreurs pour le crate s57

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture d'une carte S-57
#[derive(Debug, Clone, Error)]
pub enum S57Error {
    /// Fichier illisible ou format non supporté
    #[error("Failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    /// Géométrie non convertible en GeoJSON
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    /// Erreur remontée par la bibliothèque de lecture
    #[error("Vector backend error: {0}")]
    Backend(String),

    /// Aucun backend de lecture compilé
    #[error("No chart backend available (build with the `gdal` feature)")]
    NoBackend,
}

impl S57Error {
    /// Crée une erreur d'ouverture avec contexte
    pub fn open(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
