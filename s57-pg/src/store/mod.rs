//! Persistance des cartes et features (PostgreSQL/PostGIS)
//!
//! Chaque opération d'écriture publique est une transaction indépendante :
//! suppression, insertion de la carte et lots de features d'un même fichier
//! ne sont pas atomiques entre eux.

pub mod connection;
pub mod postgres;

use anyhow::Result;
use s57::{ChartInfo, Feature};

pub use connection::{DatabaseConfig, SslMode};
pub use postgres::PgStore;

/// Identifiant d'une carte en base
pub type ChartId = i64;

/// Opérations de persistance utilisées par l'ingestion
#[allow(async_fn_in_trait)]
pub trait ChartStore {
    /// Crée l'extension spatiale, les tables et les index (idempotent)
    async fn ensure_schema(&mut self) -> Result<()>;

    async fn chart_exists(&mut self, name: &str) -> Result<bool>;

    /// Insère une carte et retourne son identifiant
    async fn insert_chart(&mut self, chart: &ChartInfo) -> Result<ChartId>;

    /// Supprime une carte et ses features. Sans effet si elle n'existe pas.
    async fn delete_chart(&mut self, name: &str) -> Result<()>;

    /// Insère un lot de features en une transaction (tout ou rien)
    async fn insert_features(&mut self, chart_id: ChartId, features: &[Feature]) -> Result<()>;

    async fn chart_count(&mut self) -> Result<i64>;

    async fn feature_count(&mut self) -> Result<i64>;
}

/// Expression SQL littérale pour la colonne `lnam_refs`.
///
/// Une liste vide donne `NULL`, jamais un tableau vide. Les apostrophes
/// sont doublées.
pub fn lnam_refs_literal(refs: &[String]) -> String {
    if refs.is_empty() {
        return "NULL".to_string();
    }

    let items: Vec<String> = refs
        .iter()
        .map(|r| format!("'{}'", r.replace('\'', "''")))
        .collect();
    format!("ARRAY[{}]::varchar[]", items.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lnam_refs_empty_is_null() {
        assert_eq!(lnam_refs_literal(&[]), "NULL");
    }

    #[test]
    fn test_lnam_refs_literal() {
        let refs = vec!["0226000A0001".to_string(), "0226000A0002".to_string()];
        assert_eq!(
            lnam_refs_literal(&refs),
            "ARRAY['0226000A0001','0226000A0002']::varchar[]"
        );
    }

    #[test]
    fn test_lnam_refs_quotes_doubled() {
        let refs = vec!["A'B".to_string(), "C".to_string()];
        assert_eq!(lnam_refs_literal(&refs), "ARRAY['A''B','C']::varchar[]");

        let refs = vec!["''".to_string()];
        assert_eq!(lnam_refs_literal(&refs), "ARRAY['''''']::varchar[]");
    }
}
