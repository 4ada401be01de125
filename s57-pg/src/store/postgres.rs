//! Stockage PostGIS des cartes et features

use anyhow::{Context, Result};
use s57::codec::{geometry_to_json, properties_to_json};
use s57::{ChartInfo, Feature};
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;
use tracing::{debug, info, warn};

use super::connection::{self, DatabaseConfig};
use super::{lnam_refs_literal, ChartId, ChartStore};

/// Version du schéma enregistrée dans `meta`
pub const SCHEMA_VERSION: &str = "1";

/// Schéma des tables (hors extension PostGIS)
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key     VARCHAR UNIQUE NOT NULL,
    value   VARCHAR NULL
);

INSERT INTO meta VALUES ('version', '1') ON CONFLICT (key) DO NOTHING;

CREATE TABLE IF NOT EXISTS charts (
    id         BIGSERIAL PRIMARY KEY,
    name       VARCHAR UNIQUE           NOT NULL,
    scale      INTEGER                  NOT NULL,
    file_name  VARCHAR                  NOT NULL,
    updated    VARCHAR                  NOT NULL,
    issued     VARCHAR                  NOT NULL,
    zoom       INTEGER                  NOT NULL,
    covr       GEOMETRY(GEOMETRY, 4326) NOT NULL,
    dsid_props JSONB                    NOT NULL,
    chart_txt  JSONB                    NOT NULL
);

CREATE INDEX IF NOT EXISTS charts_gist ON charts USING GIST (covr);
CREATE INDEX IF NOT EXISTS charts_idx ON charts (id);

CREATE TABLE IF NOT EXISTS features (
    id        BIGSERIAL PRIMARY KEY,
    layer     VARCHAR                       NOT NULL,
    geom      GEOMETRY(GEOMETRY, 4326)      NOT NULL,
    props     JSONB                         NOT NULL,
    chart_id  BIGINT REFERENCES charts (id) NOT NULL,
    lnam_refs VARCHAR[]                     NULL,
    z_range   INT4RANGE                     NOT NULL
);

CREATE INDEX IF NOT EXISTS features_gist ON features USING GIST (geom);
CREATE INDEX IF NOT EXISTS features_idx ON features (id);
CREATE INDEX IF NOT EXISTS features_layer_idx ON features (layer);
CREATE INDEX IF NOT EXISTS features_zoom_idx ON features USING GIST (z_range);
CREATE INDEX IF NOT EXISTS features_lnam_idx ON features USING GIN (lnam_refs);
"#;

const INSERT_CHART_SQL: &str = r#"
INSERT INTO charts (name, scale, file_name, updated, issued, zoom, covr, dsid_props, chart_txt)
VALUES ($1, $2, $3, $4, $5, $6, ST_Force2D(ST_SetSRID(ST_GeomFromGeoJSON($7::text), 4326)), $8::jsonb, $9::jsonb)
RETURNING id
"#;

/// Requête d'insertion d'une feature ; `lnam_refs` est injecté comme littéral.
///
/// Les colonnes géométriques sont 2D : la profondeur des sondes est conservée
/// dans leurs attributs, pas dans la géométrie.
fn insert_feature_sql(lnam_refs: &[String]) -> String {
    format!(
        "INSERT INTO features (layer, geom, props, chart_id, lnam_refs, z_range) \
         VALUES ($1, ST_Force2D(ST_SetSRID(ST_GeomFromGeoJSON($2::text), 4326)), $3::jsonb, $4, {}, int4range($5, $6, '[]'))",
        lnam_refs_literal(lnam_refs)
    )
}

/// Connexion unique vers la base PostGIS
pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connecte et vérifie la connexion (`SELECT 1`)
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = connection::connect(config).await?;
        connection::test_connection(&client).await?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Active PostGIS (peut nécessiter des droits superuser).
    ///
    /// Si l'extension existe déjà mais que l'utilisateur ne peut pas la
    /// (re)créer, on dégrade gracieusement.
    async fn ensure_postgis(&self) -> Result<()> {
        match self
            .client
            .execute("CREATE EXTENSION IF NOT EXISTS postgis", &[])
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("CREATE EXTENSION postgis failed (will check if already installed): {e}");
                let exists = self
                    .client
                    .query_opt("SELECT 1 FROM pg_extension WHERE extname = 'postgis'", &[])
                    .await
                    .context("Failed to check pg_extension")?
                    .is_some();
                if !exists {
                    anyhow::bail!("PostGIS extension is not installed and could not be created: {e}");
                }
                Ok(())
            }
        }
    }

    /// Version du schéma, `None` si la table `meta` n'existe pas
    pub async fn schema_version(&self) -> Result<Option<String>> {
        let exists = self
            .client
            .query_opt(
                "SELECT 1 FROM information_schema.tables WHERE table_name = 'meta'",
                &[],
            )
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let row = self
            .client
            .query_opt("SELECT value FROM meta WHERE key = 'version'", &[])
            .await
            .context("Failed to read schema version")?;
        Ok(row.and_then(|r| r.get::<_, Option<String>>(0)))
    }
}

impl ChartStore for PgStore {
    async fn ensure_schema(&mut self) -> Result<()> {
        self.ensure_postgis().await?;

        let tx = self
            .client
            .transaction()
            .await
            .context("Failed to begin transaction")?;
        tx.batch_execute(SCHEMA_SQL)
            .await
            .context("Failed to create schema")?;
        tx.commit().await.context("Failed to commit schema")?;

        info!(version = SCHEMA_VERSION, "Schema ready");
        Ok(())
    }

    async fn chart_exists(&mut self, name: &str) -> Result<bool> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM charts WHERE name = $1", &[&name])
            .await
            .with_context(|| format!("Failed to check chart {}", name))?;
        Ok(row.get::<_, i64>(0) > 0)
    }

    async fn insert_chart(&mut self, chart: &ChartInfo) -> Result<ChartId> {
        let covr = geometry_to_json(chart.coverage.as_ref());
        let dsid_props = properties_to_json(&chart.dsid_properties);
        let chart_txt = properties_to_json(&chart.chart_text);

        let tx = self.client.transaction().await?;
        let row = tx
            .query_one(
                INSERT_CHART_SQL,
                &[
                    &chart.name,
                    &chart.scale,
                    &chart.file_name,
                    &chart.updated,
                    &chart.issued,
                    &chart.zoom,
                    &covr,
                    &dsid_props,
                    &chart_txt,
                ],
            )
            .await
            .with_context(|| format!("Failed to insert chart {}", chart.name))?;
        tx.commit().await.context("Failed to commit chart")?;

        let id: ChartId = row.get(0);
        debug!(chart = %chart.name, id, "Chart inserted");
        Ok(id)
    }

    async fn delete_chart(&mut self, name: &str) -> Result<()> {
        let tx = self.client.transaction().await?;

        let Some(row) = tx
            .query_opt("SELECT id FROM charts WHERE name = $1", &[&name])
            .await
            .with_context(|| format!("Failed to look up chart {}", name))?
        else {
            tx.commit().await?;
            return Ok(());
        };
        let chart_id: ChartId = row.get(0);

        // Features d'abord (clé étrangère)
        let deleted = tx
            .execute("DELETE FROM features WHERE chart_id = $1", &[&chart_id])
            .await
            .with_context(|| format!("Failed to delete features of chart {}", name))?;
        tx.execute("DELETE FROM charts WHERE id = $1", &[&chart_id])
            .await
            .with_context(|| format!("Failed to delete chart {}", name))?;
        tx.commit().await.context("Failed to commit chart deletion")?;

        debug!(chart = name, id = chart_id, features = deleted, "Chart deleted");
        Ok(())
    }

    async fn insert_features(&mut self, chart_id: ChartId, features: &[Feature]) -> Result<()> {
        if features.is_empty() {
            return Ok(());
        }

        // Rollback implicite si la transaction est abandonnée sur erreur
        let tx = self.client.transaction().await?;
        // Requête préparée une fois par lot pour les features sans références
        let without_refs = tx
            .prepare(&insert_feature_sql(&[]))
            .await
            .context("Failed to prepare feature insert")?;

        for feature in features {
            let geom = geometry_to_json(feature.geometry.as_ref());
            let props = properties_to_json(&feature.properties);
            let params: [&(dyn ToSql + Sync); 6] = [
                &feature.layer,
                &geom,
                &props,
                &chart_id,
                &feature.min_z,
                &feature.max_z,
            ];

            let inserted = if feature.lnam_refs.is_empty() {
                tx.execute(&without_refs, &params).await
            } else {
                let sql = insert_feature_sql(&feature.lnam_refs);
                tx.execute(sql.as_str(), &params).await
            };
            inserted.with_context(|| format!("Failed to insert {} feature", feature.layer))?;
        }

        tx.commit().await.context("Failed to commit feature batch")?;
        Ok(())
    }

    async fn chart_count(&mut self) -> Result<i64> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM charts", &[])
            .await
            .context("Chart count failed")?;
        Ok(row.get(0))
    }

    async fn feature_count(&mut self) -> Result<i64> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM features", &[])
            .await
            .context("Feature count failed")?;
        Ok(row.get(0))
    }
}
