//! Tests d'intégration PostgreSQL
//!
//! Ces tests nécessitent une base PostgreSQL/PostGIS disponible.
//! Configuration via variables d'environnement:
//! - PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE
//!
//! Exécution:
//! ```bash
//! # Avec PostgreSQL local
//! cargo test --test postgres_integration -- --ignored
//!
//! # Avec Docker
//! docker run -d --name postgres-test -e POSTGRES_PASSWORD=test -p 5432:5432 postgis/postgis
//! PGPASSWORD=test cargo test --test postgres_integration -- --ignored
//! ```
//!
//! Chaque test utilise ses propres noms de cartes : les tests peuvent
//! tourner en parallèle sur la même base.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use anyhow::Result;
use s57::codec::point;
use s57::{ChartInfo, ChartReader, Feature, MemorySource, Properties, Record};
use s57_pg::store::ChartId;
use s57_pg::{ChartStore, DatabaseConfig, Ingestor, PgStore};

/// Configuration de test
fn test_config() -> DatabaseConfig {
    let mut config = DatabaseConfig::from_env();
    if std::env::var("PGDATABASE").is_err() && config.url.is_none() {
        config.dbname = "njord_test".into();
    }
    config
}

/// Connexion de test avec schéma initialisé
async fn setup_store() -> Result<PgStore> {
    let mut store = PgStore::connect(&test_config()).await?;
    store.ensure_schema().await?;
    Ok(store)
}

fn chart_source(name: &str, scale: &str, soundings: usize) -> MemorySource {
    let soundings = (0..soundings)
        .map(|i| {
            Record::new(Some(point(-70.5 + i as f64 * 1e-5, 42.5, Some(3.27))))
                .with_field("SCAMIN", "45000")
        })
        .collect();

    MemorySource::new()
        .with_layer(
            "DSID",
            vec![Record::new(None)
                .with_field("DSID_DSNM", name)
                .with_field("DSPM_CSCL", scale)
                .with_field("DSID_UADT", "20240115")
                .with_field("DSID_ISDT", "20240201")],
        )
        .with_layer(
            "M_COVR",
            vec![Record::new(Some(geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
                vec![-71.0, 42.0],
                vec![-70.0, 42.0],
                vec![-70.0, 43.0],
                vec![-71.0, 43.0],
                vec![-71.0, 42.0],
            ]]))))
            .with_field("CATCOV", "1")],
        )
        .with_layer("SOUNDG", soundings)
}

fn chart_info(name: &str) -> ChartInfo {
    let reader = ChartReader::from_source(format!("{name}.000"), chart_source(name, "22000", 0));
    reader.chart_info()
}

fn sample_feature(lnam_refs: Vec<String>) -> Feature {
    let mut properties = Properties::new();
    properties.insert("OBJNAM", "Red 2");
    Feature {
        layer: "BOYLAT".into(),
        geometry: Some(point(-70.1, 42.1, None)),
        properties,
        min_z: 11,
        max_z: 15,
        lnam_refs,
    }
}

async fn chart_id(store: &PgStore, name: &str) -> Result<Option<ChartId>> {
    let row = store
        .client()
        .query_opt("SELECT id FROM charts WHERE name = $1", &[&name])
        .await?;
    Ok(row.map(|r| r.get(0)))
}

async fn features_of(store: &PgStore, name: &str) -> Result<i64> {
    let row = store
        .client()
        .query_one(
            "SELECT COUNT(*) FROM features f JOIN charts c ON f.chart_id = c.id WHERE c.name = $1",
            &[&name],
        )
        .await?;
    Ok(row.get(0))
}

async fn cleanup(store: &mut PgStore, names: &[&str]) {
    for name in names {
        let _ = store.delete_chart(name).await;
    }
}

/// Test de connexion basique
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_database_connection() {
    let store = PgStore::connect(&test_config())
        .await
        .expect("Failed to connect");

    let row = store
        .client()
        .query_one("SELECT 1 as value", &[])
        .await
        .expect("Query failed");
    let value: i32 = row.get("value");
    assert_eq!(value, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_ensure_schema_idempotent() {
    let mut store = setup_store().await.expect("Setup failed");
    store.ensure_schema().await.expect("Second call failed");

    let version = store.schema_version().await.unwrap();
    assert_eq!(version.as_deref(), Some("1"));

    let row = store
        .client()
        .query_one(
            "SELECT COUNT(*) FROM pg_indexes WHERE indexname IN \
             ('charts_gist', 'features_gist', 'features_layer_idx', 'features_zoom_idx', 'features_lnam_idx')",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(row.get::<_, i64>(0), 5);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_insert_chart_payloads() {
    const NAME: &str = "IT_CHART_PAYLOADS";
    let mut store = setup_store().await.unwrap();
    cleanup(&mut store, &[NAME]).await;

    let info = chart_info(NAME);
    let id = store.insert_chart(&info).await.unwrap();
    assert!(store.chart_exists(NAME).await.unwrap());

    let row = store
        .client()
        .query_one(
            "SELECT scale, zoom, updated, dsid_props->>'DSPM_CSCL', chart_txt->>'CATCOV', \
             ST_SRID(covr), GeometryType(covr) FROM charts WHERE id = $1",
            &[&id],
        )
        .await
        .unwrap();
    assert_eq!(row.get::<_, i32>(0), 22000);
    assert_eq!(row.get::<_, i32>(1), 13);
    assert_eq!(row.get::<_, String>(2), "20240115");
    assert_eq!(row.get::<_, Option<String>>(3).as_deref(), Some("22000"));
    assert_eq!(row.get::<_, Option<String>>(4).as_deref(), Some("1"));
    assert_eq!(row.get::<_, i32>(5), 4326);
    assert_eq!(row.get::<_, String>(6), "POLYGON");

    // Nom unique
    assert!(store.insert_chart(&info).await.is_err());

    cleanup(&mut store, &[NAME]).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_lnam_refs_roundtrip() {
    const NAME: &str = "IT_LNAM_REFS";
    let mut store = setup_store().await.unwrap();
    cleanup(&mut store, &[NAME]).await;

    let id = store.insert_chart(&chart_info(NAME)).await.unwrap();
    store
        .insert_features(
            id,
            &[
                sample_feature(vec!["A'B".into(), "C".into()]),
                sample_feature(Vec::new()),
            ],
        )
        .await
        .unwrap();

    let rows = store
        .client()
        .query(
            "SELECT lnam_refs::text[], lower(z_range), upper(z_range), props->>'OBJNAM' \
             FROM features WHERE chart_id = $1 ORDER BY id",
            &[&id],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let refs: Option<Vec<String>> = rows[0].get(0);
    assert_eq!(refs, Some(vec!["A'B".to_string(), "C".to_string()]));
    // Liste vide → NULL
    let refs: Option<Vec<String>> = rows[1].get(0);
    assert!(refs.is_none());

    // [11,15] inclusif, forme canonique [11,16)
    assert_eq!(rows[0].get::<_, i32>(1), 11);
    assert_eq!(rows[0].get::<_, i32>(2), 16);
    assert_eq!(rows[0].get::<_, Option<String>>(3).as_deref(), Some("Red 2"));

    cleanup(&mut store, &[NAME]).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_mixed_refs_batch() {
    const NAME: &str = "IT_MIXED_REFS";
    let mut store = setup_store().await.unwrap();
    cleanup(&mut store, &[NAME]).await;

    // Requête préparée (sans références) et littérale alternées dans un même lot
    let features: Vec<Feature> = (0..50)
        .map(|i| {
            if i % 5 == 0 {
                sample_feature(vec![format!("REF'{i}")])
            } else {
                sample_feature(Vec::new())
            }
        })
        .collect();

    let id = store.insert_chart(&chart_info(NAME)).await.unwrap();
    store.insert_features(id, &features).await.unwrap();
    assert_eq!(features_of(&store, NAME).await.unwrap(), 50);

    let row = store
        .client()
        .query_one(
            "SELECT COUNT(*) FILTER (WHERE lnam_refs IS NULL), \
             COUNT(*) FILTER (WHERE lnam_refs = ARRAY['REF''45']::varchar[]) \
             FROM features WHERE chart_id = $1",
            &[&id],
        )
        .await
        .unwrap();
    assert_eq!(row.get::<_, i64>(0), 40);
    assert_eq!(row.get::<_, i64>(1), 1);

    cleanup(&mut store, &[NAME]).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_delete_missing_chart() {
    const NAME: &str = "IT_NEVER_INSERTED";
    let mut store = setup_store().await.unwrap();

    assert!(!store.chart_exists(NAME).await.unwrap());
    store.delete_chart(NAME).await.expect("Delete should be a no-op");
    assert!(!store.chart_exists(NAME).await.unwrap());
    assert_eq!(features_of(&store, NAME).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_reingest_replaces_chart() {
    const NAME: &str = "IT_REINGEST";
    let mut store = setup_store().await.unwrap();
    cleanup(&mut store, &[NAME]).await;

    let counter = Cell::new(0);
    let mut ingestor = Ingestor::new(store).with_opener(move |path: &Path| {
        counter.set(counter.get() + 1);
        let (scale, soundings) = if counter.get() == 1 { ("22000", 25) } else { ("45000", 7) };
        ChartReader::from_source(path, chart_source(NAME, scale, soundings))
    });

    let path = PathBuf::from(format!("{NAME}.000"));
    let results = ingestor.process_files(&[path.clone(), path]).await;
    assert!(results.iter().all(|r| r.success), "{results:?}");

    let mut store = ingestor.into_store();
    // Couverture M_COVR + sondes de la seconde ingestion
    assert_eq!(features_of(&store, NAME).await.unwrap(), 8);

    let row = store
        .client()
        .query_one("SELECT scale, zoom FROM charts WHERE name = $1", &[&NAME])
        .await
        .unwrap();
    assert_eq!(row.get::<_, i32>(0), 45000);
    assert_eq!(row.get::<_, i32>(1), 12);

    cleanup(&mut store, &[NAME]).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_batch_boundaries() {
    let cases = [("IT_BATCH_999", 999), ("IT_BATCH_1000", 1000), ("IT_BATCH_1001", 1001)];
    let mut store = setup_store().await.unwrap();
    cleanup(&mut store, &cases.map(|(name, _)| name)).await;

    for (name, soundings) in cases {
        let mut ingestor = Ingestor::new(store).with_opener(move |path: &Path| {
            ChartReader::from_source(path, chart_source(name, "22000", soundings))
        });
        let result = ingestor.process_file(Path::new("batch.000")).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.feature_count, soundings + 1);

        store = ingestor.into_store();
        assert_eq!(features_of(&store, name).await.unwrap(), soundings as i64 + 1);
    }

    cleanup(&mut store, &cases.map(|(name, _)| name)).await;
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_sounding_depth_attribute() {
    const NAME: &str = "IT_SOUNDINGS";
    let mut store = setup_store().await.unwrap();
    cleanup(&mut store, &[NAME]).await;

    let mut ingestor = Ingestor::new(store).with_opener(move |path: &Path| {
        ChartReader::from_source(path, chart_source(NAME, "22000", 1))
    });
    let result = ingestor.process_file(Path::new("soundings.000")).await;
    assert!(result.success, "{:?}", result.error);

    let mut store = ingestor.into_store();
    let id = chart_id(&store, NAME).await.unwrap().expect("chart inserted");
    let row = store
        .client()
        .query_one(
            "SELECT props->>'METERS', ST_NDims(geom), lower(z_range), upper(z_range) \
             FROM features WHERE chart_id = $1 AND layer = 'SOUNDG'",
            &[&id],
        )
        .await
        .unwrap();
    assert_eq!(row.get::<_, Option<String>>(0).as_deref(), Some("3.3"));
    assert_eq!(row.get::<_, i16>(1), 2);
    // SCAMIN 45000 → zoom 12, pas de SCAMAX → 28
    assert_eq!(row.get::<_, i32>(2), 12);
    assert_eq!(row.get::<_, i32>(3), 29);

    cleanup(&mut store, &[NAME]).await;
}
