//! Définition et implémentation des commandes CLI
//!
//! - import (défaut) : cellules S-57 → PostGIS
//! - `--list` : liste des fichiers trouvés
//! - `--info` : métadonnées d'une carte (sans base de données)
//! - `--init-schema` seul : initialise le schéma et quitte

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use geo::BoundingRect;
use tracing::{debug, info, warn};

use s57::codec::{geometry_to_json, properties_to_string};
use s57::ChartReader;
use s57_pg::config::PolicyConfig;
use s57_pg::ingest::{self, Ingestor};
use s57_pg::report::IngestReport;
use s57_pg::store::{ChartStore, DatabaseConfig, PgStore};

/// Options de connexion PostgreSQL
#[derive(Args, Debug, Default)]
pub struct DatabaseArgs {
    /// PostgreSQL connection string (défaut : env DATABASE_URL)
    #[arg(short, long = "database", value_name = "CONN")]
    pub database: Option<String>,

    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// PostgreSQL database name (défaut : env PGDATABASE / njord)
    #[arg(long)]
    pub dbname: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long)]
    pub ssl: Option<String>,
}

/// Options d'import
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Number of parallel workers (accepted, files are processed sequentially)
    #[arg(short, long, default_value_t = ingest::DEFAULT_WORKERS)]
    pub workers: usize,

    /// Policy preset name (default) or path to a JSON policy file
    #[arg(long, default_value = "default")]
    pub policy: String,

    /// Write the ingest report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Initialize the database schema before importing
    #[arg(long)]
    pub init_schema: bool,
}

/// Configuration de connexion : défauts, environnement puis options CLI
pub fn database_config(args: DatabaseArgs) -> Result<DatabaseConfig> {
    let mut config = DatabaseConfig::from_env();
    apply_database_overrides(&mut config, args)?;
    Ok(config)
}

fn apply_database_overrides(config: &mut DatabaseConfig, args: DatabaseArgs) -> Result<()> {
    if let Some(url) = args.database {
        config.url = Some(url);
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dbname) = args.dbname {
        config.dbname = dbname;
    }
    if let Some(user) = args.user {
        config.user = user;
    }
    if let Some(password) = args.password {
        config.password = Some(password);
    }
    if let Some(ssl) = args.ssl {
        config.ssl_mode = ssl.parse().map_err(anyhow::Error::msg)?;
    }
    Ok(())
}

/// Liste les fichiers .000 trouvés
pub fn cmd_list(path: &Path, recursive: bool) -> Result<()> {
    let files = ingest::discover(path, recursive)?;

    println!("Found {} S-57 files:", files.len());
    for file in &files {
        println!("  {}", file.display());
    }
    Ok(())
}

/// Affiche les métadonnées d'une carte
pub fn cmd_info(path: &Path) -> Result<()> {
    let chart = ChartReader::open(path);
    if !chart.is_open() {
        let reason = chart
            .open_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        anyhow::bail!("Failed to open {}: {}", path.display(), reason);
    }

    let info = chart.chart_info();

    println!("Chart Information:");
    println!("  Name:     {}", info.name);
    println!("  Scale:    1:{}", info.scale);
    println!("  File:     {}", info.file_name);
    println!("  Updated:  {}", info.updated);
    println!("  Issued:   {}", info.issued);
    println!("  Zoom:     {}", info.zoom);

    if let Some(bounds) = coverage_bounds(info.coverage.as_ref()) {
        println!(
            "  Bounds:   [{:.6}, {:.6}, {:.6}, {:.6}]",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );
    }

    println!("\nLayers:");
    for layer in chart.layer_names() {
        let marker = if chart.policy().is_excluded(&layer) {
            " (excluded)"
        } else {
            ""
        };
        println!("  - {}{}", layer, marker);
    }

    println!("\nDSID Properties:\n{}", properties_to_string(&info.dsid_properties));
    println!("\nCoverage:\n{}", geometry_to_json(info.coverage.as_ref()));
    Ok(())
}

/// Emprise de la couverture en lon/lat
fn coverage_bounds(coverage: Option<&geojson::Geometry>) -> Option<geo::Rect<f64>> {
    let geometry: geo::Geometry<f64> = coverage?.clone().try_into().ok()?;
    geometry.bounding_rect()
}

/// Initialise le schéma et quitte
pub async fn cmd_init_schema(db: &DatabaseConfig) -> Result<()> {
    println!("Initializing database schema...");
    let mut store = PgStore::connect(db)
        .await
        .with_context(|| format!("Failed to connect to {}", db.describe()))?;
    store.ensure_schema().await?;
    println!("Schema initialized successfully.");
    Ok(())
}

/// Importe un fichier ou un répertoire. Retourne `true` si un fichier a échoué.
pub async fn cmd_ingest(
    path: &Path,
    recursive: bool,
    show_progress: bool,
    db: &DatabaseConfig,
    args: IngestArgs,
) -> Result<bool> {
    if !path.exists() {
        anyhow::bail!("Input path does not exist: {}", path.display());
    }

    let policy = PolicyConfig::resolve(&args.policy)
        .with_context(|| format!("Failed to load policy {}", args.policy))?;

    let files = ingest::discover(path, recursive)?;
    if s57::source::BACKEND.is_none() && !files.is_empty() {
        warn!("No chart backend compiled in (build with the `gdal` feature): every file will fail to open");
    }
    info!(
        path = %path.display(),
        backend = s57::source::BACKEND.unwrap_or("none"),
        files = files.len(),
        workers = args.workers,
        batch_size = policy.batch_size,
        "Starting ingest"
    );

    // Connexion avant tout traitement : un échec interrompt l'exécution
    debug!(database = %db.describe(), "Connecting");
    let mut store = PgStore::connect(db)
        .await
        .with_context(|| format!("Failed to connect to {}", db.describe()))?;
    info!("Connected to PostgreSQL");

    if args.init_schema {
        println!("Initializing database schema...");
        store.ensure_schema().await?;
    }

    let mut ingestor = Ingestor::new(store)
        .with_config(&policy)
        .with_workers(args.workers);
    if show_progress {
        ingestor = ingestor.with_progress(|current, total, file_name| {
            use std::io::Write;
            print!("\rProcessing: {}/{} ({})          ", current, total, file_name);
            let _ = std::io::stdout().flush();
        });
    }

    let started_at = Instant::now();
    let results = ingestor.process_files(&files).await;
    if show_progress && !results.is_empty() {
        println!();
    }

    let report = IngestReport::from_results(
        &path.display().to_string(),
        &results,
        started_at.elapsed(),
    );
    debug!(stats = ?ingestor.statistics(), "Statistics");
    report.display();
    info!("Ingest complete: {}", report.summary());

    if let Some(report_path) = &args.report {
        report
            .save_to_file(report_path)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        info!(path = %report_path.display(), "Report saved");
    }

    Ok(report.has_failures())
}

#[cfg(test)]
mod tests {
    use super::*;
    use s57::codec::point;
    use s57_pg::store::SslMode;

    #[test]
    fn test_database_overrides() {
        let mut config = DatabaseConfig::default();
        apply_database_overrides(
            &mut config,
            DatabaseArgs {
                host: Some("db.internal".into()),
                port: Some(6543),
                dbname: Some("enc".into()),
                ssl: Some("require".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.dbname, "enc");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.ssl_mode, SslMode::Require);
        assert!(config.url.is_none());
    }

    #[test]
    fn test_database_url_override() {
        let mut config = DatabaseConfig::default();
        apply_database_overrides(
            &mut config,
            DatabaseArgs {
                database: Some("postgresql://localhost/njord".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.url.as_deref(), Some("postgresql://localhost/njord"));
    }

    #[test]
    fn test_invalid_ssl_mode() {
        let mut config = DatabaseConfig::default();
        let result = apply_database_overrides(
            &mut config,
            DatabaseArgs {
                ssl: Some("sometimes".into()),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_coverage_bounds() {
        let square = geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![-71.0, 42.0],
            vec![-70.0, 42.0],
            vec![-70.0, 43.5],
            vec![-71.0, 43.5],
            vec![-71.0, 42.0],
        ]]));
        let bounds = coverage_bounds(Some(&square)).unwrap();
        assert_eq!(bounds.min().x, -71.0);
        assert_eq!(bounds.max().y, 43.5);

        assert!(coverage_bounds(None).is_none());
        // Un point a une emprise dégénérée
        let bounds = coverage_bounds(Some(&point(1.0, 2.0, None))).unwrap();
        assert_eq!(bounds.min(), bounds.max());
    }

    #[test]
    fn test_chart_backend() {
        // Feature `gdal` du binaire (active par défaut) propagée au lecteur
        let expected = if cfg!(feature = "gdal") { Some("gdal") } else { None };
        assert_eq!(s57::source::BACKEND, expected);
    }

    #[test]
    fn test_info_missing_file() {
        assert!(cmd_info(Path::new("/nonexistent/US5MA1SK.000")).is_err());
    }

    #[tokio::test]
    async fn test_ingest_missing_path() {
        let args = IngestArgs {
            workers: 4,
            policy: "default".into(),
            report: None,
            init_schema: false,
        };
        let result = cmd_ingest(
            Path::new("/nonexistent/charts"),
            false,
            false,
            &DatabaseConfig::default(),
            args,
        )
        .await;
        assert!(result.is_err());
    }
}
