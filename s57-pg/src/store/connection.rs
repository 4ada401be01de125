//! Connexion PostgreSQL (une seule connexion, pas de pool)

use anyhow::{Context, Result};
use tokio_postgres::config::Host;
use tokio_postgres::{Client, NoTls};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, error};

/// Mode SSL pour la connexion PostgreSQL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    /// Pas de SSL (défaut)
    #[default]
    Disable,
    /// SSL préféré mais non requis
    Prefer,
    /// SSL requis
    Require,
}

impl std::str::FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disable" | "off" | "false" | "no" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" | "on" | "true" | "yes" => Ok(SslMode::Require),
            _ => Err(format!("Invalid SSL mode: {}. Use: disable, prefer, require", s)),
        }
    }
}

/// Configuration de la base de données
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Chaîne de connexion complète (prioritaire sur les champs individuels)
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub ssl_mode: SslMode,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".into(),
            port: 5432,
            dbname: "njord".into(),
            user: "postgres".into(),
            password: None,
            ssl_mode: SslMode::Disable,
        }
    }
}

impl DatabaseConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: var("DATABASE_URL").filter(|s| !s.is_empty()),
            host: var("PGHOST").unwrap_or(defaults.host),
            port: var("PGPORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            dbname: var("PGDATABASE").unwrap_or(defaults.dbname),
            user: var("PGUSER").unwrap_or(defaults.user),
            password: var("PGPASSWORD"),
            ssl_mode: var("PGSSLMODE")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Construit la configuration tokio-postgres
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config> {
        if let Some(url) = &self.url {
            // Chaîne non affichée : elle peut contenir le mot de passe
            return url.parse().context("Invalid connection string");
        }

        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .application_name("s57-pg");
        if let Some(password) = &self.password {
            cfg.password(password);
        }
        Ok(cfg)
    }

    /// Description affichable (sans mot de passe)
    pub fn describe(&self) -> String {
        let Ok(cfg) = self.to_pg_config() else {
            return "<invalid connection string>".to_string();
        };

        let hosts: Vec<String> = cfg.get_hosts().iter().map(host_name).collect();
        let port = cfg.get_ports().first().copied().unwrap_or(self.port);
        format!(
            "{}@{}:{}/{} (SSL: {:?})",
            cfg.get_user().unwrap_or_default(),
            hosts.join(","),
            port,
            cfg.get_dbname().unwrap_or_default(),
            self.ssl_mode
        )
    }
}

fn host_name(host: &Host) -> String {
    match host {
        Host::Tcp(name) => name.clone(),
        #[cfg(unix)]
        Host::Unix(path) => path.display().to_string(),
    }
}

/// Crée la configuration TLS pour rustls
fn make_tls_connector() -> MakeRustlsConnect {
    let root_store = rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    MakeRustlsConnect::new(config)
}

/// Ouvre une connexion et lance sa tâche de fond
pub async fn connect(config: &DatabaseConfig) -> Result<Client> {
    let mut pg_config = config.to_pg_config()?;

    let client = match config.ssl_mode {
        SslMode::Disable => {
            pg_config.ssl_mode(tokio_postgres::config::SslMode::Disable);
            let (client, connection) = pg_config
                .connect(NoTls)
                .await
                .context("Failed to connect to database")?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!("Database connection error: {e}");
                }
            });
            client
        }
        SslMode::Prefer | SslMode::Require => {
            pg_config.ssl_mode(match config.ssl_mode {
                SslMode::Require => tokio_postgres::config::SslMode::Require,
                _ => tokio_postgres::config::SslMode::Prefer,
            });
            let (client, connection) = pg_config
                .connect(make_tls_connector())
                .await
                .context("Failed to connect to database with TLS")?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!("Database connection error: {e}");
                }
            });
            client
        }
    };

    debug!(database = %config.describe(), "Connected");
    Ok(client)
}

/// Teste la connexion à la base
pub async fn test_connection(client: &Client) -> Result<()> {
    client
        .execute("SELECT 1", &[])
        .await
        .context("Connection test failed")?;
    Ok(())
}
