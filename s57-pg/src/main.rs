//! Point d'entrée CLI pour s57-pg

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{DatabaseArgs, IngestArgs};

/// Importer des cartes marines S-57 dans PostGIS
#[derive(Parser)]
#[command(name = "s57-pg")]
#[command(author, version)]
#[command(about = "Importer des cartes marines S-57 (.000) dans PostgreSQL/PostGIS")]
#[command(after_help = "Examples:\n  s57-pg chart.000 -d postgresql://localhost/njord\n  s57-pg /charts -r -v\n  s57-pg /charts --list\n  s57-pg --init-schema")]
struct Cli {
    /// S-57 file (.000) or directory
    input: Option<PathBuf>,

    /// Recursively search directories
    #[arg(short, long)]
    recursive: bool,

    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// List all .000 files found
    #[arg(long, conflicts_with = "info")]
    list: bool,

    /// Show chart metadata (single file, no database)
    #[arg(long)]
    info: bool,

    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    ingest: IngestArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Retourne `true` si au moins un fichier a échoué
async fn run(cli: Cli) -> Result<bool> {
    if cli.list {
        let input = cli
            .input
            .ok_or_else(|| anyhow::anyhow!("No input path specified"))?;
        cli::cmd_list(&input, cli.recursive)?;
        return Ok(false);
    }

    if cli.info {
        let input = cli
            .input
            .ok_or_else(|| anyhow::anyhow!("No input file specified"))?;
        cli::cmd_info(&input)?;
        return Ok(false);
    }

    let db = cli::database_config(cli.database)?;

    let Some(input) = cli.input else {
        if cli.ingest.init_schema {
            cli::cmd_init_schema(&db).await?;
            return Ok(false);
        }
        anyhow::bail!("No input specified (see --help)");
    };

    info!(input = %input.display(), database = %db.describe(), "Ingest");
    // Progression sur une ligne sauf en mode verbeux ou silencieux
    let show_progress = cli.verbose == 0 && !cli.quiet;
    cli::cmd_ingest(&input, cli.recursive, show_progress, &db, cli.ingest).await
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
