use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use agro_cli::app::{self, SaveRequest};
use agro_cli::config::AppConfig;
use agro_cli::logging;
use agro_cli::utils::{ReportTarget, parse_assignment, parse_calculator, parse_report_target};
use agro_core::{CalculatorType, Session};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Agronomic calculators with saved, reopenable reports.
///
/// Settings come from `agrocalc.toml` in the working directory (or
/// `--config`); flags override them.
#[derive(Debug, Parser)]
#[command(name = "agrocalc")]
struct Cli {
    /// Config file to read instead of `./agrocalc.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use (`sqlite` or `memory`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (default `agrocalc.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Owner whose reports and clients are read and written.
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Log filter, e.g. `debug` or `agro_core=trace,info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the calculators and their input fields.
    Calculators,

    /// Run a calculator without saving anything.
    Compute {
        /// Calculator tag (`break_even`) or page slug (`ponto-equilibrio`).
        #[arg(value_parser = parse_calculator)]
        calculator: CalculatorType,

        /// Input as `field=value`; repeat for more fields.
        #[arg(long = "set", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },

    /// Save a calculator page as a new report, or over an existing one.
    Save {
        #[arg(value_parser = parse_calculator)]
        calculator: CalculatorType,

        /// Report to load and overwrite.
        #[arg(long)]
        id: Option<i64>,

        #[arg(long = "set", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,

        #[arg(long)]
        title: Option<String>,

        /// Client to file the report under; created when new.
        #[arg(long)]
        client: Option<String>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Show a saved report, by id or page route (`/calculadoras/calagem?id=4`).
    Open {
        #[arg(value_parser = parse_report_target)]
        target: ReportTarget,
    },

    /// The owner's most recently updated reports.
    Recent,

    DeleteReport {
        id: i64,
    },

    /// The owner's clients.
    Clients,

    DeleteClient {
        id: i64,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging("info");

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    if !logging::env_filter_overrides() {
        let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
        logging::set_log_level(level)?;
    }
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }

    match cli.command {
        Command::Calculators => {
            print!("{}", app::calculator_table());
            return Ok(());
        }
        Command::Compute {
            calculator,
            ref assignments,
        } => {
            println!("{}", app::compute(calculator, assignments).summary);
            return Ok(());
        }
        _ => {}
    }

    let mut db_config = config.db_config();
    if let Some(backend) = cli.backend {
        db_config.backend = backend;
    }
    if let Some(db) = cli.db {
        db_config.connection_string = db;
    }

    let registry = app::build_registry();
    let db_config = registry
        .resolve(&db_config)
        .context("Invalid database settings")?;
    debug!(backend = %db_config.backend, "connecting");
    let repo = registry
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open the {} store", db_config.backend))?;

    let session = cli.owner.or(config.owner_id).map(Session::new);
    let signed_in = || {
        session
            .as_ref()
            .context("No owner: pass --owner or set owner_id in agrocalc.toml")
    };

    match cli.command {
        Command::Save {
            calculator,
            id,
            assignments,
            title,
            client,
            location,
        } => {
            let route = app::save_report(
                &*repo,
                session.as_ref(),
                calculator,
                SaveRequest {
                    report_id: id,
                    assignments,
                    title,
                    client,
                    location,
                },
            )
            .await?;
            println!("{route}");
        }
        Command::Open { target } => print!("{}", app::open_report(&*repo, target).await?),
        Command::Recent => print!("{}", app::recent_reports(&*repo, signed_in()?).await?),
        Command::Clients => print!("{}", app::list_clients(&*repo, signed_in()?).await?),
        Command::DeleteReport { id } => app::delete_report(&*repo, id).await?,
        Command::DeleteClient { id } => app::delete_client(&*repo, id).await?,
        Command::Calculators | Command::Compute { .. } => {}
    }

    Ok(())
}
