//! Checks whether open statusdb projects have a SNIC account for their PI
//! email and writes the result back into the project document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use githubbackup::statusdb::{apply_snic_status, evaluate_project, CheckDecision};
use githubbackup::{AccountRegistry, CheckerConfig, StatusDbClient};

#[derive(Parser)]
#[command(name = "snic-checker")]
#[command(version)]
#[command(about = "Get open projects from statusdb, check if the users have \
a SNIC account and write the result back into statusdb.")]
struct Cli {
    /// Path to yaml file with credentials for statusdb and the SNIC API
    #[arg(long, value_name = "PATH")]
    config: PathBuf,

    /// Check an individual email directly in SNIC
    #[arg(long, value_name = "EMAIL")]
    check_email: Option<String>,

    /// Print out what would have been saved to statusdb
    #[arg(short = 'd', long)]
    dryrun: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = CheckerConfig::load(&cli.config)?;
    let registry = AccountRegistry::new(&config.snic);

    if let Some(email) = cli.check_email {
        let present = registry.email_present(&email).await?;
        println!(
            "The email \"{}\" has {} associated SNIC account.",
            email,
            if present { "an" } else { "NO" }
        );
        return Ok(());
    }

    let statusdb = StatusDbClient::new(&config.statusdb);
    update_statusdb(&statusdb, &registry, cli.dryrun).await
}

/// Walk the open projects, verify PI emails where needed, and save (or, in
/// dry-run mode, print) the updated documents.
async fn update_statusdb(
    statusdb: &StatusDbClient,
    registry: &AccountRegistry,
    dryrun: bool,
) -> Result<()> {
    let projects = statusdb.open_projects().await?;
    info!("Checking {} open projects", projects.len());

    for row in projects {
        let Some(mut doc) = row.doc else {
            warn!("Project {} came back without its document, skipping", row.id);
            continue;
        };

        let update = match evaluate_project(&row.value) {
            CheckDecision::Skip => false,
            CheckDecision::Recheck { email } => {
                // Only a positive verdict replaces a previous negative one.
                let present = registry.email_present(&email).await?;
                if present {
                    apply_snic_status(&mut doc, true);
                }
                present
            }
            CheckDecision::FirstCheck { email } => {
                let present = registry.email_present(&email).await?;
                apply_snic_status(&mut doc, present);
                true
            }
        };

        if update {
            if dryrun {
                println!(
                    "{} {}",
                    doc.get("project_name")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or(&row.id),
                    doc["details"]["snic_checked"]
                );
            } else {
                statusdb.save_project(&doc).await?;
                info!("Updated snic_checked for project {}", row.id);
            }
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
