//! Harvester CLI
//!
//! Local execution entry point. Requires a running WebDriver server
//! (e.g. `chromedriver --port=9515`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use harvester::{
    browser::WebDriverBrowser,
    error::{AppError, Result},
    models::{Config, Credentials, ExtractionRequest, RunOutcome},
    pipeline,
    storage::{CheckpointStore, LocalCheckpointStore},
    utils::http,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Environment variable holding the catalog password.
const PASSWORD_ENV: &str = "HARVESTER_PASSWORD";

/// Harvester - resumable catalog citation export
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Resumable page-by-page citation export from authenticated catalogs"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in, search and export citations page by page
    ///
    /// The password is read from HARVESTER_PASSWORD, or from the first
    /// line of stdin when that variable is unset.
    Run {
        /// Catalog id from the configuration
        #[arg(long, default_value = "sciencedirect")]
        catalog: String,

        /// Account email for the identity provider
        #[arg(long)]
        email: String,

        /// Last result page to export
        #[arg(long)]
        max_pages: u32,

        /// Directory receiving exports and the checkpoint
        #[arg(long)]
        download_dir: PathBuf,

        /// Continue after the last checkpointed page
        #[arg(long)]
        resume: bool,
    },

    /// Show the checkpoint of a download directory
    Status {
        #[arg(long)]
        download_dir: PathBuf,

        /// Report whether a resumed run would have work left
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Password from the environment, else the first line of stdin.
async fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    log::info!("{PASSWORD_ENV} not set; reading password from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    match lines.next_line().await? {
        Some(line) if !line.trim().is_empty() => Ok(line.trim_end_matches('\r').to_string()),
        _ => Err(AppError::config(format!(
            "No password given (set {PASSWORD_ENV} or pipe it on stdin)"
        ))),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Harvester starting...");

    match cli.command {
        Command::Run {
            catalog,
            email,
            max_pages,
            download_dir,
            resume,
        } => {
            let config = Config::load_or_default(&cli.config);
            let request = ExtractionRequest {
                catalog_id: catalog,
                credentials: Credentials::new(email, read_password().await?),
                max_pages,
                download_dir,
                resume,
            };

            http::wait_for_webdriver(&config.webdriver).await?;
            let browser = WebDriverBrowser::connect(&config.webdriver, &request.download_dir).await?;

            let result = pipeline::run_extraction(&browser, &config, &request).await;
            if let Err(e) = browser.quit().await {
                log::warn!("Failed to close the browser session: {}", e);
            }

            let summary = result?;
            match summary.outcome {
                RunOutcome::AlreadyComplete => log::info!("Nothing to do"),
                RunOutcome::Finished => log::info!("Extraction complete!"),
                RunOutcome::StoppedEarly => log::warn!(
                    "Extraction stopped early; rerun with --resume to continue"
                ),
            }
        }

        Command::Status {
            download_dir,
            max_pages,
        } => {
            let config = Config::load_or_default(&cli.config);
            let store = LocalCheckpointStore::new(&download_dir, &config.workflow.checkpoint_file);

            match store.load().await? {
                Some(checkpoint) => {
                    log::info!(
                        "Last completed page: {} (at {})",
                        checkpoint.last_page,
                        checkpoint.timestamp.to_rfc3339()
                    );
                    let next = checkpoint.next_page();
                    match max_pages {
                        Some(max) if next > max => log::info!("All {max} pages done"),
                        _ => log::info!("A resumed run starts at page {next}"),
                    }
                }
                None => log::info!("No checkpoint in {}", store.path().display()),
            }
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            let config = Config::load(&cli.config)?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            for catalog in &config.catalogs {
                log::info!(
                    "Catalog '{}': {} ({} locator targets)",
                    catalog.id,
                    catalog.base_url,
                    catalog.locators.all().len()
                );
            }

            log::info!("All validations passed!");
        }
    }

    log::info!("Done!");

    Ok(())
}
