use anyhow::Context;
use clap::{Parser, Subcommand};
use patient_risk::{ApiClient, Config, run_assessment};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "patient-risk")]
#[command(about = "Fetch patient records, classify clinical risk, and submit the assessment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every page, score all patients, and submit the three lists
    Assess {
        /// Records per page (overrides KSENSE_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<u32>,
        /// Print the payload instead of submitting it
        #[arg(long)]
        dry_run: bool,
        /// Retry the submission on 429/500/503
        #[arg(long)]
        retry_submit: bool,
    },
    /// Fetch a single page and show its shape
    Probe {
        /// Page number to fetch
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
}

/// Entry point
///
/// # Environment Variables
/// - `KSENSE_API_KEY`: API key (required, may come from a `.env` file)
/// - `KSENSE_BASE_URL`: API base URL (default: "https://assessment.ksensetech.com/api")
/// - `KSENSE_PAGE_SIZE`: records per page (default: 5)
/// - `RUST_LOG`: log filter (default: "patient_risk=info")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("patient_risk=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("loading configuration")?;

    match cli.command {
        Commands::Assess {
            page_size,
            dry_run,
            retry_submit,
        } => {
            if let Some(size) = page_size {
                config.pagination.page_size = size;
            }
            config.submission.retry |= retry_submit;
            config.validate()?;

            let outcome = run_assessment(&config, dry_run).await?;
            tracing::info!(
                patients = outcome.patients_fetched,
                complete = outcome.complete,
                "Assessment finished"
            );

            match outcome.submission {
                Some(reply) => println!("{}", serde_json::to_string_pretty(&reply)?),
                None => println!("{}", serde_json::to_string_pretty(&outcome.result)?),
            }
        }
        Commands::Probe { page } => {
            let client = ApiClient::new(&config)?;
            let response = client
                .fetch_page(page, config.pagination.page_size)
                .await
                .with_context(|| format!("fetching page {page}"))?;

            println!(
                "pagination: {}",
                serde_json::to_string_pretty(&response.pagination)?
            );
            match response.data.first() {
                Some(first) => println!("first patient: {}", serde_json::to_string_pretty(first)?),
                None => println!("page {page} is empty"),
            }
        }
    }

    Ok(())
}
