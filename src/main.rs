//! Wiring & DI. Entry point: parse the command, bootstrap adapters, inject into services.
//! No business logic here.

use clap::{Parser, Subcommand};
use social_os::adapters::http::{run_server, AppState};
use social_os::adapters::llm::OpenRouterGateway;
use social_os::adapters::persistence::SqliteProfileStore;
use social_os::adapters::ui::{self, ConsoleProgress};
use social_os::domain::{IngestEvent, IngestStage};
use social_os::ports::{LlmGateway, ProfileStore, ProgressPort};
use social_os::shared::config::AppConfig;
use social_os::usecases::{ChatService, ExtractionService, IngestionService, ProfileService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "social-os", version, about = "Profile store and LLM ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the REST API server
    Serve,
    /// Extract a profile from a text document and save it
    Ingest {
        /// Path to a UTF-8 text or markdown file
        file: PathBuf,
        /// Show extra detail about the extracted profile
        #[arg(short, long)]
        verbose: bool,
    },
    /// Create the database and its tables
    InitDb,
    /// Insert the bundled sample profiles
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv::dotenv();
    let cli = Cli::parse();
    let cfg = AppConfig::load().unwrap_or_default();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cfg.log_level_or_default().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found"),
    }

    match cli.command {
        Command::Serve => serve(&cfg).await,
        Command::Ingest { file, verbose } => {
            if !ingest(&cfg, file, verbose).await {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::InitDb => {
            let store = open_store(&cfg).await?;
            println!("✓ Database ready at {}", store.path().display());
            Ok(())
        }
        Command::Seed => {
            let store: Arc<dyn ProfileStore> = Arc::new(open_store(&cfg).await?);
            let profiles = ProfileService::new(store);
            let seeded = profiles
                .seed_samples()
                .await
                .map_err(|e| anyhow::anyhow!("seed failed: {}", e))?;
            for (profile, created) in &seeded {
                println!(
                    "✓ {} {} ({})",
                    if *created { "Created" } else { "Updated" },
                    profile.name,
                    profile.user_id
                );
            }
            println!("Seeded {} profiles", seeded.len());
            Ok(())
        }
    }
}

async fn open_store(cfg: &AppConfig) -> anyhow::Result<SqliteProfileStore> {
    let path = cfg.database_path_or_default();
    SqliteProfileStore::connect(&path)
        .await
        .map_err(|e| anyhow::anyhow!("SQLite connect failed ({}): {}", path, e))
}

fn build_gateway(cfg: &AppConfig) -> Arc<dyn LlmGateway> {
    if cfg.is_llm_configured() {
        info!(model = %cfg.llm_model_or_default(), "LLM gateway configured");
    }
    Arc::new(OpenRouterGateway::new(cfg.gateway_settings()))
}

async fn serve(cfg: &AppConfig) -> anyhow::Result<()> {
    ui::init_ui();

    let store: Arc<dyn ProfileStore> = Arc::new(open_store(cfg).await?);
    let gateway = build_gateway(cfg);

    let profiles = Arc::new(ProfileService::new(store));
    let chat = Arc::new(ChatService::new(gateway, cfg.llm_timeout()));
    let state = AppState::new(profiles, chat);

    run_server(state, &cfg.bind_addr(), &cfg.cors_origin_or_default()).await
}

/// Runs one ingestion with console progress. Returns false on any failure.
async fn ingest(cfg: &AppConfig, file: PathBuf, verbose: bool) -> bool {
    let progress: Arc<dyn ProgressPort> = Arc::new(ConsoleProgress::new(verbose));
    progress.report(IngestEvent::Started { path: file.clone() });

    let store: Arc<dyn ProfileStore> = match open_store(cfg).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            progress.report(IngestEvent::Failed {
                stage: IngestStage::Store,
                message: e.to_string(),
            });
            return false;
        }
    };
    progress.report(IngestEvent::StoreReady);

    let extraction = Arc::new(ExtractionService::new(build_gateway(cfg), cfg.llm_timeout()));
    let ingestion = IngestionService::new(extraction, store, Arc::clone(&progress));

    let ok = ingestion.ingest_file(&file).await.is_ok();
    if ok {
        progress.report(IngestEvent::Finished);
    }
    ok
}
