mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coordinator_client::CoordinatorClient;
use mission_core::CreateMissionRequest;
use planner::{GeminiPlanner, PlanGenerator};
use server::{create_router, state::AppState};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worker::MissionController;

use crate::config::{Config, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "mission-control")]
#[command(about = "Plan-driven automation of an IDE across workers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./mission-control.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator HTTP service
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        database_url: Option<String>,
    },
    /// Poll the coordinator and execute the steps of a mission
    Work {
        mission_id: String,

        #[arg(long)]
        worker_id: Option<String>,

        #[arg(long)]
        coordinator_url: Option<String>,

        /// Base poll interval in seconds
        #[arg(long)]
        poll_interval: Option<u64>,
    },
    /// Create a mission on a running coordinator and print its plan
    Submit {
        prompt: String,

        #[arg(long)]
        repo_path: Option<PathBuf>,

        #[arg(long, default_value = "cli")]
        user: String,

        #[arg(long)]
        worker_id: Option<String>,

        #[arg(long)]
        coordinator_url: Option<String>,
    },
    /// Write a default config file and create the database
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, database_url } => {
            if let Some(port) = port {
                config.coordinator.port = port;
            }
            if let Some(url) = database_url {
                config.coordinator.database_url = url;
            }
            serve(&config).await
        }
        Commands::Work {
            mission_id,
            worker_id,
            coordinator_url,
            poll_interval,
        } => {
            if let Some(id) = worker_id {
                config.worker.worker_id = id;
            }
            if let Some(url) = coordinator_url {
                config.worker.coordinator_url = url;
            }
            if let Some(secs) = poll_interval {
                config.worker.poll_interval_secs = secs;
            }
            work(&config, &mission_id).await
        }
        Commands::Submit {
            prompt,
            repo_path,
            user,
            worker_id,
            coordinator_url,
        } => {
            if let Some(url) = coordinator_url {
                config.worker.coordinator_url = url;
            }
            let repo_path = match repo_path {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            let request = CreateMissionRequest {
                user,
                prompt,
                repo_path: repo_path.display().to_string(),
                worker_id: Some(worker_id.unwrap_or_else(|| config.worker.worker_id.clone())),
            };
            submit(&config, &request).await
        }
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
            init(&config, &path, force).await
        }
    }
}

async fn serve(config: &Config) -> Result<()> {
    init_tracing();

    let database_url = &config.coordinator.database_url;
    tracing::info!("Database: {}", database_url);

    let pool = db::create_pool(database_url)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let planner = match GeminiPlanner::from_config(&config.planner) {
        Some(planner) => {
            tracing::info!("Planner: gemini ({})", config.planner.model);
            PlanGenerator::new(Arc::new(planner))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set, every mission gets the static plan");
            PlanGenerator::static_only()
        }
    };

    let app = create_router(AppState::from_pool(pool, planner));

    let addr = format!("0.0.0.0:{}", config.coordinator.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!();
    println!("Mission Control coordinator");
    println!();
    println!("  API Server:  http://localhost:{}", config.coordinator.port);
    println!("  Swagger UI:  http://localhost:{}/swagger-ui", config.coordinator.port);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await?;

    Ok(())
}

async fn work(config: &Config, mission_id: &str) -> Result<()> {
    init_tracing();

    let worker_config = config.worker_config();
    tracing::info!(
        worker_id = %worker_config.worker_id,
        coordinator = %worker_config.coordinator_url,
        mission_id,
        "Starting worker"
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, stopping after the current step");
            on_signal.cancel();
        }
    });

    let mut controller = MissionController::from_config(&worker_config, cancel.clone());
    controller.set_mission(mission_id).await;
    controller.run(cancel).await;

    Ok(())
}

async fn submit(config: &Config, request: &CreateMissionRequest) -> Result<()> {
    let client = CoordinatorClient::new(&config.worker.coordinator_url);
    let response = client
        .create_mission(request)
        .await
        .with_context(|| format!("Failed to create mission on {}", client.base_url()))?;

    println!("Mission: {}", response.mission_id);
    println!();
    println!("{}", serde_json::to_string_pretty(&response.plan)?);
    println!();
    println!("Start a worker with:");
    println!("  mission-control work {}", response.mission_id);

    Ok(())
}

async fn init(config: &Config, path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
    } else {
        let content = Config::template()?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    let database_url = &config.coordinator.database_url;
    let pool = db::create_pool(database_url)
        .await
        .with_context(|| format!("Failed to open database {}", database_url))?;
    db::run_migrations(&pool).await?;
    match db::database_path(database_url) {
        Some(path) => println!("Database ready at {}", path.display()),
        None => println!("Database ready (in memory, nothing persisted)"),
    }

    println!();
    println!("Next steps:");
    println!("  1. Run 'mission-control serve' to start the coordinator");
    println!("  2. Run 'mission-control submit \"<prompt>\"' to create a mission");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
