//! docmark — document-to-Markdown ingestion worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use docmark_core::WorkerConfig;
use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCMARK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Run one invocation event from a file and print the response.
fn invoke_file(path: &Path) -> anyhow::Result<bool> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let event: serde_json::Value = serde_json::from_str(&raw)?;

    let config = WorkerConfig::from_env(resolve_data_dir())?;
    let state = AppState::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize worker: {}", e))?;

    let response = docmark_ingest::handle_invocation(&state.worker, &event);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.is_success())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "invoke" => {
                if args.len() < 3 {
                    eprintln!("Usage: docmark invoke <event.json>");
                    std::process::exit(1);
                }
                let path = PathBuf::from(&args[2]);
                let ok = tokio::task::spawn_blocking(move || invoke_file(&path)).await??;
                std::process::exit(if ok { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("docmark — convert stored documents to Markdown");
                println!();
                println!("Usage: docmark [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the HTTP server");
                println!("  invoke <event.json>      Run one invocation event and print the response");
                println!("  help                     Show this help message");
                println!();
                println!("Environment:");
                println!("  DOCMARK_NOTIFICATION_TOPIC   Topic name or http(s) URL (required)");
                println!("  DOCMARK_DATA_DIR             Data directory (default: data)");
                println!("  PORT                         HTTP port (default: 3004)");
                println!("  DOCMARK_ALLOW_HTML           Accept .html/.htm (default: true)");
                println!("  DOCMARK_STRICT_MIME          Enforce declared MIME types (default: false)");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'docmark help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();

    info!("Data directory: {}", data_dir.display());

    let config = WorkerConfig::from_env(&data_dir)?;
    config
        .require_topic()
        .map_err(|e| anyhow::anyhow!("Refusing to start: {}", e))?;
    let port = config.port;

    let state = Arc::new(
        AppState::new(config).map_err(|e| anyhow::anyhow!("Failed to initialize worker: {}", e))?,
    );
    info!(
        "Publishing completions to {} (extensions: {})",
        state.worker.topic().unwrap_or("-"),
        state.worker.policy().extensions().join(", ")
    );

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("docmark listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
