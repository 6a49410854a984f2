//! Gist: simulation-config generation server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use gist_chat::InstructionBundle;
use gist_core::GistConfig;
use gist_server::{build_router, AppState};

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
            "--schema" | "schema" => {
                let bundle = InstructionBundle::bundled()?;
                match args.get(2) {
                    Some(path) => {
                        std::fs::write(path, format!("{}\n", bundle.schema()))?;
                        info!("Wrote simulation schema to {}", path);
                    }
                    None => println!("{}", bundle.schema()),
                }
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("Gist: simulation-config generation server");
                println!();
                println!("Usage: gist [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  schema [path]            Write the simulation JSON Schema");
                println!("  help                     Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'gist help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let config = GistConfig::from_env()?;
    let port = config.port;
    info!(
        "Models: stream={} chat={} summary={}",
        config.models.stream_model, config.models.chat_model, config.models.summary_model
    );

    let state = Arc::new(AppState::from_config(config)?);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gist server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
