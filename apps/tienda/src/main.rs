//! # Tienda
//!
//! Entry point: logging setup and command dispatch.

use clap::Parser;
use tienda::cli::{
    Cli, Commands, cmd_export, cmd_import, cmd_init, cmd_report, cmd_seed, cmd_serve, cmd_status,
};
use tienda::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tienda=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let db = cli.db.as_path();
    let backend = cli.backend.as_str();

    let result = match cli.command {
        Commands::Init { force } => cmd_init(db, backend, force),
        Commands::Seed => cmd_seed(db, backend),
        Commands::Status { json } => cmd_status(db, backend, json),
        Commands::Report {
            kind,
            from,
            to,
            limit,
            threshold,
            json,
        } => cmd_report(db, backend, &kind, from, to, limit, threshold, json),
        Commands::Export { output, format } => cmd_export(db, backend, &output, &format),
        Commands::Import { input } => cmd_import(db, backend, &input),
        Commands::Serve {
            addr,
            api_key,
            rate_limit,
            cors_origin,
        } => match ServerConfig::new(&addr, api_key, rate_limit, cors_origin) {
            Ok(config) => cmd_serve(db, backend, config).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
