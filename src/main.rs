//! Sage server binary.
//!
//! Loads configuration, connects the database, model, and embedding clients,
//! and serves the HTTP API.

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use db_sage::cli::Cli;
use db_sage::config::Config;
use db_sage::db::{self, DatabaseClient, MockDatabaseClient};
use db_sage::history::HistoryStore;
use db_sage::http::{configure_routes, AppState};
use db_sage::llm::{
    self, EmbeddingClient, LlmClient, MockEmbeddingClient, MockLlmClient,
};
use db_sage::logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    logging::init("info");

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config)?;

    // Clients: mocks for local development, Postgres and OpenAI otherwise.
    let (database, llm_client, embeddings) = if cli.mock {
        info!("Running with mock database and model clients");
        (
            Arc::new(MockDatabaseClient::new()) as Arc<dyn DatabaseClient>,
            Arc::new(MockLlmClient::new()) as Arc<dyn LlmClient>,
            Arc::new(MockEmbeddingClient::new()) as Arc<dyn EmbeddingClient>,
        )
    } else {
        info!("Connecting to database: {}", config.database.display_string());
        let database: Arc<dyn DatabaseClient> =
            Arc::from(db::connect(&config.database).await?);
        let llm_client = llm::create_client(&config.llm)?;
        let embeddings = llm::create_embedding_client(&config.llm)?;
        (database, llm_client, embeddings)
    };

    let history_path = HistoryStore::default_path()?;
    let history = Arc::new(HistoryStore::open(&history_path).await?);

    let state = web::Data::new(AppState::assemble(
        &config,
        database,
        llm_client,
        embeddings,
        history,
    ));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);
    info!("Endpoints: POST /api/v1/auth/login, POST /api/v1/query/ask");

    let cors_origin = config.server.cors_origin.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(&bind_addr)?;

    let server = if config.server.workers > 0 {
        server.workers(config.server.workers)
    } else {
        server
    };

    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}
