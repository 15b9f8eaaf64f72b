//! HTTP API for Sage.
//!
//! Configures the actix-web routes and holds the shared application state:
//! the engine set, the retriever, the database client, authentication, and
//! the history store.

pub mod auth;
pub mod models;
pub mod query;

pub use auth::AuthenticatedUser;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::db::DatabaseClient;
use crate::engines::{ChainEngine, EngineKind, EngineSet, GraphEngine, PipelineEngine};
use crate::history::HistoryStore;
use crate::http::models::{HealthResponse, ServiceInfo};
use crate::llm::{EmbeddingClient, LlmClient};
use crate::memory::SessionMemory;
use crate::query::QueryExecutor;
use crate::retrieval::Retriever;

/// Shared application state.
pub struct AppState {
    pub engines: EngineSet,
    pub retriever: Arc<Retriever>,
    pub db: Arc<dyn DatabaseClient>,
    pub auth: AuthService,
    pub history: Arc<HistoryStore>,
    pub default_engine: EngineKind,
}

impl AppState {
    /// Wires the engines and services together from their building blocks.
    ///
    /// The caller chooses the concrete clients, so tests assemble the same
    /// state over mocks that production assembles over Postgres and OpenAI.
    pub fn assemble(
        config: &Config,
        db: Arc<dyn DatabaseClient>,
        llm: Arc<dyn LlmClient>,
        embeddings: Arc<dyn EmbeddingClient>,
        history: Arc<HistoryStore>,
    ) -> Self {
        let retriever = Arc::new(Retriever::new(
            embeddings,
            config.retrieval.resolved_persist_path(),
        ));

        let executor = Arc::new(
            QueryExecutor::new(db.clone()).with_row_limit(config.execution.row_limit),
        );

        let memory = Arc::new(SessionMemory::new());

        let pipeline = Arc::new(
            PipelineEngine::new(llm.clone(), retriever.clone(), executor.clone())
                .with_top_k(config.retrieval.top_k),
        );
        let graph = Arc::new(GraphEngine::new(
            llm.clone(),
            retriever.clone(),
            executor.clone(),
        ));
        let chain = Arc::new(ChainEngine::new(llm, retriever.clone(), executor, memory));

        let default_engine = config
            .execution
            .default_engine
            .parse()
            .unwrap_or(EngineKind::Pipeline);

        Self {
            engines: EngineSet::new(pipeline, graph, chain),
            retriever,
            db,
            auth: AuthService::new(&config.auth),
            history,
            default_engine,
        }
    }
}

/// Configures all API routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::scope("/auth").route("/login", web::post().to(auth::login_handler)))
            .service(
                web::scope("/query")
                    .route("/ask", web::post().to(query::ask_handler))
                    .route("/stats", web::get().to(query::stats_handler))
                    .route("/initialize", web::post().to(query::initialize_handler))
                    .route("/history", web::get().to(query::history_handler))
                    .route("/engine/{engine}", web::post().to(query::engine_handler)),
            ),
    )
    .route("/", web::get().to(root_handler))
    .route("/health", web::get().to(health_handler));
}

/// GET /
async fn root_handler() -> HttpResponse {
    HttpResponse::Ok().json(ServiceInfo {
        message: "Sage natural-language SQL assistant".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health
async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Test fixtures shared by the handler tests.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::MockDatabaseClient;
    use crate::llm::{MockEmbeddingClient, MockLlmClient};

    /// Builds application state over mock clients with an initialized
    /// knowledge base and an in-memory history store.
    pub async fn test_state() -> web::Data<AppState> {
        let mut config = Config::default();
        config.retrieval.persist_path = Some(std::path::PathBuf::new());

        let db = Arc::new(MockDatabaseClient::new());
        let history = Arc::new(HistoryStore::open_in_memory().await.unwrap());

        let state = AppState::assemble(
            &config,
            db.clone(),
            Arc::new(MockLlmClient::new()),
            Arc::new(MockEmbeddingClient::new()),
            history,
        );

        state.retriever.initialize(db.as_ref()).await.unwrap();
        db.take_executed_statements();

        web::Data::new(state)
    }

    /// Issues a valid bearer token for the default test user.
    pub fn authorized(state: &web::Data<AppState>) -> String {
        state.auth.issue_token("admin").unwrap()
    }
}
