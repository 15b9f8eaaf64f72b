//! End-to-end tests over mock clients.
//!
//! Drives the three engines and the HTTP surface without a running database
//! or model provider, and pins down the execution-policy behavior every
//! engine shares: unsafe statements never reach the database, results are
//! bounded and stringified, and the engines agree on the outcome shape.

use std::sync::Arc;

use actix_web::{test, web, App};

use db_sage::config::Config;
use db_sage::db::MockDatabaseClient;
use db_sage::engines::{
    ChainEngine, Engine, EngineRequest, GraphEngine, PipelineEngine,
};
use db_sage::history::HistoryStore;
use db_sage::http::{configure_routes, AppState};
use db_sage::llm::{MockEmbeddingClient, MockLlmClient};
use db_sage::memory::SessionMemory;
use db_sage::query::{shape_for_execution, QueryExecutor};
use db_sage::retrieval::Retriever;
use db_sage::safety::is_safe;

/// Everything the engine tests need, wired over mocks.
struct Stack {
    db: Arc<MockDatabaseClient>,
    pipeline: PipelineEngine,
    graph: GraphEngine,
    chain: ChainEngine,
}

async fn build_stack() -> Stack {
    let db = Arc::new(MockDatabaseClient::new());
    let llm: Arc<MockLlmClient> = Arc::new(MockLlmClient::new());

    let retriever = Arc::new(Retriever::new(Arc::new(MockEmbeddingClient::new()), None));
    retriever.initialize(db.as_ref()).await.unwrap();
    db.take_executed_statements();

    let executor = Arc::new(QueryExecutor::new(db.clone()));
    let memory = Arc::new(SessionMemory::new());

    Stack {
        db: db.clone(),
        pipeline: PipelineEngine::new(llm.clone(), retriever.clone(), executor.clone()),
        graph: GraphEngine::new(llm.clone(), retriever.clone(), executor.clone()),
        chain: ChainEngine::new(llm, retriever, executor, memory),
    }
}

#[tokio::test]
async fn every_engine_answers_a_read_question() {
    let stack = build_stack().await;
    let request = EngineRequest::new("show me all customers", "tester");

    for engine in [
        &stack.pipeline as &dyn Engine,
        &stack.graph,
        &stack.chain,
    ] {
        let outcome = engine.answer(&request).await;

        assert!(
            outcome.success,
            "{} failed: {:?}",
            engine.kind(),
            outcome.error
        );
        assert_eq!(outcome.question, "show me all customers");
        assert_eq!(outcome.method, engine.kind().as_str());
        assert!(outcome.sql_query.is_some());
        assert_eq!(outcome.row_count, Some(2));
        assert!(!outcome.answer.is_empty());
    }
}

#[tokio::test]
async fn destructive_candidates_never_reach_the_database() {
    // The mock model faithfully produces the DROP the question asks for;
    // every engine must stop it before execution.
    let stack = build_stack().await;
    let request = EngineRequest::new("drop the customers table", "tester");

    for engine in [
        &stack.pipeline as &dyn Engine,
        &stack.graph,
        &stack.chain,
    ] {
        let outcome = engine.answer(&request).await;

        assert!(!outcome.success, "{} executed a DROP", engine.kind());
        assert!(outcome.error.is_some());
        assert!(
            stack.db.take_executed_statements().is_empty(),
            "{} let a statement through the gate",
            engine.kind()
        );
    }
}

#[tokio::test]
async fn executed_statements_are_bounded_and_rows_stringified() {
    let stack = build_stack().await;

    let outcome = stack
        .pipeline
        .answer(&EngineRequest::new("show me all customers", "tester"))
        .await;

    // The statement that reached the database carries the appended LIMIT.
    let executed = stack.db.take_executed_statements();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].ends_with("LIMIT 100;"), "got: {}", executed[0]);

    // Wire rows are column-name -> string-or-null.
    let data = outcome.data.unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].get("id"), Some(&serde_json::json!("1")));
    assert_eq!(data[1].get("total_amount"), Some(&serde_json::Value::Null));

    let columns = outcome.columns.unwrap();
    assert_eq!(columns, vec!["id", "name", "total_amount"]);
}

#[test]
fn safety_gate_spec_properties() {
    // Forbidden keyword anywhere rejects, even alongside a SELECT.
    assert!(!is_safe("SELECT * FROM t; DROP TABLE t;"));

    // A clean read passes, whatever the casing.
    assert!(is_safe("select name from customers"));
    assert!(is_safe("Select 1"));

    // No select anywhere rejects.
    assert!(!is_safe("nonsense text"));
}

#[test]
fn shaper_spec_properties() {
    assert_eq!(
        shape_for_execution("SELECT * FROM t", 100),
        "SELECT * FROM t LIMIT 100;"
    );
    assert_eq!(
        shape_for_execution("SELECT * FROM t LIMIT 5", 100),
        "SELECT * FROM t LIMIT 5"
    );
}

async fn build_http_state() -> web::Data<AppState> {
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

    web::Data::new(state)
}

#[actix_web::test]
async fn login_then_ask_over_http() {
    let state = build_http_state().await;
    let app =
        test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    // Login with the default credentials.
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(serde_json::json!({"username": "admin", "password": "password"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    // Ask a question with the bearer token.
    let req = test::TestRequest::post()
        .uri("/api/v1/query/ask")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(serde_json::json!({
            "question": "count the orders",
            "method": "graph"
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["method"], "graph");
    assert!(body["sql_query"].as_str().unwrap().to_lowercase().contains("select"));
    assert!(body["intermediate_steps"].as_array().unwrap().len() >= 4);
}

#[actix_web::test]
async fn ask_without_token_is_rejected() {
    let state = build_http_state().await;
    let app =
        test::init_service(App::new().app_data(state).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/query/ask")
        .set_json(serde_json::json!({"question": "anything"}))
        .to_request();

    let response = test::call_service(&app, req).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn destructive_question_over_http_reports_rejection() {
    let state = build_http_state().await;
    let app =
        test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let token = state.auth.issue_token("admin").unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/query/ask")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(serde_json::json!({"question": "drop the customers table"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("forbidden keyword"));
}
