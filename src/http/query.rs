//! Question-answering handlers.
//!
//! The ask endpoint dispatches to an engine by request method; the auxiliary
//! endpoints expose knowledge-base statistics, initialization, and per-user
//! query history. All handlers require a bearer token.

use actix_web::{web, HttpResponse};
use tracing::{error, info};

use crate::engines::{EngineKind, EngineOutcome, EngineRequest};
use crate::history::{NewHistoryEntry, QueryStatus};
use crate::http::auth::AuthenticatedUser;
use crate::http::models::{
    AskRequest, ErrorResponse, HistoryResponse, InitializeResponse, StatsResponse,
};
use crate::http::AppState;

/// How many history entries the history endpoint returns.
const HISTORY_LIMIT: i64 = 50;

/// POST /api/v1/query/ask
///
/// Answers a question with the engine named in the request (or the
/// configured default).
pub async fn ask_handler(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<AskRequest>,
) -> HttpResponse {
    let kind = match &body.method {
        Some(method) => match method.parse::<EngineKind>() {
            Ok(kind) => kind,
            Err(e) => {
                return HttpResponse::BadRequest()
                    .json(ErrorResponse::new("invalid_method", e));
            }
        },
        None => state.default_engine,
    };

    answer_with(state, user, body.into_inner(), kind).await
}

/// POST /api/v1/query/engine/{engine}
///
/// Directly invokes one engine, bypassing the method field.
pub async fn engine_handler(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<AskRequest>,
) -> HttpResponse {
    let kind = match path.parse::<EngineKind>() {
        Ok(kind) => kind,
        Err(e) => {
            return HttpResponse::NotFound().json(ErrorResponse::new("unknown_engine", e));
        }
    };

    answer_with(state, user, body.into_inner(), kind).await
}

/// Runs a question through an engine and records the outcome.
async fn answer_with(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    request: AskRequest,
    kind: EngineKind,
) -> HttpResponse {
    let mut engine_request =
        EngineRequest::new(request.question.clone(), user.username().to_string());
    if let Some(context) = request.context {
        engine_request = engine_request.with_context(context);
    }

    info!(
        "Answering question with {} engine for {}",
        kind,
        user.username()
    );

    let outcome = state.engines.engine(kind).answer(&engine_request).await;

    record_history(&state, user.username(), &outcome);

    HttpResponse::Ok().json(outcome)
}

/// GET /api/v1/query/stats
pub async fn stats_handler(state: web::Data<AppState>, _user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(StatsResponse {
        stats: state.retriever.stats(),
    })
}

/// POST /api/v1/query/initialize
///
/// (Re)builds the knowledge base from the live schema and seed documents.
pub async fn initialize_handler(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> HttpResponse {
    match state.retriever.initialize(state.db.as_ref()).await {
        Ok(documents_indexed) => HttpResponse::Ok().json(InitializeResponse {
            message: "Knowledge base initialized successfully.".to_string(),
            documents_indexed,
        }),
        Err(e) => {
            error!("Knowledge base initialization failed: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("initialize_failed", e.to_string()))
        }
    }
}

/// GET /api/v1/query/history
pub async fn history_handler(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> HttpResponse {
    match state
        .history
        .recent_for_user(user.username(), HISTORY_LIMIT)
        .await
    {
        Ok(history) => HttpResponse::Ok().json(HistoryResponse { history }),
        Err(e) => {
            error!("History lookup failed: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("history_failed", e.to_string()))
        }
    }
}

/// Records an outcome in history without blocking the response.
fn record_history(state: &web::Data<AppState>, username: &str, outcome: &EngineOutcome) {
    let status = if outcome.success {
        QueryStatus::Success
    } else if outcome
        .error
        .as_deref()
        .is_some_and(|e| e.contains("Unsafe query rejected") || e.contains("safety check"))
    {
        QueryStatus::Rejected
    } else {
        QueryStatus::Error
    };

    let entry = NewHistoryEntry {
        username: username.to_string(),
        engine: outcome.method.clone(),
        question: outcome.question.clone(),
        sql: outcome.sql_query.clone(),
        status,
        execution_time_ms: None,
        row_count: outcome.row_count.map(|n| n as i64),
        error_message: outcome.error.clone(),
    };

    let history = state.history.clone();
    tokio::spawn(async move {
        if let Err(e) = history.record(entry).await {
            error!("Failed to record history entry: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::{authorized, test_state};
    use actix_web::{test, App};

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/ask", web::post().to(ask_handler))
            .route("/stats", web::get().to(stats_handler))
            .route("/initialize", web::post().to(initialize_handler))
            .route("/history", web::get().to(history_handler))
            .route("/engine/{engine}", web::post().to(engine_handler));
    }

    #[actix_web::test]
    async fn test_ask_requires_auth() {
        let state = test_state().await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .set_json(serde_json::json!({"question": "how many customers?"}))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_ask_answers_with_default_engine() {
        let state = test_state().await;
        let token = authorized(&state);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({"question": "show me all customers"}))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["method"], "pipeline");
        assert!(body["sql_query"].as_str().unwrap().contains("customers"));
        assert_eq!(body["row_count"], 2);
    }

    #[actix_web::test]
    async fn test_ask_honors_method_alias() {
        let state = test_state().await;
        let token = authorized(&state);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({
                "question": "count the orders",
                "method": "langgraph"
            }))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["method"], "graph");
        assert!(body["intermediate_steps"].is_array());
    }

    #[actix_web::test]
    async fn test_ask_unknown_method_is_400() {
        let state = test_state().await;
        let token = authorized(&state);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({"question": "q", "method": "telepathy"}))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_direct_engine_route() {
        let state = test_state().await;
        let token = authorized(&state);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/engine/chain")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({"question": "who are the customers"}))
            .to_request();

        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["method"], "chain");
    }

    #[actix_web::test]
    async fn test_unknown_engine_is_404() {
        let state = test_state().await;
        let token = authorized(&state);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/engine/quantum")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({"question": "q"}))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_initialize_then_stats() {
        let state = test_state().await;
        let token = authorized(&state);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/initialize")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["documents_indexed"], 13);

        let req = test::TestRequest::get()
            .uri("/stats")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let stats = body["stats"].as_array().unwrap();
        assert_eq!(stats.len(), 3);
        let total: u64 = stats.iter().map(|s| s["count"].as_u64().unwrap()).sum();
        assert_eq!(total, 13);
    }

    #[actix_web::test]
    async fn test_history_reflects_asked_questions() {
        let state = test_state().await;
        let token = authorized(&state);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/ask")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({"question": "show me all customers"}))
            .to_request();
        test::call_service(&app, req).await;

        // History writes are fire-and-forget; give the task a beat.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let req = test::TestRequest::get()
            .uri("/history")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["question"], "show me all customers");
        assert_eq!(history[0]["status"], "success");
    }
}
