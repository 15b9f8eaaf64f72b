//! The staged engine.
//!
//! Runs a fixed sequence of stages — analyze the question, retrieve context,
//! generate SQL, execute, analyze the result, synthesize an answer — and
//! records a timestamped trace entry per stage so callers can inspect how
//! the answer was produced. Generation failures route straight to answer
//! synthesis; nothing executes without passing the gate.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engines::{Engine, EngineKind, EngineOutcome, EngineRequest, IntermediateStep};
use crate::llm::{parser, prompt, LlmClient, Message};
use crate::query::{ExecutionOutcome, QueryExecutor};
use crate::retrieval::Retriever;
use crate::safety;

/// Retrieval depth for the staged engine.
const RETRIEVAL_DEPTH: usize = 5;

/// Confidence reported when execution succeeds.
const CONFIDENCE_SUCCESS: f64 = 0.9;

/// Confidence reported when execution fails.
const CONFIDENCE_FAILURE: f64 = 0.3;

/// Accepted complexity classes; anything else degrades to `simple`.
const ANALYSIS_TYPES: [&str; 3] = ["simple", "complex", "analytical"];

/// Mutable state threaded through the stages.
#[derive(Debug, Default)]
struct StageState {
    analysis_type: String,
    context: String,
    sql_query: Option<String>,
    execution: Option<ExecutionOutcome>,
    confidence: f64,
    error: Option<String>,
    steps: Vec<IntermediateStep>,
}

/// Staged engine.
pub struct GraphEngine {
    llm: Arc<dyn LlmClient>,
    retriever: Arc<Retriever>,
    executor: Arc<QueryExecutor>,
}

impl GraphEngine {
    /// Creates a staged engine.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<Retriever>,
        executor: Arc<QueryExecutor>,
    ) -> Self {
        Self {
            llm,
            retriever,
            executor,
        }
    }

    /// Stage 1: classify question complexity.
    ///
    /// Any failure or out-of-contract response degrades to `simple`.
    async fn analyze_question(&self, question: &str, state: &mut StageState) {
        let messages = vec![Message::user(prompt::build_complexity_prompt(question))];

        let analysis_type = match self.llm.complete(&messages).await {
            Ok(response) => {
                let class = response.trim().to_lowercase();
                if ANALYSIS_TYPES.contains(&class.as_str()) {
                    class
                } else {
                    "simple".to_string()
                }
            }
            Err(e) => {
                debug!("Complexity analysis failed, defaulting to simple: {}", e);
                "simple".to_string()
            }
        };

        state.steps.push(IntermediateStep::now(
            "question_analysis",
            format!("Question complexity: {}", analysis_type),
        ));
        state.analysis_type = analysis_type;
    }

    /// Stage 2: retrieve related documents.
    ///
    /// Retrieval failure leaves the context empty rather than aborting.
    async fn retrieve_context(&self, question: &str, state: &mut StageState) {
        match self.retriever.search_context(question, RETRIEVAL_DEPTH).await {
            Ok(context) => {
                state.steps.push(IntermediateStep::now(
                    "context_retrieval",
                    format!("Retrieved {} related documents", context.len()),
                ));
                state.context = context.concatenated(RETRIEVAL_DEPTH);
            }
            Err(e) => {
                warn!("Context retrieval failed: {}", e);
                state.steps.push(IntermediateStep::now(
                    "context_retrieval",
                    "Context retrieval failed; continuing without context",
                ));
                state.context = String::new();
            }
        }
    }

    /// Stage 3: generate the candidate statement and gate it.
    async fn generate_sql(&self, question: &str, state: &mut StageState) {
        let schema_info = match self.executor.db().introspect_schema().await {
            Ok(schema) => schema.format_for_llm(),
            Err(e) => {
                warn!("Schema introspection failed: {}", e);
                String::new()
            }
        };

        let messages = vec![Message::user(prompt::build_staged_sql_prompt(
            question,
            &state.analysis_type,
            &schema_info,
            &state.context,
        ))];

        match self.llm.complete(&messages).await {
            Ok(response) => {
                let candidate = parser::strip_code_fences(&response);
                let candidate = candidate.trim();

                let preview: String = candidate.chars().take(100).collect();
                state.steps.push(IntermediateStep::now(
                    "sql_generation",
                    format!("Generated SQL: {}", preview),
                ));

                if safety::is_safe(candidate) {
                    state.sql_query = Some(candidate.to_string());
                    state.error = None;
                } else {
                    state.sql_query = None;
                    state.error =
                        Some("The generated SQL failed the safety check.".to_string());
                }
            }
            Err(e) => {
                state.sql_query = None;
                state.error = Some(format!("SQL generation failed: {}", e));
            }
        }
    }

    /// Stage 4: execute the gated statement.
    async fn execute_sql(&self, state: &mut StageState) {
        let Some(sql_query) = state.sql_query.clone() else {
            return;
        };

        match self.executor.execute(&sql_query).await {
            Ok(execution) => {
                state.confidence = CONFIDENCE_SUCCESS;
                state.steps.push(IntermediateStep::now(
                    "sql_execution",
                    format!("Query executed, rows: {}", execution.row_count),
                ));
                state.execution = Some(execution);
            }
            Err(e) => {
                state.confidence = CONFIDENCE_FAILURE;
                state.error = Some(e.to_string());
                state.steps.push(IntermediateStep::now(
                    "sql_execution",
                    format!("Query failed: {}", e),
                ));
            }
        }
    }

    /// Stage 5: summarize the result shape.
    fn analyze_result(&self, state: &mut StageState) {
        if let Some(execution) = &state.execution {
            state.steps.push(IntermediateStep::now(
                "result_analysis",
                format!(
                    "Result: {} rows, {} columns",
                    execution.row_count,
                    execution.columns.len()
                ),
            ));
        }
    }

    /// Stage 6: synthesize the final answer.
    async fn generate_answer(&self, question: &str, state: &mut StageState) -> String {
        let answer = if let Some(error) = &state.error {
            format!(
                "Sorry, something went wrong while answering the question: {}",
                error
            )
        } else if let Some(execution) = &state.execution {
            let messages = vec![Message::user(prompt::build_answer_prompt(
                question,
                state.sql_query.as_deref().unwrap_or(""),
                execution.row_count,
            ))];

            match self.llm.complete(&messages).await {
                Ok(response) => response.trim().to_string(),
                Err(e) => {
                    debug!("Answer synthesis failed, using fallback: {}", e);
                    format!(
                        "Found results for the question. {} rows in total.",
                        execution.row_count
                    )
                }
            }
        } else {
            "No answer could be found for the question.".to_string()
        };

        state.steps.push(IntermediateStep::now(
            "answer_generation",
            "Final answer generated",
        ));

        answer
    }
}

#[async_trait]
impl Engine for GraphEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Graph
    }

    async fn answer(&self, request: &EngineRequest) -> EngineOutcome {
        let question = request.question.as_str();
        let mut state = StageState::default();

        self.analyze_question(question, &mut state).await;
        self.retrieve_context(question, &mut state).await;
        self.generate_sql(question, &mut state).await;

        // Generation errors skip execution and go straight to the answer.
        if state.sql_query.is_some() && state.error.is_none() {
            self.execute_sql(&mut state).await;
            self.analyze_result(&mut state);
        }

        let answer = self.generate_answer(question, &mut state).await;

        let success = state.error.is_none() && state.execution.is_some();
        let (data, columns, row_count) = match &state.execution {
            Some(execution) => (
                Some(execution.data.clone()),
                Some(execution.columns.clone()),
                Some(execution.row_count),
            ),
            None => (None, None, None),
        };

        EngineOutcome {
            success,
            question: question.to_string(),
            answer,
            sql_query: state.sql_query,
            data,
            columns,
            row_count,
            confidence: Some(state.confidence),
            analysis_type: Some(state.analysis_type),
            intermediate_steps: Some(state.steps),
            error: state.error,
            method: self.kind().as_str().to_string(),
            ..EngineOutcome::default()
        }
    }
}
