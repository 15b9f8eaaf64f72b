//! The conversational chain engine.
//!
//! Folds the session transcript into generation so follow-up questions can
//! lean on earlier turns, then runs the same gate-execute-narrate tail as
//! the other engines. Each session's transcript is scoped by session key
//! and updated with the final answer.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

use crate::engines::{Engine, EngineKind, EngineOutcome, EngineRequest};
use crate::error::SageError;
use crate::llm::{parser, prompt, LlmClient, Message};
use crate::memory::SessionMemory;
use crate::query::QueryExecutor;
use crate::retrieval::{Retriever, DEFAULT_TOP_K};

/// Chain engine.
pub struct ChainEngine {
    llm: Arc<dyn LlmClient>,
    retriever: Arc<Retriever>,
    executor: Arc<QueryExecutor>,
    memory: Arc<SessionMemory>,
}

impl ChainEngine {
    /// Creates a chain engine.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<Retriever>,
        executor: Arc<QueryExecutor>,
        memory: Arc<SessionMemory>,
    ) -> Self {
        Self {
            llm,
            retriever,
            executor,
            memory,
        }
    }

    /// Generates a candidate statement from schema, context, and transcript.
    async fn generate_sql(&self, request: &EngineRequest) -> Result<String, SageError> {
        let context = match self
            .retriever
            .search_context(&request.question, DEFAULT_TOP_K)
            .await
        {
            Ok(context) => context.concatenated(DEFAULT_TOP_K),
            Err(e) => {
                warn!("Context retrieval failed: {}", e);
                String::new()
            }
        };

        let schema_info = match self.executor.db().introspect_schema().await {
            Ok(schema) => schema.format_for_llm(),
            Err(e) => {
                warn!("Schema introspection failed: {}", e);
                String::new()
            }
        };

        let transcript = self
            .memory
            .transcript(&request.session_key)
            .format_transcript();

        let messages = vec![Message::user(prompt::build_chain_prompt(
            &request.question,
            &schema_info,
            &context,
            &transcript,
        ))];

        let response = self.llm.complete(&messages).await?;
        let candidate = parser::strip_code_fences(&response);
        let candidate = candidate.trim().to_string();

        if candidate.is_empty() {
            return Err(SageError::generation("model returned an empty statement"));
        }

        Ok(candidate)
    }

    /// Narrates the executed result, falling back to a template.
    async fn narrate(&self, question: &str, sql_query: &str, row_count: usize) -> String {
        let messages = vec![Message::user(prompt::build_answer_prompt(
            question, sql_query, row_count,
        ))];

        match self.llm.complete(&messages).await {
            Ok(response) => response.trim().to_string(),
            Err(e) => {
                error!("Answer synthesis failed: {}", e);
                format!("Found results for the question. {} rows in total.", row_count)
            }
        }
    }
}

#[async_trait]
impl Engine for ChainEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Chain
    }

    async fn answer(&self, request: &EngineRequest) -> EngineOutcome {
        let question = request.question.as_str();

        let sql_query = match self.generate_sql(request).await {
            Ok(sql_query) => sql_query,
            Err(e) => {
                let outcome = EngineOutcome::failure(question, self.kind(), e.to_string());
                self.memory
                    .record_exchange(&request.session_key, question, &outcome.answer);
                return outcome;
            }
        };

        let execution = match self.executor.execute(&sql_query).await {
            Ok(execution) => execution,
            Err(e) => {
                let mut outcome = EngineOutcome::failure(question, self.kind(), e.to_string());
                outcome.sql_query = Some(sql_query);
                self.memory
                    .record_exchange(&request.session_key, question, &outcome.answer);
                return outcome;
            }
        };

        let answer = self
            .narrate(question, &sql_query, execution.row_count)
            .await;

        self.memory
            .record_exchange(&request.session_key, question, &answer);

        EngineOutcome {
            success: true,
            question: question.to_string(),
            answer,
            sql_query: Some(sql_query),
            columns: Some(execution.columns),
            row_count: Some(execution.row_count),
            data: Some(execution.data),
            explanation: Some("Generated with the conversational chain.".to_string()),
            method: self.kind().as_str().to_string(),
            ..EngineOutcome::default()
        }
    }
}
