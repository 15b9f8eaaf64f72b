//! The hand-rolled pipeline engine.
//!
//! Straight-line sequence: retrieve context, generate SQL under the JSON
//! contract, validate (gate plus an EXPLAIN round-trip), execute, and
//! narrate from a template. The fastest engine and the default.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

use crate::engines::{Engine, EngineKind, EngineOutcome, EngineRequest};
use crate::error::SageError;
use crate::llm::{parser, prompt, LlmClient, Message};
use crate::query::QueryExecutor;
use crate::retrieval::{Retriever, DEFAULT_TOP_K};

/// Pipeline engine.
pub struct PipelineEngine {
    llm: Arc<dyn LlmClient>,
    retriever: Arc<Retriever>,
    executor: Arc<QueryExecutor>,
    top_k: usize,
}

impl PipelineEngine {
    /// Creates a pipeline engine.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<Retriever>,
        executor: Arc<QueryExecutor>,
    ) -> Self {
        Self {
            llm,
            retriever,
            executor,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Overrides the retrieval depth.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieves context and generates a candidate statement.
    async fn generate_sql(
        &self,
        question: &str,
        user_context: Option<&str>,
    ) -> Result<parser::GeneratedSql, SageError> {
        let context = self.retriever.search_context(question, self.top_k).await?;

        let user_prompt = prompt::build_generation_prompt(
            question,
            &context.schema_texts(),
            &context.term_texts(),
            &context.example_texts(),
            user_context,
        );

        let messages = vec![
            Message::system(prompt::GENERATION_SYSTEM_PROMPT),
            Message::user(user_prompt),
        ];

        let response = self.llm.complete(&messages).await?;
        Ok(parser::parse_generation_response(&response))
    }
}

#[async_trait]
impl Engine for PipelineEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Pipeline
    }

    async fn answer(&self, request: &EngineRequest) -> EngineOutcome {
        let question = request.question.as_str();

        // 1. Generate.
        let generated = match self
            .generate_sql(question, request.user_context.as_deref())
            .await
        {
            Ok(generated) => generated,
            Err(e) => {
                error!("SQL generation failed: {}", e);
                return EngineOutcome::failure(question, self.kind(), e.to_string());
            }
        };

        let Some(sql_query) = generated.sql_query.clone() else {
            let mut outcome = EngineOutcome::failure(
                question,
                self.kind(),
                generated
                    .error
                    .unwrap_or_else(|| "SQL generation failed".to_string()),
            );
            outcome.explanation = generated.explanation;
            return outcome;
        };

        // 2. Validate: safety gate plus a syntax round-trip.
        if let Err(e) = self.executor.validate(&sql_query).await {
            let mut outcome = EngineOutcome::failure(question, self.kind(), e.to_string());
            outcome.sql_query = Some(sql_query);
            outcome.explanation = generated.explanation;
            return outcome;
        }

        // 3. Execute.
        let execution = match self.executor.execute(&sql_query).await {
            Ok(execution) => execution,
            Err(e) => {
                let mut outcome = EngineOutcome::failure(question, self.kind(), e.to_string());
                outcome.sql_query = Some(sql_query);
                outcome.explanation = generated.explanation;
                return outcome;
            }
        };

        // 4. Narrate from a template.
        let answer = if execution.row_count > 0 {
            match &generated.explanation {
                Some(explanation) => format!(
                    "Found {} matching rows.\n\n{}",
                    execution.row_count, explanation
                ),
                None => format!("Found {} matching rows.", execution.row_count),
            }
        } else {
            "The query ran successfully but returned no rows.".to_string()
        };

        EngineOutcome {
            success: true,
            question: question.to_string(),
            answer,
            sql_query: Some(sql_query),
            columns: Some(execution.columns),
            row_count: Some(execution.row_count),
            data: Some(execution.data),
            explanation: generated.explanation,
            confidence: generated.confidence,
            method: self.kind().as_str().to_string(),
            ..EngineOutcome::default()
        }
    }
}
