//! Question-answering engines.
//!
//! Three interchangeable strategies sit behind one `Engine` trait: the
//! hand-rolled pipeline, the staged engine with an inspectable trace, and
//! the conversational chain engine. A request picks its strategy by name;
//! all three share the same retriever, generation client, and gated
//! executor, and produce the same outcome shape.

pub mod chain;
pub mod graph;
pub mod pipeline;

pub use chain::ChainEngine;
pub use graph::GraphEngine;
pub use pipeline::PipelineEngine;

use async_trait::async_trait;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::query::RowObject;

/// A question to answer.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// The natural-language question.
    pub question: String,
    /// Caller-supplied extra context folded into generation.
    pub user_context: Option<String>,
    /// Key scoping conversation memory (one per authenticated session).
    pub session_key: String,
}

impl EngineRequest {
    /// Creates a request with no extra context.
    pub fn new(question: impl Into<String>, session_key: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            user_context: None,
            session_key: session_key.into(),
        }
    }

    /// Attaches caller-supplied context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.user_context = Some(context.into());
        self
    }
}

/// One timestamped step of an engine's trace.
#[derive(Debug, Clone, Serialize)]
pub struct IntermediateStep {
    pub step: String,
    pub result: String,
    pub timestamp: String,
}

impl IntermediateStep {
    /// Creates a step stamped with the current time.
    pub fn now(step: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            result: result.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// The uniform result every engine produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineOutcome {
    pub success: bool,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<RowObject>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate_steps: Option<Vec<IntermediateStep>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub method: String,
}

impl EngineOutcome {
    /// Creates a failure outcome with an apologetic answer.
    pub fn failure(
        question: &str,
        method: EngineKind,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            success: false,
            question: question.to_string(),
            answer: format!(
                "Sorry, I could not produce an answer for '{}'.\nError: {}",
                question, error
            ),
            error: Some(error),
            method: method.as_str().to_string(),
            ..Self::default()
        }
    }
}

/// The strategy used to answer a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Hand-rolled retrieve/generate/validate/execute sequence.
    #[default]
    Pipeline,
    /// Staged engine emitting an inspectable trace.
    Graph,
    /// Conversational engine with per-session memory.
    Chain,
}

impl EngineKind {
    /// Returns the engine name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::Graph => "graph",
            Self::Chain => "chain",
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    /// Parses an engine name. The names the source API used for these
    /// strategies are accepted as aliases.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pipeline" | "original" => Ok(Self::Pipeline),
            "graph" | "langgraph" => Ok(Self::Graph),
            "chain" | "langchain" => Ok(Self::Chain),
            _ => Err(format!(
                "Unknown engine '{}'. Expected: pipeline, graph, or chain",
                s
            )),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait implemented by every question-answering strategy.
///
/// `answer` never returns an error: every failure is folded into an outcome
/// with `success: false` and a human-readable `error` string.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> EngineKind;

    /// Answers the question.
    async fn answer(&self, request: &EngineRequest) -> EngineOutcome;
}

/// The full set of engines, dispatched by kind.
pub struct EngineSet {
    pipeline: Arc<PipelineEngine>,
    graph: Arc<GraphEngine>,
    chain: Arc<ChainEngine>,
}

impl EngineSet {
    /// Creates the set from the three engines.
    pub fn new(
        pipeline: Arc<PipelineEngine>,
        graph: Arc<GraphEngine>,
        chain: Arc<ChainEngine>,
    ) -> Self {
        Self {
            pipeline,
            graph,
            chain,
        }
    }

    /// Returns the engine for a kind.
    pub fn engine(&self, kind: EngineKind) -> Arc<dyn Engine> {
        match kind {
            EngineKind::Pipeline => self.pipeline.clone(),
            EngineKind::Graph => self.graph.clone(),
            EngineKind::Chain => self.chain.clone(),
        }
    }
}
