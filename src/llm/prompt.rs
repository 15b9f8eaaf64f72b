//! Prompt construction for LLM requests.
//!
//! Builds the system and user prompts for SQL generation, question
//! complexity analysis, and answer synthesis. Retrieved context is folded
//! into the generation prompt with fixed per-partition caps.

/// How many retrieved schema documents are included in a generation prompt.
const MAX_SCHEMA_DOCS: usize = 2;

/// How many retrieved business-term documents are included.
const MAX_TERM_DOCS: usize = 3;

/// How many retrieved SQL examples are included.
const MAX_EXAMPLE_DOCS: usize = 2;

/// System prompt for the JSON-contract SQL generation call.
pub const GENERATION_SYSTEM_PROMPT: &str = r#"You are a database expert. Convert the user's natural-language question into a PostgreSQL query.

Rules:
1. Generate SELECT statements only (never INSERT, UPDATE, or DELETE)
2. Generate only safe queries
3. Write the most accurate and efficient query you can
4. Use table and column names exactly as given
5. Respond as a JSON object

Response format:
{
    "sql_query": "SELECT * FROM table_name;",
    "explanation": "What the query does",
    "confidence": 0.9,
    "tables_used": ["table1", "table2"]
}"#;

/// Builds the user prompt for the JSON-contract generation call.
///
/// Retrieved documents are capped per partition to keep the prompt small.
pub fn build_generation_prompt(
    question: &str,
    table_schemas: &[String],
    business_terms: &[String],
    sql_examples: &[String],
    user_context: Option<&str>,
) -> String {
    let mut prompt = format!("Question: {}\n\n", question);

    if !table_schemas.is_empty() {
        prompt.push_str("Available tables:\n");
        for doc in table_schemas.iter().take(MAX_SCHEMA_DOCS) {
            prompt.push_str(&format!("{}\n\n", doc));
        }
    }

    if !business_terms.is_empty() {
        prompt.push_str("Related business terms:\n");
        for doc in business_terms.iter().take(MAX_TERM_DOCS) {
            prompt.push_str(&format!("{}\n", doc));
        }
    }

    if !sql_examples.is_empty() {
        prompt.push_str("\nReference SQL examples:\n");
        for doc in sql_examples.iter().take(MAX_EXAMPLE_DOCS) {
            prompt.push_str(&format!("{}\n\n", doc));
        }
    }

    if let Some(context) = user_context {
        prompt.push_str(&format!("\nAdditional context: {}\n", context));
    }

    prompt.push_str("\nGenerate a SQL query answering the question from the information above.");

    prompt
}

/// Builds the complexity-classification prompt.
///
/// The model must answer with exactly one of `simple`, `complex`, or
/// `analytical`.
pub fn build_complexity_prompt(question: &str) -> String {
    format!(
        r#"Classify the complexity of the following question:

Question: {}

Classification:
- simple: plain lookups and basic filtering
- complex: requires joins, grouping, or aggregate functions
- analytical: advanced analysis, statistics, or trend analysis

Respond with exactly one of: simple, complex, analytical."#,
        question
    )
}

/// Builds the bare-SQL generation prompt used by the staged engine.
///
/// Unlike the JSON contract, this call expects the raw statement (possibly
/// fenced) and nothing else.
pub fn build_staged_sql_prompt(
    question: &str,
    analysis_type: &str,
    schema_info: &str,
    context: &str,
) -> String {
    format!(
        r#"Write a PostgreSQL query for the following question.

Question: {}
Analysis type: {}

Database schema:
{}

Related context:
{}

Rules:
1. Use SELECT statements only (never INSERT, UPDATE, or DELETE)
2. Generate only safe queries
3. Limit results to 100 rows (LIMIT 100)
4. Use appropriate aggregate functions for complex analysis
5. Follow PostgreSQL syntax

Return only the SQL query:"#,
        question, analysis_type, schema_info, context
    )
}

/// Builds the conversational generation prompt used by the chain engine.
///
/// Includes the session transcript so follow-up questions can reference
/// earlier turns.
pub fn build_chain_prompt(
    question: &str,
    schema_info: &str,
    context: &str,
    transcript: &str,
) -> String {
    format!(
        r#"Write a PostgreSQL query for the given input.

Available tables and schema:
{}

Related context:
{}

Conversation so far:
{}

Follow these rules:
1. Use SELECT statements only (never INSERT, UPDATE, or DELETE)
2. Use table and column names exactly as given
3. Use PostgreSQL syntax
4. Limit results with LIMIT (default 100)
5. Write only safe queries

Question: {}
SQL query:"#,
        schema_info, context, transcript, question
    )
}

/// Builds the answer-synthesis prompt summarizing an executed result.
pub fn build_answer_prompt(question: &str, sql_query: &str, row_count: usize) -> String {
    format!(
        r#"Write an answer to the user's question.

Question: {}
Executed SQL: {}
Result rows: {}

Answer in this structure:
1. A direct answer to the question
2. A summary of the main results
3. Additional insight where useful

Be concise and clear."#,
        question, sql_query, row_count
    )
}
