//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns, shaped to match
//! whichever prompt contract the caller used (JSON object, fenced SQL, bare
//! SQL, classification, or narration).

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit and integration testing without making real API calls.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the combined prompt contains `pattern`, the mock returns
    /// `response` verbatim. Custom mappings win over the built-in heuristics.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Generates a mock response for the combined prompt text.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        // Classification calls get a bare class name.
        if input_lower.contains("respond with exactly one of: simple, complex, analytical") {
            if input_lower.contains("average")
                || input_lower.contains("trend")
                || input_lower.contains("per ")
            {
                return "complex".to_string();
            }
            return "simple".to_string();
        }

        // Narration calls get prose.
        if input_lower.contains("write an answer to the user's question") {
            return "The query ran successfully; the rows above answer the question.".to_string();
        }

        let sql = Self::sql_for_question(&input_lower);

        // JSON-contract generation.
        if input_lower.contains("respond as a json object") {
            return format!(
                r#"{{"sql_query": "{}", "explanation": "Generated for the mock store schema.", "confidence": 0.9, "tables_used": []}}"#,
                sql.replace('"', "\\\"")
            );
        }

        // Staged generation expects the statement alone, typically fenced.
        if input_lower.contains("return only the sql query:") {
            return format!("```sql\n{}\n```", sql);
        }

        // Chain generation ends with "SQL query:" and expects bare SQL.
        if input_lower.trim_end().ends_with("sql query:") {
            return sql;
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    /// Picks a canned statement matching keywords in the question.
    fn sql_for_question(input_lower: &str) -> String {
        // Questions asking for destructive operations yield the statement the
        // user asked for; tests rely on the gate stopping it downstream.
        if input_lower.contains("drop") {
            return "DROP TABLE customers;".to_string();
        }
        if input_lower.contains("delete") {
            return "DELETE FROM customers;".to_string();
        }

        if input_lower.contains("count") && input_lower.contains("order") {
            return "SELECT COUNT(*) FROM orders;".to_string();
        }

        if input_lower.contains("stock") || input_lower.contains("product") {
            return "SELECT name, stock_quantity FROM products WHERE stock_quantity < 10 ORDER BY stock_quantity ASC;".to_string();
        }

        if input_lower.contains("customer") {
            return "SELECT * FROM customers ORDER BY id;".to_string();
        }

        "SELECT 1;".to_string()
    }

    /// Combines every message's content for pattern matching.
    fn combined_input(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::combined_input(messages);
        Ok(self.mock_response(&input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompt;
    use crate::llm::types::Message;

    #[tokio::test]
    async fn test_json_contract_response() {
        let client = MockLlmClient::new();
        let messages = vec![
            Message::system(prompt::GENERATION_SYSTEM_PROMPT),
            Message::user("Question: show me all customers"),
        ];

        let response = client.complete(&messages).await.unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert!(parsed["sql_query"]
            .as_str()
            .unwrap()
            .contains("SELECT * FROM customers"));
    }

    #[tokio::test]
    async fn test_staged_response_is_fenced() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user(prompt::build_staged_sql_prompt(
            "count the orders",
            "simple",
            "",
            "",
        ))];

        let response = client.complete(&messages).await.unwrap();

        assert!(response.starts_with("```sql"));
        assert!(response.contains("SELECT COUNT(*) FROM orders"));
    }

    #[tokio::test]
    async fn test_chain_response_is_bare_sql() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user(prompt::build_chain_prompt(
            "who are the customers",
            "",
            "",
            "",
        ))];

        let response = client.complete(&messages).await.unwrap();

        assert!(response.starts_with("SELECT"));
        assert!(!response.contains("```"));
    }

    #[tokio::test]
    async fn test_classification_response() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user(prompt::build_complexity_prompt(
            "list customers",
        ))];

        let response = client.complete(&messages).await.unwrap();
        assert_eq!(response, "simple");
    }

    #[tokio::test]
    async fn test_classification_complex_question() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user(prompt::build_complexity_prompt(
            "average order value per customer",
        ))];

        let response = client.complete(&messages).await.unwrap();
        assert_eq!(response, "complex");
    }

    #[tokio::test]
    async fn test_destructive_question_yields_destructive_sql() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user(prompt::build_staged_sql_prompt(
            "drop the customers table",
            "simple",
            "",
            "",
        ))];

        let response = client.complete(&messages).await.unwrap();
        assert!(response.contains("DROP TABLE customers"));
    }

    #[tokio::test]
    async fn test_custom_response_wins() {
        let client = MockLlmClient::new()
            .with_response("special report", "SELECT report FROM specials;");

        let messages = vec![Message::user("Run the special report\nSQL query:")];
        let response = client.complete(&messages).await.unwrap();

        assert_eq!(response, "SELECT report FROM specials;");
    }

    #[tokio::test]
    async fn test_unmatched_input_yields_fallback() {
        let client = MockLlmClient::new();
        let messages = vec![Message::user("What is the meaning of life?")];

        let response = client.complete(&messages).await.unwrap();
        assert!(response.contains("don't understand"));
    }
}
