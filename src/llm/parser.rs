//! Response parsing for LLM outputs.
//!
//! Generated SQL arrives either as a JSON object following the generation
//! prompt's contract, or as free text with a fenced code block. The parser
//! tries the JSON contract first, then falls back to fence extraction, then
//! gives up with a zero-confidence result.

use serde::Deserialize;

use crate::safety::referenced_tables;

/// Parsed output of a SQL-generation completion.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GeneratedSql {
    /// The generated statement, if any.
    #[serde(default)]
    pub sql_query: Option<String>,

    /// Model-provided explanation of the statement.
    #[serde(default)]
    pub explanation: Option<String>,

    /// Model-reported confidence in [0, 1].
    #[serde(default)]
    pub confidence: Option<f64>,

    /// Tables the statement touches.
    #[serde(default)]
    pub tables_used: Vec<String>,

    /// Parse-stage error, when no statement could be recovered.
    #[serde(default)]
    pub error: Option<String>,
}

impl GeneratedSql {
    /// Returns true if a statement was recovered.
    pub fn has_query(&self) -> bool {
        self.sql_query.is_some()
    }
}

/// Parses a generation response into a `GeneratedSql`.
pub fn parse_generation_response(response: &str) -> GeneratedSql {
    let trimmed = response.trim();

    // JSON contract first.
    if trimmed.starts_with('{') {
        return match serde_json::from_str::<GeneratedSql>(trimmed) {
            Ok(parsed) => parsed,
            Err(e) => GeneratedSql {
                sql_query: None,
                explanation: Some("The response could not be parsed.".to_string()),
                confidence: Some(0.0),
                tables_used: Vec::new(),
                error: Some(e.to_string()),
            },
        };
    }

    // Fenced SQL block fallback.
    if let Some(sql) = extract_code_block(trimmed, "sql") {
        let sql = sql.trim().to_string();
        let tables_used = referenced_tables(&sql);
        return GeneratedSql {
            sql_query: Some(sql),
            explanation: Some("Extracted the SQL query from the response.".to_string()),
            confidence: Some(0.7),
            tables_used,
            error: None,
        };
    }

    GeneratedSql {
        sql_query: None,
        explanation: Some("No SQL query could be generated.".to_string()),
        confidence: Some(0.0),
        tables_used: Vec::new(),
        error: Some("response did not contain a query".to_string()),
    }
}

/// Strips Markdown code fences from a completion that should be bare SQL.
///
/// Removes a leading ```` ```sql ```` (or plain ```` ``` ````) fence and a
/// trailing ```` ``` ```` fence, leaving anything else untouched.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = text.trim();

    if let Some(rest) = out.strip_prefix("```sql") {
        out = rest.trim_start();
    } else if let Some(rest) = out.strip_prefix("```") {
        out = rest.trim_start();
    }

    if let Some(rest) = out.strip_suffix("```") {
        out = rest.trim_end();
    }

    out.to_string()
}

/// Extracts content from a markdown code block with the specified language.
fn extract_code_block(text: &str, lang: &str) -> Option<String> {
    let start_pattern = format!("```{}", lang);

    let start_idx = text.find(&start_pattern)?;

    // Content begins after the newline that ends the opening fence.
    let content_start = text[start_idx + start_pattern.len()..]
        .find('\n')
        .map(|i| start_idx + start_pattern.len() + i + 1)?;

    let end_idx = text[content_start..].find("```")?;

    Some(text[content_start..content_start + end_idx].to_string())
}
