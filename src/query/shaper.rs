//! Execution shaping for generated SQL.
//!
//! Bounds result size by appending a `LIMIT` clause to statements that lack
//! one, and converts typed result rows into the stringified wire format
//! served to API clients.

use crate::db::{QueryResult, Row, Value};

/// Default row limit applied to statements without an explicit LIMIT.
///
/// A single configurable default is used at every call site.
pub const DEFAULT_ROW_LIMIT: usize = 100;

/// A result row as served over the wire: column name to stringified value
/// or null, in column order.
pub type RowObject = serde_json::Map<String, serde_json::Value>;

/// Bounds a statement's result size.
///
/// If the statement does not already contain the token `limit`
/// (case-insensitive, anywhere), trailing semicolons are stripped and
/// ` LIMIT {limit};` is appended. Statements that mention `limit` are
/// returned unchanged — including ones where the token appears in a string
/// literal or identifier, which is accepted imprecision.
pub fn shape_for_execution(candidate: &str, limit: usize) -> String {
    if candidate.to_lowercase().contains("limit") {
        return candidate.to_string();
    }

    format!("{} LIMIT {};", candidate.trim_end_matches(';'), limit)
}

/// Formats a single row for the wire.
///
/// Each column maps to JSON null when the cell is NULL, otherwise to the
/// value's string representation. Typed fidelity is intentionally lost —
/// numerics become their textual form; callers needing typed data re-parse.
pub fn format_row(row: &Row, columns: &[String]) -> RowObject {
    let mut object = RowObject::new();
    for (i, column) in columns.iter().enumerate() {
        let value = match row.get(i) {
            Some(Value::Null) | None => serde_json::Value::Null,
            Some(value) => serde_json::Value::String(value.to_display_string()),
        };
        object.insert(column.clone(), value);
    }
    object
}

/// Formats every row of a query result for the wire.
pub fn format_rows(result: &QueryResult) -> Vec<RowObject> {
    let columns = result.column_names();
    result
        .rows
        .iter()
        .map(|row| format_row(row, &columns))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ColumnInfo;

    #[test]
    fn test_shape_appends_limit() {
        assert_eq!(
            shape_for_execution("SELECT * FROM t", 100),
            "SELECT * FROM t LIMIT 100;"
        );
    }

    #[test]
    fn test_shape_strips_trailing_semicolons() {
        assert_eq!(
            shape_for_execution("SELECT * FROM t;", 100),
            "SELECT * FROM t LIMIT 100;"
        );
        assert_eq!(
            shape_for_execution("SELECT * FROM t;;", 50),
            "SELECT * FROM t LIMIT 50;"
        );
    }

    #[test]
    fn test_shape_leaves_existing_limit_untouched() {
        assert_eq!(
            shape_for_execution("SELECT * FROM t LIMIT 5", 100),
            "SELECT * FROM t LIMIT 5"
        );
        assert_eq!(
            shape_for_execution("select * from t limit 5;", 100),
            "select * from t limit 5;"
        );
    }

    #[test]
    fn test_shape_limit_token_anywhere_suppresses_append() {
        // The token check is textual; a column named `limit_value` counts.
        let sql = "SELECT limit_value FROM quotas";
        assert_eq!(shape_for_execution(sql, 100), sql);
    }

    #[test]
    fn test_shape_respects_configured_limit() {
        assert_eq!(
            shape_for_execution("SELECT id FROM t", 25),
            "SELECT id FROM t LIMIT 25;"
        );
    }

    #[test]
    fn test_format_row_stringifies_values() {
        let row = vec![Value::Int(1), Value::Null];
        let columns = vec!["a".to_string(), "b".to_string()];

        let object = format_row(&row, &columns);

        assert_eq!(object.get("a"), Some(&serde_json::json!("1")));
        assert_eq!(object.get("b"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_format_row_preserves_column_order() {
        let row = vec![
            Value::String("x".to_string()),
            Value::Float(2.5),
            Value::Bool(true),
        ];
        let columns = vec!["s".to_string(), "f".to_string(), "b".to_string()];

        let object = format_row(&row, &columns);
        let keys: Vec<&String> = object.keys().collect();

        assert_eq!(keys, vec!["s", "f", "b"]);
        assert_eq!(object.get("f"), Some(&serde_json::json!("2.5")));
        assert_eq!(object.get("b"), Some(&serde_json::json!("true")));
    }

    #[test]
    fn test_format_row_missing_cells_are_null() {
        let row = vec![Value::Int(1)];
        let columns = vec!["a".to_string(), "b".to_string()];

        let object = format_row(&row, &columns);
        assert_eq!(object.get("b"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_format_rows_whole_result() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("n", "integer")],
            vec![vec![Value::Int(1)], vec![Value::Null]],
        );

        let rows = format_rows(&result);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("n"), Some(&serde_json::json!("1")));
        assert_eq!(rows[1].get("n"), Some(&serde_json::Value::Null));
    }
}
