//! Query safety gate.
//!
//! Decides whether a model-generated SQL statement may be executed. The gate
//! is a keyword denylist over the raw statement text combined with a
//! read-query check; it runs before every execution, regardless of which
//! engine produced the statement.

mod tables;

pub use tables::referenced_tables;

/// Keywords that disqualify a statement from execution.
///
/// Matched as case-insensitive substrings anywhere in the statement, not just
/// as the leading keyword. This is deliberately blunt: an identifier that
/// happens to contain one of these words (a table named `execute_log`, say)
/// will be rejected even though the statement is a plain read. That
/// limitation is accepted in exchange for never letting a write slip through
/// on a phrasing the check did not anticipate.
const FORBIDDEN_KEYWORDS: [&str; 12] = [
    "insert", "update", "delete", "drop", "create", "alter", "truncate", "grant", "revoke",
    "exec", "execute", "call",
];

/// Returns true if the candidate statement may be executed.
///
/// The check is a denylist, not an allowlist: a statement passes if it avoids
/// every forbidden keyword and mentions `select` somewhere. Statements are
/// lowercased and trimmed before inspection.
pub fn is_safe(candidate: &str) -> bool {
    let sql_lower = candidate.to_lowercase();
    let sql_lower = sql_lower.trim();

    for keyword in FORBIDDEN_KEYWORDS {
        if sql_lower.contains(keyword) {
            return false;
        }
    }

    if !sql_lower.starts_with("select") && !sql_lower.contains("select") {
        return false;
    }

    true
}

/// Describes why a candidate was rejected, for error reporting.
///
/// Returns `None` when the candidate is safe.
pub fn rejection_reason(candidate: &str) -> Option<String> {
    let sql_lower = candidate.to_lowercase();
    let sql_lower = sql_lower.trim();

    for keyword in FORBIDDEN_KEYWORDS {
        if sql_lower.contains(keyword) {
            return Some(format!("statement contains forbidden keyword '{keyword}'"));
        }
    }

    if !sql_lower.starts_with("select") && !sql_lower.contains("select") {
        return Some("statement is not a SELECT query".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_select_is_safe() {
        assert!(is_safe("select name from customers"));
        assert!(is_safe("SELECT * FROM orders WHERE total_amount > 1000"));
        assert!(is_safe("Select 1"));
    }

    #[test]
    fn test_select_anywhere_passes_read_check() {
        // The read check accepts `select` appearing anywhere, not only as the
        // leading keyword.
        assert!(is_safe("WITH top AS (SELECT * FROM orders) SELECT * FROM top"));
        assert!(is_safe("explain select 1"));
    }

    #[test]
    fn test_forbidden_keywords_reject() {
        assert!(!is_safe("INSERT INTO customers (name) VALUES ('x')"));
        assert!(!is_safe("update customers set name = 'x'"));
        assert!(!is_safe("DELETE FROM customers"));
        assert!(!is_safe("DROP TABLE customers"));
        assert!(!is_safe("CREATE TABLE t (id int)"));
        assert!(!is_safe("ALTER TABLE customers ADD COLUMN x int"));
        assert!(!is_safe("TRUNCATE TABLE logs"));
        assert!(!is_safe("GRANT SELECT ON customers TO reader"));
        assert!(!is_safe("REVOKE SELECT ON customers FROM reader"));
        assert!(!is_safe("EXEC something"));
        assert!(!is_safe("CALL procedure_name()"));
    }

    #[test]
    fn test_forbidden_keyword_rejects_despite_select() {
        // Stacked statements: the denylist wins even when `select` is present.
        assert!(!is_safe("SELECT * FROM t; DROP TABLE t;"));
        assert!(!is_safe("select * from users; delete from users"));
    }

    #[test]
    fn test_no_select_anywhere_rejects() {
        assert!(!is_safe("nonsense text"));
        assert!(!is_safe("SHOW search_path"));
        assert!(!is_safe(""));
        assert!(!is_safe("   \n\t  "));
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert!(!is_safe("DrOp TaBlE t"));
        assert!(is_safe("SeLeCt * FrOm t"));
    }

    #[test]
    fn test_keyword_inside_identifier_false_positives() {
        // Documented limitation: substring matching flags identifiers that
        // contain a forbidden word.
        assert!(!is_safe("SELECT * FROM execute_log"));
        assert!(!is_safe("SELECT * FROM updates"));
        // `created_at` contains `create`, so it is rejected too.
        assert!(!is_safe("SELECT created_at FROM t"));
    }

    #[test]
    fn test_leading_whitespace_trimmed() {
        assert!(is_safe("   SELECT 1"));
        assert!(!is_safe("   DROP TABLE t"));
    }

    #[test]
    fn test_rejection_reason_names_keyword() {
        let reason = rejection_reason("DROP TABLE customers").unwrap();
        assert!(reason.contains("drop"));

        let reason = rejection_reason("hello world").unwrap();
        assert!(reason.contains("not a SELECT"));

        assert!(rejection_reason("SELECT 1").is_none());
    }

    #[test]
    fn test_gate_and_reason_agree() {
        let candidates = [
            "SELECT * FROM customers",
            "DROP TABLE customers",
            "no sql here",
            "SELECT * FROM t; DELETE FROM t",
            "Select 1",
        ];
        for sql in candidates {
            assert_eq!(
                is_safe(sql),
                rejection_reason(sql).is_none(),
                "gate and reason disagree for: {sql}"
            );
        }
    }
}
