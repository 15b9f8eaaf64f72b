//! Table extraction from SQL statements.
//!
//! Uses sqlparser-rs with the PostgreSQL dialect to walk a statement's AST
//! and collect the base tables it reads from. Used to report `tables_used`
//! alongside generated queries.

use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Returns the base tables referenced by the statement, in first-seen order
/// without duplicates.
///
/// Statements that fail to parse yield an empty list; callers treat the table
/// list as advisory metadata, never as a safety decision.
pub fn referenced_tables(sql: &str) -> Vec<String> {
    let dialect = PostgreSqlDialect {};
    let statements = match Parser::parse_sql(&dialect, sql) {
        Ok(statements) => statements,
        Err(_) => return Vec::new(),
    };

    let mut tables = Vec::new();
    for statement in &statements {
        if let Statement::Query(query) = statement {
            collect_from_query(query, &mut tables);
        }
    }

    let mut seen = std::collections::HashSet::new();
    tables.retain(|t| seen.insert(t.clone()));
    tables
}

/// Collects table names from a query, recursing through CTEs and the body.
fn collect_from_query(query: &Query, out: &mut Vec<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_from_query(&cte.query, out);
        }
    }

    collect_from_set_expr(&query.body, out);
}

fn collect_from_set_expr(set_expr: &SetExpr, out: &mut Vec<String>) {
    match set_expr {
        SetExpr::Select(select) => {
            for table_with_joins in &select.from {
                collect_from_table_with_joins(table_with_joins, out);
            }
        }
        SetExpr::Query(query) => collect_from_query(query, out),
        SetExpr::SetOperation { left, right, .. } => {
            collect_from_set_expr(left, out);
            collect_from_set_expr(right, out);
        }
        // Values/Table bodies and data-modifying bodies carry no readable
        // FROM clause worth reporting.
        _ => {}
    }
}

fn collect_from_table_with_joins(twj: &TableWithJoins, out: &mut Vec<String>) {
    collect_from_table_factor(&twj.relation, out);
    for join in &twj.joins {
        collect_from_table_factor(&join.relation, out);
    }
}

fn collect_from_table_factor(factor: &TableFactor, out: &mut Vec<String>) {
    match factor {
        TableFactor::Table { name, .. } => {
            // Report the bare relation name, dropping any schema qualifier.
            if let Some(ident) = name.0.last() {
                out.push(ident.value.clone());
            }
        }
        TableFactor::Derived { subquery, .. } => collect_from_query(subquery, out),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_from_table_with_joins(table_with_joins, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_table() {
        assert_eq!(referenced_tables("SELECT * FROM customers"), vec!["customers"]);
    }

    #[test]
    fn test_join_tables_in_order() {
        let tables = referenced_tables(
            "SELECT c.name, o.total_amount FROM customers c JOIN orders o ON c.id = o.customer_id",
        );
        assert_eq!(tables, vec!["customers", "orders"]);
    }

    #[test]
    fn test_subquery_in_from() {
        let tables =
            referenced_tables("SELECT * FROM (SELECT customer_id FROM orders) o");
        assert_eq!(tables, vec!["orders"]);
    }

    #[test]
    fn test_cte_tables_collected() {
        let tables = referenced_tables(
            "WITH big AS (SELECT * FROM orders WHERE total_amount > 100) SELECT * FROM big",
        );
        assert_eq!(tables, vec!["orders", "big"]);
    }

    #[test]
    fn test_union_both_sides() {
        let tables =
            referenced_tables("SELECT id FROM customers UNION SELECT customer_id FROM orders");
        assert_eq!(tables, vec!["customers", "orders"]);
    }

    #[test]
    fn test_duplicates_removed() {
        let tables = referenced_tables(
            "SELECT * FROM orders o1 JOIN orders o2 ON o1.id = o2.id",
        );
        assert_eq!(tables, vec!["orders"]);
    }

    #[test]
    fn test_schema_qualifier_dropped() {
        assert_eq!(
            referenced_tables("SELECT * FROM public.customers"),
            vec!["customers"]
        );
    }

    #[test]
    fn test_unparsable_sql_yields_empty() {
        assert!(referenced_tables("THIS IS NOT SQL").is_empty());
        assert!(referenced_tables("").is_empty());
    }

    #[test]
    fn test_non_query_statement_yields_empty() {
        // Table extraction only reports reads; DDL/DML statements are not
        // walked (they never reach execution anyway).
        assert!(referenced_tables("DROP TABLE customers").is_empty());
    }
}
