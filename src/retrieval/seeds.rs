//! Seed documents for the knowledge base.
//!
//! The business-term glossary and worked SQL examples indexed alongside the
//! live schema. These cover the sample store domain (customers, products,
//! orders) the service ships with; deployments extend them through the
//! initialize endpoint after pointing the service at their own database.

/// A glossary entry mapping a business term to the schema.
pub struct BusinessTerm {
    pub term: &'static str,
    pub definition: &'static str,
    pub category: &'static str,
    pub examples: &'static str,
    pub related_tables: &'static [&'static str],
}

/// A worked natural-language-to-SQL example.
pub struct SqlExample {
    pub question: &'static str,
    pub sql: &'static str,
    pub explanation: &'static str,
    pub complexity: &'static str,
    pub keywords: &'static [&'static str],
}

/// Returns the seeded business-term glossary.
pub fn business_terms() -> &'static [BusinessTerm] {
    &[
        BusinessTerm {
            term: "customer",
            definition: "A person or company that purchases products or services",
            category: "business",
            examples: "rows of the customers table",
            related_tables: &["customers", "orders"],
        },
        BusinessTerm {
            term: "order",
            definition: "A transaction in which a customer purchases a product",
            category: "business",
            examples: "rows of the orders table",
            related_tables: &["orders", "customers", "products"],
        },
        BusinessTerm {
            term: "product",
            definition: "A good or service offered for sale",
            category: "business",
            examples: "rows of the products table",
            related_tables: &["products", "orders"],
        },
        BusinessTerm {
            term: "revenue",
            definition: "Income generated from sales",
            category: "finance",
            examples: "the total_amount column of the orders table",
            related_tables: &["orders"],
        },
        BusinessTerm {
            term: "inventory",
            definition: "The quantity of a product available for sale",
            category: "inventory",
            examples: "the stock_quantity column of the products table",
            related_tables: &["products"],
        },
    ]
}

/// Returns the seeded SQL examples.
pub fn sql_examples() -> &'static [SqlExample] {
    &[
        SqlExample {
            question: "Show me all customers",
            sql: "SELECT id, name, email, phone, created_at FROM customers ORDER BY created_at DESC;",
            explanation: "Lists every record in the customers table, newest first.",
            complexity: "simple",
            keywords: &["customers", "list", "all"],
        },
        SqlExample {
            question: "Find the customer with the highest total order amount",
            sql: "SELECT c.id, c.name, SUM(o.total_amount) AS total_spent FROM customers c JOIN orders o ON c.id = o.customer_id GROUP BY c.id, c.name ORDER BY total_spent DESC LIMIT 1;",
            explanation: "Sums order totals per customer and returns the biggest spender.",
            complexity: "medium",
            keywords: &["total", "order", "amount", "highest", "customer", "top"],
        },
        SqlExample {
            question: "Show product counts by category",
            sql: "SELECT category, COUNT(*) AS product_count FROM products GROUP BY category ORDER BY product_count DESC;",
            explanation: "Groups products by category and counts each group.",
            complexity: "simple",
            keywords: &["category", "products", "count"],
        },
        SqlExample {
            question: "Find products that are low on stock",
            sql: "SELECT id, name, stock_quantity, category FROM products WHERE stock_quantity < 10 ORDER BY stock_quantity ASC;",
            explanation: "Lists products with fewer than 10 units in stock, lowest first.",
            complexity: "simple",
            keywords: &["stock", "low", "products", "inventory"],
        },
        SqlExample {
            question: "Show order activity for the last month",
            sql: "SELECT DATE(order_date) AS order_day, COUNT(*) AS order_count, SUM(total_amount) AS daily_revenue FROM orders WHERE order_date >= CURRENT_DATE - INTERVAL '30 days' GROUP BY DATE(order_date) ORDER BY order_day DESC;",
            explanation: "Daily order counts and revenue over the last 30 days.",
            complexity: "medium",
            keywords: &["recent", "month", "orders", "activity", "revenue"],
        },
    ]
}

impl BusinessTerm {
    /// Renders the glossary entry as an indexable document.
    pub fn to_document_text(&self) -> String {
        format!(
            "Term: {}\nDefinition: {}\nCategory: {}\nExamples: {}\nRelated tables: {}",
            self.term,
            self.definition,
            self.category,
            self.examples,
            self.related_tables.join(", ")
        )
    }
}

impl SqlExample {
    /// Renders the example as an indexable document.
    pub fn to_document_text(&self) -> String {
        format!(
            "Question: {}\nSQL:\n{}\n\nExplanation: {}\nComplexity: {}\nKeywords: {}",
            self.question,
            self.sql,
            self.explanation,
            self.complexity,
            self.keywords.join(", ")
        )
    }
}
