//! Table enumeration over the `sqlparser` AST.

use sqlparser::ast as sp;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::SqlError;

/// Lists every table a piece of SQL touches.
///
/// Collects from `FROM` clauses (joins and nested joins included), both
/// arms of set operations, CTE bodies, `INSERT`/`UPDATE`/`DELETE`
/// targets, `TRUNCATE` relations, `DROP` objects, and `ALTER TABLE`
/// targets. Names are reduced to the bare relation name (no schema);
/// duplicates are permitted.
pub fn tables_in(sql: &str) -> Result<Vec<String>, SqlError> {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)?;
    let mut tables = Vec::new();
    for statement in &statements {
        collect_statement(statement, &mut tables);
    }
    Ok(tables)
}

fn collect_statement(statement: &sp::Statement, out: &mut Vec<String>) {
    match statement {
        sp::Statement::Query(query) => collect_query(query, out),
        sp::Statement::Insert(insert) => {
            if let sp::TableObject::TableName(name) = &insert.table {
                push_name(name, out);
            }
        }
        sp::Statement::Update { table, .. } => {
            // Only the mutated target; UPDATE ... FROM sources are reads.
            collect_table_factor(&table.relation, out);
        }
        sp::Statement::Delete(delete) => {
            for name in &delete.tables {
                push_name(name, out);
            }
            let relations = match &delete.from {
                sp::FromTable::WithFromKeyword(tables) => tables,
                sp::FromTable::WithoutKeyword(tables) => tables,
            };
            for table in relations {
                collect_table_factor(&table.relation, out);
            }
        }
        sp::Statement::Truncate { table_names, .. } => {
            for target in table_names {
                push_name(&target.name, out);
            }
        }
        sp::Statement::Drop { names, .. } => {
            for name in names {
                push_name(name, out);
            }
        }
        sp::Statement::AlterTable { name, .. } => push_name(name, out),
        _ => {}
    }
}

fn collect_query(query: &sp::Query, out: &mut Vec<String>) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_query(&cte.query, out);
        }
    }
    collect_set_expr(&query.body, out);
}

fn collect_set_expr(expr: &sp::SetExpr, out: &mut Vec<String>) {
    match expr {
        sp::SetExpr::Select(select) => {
            for table in &select.from {
                collect_table_with_joins(table, out);
            }
        }
        sp::SetExpr::Query(query) => collect_query(query, out),
        sp::SetExpr::SetOperation { left, right, .. } => {
            collect_set_expr(left, out);
            collect_set_expr(right, out);
        }
        _ => {}
    }
}

fn collect_table_with_joins(table: &sp::TableWithJoins, out: &mut Vec<String>) {
    collect_table_factor(&table.relation, out);
    for join in &table.joins {
        collect_table_factor(&join.relation, out);
    }
}

fn collect_table_factor(factor: &sp::TableFactor, out: &mut Vec<String>) {
    match factor {
        sp::TableFactor::Table { name, .. } => push_name(name, out),
        sp::TableFactor::Derived { subquery, .. } => collect_query(subquery, out),
        sp::TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_table_with_joins(table_with_joins, out),
        _ => {}
    }
}

/// Pushes the bare relation name, dropping any schema qualifier.
fn push_name(name: &sp::ObjectName, out: &mut Vec<String>) {
    if let Some(ident) = name.0.last().and_then(|part| part.as_ident()) {
        out.push(ident.value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(sql: &str) -> Vec<String> {
        tables_in(sql).unwrap()
    }

    #[test]
    fn select_from_single_table() {
        assert_eq!(tables("SELECT * FROM users"), ["users"]);
    }

    #[test]
    fn select_with_join_lists_both_sides() {
        let found = tables("SELECT * FROM users u JOIN orders o ON o.user_id = u.id");
        assert_eq!(found, ["users", "orders"]);
    }

    #[test]
    fn schema_qualifier_is_dropped() {
        assert_eq!(tables("SELECT * FROM public.users"), ["users"]);
    }

    #[test]
    fn union_lists_both_arms() {
        let found = tables("SELECT id FROM users UNION SELECT id FROM admins");
        assert_eq!(found, ["users", "admins"]);
    }

    #[test]
    fn intersect_and_except_list_both_arms() {
        assert_eq!(
            tables("SELECT id FROM a INTERSECT SELECT id FROM b"),
            ["a", "b"]
        );
        assert_eq!(tables("SELECT id FROM a EXCEPT SELECT id FROM b"), ["a", "b"]);
    }

    #[test]
    fn cte_bodies_are_walked() {
        let found = tables(
            "WITH recent AS (SELECT * FROM orders WHERE ts > 0) \
             SELECT * FROM recent JOIN users ON users.id = recent.user_id",
        );
        assert!(found.contains(&"orders".to_string()));
        assert!(found.contains(&"users".to_string()));
    }

    #[test]
    fn cte_with_set_operation_lists_both_arms() {
        let found = tables(
            "WITH all_ids AS (SELECT id FROM users UNION SELECT id FROM admins) \
             SELECT * FROM all_ids",
        );
        assert!(found.contains(&"users".to_string()));
        assert!(found.contains(&"admins".to_string()));
    }

    #[test]
    fn subquery_in_from_is_walked() {
        let found = tables("SELECT * FROM (SELECT id FROM orders) AS o");
        assert_eq!(found, ["orders"]);
    }

    #[test]
    fn insert_target() {
        assert_eq!(tables("INSERT INTO users VALUES (1)"), ["users"]);
    }

    #[test]
    fn update_target_only() {
        assert_eq!(tables("UPDATE users SET name = 'x' WHERE id = 1"), ["users"]);
    }

    #[test]
    fn delete_target() {
        assert_eq!(tables("DELETE FROM users WHERE id = 1"), ["users"]);
    }

    #[test]
    fn truncate_relations() {
        assert_eq!(tables("TRUNCATE users, orders"), ["users", "orders"]);
    }

    #[test]
    fn drop_objects() {
        assert_eq!(tables("DROP TABLE users, orders"), ["users", "orders"]);
    }

    #[test]
    fn alter_table_target() {
        assert_eq!(
            tables("ALTER TABLE users ADD COLUMN age INT"),
            ["users"]
        );
    }

    #[test]
    fn duplicates_are_permitted() {
        let found = tables("SELECT * FROM users UNION SELECT * FROM users");
        assert_eq!(found, ["users", "users"]);
    }

    #[test]
    fn invalid_sql_is_an_error() {
        assert!(tables_in("SELECT FROM FROM").is_err());
    }

    #[test]
    fn statement_without_tables_is_empty() {
        assert!(tables("SELECT 1").is_empty());
    }
}
