//! Read-only SQL guard
//!
//! Two gates, applied in order:
//! 1. lexical: the trimmed, upper-cased text must start with `SELECT`
//! 2. structural: the text must parse (MySQL dialect) into exactly one query
//!    statement with no `SELECT ... INTO` target and no locking clause
//!
//! The lexical gate alone lets `SELECT 1; DROP TABLE x` through, which is why
//! the second gate exists.

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

/// Why a planned statement was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("statement does not start with SELECT")]
    NotSelect,

    #[error("statement could not be parsed: {0}")]
    Unparsable(String),

    #[error("expected exactly one statement, found {0}")]
    MultipleStatements(usize),

    #[error("statement is not a read-only query")]
    NotAQuery,

    #[error("SELECT ... INTO is not allowed")]
    SelectInto,

    #[error("locking clauses (FOR UPDATE / FOR SHARE) are not allowed")]
    LockingClause,
}

/// Lexical gate only
pub fn starts_with_select(sql: &str) -> bool {
    sql.trim().to_uppercase().starts_with("SELECT")
}

/// Accept `sql` only if it is a single read-only query
pub fn check_read_only(sql: &str) -> Result<(), Rejection> {
    if !starts_with_select(sql) {
        return Err(Rejection::NotSelect);
    }

    let statements = Parser::parse_sql(&MySqlDialect {}, sql)
        .map_err(|e| Rejection::Unparsable(e.to_string()))?;

    if statements.len() != 1 {
        return Err(Rejection::MultipleStatements(statements.len()));
    }

    match &statements[0] {
        Statement::Query(query) => check_query(query),
        _ => Err(Rejection::NotAQuery),
    }
}

fn check_query(query: &Query) -> Result<(), Rejection> {
    if !query.locks.is_empty() {
        return Err(Rejection::LockingClause);
    }
    check_set_expr(&query.body)
}

fn check_set_expr(expr: &SetExpr) -> Result<(), Rejection> {
    match expr {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                Err(Rejection::SelectInto)
            } else {
                Ok(())
            }
        }
        SetExpr::Query(query) => check_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            check_set_expr(left)?;
            check_set_expr(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => Ok(()),
        _ => Err(Rejection::NotAQuery),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_select() {
        assert_eq!(
            check_read_only(
                "SELECT SUM(CANTIDAD_PRODUCIDA) AS total FROM D_RDP_TORNILLOS WHERE COD_PLANTA = 3"
            ),
            Ok(())
        );
    }

    #[test]
    fn test_accepts_lowercase_with_whitespace() {
        assert_eq!(
            check_read_only("   \n select p.NOMBRE_PLANTA from DIM_PLANTA p  "),
            Ok(())
        );
    }

    #[test]
    fn test_accepts_join_group_and_union() {
        let sql = "SELECT p.NOMBRE_PLANTA, SUM(r.CANTIDAD_PRODUCIDA) AS total \
                   FROM D_RDP_TORNILLOS r JOIN DIM_PLANTA p ON p.COD_PLANTA = r.COD_PLANTA \
                   GROUP BY p.NOMBRE_PLANTA ORDER BY total DESC LIMIT 1";
        assert_eq!(check_read_only(sql), Ok(()));

        let union = "SELECT COD_TURNO FROM DIM_TURNO UNION SELECT COD_TURNO FROM D_RDP_TORNILLOS";
        assert_eq!(check_read_only(union), Ok(()));
    }

    #[test]
    fn test_trailing_semicolon_is_one_statement() {
        assert_eq!(check_read_only("SELECT 1;"), Ok(()));
    }

    #[test]
    fn test_rejects_non_select_prefix() {
        assert_eq!(
            check_read_only("DELETE FROM D_RDP_TORNILLOS"),
            Err(Rejection::NotSelect)
        );
        assert_eq!(
            check_read_only("WITH t AS (SELECT 1) SELECT * FROM t"),
            Err(Rejection::NotSelect)
        );
        assert_eq!(check_read_only(""), Err(Rejection::NotSelect));
    }

    #[test]
    fn test_rejects_statement_chaining() {
        assert_eq!(
            check_read_only("SELECT 1; DROP TABLE D_RDP_TORNILLOS"),
            Err(Rejection::MultipleStatements(2))
        );
    }

    #[test]
    fn test_rejects_locking_clause() {
        assert_eq!(
            check_read_only("SELECT * FROM DIM_TURNO FOR UPDATE"),
            Err(Rejection::LockingClause)
        );
    }

    #[test]
    fn test_rejects_garbage_after_select() {
        assert!(matches!(
            check_read_only("SELECTED FROM nowhere ((("),
            Err(Rejection::Unparsable(_))
        ));
    }

    #[test]
    fn test_with_rollup_is_refused_as_unparsable() {
        // The MySQL dialect has no WITH ROLLUP support; such queries are dropped
        let sql = "SELECT COD_PLANTA, SUM(CANTIDAD_PRODUCIDA) FROM D_RDP_TORNILLOS \
                   GROUP BY COD_PLANTA WITH ROLLUP";
        assert!(matches!(check_read_only(sql), Err(Rejection::Unparsable(_))));
    }
}
