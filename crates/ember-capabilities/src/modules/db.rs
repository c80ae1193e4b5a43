//! `db`: SQL through the host database service.
//!
//! Placeholder arguments are passed after the statement:
//!
//! ```lua
//! local rows = db:query("SELECT name FROM players WHERE account_id = ?", id)
//! local player = db:singleQuery("SELECT * FROM players WHERE name = ?", name)
//! local affected, insertId = db:execute("UPDATE accounts SET points = ? WHERE id = ?", 10, id)
//! ```

use ember_runtime::convert::{to_json, to_lua};
use ember_runtime::{host, CapabilityModule};
use mlua::{Lua, MultiValue, Value};
use serde_json::Value as JsonValue;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("db")
        .function("query", |lua, args: MultiValue| {
            let (sql, params) = statement(lua, args)?;
            let rows = host(lua)?.database()?.query(&sql, &params)?;
            if rows.is_empty() {
                return Ok(Value::Nil);
            }
            to_lua(lua, &rows)
        })
        .function("singleQuery", |lua, args: MultiValue| {
            let (sql, params) = statement(lua, args)?;
            let rows = host(lua)?.database()?.query(&sql, &params)?;
            match rows.first() {
                Some(row) => to_lua(lua, row),
                None => Ok(Value::Nil),
            }
        })
        .function("execute", |lua, args: MultiValue| {
            let (sql, params) = statement(lua, args)?;
            let result = host(lua)?.database()?.execute(&sql, &params)?;
            Ok((result.rows_affected, result.last_insert_id))
        })
}

/// Split call arguments into the SQL text and its parameters.
fn statement(lua: &Lua, args: MultiValue) -> mlua::Result<(String, Vec<JsonValue>)> {
    let mut args = args.into_iter();
    let sql = match args.next() {
        Some(Value::String(sql)) => sql.to_str()?.to_string(),
        _ => return Err(mlua::Error::runtime("db: expected an SQL string")),
    };
    let params = args
        .map(|value| to_json(lua, value))
        .collect::<mlua::Result<Vec<_>>>()?;
    Ok((sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_for;
    use ember_runtime::services::{Database, ExecResult, Row};
    use ember_runtime::{AppConfig, HostContext, RuntimeResult};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeDatabase {
        statements: Mutex<Vec<(String, Vec<JsonValue>)>>,
    }

    impl Database for FakeDatabase {
        fn query(&self, sql: &str, args: &[JsonValue]) -> RuntimeResult<Vec<Row>> {
            self.statements
                .lock()
                .unwrap()
                .push((sql.to_string(), args.to_vec()));
            if sql.contains("nothing") {
                return Ok(Vec::new());
            }
            let rows = ["Alice", "Bob"]
                .into_iter()
                .map(|name| {
                    let mut row = Row::new();
                    row.insert("name".to_string(), json!(name));
                    row
                })
                .collect();
            Ok(rows)
        }

        fn execute(&self, sql: &str, args: &[JsonValue]) -> RuntimeResult<ExecResult> {
            self.statements
                .lock()
                .unwrap()
                .push((sql.to_string(), args.to_vec()));
            Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: Some(7),
            })
        }
    }

    fn lua(db: Arc<FakeDatabase>) -> mlua::Lua {
        lua_for(
            module(),
            HostContext::new(AppConfig::default()).with_database(db),
        )
    }

    #[test]
    fn test_query_returns_rows() {
        let db = Arc::new(FakeDatabase::default());
        let names: String = lua(db.clone())
            .load(
                r#"
                local rows = db:query("SELECT name FROM players WHERE level > ?", 8)
                return rows[1].name .. "," .. rows[2].name
                "#,
            )
            .eval()
            .unwrap();
        assert_eq!(names, "Alice,Bob");

        let statements = db.statements.lock().unwrap();
        assert_eq!(statements[0].1, vec![json!(8)]);
    }

    #[test]
    fn test_empty_query_is_nil() {
        let db = Arc::new(FakeDatabase::default());
        let is_nil: bool = lua(db)
            .load(r#"return db.query("SELECT nothing") == nil"#)
            .eval()
            .unwrap();
        assert!(is_nil);
    }

    #[test]
    fn test_single_query() {
        let db = Arc::new(FakeDatabase::default());
        let name: String = lua(db)
            .load(r#"return db:singleQuery("SELECT name FROM players").name"#)
            .eval()
            .unwrap();
        assert_eq!(name, "Alice");
    }

    #[test]
    fn test_execute_returns_counts() {
        let db = Arc::new(FakeDatabase::default());
        let (affected, id): (u64, i64) = lua(db.clone())
            .load(r#"return db:execute("UPDATE accounts SET name = ? WHERE id = ?", "x", 3)"#)
            .eval()
            .unwrap();
        assert_eq!((affected, id), (1, 7));
        assert_eq!(
            db.statements.lock().unwrap()[0].1,
            vec![json!("x"), json!(3)]
        );
    }

    #[test]
    fn test_missing_service_raises() {
        let lua = lua_for(module(), HostContext::new(AppConfig::default()));
        let err = lua.load(r#"db:query("SELECT 1")"#).exec().unwrap_err();
        assert!(err.to_string().contains("database service is not configured"));
    }
}
