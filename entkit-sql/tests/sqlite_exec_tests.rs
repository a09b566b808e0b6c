//! Runs compiled statements against an in-memory SQLite database.

use entkit_model::{DataType, Field, Schema};
use entkit_sql::{
    sqlite_type, Condition, DbEntity, Direction, Operator, SearchGraph, SearchNode, Sqlite,
    SqlCompiler, Statement,
};
use entkit_types::{Record, Value};
use pretty_assertions::assert_eq;
use rusqlite::{params_from_iter, types::Value as SqlValue, Connection};

fn product_entity() -> DbEntity {
    let schema = Schema::define("Product")
        .field(Field::define("sku").primary().build())
        .field(Field::define("shop").tenant().build())
        .field(Field::define("title").required(true).build())
        .field(Field::define("stock").data_type(DataType::Integer).build())
        .field(
            Field::define("active")
                .data_type(DataType::Boolean)
                .default_value(true)
                .build(),
        )
        .field(Field::define("listedAt").data_type(DataType::DateTime).build())
        .unique(["shop", "title"])
        .build();
    DbEntity::new(&schema, "products", sqlite_type).unwrap()
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::UInt(u) => SqlValue::Integer(i64::try_from(*u).unwrap()),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Timestamp(t) => SqlValue::Text(t.to_rfc3339()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn setup() -> (Connection, DbEntity) {
    let conn = Connection::open_in_memory().unwrap();
    let entity = product_entity();
    let ddl = SqlCompiler::new(&entity, &Sqlite).create_table().unwrap();
    conn.execute_batch(&ddl.sql).unwrap();
    (conn, entity)
}

fn product(sku: &str, title: &str, stock: i64) -> Record {
    Record::new()
        .with("sku", sku)
        .with("shop", "s1")
        .with("title", title)
        .with("stock", stock)
}

fn titles(conn: &Connection, stmt: &Statement) -> Vec<String> {
    let mut query = conn.prepare(&stmt.sql).unwrap();
    query
        .query_map([], |row| row.get::<_, String>("title"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn seed(conn: &Connection, compiler: &SqlCompiler<'_>) {
    let rows = [
        product("a", "50% off mug", 3),
        product("b", "500 off plate", 0),
        product("c", "Blue Bowl", 12),
    ];
    let insert = compiler.bulk_insert(&rows).unwrap();
    conn.execute(&insert.sql, []).unwrap();
}

// ── DDL and inserts ──────────────────────────────────────────────

#[test]
fn ddl_executes_and_defaults_apply() {
    let (conn, entity) = setup();
    let compiler = SqlCompiler::new(&entity, &Sqlite);
    seed(&conn, &compiler);

    let active: i64 = conn
        .query_row(r#"SELECT COUNT(*) FROM "products" WHERE "active" = 1"#, [], |r| r.get(0))
        .unwrap();
    assert_eq!(active, 3);
}

#[test]
fn parameterized_form_binds_in_order() {
    let (conn, entity) = setup();
    let compiler = SqlCompiler::new(&entity, &Sqlite);
    let row = product("d", "Teapot", 4).with("listedAt", "2024-05-01T10:00:00Z");
    let stmt = compiler.insert(&row).unwrap();

    conn.execute(&stmt.parameterized, params_from_iter(stmt.params.iter().map(to_sql)))
        .unwrap();

    let listed: String = conn
        .query_row(r#"SELECT "listedAt" FROM "products""#, [], |r| r.get(0))
        .unwrap();
    assert_eq!(listed, "2024-05-01T10:00:00+00:00");
}

#[test]
fn unique_group_is_enforced() {
    let (conn, entity) = setup();
    let compiler = SqlCompiler::new(&entity, &Sqlite);
    seed(&conn, &compiler);

    let dup = compiler.insert(&product("z", "Blue Bowl", 1)).unwrap();
    assert!(conn.execute(&dup.sql, []).is_err());
}

// ── Select ───────────────────────────────────────────────────────

#[test]
fn pattern_wildcards_in_values_are_literal() {
    let (conn, entity) = setup();
    let compiler = SqlCompiler::new(&entity, &Sqlite);
    seed(&conn, &compiler);

    let graph = SearchGraph::new().filter(Condition::new("title", Operator::Contains, ["0%"]));
    let stmt = compiler.select(&["title"], &graph).unwrap();
    assert_eq!(titles(&conn, &stmt), vec!["50% off mug".to_string()]);
}

#[test]
fn pattern_match_ignores_case() {
    let (conn, entity) = setup();
    let compiler = SqlCompiler::new(&entity, &Sqlite);
    seed(&conn, &compiler);

    let graph = SearchGraph::new().filter(Condition::new("title", Operator::StartsWith, ["blue"]));
    let stmt = compiler.select(&[], &graph).unwrap();
    assert_eq!(titles(&conn, &stmt), vec!["Blue Bowl".to_string()]);
}

#[test]
fn composed_filter_with_order_and_limit() {
    let (conn, entity) = setup();
    let compiler = SqlCompiler::new(&entity, &Sqlite);
    seed(&conn, &compiler);

    let graph = SearchGraph::new()
        .filter(SearchNode::any([
            SearchNode::leaf(Condition::new("stock", Operator::Greater, [10])),
            SearchNode::leaf(Condition::new("sku", Operator::In, ["a", "b"])),
        ]))
        .order_by("stock", Direction::Desc)
        .limit(2);
    let stmt = compiler.select(&["title"], &graph).unwrap();
    assert_eq!(
        titles(&conn, &stmt),
        vec!["Blue Bowl".to_string(), "50% off mug".to_string()]
    );
}

// ── Update and delete ────────────────────────────────────────────

#[test]
fn update_and_delete_round() {
    let (conn, entity) = setup();
    let compiler = SqlCompiler::new(&entity, &Sqlite);
    seed(&conn, &compiler);

    let update = compiler
        .update_by_key(&Record::new().with("sku", "b").with("shop", "s1").with("stock", 9))
        .unwrap();
    assert_eq!(conn.execute(&update.sql, []).unwrap(), 1);

    let delete = compiler
        .delete_by_equality(&Record::new().with("shop", "s1").with("stock", 9))
        .unwrap();
    assert_eq!(conn.execute(&delete.sql, []).unwrap(), 1);

    let remaining = compiler.select(&["title"], &SearchGraph::new().order_by("sku", Direction::Asc));
    assert_eq!(
        titles(&conn, &remaining.unwrap()),
        vec!["50% off mug".to_string(), "Blue Bowl".to_string()]
    );
}
