use chrono::{TimeZone, Utc};
use entkit_model::{DataType, Field, Schema};
use entkit_sql::{
    postgres_type, sqlite_type, ColumnCategory, Condition, DbEntity, Direction, Operator,
    Postgres, SearchGraph, SearchNode, Sqlite, SqlCompiler, SqlError,
};
use entkit_types::{Record, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn company_entity() -> DbEntity {
    let schema = Schema::define("Company")
        .field(Field::define("id").data_type(DataType::Ulid).primary().build())
        .field(
            Field::define("orgId")
                .data_type(DataType::Ulid)
                .primary()
                .tenant()
                .build(),
        )
        .field(
            Field::define("name")
                .data_type(DataType::String)
                .required(true)
                .build(),
        )
        .field(Field::define("nickname").build())
        .field(Field::define("employees").data_type(DataType::Integer).build())
        .build();
    DbEntity::new(&schema, "companies", postgres_type).unwrap()
}

/// One nullable column per category.
fn mixed_entity() -> DbEntity {
    let schema = Schema::define("Mixed")
        .field(Field::define("id").data_type(DataType::Uuid).primary().build())
        .field(Field::define("s").data_type(DataType::String).build())
        .field(Field::define("b").data_type(DataType::Boolean).build())
        .field(Field::define("i").data_type(DataType::Integer).build())
        .field(Field::define("n").data_type(DataType::Float).build())
        .field(Field::define("t").data_type(DataType::DateTime).build())
        .field(Field::define("j").data_type(DataType::LocalizedText).build())
        .build();
    DbEntity::new(&schema, "mixed", postgres_type).unwrap()
}

fn where_clause(entity: &DbEntity, node: SearchNode) -> Result<String, SqlError> {
    let compiler = SqlCompiler::new(entity, &Postgres);
    compiler
        .compile_filter(&node)
        .map(|stmt| stmt.map(|s| s.parameterized).unwrap_or_default())
}

fn company_row() -> Record {
    Record::new()
        .with("id", "01J0000000000000000000000A")
        .with("orgId", "01J0000000000000000000000B")
        .with("name", "Acme")
}

// ── Scenario ─────────────────────────────────────────────────────

#[test]
fn create_and_select_scenario() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);

    let graph = SearchGraph::new()
        .filter(Condition::new("name", Operator::Contains, ["Acme"]))
        .order_by("name", Direction::Desc);
    let stmt = compiler.select(&[], &graph).unwrap();

    assert_eq!(
        stmt.parameterized,
        r#"SELECT * FROM "companies" WHERE "name" ILIKE $1 ORDER BY "name" DESC"#
    );
    assert_eq!(stmt.params, vec![Value::Text("%Acme%".into())]);
    assert_eq!(
        stmt.sql,
        r#"SELECT * FROM "companies" WHERE "name" ILIKE '%Acme%' ORDER BY "name" DESC"#
    );
}

#[test]
fn create_table_statement() {
    let entity = company_entity();
    let stmt = SqlCompiler::new(&entity, &Postgres).create_table().unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"CREATE TABLE IF NOT EXISTS "companies" ("#,
            r#""id" character varying(26) NOT NULL, "#,
            r#""orgId" character varying(26) NOT NULL, "#,
            r#""name" character varying NOT NULL, "#,
            r#""nickname" character varying, "#,
            r#""employees" integer, "#,
            r#"PRIMARY KEY ("id", "orgId"))"#
        )
    );
    assert!(stmt.params.is_empty());
}

#[test]
fn create_table_with_tenant_uniques_and_defaults() {
    let schema = Schema::define("Account")
        .field(Field::define("id").data_type(DataType::Ulid).primary().build())
        .field(Field::define("orgId").data_type(DataType::Ulid).tenant().build())
        .field(Field::define("name").required(true).length(1, 120).build())
        .field(Field::define("email").data_type(DataType::Email).unique().build())
        .field(
            Field::define("active")
                .data_type(DataType::Boolean)
                .default_value(true)
                .build(),
        )
        .unique(["orgId", "name"])
        .build();
    let entity = DbEntity::new(&schema, "accounts", postgres_type).unwrap();
    let stmt = SqlCompiler::new(&entity, &Postgres).create_table().unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"CREATE TABLE IF NOT EXISTS "accounts" ("#,
            r#""id" character varying(26) NOT NULL, "#,
            r#""orgId" character varying(26) NOT NULL, "#,
            r#""name" character varying(120) NOT NULL, "#,
            r#""email" character varying, "#,
            r#""active" boolean DEFAULT TRUE, "#,
            r#"PRIMARY KEY ("id", "orgId"), "#,
            r#"UNIQUE ("email"), "#,
            r#"UNIQUE ("name", "orgId"))"#
        )
    );
}

// ── Select ───────────────────────────────────────────────────────

#[test]
fn select_projection_and_paging() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    let graph = SearchGraph::new()
        .order_by("name", Direction::Asc)
        .limit(10)
        .offset(20);
    let stmt = compiler.select(&["id", "name"], &graph).unwrap();
    assert_eq!(
        stmt.sql,
        r#"SELECT "id", "name" FROM "companies" ORDER BY "name" ASC LIMIT 10 OFFSET 20"#
    );
}

#[test]
fn sqlite_offset_without_limit() {
    let schema = Schema::define("Company")
        .field(Field::define("id").primary().build())
        .build();
    let entity = DbEntity::new(&schema, "companies", sqlite_type).unwrap();
    let stmt = SqlCompiler::new(&entity, &Sqlite)
        .select(&[], &SearchGraph::new().offset(5))
        .unwrap();
    assert_eq!(stmt.sql, r#"SELECT * FROM "companies" LIMIT -1 OFFSET 5"#);
}

#[test]
fn select_rejects_unknown_and_nested_columns() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);

    assert_eq!(
        compiler.select(&["ghost"], &SearchGraph::new()),
        Err(SqlError::UnknownColumn {
            table: "companies".into(),
            column: "ghost".into()
        })
    );
    assert_eq!(
        compiler.select(&[], &SearchGraph::new().order_by("owner.name", Direction::Asc)),
        Err(SqlError::NestedField("owner.name".into()))
    );
    assert_eq!(
        where_clause(&entity, Condition::equals("ghost", 1).into()),
        Err(SqlError::UnknownColumn {
            table: "companies".into(),
            column: "ghost".into()
        })
    );
}

#[test]
fn empty_filter_matches_all() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    let graph = SearchGraph::new().filter(SearchNode::all([SearchNode::Any(vec![])]));
    let stmt = compiler.select(&[], &graph).unwrap();
    assert_eq!(stmt.sql, r#"SELECT * FROM "companies""#);
}

// ── Conditions ───────────────────────────────────────────────────

#[test]
fn tree_composition_parenthesizes_nested_groups() {
    let entity = company_entity();
    let node = SearchNode::all([
        SearchNode::leaf(Condition::equals("name", "Acme")),
        SearchNode::any([
            SearchNode::leaf(Condition::new("employees", Operator::Greater, [100])),
            SearchNode::leaf(Condition::is_set("nickname")),
        ]),
    ]);
    assert_eq!(
        where_clause(&entity, node).unwrap(),
        r#""name" = $1 AND ("employees" > $2 OR "nickname" IS NOT NULL)"#
    );
}

#[test]
fn single_child_group_is_not_wrapped() {
    let entity = company_entity();
    let node = SearchNode::any([SearchNode::leaf(Condition::not_set("nickname"))]);
    assert_eq!(
        where_clause(&entity, node).unwrap(),
        r#""nickname" IS NULL"#
    );
}

#[test]
fn membership_binds_every_value() {
    let entity = company_entity();
    let node = Condition::new("employees", Operator::NotIn, [1, 2, 3]).into();
    assert_eq!(
        where_clause(&entity, node).unwrap(),
        r#""employees" NOT IN ($1, $2, $3)"#
    );
}

#[test]
fn null_equality_on_nullable_column() {
    let entity = company_entity();
    assert_eq!(
        where_clause(&entity, Condition::equals("nickname", Value::Null).into()).unwrap(),
        r#""nickname" IS NULL"#
    );
    assert_eq!(
        where_clause(
            &entity,
            Condition::new("nickname", Operator::NotEquals, [Value::Null]).into()
        )
        .unwrap(),
        r#""nickname" IS NOT NULL"#
    );
    assert_eq!(
        where_clause(&entity, Condition::equals("name", Value::Null).into()),
        Err(SqlError::NullNotAllowed {
            column: "name".into()
        })
    );
}

#[test]
fn negated_pattern_and_escaping() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    let stmt = compiler
        .compile_filter(&Condition::new("name", Operator::NotStartsWith, ["50%_off"]).into())
        .unwrap()
        .unwrap();
    assert_eq!(stmt.parameterized, r#"NOT ("name" ILIKE $1)"#);
    assert_eq!(stmt.params, vec![Value::Text("50\\%\\_off%".into())]);
}

#[test]
fn sqlite_pattern_uses_escape_clause() {
    let schema = Schema::define("Company")
        .field(Field::define("id").primary().build())
        .build();
    let entity = DbEntity::new(&schema, "companies", sqlite_type).unwrap();
    let stmt = SqlCompiler::new(&entity, &Sqlite)
        .compile_filter(&Condition::new("id", Operator::EndsWith, ["x"]).into())
        .unwrap()
        .unwrap();
    assert_eq!(stmt.parameterized, r#""id" LIKE ?1 ESCAPE '\'"#);
    assert_eq!(stmt.sql, r#""id" LIKE '%x' ESCAPE '\'"#);
}

#[test]
fn value_count_is_checked() {
    let entity = company_entity();
    let cases = [
        (Condition::new("employees", Operator::In, Vec::<Value>::new()), "at least 1", 0),
        (Condition::new("employees", Operator::Equals, [1, 2]), "1", 2),
        (Condition::new("nickname", Operator::IsSet, ["x"]), "0", 1),
        (Condition::new("nickname", Operator::Contains, Vec::<Value>::new()), "1", 0),
    ];
    for (condition, expected, found) in cases {
        let operator = condition.operator.to_string();
        assert_eq!(
            where_clause(&entity, condition.into()),
            Err(SqlError::InvalidValueCount {
                operator,
                expected,
                found
            })
        );
    }
}

#[test]
fn incompatible_values_are_rejected() {
    let entity = company_entity();
    let err = where_clause(&entity, Condition::equals("employees", "many").into()).unwrap_err();
    assert_eq!(
        err,
        SqlError::IncompatibleValue {
            column: "employees".into(),
            category: ColumnCategory::Int,
            found: "text"
        }
    );
    assert_eq!(
        err.to_string(),
        "incompatible value type text for int column 'employees'"
    );
}

#[test]
fn time_columns_accept_textual_dates() {
    let entity = mixed_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    let compile = |text: &str| {
        compiler
            .compile_filter(&Condition::new("t", Operator::GreaterOrEqual, [text]).into())
            .map(|stmt| stmt.unwrap().params)
    };

    assert_eq!(
        compile("2024-05-01T10:00:00Z").unwrap(),
        vec![Value::Timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())]
    );
    assert_eq!(
        compile("2024-05-01").unwrap(),
        vec![Value::Text("2024-05-01".into())]
    );
    assert_eq!(compile("09:30").unwrap(), vec![Value::Text("09:30".into())]);
    assert_eq!(
        compile("09:30:15.250").unwrap(),
        vec![Value::Text("09:30:15.250".into())]
    );
    assert!(matches!(
        compile("yesterday"),
        Err(SqlError::IncompatibleValue { .. })
    ));
}

#[test]
fn unsupported_operator_string() {
    assert_eq!(
        "like".parse::<Operator>(),
        Err(SqlError::UnsupportedOperator("like".into()))
    );
    let bad = serde_json::from_value::<Condition>(json!({
        "field": "name", "operator": "~", "values": ["x"]
    }));
    assert!(bad.unwrap_err().to_string().contains("unsupported operator '~'"));
}

#[test]
fn search_graph_deserializes_from_json() {
    let graph: SearchGraph = serde_json::from_value(json!({
        "filter": { "or": [
            { "condition": { "field": "name", "operator": "starts_with", "values": ["A"] } },
            { "condition": { "field": "employees", "operator": "<=", "values": [10] } }
        ]},
        "order": [{ "field": "name" }],
        "limit": 5
    }))
    .unwrap();
    let entity = company_entity();
    let stmt = SqlCompiler::new(&entity, &Postgres)
        .select(&[], &graph)
        .unwrap();
    assert_eq!(
        stmt.sql,
        r#"SELECT * FROM "companies" WHERE "name" ILIKE 'A%' OR "employees" <= 10 ORDER BY "name" ASC LIMIT 5"#
    );
}

// ── Operator coverage ────────────────────────────────────────────

fn sample(category: ColumnCategory) -> Value {
    match category {
        ColumnCategory::String => Value::Text("x".into()),
        ColumnCategory::Bool => Value::Bool(true),
        ColumnCategory::Int => Value::Int(7),
        ColumnCategory::Numeric => Value::Float(1.5),
        ColumnCategory::Time => Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ColumnCategory::Json => Value::Map(Record::new().with("en", "hi")),
        ColumnCategory::Unknown => Value::Null,
    }
}

#[test]
fn every_operator_against_every_category() {
    let entity = mixed_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);

    for column in entity.columns().iter().filter(|c| c.name != "id") {
        let category = column.category();
        for op in Operator::ALL {
            let values = if op.is_presence() {
                vec![]
            } else if op.is_membership() {
                vec![sample(category), sample(category)]
            } else {
                vec![sample(category)]
            };
            let expected_params = values.len();
            let result =
                compiler.compile_filter(&Condition::new(&column.name, op, values).into());

            if op.is_pattern() && category != ColumnCategory::String {
                assert_eq!(
                    result,
                    Err(SqlError::IncompatibleOperator {
                        operator: op.to_string(),
                        column: column.name.clone(),
                        category,
                    }),
                    "{op} on {}",
                    column.name
                );
            } else {
                let stmt = result
                    .unwrap_or_else(|e| panic!("{op} on {}: {e}", column.name))
                    .unwrap();
                assert_eq!(stmt.param_count(), expected_params, "{op} on {}", column.name);
            }
        }
    }
}

#[test]
fn null_equality_binds_no_parameter_in_any_category() {
    let entity = mixed_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);

    for column in entity.columns().iter().filter(|c| c.name != "id") {
        for (op, test) in [
            (Operator::Equals, "IS NULL"),
            (Operator::NotEquals, "IS NOT NULL"),
        ] {
            let stmt = compiler
                .compile_filter(&Condition::new(&column.name, op, [Value::Null]).into())
                .unwrap()
                .unwrap();
            assert_eq!(stmt.param_count(), 0, "{op} null on {}", column.name);
            assert_eq!(stmt.parameterized, format!(r#""{}" {test}"#, column.name));
        }

        let ordered = compiler.compile_filter(
            &Condition::new(&column.name, Operator::Greater, [Value::Null]).into(),
        );
        assert!(
            matches!(ordered, Err(SqlError::IncompatibleValue { .. })),
            "> null on {}",
            column.name
        );
    }
}

// ── Mutations ────────────────────────────────────────────────────

#[test]
fn insert_uses_sorted_columns() {
    let entity = company_entity();
    let stmt = SqlCompiler::new(&entity, &Postgres)
        .insert(&company_row())
        .unwrap();
    assert_eq!(
        stmt.parameterized,
        r#"INSERT INTO "companies" ("id", "name", "orgId") VALUES ($1, $2, $3)"#
    );
    assert_eq!(stmt.param_count(), 3);
}

#[test]
fn mutations_require_tenant_key() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    let mut row = company_row();
    row.remove("orgId");
    let missing = Err(SqlError::MissingTenantKey {
        column: "orgId".into(),
    });

    assert_eq!(compiler.insert(&row), missing);
    assert_eq!(compiler.bulk_insert(&[row.clone()]), missing);
    assert_eq!(compiler.update_by_key(&row), missing);
    assert_eq!(compiler.delete_by_equality(&row), missing);
}

#[test]
fn bulk_insert_checks_batch_shape() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);

    assert_eq!(compiler.bulk_insert(&[]), Err(SqlError::EmptyBatch));

    let ragged = company_row().with("nickname", "A");
    assert_eq!(
        compiler.bulk_insert(&[company_row(), ragged]),
        Err(SqlError::RaggedBatch { row: 1 })
    );

    let second = company_row().with("id", "01J0000000000000000000000C");
    let stmt = compiler.bulk_insert(&[company_row(), second]).unwrap();
    assert_eq!(
        stmt.parameterized,
        r#"INSERT INTO "companies" ("id", "name", "orgId") VALUES ($1, $2, $3), ($4, $5, $6)"#
    );
}

#[test]
fn update_by_key_assigns_only_non_key_columns() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    let stmt = compiler
        .update_by_key(&company_row().with("employees", 12))
        .unwrap();
    assert_eq!(
        stmt.parameterized,
        r#"UPDATE "companies" SET "employees" = $1, "name" = $2 WHERE "id" = $3 AND "orgId" = $4"#
    );
    assert_eq!(
        stmt.sql,
        r#"UPDATE "companies" SET "employees" = 12, "name" = 'Acme' WHERE "id" = '01J0000000000000000000000A' AND "orgId" = '01J0000000000000000000000B'"#
    );
}

#[test]
fn update_rejects_key_only_payload() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    let mut row = company_row();
    row.remove("name");

    let err = compiler.update_by_key(&row).unwrap_err();
    assert_eq!(err, SqlError::NoUpdatableColumns);
    assert_eq!(err.to_string(), "no updatable columns provided");

    row.remove("id");
    row.insert("name", "Acme");
    assert_eq!(
        compiler.update_by_key(&row),
        Err(SqlError::MissingPrimaryKey { column: "id".into() })
    );
}

#[test]
fn delete_requires_a_filter() {
    let entity = company_entity();
    let compiler = SqlCompiler::new(&entity, &Postgres);
    assert_eq!(
        compiler.delete_by_equality(&Record::new()),
        Err(SqlError::EmptyDeleteFilter)
    );

    let filter = Record::new()
        .with("orgId", "01J0000000000000000000000B")
        .with("nickname", Value::Null);
    let stmt = compiler.delete_by_equality(&filter).unwrap();
    assert_eq!(
        stmt.parameterized,
        r#"DELETE FROM "companies" WHERE "nickname" IS NULL AND "orgId" = $1"#
    );
}

#[test]
fn text_literals_are_quoted() {
    let entity = company_entity();
    let stmt = SqlCompiler::new(&entity, &Postgres)
        .compile_filter(&Condition::equals("name", "O'Brien & Sons").into())
        .unwrap()
        .unwrap();
    assert_eq!(stmt.sql, r#""name" = 'O''Brien & Sons'"#);
}
