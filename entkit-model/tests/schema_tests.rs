use entkit_model::{AdhocEntry, AdhocSchema, DataType, EntityRule, Field, FieldRule, Schema};
use entkit_types::Value;
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_account_schema() -> Schema {
    Schema::define("Account")
        .label("Account")
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
                .length(1, 120)
                .build(),
        )
        .field(Field::define("email").data_type(DataType::Email).unique().build())
        .unique(["name", "orgId"])
        .build()
}

// ── Field builder ────────────────────────────────────────────────

#[test]
fn field_defaults() {
    let f = Field::define("title").build();
    assert_eq!(f.name(), "title");
    assert_eq!(f.label(), "title");
    assert_eq!(f.data_type(), DataType::String);
    assert!(!f.is_required());
    assert!(f.default_value().is_none());
    assert!(f.rules().is_empty());
}

#[test]
fn field_rules_are_kept_in_order() {
    let f = Field::define("age")
        .data_type(DataType::Integer)
        .min(0)
        .max(150)
        .build();
    assert_eq!(
        f.rules(),
        &[FieldRule::Min(Value::Int(0)), FieldRule::Max(Value::Int(150))]
    );
}

#[test]
fn field_rule_accessors() {
    let f = Field::define("status")
        .data_type(DataType::EnumString)
        .one_of(["open", "closed"])
        .length(2, 10)
        .unique()
        .build();
    assert_eq!(f.length_rule(), Some((2, 10)));
    assert_eq!(
        f.one_of_values(),
        Some(&[Value::from("open"), Value::from("closed")][..])
    );
    assert!(f.is_unique());
    assert!(!f.is_primary());
    assert!(!f.is_tenant());
}

#[test]
fn field_options_and_default() {
    let f = Field::define("price")
        .data_type(DataType::Float)
        .option("precision", "12")
        .option("scale", "2")
        .default_value(0.0)
        .build();
    assert_eq!(f.option("precision"), Some("12"));
    assert_eq!(f.option("missing"), None);
    assert_eq!(f.default_value(), Some(&Value::Float(0.0)));
}

#[test]
#[should_panic(expected = "field name must not be empty")]
fn field_with_empty_name_panics() {
    let _ = Field::define("").build();
}

#[test]
#[should_panic(expected = "field name must not be empty")]
fn field_with_blank_name_panics() {
    let _ = Field::define("   ").build();
}

#[test]
fn to_builder_specializes_a_copy() {
    let base = Field::define("code").length(1, 10).build();
    let special = base.to_builder().required(true).build();
    assert!(special.is_required());
    assert!(!base.is_required());
    assert_eq!(special.length_rule(), Some((1, 10)));
}

// ── Schema builder ───────────────────────────────────────────────

#[test]
fn schema_keeps_declaration_order() {
    let s = make_account_schema();
    let names: Vec<&str> = s.field_names().collect();
    assert_eq!(names, vec!["id", "orgId", "name", "email"]);
}

#[test]
fn schema_entity_rules() {
    let s = make_account_schema();
    assert_eq!(
        s.rules(),
        &[EntityRule::Unique(vec!["name".into(), "orgId".into()])]
    );
}

#[test]
fn same_name_field_overwrites_in_place() {
    let s = Schema::define("Thing")
        .field(Field::define("a").build())
        .field(Field::define("b").build())
        .field(Field::define("a").data_type(DataType::Integer).build())
        .build();
    assert_eq!(s.fields().len(), 2);
    assert_eq!(s.fields()[0].name(), "a");
    assert_eq!(s.fields()[0].data_type(), DataType::Integer);
}

#[test]
fn field_lookup_by_name() {
    let s = make_account_schema();
    assert_eq!(s.field("email").map(Field::data_type), Some(DataType::Email));
    assert!(s.field("nope").is_none());
}

// ── DataType ─────────────────────────────────────────────────────

#[test]
fn custom_types_own_validation() {
    for dt in DataType::ALL {
        if dt.is_custom() {
            assert!(dt.owns_validation(), "{dt} should own its validation");
        }
    }
    assert!(DataType::Email.owns_validation());
    assert!(!DataType::String.owns_validation());
    assert!(!DataType::Integer.owns_validation());
}

#[test]
fn data_type_serde_names() {
    assert_eq!(serde_json::to_value(DataType::DateTime).unwrap(), json!("dateTime"));
    let dt: DataType = serde_json::from_value(json!("enumNumber")).unwrap();
    assert_eq!(dt, DataType::EnumNumber);
    assert_eq!(DataType::LocalizedText.to_string(), "localizedText");
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn schema_deserializes_from_json() {
    let s: Schema = serde_json::from_value(json!({
        "name": "Tag",
        "fields": [
            {"name": "id", "dataType": "uuid", "rules": ["primary"]},
            {"name": "label", "dataType": "string", "isRequired": true,
             "rules": [{"length": {"min": 1, "max": 40}}]}
        ],
        "rules": [{"unique": ["label"]}]
    }))
    .unwrap();
    assert_eq!(s.name(), "Tag");
    assert!(s.field("id").unwrap().is_primary());
    assert_eq!(s.field("label").unwrap().length_rule(), Some((1, 40)));
    assert_eq!(s.rules(), &[EntityRule::Unique(vec!["label".into()])]);
}

#[test]
fn schema_serde_round_trip() {
    let s = make_account_schema();
    let json = serde_json::to_string(&s).unwrap();
    let back: Schema = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
}

// ── Ad hoc schemas ───────────────────────────────────────────────

#[test]
fn adhoc_holders_nest_schemas() {
    let adhoc = AdhocSchema::define("signup")
        .field(Field::define("email").data_type(DataType::Email).required(true).build())
        .holder(
            "address",
            true,
            AdhocSchema::define("address")
                .field(Field::define("city").required(true).build())
                .field(Field::define("country").data_type(DataType::CountryCode).build()),
        )
        .build();

    assert_eq!(adhoc.entries().len(), 2);
    assert_eq!(adhoc.fields().count(), 1);
    let holder = adhoc.holders().next().unwrap();
    assert_eq!(holder.name, "address");
    assert!(holder.required);
    assert_eq!(holder.schema.fields().count(), 2);
    assert!(matches!(adhoc.entry("address"), Some(AdhocEntry::Holder(_))));
}

#[test]
fn adhoc_from_schema_copies_fields() {
    let s = make_account_schema();
    let adhoc = AdhocSchema::from_schema(&s);
    assert_eq!(adhoc.name(), "Account");
    assert_eq!(adhoc.fields().count(), 4);
    assert_eq!(adhoc.holders().count(), 0);
}
