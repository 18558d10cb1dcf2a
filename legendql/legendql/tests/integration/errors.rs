//! Error messages surfaced to users of the public API.
use insta::assert_snapshot;
use legendql::{
    tds_columns_from_json, ErrorKind, FrameToSqlConfig, JoinKind, NewColumn, PrimitiveType,
    TdsColumn, TdsFrame,
};

use super::{t, table};

#[test]
fn test_unknown_column_in_closure() {
    let err = t().filter(|r| r.get("c9")?.gt(1)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownColumn);
    assert_snapshot!(err, @r"
    Column - 'c9' doesn't exist in the current frame. Current frame columns: ['c1', 'c2', 'c3']
    ↳ Hint: error occurred while evaluating the filter function
    ");
}

#[test]
fn test_type_mismatch_in_extend() {
    let err = t()
        .extend([NewColumn::new("bad", |r| r.get("c2")?.add(1))])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert!(err
        .hints
        .contains(&"error occurred while evaluating the 'extend' lambda of column 'bad'".to_string()));
}

#[test]
fn test_duplicate_columns() {
    let err = t()
        .extend([NewColumn::new("c1", |r| r.get("c3"))])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateColumn);
    assert_snapshot!(err, @"Extend column name - 'c1' already exists in base frame");

    let err = t()
        .join(&t(), |l, r| l.get("c1")?.eq(r.get("c1")?), JoinKind::Inner)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateColumn);

    let err = TdsFrame::table(
        ["t"],
        vec![
            TdsColumn::new("a", PrimitiveType::Integer),
            TdsColumn::new("a", PrimitiveType::String),
        ],
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateColumn);
}

#[test]
fn test_validation_errors() {
    let err = t().slice(5, 5).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let other = table("u", &[("c1", PrimitiveType::Integer)]);
    let err = t().concatenate(&other).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = t()
        .group_by(Vec::<String>::new(), Vec::<NewColumn>::new())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[test]
fn test_as_of_join_has_no_sql() {
    let other = table("u", &[("k", PrimitiveType::Integer)]);
    let frame = t()
        .as_of_join(&other, |l, r| l.get("c1")?.ge(r.get("k")?))
        .unwrap()
        .select(["c1", "k"])
        .unwrap();

    let err = frame.to_sql_query(&FrameToSqlConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unsupported);
}

#[test]
fn test_unknown_database_type() {
    let err = t()
        .to_sql_query(&FrameToSqlConfig::default().with_database_type("Oracle"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownDialect);
    assert_snapshot!(err, @"Found no (or multiple) sql to string generators for database type 'Oracle'. Found generators: []");
}

#[test]
fn test_columns_from_json() {
    let columns = tds_columns_from_json(
        r#"{"columns": [{"name": "id", "type": "Integer"}, {"name": "label", "type": "String"}]}"#,
    )
    .unwrap();
    let frame = TdsFrame::table(["db", "schema", "t"], columns).unwrap();
    assert_eq!(frame.column_names(), vec!["id", "label"]);
}
