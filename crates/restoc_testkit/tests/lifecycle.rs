//! Record lifecycle against the recording executor.

use restoc_codec::{Value, ValueMap};
use restoc_core::{AuditInfo, Conflict, Filter, RecordError};
use restoc_exec::{ExecError, Response, SelectOutput};
use restoc_testkit::prelude::*;

#[test]
fn create_then_delete_twice() {
    let t = TestTable::new(users_structure());
    let mut user = t
        .record([
            ("email", Value::from("a@b.c")),
            ("verified", Value::Bool(false)),
            ("meta", Value::map([("theme", Value::from("dark"))])),
        ])
        .unwrap();
    assert!(user.is_new());

    t.exec.push(Response::InsertId(Value::Integer(41)));
    assert_eq!(
        user.create(&Conflict::Error, &AuditInfo::None).unwrap(),
        Some(Value::Integer(41))
    );
    assert!(!user.is_dirty());

    assert!(user.delete(&AuditInfo::None).unwrap());
    assert!(user.is_new());
    assert!(matches!(
        user.delete(&AuditInfo::None),
        Err(RecordError::MissingPrimaryKey { .. })
    ));

    assert_eq!(
        t.sql(),
        vec![
            r#"INSERT INTO `app`.`users` (`email`,`verified`,`meta`) VALUES ('a@b.c',0,'{\"theme\":\"dark\"}')"#,
            "DELETE FROM `app`.`users` WHERE `_id` = 41",
        ]
    );
}

#[test]
fn save_with_nothing_dirty_sends_nothing() {
    let t = TestTable::new(users_structure());
    let mut user = t.loaded(&[("_id", Value::Integer(1)), ("email", Value::from("x"))]);
    assert!(!user.save(false, &AuditInfo::None).unwrap());
    assert!(t.sql().is_empty());
}

#[test]
fn duplicate_key_surfaces_as_typed_error() {
    let t = TestTable::new(users_structure());
    let mut user = t
        .record([("email", Value::from("a@b.c")), ("verified", Value::Bool(true))])
        .unwrap();
    t.exec.push(Response::Error(ExecError::duplicate_from_message(
        1062,
        "Duplicate entry 'a@b.c' for key 'ui_email'",
    )));

    match user.create(&Conflict::Error, &AuditInfo::None) {
        Err(RecordError::Duplicate { value, key }) => {
            assert_eq!(value, "a@b.c");
            assert_eq!(key, "ui_email");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(user.is_new());
}

#[test]
fn create_on_audited_table_writes_inserted_entry() {
    let t = TestTable::new(audited_structure(&[]));
    let mut post = t.record([("title", Value::from("Hello"))]).unwrap();
    t.exec.push(Response::Affected(0));
    t.exec.push(Response::Affected(1));
    t.exec.push_cell("0a2c6d9e-0000-4000-8000-000000000001");

    let id = post.create(&Conflict::Error, &AuditInfo::None).unwrap();
    assert_eq!(id, Some(Value::from("0a2c6d9e-0000-4000-8000-000000000001")));

    let sql = t.sql();
    assert_eq!(sql.len(), 4);
    assert_eq!(sql[0], "SET @_AUTO_PRIMARY = UUID()");
    assert!(sql[1].starts_with("INSERT INTO `app`.`posts` (`_id`,`title`,`_rev`) VALUES (@_AUTO_PRIMARY,'Hello','1-"));
    assert_eq!(sql[2], "SELECT @_AUTO_PRIMARY");
    assert_eq!(
        sql[3],
        r#"INSERT INTO `app`.`posts_changes` (`_id`,`created`,`items`) VALUES ('0a2c6d9e-0000-4000-8000-000000000001',CURRENT_TIMESTAMP,'{\"new\":\"inserted\",\"old\":null}')"#
    );
}

#[test]
fn required_audit_fields_fail_before_any_sql() {
    let t = TestTable::new(audited_structure(&["user"]));
    let mut post = t.record([("title", Value::from("Hello"))]).unwrap();
    assert!(matches!(
        post.create(&Conflict::Error, &AuditInfo::None),
        Err(RecordError::MissingAuditFields { .. })
    ));

    let mut loaded = t.loaded(&[
        ("_id", Value::from("0a2c6d9e-0000-4000-8000-000000000001")),
        ("title", Value::from("a")),
        ("_rev", Value::from("1-abc")),
    ]);
    loaded.set("title", "b").unwrap();
    assert!(matches!(
        loaded.save(false, &AuditInfo::fields([("other", Value::Integer(1))])),
        Err(RecordError::MissingAuditFields { .. })
    ));
    assert!(matches!(
        loaded.delete(&AuditInfo::None),
        Err(RecordError::MissingAuditFields { .. })
    ));
    assert!(t.sql().is_empty());
}

#[test]
fn concurrent_saves_conflict_on_revision() {
    let t = TestTable::new(audited_structure(&[]));
    let pairs = [
        ("_id", Value::from("0a2c6d9e-0000-4000-8000-000000000001")),
        ("title", Value::from("first")),
        ("_rev", Value::from("1-abc")),
    ];
    let mut first = t.loaded(&pairs);
    let mut second = t.loaded(&pairs);

    first.set("title", "from first").unwrap();
    t.exec.push_cell("1-abc");
    assert!(first.save(false, &AuditInfo::None).unwrap());
    let advanced = first.get("_rev").and_then(Value::as_text).unwrap().to_string();
    assert!(advanced.starts_with("2-"));

    second.set("title", "from second").unwrap();
    t.exec.push_cell(advanced.as_str());
    match second.save(false, &AuditInfo::None) {
        Err(e @ RecordError::RevisionConflict { .. }) => assert!(e.is_conflict()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn missing_row_is_reported_as_false() {
    let t = TestTable::new(audited_structure(&[]));
    let mut post = t.loaded(&[
        ("_id", Value::from("0a2c6d9e-0000-4000-8000-000000000001")),
        ("_rev", Value::from("3-abc")),
    ]);
    post.set("title", "x").unwrap();
    t.exec.push(Response::Selected(SelectOutput::Cell(None)));
    assert!(!post.save(false, &AuditInfo::None).unwrap());
    assert_eq!(t.sql().len(), 1);
}

#[test]
fn batch_and_history_operations() {
    let t = TestTable::new(users_structure());
    let mut batch = vec![
        t.record([("email", Value::from("a")), ("verified", Value::Bool(true))])
            .unwrap(),
        t.record([("email", Value::from("b")), ("verified", Value::Bool(false))])
            .unwrap(),
    ];
    t.exec.push(Response::Affected(2));
    assert_eq!(t.create_many(&mut batch, &Conflict::Ignore).unwrap(), 2);
    assert!(t
        .exec
        .last_sql()
        .unwrap()
        .starts_with("INSERT IGNORE INTO `app`.`users` (`email`,`name`,`verified`,`age`,`meta`) VALUES ('a',NULL,1,NULL,NULL),"));

    t.exec.push(Response::Affected(5));
    assert_eq!(
        t.update_field(
            "verified",
            &Value::Bool(true),
            None,
            &Filter::new().with("age", Value::map([("gte", Value::Integer(18))]))
        )
        .unwrap(),
        5
    );
    assert_eq!(
        t.exec.last_sql().unwrap(),
        "UPDATE `app`.`users` SET `verified` = 1 WHERE `age` >= 18"
    );

    let audited = TestTable::new(audited_structure(&["user"]));
    assert!(matches!(
        audited.add_changes(&Value::from("id"), &ValueMap::from([("note".to_string(), Value::from("x"))])),
        Err(RecordError::MissingAuditFields { .. })
    ));
    assert!(audited
        .add_changes(
            &Value::from("0a2c6d9e-0000-4000-8000-000000000001"),
            &ValueMap::from([("user".to_string(), Value::Integer(3))])
        )
        .unwrap());
}
