//! Loading structure files and creating their tables.

use restoc_core::{create_statements, AutoPrimary, Escaper, Structure, Table};
use restoc_exec::RecordingExecutor;
use restoc_testkit::prelude::*;
use std::sync::Arc;

#[test]
fn file_and_builder_agree() {
    let file = structure_file(USERS_JSON);
    let loaded = Structure::from_json_file(file.path()).unwrap();
    assert_eq!(loaded, users_structure());
    assert_eq!(*loaded.auto_primary(), AutoPrimary::AutoIncrement);
}

#[test]
fn loaded_structure_creates_its_table() {
    let file = structure_file(USERS_JSON);
    let structure = Structure::from_json_file(file.path()).unwrap();
    let exec = Arc::new(RecordingExecutor::new());
    let table = Table::new(structure, exec.clone());

    table.table_create().unwrap();
    let sql = exec.sql();
    assert_eq!(sql.len(), 1);
    assert!(sql[0].starts_with(
        "CREATE TABLE IF NOT EXISTS `app`.`users` (`_id` integer unsigned auto_increment not null, `email` varchar(127) not null"
    ));
    assert!(sql[0].contains("unique `ui_email` (`email`)"));
}

#[test]
fn audited_tables_get_a_history_table() {
    let exec = RecordingExecutor::new();
    let esc = Escaper::new(&exec, "primary");
    let sql = create_statements(&audited_structure(&["user"]), &esc).unwrap();
    assert_eq!(sql.len(), 2);
    assert!(sql[1].starts_with("CREATE TABLE IF NOT EXISTS `app`.`posts_changes` (`_id` char(36) not null"));
}

#[test]
fn broken_files_are_rejected() {
    let file = structure_file(r#"{"table": "users", "fields": []}"#);
    assert!(Structure::from_json_file(file.path()).is_err());
}
