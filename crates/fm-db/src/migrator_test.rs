use super::*;
use crate::introspect::{describe_table, foreign_key_count};
use fm_core::{builtin_migrations, FieldDef, FieldKind, OnDelete};

fn key(s: &str) -> MigrationKey {
    s.parse().unwrap()
}

fn table(name: &str, fields: Vec<FieldDef>) -> TableDef {
    let mut all = vec![FieldDef::new("id", FieldKind::Auto)];
    all.extend(fields);
    TableDef {
        name: TableName::new(name),
        fields: all,
    }
}

fn record(name: &str, deps: &[&str], tables: Vec<TableDef>) -> SchemaChangeRecord {
    SchemaChangeRecord {
        app: "main".to_string(),
        name: name.to_string(),
        dependencies: deps.iter().map(|d| key(d)).collect(),
        operations: tables.into_iter().map(Operation::CreateTable).collect(),
    }
}

/// Stand-in for the history that created `Batch` and `Opcode`
fn parents() -> SchemaChangeRecord {
    record(
        "0008_auto_20180117_0003",
        &[],
        vec![
            table("Batch", vec![FieldDef::new("label", FieldKind::Char { max_length: 32 })]),
            table("Opcode", vec![FieldDef::new("mnemonic", FieldKind::Char { max_length: 32 })]),
        ],
    )
}

fn signal_errors() -> SchemaChangeRecord {
    builtin_migrations().unwrap().remove(0)
}

fn catalog() -> Vec<SchemaChangeRecord> {
    vec![parents(), signal_errors()]
}

#[test]
fn apply_creates_table_and_records_it() {
    let db = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    apply(&db, &parents(), &mut applied).unwrap();
    apply(&db, &signal_errors(), &mut applied).unwrap();

    assert!(applied.contains(&key("main.0009_testsignalerror")));
    assert_eq!(AppliedSet::load(db.conn()).unwrap(), applied);

    let columns = describe_table(db.conn(), "TestSignalError").unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "pretty", "signal", "batch_id", "opcode_id"]);
    assert!(columns.iter().all(|c| c.data_type == "INTEGER" || c.data_type == "VARCHAR"));
    assert!(columns.iter().skip(1).all(|c| !c.nullable));
    assert_eq!(foreign_key_count(db.conn(), "TestSignalError").unwrap(), 2);
}

#[test]
fn apply_enforces_char_bound() {
    let db = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    apply(&db, &parents(), &mut applied).unwrap();
    apply(&db, &signal_errors(), &mut applied).unwrap();
    db.conn()
        .execute_batch(
            "INSERT INTO \"Batch\" (label) VALUES ('b');
             INSERT INTO \"Opcode\" (mnemonic) VALUES ('ADD');",
        )
        .unwrap();

    let ok = format!(
        "INSERT INTO \"TestSignalError\" (pretty, signal, batch_id, opcode_id) VALUES ('{}', 11, 1, 1)",
        "x".repeat(256)
    );
    db.conn().execute(&ok, []).unwrap();

    let too_long = ok.replace(&"x".repeat(256), &"x".repeat(257));
    assert!(db.conn().execute(&too_long, []).is_err());
}

#[test]
fn apply_table_name_with_dot_uses_its_own_sequence() {
    let db = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    let dotted = record(
        "0001_dotted",
        &[],
        vec![table("Signal.Error", vec![FieldDef::new("signal", FieldKind::Integer)])],
    );
    apply(&db, &dotted, &mut applied).unwrap();

    db.conn()
        .execute_batch("INSERT INTO \"Signal.Error\" (signal) VALUES (11), (4);")
        .unwrap();
    let max_id: i64 = db
        .conn()
        .query_row("SELECT max(id) FROM \"Signal.Error\"", [], |row| row.get(0))
        .unwrap();
    assert_eq!(max_id, 2);
}

#[test]
fn apply_twice_is_schema_conflict() {
    let db = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    apply(&db, &parents(), &mut applied).unwrap();
    apply(&db, &signal_errors(), &mut applied).unwrap();

    let err = apply(&db, &signal_errors(), &mut applied).unwrap_err();
    assert!(matches!(err, MigrateError::SchemaConflict { .. }), "{err}");
}

#[test]
fn apply_over_existing_table_fails() {
    let db = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    apply(&db, &parents(), &mut applied).unwrap();
    db.conn()
        .execute_batch("CREATE TABLE testsignalerror (id INTEGER)")
        .unwrap();

    let err = apply(&db, &signal_errors(), &mut applied).unwrap_err();
    match err {
        MigrateError::TableAlreadyExists { table, .. } => assert_eq!(table, "TestSignalError"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!applied.contains(&key("main.0009_testsignalerror")));
}

#[test]
fn apply_before_dependency_fails() {
    let db = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    let err = apply(&db, &signal_errors(), &mut applied).unwrap_err();
    match err {
        MigrateError::DependencyNotSatisfied { dependency, .. } => {
            assert_eq!(dependency, "main.0008_auto_20180117_0003")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!table_exists(db.conn(), "TestSignalError").unwrap());
}

#[test]
fn apply_with_missing_target_table_is_constraint_violation() {
    let db = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    applied.insert(key("main.0008_auto_20180117_0003"), "faked".to_string());

    let err = apply(&db, &signal_errors(), &mut applied).unwrap_err();
    assert!(
        matches!(err, MigrateError::ConstraintViolationOnApply { .. }),
        "{err}"
    );
    assert!(!table_exists(db.conn(), "TestSignalError").unwrap());
    assert!(AppliedSet::load(db.conn()).unwrap().is_empty());
}

#[test]
fn migrate_applies_plan_in_order() {
    let db = MigrationDb::open_memory().unwrap();
    let migrator = Migrator::new(&db, catalog(), MigratorOptions::default()).unwrap();

    let planned: Vec<_> = migrator
        .plan(None)
        .unwrap()
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(planned, vec!["0008_auto_20180117_0003", "0009_testsignalerror"]);

    let report = migrator.migrate(None).unwrap();
    assert_eq!(
        report.applied,
        vec![key("main.0008_auto_20180117_0003"), key("main.0009_testsignalerror")]
    );
    assert!(migrator.plan(None).unwrap().is_empty());
    assert_eq!(migrator.migrate(None).unwrap(), MigrationReport::default());
}

#[test]
fn migrate_to_target_stops_there() {
    let db = MigrationDb::open_memory().unwrap();
    let migrator = Migrator::new(&db, catalog(), MigratorOptions::default()).unwrap();
    let report = migrator
        .migrate(Some(&key("main.0008_auto_20180117_0003")))
        .unwrap();
    assert_eq!(report.applied.len(), 1);
    assert!(!table_exists(db.conn(), "TestSignalError").unwrap());
}

#[test]
fn migrate_halts_on_unsatisfied_external_dependency() {
    let db = MigrationDb::open_memory().unwrap();
    let later = record(
        "0010_later",
        &["main.0009_testsignalerror"],
        vec![table("Later", vec![])],
    );
    let migrator =
        Migrator::new(&db, vec![signal_errors(), later], MigratorOptions::default()).unwrap();

    let err = migrator.migrate(None).unwrap_err();
    assert!(matches!(err, MigrateError::DependencyNotSatisfied { .. }));
    assert!(migrator.applied().unwrap().is_empty());
    assert!(!table_exists(db.conn(), "Later").unwrap());
}

#[test]
fn fake_external_then_migrate() {
    let db = MigrationDb::open_memory().unwrap();
    db.conn()
        .execute_batch(
            "CREATE TABLE \"Batch\" (id INTEGER PRIMARY KEY);
             CREATE TABLE \"Opcode\" (id INTEGER PRIMARY KEY);",
        )
        .unwrap();
    let migrator = Migrator::new(&db, vec![signal_errors()], MigratorOptions::default()).unwrap();

    migrator
        .fake(&key("main.0008_auto_20180117_0003"))
        .unwrap();
    let report = migrator.migrate(None).unwrap();
    assert_eq!(report.applied, vec![key("main.0009_testsignalerror")]);
    assert!(table_exists(db.conn(), "TestSignalError").unwrap());
}

#[test]
fn fake_rejects_unknown_and_duplicate_keys() {
    let db = MigrationDb::open_memory().unwrap();
    let migrator = Migrator::new(&db, catalog(), MigratorOptions::default()).unwrap();

    assert!(matches!(
        migrator.fake(&key("main.9999_nope")).unwrap_err(),
        MigrateError::Core(fm_core::CoreError::MigrationNotFound { .. })
    ));
    assert!(matches!(
        migrator.fake(&key("main.0009_testsignalerror")).unwrap_err(),
        MigrateError::DependencyNotSatisfied { .. }
    ));

    migrator
        .fake(&key("main.0008_auto_20180117_0003"))
        .unwrap();
    assert!(matches!(
        migrator
            .fake(&key("main.0008_auto_20180117_0003"))
            .unwrap_err(),
        MigrateError::SchemaConflict { .. }
    ));
}

#[test]
fn unapply_is_disabled_by_default() {
    let db = MigrationDb::open_memory().unwrap();
    let migrator = Migrator::new(&db, catalog(), MigratorOptions::default()).unwrap();
    migrator.migrate(None).unwrap();

    let err = migrator
        .unapply(&key("main.0009_testsignalerror"))
        .unwrap_err();
    assert!(matches!(err, MigrateError::RollbackDisabled { .. }));
    assert!(table_exists(db.conn(), "TestSignalError").unwrap());
}

#[test]
fn unapply_reverses_latest_record() {
    let db = MigrationDb::open_memory().unwrap();
    let options = MigratorOptions {
        allow_rollback: true,
    };
    let migrator = Migrator::new(&db, catalog(), options).unwrap();
    migrator.migrate(None).unwrap();

    let err = migrator
        .unapply(&key("main.0008_auto_20180117_0003"))
        .unwrap_err();
    assert!(matches!(err, MigrateError::DependentStillApplied { .. }));

    migrator.unapply(&key("main.0009_testsignalerror")).unwrap();
    assert!(!table_exists(db.conn(), "TestSignalError").unwrap());
    assert!(!migrator
        .applied()
        .unwrap()
        .contains(&key("main.0009_testsignalerror")));

    let err = migrator
        .unapply(&key("main.0009_testsignalerror"))
        .unwrap_err();
    assert!(matches!(err, MigrateError::SchemaConflict { .. }));

    // re-applying after reversal works
    let report = migrator.migrate(None).unwrap();
    assert_eq!(report.applied, vec![key("main.0009_testsignalerror")]);
}

#[test]
fn status_lists_externals_then_records() {
    let db = MigrationDb::open_memory().unwrap();
    let migrator = Migrator::new(&db, vec![signal_errors()], MigratorOptions::default()).unwrap();
    migrator
        .fake(&key("main.0008_auto_20180117_0003"))
        .unwrap();

    let status = migrator.status().unwrap();
    assert_eq!(status.len(), 2);
    assert_eq!(status[0].key, key("main.0008_auto_20180117_0003"));
    assert!(status[0].external);
    assert!(status[0].is_applied());
    assert_eq!(status[1].key, key("main.0009_testsignalerror"));
    assert!(!status[1].is_applied());
    assert_eq!(status[1].operations, vec!["Create table TestSignalError"]);
}

#[test]
fn sql_for_uses_catalog_primary_keys() {
    let db = MigrationDb::open_memory().unwrap();
    let custom_batch = record(
        "0008_auto_20180117_0003",
        &[],
        vec![
            TableDef {
                name: TableName::new("Batch"),
                fields: vec![FieldDef::new("batch_no", FieldKind::Auto)],
            },
            table("Opcode", vec![]),
        ],
    );
    let migrator = Migrator::new(
        &db,
        vec![custom_batch, signal_errors()],
        MigratorOptions::default(),
    )
    .unwrap();

    let forward = migrator
        .sql_for(&key("main.0009_testsignalerror"), false)
        .unwrap();
    assert!(forward[1].contains("REFERENCES \"Batch\" (\"batch_no\")"));

    // and the live apply agrees with it
    migrator.migrate(None).unwrap();
    assert_eq!(foreign_key_count(db.conn(), "TestSignalError").unwrap(), 2);

    let backward = migrator
        .sql_for(&key("main.0009_testsignalerror"), true)
        .unwrap();
    assert_eq!(backward[0], "DROP TABLE \"TestSignalError\"");
}

#[test]
fn project_state_declares_unmanaged_tables_external() {
    let db = MigrationDb::open_memory().unwrap();
    db.conn()
        .execute_batch(
            "CREATE TABLE \"Batch\" (id INTEGER PRIMARY KEY);
             CREATE TABLE \"Opcode\" (id INTEGER PRIMARY KEY);",
        )
        .unwrap();
    let migrator = Migrator::new(&db, vec![signal_errors()], MigratorOptions::default()).unwrap();
    migrator
        .fake(&key("main.0008_auto_20180117_0003"))
        .unwrap();
    migrator.migrate(None).unwrap();

    let state = migrator.project_state().unwrap();
    assert!(state.contains("Batch"));
    assert!(state.get("Batch").is_none());
    let refs = state.referencing("Opcode");
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].column, "opcode_id");
    assert_eq!(refs[0].on_delete, OnDelete::Cascade);
}

#[test]
fn topological_orders_produce_identical_schemas() {
    let arch = record("a", &[], vec![table("Arch", vec![])]);
    let left = record(
        "b",
        &["main.a"],
        vec![table(
            "Left",
            vec![FieldDef::new(
                "arch",
                FieldKind::ForeignKey {
                    to: TableName::new("Arch"),
                    on_delete: OnDelete::Cascade,
                },
            )],
        )],
    );
    let right = record(
        "c",
        &["main.a"],
        vec![table("Right", vec![FieldDef::new("n", FieldKind::Integer)])],
    );

    let describe_all = |db: &MigrationDb| {
        list_tables(db.conn())
            .unwrap()
            .into_iter()
            .map(|t| {
                let cols = describe_table(db.conn(), &t).unwrap();
                let fks = foreign_key_count(db.conn(), &t).unwrap();
                (t, cols, fks)
            })
            .collect::<Vec<_>>()
    };

    let first = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    for r in [&arch, &left, &right] {
        apply(&first, r, &mut applied).unwrap();
    }

    let second = MigrationDb::open_memory().unwrap();
    let mut applied = AppliedSet::new();
    for r in [&arch, &right, &left] {
        apply(&second, r, &mut applied).unwrap();
    }

    assert_eq!(describe_all(&first), describe_all(&second));
    assert_eq!(describe_all(&first).len(), 3);
}
