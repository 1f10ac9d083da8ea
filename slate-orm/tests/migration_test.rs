mod common;

use common::{init_logging, memory_engine, AuditEntry, Project, User};
use slate_orm::{Column, ColumnType, Literal, Model, PostgresAdapter, SqliteAdapter, Value};

#[test]
fn test_derived_schema_renders_per_dialect() -> Result<(), Box<dyn std::error::Error>> {
    let postgres = User::columns().iter().map(|c| c.render_sql(&PostgresAdapter)).collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        postgres,
        vec![
            r#""id" SERIAL PRIMARY KEY"#,
            r#""email" VARCHAR(120) UNIQUE NOT NULL"#,
            r#""age" INT DEFAULT 18"#,
            r#""is_admin" BOOLEAN DEFAULT 't'"#,
            r#""create_at" TIMESTAMP DEFAULT now()"#,
        ]
    );

    let sqlite = User::columns().iter().map(|c| c.render_sql(&SqliteAdapter)).collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        sqlite,
        vec![
            r#""id" INTEGER PRIMARY KEY"#,
            r#""email" TEXT NOT NULL"#,
            r#""age" INTEGER DEFAULT 18"#,
            r#""is_admin" INTEGER DEFAULT 1"#,
            r#""create_at" TIMESTAMP DEFAULT CURRENT_TIMESTAMP"#,
        ]
    );

    let fk = &Project::foreign_keys()[0];
    assert_eq!(
        fk.render_sql(&PostgresAdapter),
        r#"CONSTRAINT "fk_project_user_id" FOREIGN KEY ("user_id") REFERENCES "user" ("id") ON DELETE CASCADE ON UPDATE CASCADE"#
    );
    Ok(())
}

#[test]
fn test_derived_field_constants_and_metadata() {
    assert_eq!(common::user_fields::EMAIL, "email");
    assert_eq!(common::project_fields::USER_ID, "user_id");
    assert_eq!(common::audit_entry_fields::LEVEL, "level");

    assert_eq!(User::table_name(), "user");
    assert_eq!(AuditEntry::table_name(), "audit_entry");
    assert_eq!(User::primary_key_column().map(|c| c.name.as_str()), Some("id"));
    assert!(AuditEntry::primary_key_column().is_none());
    assert!(!User::schema().column("email").is_some_and(|c| c.nullable));
}

#[test]
fn test_column_introspection_decodes_defaults() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let columns = session.table_info::<User>().columns_info()?;
    let names = columns.iter().map(|c| c.column_name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["id", "email", "age", "is_admin", "create_at"]);

    let defaults = columns
        .iter()
        .zip(User::columns())
        .map(|(info, column)| info.default_value(&column.column_type))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(defaults, vec![None, None, Some(Value::Integer(18)), Some(Value::Boolean(true)), None]);

    assert!(!columns[1].is_nullable);
    assert!(columns[2].is_nullable);
    Ok(())
}

#[test]
fn test_constraint_introspection() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let constraints = session.table_info::<Project>().constraints_info()?;
    assert_eq!(constraints.len(), 1);
    assert_eq!(constraints[0].table_name, "project");
    assert_eq!(constraints[0].column_name, "user_id");
    assert_eq!(constraints[0].foreign_table_name, "user");
    assert_eq!(constraints[0].foreign_column_name, "id");

    assert!(session.table_info::<User>().constraints_info()?.is_empty());
    Ok(())
}

#[test]
fn test_migration_operations() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;
    let mut migration = session.migration();

    let nickname = Column::new("nickname", ColumnType::string().with_default(Literal::new("anon")));
    migration.add_column("user", &nickname)?;
    let columns = migration.table_columns("user")?;
    let added = columns.iter().find(|c| c.column_name == "nickname").ok_or("nickname not added")?;
    assert_eq!(added.default_value(&nickname.column_type)?, Some(Value::from("anon")));

    migration.delete_column("user", "nickname")?;
    assert!(migration.table_columns("user")?.iter().all(|c| c.column_name != "nickname"));

    migration.change_table_name("audit_entry", "audit_log")?;
    let tables = migration.table_list()?;
    assert!(tables.contains(&"audit_log".to_string()));
    assert!(!tables.contains(&"audit_entry".to_string()));

    migration.delete_table("audit_log")?.create_table::<AuditEntry>()?;
    let tables = migration.table_list()?;
    assert!(tables.contains(&"audit_entry".to_string()));
    assert!(!tables.contains(&"audit_log".to_string()));
    Ok(())
}

#[test]
fn test_added_unique_column_gets_an_index() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let code = Column::new("code", ColumnType::string()).unique(true);
    session.migration().add_column("project", &code)?;

    session.insert_item(&User::new("owner@x.io", 40, true)).commit()?;
    slate_orm::Executor::execute(&mut session, r#"INSERT INTO "project" ("user_id", "title", "code") VALUES (1, 'a', 'X');"#)?;
    let duplicate =
        slate_orm::Executor::execute(&mut session, r#"INSERT INTO "project" ("user_id", "title", "code") VALUES (1, 'b', 'X');"#);
    assert!(duplicate.is_err());
    Ok(())
}

#[derive(Model, Debug, Clone, PartialEq)]
struct Setting {
    #[orm(default = "x")]
    level: Option<i64>,
}

#[test]
fn test_mismatched_derived_default_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let err = Setting::columns()[0].render_sql(&PostgresAdapter).unwrap_err();
    assert!(matches!(err, slate_orm::Error::Validation(_)));

    let mut engine = memory_engine()?;
    let mut session = engine.session()?;
    let err = session.migration().create_table::<Setting>().map(|_| ()).unwrap_err();
    assert!(matches!(err, slate_orm::Error::Validation(_)));
    assert!(!session.migration().table_list()?.contains(&"setting".to_string()));
    Ok(())
}
