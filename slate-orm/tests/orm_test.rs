mod common;

use common::{init_logging, memory_engine, timestamp, AuditEntry, Project, User};
use slate_orm::{Error, Model, Op, Value};

#[test]
fn test_insert_and_query_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let user = User {
        id: None,
        email: "ana@example.com".to_string(),
        age: Some(30),
        is_admin: Some(false),
        create_at: Some(timestamp(3, 4, 5)),
    };
    let ids = session.insert_item(&user).commit()?;
    assert_eq!(ids, Some(vec![Value::Integer(1)]));

    let fetched = session.query::<User>().equals("email", "ana@example.com").first()?;
    let fetched = fetched.ok_or("user not found")?;
    assert_eq!(fetched.id, Some(1));
    assert_eq!(fetched.as_map()?, User { id: Some(1), ..user }.as_map()?);

    Ok(())
}

#[test]
fn test_current_timestamp_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let user = User {
        id: None,
        email: "alexm@str.com".to_string(),
        age: Some(18),
        is_admin: Some(true),
        create_at: Some(chrono::Local::now().naive_local()),
    };
    let ids = session.insert_item(&user).commit()?.ok_or("no ids returned")?;
    let id = ids[0].as_i64().ok_or("id is not an integer")?;

    let found = session.query::<User>().equals("email", "alexm@str.com").all()?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].as_map()?, User { id: Some(id), ..user }.as_map()?);
    Ok(())
}

#[test]
fn test_missing_row_is_none() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    assert_eq!(session.query::<User>().equals("email", "nobody@example.com").first()?, None);
    assert!(session.query::<User>().all()?.is_empty());
    Ok(())
}

#[test]
fn test_batch_insert_returns_ids_in_order() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let users = vec![User::new("a@x.io", 20, false), User::new("b@x.io", 21, false), User::new("c@x.io", 22, true)];
    let ids = session.insert_items(&users).commit()?;
    assert_eq!(ids, Some(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]));

    let empty: Vec<User> = Vec::new();
    assert_eq!(session.insert_items(&empty).commit()?, None);
    Ok(())
}

#[test]
fn test_insert_without_primary_key_returns_empty_ids() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let entry = AuditEntry { message: "it's started".to_string(), level: 2 };
    assert_eq!(session.insert_item(&entry).commit()?, Some(Vec::new()));
    assert_eq!(session.query::<AuditEntry>().all()?, vec![entry]);
    Ok(())
}

#[test]
fn test_filter_chain_precedence() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let users = vec![User::new("one@x.io", 1, false), User::new("two@x.io", 1, true), User::new("three@x.io", 5, false)];
    session.insert_items(&users).commit()?;

    // (age = 1 AND is_admin = true) OR email = 'three@x.io'
    let mut found = session
        .query::<User>()
        .filter("age", Op::Eq, 1)
        .and("is_admin", Op::Eq, true)
        .or("email", Op::Eq, "three@x.io")
        .all()?
        .into_iter()
        .map(|u| u.email)
        .collect::<Vec<_>>();
    found.sort();
    assert_eq!(found, vec!["three@x.io".to_string(), "two@x.io".to_string()]);

    let older = session.query::<User>().filter("age", Op::Gt, 1).all()?;
    assert_eq!(older.len(), 1);
    Ok(())
}

#[test]
fn test_null_filters() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let mut unknown = User::new("unknown@x.io", 0, false);
    unknown.age = None;
    session.insert_items(&[unknown, User::new("known@x.io", 40, false)]).commit()?;

    let missing_age = session.query::<User>().equals("age", Value::Null).all()?;
    assert_eq!(missing_age.len(), 1);
    assert_eq!(missing_age[0].email, "unknown@x.io");

    let with_age = session.query::<User>().filter("age", Op::Ne, Value::Null).all()?;
    assert_eq!(with_age.len(), 1);

    let err = session.query::<User>().filter("age", Op::Gt, Value::Null).all().unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    Ok(())
}

#[test]
fn test_update_and_delete() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    session.insert_items(&[User::new("a@x.io", 20, false), User::new("b@x.io", 30, false)]).commit()?;

    let changed = session.update::<User>().set("age", 31).set("is_admin", true).equals("email", "b@x.io").commit()?;
    assert_eq!(changed, 1);
    let b = session.query::<User>().equals("email", "b@x.io").first()?.ok_or("missing b")?;
    assert_eq!((b.age, b.is_admin), (Some(31), Some(true)));

    let changed = session.update::<User>().values([("age", 50)]).commit()?;
    assert_eq!(changed, 2);

    assert_eq!(session.delete::<User>().equals("email", "a@x.io").commit()?, 1);
    assert_eq!(session.query::<User>().all()?.len(), 1);

    session.delete::<User>().commit()?;
    assert!(session.query::<User>().all()?.is_empty());
    Ok(())
}

#[test]
fn test_update_rejects_bad_values_before_running() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let err = session.update::<User>().set("email", Value::Null).commit().unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = session.update::<User>().set("age", "old").commit().unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = session.update::<User>().set("nickname", "x").commit().unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    Ok(())
}

#[test]
fn test_mixed_models_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    session.insert_item(&User::new("owner@x.io", 33, true)).commit()?;
    let user = User::new("other@x.io", 20, false);
    let project = Project { id: None, user_id: 1, title: "Slate".to_string() };

    let err = session.insert_item(&user).add_item(&project).commit().unwrap_err();
    assert!(matches!(err, Error::DifferentModelsType(_)));
    assert_eq!(session.query::<User>().all()?.len(), 1);
    assert!(session.query::<Project>().all()?.is_empty());
    Ok(())
}

#[test]
fn test_unique_column_is_enforced() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    session.insert_item(&User::new("same@x.io", 20, false)).commit()?;
    let err = session.insert_item(&User::new("same@x.io", 21, false)).commit().unwrap_err();
    assert!(matches!(err, Error::DatabaseError(_)));
    Ok(())
}

#[test]
fn test_uncommitted_work_is_rolled_back() -> Result<(), Box<dyn std::error::Error>> {
    use slate_orm::Executor;

    init_logging();
    let mut engine = memory_engine()?;
    {
        let mut session = engine.session()?;
        session.execute(r#"INSERT INTO "user" ("email") VALUES ('ghost@x.io');"#)?;
    }

    let users = engine.with_session(|session| session.query::<User>().all())?;
    assert!(users.is_empty());
    Ok(())
}

#[test]
fn test_foreign_key_rows_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let mut engine = memory_engine()?;
    let mut session = engine.session()?;

    let ids = session.insert_item(&User::new("owner@x.io", 33, true)).commit()?.ok_or("no ids")?;
    let owner = ids[0].as_i64().ok_or("id is not an integer")?;

    let projects = vec![
        Project { id: None, user_id: owner, title: "Slate".to_string() },
        Project { id: None, user_id: owner, title: "Chalk".to_string() },
    ];
    session.insert_items(&projects).commit()?;

    let owned = session.query::<Project>().equals("user_id", owner).limit(1).all()?;
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].title, "Slate");
    Ok(())
}

#[test]
fn test_from_values_fills_missing_columns_with_null() -> Result<(), Box<dyn std::error::Error>> {
    let user = User::from_values([("email", Value::from("x@x.io")), ("age", Value::Integer(7))])?;
    assert_eq!(user, User { id: None, email: "x@x.io".to_string(), age: Some(7), is_admin: None, create_at: None });

    let err = User::from_values([("age", Value::Integer(7))]).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    Ok(())
}
