#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use slate_orm::{DbUrl, Engine, Model};

#[derive(Model, Debug, Clone, PartialEq)]
#[orm(table = "user")]
pub struct User {
    #[orm(primary_key, autoincrement)]
    pub id: Option<i64>,
    #[orm(size = 120, unique)]
    pub email: String,
    #[orm(default = 18)]
    pub age: Option<i64>,
    #[orm(default = true)]
    pub is_admin: Option<bool>,
    #[orm(default_now)]
    pub create_at: Option<NaiveDateTime>,
}

impl User {
    pub fn new(email: &str, age: i64, is_admin: bool) -> Self {
        User { id: None, email: email.to_string(), age: Some(age), is_admin: Some(is_admin), create_at: None }
    }
}

#[derive(Model, Debug, Clone, PartialEq)]
pub struct Project {
    #[orm(primary_key, autoincrement)]
    pub id: Option<i64>,
    #[orm(foreign_key = "user::id", on_delete = "cascade", on_update = "cascade")]
    pub user_id: i64,
    #[orm(size = 80)]
    pub title: String,
}

/// A table without a primary key.
#[derive(Model, Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub message: String,
    pub level: i32,
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn timestamp(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(h, m, s).unwrap()
}

/// An in-memory database at version 1 with every test table created.
pub fn memory_engine() -> slate_orm::Result<Engine> {
    Engine::builder(DbUrl::sqlite_memory())
        .version(1)
        .on_create(|create| {
            create.create::<User>()?.create::<Project>()?.create::<AuditEntry>()?;
            Ok(())
        })
        .connect()
}
