#![allow(dead_code)]

use async_trait::async_trait;
use querypage::{FindManyArgs, RecordStore};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr,
    sea_query::{Alias, ColumnDef, Query, Table},
};
use serde_json::{Value, json};
use std::sync::Mutex;

/// In-memory store that records every query it receives.
pub struct MockStore {
    records: Vec<Value>,
    total: u64,
    fail_with: Option<String>,
    pub find_calls: Mutex<Vec<FindManyArgs>>,
    pub count_calls: Mutex<Vec<Option<Value>>>,
}

impl MockStore {
    pub fn new(records: Vec<Value>, total: u64) -> Self {
        Self {
            records,
            total,
            fail_with: None,
            find_calls: Mutex::new(Vec::new()),
            count_calls: Mutex::new(Vec::new()),
        }
    }

    /// Store holding `total` records, of which `page_len` are returned per call
    pub fn with_total(total: u64, page_len: usize) -> Self {
        let records = (0..page_len).map(|id| json!({ "id": id })).collect();
        Self::new(records, total)
    }

    pub fn failing(message: &str) -> Self {
        let mut store = Self::new(Vec::new(), 0);
        store.fail_with = Some(message.to_string());
        store
    }

    pub fn last_query(&self) -> Option<FindManyArgs> {
        self.find_calls.lock().unwrap().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.find_calls.lock().unwrap().len() + self.count_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MockStore {
    type Record = Value;
    type Error = String;

    async fn find_many(&self, _model: &str, query: &FindManyArgs) -> Result<Vec<Value>, String> {
        self.find_calls.lock().unwrap().push(query.clone());
        match &self.fail_with {
            Some(message) => Err(message.clone()),
            None => Ok(self.records.clone()),
        }
    }

    async fn count(&self, _model: &str, filter: Option<&Value>) -> Result<u64, String> {
        self.count_calls.lock().unwrap().push(filter.cloned());
        match &self.fail_with {
            Some(message) => Err(message.clone()),
            None => Ok(self.total),
        }
    }
}

pub const CITIES: [&str; 3] = ["Paris", "Berlin", "Rome"];

/// SQLite database with a `users` table of 25 rows.
///
/// Row `i` (1-based) has name `user{i:02}`, age `10 + i`, and city `CITIES[i % 3]`.
pub async fn setup_users_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let backend = db.get_database_backend();

    let table = Table::create()
        .table(Alias::new("users"))
        .if_not_exists()
        .col(
            ColumnDef::new(Alias::new("id"))
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Alias::new("name")).string().not_null())
        .col(ColumnDef::new(Alias::new("age")).integer().not_null())
        .col(ColumnDef::new(Alias::new("city")).string().null())
        .to_owned();
    db.execute(backend.build(&table)).await?;

    let mut insert = Query::insert();
    insert
        .into_table(Alias::new("users"))
        .columns([Alias::new("name"), Alias::new("age"), Alias::new("city")]);
    for i in 1..=25_i64 {
        let city = CITIES[usize::try_from(i).unwrap() % CITIES.len()];
        insert.values_panic([format!("user{i:02}").into(), (10 + i).into(), city.into()]);
    }
    db.execute(backend.build(&insert)).await?;

    Ok(db)
}
