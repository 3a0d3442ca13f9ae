//! Test helpers for unit tests.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set, Statement};

use crate::models::{program, user};

/// Application tables present in a database, sorted, migration bookkeeping excluded
pub async fn table_names(db: &DatabaseConnection) -> Vec<String> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' AND name NOT LIKE 'seaql_%' ORDER BY name"
                .to_string(),
        ))
        .await
        .expect("Failed to list tables");

    rows.iter()
        .map(|row| row.try_get::<String>("", "name").expect("name column"))
        .collect()
}

/// Insert a user directly, bypassing the HTTP layer
pub async fn insert_user(db: &DatabaseConnection, username: &str) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        hashed_password: Set("not-a-real-hash".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert test user")
}

/// Insert a program owned by `owner_id`
pub async fn insert_program(db: &DatabaseConnection, name: &str, owner_id: i64) -> program::Model {
    let now = Utc::now();
    program::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        reward_min: Set(100),
        reward_max: Set(1000),
        is_active: Set(true),
        owner_id: Set(owner_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert test program")
}
