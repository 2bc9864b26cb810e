//! In-memory SQLite fixtures shared by the service tests.

use crate::entities::{event_entity as events, user_entity as users, vote_entity as votes};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, Schema, Set,
};
use uuid::Uuid;

/// Fresh database with the full schema. A single connection keeps every
/// query on the same in-memory database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();

    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    for stmt in [
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(events::Entity),
        schema.create_table_from_entity(votes::Entity),
    ] {
        db.execute(builder.build(&stmt)).await.unwrap();
    }
    db
}

pub async fn seed_event(
    db: &DatabaseConnection,
    name: &str,
    site_key: Option<&str>,
) -> events::Model {
    events::ActiveModel {
        name: Set(name.to_string()),
        event_type: Set("football".to_string()),
        end_at: Set(Utc::now() + Duration::days(7)),
        member_a: Set("Reds".to_string()),
        member_b: Set("Blues".to_string()),
        site_key: Set(site_key.map(str::to_string)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_user(db: &DatabaseConnection, email: &str) -> users::Model {
    let user = users::Model {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        name: "Ann".to_string(),
        email_verified: true,
        created_at: Utc::now(),
    };
    users::Entity::insert(users::ActiveModel {
        id: Set(user.id.clone()),
        email: Set(user.email.clone()),
        name: Set(user.name.clone()),
        email_verified: Set(user.email_verified),
        created_at: Set(user.created_at),
    })
    .exec_without_returning(db)
    .await
    .unwrap();
    user
}

/// Casts a vote for a freshly seeded user.
pub async fn seed_vote(
    db: &DatabaseConnection,
    event: &events::Model,
    outcome: Option<i32>,
) -> votes::Model {
    let user = seed_user(db, &format!("{}@example.com", Uuid::new_v4())).await;
    seed_vote_for(db, &user, event, outcome).await
}

pub async fn seed_vote_for(
    db: &DatabaseConnection,
    user: &users::Model,
    event: &events::Model,
    outcome: Option<i32>,
) -> votes::Model {
    let vote = votes::Model {
        user_id: user.id.clone(),
        event_id: event.id,
        outcome,
        payload: None,
        created_at: Utc::now(),
    };
    votes::Entity::insert(votes::ActiveModel {
        user_id: Set(vote.user_id.clone()),
        event_id: Set(vote.event_id),
        outcome: Set(vote.outcome),
        payload: Set(None),
        created_at: Set(vote.created_at),
    })
    .exec_without_returning(db)
    .await
    .unwrap();
    vote
}

pub async fn count_votes(db: &DatabaseConnection) -> u64 {
    votes::Entity::find().count(db).await.unwrap()
}

pub async fn count_users(db: &DatabaseConnection) -> u64 {
    users::Entity::find().count(db).await.unwrap()
}
