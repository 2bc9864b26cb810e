use crate::database::{is_unique_violation, retry_on_unique_violation};
use crate::entities::{event_entity as events, user_entity as users, vote_entity as votes};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{normalize_email, normalize_optional_site_key, require_non_empty};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Result of an upsert by email.
#[derive(Debug, Clone)]
pub struct UpsertedUser {
    pub user: users::Model,
    pub created: bool,
}

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Creates the user for `email`, or renames the existing one. Concurrent
    /// calls for the same email end with exactly one row.
    pub async fn upsert_user(&self, email: &str, name: &str) -> AppResult<UpsertedUser> {
        let email = normalize_email(email)?;
        let name = require_non_empty("name", name)?;

        let upserted = retry_on_unique_violation(&format!("user {email}"), || {
            self.try_upsert_user(&email, &name)
        })
        .await?;

        if upserted.created {
            log::info!("User {} registered ({})", upserted.user.id, email);
        } else {
            log::info!("User {} updated ({})", upserted.user.id, email);
        }
        Ok(upserted)
    }

    async fn try_upsert_user(&self, email: &str, name: &str) -> Result<UpsertedUser, DbErr> {
        let txn = self.pool.begin().await?;
        let existing = find_user_by_email(&txn, email).await?;
        let upserted = write_user(&txn, existing, email, name).await?;
        txn.commit().await?;
        Ok(upserted)
    }

    pub async fn get_user(&self, id: &str) -> AppResult<users::Model> {
        users::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        let list = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        if list.is_empty() {
            return Err(AppError::NotFound("No users found".to_string()));
        }
        Ok(list.into_iter().map(UserSummary::from).collect())
    }

    pub async fn get_user_with_votes(&self, id: &str) -> AppResult<UserWithVotesResponse> {
        let user = self.get_user(id).await?;

        let votes = votes::Entity::find()
            .find_also_related(events::Entity)
            .filter(votes::Column::UserId.eq(user.id.as_str()))
            .order_by_asc(votes::Column::EventId)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|(vote, event)| VoteResponse::new(vote, event.as_ref()))
            .collect();

        Ok(UserWithVotesResponse {
            user: user.into(),
            votes,
        })
    }

    /// Admin search. With a site key, only users who voted on that site are
    /// returned, and only those votes are attached.
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<Vec<UserWithVotesResponse>> {
        let site_key = normalize_optional_site_key(query.site_key.as_deref())
            .filter(|key| !key.is_empty());

        let mut select = users::Entity::find();
        if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
            select = select.filter(users::Column::Name.contains(name));
        }
        if let Some(email) = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            select = select.filter(users::Column::Email.contains(email.to_lowercase()));
        }
        let found = select
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        let ids: Vec<String> = found.iter().map(|u| u.id.clone()).collect();
        let mut vote_select = votes::Entity::find()
            .find_also_related(events::Entity)
            .filter(votes::Column::UserId.is_in(ids));
        if let Some(key) = &site_key {
            vote_select = vote_select.filter(events::Column::SiteKey.eq(key.as_str()));
        }

        let mut votes_by_user: HashMap<String, Vec<VoteResponse>> = HashMap::new();
        for (vote, event) in vote_select
            .order_by_asc(votes::Column::EventId)
            .all(&self.pool)
            .await?
        {
            votes_by_user
                .entry(vote.user_id.clone())
                .or_default()
                .push(VoteResponse::new(vote, event.as_ref()));
        }

        let result: Vec<UserWithVotesResponse> = found
            .into_iter()
            .filter_map(|user| {
                let votes = votes_by_user.remove(&user.id);
                if site_key.is_some() && votes.is_none() {
                    return None;
                }
                Some(UserWithVotesResponse {
                    user: user.into(),
                    votes: votes.unwrap_or_default(),
                })
            })
            .collect();

        if result.is_empty() {
            return Err(AppError::NotFound("No users found".to_string()));
        }
        Ok(result)
    }

    /// Changes email and/or name. An email held by another user is a conflict.
    pub async fn update_user(
        &self,
        id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> AppResult<users::Model> {
        let email = email.map(normalize_email).transpose()?;
        let name = name.map(|n| require_non_empty("name", n)).transpose()?;

        let txn = self.pool.begin().await?;
        let user = users::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if email.is_none() && name.is_none() {
            return Ok(user);
        }

        if let Some(email) = &email {
            let taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .filter(users::Column::Id.ne(id))
                .one(&txn)
                .await?;
            if taken.is_some() {
                return Err(AppError::Conflict(format!(
                    "Email {email} is already in use by another user"
                )));
            }
        }

        let mut model = user.into_active_model();
        if let Some(email) = email {
            model.email = Set(email);
        }
        if let Some(name) = name {
            model.name = Set(name);
        }

        let updated = match model.update(&txn).await {
            Ok(updated) => updated,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "Email is already in use by another user".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;

        log::info!("User {id} updated by admin");
        Ok(updated)
    }

    /// Removes the user and every vote they cast, atomically.
    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        if users::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let removed_votes = votes::Entity::delete_many()
            .filter(votes::Column::UserId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        users::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!("User {id} deleted with {removed_votes} votes");
        Ok(())
    }
}

pub(crate) async fn find_user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await
}

/// Renames `existing`, or inserts a new user when the lookup found none.
pub(crate) async fn write_user<C: ConnectionTrait>(
    conn: &C,
    existing: Option<users::Model>,
    email: &str,
    name: &str,
) -> Result<UpsertedUser, DbErr> {
    match existing {
        Some(user) => {
            let mut model = user.into_active_model();
            model.name = Set(name.to_string());
            model.email_verified = Set(true);
            Ok(UpsertedUser {
                user: model.update(conn).await?,
                created: false,
            })
        }
        None => Ok(UpsertedUser {
            user: insert_user(conn, email, name).await?,
            created: true,
        }),
    }
}

/// Inserts a new verified user. A duplicate email surfaces as a unique
/// violation for the caller to retry.
pub(crate) async fn insert_user<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    name: &str,
) -> Result<users::Model, DbErr> {
    let user = users::Model {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        name: name.to_string(),
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
    .exec_without_returning(conn)
    .await?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{count_users, count_votes, seed_event, seed_vote_for, setup_db};

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_row() {
        let db = setup_db().await;
        let service = UserService::new(db.clone());

        let first = service.upsert_user("ann@example.com", "Ann").await.unwrap();
        assert!(first.created);
        assert!(first.user.email_verified);

        let second = service.upsert_user("ann@example.com", "Annie").await.unwrap();
        assert!(!second.created);
        assert_eq!(second.user.id, first.user.id);
        assert_eq!(second.user.name, "Annie");

        assert_eq!(count_users(&db).await, 1);
    }

    #[tokio::test]
    async fn test_upsert_matches_email_case_insensitively() {
        let db = setup_db().await;
        let service = UserService::new(db.clone());

        let first = service.upsert_user("Ann@Example.com", "Ann").await.unwrap();
        assert_eq!(first.user.email, "ann@example.com");

        let second = service.upsert_user("  ANN@example.COM ", "Ann").await.unwrap();
        assert_eq!(second.user.id, first.user.id);
        assert_eq!(count_users(&db).await, 1);
    }

    #[tokio::test]
    async fn test_joined_upserts_on_shared_pool_create_one_user() {
        let db = setup_db().await;
        let service = UserService::new(db.clone());

        let (a, b) = tokio::join!(
            service.upsert_user("ann@example.com", "Ann"),
            service.upsert_user("ann@example.com", "Annie"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.user.id, b.user.id);
        assert!(a.created ^ b.created);
        assert_eq!(count_users(&db).await, 1);
    }

    #[tokio::test]
    async fn test_stale_lookup_retries_through_update() {
        let db = setup_db().await;
        let service = UserService::new(db.clone());

        // read before the other writer commits
        let stale = find_user_by_email(&db, "ann@example.com").await.unwrap();
        assert!(stale.is_none());
        let winner = service.upsert_user("ann@example.com", "Ann").await.unwrap();

        let mut stale = Some(stale);
        let mut calls = 0;
        let (db, service) = (&db, &service);
        let upserted = retry_on_unique_violation("user ann@example.com", || {
            calls += 1;
            let snapshot = stale.take();
            async move {
                match snapshot {
                    Some(existing) => {
                        write_user(db, existing, "ann@example.com", "Annie").await
                    }
                    None => service.try_upsert_user("ann@example.com", "Annie").await,
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls, 2);
        assert!(!upserted.created);
        assert_eq!(upserted.user.id, winner.user.id);
        assert_eq!(upserted.user.name, "Annie");
        assert_eq!(count_users(db).await, 1);
    }

    #[tokio::test]
    async fn test_losing_writer_insert_is_unique_violation() {
        let db = setup_db().await;
        let service = UserService::new(db.clone());
        service.upsert_user("ann@example.com", "Ann").await.unwrap();

        // what a writer that missed the committed row would attempt
        let err = insert_user(&db, "ann@example.com", "Ann").await.unwrap_err();
        assert!(is_unique_violation(&err));

        let retried = service.upsert_user("ann@example.com", "Ann B").await.unwrap();
        assert!(!retried.created);
        assert_eq!(count_users(&db).await, 1);
    }

    #[tokio::test]
    async fn test_upsert_validates_input() {
        let db = setup_db().await;
        let service = UserService::new(db.clone());

        assert!(matches!(
            service.upsert_user("not-an-email", "Ann").await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.upsert_user("ann@example.com", "   ").await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(count_users(&db).await, 0);
    }

    #[tokio::test]
    async fn test_update_user_email_conflict() {
        let db = setup_db().await;
        let service = UserService::new(db);
        let ann = service.upsert_user("ann@example.com", "Ann").await.unwrap().user;
        service.upsert_user("bob@example.com", "Bob").await.unwrap();

        assert!(matches!(
            service
                .update_user(&ann.id, Some("BOB@example.com"), None)
                .await,
            Err(AppError::Conflict(_))
        ));

        let renamed = service
            .update_user(&ann.id, Some("ann@new.example.com"), Some("Ann N"))
            .await
            .unwrap();
        assert_eq!(renamed.email, "ann@new.example.com");
        assert_eq!(renamed.name, "Ann N");

        assert!(matches!(
            service.update_user("missing", None, Some("X")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_votes() {
        let db = setup_db().await;
        let event = seed_event(&db, "Final", Some("cup")).await;
        let service = UserService::new(db.clone());
        let ann = service.upsert_user("ann@example.com", "Ann").await.unwrap().user;
        let bob = service.upsert_user("bob@example.com", "Bob").await.unwrap().user;
        seed_vote_for(&db, &ann, &event, Some(1)).await;
        seed_vote_for(&db, &bob, &event, Some(2)).await;

        service.delete_user(&ann.id).await.unwrap();

        assert_eq!(count_users(&db).await, 1);
        assert_eq!(count_votes(&db).await, 1);
        assert!(matches!(
            service.get_user(&ann.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_user(&ann.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_users_by_site_key() {
        let db = setup_db().await;
        let cup = seed_event(&db, "Cup", Some("cup")).await;
        let league = seed_event(&db, "League", Some("league")).await;
        let service = UserService::new(db.clone());
        let ann = service.upsert_user("ann@example.com", "Ann").await.unwrap().user;
        let bob = service.upsert_user("bob@example.com", "Bob").await.unwrap().user;
        seed_vote_for(&db, &ann, &cup, Some(1)).await;
        seed_vote_for(&db, &ann, &league, Some(3)).await;
        seed_vote_for(&db, &bob, &league, Some(2)).await;

        let on_cup = service
            .search_users(&UserQuery {
                site_key: Some("/cup/".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(on_cup.len(), 1);
        assert_eq!(on_cup[0].user.id, ann.id);
        assert_eq!(on_cup[0].votes.len(), 1);
        assert_eq!(on_cup[0].votes[0].site_key.as_deref(), Some("cup"));

        let everyone = service.search_users(&UserQuery::default()).await.unwrap();
        assert_eq!(everyone.len(), 2);

        let by_email = service
            .search_users(&UserQuery {
                email: Some("BOB".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].user.id, bob.id);

        assert!(matches!(
            service
                .search_users(&UserQuery {
                    name: Some("Carol".to_string()),
                    ..Default::default()
                })
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_user_with_votes() {
        let db = setup_db().await;
        let cup = seed_event(&db, "Cup", Some("cup")).await;
        let service = UserService::new(db.clone());
        let ann = service.upsert_user("ann@example.com", "Ann").await.unwrap().user;
        seed_vote_for(&db, &ann, &cup, Some(3)).await;

        let found = service.get_user_with_votes(&ann.id).await.unwrap();
        assert_eq!(found.user.email, "ann@example.com");
        assert_eq!(found.votes.len(), 1);
        assert_eq!(found.votes[0].outcome, Some(3));
        assert_eq!(found.votes[0].event_id, cup.id);
    }
}
