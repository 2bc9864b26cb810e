use crate::database::retry_on_unique_violation;
use crate::entities::{event_entity as events, user_entity as users, vote_entity as votes};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::event_service::find_by_ref;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct VoteService {
    pool: DatabaseConnection,
}

impl VoteService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Records `outcome` as the user's prediction for the event, replacing any
    /// earlier one. Nothing is written unless the outcome is valid and both
    /// the user and the event exist.
    pub async fn upsert_vote(
        &self,
        user_id: &str,
        event: &EventRef,
        outcome: i32,
        payload: Option<String>,
    ) -> AppResult<VoteResponse> {
        let outcome = i32::from(OutcomeCode::try_from(outcome)?);

        let event = find_by_ref(&self.pool, event)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event not found for {event}")))?;

        if users::Entity::find_by_id(user_id.to_string())
            .one(&self.pool)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let vote = retry_on_unique_violation(
            &format!("vote of {user_id} on event {}", event.id),
            || self.try_upsert_vote(user_id, &event, outcome, payload.clone()),
        )
        .await?;

        log::info!(
            "Vote recorded: user {} event {} outcome {}",
            user_id,
            event.id,
            outcome
        );
        Ok(VoteResponse::new(vote, Some(&event)))
    }

    async fn try_upsert_vote(
        &self,
        user_id: &str,
        event: &events::Model,
        outcome: i32,
        payload: Option<String>,
    ) -> Result<votes::Model, DbErr> {
        let txn = self.pool.begin().await?;
        let existing = votes::Entity::find_by_id((user_id.to_string(), event.id))
            .one(&txn)
            .await?;
        let vote = write_vote(&txn, existing, user_id, event.id, outcome, payload).await?;
        txn.commit().await?;
        Ok(vote)
    }

    /// Applies the vote carried by a user create/update request, if any.
    pub async fn apply_intent(
        &self,
        user_id: &str,
        intent: Option<VoteIntent>,
    ) -> AppResult<Option<VoteResponse>> {
        match intent {
            Some(intent) => self
                .upsert_vote(
                    user_id,
                    &intent.event,
                    i32::from(intent.outcome),
                    intent.payload,
                )
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    pub async fn list_votes_for_user(&self, user_id: &str) -> AppResult<Vec<VoteResponse>> {
        let list = votes::Entity::find()
            .find_also_related(events::Entity)
            .filter(votes::Column::UserId.eq(user_id))
            .order_by_asc(votes::Column::EventId)
            .all(&self.pool)
            .await?;
        Ok(list
            .into_iter()
            .map(|(vote, event)| VoteResponse::new(vote, event.as_ref()))
            .collect())
    }
}

/// Overwrites `existing`, or inserts the vote when the lookup found none. An
/// insert racing another writer surfaces as a unique violation on the key.
pub(crate) async fn write_vote<C: ConnectionTrait>(
    conn: &C,
    existing: Option<votes::Model>,
    user_id: &str,
    event_id: i32,
    outcome: i32,
    payload: Option<String>,
) -> Result<votes::Model, DbErr> {
    if let Some(vote) = existing {
        let mut model = vote.into_active_model();
        model.outcome = Set(Some(outcome));
        model.payload = Set(payload);
        return model.update(conn).await;
    }

    let vote = votes::Model {
        user_id: user_id.to_string(),
        event_id,
        outcome: Some(outcome),
        payload,
        created_at: Utc::now(),
    };
    votes::Entity::insert(votes::ActiveModel {
        user_id: Set(vote.user_id.clone()),
        event_id: Set(vote.event_id),
        outcome: Set(vote.outcome),
        payload: Set(vote.payload.clone()),
        created_at: Set(vote.created_at),
    })
    .exec_without_returning(conn)
    .await?;
    Ok(vote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{count_votes, seed_event, seed_user, setup_db};

    #[tokio::test]
    async fn test_second_vote_replaces_first() {
        let db = setup_db().await;
        let event = seed_event(&db, "Final", Some("cup")).await;
        let ann = seed_user(&db, "ann@example.com").await;
        let service = VoteService::new(db.clone());

        let first = service
            .upsert_vote(&ann.id, &EventRef::Id(event.id), 1, None)
            .await
            .unwrap();
        assert_eq!(first.outcome, Some(1));

        let second = service
            .upsert_vote(
                &ann.id,
                &EventRef::SiteKey("cup".to_string()),
                3,
                Some(r#"{"score":"1:1"}"#.to_string()),
            )
            .await
            .unwrap();
        assert_eq!(second.outcome, Some(3));
        assert_eq!(second.site_key.as_deref(), Some("cup"));

        assert_eq!(count_votes(&db).await, 1);
        let stored = service.list_votes_for_user(&ann.id).await.unwrap();
        assert_eq!(stored[0].outcome, Some(3));
        assert_eq!(stored[0].payload.as_deref(), Some(r#"{"score":"1:1"}"#));
    }

    #[tokio::test]
    async fn test_invalid_outcome_writes_nothing() {
        let db = setup_db().await;
        let event = seed_event(&db, "Final", Some("cup")).await;
        let ann = seed_user(&db, "ann@example.com").await;
        let service = VoteService::new(db.clone());

        for bad in [4, 0, -1] {
            assert!(matches!(
                service
                    .upsert_vote(&ann.id, &EventRef::Id(event.id), bad, None)
                    .await,
                Err(AppError::ValidationError(_))
            ));
        }
        assert_eq!(count_votes(&db).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_event_or_user_is_not_found() {
        let db = setup_db().await;
        let event = seed_event(&db, "Final", Some("cup")).await;
        let ann = seed_user(&db, "ann@example.com").await;
        let service = VoteService::new(db.clone());

        assert!(matches!(
            service
                .upsert_vote(&ann.id, &EventRef::SiteKey("unknown".to_string()), 1, None)
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .upsert_vote("no-such-user", &EventRef::Id(event.id), 1, None)
                .await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(count_votes(&db).await, 0);
    }

    #[tokio::test]
    async fn test_joined_votes_on_shared_pool_leave_one_row() {
        let db = setup_db().await;
        let event = seed_event(&db, "Final", Some("cup")).await;
        let ann = seed_user(&db, "ann@example.com").await;
        let service = VoteService::new(db.clone());
        let target = EventRef::Id(event.id);

        let (a, b) = tokio::join!(
            service.upsert_vote(&ann.id, &target, 1, None),
            service.upsert_vote(&ann.id, &target, 2, None),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(count_votes(&db).await, 1);
        let stored = service.list_votes_for_user(&ann.id).await.unwrap();
        assert!(matches!(stored[0].outcome, Some(1) | Some(2)));
    }

    #[tokio::test]
    async fn test_stale_lookup_retries_through_update() {
        let db = setup_db().await;
        let event = seed_event(&db, "Final", Some("cup")).await;
        let ann = seed_user(&db, "ann@example.com").await;
        let service = VoteService::new(db.clone());

        // read before the other writer commits
        let stale = votes::Entity::find_by_id((ann.id.clone(), event.id))
            .one(&db)
            .await
            .unwrap();
        assert!(stale.is_none());
        service
            .upsert_vote(&ann.id, &EventRef::Id(event.id), 1, None)
            .await
            .unwrap();

        let mut stale = Some(stale);
        let mut calls = 0;
        let (db, service, event, user_id) = (&db, &service, &event, ann.id.as_str());
        let vote = retry_on_unique_violation("vote", || {
            calls += 1;
            let snapshot = stale.take();
            async move {
                match snapshot {
                    Some(existing) => write_vote(db, existing, user_id, event.id, 2, None).await,
                    None => service.try_upsert_vote(user_id, event, 2, None).await,
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(vote.outcome, Some(2));
        assert_eq!(count_votes(db).await, 1);
    }

    #[tokio::test]
    async fn test_site_key_reference_is_normalized() {
        let db = setup_db().await;
        let event = seed_event(&db, "Final", Some("cup")).await;
        let ann = seed_user(&db, "ann@example.com").await;
        let service = VoteService::new(db.clone());

        let vote = service
            .upsert_vote(&ann.id, &EventRef::SiteKey("/cup/".to_string()), 1, None)
            .await
            .unwrap();
        assert_eq!(vote.event_id, event.id);
        assert_eq!(vote.site_key.as_deref(), Some("cup"));
    }

    #[tokio::test]
    async fn test_apply_intent() {
        let db = setup_db().await;
        seed_event(&db, "Final", Some("cup")).await;
        let ann = seed_user(&db, "ann@example.com").await;
        let service = VoteService::new(db.clone());

        assert!(service.apply_intent(&ann.id, None).await.unwrap().is_none());

        let intent = VoteIntent::from_request(Some(2), None, Some("/cup/")).unwrap();
        let vote = service.apply_intent(&ann.id, intent).await.unwrap().unwrap();
        assert_eq!(vote.outcome, Some(2));
        assert_eq!(count_votes(&db).await, 1);
    }
}
