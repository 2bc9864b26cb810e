use crate::entities::{event_entity as events, vote_entity as votes};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{
    normalize_optional_site_key, normalize_site_key, require_non_empty, validate_image_url,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct EventService {
    pool: DatabaseConnection,
}

impl EventService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn find_event_by_id(&self, id: i32) -> AppResult<Option<events::Model>> {
        Ok(events::Entity::find_by_id(id).one(&self.pool).await?)
    }

    /// `key` must already be normalized.
    pub async fn find_event_by_site_key(&self, key: &str) -> AppResult<Option<events::Model>> {
        Ok(find_by_site_key(&self.pool, key).await?)
    }

    pub async fn get_event(&self, id: i32) -> AppResult<EventResponse> {
        self.find_event_by_id(id)
            .await?
            .map(EventResponse::from)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    /// Events of one site, for clients. The site key is mandatory here.
    pub async fn list_site_events(&self, site_key: Option<&str>) -> AppResult<Vec<EventResponse>> {
        let site_key = normalize_optional_site_key(site_key)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::ValidationError("siteKey query parameter is required".to_string())
            })?;

        let list = events::Entity::find()
            .filter(events::Column::SiteKey.eq(site_key.as_str()))
            .order_by_asc(events::Column::Id)
            .all(&self.pool)
            .await?;

        if list.is_empty() {
            return Err(AppError::NotFound(format!(
                "No events found for site key '{site_key}'"
            )));
        }
        Ok(list.into_iter().map(EventResponse::from).collect())
    }

    /// Admin listing filtered by site key and a name substring.
    pub async fn list_events(&self, query: &EventQuery) -> AppResult<Vec<EventResponse>> {
        let mut select = events::Entity::find();

        if let Some(key) = clean_site_key(query.site_key.as_deref()) {
            select = select.filter(events::Column::SiteKey.eq(key));
        }
        if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
            select = select.filter(events::Column::Name.contains(name));
        }

        let list = select
            .order_by_asc(events::Column::Id)
            .all(&self.pool)
            .await?;

        if list.is_empty() {
            return Err(AppError::NotFound("No events found".to_string()));
        }
        Ok(list.into_iter().map(EventResponse::from).collect())
    }

    pub async fn create_event(&self, request: CreateEventRequest) -> AppResult<EventResponse> {
        let name = require_non_empty("name", &request.name)?;
        let event_type = require_non_empty("type", &request.event_type)?;
        let member_a = require_non_empty("memberA", &request.member_a)?;
        let member_b = require_non_empty("memberB", &request.member_b)?;

        let model = events::ActiveModel {
            name: Set(name),
            event_type: Set(event_type),
            end_at: Set(request.end_at),
            member_a: Set(member_a),
            member_b: Set(member_b),
            image_member_a: Set(check_image("imageMemberA", request.image_member_a)?),
            image_member_b: Set(check_image("imageMemberB", request.image_member_b)?),
            image_bg_desk: Set(check_image("imageBgDesk", request.image_bg_desk)?),
            image_bg_mob: Set(check_image("imageBgMob", request.image_bg_mob)?),
            result_text: Set(request.result_text),
            result_code: Set(check_result_code(request.result_code)?),
            grand_prize: Set(check_optional_text("grandPrize", request.grand_prize)?),
            everyone_for_prize: Set(check_optional_text(
                "everyoneForPrize",
                request.everyone_for_prize,
            )?),
            site_key: Set(clean_site_key(request.site_key.as_deref())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Event {} created (site key {:?})",
            model.id,
            model.site_key
        );
        Ok(model.into())
    }

    pub async fn update_event(
        &self,
        id: i32,
        request: UpdateEventRequest,
    ) -> AppResult<EventResponse> {
        let existing = events::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let mut model = existing.into_active_model();
        let mut changed = false;

        if let Some(name) = &request.name {
            model.name = Set(require_non_empty("name", name)?);
            changed = true;
        }
        if let Some(event_type) = &request.event_type {
            model.event_type = Set(require_non_empty("type", event_type)?);
            changed = true;
        }
        if let Some(end_at) = request.end_at {
            model.end_at = Set(end_at);
            changed = true;
        }
        if let Some(member_a) = &request.member_a {
            model.member_a = Set(require_non_empty("memberA", member_a)?);
            changed = true;
        }
        if let Some(member_b) = &request.member_b {
            model.member_b = Set(require_non_empty("memberB", member_b)?);
            changed = true;
        }
        if let Some(value) = request.image_member_a {
            model.image_member_a = Set(check_image("imageMemberA", value)?);
            changed = true;
        }
        if let Some(value) = request.image_member_b {
            model.image_member_b = Set(check_image("imageMemberB", value)?);
            changed = true;
        }
        if let Some(value) = request.image_bg_desk {
            model.image_bg_desk = Set(check_image("imageBgDesk", value)?);
            changed = true;
        }
        if let Some(value) = request.image_bg_mob {
            model.image_bg_mob = Set(check_image("imageBgMob", value)?);
            changed = true;
        }
        if let Some(value) = request.result_text {
            model.result_text = Set(value);
            changed = true;
        }
        if let Some(value) = request.result_code {
            model.result_code = Set(check_result_code(value)?);
            changed = true;
        }
        if let Some(value) = request.grand_prize {
            model.grand_prize = Set(check_optional_text("grandPrize", value)?);
            changed = true;
        }
        if let Some(value) = request.everyone_for_prize {
            model.everyone_for_prize = Set(check_optional_text("everyoneForPrize", value)?);
            changed = true;
        }
        if let Some(value) = request.site_key {
            model.site_key = Set(clean_site_key(value.as_deref()));
            changed = true;
        }

        if !changed {
            return Err(AppError::ValidationError(
                "No fields provided for update".to_string(),
            ));
        }

        let updated = model.update(&self.pool).await?;
        log::info!("Event {id} updated");
        Ok(updated.into())
    }

    /// Removes the event together with every vote cast on it.
    pub async fn delete_event(&self, id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        if events::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        let removed_votes = votes::Entity::delete_many()
            .filter(votes::Column::EventId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        events::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        log::info!("Event {id} deleted with {removed_votes} votes");
        Ok(())
    }
}

/// Latest event (highest id) carrying the key.
pub(crate) async fn find_by_site_key<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> Result<Option<events::Model>, DbErr> {
    events::Entity::find()
        .filter(events::Column::SiteKey.eq(key))
        .order_by_desc(events::Column::Id)
        .one(conn)
        .await
}

/// Resolves an id or a site key in any spelling (`/cup/` finds `cup`).
pub(crate) async fn find_by_ref<C: ConnectionTrait>(
    conn: &C,
    event: &EventRef,
) -> Result<Option<events::Model>, DbErr> {
    match event {
        EventRef::Id(id) => events::Entity::find_by_id(*id).one(conn).await,
        EventRef::SiteKey(key) => find_by_site_key(conn, &normalize_site_key(key)).await,
    }
}

/// Normalized site key, with an empty result stored as no key at all.
fn clean_site_key(raw: Option<&str>) -> Option<String> {
    normalize_optional_site_key(raw).filter(|key| !key.is_empty())
}

fn check_image(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    if let Some(url) = &value {
        validate_image_url(field, url)?;
    }
    Ok(value)
}

fn check_optional_text(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    value.map(|v| require_non_empty(field, &v)).transpose()
}

fn check_result_code(value: Option<i32>) -> AppResult<Option<i32>> {
    value
        .map(|code| OutcomeCode::try_from(code).map(i32::from))
        .transpose()
}
