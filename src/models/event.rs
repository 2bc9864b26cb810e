use crate::entities::event_entity as events;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[schema(example = "Spring Cup Final")]
    pub name: String,
    #[serde(rename = "type")]
    #[schema(example = "football")]
    pub event_type: String,
    pub end_at: DateTime<Utc>,
    pub member_a: String,
    pub member_b: String,
    pub image_member_a: Option<String>,
    pub image_member_b: Option<String>,
    pub image_bg_desk: Option<String>,
    pub image_bg_mob: Option<String>,
    pub result_text: Option<String>,
    pub result_code: Option<i32>,
    pub grand_prize: Option<String>,
    pub everyone_for_prize: Option<String>,
    #[schema(example = "/spring-cup/")]
    pub site_key: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub end_at: Option<DateTime<Utc>>,
    pub member_a: Option<String>,
    pub member_b: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub image_member_a: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub image_member_b: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub image_bg_desk: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub image_bg_mob: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub result_text: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub result_code: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub grand_prize: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub everyone_for_prize: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub site_key: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub site_key: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub end_at: DateTime<Utc>,
    pub member_a: String,
    pub member_b: String,
    pub image_member_a: Option<String>,
    pub image_member_b: Option<String>,
    pub image_bg_desk: Option<String>,
    pub image_bg_mob: Option<String>,
    pub result_text: Option<String>,
    pub result_code: Option<i32>,
    pub grand_prize: Option<String>,
    pub everyone_for_prize: Option<String>,
    pub site_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<events::Model> for EventResponse {
    fn from(event: events::Model) -> Self {
        Self {
            id: event.id,
            name: event.name,
            event_type: event.event_type,
            end_at: event.end_at,
            member_a: event.member_a,
            member_b: event.member_b,
            image_member_a: event.image_member_a,
            image_member_b: event.image_member_b,
            image_bg_desk: event.image_bg_desk,
            image_bg_mob: event.image_bg_mob,
            result_text: event.result_text,
            result_code: event.result_code,
            grand_prize: event.grand_prize,
            everyone_for_prize: event.everyone_for_prize,
            site_key: event.site_key,
            created_at: event.created_at,
        }
    }
}
