use crate::entities::{event_entity as events, vote_entity as votes};
use crate::error::{AppError, AppResult};
use crate::utils::normalize_optional_site_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Predicted or declared result of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCode {
    MemberA = 1,
    MemberB = 2,
    Draw = 3,
}

impl TryFrom<i32> for OutcomeCode {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OutcomeCode::MemberA),
            2 => Ok(OutcomeCode::MemberB),
            3 => Ok(OutcomeCode::Draw),
            other => Err(AppError::ValidationError(format!(
                "outcome must be 1, 2 or 3, got {other}"
            ))),
        }
    }
}

impl From<OutcomeCode> for i32 {
    fn from(code: OutcomeCode) -> Self {
        code as i32
    }
}

/// How a vote names its event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRef {
    Id(i32),
    /// Any spelling; normalized on lookup.
    SiteKey(String),
}

impl std::fmt::Display for EventRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventRef::Id(id) => write!(f, "id {id}"),
            EventRef::SiteKey(key) => write!(f, "site key '{key}'"),
        }
    }
}

/// A vote carried inside a user create/update request, checked in full so a
/// bad vote is rejected before the user is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteIntent {
    pub event: EventRef,
    pub outcome: OutcomeCode,
    pub payload: Option<String>,
}

impl VoteIntent {
    /// No outcome and no site key means the request casts no vote. Anything
    /// else is a vote and needs both.
    pub fn from_request(
        outcome: Option<i32>,
        payload: Option<String>,
        site_key: Option<&str>,
    ) -> AppResult<Option<Self>> {
        let site_key = normalize_optional_site_key(site_key).filter(|key| !key.is_empty());
        match (outcome, site_key) {
            (None, None) => Ok(None),
            (Some(outcome), Some(key)) => Ok(Some(Self {
                event: EventRef::SiteKey(key),
                outcome: OutcomeCode::try_from(outcome)?,
                payload,
            })),
            (Some(_), None) => Err(AppError::ValidationError(
                "siteKey is required when casting a vote".to_string(),
            )),
            (None, Some(_)) => Err(AppError::ValidationError(
                "outcome is required when casting a vote".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub user_id: String,
    pub event_id: i32,
    #[schema(example = 1)]
    pub outcome: Option<i32>,
    pub payload: Option<String>,
    pub site_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VoteResponse {
    pub fn new(vote: votes::Model, event: Option<&events::Model>) -> Self {
        Self {
            user_id: vote.user_id,
            event_id: vote.event_id,
            outcome: vote.outcome,
            payload: vote.payload,
            site_key: event.and_then(|e| e.site_key.clone()),
            created_at: vote.created_at,
        }
    }
}
