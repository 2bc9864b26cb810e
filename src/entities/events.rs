use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A contest between two members.
/// - `result_text` / `result_code` hold the administratively declared outcome,
///   never an aggregate of the votes
/// - `site_key` is stored without leading or trailing slashes
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub event_type: String,
    pub end_at: DateTime<Utc>,
    pub member_a: String,
    pub member_b: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_member_a: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_member_b: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_bg_desk: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_bg_mob: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub result_text: Option<String>,
    pub result_code: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub grand_prize: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub everyone_for_prize: Option<String>,
    pub site_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_events::Entity")]
    Votes,
}

impl Related<super::user_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
