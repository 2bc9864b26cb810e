use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub site_key: Option<String>,
}

/// Share of votes per outcome, in percent with one decimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OutcomePercentages {
    pub option1: f64,
    pub option2: f64,
    pub option3: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeDistribution {
    pub total_votes: i64,
    pub percentages: OutcomePercentages,
}
