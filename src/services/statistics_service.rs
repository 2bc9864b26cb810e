use crate::entities::{event_entity as events, vote_entity as votes};
use crate::error::AppResult;
use crate::models::{OutcomeDistribution, OutcomePercentages};
use crate::utils::normalize_optional_site_key;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait,
};

#[derive(Debug, FromQueryResult)]
struct OutcomeCountRow {
    outcome: i32,
    count: i64,
}

#[derive(Clone)]
pub struct StatisticsService {
    pool: DatabaseConnection,
}

impl StatisticsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Vote share per outcome, across all events or only those of one site.
    pub async fn compute_outcome_distribution(
        &self,
        site_key: Option<&str>,
    ) -> AppResult<OutcomeDistribution> {
        let mut select = votes::Entity::find()
            .select_only()
            .column(votes::Column::Outcome)
            .column_as(Expr::val(1).count(), "count")
            .filter(votes::Column::Outcome.is_not_null())
            .group_by(votes::Column::Outcome);

        if let Some(key) = normalize_optional_site_key(site_key) {
            select = select
                .join(JoinType::InnerJoin, votes::Relation::Event.def())
                .filter(events::Column::SiteKey.eq(key));
        }

        let rows = select
            .into_model::<OutcomeCountRow>()
            .all(&self.pool)
            .await?;

        Ok(distribution_from_counts(
            rows.into_iter().map(|r| (r.outcome, r.count)),
        ))
    }
}

/// Builds the distribution from `(outcome, count)` pairs. Codes outside 1..=3
/// count toward the total only. Each share is rounded half-up to one decimal
/// on its own, so the three need not add up to exactly 100.
pub fn distribution_from_counts(
    counts: impl IntoIterator<Item = (i32, i64)>,
) -> OutcomeDistribution {
    let counts: Vec<(i32, i64)> = counts.into_iter().collect();
    let total_votes: i64 = counts.iter().map(|(_, count)| count).sum();
    if total_votes == 0 {
        return OutcomeDistribution::default();
    }

    let mut percentages = OutcomePercentages::default();
    for (outcome, count) in counts {
        let share = percent_to_tenth(count, total_votes);
        match outcome {
            1 => percentages.option1 = share,
            2 => percentages.option2 = share,
            3 => percentages.option3 = share,
            _ => {}
        }
    }

    OutcomeDistribution {
        total_votes,
        percentages,
    }
}

/// `count / total * 100` rounded half-up to one decimal. Worked in integer
/// tenths so exact halves such as 23/80 = 28.75 are not lost to float error.
fn percent_to_tenth(count: i64, total: i64) -> f64 {
    let tenths = (2 * 1000 * count + total) / (2 * total);
    tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_event, seed_vote, setup_db};

    #[test]
    fn test_empty_distribution_is_all_zero() {
        let dist = distribution_from_counts(Vec::new());
        assert_eq!(dist.total_votes, 0);
        assert_eq!(dist.percentages, OutcomePercentages::default());
    }

    #[test]
    fn test_shares_round_independently() {
        let dist = distribution_from_counts([(1, 2), (2, 1)]);
        assert_eq!(dist.total_votes, 3);
        assert_eq!(dist.percentages.option1, 66.7);
        assert_eq!(dist.percentages.option2, 33.3);
        assert_eq!(dist.percentages.option3, 0.0);

        // 6.25 and 93.75 both round up
        let dist = distribution_from_counts([(1, 1), (2, 15)]);
        assert_eq!(dist.percentages.option1, 6.3);
        assert_eq!(dist.percentages.option2, 93.8);

        // exactly 28.75 and 71.25
        let dist = distribution_from_counts([(1, 23), (2, 57)]);
        assert_eq!(dist.percentages.option1, 28.8);
        assert_eq!(dist.percentages.option2, 71.3);
    }

    #[test]
    fn test_exact_halves_round_up() {
        for (count, total, expected) in [(41, 80, 51.3), (51, 80, 63.8), (46, 160, 28.8)] {
            assert_eq!(percent_to_tenth(count, total), expected, "{count}/{total}");
        }
        assert_eq!(percent_to_tenth(1, 3), 33.3);
        assert_eq!(percent_to_tenth(2, 3), 66.7);
        assert_eq!(percent_to_tenth(5, 5), 100.0);
    }

    #[test]
    fn test_unknown_codes_only_count_toward_total() {
        let dist = distribution_from_counts([(1, 1), (9, 1)]);
        assert_eq!(dist.total_votes, 2);
        assert_eq!(dist.percentages.option1, 50.0);
        assert_eq!(dist.percentages.option2, 0.0);
    }

    #[tokio::test]
    async fn test_distribution_from_store() {
        let db = setup_db().await;
        let service = StatisticsService::new(db.clone());

        let empty = service.compute_outcome_distribution(None).await.unwrap();
        assert_eq!(empty, OutcomeDistribution::default());

        let cup = seed_event(&db, "Cup", Some("cup")).await;
        let league = seed_event(&db, "League", Some("league")).await;
        seed_vote(&db, &cup, Some(1)).await;
        seed_vote(&db, &cup, Some(1)).await;
        seed_vote(&db, &cup, Some(2)).await;
        seed_vote(&db, &cup, None).await;
        seed_vote(&db, &league, Some(3)).await;

        let on_cup = service
            .compute_outcome_distribution(Some("/cup/"))
            .await
            .unwrap();
        assert_eq!(on_cup.total_votes, 3);
        assert_eq!(on_cup.percentages.option1, 66.7);
        assert_eq!(on_cup.percentages.option2, 33.3);
        assert_eq!(on_cup.percentages.option3, 0.0);

        let overall = service.compute_outcome_distribution(None).await.unwrap();
        assert_eq!(overall.total_votes, 4);
        assert_eq!(overall.percentages.option1, 50.0);
        assert_eq!(overall.percentages.option3, 25.0);

        let nowhere = service
            .compute_outcome_distribution(Some("nowhere"))
            .await
            .unwrap();
        assert_eq!(nowhere.total_votes, 0);
    }
}
