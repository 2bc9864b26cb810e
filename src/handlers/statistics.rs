use crate::error::AppResult;
use crate::middlewares::ensure_email_verified;
use crate::models::*;
use crate::services::StatisticsService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/statistics",
    tag = "statistics",
    params(
        ("siteKey" = Option<String>, Query, description = "Restrict to events of this site"),
        ("X-Email-Verified" = String, Header, description = "Must be `true`")
    ),
    responses(
        (status = 200, description = "Vote distribution", body = OutcomeDistribution),
        (status = 403, description = "Email not verified", body = ApiError)
    )
)]
pub async fn get_statistics(
    statistics_service: web::Data<StatisticsService>,
    req: HttpRequest,
    query: web::Query<StatisticsQuery>,
) -> Result<HttpResponse> {
    match statistics(&statistics_service, &req, &query).await {
        Ok(distribution) => Ok(HttpResponse::Ok().json(ApiResponse::success(distribution))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn statistics(
    statistics_service: &StatisticsService,
    req: &HttpRequest,
    query: &StatisticsQuery,
) -> AppResult<OutcomeDistribution> {
    ensure_email_verified(req)?;
    statistics_service
        .compute_outcome_distribution(query.site_key.as_deref())
        .await
}

pub fn statistics_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/statistics", web::get().to(get_statistics));
}
