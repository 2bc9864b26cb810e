use crate::models::*;
use crate::services::EventService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/events",
    tag = "event",
    params(
        ("siteKey" = String, Query, description = "Site key, slashes are ignored")
    ),
    responses(
        (status = 200, description = "Events of the site", body = [EventResponse]),
        (status = 400, description = "siteKey missing", body = ApiError),
        (status = 404, description = "No events for the site", body = ApiError)
    )
)]
pub async fn list_events(
    event_service: web::Data<EventService>,
    query: web::Query<EventQuery>,
) -> Result<HttpResponse> {
    match event_service
        .list_site_events(query.site_key.as_deref())
        .await
    {
        Ok(events) => Ok(HttpResponse::Ok().json(ApiResponse::success(events))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "event",
    params(
        ("id" = i32, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found", body = ApiError)
    )
)]
pub async fn get_event(
    event_service: web::Data<EventService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match event_service.get_event(path.into_inner()).await {
        Ok(event) => Ok(HttpResponse::Ok().json(ApiResponse::success(event))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn event_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("/{id}", web::get().to(get_event)),
    );
}
