use crate::models::*;
use crate::services::EventService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/admin/events",
    operation_id = "admin_list_events",
    tag = "admin",
    params(
        ("siteKey" = Option<String>, Query, description = "Site key filter"),
        ("name" = Option<String>, Query, description = "Name substring filter")
    ),
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 200, description = "Matching events", body = [EventResponse]),
        (status = 401, description = "Invalid admin secret", body = ApiError),
        (status = 404, description = "No events match", body = ApiError)
    )
)]
pub async fn list_events(
    event_service: web::Data<EventService>,
    query: web::Query<EventQuery>,
) -> Result<HttpResponse> {
    match event_service.list_events(&query).await {
        Ok(events) => Ok(HttpResponse::Ok().json(ApiResponse::success(events))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/events/{id}",
    operation_id = "admin_get_event",
    tag = "admin",
    params(
        ("id" = i32, Path, description = "Event id")
    ),
    security(
        ("admin_secret" = [])
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

#[utoipa::path(
    post,
    path = "/admin/events",
    tag = "admin",
    request_body = CreateEventRequest,
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid input", body = ApiError)
    )
)]
pub async fn create_event(
    event_service: web::Data<EventService>,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse> {
    match event_service.create_event(request.into_inner()).await {
        Ok(event) => Ok(HttpResponse::Created()
            .json(ApiResponse::success_with_message(event, "Event created"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/events/{id}",
    tag = "admin",
    request_body = UpdateEventRequest,
    params(
        ("id" = i32, Path, description = "Event id")
    ),
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Invalid input or nothing to update", body = ApiError),
        (status = 404, description = "Event not found", body = ApiError)
    )
)]
pub async fn update_event(
    event_service: web::Data<EventService>,
    path: web::Path<i32>,
    request: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse> {
    match event_service
        .update_event(path.into_inner(), request.into_inner())
        .await
    {
        Ok(event) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_with_message(event, "Event updated"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/events/{id}",
    tag = "admin",
    params(
        ("id" = i32, Path, description = "Event id")
    ),
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 200, description = "Event and its votes deleted"),
        (status = 404, description = "Event not found", body = ApiError)
    )
)]
pub async fn delete_event(
    event_service: web::Data<EventService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match event_service.delete_event(id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            serde_json::json!({ "id": id }),
            "Event deleted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_event_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event))
            .route("/{id}", web::get().to(get_event))
            .route("/{id}", web::patch().to(update_event))
            .route("/{id}", web::delete().to(delete_event)),
    );
}
