use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::middlewares::admin::ADMIN_SECRET_HEADER;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
            components.add_security_scheme(
                "admin_secret",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ADMIN_SECRET_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::event::list_events,
        handlers::event::get_event,
        handlers::user::create_user,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::delete_user,
        handlers::statistics::get_statistics,
        handlers::admin_event::list_events,
        handlers::admin_event::get_event,
        handlers::admin_event::create_event,
        handlers::admin_event::update_event,
        handlers::admin_event::delete_event,
        handlers::admin_user::list_users,
        handlers::admin_user::get_user,
        handlers::admin_user::upsert_user,
        handlers::admin_user::update_user,
        handlers::admin_user::delete_user,
    ),
    components(
        schemas(
            EventResponse,
            CreateEventRequest,
            UpdateEventRequest,
            UpsertUserRequest,
            UpdateUserRequest,
            UpsertUserResponse,
            UserResponse,
            UserSummary,
            UserWithVotesResponse,
            VoteResponse,
            OutcomeDistribution,
            OutcomePercentages,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "event", description = "Public event API"),
        (name = "user", description = "Self-service user API"),
        (name = "statistics", description = "Vote statistics API"),
        (name = "admin", description = "Administration API, requires X-Admin-Secret"),
    ),
    info(
        title = "Event Vote API",
        version = "1.0.0",
        description = "Event voting REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_admin_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/admin/users/{id}"));
        assert!(doc.paths.paths.contains_key("/statistics"));
        let schemes = doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("admin_secret"));
        assert!(schemes.contains_key("bearer_auth"));
    }
}
