use crate::error::{AppError, AppResult};
use crate::handlers::user::{upsert_response, upsert_with_vote};
use crate::models::*;
use crate::services::{UserService, VoteService};
use crate::utils::parse_user_id;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/admin/users",
    operation_id = "admin_list_users",
    tag = "admin",
    params(
        ("siteKey" = Option<String>, Query, description = "Only users who voted on this site"),
        ("name" = Option<String>, Query, description = "Name substring filter"),
        ("email" = Option<String>, Query, description = "Email substring filter")
    ),
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 200, description = "Users with their votes", body = [UserWithVotesResponse]),
        (status = 401, description = "Invalid admin secret", body = ApiError),
        (status = 404, description = "No users match", body = ApiError)
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse> {
    match user_service.search_users(&query).await {
        Ok(users) => Ok(HttpResponse::Ok().json(ApiResponse::success(users))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    operation_id = "admin_get_user",
    tag = "admin",
    params(
        ("id" = String, Path, description = "User id (UUID)")
    ),
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 200, description = "User with votes", body = UserWithVotesResponse),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    )
)]
pub async fn get_user(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let result = async {
        let id = parse_user_id(&path)?;
        user_service.get_user_with_votes(&id).await
    }
    .await;

    match result {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(user))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    request_body = UpsertUserRequest,
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 201, description = "User created", body = UpsertUserResponse),
        (status = 200, description = "Existing user updated", body = UpsertUserResponse),
        (status = 400, description = "Invalid input", body = ApiError),
        (status = 404, description = "Vote targets an unknown event", body = ApiError)
    )
)]
pub async fn upsert_user(
    user_service: web::Data<UserService>,
    vote_service: web::Data<VoteService>,
    request: web::Json<UpsertUserRequest>,
) -> Result<HttpResponse> {
    match upsert_with_vote(&user_service, &vote_service, request.into_inner()).await {
        Ok(response) => Ok(upsert_response(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    tag = "admin",
    request_body = UpdateUserRequest,
    params(
        ("id" = String, Path, description = "User id (UUID)")
    ),
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 200, description = "User updated", body = UpsertUserResponse),
        (status = 400, description = "Invalid input", body = ApiError),
        (status = 404, description = "User or event not found", body = ApiError),
        (status = 409, description = "Email used by another user", body = ApiError)
    )
)]
pub async fn update_user(
    user_service: web::Data<UserService>,
    vote_service: web::Data<VoteService>,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let id = parse_user_id(&path)?;
        let request = request.into_inner();
        let intent = VoteIntent::from_request(
            request.outcome,
            request.payload,
            request.site_key.as_deref(),
        )?;

        let user = user_service
            .update_user(&id, request.email.as_deref(), request.name.as_deref())
            .await?;
        let vote = vote_service.apply_intent(&user.id, intent).await?;

        Ok::<_, AppError>(UpsertUserResponse {
            user: user.into(),
            created: false,
            vote,
            access_token: None,
            expires_in: None,
        })
    }
    .await;

    match result {
        Ok(response) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_with_message(response, "User updated"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    operation_id = "admin_delete_user",
    tag = "admin",
    params(
        ("id" = String, Path, description = "User id (UUID)")
    ),
    security(
        ("admin_secret" = [])
    ),
    responses(
        (status = 200, description = "User and votes deleted"),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    )
)]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let result: AppResult<String> = async {
        let id = parse_user_id(&path)?;
        user_service.delete_user(&id).await?;
        Ok(id)
    }
    .await;

    match result {
        Ok(id) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            serde_json::json!({ "id": id }),
            "User deleted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(upsert_user))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::patch().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
