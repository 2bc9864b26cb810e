use crate::error::{AppError, AppResult};
use crate::middlewares::{current_user, ensure_email_verified};
use crate::models::*;
use crate::services::{UserService, VoteService};
use crate::utils::JwtService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

/// Upserts the user and applies the optional vote. The vote is validated
/// before anything is written.
pub(crate) async fn upsert_with_vote(
    user_service: &UserService,
    vote_service: &VoteService,
    request: UpsertUserRequest,
) -> AppResult<UpsertUserResponse> {
    let intent = VoteIntent::from_request(
        request.outcome,
        request.payload,
        request.site_key.as_deref(),
    )?;

    let upserted = user_service
        .upsert_user(&request.email, &request.name)
        .await?;
    let vote = vote_service
        .apply_intent(&upserted.user.id, intent)
        .await?;

    Ok(UpsertUserResponse {
        user: upserted.user.into(),
        created: upserted.created,
        vote,
        access_token: None,
        expires_in: None,
    })
}

pub(crate) fn upsert_response(response: UpsertUserResponse) -> HttpResponse {
    if response.created {
        HttpResponse::Created().json(ApiResponse::success_with_message(response, "User created"))
    } else {
        HttpResponse::Ok().json(ApiResponse::success_with_message(response, "User updated"))
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "user",
    request_body = UpsertUserRequest,
    params(
        ("X-Email-Verified" = String, Header, description = "Must be `true`")
    ),
    responses(
        (status = 201, description = "User created", body = UpsertUserResponse),
        (status = 200, description = "Existing user updated", body = UpsertUserResponse),
        (status = 400, description = "Invalid input", body = ApiError),
        (status = 403, description = "Email not verified", body = ApiError),
        (status = 404, description = "Vote targets an unknown event", body = ApiError)
    )
)]
pub async fn create_user(
    user_service: web::Data<UserService>,
    vote_service: web::Data<VoteService>,
    jwt_service: web::Data<JwtService>,
    req: HttpRequest,
    request: web::Json<UpsertUserRequest>,
) -> Result<HttpResponse> {
    let result = async {
        ensure_email_verified(&req)?;
        let mut response =
            upsert_with_vote(&user_service, &vote_service, request.into_inner()).await?;
        let token = jwt_service.generate_access_token(&response.user.id, &response.user.email)?;
        response.access_token = Some(token);
        response.expires_in = Some(jwt_service.expires_in());
        Ok::<_, AppError>(response)
    }
    .await;

    match result {
        Ok(response) => Ok(upsert_response(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All users", body = [UserSummary]),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No users", body = ApiError)
    )
)]
pub async fn list_users(user_service: web::Data<UserService>) -> Result<HttpResponse> {
    match user_service.list_users().await {
        Ok(users) => Ok(HttpResponse::Ok().json(ApiResponse::success(users))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "user",
    params(
        ("id" = String, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    )
)]
pub async fn get_user(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match user_service.get_user(&path.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "user",
    params(
        ("id" = String, Path, description = "User id, must be the caller's own")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User and votes deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the caller's account", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    )
)]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let result = async {
        let caller = current_user(&req)?;
        if caller.id != id {
            return Err(AppError::Forbidden(
                "Users can only delete their own account".to_string(),
            ));
        }
        user_service.delete_user(&id).await
    }
    .await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            serde_json::json!({ "id": id }),
            "User deleted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::post().to(create_user))
            .route("", web::get().to(list_users))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
