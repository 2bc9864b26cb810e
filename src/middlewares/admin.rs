use crate::error::AppError;
use actix_web::http::Method;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

pub const ADMIN_SECRET_HEADER: &str = "X-Admin-Secret";

/// Rejects requests whose `X-Admin-Secret` header does not match the
/// configured secret.
pub struct AdminGuard {
    secret: Rc<str>,
}

impl AdminGuard {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: Rc::from(secret),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminGuardService {
            service,
            secret: self.secret.clone(),
        }))
    }
}

pub struct AdminGuardService<S> {
    service: S,
    secret: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for AdminGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let provided = req
            .headers()
            .get(ADMIN_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());

        if secret_matches(&self.secret, provided) {
            return Box::pin(self.service.call(req));
        }

        log::warn!(
            "Admin request rejected: {} {}",
            req.method(),
            req.path()
        );
        let error = AppError::AuthError("Invalid admin secret".to_string());
        Box::pin(async move { Err(error.into()) })
    }
}

// compares every byte so the timing does not leak the matching prefix
fn secret_matches(expected: &str, provided: Option<&str>) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};

    #[actix_web::test]
    async fn test_secret_matches() {
        assert!(secret_matches("s3cret", Some("s3cret")));
        assert!(!secret_matches("s3cret", Some("s3cret!")));
        assert!(!secret_matches("s3cret", Some("S3cret")));
        assert!(!secret_matches("s3cret", None));
    }

    #[actix_web::test]
    async fn test_guard_requires_header() {
        let app = test::init_service(
            App::new().service(
                web::scope("/admin")
                    .wrap(AdminGuard::new("s3cret"))
                    .route("/ping", web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/admin/ping")
            .insert_header((ADMIN_SECRET_HEADER, "s3cret"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/admin/ping")
            .insert_header((ADMIN_SECRET_HEADER, "wrong"))
            .to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );

        let req = test::TestRequest::get().uri("/admin/ping").to_request();
        assert!(test::try_call_service(&app, req).await.is_err());
    }
}
