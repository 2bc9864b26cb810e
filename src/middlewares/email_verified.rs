use crate::error::{AppError, AppResult};
use actix_web::HttpRequest;

pub const EMAIL_VERIFIED_HEADER: &str = "X-Email-Verified";

/// Self-service flows run only after the upstream verification step has
/// marked the request with `X-Email-Verified: true`.
pub fn ensure_email_verified(req: &HttpRequest) -> AppResult<()> {
    let verified = req
        .headers()
        .get(EMAIL_VERIFIED_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));

    if verified {
        Ok(())
    } else {
        Err(AppError::Forbidden("Email not verified".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_header_must_be_true() {
        let req = TestRequest::default()
            .insert_header((EMAIL_VERIFIED_HEADER, "true"))
            .to_http_request();
        assert!(ensure_email_verified(&req).is_ok());

        let req = TestRequest::default()
            .insert_header((EMAIL_VERIFIED_HEADER, "false"))
            .to_http_request();
        assert!(matches!(
            ensure_email_verified(&req),
            Err(AppError::Forbidden(_))
        ));

        let req = TestRequest::default().to_http_request();
        assert!(ensure_email_verified(&req).is_err());
    }
}
