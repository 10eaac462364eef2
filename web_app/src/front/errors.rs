use crate::webhook::messenger::errors::AuthError;
use derive_more::{Display, Error};
use log::error;
use ntex::{http, web};

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[display("resource not found")]
    UrlNotFound,
    #[display("forbidden")]
    Unauthorized,
}

impl From<AuthError> for WebhookError {
    fn from(_: AuthError) -> Self {
        WebhookError::Unauthorized
    }
}

impl web::error::WebResponseError for WebhookError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        error!("{:#?}", self);

        web::HttpResponse::build(self.status_code())
            .set_header("content-type", "text/plain; charset=utf-8")
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            WebhookError::UrlNotFound => http::StatusCode::NOT_FOUND,
            WebhookError::Unauthorized => http::StatusCode::FORBIDDEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web::error::WebResponseError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebhookError::from(AuthError::SignatureMismatch),
            WebhookError::Unauthorized
        );
        assert_eq!(
            WebhookError::Unauthorized.status_code(),
            http::StatusCode::FORBIDDEN
        );
        assert_eq!(
            WebhookError::UrlNotFound.status_code(),
            http::StatusCode::NOT_FOUND
        );
    }
}
