mod middleware;

pub use middleware::{reject_unauthenticated, Identity};

use actix_web::{
    http::{
        header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
        StatusCode,
    },
    HttpResponse, ResponseError,
};
use anyhow::Context;

use crate::identity::VerifyError;

const BEARER_PREFIX: &str = "bearer ";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unauthorized - Missing or invalid token")]
    MissingToken(#[source] anyhow::Error),
    #[error("Unauthorized - Invalid Firebase token")]
    InvalidToken(#[source] VerifyError),
    #[error("Something went wrong")]
    Unexpected(#[from] anyhow::Error),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken(_) | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        response.insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"));
        if self.status_code() == StatusCode::UNAUTHORIZED {
            response.insert_header((WWW_AUTHENTICATE, HeaderValue::from_static("Bearer")));
        }
        response.body(format!("{self}\n"))
    }
}

/// Extracts the token of a `Bearer` authorization header.
///
/// The scheme is matched case-insensitively and the token is trimmed. The
/// header value itself never ends up in an error message.
pub fn bearer_token(headers: &HeaderMap) -> anyhow::Result<String> {
    let value = headers
        .get(AUTHORIZATION)
        .with_context(|| format!("The '{AUTHORIZATION}' header was missing"))?
        .to_str()
        .with_context(|| format!("The '{AUTHORIZATION}' header was not a valid UTF8 string"))?;
    let is_bearer = value
        .get(..BEARER_PREFIX.len())
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case(BEARER_PREFIX));
    if !is_bearer {
        anyhow::bail!("The authorization scheme was not 'Bearer'");
    }
    let token = value[BEARER_PREFIX.len()..].trim();
    if token.is_empty() {
        anyhow::bail!("The bearer token was empty");
    }
    Ok(token.to_owned())
}
