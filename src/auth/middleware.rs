use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    web::Data,
    HttpMessage,
};
use actix_web_lab::middleware::Next;
use anyhow::Context;
use tracing::field::{display, Empty};

use super::{bearer_token, AuthError};
use crate::identity::IdentityVerifier;

/// The caller proven by a verified ID token.
#[derive(Debug, Clone)]
pub struct Identity {
    email: String,
}

impl Identity {
    /// Empty when the token carried no `email` claim.
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Lets preflight requests through untouched; every other request must
/// carry a valid bearer token, whose [`Identity`] is then available to the
/// handler as `web::ReqData<Identity>`.
pub async fn reject_unauthenticated<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> actix_web::Result<ServiceResponse<EitherBody<B>>> {
    if req.method() == Method::OPTIONS {
        return next.call(req).await.map(|res| res.map_into_left_body());
    }
    match authenticate(&req).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.call(req).await.map(|res| res.map_into_left_body())
        }
        Err(e) => {
            tracing::warn!(error.cause_chain = ?e, "Rejected request to a protected route");
            Ok(req.error_response(e).map_into_right_body())
        }
    }
}

#[tracing::instrument(name = "Authenticating request", skip_all, fields(user_id = Empty))]
async fn authenticate(req: &ServiceRequest) -> Result<Identity, AuthError> {
    let token = bearer_token(req.headers()).map_err(AuthError::MissingToken)?;
    let verifier = req
        .app_data::<Data<IdentityVerifier>>()
        .context("No identity verifier registered with the application")?;
    let claims = verifier
        .verify(&token)
        .await
        .map_err(AuthError::InvalidToken)?;
    tracing::Span::current().record("user_id", &display(&claims.sub));
    Ok(Identity {
        email: claims.email().to_owned(),
    })
}
