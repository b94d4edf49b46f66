use actix_web::{
    http::header::ContentType,
    web::{Data, ReqData},
    HttpResponse,
};

use crate::{auth::Identity, DbPool};

#[tracing::instrument(name = "Greeting an authenticated user", skip_all)]
pub async fn greet(identity: ReqData<Identity>, pool: Data<DbPool>) -> HttpResponse {
    tracing::debug!(open_connections = pool.size(), "Database pool available");
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!("Hello {}!\n", identity.email()))
}
