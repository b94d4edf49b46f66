use std::net::TcpListener;

use actix_web::{
    dev::Server as ActixServer,
    http::Method,
    web::{self, Data},
    App, HttpServer,
};
use actix_web_lab::middleware::from_fn;
use tracing_actix_web::TracingLogger;

use crate::{
    auth::reject_unauthenticated,
    configuration::ApplicationConfig,
    cors::cors,
    database::{self, DatabaseError},
    identity::{IdentityError, IdentityVerifier},
    routes::*,
    Config, DbPool,
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Failed to construct the identity verifier")]
    Identity(#[from] IdentityError),
    #[error("Failed to listen on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

pub struct Server {
    port: u16,
    server: ActixServer,
}

impl Server {
    /// Builds the identity verifier, connects to the database and binds the
    /// listener. Any failure aborts startup.
    pub async fn build(config: Config) -> Result<Self, StartupError> {
        let identity = IdentityVerifier::new(config.identity)?;
        let db_pool = database::connect(&config.database).await?;
        Self::listen(&config.application, db_pool, identity)
    }

    /// Like [`Server::build`], with a database pool supplied by the caller.
    pub fn with_pool(config: Config, db_pool: DbPool) -> Result<Self, StartupError> {
        let identity = IdentityVerifier::new(config.identity)?;
        Self::listen(&config.application, db_pool, identity)
    }

    pub async fn run(self) -> std::io::Result<()> {
        self.server.await
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn listen(
        config: &ApplicationConfig,
        db_pool: DbPool,
        identity: IdentityVerifier,
    ) -> Result<Self, StartupError> {
        let addr = config.bind_addr();
        let bind_error = |source| StartupError::Bind {
            addr: addr.clone(),
            source,
        };
        let listener = TcpListener::bind(&addr).map_err(bind_error)?;
        let port = listener.local_addr().map_err(bind_error)?.port();
        let server = Self::http_server(listener, db_pool, identity).map_err(bind_error)?;
        tracing::info!(%addr, port, "Listening");
        Ok(Self { port, server })
    }

    fn http_server(
        listener: TcpListener,
        db_pool: DbPool,
        identity: IdentityVerifier,
    ) -> std::io::Result<ActixServer> {
        let db_pool = Data::new(db_pool);
        let identity = Data::new(identity);
        HttpServer::new(move || {
            App::new()
                .wrap(from_fn(cors))
                .wrap(TracingLogger::default())
                .route("/test", web::to(test_probe))
                .route("/healthz", web::to(healthz))
                .service(
                    web::resource("/")
                        .wrap(from_fn(reject_unauthenticated))
                        .route(web::method(Method::OPTIONS).to(preflight))
                        .route(web::route().to(greet)),
                )
                .default_service(web::to(not_found))
                .app_data(db_pool.clone())
                .app_data(identity.clone())
        })
        .listen(listener)
        .map(|s| s.run())
    }
}
